//!
//! The general purpose registers, and the type tag that goes with each of them.
//!
//! A tag says how the raw bits of a register should be read by arithmetic instructions: as a
//! full word, or as a sign/zero-extended byte or halfword. Every register starts as
//! [`RegisterKind::Default`], and no instruction changes the tag. Loads could record the width
//! they read, but they don't, so for programs running on the machine the tags are inert.
//! [`RegisterFile::set_kind`] is there for embedders that want to use them.
//!

use super::into_register::{FromRegister, IntoRegister};
use std::fmt;

pub const REGISTER_COUNT: usize = 32;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    #[default]
    Default,
    I8,
    I16,
    I32,
    U8,
    U16,
}

impl RegisterKind {
    /// The value arithmetic sees for a register holding `raw`
    pub fn reinterpret(self, raw: u32) -> i32 {
        match self {
            RegisterKind::Default | RegisterKind::I32 => raw as i32,
            RegisterKind::I8 => i8::from_register(raw) as i32,
            RegisterKind::I16 => i16::from_register(raw) as i32,
            RegisterKind::U8 => u8::from_register(raw) as i32,
            RegisterKind::U16 => u16::from_register(raw) as i32,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    values: [u32; REGISTER_COUNT],
    kinds: [RegisterKind; REGISTER_COUNT],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw contents of register `i`, as `T`
    pub fn get<T: FromRegister>(&self, i: u8) -> T {
        T::from_register(self.values[i as usize])
    }

    /// Contents of register `i` as seen through its tag
    pub fn typed(&self, i: u8) -> i32 {
        self.kinds[i as usize].reinterpret(self.values[i as usize])
    }

    /// Writes register `i`. Writing to `x0` is allowed here: it keeps the value until
    /// [`RegisterFile::clear_zero`] runs at the end of the instruction.
    pub fn set<T: IntoRegister>(&mut self, i: u8, x: T) {
        self.values[i as usize] = x.into_register();
    }

    pub fn kind(&self, i: u8) -> RegisterKind {
        self.kinds[i as usize]
    }

    pub fn set_kind(&mut self, i: u8, kind: RegisterKind) {
        self.kinds[i as usize] = kind;
    }

    pub fn clear_zero(&mut self) {
        self.values[0] = 0;
    }

    pub fn values(&self) -> &[u32; REGISTER_COUNT] {
        &self.values
    }
}

/// The register dump printed when the machine stops, one line per register
pub struct Dump<'a> {
    pub pc: u32,
    pub registers: &'a RegisterFile,
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PC = 0x{:08x};", self.pc)?;
        for (i, value) in self.registers.values.iter().enumerate() {
            writeln!(f, "R[{i}] = 0x{value:08x};")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinterpret() {
        assert_eq!(RegisterKind::Default.reinterpret(0xffff_ff80), -128);
        assert_eq!(RegisterKind::I32.reinterpret(0x8000_0000), i32::MIN);
        assert_eq!(RegisterKind::I8.reinterpret(0x0000_0080), -128);
        assert_eq!(RegisterKind::I16.reinterpret(0x1234_8000), -32768);
        assert_eq!(RegisterKind::U8.reinterpret(0xffff_ff80), 0x80);
        assert_eq!(RegisterKind::U16.reinterpret(0xffff_8000), 0x8000);
    }

    #[test]
    fn test_tags_start_as_default() {
        let registers = RegisterFile::new();
        assert!((0..32).all(|i| registers.kind(i) == RegisterKind::Default));
    }

    #[test]
    fn test_typed_reads_through_the_tag() {
        let mut registers = RegisterFile::new();
        registers.set(5, 0x1ffu32);
        assert_eq!(registers.typed(5), 0x1ff);

        registers.set_kind(5, RegisterKind::I8);
        assert_eq!(registers.typed(5), -1);
        assert_eq!(registers.get::<u32>(5), 0x1ff);
    }

    #[test]
    fn test_zero_register_is_cleared_explicitly() {
        let mut registers = RegisterFile::new();
        registers.set(0, 42u32);
        assert_eq!(registers.get::<u32>(0), 42);
        registers.clear_zero();
        assert_eq!(registers.get::<u32>(0), 0);
    }

    #[test]
    fn test_dump_format() {
        let mut registers = RegisterFile::new();
        registers.set(31, 0xdeadbeefu32);
        let dump = Dump { pc: 0x10, registers: &registers }.to_string();
        let lines: Vec<_> = dump.lines().collect();

        assert_eq!(lines.len(), 33);
        assert_eq!(lines[0], "PC = 0x00000010;");
        assert_eq!(lines[1], "R[0] = 0x00000000;");
        assert_eq!(lines[32], "R[31] = 0xdeadbeef;");
    }
}
