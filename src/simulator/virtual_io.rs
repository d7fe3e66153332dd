//!
//! Virtual routines: memory-mapped addresses that do something when a program stores to them.
//!
//! | Address | Routine | Effect |
//! |--------:|---------|--------|
//! | `0x800` | print char | prints the byte stored |
//! | `0x804` | print signed | prints the word stored, as a signed decimal |
//! | `0x808` | print unsigned | prints the word stored, in hexadecimal |
//! | `0x80c` | halt | stops the machine |
//! | `0x812` | read char | *loading* from it reads a character from the console |
//! | `0x816` | read signed | *loading* from it reads a signed decimal line from the console |
//! | `0x820` | dump pc | prints the program counter, in hexadecimal |
//! | `0x824` | dump registers | prints the register dump |
//! | `0x828` | dump memory word | prints the word stored, in hexadecimal |
//! | `0x830` | malloc | allocates the number of bytes stored, and puts the address in `x28` |
//! | `0x834` | free | frees the allocation at the address stored |
//!
//! The routine runs after the store is done, and reads its argument back from memory, so a
//! `sb` to `0x804` prints whatever word is there after the byte is written.
//!

use super::error::{Fatal, Fault};
use super::memory::{VIRTUAL_END, VIRTUAL_START};
use super::{Outcome, Simulator, Stop};
use std::io::Write;

pub const PRINT_CHAR: u32 = 0x800;
pub const PRINT_SIGNED: u32 = 0x804;
pub const PRINT_UNSIGNED: u32 = 0x808;
pub const HALT: u32 = 0x80c;
pub const READ_CHAR: u32 = 0x812;
pub const READ_SIGNED: u32 = 0x816;
pub const DUMP_PC: u32 = 0x820;
pub const DUMP_REGISTERS: u32 = 0x824;
pub const DUMP_MEMORY_WORD: u32 = 0x828;
pub const MALLOC: u32 = 0x830;
pub const FREE: u32 = 0x834;

/// `malloc` writes the address it allocated here
pub const MALLOC_RESULT_REGISTER: u8 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualOp {
    PrintChar,
    PrintSigned,
    PrintUnsigned,
    Halt,
    ReadChar,
    ReadSigned,
    DumpPc,
    DumpRegisters,
    DumpMemoryWord,
    Malloc,
    Free,
}

impl VirtualOp {
    /// The routine mapped at `addr`, if any
    pub fn at(addr: u32) -> Option<Self> {
        use VirtualOp::*;
        if !(VIRTUAL_START..VIRTUAL_END).contains(&(addr as usize)) {
            return None;
        }

        let op = match addr {
            PRINT_CHAR => PrintChar,
            PRINT_SIGNED => PrintSigned,
            PRINT_UNSIGNED => PrintUnsigned,
            HALT => Halt,
            READ_CHAR => ReadChar,
            READ_SIGNED => ReadSigned,
            DUMP_PC => DumpPc,
            DUMP_REGISTERS => DumpRegisters,
            DUMP_MEMORY_WORD => DumpMemoryWord,
            MALLOC => Malloc,
            FREE => Free,
            _ => return None,
        };
        Some(op)
    }

    /// Input routines are triggered by loads. Storing to them is an ordinary store.
    pub fn is_input(self) -> bool {
        matches!(self, VirtualOp::ReadChar | VirtualOp::ReadSigned)
    }
}

impl Simulator {
    /// Runs the routine a store just triggered. `word` is the store instruction, for
    /// diagnostics.
    pub(super) fn dispatch(&mut self, op: VirtualOp, word: u32) -> Result<(), Stop> {
        use VirtualOp::*;
        tracing::debug!(?op, pc = format_args!("{:x}", self.pc), "virtual routine");

        match op {
            PrintChar => {
                let c = self.memory.word_at(PRINT_CHAR as usize) as u8;
                self.console.write_all(&[c])?;
            }
            PrintSigned => {
                let x = self.memory.word_at(PRINT_SIGNED as usize) as i32;
                write!(self.console, "{x}")?;
            }
            PrintUnsigned => {
                let x = self.memory.word_at(PRINT_UNSIGNED as usize);
                write!(self.console, "{x:x}")?;
            }
            Halt => return Err(Stop::Machine(Outcome::Halted)),
            ReadChar | ReadSigned => {}
            DumpPc => writeln!(self.console, "{:x}", self.pc)?,
            DumpRegisters => self.dump_registers()?,
            DumpMemoryWord => {
                let x = self.memory.word_at(DUMP_MEMORY_WORD as usize);
                writeln!(self.console, "{x:x}")?;
            }
            Malloc => {
                let size = self.memory.word_at(MALLOC as usize);
                let addr = self.heap.alloc(size).ok_or(Fatal::HeapExhausted { size })?;
                self.registers.set(MALLOC_RESULT_REGISTER, addr);
            }
            Free => {
                let addr = self.memory.word_at(FREE as usize);
                if let Err(reason) = self.heap.free(addr) {
                    tracing::debug!(%reason, "illegal free of {addr:#x}");
                    return Err(Fatal::IllegalFree { word, addr }.into());
                }
            }
        }

        Ok(())
    }

    /// A load from [`READ_CHAR`]
    pub(super) fn read_char(&mut self, word: u32) -> Result<u32, Stop> {
        match self.console.read_char()? {
            Some(c) => Ok(c as u32),
            None => Err(Fault::Input {
                word,
                reason: "reached the end of the input".to_owned(),
            }
            .into()),
        }
    }

    /// A load from [`READ_SIGNED`]
    pub(super) fn read_signed(&mut self, word: u32) -> Result<u32, Stop> {
        let Some(line) = self.console.read_line()? else {
            return Err(Fault::Input {
                word,
                reason: "reached the end of the input".to_owned(),
            }
            .into());
        };

        let line = line.trim();
        line.parse::<i32>().map(|x| x as u32).map_err(|e| {
            Fault::Input {
                word,
                reason: format!("'{line}' is not a signed integer ({e})"),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses() {
        assert_eq!(VirtualOp::at(0x800), Some(VirtualOp::PrintChar));
        assert_eq!(VirtualOp::at(0x80c), Some(VirtualOp::Halt));
        assert_eq!(VirtualOp::at(0x834), Some(VirtualOp::Free));
        assert_eq!(VirtualOp::at(0x802), None);
        assert_eq!(VirtualOp::at(0x838), None);
        assert!(VirtualOp::ReadSigned.is_input());
        assert!(!VirtualOp::Malloc.is_input());
    }

    #[test]
    fn test_routines_live_in_the_window() {
        let routines = [
            PRINT_CHAR,
            PRINT_SIGNED,
            PRINT_UNSIGNED,
            HALT,
            READ_CHAR,
            READ_SIGNED,
            DUMP_PC,
            DUMP_REGISTERS,
            DUMP_MEMORY_WORD,
            MALLOC,
            FREE,
        ];
        for addr in routines {
            assert!((VIRTUAL_START..VIRTUAL_END).contains(&(addr as usize)), "{addr:#x}");
            assert!(VirtualOp::at(addr).is_some(), "{addr:#x}");
        }

        let found = (0..0x1_0000).filter_map(VirtualOp::at).count();
        assert_eq!(found, routines.len());
    }
}
