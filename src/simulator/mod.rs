//!
//! Runs a program image instruction by instruction.
//!
//! The supported instructions can be found at [`Opcode`](crate::instruction::Opcode), and you
//! can find how they're simulated at [`Simulator::step`]. Programs talk to the outside world by
//! storing to the [virtual routines](virtual_io).
//!
//! Some behavior is kept from the reference machine even though a real RISC-V processor would
//! do otherwise:
//!
//! - `sra` rotates right instead of shifting in copies of the sign bit;
//! - `jalr` writes the link register *before* reading its base register, so `jalr t0, 0(t0)`
//!   jumps to `pc + 4`. Register `x0` is only cleared at the end of the instruction, so
//!   `jalr x0, 8(x0)` also lands on `pc + 12`;
//! - arithmetic reads its operands through the register type tags (see [`registers`]).
//!
//! Two other quirks of the reference machine are configurable, see [`MemoryFaults`] and
//! [`HeapSearch`].
//!

use crate::instruction::{decode, Instruction, Opcode};
use owo_colors::OwoColorize;
use serde::Deserialize;
use std::io::{self, Write};
use std::path::Path;

pub mod console;
pub mod error;
pub mod heap;
mod into_register;
pub mod memory;
pub mod registers;
pub mod virtual_io;

pub use console::{Console, SharedBuffer};
use error::{AccessFault, AccessKind, Fatal, Fault, LoadError};
pub use heap::{BankAllocator, HeapSearch};
use into_register::FromRegister;
pub use memory::Memory;
pub use registers::{RegisterFile, RegisterKind};
use virtual_io::VirtualOp;

/// What happens when a load or store falls outside the memory, touches a heap bank that isn't
/// allocated, or a store hits the instruction memory
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryFaults {
    /// The machine stops with an "Illegal Operation" diagnostic and the register dump
    #[default]
    Strict,

    /// Compatible with the reference machine, which never stops on a bad access: the load
    /// reads 0 or the store is dropped, and execution carries on
    Lenient,
}

/// Fixed when the simulator is built
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub memory_faults: MemoryFaults,
    pub heap_search: HeapSearch,

    /// Emits a `tracing` event for every instruction executed
    pub trace: bool,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The program counter left the instruction memory
    Finished,
    /// A graceful stop
    Faulted(Fault),
    /// The program stored to the halt routine
    Halted,
    /// An unrecoverable error in a virtual routine
    Aborted(Fatal),
}

/// Why an instruction didn't run to completion: either the machine stopped, or the console
/// failed us
pub(crate) enum Stop {
    Machine(Outcome),
    Host(io::Error),
}

impl From<io::Error> for Stop {
    fn from(e: io::Error) -> Self {
        Stop::Host(e)
    }
}

impl From<Fault> for Stop {
    fn from(fault: Fault) -> Self {
        Stop::Machine(Outcome::Faulted(fault))
    }
}

impl From<Fatal> for Stop {
    fn from(fatal: Fatal) -> Self {
        Stop::Machine(Outcome::Aborted(fatal))
    }
}

/// Simulates the machine. Generally initialized by calling
/// [load_from_file](Simulator::load_from_file) and ran by calling [run](Simulator::run).
#[derive(Debug)]
pub struct Simulator {
    pc: u32,
    instructions_executed: u64,
    options: Options,
    console: Console,

    pub registers: RegisterFile,
    pub memory: Memory,
    pub heap: BankAllocator,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(Memory::new(), Options::default())
    }
}

impl Simulator {
    pub fn new(memory: Memory, options: Options) -> Self {
        Self {
            pc: 0,
            instructions_executed: 0,
            options,
            console: Console::stdio(),
            registers: RegisterFile::new(),
            memory,
            heap: BankAllocator::new(options.heap_search),
        }
    }

    pub fn load_from_file(path: impl AsRef<Path>, options: Options) -> Result<Self, LoadError> {
        Ok(Self::new(Memory::from_file(path)?, options))
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn instructions_executed(&self) -> u64 {
        self.instructions_executed
    }

    pub fn dump_registers(&mut self) -> io::Result<()> {
        let dump = registers::Dump {
            pc: self.pc,
            registers: &self.registers,
        };
        write!(self.console, "{dump}")
    }

    /// Runs until the machine stops, then prints how it stopped: the register dump if it
    /// finished or faulted, and a diagnostic for everything but a normal finish.
    pub fn run(&mut self) -> io::Result<Outcome> {
        let outcome = loop {
            if let Some(outcome) = self.step()? {
                break outcome;
            }
        };

        match &outcome {
            Outcome::Finished => self.dump_registers()?,
            Outcome::Faulted(fault) => {
                writeln!(self.console, "{fault}")?;
                self.dump_registers()?;
            }
            Outcome::Halted => writeln!(self.console, "CPU Halt Requested")?,
            // Printed without a line ending, like the reference machine does
            Outcome::Aborted(fatal @ Fatal::HeapExhausted { .. }) => write!(self.console, "{fatal}")?,
            Outcome::Aborted(fatal @ Fatal::IllegalFree { .. }) => {
                writeln!(self.console, "{fatal}")?;
                self.dump_registers()?;
            }
        }
        self.console.flush()?;

        tracing::debug!(
            ?outcome,
            pc = format_args!("{:x}", self.pc),
            instructions = self.instructions_executed,
            "machine stopped"
        );
        Ok(outcome)
    }

    /// Executes the instruction at the program counter. Returns how the machine stopped, if
    /// it did. The program counter doesn't move when an instruction stops the machine.
    pub fn step(&mut self) -> io::Result<Option<Outcome>> {
        let Some(word) = self.memory.fetch(self.pc) else {
            return Ok(Some(Outcome::Finished));
        };

        let result = self.execute(word);
        self.registers.clear_zero();

        match result {
            Ok(next_pc) => {
                self.pc = next_pc;
                self.instructions_executed += 1;
                Ok(None)
            }
            Err(Stop::Machine(outcome)) => Ok(Some(outcome)),
            Err(Stop::Host(e)) => Err(e),
        }
    }

    /// Runs a single instruction and returns the next program counter
    fn execute(&mut self, word: u32) -> Result<u32, Stop> {
        use Opcode::*;

        let instruction = decode(word).ok_or(Fault::Decode { word })?;
        if self.options.trace {
            tracing::trace!(pc = format_args!("{:x}", self.pc), word = format_args!("{word:08x}"), "{instruction}");
        }

        let Instruction {
            opcode,
            rd,
            rs1,
            rs2,
            imm,
        } = instruction;

        let pc = self.pc;
        let mut next_pc = pc.wrapping_add(4);
        let mut virtual_op = None;

        // Arithmetic goes through the type tags, comparisons and shifts use the raw bits
        let (a, b) = (self.registers.typed(rs1), self.registers.typed(rs2));
        let (x, y): (u32, u32) = (self.registers.get(rs1), self.registers.get(rs2));
        let addr = x.wrapping_add(imm);

        macro_rules! set {
            ($rd:ident = $val:expr) => {{
                let value = $val;
                self.registers.set($rd, value)
            }};
        }

        macro_rules! branch {
            (if $cond:expr) => {
                if $cond {
                    next_pc = pc.wrapping_add(imm);
                }
            };
        }

        match opcode {
            // Type R
            Add => set! { rd = a.wrapping_add(b) },
            Sub => set! { rd = a.wrapping_sub(b) },
            Xor => set! { rd = a ^ b },
            Or => set! { rd = a | b },
            And => set! { rd = a & b },
            Sll => set! { rd = x.wrapping_shl(y) },
            Srl => set! { rd = x.wrapping_shr(y) },
            Sra => set! { rd = x.rotate_right(y) },
            Slt => set! { rd = a < b },
            Sltu => set! { rd = (a as u32) < (b as u32) },

            // Type I
            Addi => set! { rd = a.wrapping_add(imm as i32) },
            Xori => set! { rd = a ^ imm as i32 },
            Ori => set! { rd = a | imm as i32 },
            Andi => set! { rd = a & imm as i32 },
            Slti => set! { rd = a < imm as i32 },
            Sltiu => set! { rd = (a as u32) < imm },

            // Type I -- Loads
            Lb => set! { rd = self.load(addr, word, Memory::get_byte)? as i8 as i32 },
            Lh => set! { rd = self.load(addr, word, Memory::get_half)? as i16 as i32 },
            Lw => set! { rd = self.load(addr, word, Memory::get_word)? },
            Lbu => set! { rd = self.load(addr, word, Memory::get_byte)? },
            Lhu => set! { rd = self.load(addr, word, Memory::get_half)? },

            // Type S
            Sb => virtual_op = self.store(addr, 1, word, |m| m.set_byte(addr, y as u8))?,
            Sh => virtual_op = self.store(addr, 2, word, |m| m.set_half(addr, y as u16))?,
            Sw => virtual_op = self.store(addr, 4, word, |m| m.set_word(addr, y))?,

            // Type B
            Beq => branch!(if x == y),
            Bne => branch!(if x != y),
            Blt => branch!(if (x as i32) < (y as i32)),
            Bge => branch!(if (x as i32) >= (y as i32)),
            Bltu => branch!(if x < y),
            Bgeu => branch!(if x >= y),

            // Type U, J and jumps
            Lui => set! { rd = imm },
            Jal => {
                set! { rd = pc.wrapping_add(4) };
                next_pc = pc.wrapping_add(imm);
            }
            Jalr => {
                set! { rd = pc.wrapping_add(4) };
                next_pc = self.registers.get::<u32>(rs1).wrapping_add(imm);
            }
        }

        if let Some(op) = virtual_op {
            self.dispatch(op, word)?;
        }

        Ok(next_pc)
    }

    fn load<T>(
        &mut self,
        addr: u32,
        word: u32,
        get: fn(&Memory, u32) -> Result<T, AccessFault>,
    ) -> Result<T, Stop>
    where
        T: Default + FromRegister,
    {
        match VirtualOp::at(addr) {
            Some(VirtualOp::ReadChar) => return self.read_char(word).map(T::from_register),
            Some(VirtualOp::ReadSigned) => return self.read_signed(word).map(T::from_register),
            _ => {}
        }

        let width = std::mem::size_of::<T>();
        let value = self
            .heap_allows(AccessKind::Load, addr, width)
            .and_then(|()| get(&self.memory, addr));

        match value {
            Ok(value) => Ok(value),
            Err(fault) => self.access_failed(fault, word).map(|()| T::default()),
        }
    }

    fn store<F>(
        &mut self,
        addr: u32,
        width: usize,
        word: u32,
        set: F,
    ) -> Result<Option<VirtualOp>, Stop>
    where
        F: FnOnce(&mut Memory) -> Result<Option<VirtualOp>, AccessFault>,
    {
        let result = self
            .heap_allows(AccessKind::Store, addr, width)
            .and_then(|()| set(&mut self.memory));

        match result {
            Ok(op) => Ok(op),
            Err(fault) => self.access_failed(fault, word).map(|()| None),
        }
    }

    /// Heap banks can only be accessed while they're allocated
    fn heap_allows(&self, kind: AccessKind, addr: u32, width: usize) -> Result<(), AccessFault> {
        if self.heap.covers(addr, width) {
            Ok(())
        } else {
            tracing::debug!(%kind, "access to an unallocated heap bank at {addr:#x}");
            Err(AccessFault { kind, addr, width })
        }
    }

    fn access_failed(&self, fault: AccessFault, word: u32) -> Result<(), Stop> {
        match self.options.memory_faults {
            MemoryFaults::Strict => Err(Fault::Access {
                word,
                source: fault,
            }
            .into()),
            MemoryFaults::Lenient => {
                tracing::warn!(pc = format_args!("{:x}", self.pc), "ignoring bad {fault}");
                Ok(())
            }
        }
    }

    /// Writes a listing of the instruction memory, up to the first word that doesn't decode
    pub fn disassemble(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}", "PC\tCode\t\tName\tRd\tR1\tR2\tImm".bright_blue())?;
        for (pc, word) in (0u32..).step_by(4).zip(self.memory.instruction_words()) {
            let Some(instruction) = decode(word) else {
                break;
            };
            writeln!(out, "{pc:x}:\t{word:08x}\t{instruction}")?;
        }
        Ok(())
    }
}
