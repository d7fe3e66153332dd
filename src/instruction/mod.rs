//!
//! The instructions understood by the machine, and how they map to and from 32-bit words.
//!
//! The machine implements a subset of RV32I: no `fence`, no `ecall`, no immediate shifts.
//! Everything the program wants from the outside world goes through the virtual routines
//! instead, see [`crate::simulator::virtual_io`].
//!

mod bitops;
pub mod constants;
mod decode;
mod encode;

pub use decode::decode;
pub use encode::encode;

use std::fmt;

/// Every operation the decoder can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Type R
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,

    // Type I
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Jalr,

    // Type S
    Sb,
    Sh,
    Sw,

    // Type B
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,

    // Type U
    Lui,

    // Type J
    Jal,
}

/// How an instruction's operands are laid out in its 32-bit word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
}

impl Opcode {
    pub const ALL: [Opcode; 33] = {
        use Opcode::*;
        [
            Add, Sub, Sll, Slt, Sltu, Xor, Srl, Sra, Or, And, Addi, Slti, Sltiu, Xori, Ori, Andi,
            Lb, Lh, Lw, Lbu, Lhu, Jalr, Sb, Sh, Sw, Beq, Bne, Blt, Bge, Bltu, Bgeu, Lui, Jal,
        ]
    };

    pub fn format(self) -> Format {
        use Opcode::*;
        match self {
            Add | Sub | Sll | Slt | Sltu | Xor | Srl | Sra | Or | And => Format::R,
            Addi | Slti | Sltiu | Xori | Ori | Andi | Lb | Lh | Lw | Lbu | Lhu | Jalr => Format::I,
            Sb | Sh | Sw => Format::S,
            Beq | Bne | Blt | Bge | Bltu | Bgeu => Format::B,
            Lui => Format::U,
            Jal => Format::J,
        }
    }

    /// The assembly mnemonic
    pub fn name(self) -> &'static str {
        use Opcode::*;
        match self {
            Add => "add",
            Sub => "sub",
            Sll => "sll",
            Slt => "slt",
            Sltu => "sltu",
            Xor => "xor",
            Srl => "srl",
            Sra => "sra",
            Or => "or",
            And => "and",
            Addi => "addi",
            Slti => "slti",
            Sltiu => "sltiu",
            Xori => "xori",
            Ori => "ori",
            Andi => "andi",
            Lb => "lb",
            Lh => "lh",
            Lw => "lw",
            Lbu => "lbu",
            Lhu => "lhu",
            Jalr => "jalr",
            Sb => "sb",
            Sh => "sh",
            Sw => "sw",
            Beq => "beq",
            Bne => "bne",
            Blt => "blt",
            Bge => "bge",
            Bltu => "bltu",
            Bgeu => "bgeu",
            Lui => "lui",
            Jal => "jal",
        }
    }
}

/// A decoded instruction. Register fields an opcode doesn't use are always 0, so two
/// decodes of equivalent words compare equal.
///
/// `imm` holds the immediate already sign-extended to 32 bits (I, S, B and J formats) or
/// already shifted into place (U format, i.e. `lui` writes it as is).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: u32,
}

impl Instruction {
    /// rd, rs1, rs2
    pub fn r(opcode: Opcode, rd: u8, rs1: u8, rs2: u8) -> Self {
        Self { opcode, rd, rs1, rs2, imm: 0 }
    }

    /// rd, rs1, imm
    pub fn i(opcode: Opcode, rd: u8, rs1: u8, imm: i32) -> Self {
        Self { opcode, rd, rs1, rs2: 0, imm: imm as u32 }
    }

    /// rs1, rs2, imm. Used for both stores and branches
    pub fn s(opcode: Opcode, rs1: u8, rs2: u8, imm: i32) -> Self {
        Self { opcode, rd: 0, rs1, rs2, imm: imm as u32 }
    }

    /// rd, imm. Used for both `lui` and `jal`
    pub fn u(opcode: Opcode, rd: u8, imm: u32) -> Self {
        Self { opcode, rd, rs1: 0, rs2: 0, imm }
    }
}

/// Prints the instruction as a tab separated summary: `name rd rs1 rs2 imm`
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.opcode.name(),
            self.rd,
            self.rs1,
            self.rs2,
            self.imm as i32
        )
    }
}
