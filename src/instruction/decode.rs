use super::bitops::{mask, BitOps};
use super::constants::*;
use super::{Format, Instruction, Opcode};

/// A raw instruction word, with getters for each field
#[derive(Default, Clone, Copy, Debug)]
pub(super) struct Raw(pub u32);

impl Raw {
    pub fn opcode(self) -> u32 {
        self.0.bits(0..7)
    }
    pub fn rd(self) -> u8 {
        self.0.bits(7..12) as u8
    }
    pub fn funct3(self) -> u32 {
        self.0.bits(12..15)
    }
    pub fn rs1(self) -> u8 {
        self.0.bits(15..20) as u8
    }
    pub fn rs2(self) -> u8 {
        self.0.bits(20..25) as u8
    }
    pub fn funct7(self) -> u32 {
        self.0.bits(25..32)
    }

    pub fn imm_i(self) -> u32 {
        self.0.bits(20..32).sign_extend(12)
    }

    pub fn imm_s(self) -> u32 {
        ((self.0.bits(25..32) << 5) | self.0.bits(7..12)).sign_extend(12)
    }

    pub fn imm_b(self) -> u32 {
        let imm = (self.0.bits(31..32) << 12)
            | (self.0.bits(7..8) << 11)
            | (self.0.bits(25..31) << 5)
            | (self.0.bits(8..12) << 1);
        imm.sign_extend(13)
    }

    pub fn imm_u(self) -> u32 {
        self.0 & mask(12..32)
    }

    pub fn imm_j(self) -> u32 {
        let imm = (self.0.bits(31..32) << 20)
            | (self.0.bits(12..20) << 12)
            | (self.0.bits(20..21) << 11)
            | (self.0.bits(21..31) << 1);
        imm.sign_extend(21)
    }
}

fn opcode_of(raw: Raw) -> Option<Opcode> {
    use Opcode::*;

    let op = match raw.opcode() {
        OPCODE_TYPE_R => match (raw.funct3(), raw.funct7()) {
            (add::F3, add::F7) => Add,
            (sub::F3, sub::F7) => Sub,
            (sll::F3, sll::F7) => Sll,
            (slt::F3, slt::F7) => Slt,
            (sltu::F3, sltu::F7) => Sltu,
            (xor::F3, xor::F7) => Xor,
            (srl::F3, srl::F7) => Srl,
            (sra::F3, sra::F7) => Sra,
            (or::F3, or::F7) => Or,
            (and::F3, and::F7) => And,
            _ => return None,
        },
        OPCODE_TYPE_I_IMM => match raw.funct3() {
            addi::F3 => Addi,
            slti::F3 => Slti,
            sltiu::F3 => Sltiu,
            xori::F3 => Xori,
            ori::F3 => Ori,
            andi::F3 => Andi,
            _ => return None,
        },
        OPCODE_TYPE_I_LOAD => match raw.funct3() {
            lb::F3 => Lb,
            lh::F3 => Lh,
            lw::F3 => Lw,
            lbu::F3 => Lbu,
            lhu::F3 => Lhu,
            _ => return None,
        },
        OPCODE_TYPE_I_JALR if raw.funct3() == jalr::F3 => Jalr,
        OPCODE_TYPE_S => match raw.funct3() {
            sb::F3 => Sb,
            sh::F3 => Sh,
            sw::F3 => Sw,
            _ => return None,
        },
        OPCODE_TYPE_B => match raw.funct3() {
            beq::F3 => Beq,
            bne::F3 => Bne,
            blt::F3 => Blt,
            bge::F3 => Bge,
            bltu::F3 => Bltu,
            bgeu::F3 => Bgeu,
            _ => return None,
        },
        OPCODE_TYPE_U => Lui,
        OPCODE_TYPE_J => Jal,
        _ => return None,
    };

    Some(op)
}

/// Decodes a 32-bit instruction word. Returns `None` for anything outside the supported
/// instruction set, which the simulator reports as "Instruction Not Implemented".
pub fn decode(word: u32) -> Option<Instruction> {
    let raw = Raw(word);
    let opcode = opcode_of(raw)?;

    let instruction = match opcode.format() {
        Format::R => Instruction::r(opcode, raw.rd(), raw.rs1(), raw.rs2()),
        Format::I => Instruction {
            opcode,
            rd: raw.rd(),
            rs1: raw.rs1(),
            rs2: 0,
            imm: raw.imm_i(),
        },
        Format::S => Instruction {
            opcode,
            rd: 0,
            rs1: raw.rs1(),
            rs2: raw.rs2(),
            imm: raw.imm_s(),
        },
        Format::B => Instruction {
            opcode,
            rd: 0,
            rs1: raw.rs1(),
            rs2: raw.rs2(),
            imm: raw.imm_b(),
        },
        Format::U => Instruction::u(opcode, raw.rd(), raw.imm_u()),
        Format::J => Instruction::u(opcode, raw.rd(), raw.imm_j()),
    };

    Some(instruction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Opcode::*;

    #[test]
    fn test_imm_i() {
        assert_eq!(Raw(0x07b14093).imm_i(), 123);
        assert_eq!(Raw(0xffc4c413).imm_i() as i32, -4);
        assert_eq!(Raw(0x000f8f13).imm_i(), 0);
    }

    #[test]
    fn test_imm_s() {
        assert_eq!(Raw(0x0684ada3).imm_s(), 123);
        assert_eq!(Raw(0xfe84ae23).imm_s() as i32, -4);
        assert_eq!(Raw(0x0000a023).imm_s(), 0);
    }

    #[test]
    fn test_decode_known_words() {
        // xori x1, x2, 123
        assert_eq!(decode(0x07b14093), Some(Instruction::i(Xori, 1, 2, 123)));
        // xori s0, s1, -4
        assert_eq!(decode(0xffc4c413), Some(Instruction::i(Xori, 8, 9, -4)));
        // sw s0, 123(s1)
        assert_eq!(decode(0x0684ada3), Some(Instruction::s(Sw, 9, 8, 123)));
        // jal t0, 12
        assert_eq!(decode(0x00c002ef), Some(Instruction::u(Jal, 5, 12)));
        // add a0, a1, a2
        assert_eq!(decode(0x00c58533), Some(Instruction::r(Add, 10, 11, 12)));
        // sub a0, a1, a2
        assert_eq!(decode(0x40c58533), Some(Instruction::r(Sub, 10, 11, 12)));
        // sra a0, a1, a2
        assert_eq!(decode(0x40c5d533), Some(Instruction::r(Sra, 10, 11, 12)));
        // lui a0, 0x12345
        assert_eq!(decode(0x12345537), Some(Instruction::u(Lui, 10, 0x1234_5000)));
        // beq x0, x0, -8
        assert_eq!(decode(0xfe000ce3), Some(Instruction::s(Beq, 0, 0, -8)));
        // lw a0, -4(sp)
        assert_eq!(decode(0xffc12503), Some(Instruction::i(Lw, 10, 2, -4)));
        // jalr x0, 0(ra)
        assert_eq!(decode(0x00008067), Some(Instruction::i(Jalr, 0, 1, 0)));
    }

    #[test]
    fn test_decode_rejects_unknown_words() {
        assert_eq!(decode(0x0000_0000), None);
        assert_eq!(decode(0xffff_ffff), None);
        // ecall
        assert_eq!(decode(0x0000_0073), None);
        // slli a0, a0, 1 is not part of the instruction set
        assert_eq!(decode(0x00151513), None);
        // mul a0, a1, a2
        assert_eq!(decode(0x02c58533), None);
        // jalr with a non-zero funct3
        assert_eq!(decode(0x00009067), None);
    }
}
