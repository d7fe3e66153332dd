use super::bitops::{mask, BitOps};
use super::constants::*;
use super::{Format, Instruction, Opcode};

/// (opcode, funct3, funct7) of each instruction
fn codes(op: Opcode) -> (u32, u32, u32) {
    use Opcode::*;
    match op {
        Add => (OPCODE_TYPE_R, add::F3, add::F7),
        Sub => (OPCODE_TYPE_R, sub::F3, sub::F7),
        Sll => (OPCODE_TYPE_R, sll::F3, sll::F7),
        Slt => (OPCODE_TYPE_R, slt::F3, slt::F7),
        Sltu => (OPCODE_TYPE_R, sltu::F3, sltu::F7),
        Xor => (OPCODE_TYPE_R, xor::F3, xor::F7),
        Srl => (OPCODE_TYPE_R, srl::F3, srl::F7),
        Sra => (OPCODE_TYPE_R, sra::F3, sra::F7),
        Or => (OPCODE_TYPE_R, or::F3, or::F7),
        And => (OPCODE_TYPE_R, and::F3, and::F7),
        Addi => (OPCODE_TYPE_I_IMM, addi::F3, 0),
        Slti => (OPCODE_TYPE_I_IMM, slti::F3, 0),
        Sltiu => (OPCODE_TYPE_I_IMM, sltiu::F3, 0),
        Xori => (OPCODE_TYPE_I_IMM, xori::F3, 0),
        Ori => (OPCODE_TYPE_I_IMM, ori::F3, 0),
        Andi => (OPCODE_TYPE_I_IMM, andi::F3, 0),
        Lb => (OPCODE_TYPE_I_LOAD, lb::F3, 0),
        Lh => (OPCODE_TYPE_I_LOAD, lh::F3, 0),
        Lw => (OPCODE_TYPE_I_LOAD, lw::F3, 0),
        Lbu => (OPCODE_TYPE_I_LOAD, lbu::F3, 0),
        Lhu => (OPCODE_TYPE_I_LOAD, lhu::F3, 0),
        Jalr => (OPCODE_TYPE_I_JALR, jalr::F3, 0),
        Sb => (OPCODE_TYPE_S, sb::F3, 0),
        Sh => (OPCODE_TYPE_S, sh::F3, 0),
        Sw => (OPCODE_TYPE_S, sw::F3, 0),
        Beq => (OPCODE_TYPE_B, beq::F3, 0),
        Bne => (OPCODE_TYPE_B, bne::F3, 0),
        Blt => (OPCODE_TYPE_B, blt::F3, 0),
        Bge => (OPCODE_TYPE_B, bge::F3, 0),
        Bltu => (OPCODE_TYPE_B, bltu::F3, 0),
        Bgeu => (OPCODE_TYPE_B, bgeu::F3, 0),
        Lui => (OPCODE_TYPE_U, 0, 0),
        Jal => (OPCODE_TYPE_J, 0, 0),
    }
}

fn set(word: &mut u32, range: std::ops::Range<u32>, value: u32) {
    let m = mask(range.clone());
    *word = (*word & !m) | ((value << range.start) & m);
}

/// Assembles an instruction back into its 32-bit word. Immediates are truncated to the
/// width their format can hold, and B/J offsets lose their (implicit) lowest bit.
pub fn encode(i: &Instruction) -> u32 {
    let (opcode, funct3, funct7) = codes(i.opcode);
    let (rd, rs1, rs2, imm) = (i.rd as u32, i.rs1 as u32, i.rs2 as u32, i.imm);

    let mut word = 0;
    set(&mut word, 0..7, opcode);

    match i.opcode.format() {
        Format::R => {
            set(&mut word, 7..12, rd);
            set(&mut word, 12..15, funct3);
            set(&mut word, 15..20, rs1);
            set(&mut word, 20..25, rs2);
            set(&mut word, 25..32, funct7);
        }
        Format::I => {
            set(&mut word, 7..12, rd);
            set(&mut word, 12..15, funct3);
            set(&mut word, 15..20, rs1);
            set(&mut word, 20..32, imm.bits(0..12));
        }
        Format::S => {
            set(&mut word, 7..12, imm.bits(0..5));
            set(&mut word, 12..15, funct3);
            set(&mut word, 15..20, rs1);
            set(&mut word, 20..25, rs2);
            set(&mut word, 25..32, imm.bits(5..12));
        }
        Format::B => {
            set(&mut word, 7..8, imm.bits(11..12));
            set(&mut word, 8..12, imm.bits(1..5));
            set(&mut word, 12..15, funct3);
            set(&mut word, 15..20, rs1);
            set(&mut word, 20..25, rs2);
            set(&mut word, 25..31, imm.bits(5..11));
            set(&mut word, 31..32, imm.bits(12..13));
        }
        Format::U => {
            set(&mut word, 7..12, rd);
            word |= imm & mask(12..32);
        }
        Format::J => {
            set(&mut word, 7..12, rd);
            set(&mut word, 12..20, imm.bits(12..20));
            set(&mut word, 20..21, imm.bits(11..12));
            set(&mut word, 21..31, imm.bits(1..11));
            set(&mut word, 31..32, imm.bits(20..21));
        }
    }

    word
}
