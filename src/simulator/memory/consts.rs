/// Instruction memory, 256 words. Only written when the image is loaded
pub const INSTRUCTION_MEMORY_SIZE: usize = 0x400;
pub const DATA_START: usize = INSTRUCTION_MEMORY_SIZE;
pub const DATA_MEMORY_SIZE: usize = 0x400;

/// Size of a program image: the instruction memory followed by the data memory
pub const IMAGE_SIZE: usize = INSTRUCTION_MEMORY_SIZE + DATA_MEMORY_SIZE;

/// The virtual routines live here, see [`crate::simulator::virtual_io`]
pub const VIRTUAL_START: usize = 0x800;
pub const VIRTUAL_END: usize = 0x900;

pub const HEAP_START: usize = 0xb700;
pub const BANK_SIZE: usize = 64;
pub const MAX_BANKS: usize = 128;
pub const HEAP_END: usize = HEAP_START + BANK_SIZE * MAX_BANKS;

pub const MEMORY_SIZE: usize = HEAP_END;
