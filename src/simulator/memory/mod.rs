use byteorder::{ByteOrder, LittleEndian};
use std::fs;
use std::path::Path;

pub mod consts;
pub use consts::*;

use super::error::{AccessFault, AccessKind, LoadError};
use super::virtual_io::VirtualOp;

/// The whole address space of the machine, as one flat buffer. See [`consts`] for the layout.
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; MEMORY_SIZE],
        }
    }

    /// Builds the memory from a program image: [`INSTRUCTION_MEMORY_SIZE`] bytes of code
    /// followed by [`DATA_MEMORY_SIZE`] bytes of data. Anything else is rejected.
    pub fn from_image(image: &[u8]) -> Result<Self, LoadError> {
        if image.len() != IMAGE_SIZE {
            return Err(LoadError::WrongSize {
                expected: IMAGE_SIZE,
                actual: image.len(),
            });
        }

        let mut memory = Self::new();
        memory.bytes[..IMAGE_SIZE].copy_from_slice(image);
        Ok(memory)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let image = fs::read(path).map_err(|source| LoadError::Open {
            path: path.to_owned(),
            source,
        })?;
        tracing::debug!(path = %path.display(), len = image.len(), "read program image");
        Self::from_image(&image)
    }

    /// Fetches the instruction word at `pc`, or `None` if `pc` is past the instruction memory
    pub fn fetch(&self, pc: u32) -> Option<u32> {
        let i = (pc & !3) as usize;
        (i < INSTRUCTION_MEMORY_SIZE).then(|| LittleEndian::read_u32(&self.bytes[i..]))
    }

    /// Every word of the instruction memory, in order
    pub fn instruction_words(&self) -> impl Iterator<Item = u32> + '_ {
        self.bytes[..INSTRUCTION_MEMORY_SIZE]
            .chunks_exact(4)
            .map(LittleEndian::read_u32)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the index of the first byte if `width` bytes starting at `addr` may be accessed.
    /// Stores can't touch the instruction memory.
    fn check(&self, kind: AccessKind, addr: u32, width: usize) -> Result<usize, AccessFault> {
        let start = addr as usize;
        let fits = start
            .checked_add(width)
            .is_some_and(|end| end <= self.bytes.len());
        let writable = kind == AccessKind::Load || start >= DATA_START;

        if fits && writable {
            Ok(start)
        } else {
            Err(AccessFault { kind, addr, width })
        }
    }

    /// Reads a `width`-byte value starting at `addr`
    pub fn get_with<T, F>(&self, addr: u32, width: usize, read: F) -> Result<T, AccessFault>
    where
        F: FnOnce(&[u8]) -> T,
    {
        let i = self.check(AccessKind::Load, addr, width)?;
        Ok(read(&self.bytes[i..i + width]))
    }

    /// Writes the value `x` to `width` bytes starting at `addr`, with some writing function
    /// `write`. If `addr` is the address of a virtual routine triggered by stores, it's returned
    /// so the caller can run it. The bytes are written either way.
    fn set_with<T, F>(
        &mut self,
        addr: u32,
        width: usize,
        x: T,
        write: F,
    ) -> Result<Option<VirtualOp>, AccessFault>
    where
        F: FnOnce(&mut [u8], T),
    {
        let i = self.check(AccessKind::Store, addr, width)?;
        write(&mut self.bytes[i..i + width], x);
        Ok(VirtualOp::at(addr).filter(|op| !op.is_input()))
    }

    pub fn get_byte(&self, addr: u32) -> Result<u8, AccessFault> {
        self.get_with(addr, 1, |v| v[0])
    }

    pub fn set_byte(&mut self, addr: u32, x: u8) -> Result<Option<VirtualOp>, AccessFault> {
        self.set_with(addr, 1, x, |v, x| v[0] = x)
    }

    pub fn get_half(&self, addr: u32) -> Result<u16, AccessFault> {
        self.get_with(addr, 2, LittleEndian::read_u16)
    }

    pub fn set_half(&mut self, addr: u32, x: u16) -> Result<Option<VirtualOp>, AccessFault> {
        self.set_with(addr, 2, x, LittleEndian::write_u16)
    }

    pub fn get_word(&self, addr: u32) -> Result<u32, AccessFault> {
        self.get_with(addr, 4, LittleEndian::read_u32)
    }

    pub fn set_word(&mut self, addr: u32, x: u32) -> Result<Option<VirtualOp>, AccessFault> {
        self.set_with(addr, 4, x, LittleEndian::write_u32)
    }

    /// Reads the word at one of the machine's own fixed addresses, like the argument slot of a
    /// virtual routine
    pub(crate) fn word_at(&self, addr: usize) -> u32 {
        LittleEndian::read_u32(&self.bytes[addr..addr + 4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::virtual_io::{PRINT_CHAR, PRINT_SIGNED};

    fn image_with(code: &[u32], data: &[u8]) -> Vec<u8> {
        let mut image = vec![0; IMAGE_SIZE];
        for (i, word) in code.iter().enumerate() {
            LittleEndian::write_u32(&mut image[i * 4..], *word);
        }
        image[DATA_START..DATA_START + data.len()].copy_from_slice(data);
        image
    }

    #[test]
    fn test_from_image() {
        let memory = Memory::from_image(&image_with(&[0xdeadbeef], b"hello")).unwrap();
        assert_eq!(memory.fetch(0), Some(0xdeadbeef));
        assert_eq!(memory.get_byte(DATA_START as u32 + 1), Ok(b'e'));
        assert_eq!(memory.as_slice().len(), MEMORY_SIZE);
        assert!(memory.as_slice()[IMAGE_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_image_wrong_size() {
        let err = Memory::from_image(&[0; 100]).unwrap_err();
        assert!(matches!(
            err,
            LoadError::WrongSize {
                expected: 2048,
                actual: 100
            }
        ));
        assert_eq!(
            err.to_string(),
            "Binary blob in invalid format, expected 2048 bytes got 100."
        );

        assert!(Memory::from_image(&[0; IMAGE_SIZE + 1]).is_err());
    }

    #[test]
    fn test_fetch_stops_at_instruction_memory() {
        let memory = Memory::new();
        assert_eq!(memory.fetch(INSTRUCTION_MEMORY_SIZE as u32 - 4), Some(0));
        assert_eq!(memory.fetch(INSTRUCTION_MEMORY_SIZE as u32), None);
        assert_eq!(memory.fetch(u32::MAX), None);
        assert_eq!(memory.instruction_words().count(), 256);
    }

    #[test]
    fn test_little_endian() {
        let mut memory = Memory::new();
        memory.set_word(0x400, 0x11223344).unwrap();
        assert_eq!(memory.get_byte(0x400), Ok(0x44));
        assert_eq!(memory.get_half(0x402), Ok(0x1122));
        assert_eq!(memory.get_word(0x400), Ok(0x11223344));
    }

    #[test]
    fn test_bounds() {
        let mut memory = Memory::new();
        let last = MEMORY_SIZE as u32 - 1;

        assert!(memory.get_byte(last).is_ok());
        assert!(memory.set_byte(last, 1).is_ok());

        let fault = memory.get_half(last).unwrap_err();
        assert_eq!(fault.kind, AccessKind::Load);
        assert_eq!(fault.addr, last);
        assert_eq!(fault.width, 2);

        assert!(memory.get_word(last - 2).is_err());
        assert!(memory.set_word(last - 3, 1).is_ok());
        assert!(memory.set_word(last - 2, 1).is_err());
        assert!(memory.get_word(u32::MAX).is_err());
        assert!(memory.get_word(u32::MAX - 1).is_err());
    }

    #[test]
    fn test_instruction_memory_is_read_only() {
        let mut memory = Memory::new();
        assert!(memory.get_word(0).is_ok());

        let fault = memory.set_word(0x3fc, 1).unwrap_err();
        assert_eq!(fault.kind, AccessKind::Store);
        assert_eq!(memory.fetch(0x3fc), Some(0));

        assert!(memory.set_word(DATA_START as u32, 1).is_ok());
    }

    #[test]
    fn test_stores_report_virtual_routines() {
        let mut memory = Memory::new();
        assert_eq!(memory.set_byte(0x800, b'a'), Ok(Some(VirtualOp::PrintChar)));
        assert_eq!(memory.get_byte(PRINT_CHAR), Ok(b'a'));

        assert_eq!(memory.set_word(0x804, -5i32 as u32), Ok(Some(VirtualOp::PrintSigned)));
        assert_eq!(memory.word_at(PRINT_SIGNED as usize) as i32, -5);

        // Only the exact address triggers a routine
        assert_eq!(memory.set_byte(0x801, 1), Ok(None));
        assert_eq!(memory.set_word(0x812, 1), Ok(None));
        assert_eq!(memory.set_word(0x400, 1), Ok(None));
    }
}
