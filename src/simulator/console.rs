//!
//! Where the virtual routines read from and write to. Usually stdin/stdout, but any reader and
//! writer will do, which is how the tests look at what a program printed.
//!

use std::cell::RefCell;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

pub struct Console {
    output: Box<dyn Write>,
    input: Box<dyn BufRead>,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdio()
    }
}

impl Console {
    pub fn new(output: impl Write + 'static, input: impl BufRead + 'static) -> Self {
        Self {
            output: Box::new(output),
            input: Box::new(input),
        }
    }

    pub fn stdio() -> Self {
        Self::new(io::BufWriter::new(io::stdout()), io::stdin().lock())
    }

    /// Reads a single byte, or `None` at the end of the input
    pub fn read_char(&mut self) -> io::Result<Option<u8>> {
        // Whatever the program printed before asking should be visible
        self.output.flush()?;

        let byte = self.input.fill_buf()?.first().copied();
        if byte.is_some() {
            self.input.consume(1);
        }
        Ok(byte)
    }

    /// Reads a line without its line ending, or `None` at the end of the input
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_owned()))
    }
}

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

/// A writer that keeps everything written to it, and can be cloned to look at the output
/// while a [`Console`] owns the other handle
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads() {
        let mut console = Console::new(io::sink(), &b"ab\n-12\r\n"[..]);
        assert_eq!(console.read_char().unwrap(), Some(b'a'));
        assert_eq!(console.read_char().unwrap(), Some(b'b'));
        assert_eq!(console.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(console.read_line().unwrap().as_deref(), Some("-12"));
        assert_eq!(console.read_line().unwrap(), None);
        assert_eq!(console.read_char().unwrap(), None);
    }

    #[test]
    fn test_shared_buffer() {
        let buffer = SharedBuffer::new();
        let mut console = Console::new(buffer.clone(), io::empty());
        write!(console, "{}", 42).unwrap();
        assert_eq!(buffer.to_string_lossy(), "42");
    }
}
