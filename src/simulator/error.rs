//!
//! Everything that can stop the machine, plus the ways loading an image can fail.
//!
//! There are two kinds of machine stops. A [`Fault`] is a graceful stop: the simulator prints
//! a diagnostic and the register dump, as if the program had run off the end of instruction
//! memory. A [`Fatal`] error terminates the machine on the spot with only a short diagnostic.
//!

use std::{fmt, io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open file: {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Binary blob in invalid format, expected {expected} bytes got {actual}.")]
    WrongSize { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Load,
    Store,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Load => write!(f, "load"),
            AccessKind::Store => write!(f, "store"),
        }
    }
}

/// A load or store that didn't fit in memory, or a store into instruction memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} of {width} bytes at 0x{addr:08x}")]
pub struct AccessFault {
    pub kind: AccessKind,
    pub addr: u32,
    pub width: usize,
}

/// Stops the machine gracefully. `word` is the raw instruction that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("Instruction Not Implemented: 0x{word:08x}")]
    Decode { word: u32 },

    #[error("Illegal Operation: 0x{word:08x} ({source})")]
    Access {
        word: u32,
        #[source]
        source: AccessFault,
    },

    #[error("Invalid input: {reason}")]
    Input { word: u32, reason: String },
}

/// Terminates the machine immediately
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fatal {
    #[error("Ran out of dynamic memory!")]
    HeapExhausted { size: u32 },

    #[error("Illegal Operation: 0x{word:08x}")]
    IllegalFree { word: u32, addr: u32 },
}
