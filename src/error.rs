//! Error types surfaced to callers: fatal CPU decode failures and cartridge load failures.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal processor error. The run cannot continue past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("unknown opcode ${opcode:02X} at ${pc:04X}")]
    UnknownOpcode { pc: u16, opcode: u8 },
}

/// Cartridge image could not be loaded.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("failed to read ROM {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image is {0} bytes, shorter than the 16-byte iNES header")]
    TooShort(usize),
    #[error("bad iNES magic {0:02X?}")]
    BadMagic([u8; 4]),
    #[error("truncated {section}: expected {expected} bytes, found {actual}")]
    Truncated {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),
}
