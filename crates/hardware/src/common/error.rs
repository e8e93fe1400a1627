//! Simulator Error Taxonomy.
//!
//! This module defines the error handling for the simulator. It provides:
//! 1. **Fatal Errors:** Contract violations in the memory and cache models.
//! 2. **Decode Errors:** Unknown opcodes when strict decoding is enabled.
//! 3. **I/O and Format Errors:** Failures while reading or writing image files.
//!
//! All fatal errors propagate up to the driver, which reports them on the
//! error stream and exits with a non-zero code.

use thiserror::Error;

/// Result alias used by every fallible operation in the simulator.
pub type SimResult<T> = Result<T, SimError>;

/// Top-level error type for the simulator.
#[derive(Error, Debug)]
pub enum SimError {
    /// File open, read, or write failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A memory access fell outside the physical address space.
    #[error("address {addr:#x} is outside the {bits}-bit physical address space")]
    AddressOutOfRange { addr: u32, bits: u32 },

    /// A cache access used a size other than 1, 2, or 4 bytes.
    #[error("invalid access size {size} (expected 1, 2, or 4)")]
    InvalidAccessSize { size: u32 },

    /// A cache access would span two cache lines.
    #[error("{size}-byte access at {addr:#x} crosses a cache line boundary")]
    CrossesLineBoundary { addr: u32, size: u32 },

    /// An instruction with an unrecognized opcode was fetched in strict mode.
    #[error("unknown opcode in instruction {inst:#010x} at pc {pc:#010x}")]
    UnknownOpcode { inst: u32, pc: u32 },

    /// The input image did not follow the register/fragment layout.
    #[error("malformed image file: {0}")]
    ImageFormat(String),

    /// The simulator configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}
