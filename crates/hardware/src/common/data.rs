//! Memory Access Types.
//!
//! This module defines the classification of memory accesses used throughout the
//! simulator. These types are used for the following:
//! 1. **Statistics Tracking:** Categorizing cache accesses into the instruction and data streams.
//! 2. **Write Handling:** Deciding whether an access deposits data into the cache line.

/// Type of memory access operation.
///
/// Used to distinguish between instruction fetches, data loads, and data stores
/// when routing an access through the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Instruction fetch access.
    ///
    /// Occurs when fetching instruction words at the current program counter.
    /// Always a 4-byte read.
    Fetch,

    /// Data read access.
    ///
    /// Occurs during load instructions when reading data from memory into registers.
    Read,

    /// Data write access.
    ///
    /// Occurs during store instructions when writing register data to memory.
    Write,
}

impl AccessType {
    /// Returns `true` for accesses counted against the instruction stream.
    #[inline(always)]
    pub fn is_instruction(&self) -> bool {
        matches!(self, AccessType::Fetch)
    }

    /// Returns `true` for accesses that modify the addressed bytes.
    #[inline(always)]
    pub fn is_write(&self) -> bool {
        matches!(self, AccessType::Write)
    }
}
