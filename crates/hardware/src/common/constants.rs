//! Global System Constants.
//!
//! This module defines system-wide constants used across the simulator. It includes:
//! 1. **Instruction Constants:** Encoding width of the base instruction set.
//! 2. **Register Constants:** Size of the architectural register file.
//! 3. **Image Constants:** Fixed layout values of the register/memory image format.

/// Size of a standard (32-bit) RISC-V instruction in bytes.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Number of general-purpose registers (`x0`-`x31`).
pub const GPR_COUNT: usize = 32;

/// Number of 32-bit words in the register prologue of an image file.
///
/// The prologue holds the program counter followed by registers `x1`-`x31`.
pub const IMAGE_PROLOGUE_WORDS: usize = GPR_COUNT;

/// Number of bytes in the header of a memory fragment (address + size).
pub const IMAGE_FRAGMENT_HEADER: usize = 8;
