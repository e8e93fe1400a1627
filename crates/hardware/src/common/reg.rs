//! General-Purpose Register File.
//!
//! This module implements the 32-entry register file of the RV32 architecture.
//! It performs the following:
//! 1. **Storage:** Maintains 32 unsigned 32-bit registers (`x0`-`x31`).
//! 2. **Invariant Enforcement:** Ensures that register `x0` is hardwired to zero.
//! 3. **Debugging:** Provides a utility for dumping the complete register state.

use super::constants::GPR_COUNT;

/// General-purpose register file.
///
/// Contains 32 registers used for integer operations. Register `x0` is
/// hardwired to zero: reads always return 0 and writes are discarded.
#[derive(Clone)]
pub struct Gpr {
    regs: [u32; GPR_COUNT],
}

impl Gpr {
    /// Creates a new register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self {
            regs: [0; GPR_COUNT],
        }
    }

    /// Reads a register value.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31). Register `x0` always returns 0.
    pub fn read(&self, idx: usize) -> u32 {
        if idx == 0 { 0 } else { self.regs[idx] }
    }

    /// Writes a value to a register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31). Writes to `x0` are ignored.
    /// * `val` - The 32-bit value to write.
    pub fn write(&mut self, idx: usize, val: u32) {
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    /// Dumps the contents of all registers to stderr.
    ///
    /// Displays registers in pairs with hexadecimal formatting. The result
    /// table owns stdout, so diagnostics go to the error stream.
    pub fn dump(&self) {
        for i in (0..GPR_COUNT).step_by(2) {
            eprintln!(
                "x{:<2}={:#010x} x{:<2}={:#010x}",
                i,
                self.read(i),
                i + 1,
                self.read(i + 1)
            );
        }
    }
}

impl Default for Gpr {
    fn default() -> Self {
        Self::new()
    }
}
