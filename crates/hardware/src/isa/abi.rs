//! RISC-V Application Binary Interface (ABI) register name constants.
//!
//! Defines the ABI register indices the simulator attaches meaning to.

/// Register x0 (zero register, always zero).
pub const REG_ZERO: usize = 0;
/// Register x1 (return address, ra).
///
/// Its value at program start doubles as the sentinel program counter that
/// signals graceful termination.
pub const REG_RA: usize = 1;
