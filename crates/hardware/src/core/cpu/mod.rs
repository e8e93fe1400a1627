//! RV32IM Processor Core.
//!
//! This module implements the architectural state and instruction cycle of the
//! emulated core. It provides:
//! 1. **State:** The general-purpose register file and program counter.
//! 2. **Fetch:** Instruction fetches routed through the cache as 4-byte reads.
//! 3. **Step:** The fetch/decode/execute cycle for a single instruction.
//! 4. **Termination Capture:** The return-address sentinel and the halt flag
//!    raised by environment calls.

/// Instruction semantics (opcode dispatch and execution helpers).
mod execution;

use log::debug;

use crate::common::constants::INSTRUCTION_SIZE;
use crate::common::data::AccessType;
use crate::common::error::SimResult;
use crate::common::reg::Gpr;
use crate::config::GeneralConfig;
use crate::core::cache::Cache;
use crate::isa::abi;
use crate::isa::decode::decode;

/// RV32IM processor core.
///
/// Owns the register file, the program counter, and the cache (which in turn
/// owns the backing memory). Every instruction fetch and every data access of
/// the guest flows through the cache, producing the access trace under
/// measurement.
pub struct Cpu {
    /// General-purpose registers.
    pub regs: Gpr,
    /// Program counter.
    pub pc: u32,
    /// Cache front-ending all guest memory traffic.
    pub cache: Cache,
    initial_ra: u32,
    halted: bool,
    trace: bool,
    strict_decode: bool,
}

impl Cpu {
    /// Creates a new core with zeroed registers in front of the given cache.
    ///
    /// # Arguments
    ///
    /// * `cache` - The cache (and backing memory) the core will execute against.
    /// * `general` - General settings: tracing and strict decoding.
    pub fn new(cache: Cache, general: &GeneralConfig) -> Self {
        Self {
            regs: Gpr::new(),
            pc: 0,
            cache,
            initial_ra: 0,
            halted: false,
            trace: general.trace_instructions,
            strict_decode: general.strict_decode,
        }
    }

    /// Records the current value of `x1` as the termination sentinel.
    ///
    /// Called once after the register file has been seeded from the image and
    /// before the first instruction executes. The run loop stops when the
    /// program counter equals this value.
    pub fn capture_initial_ra(&mut self) {
        self.initial_ra = self.regs.read(abi::REG_RA);
    }

    /// The termination sentinel captured at program start.
    pub fn initial_ra(&self) -> u32 {
        self.initial_ra
    }

    /// Whether an ECALL or EBREAK has halted the core.
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Fetches the instruction word at the current program counter.
    ///
    /// Always a 4-byte read counted against the instruction stream.
    pub fn fetch(&mut self) -> SimResult<u32> {
        self.cache
            .access(self.pc, AccessType::Fetch, 0, INSTRUCTION_SIZE)
    }

    /// Executes one instruction: fetch, decode, execute.
    ///
    /// The program counter is left at the follow-on instruction (or branch
    /// target); register `x0` is re-pinned to zero at the boundary.
    ///
    /// # Errors
    ///
    /// Propagates cache/memory contract violations and, in strict mode,
    /// unknown opcodes.
    pub fn step(&mut self) -> SimResult<()> {
        let inst = self.fetch()?;
        let decoded = decode(inst);
        if self.trace {
            debug!("pc={:#010x} inst={:#010x}", self.pc, inst);
        }
        self.execute(&decoded)?;
        self.regs.write(abi::REG_ZERO, 0);
        Ok(())
    }
}
