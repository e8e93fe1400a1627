//! Per-Policy Run Driver.
//!
//! This module seeds a core from a parsed image and runs it to termination.
//! The two replacement policies are compared by constructing one `Simulation`
//! per policy from the same image; runs are fully independent, each with its
//! own core, cache, and memory.

use log::warn;

use crate::common::constants::GPR_COUNT;
use crate::common::error::{SimError, SimResult};
use crate::config::{ReplacementPolicyKind, SimConfig};
use crate::core::cache::Cache;
use crate::core::cpu::Cpu;
use crate::core::mem::Memory;
use crate::sim::loader::Image;
use crate::stats::CacheStats;

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationReason {
    /// The program counter reached the return address captured at start.
    ReturnedToCaller,
    /// An ECALL or EBREAK halted the core.
    EnvironmentCall,
    /// The retired-instruction ceiling was hit.
    InstructionLimit,
}

/// Result of a completed run.
#[derive(Clone, Copy, Debug)]
pub struct RunOutcome {
    /// Why the run stopped.
    pub reason: TerminationReason,
    /// Number of instructions retired.
    pub instructions_retired: u64,
}

/// One policy run: a core wired to a fresh cache and memory.
pub struct Simulation {
    /// The core under simulation.
    pub cpu: Cpu,
    max_instructions: u64,
}

impl Simulation {
    /// Builds a run from a parsed image.
    ///
    /// Seeds memory from the image fragments, constructs the cache with the
    /// requested replacement policy, loads the register file and program
    /// counter, and captures the value of `x1` as the termination sentinel.
    ///
    /// # Errors
    ///
    /// Returns configuration errors for an invalid geometry and
    /// [`SimError::AddressOutOfRange`] for fragments that escape the
    /// physical address space.
    pub fn new(
        config: &SimConfig,
        policy: ReplacementPolicyKind,
        image: &Image,
    ) -> SimResult<Self> {
        config.validate()?;

        let mut memory = Memory::new(config.cache.address_bits);
        for frag in &image.fragments {
            for (i, byte) in frag.data.iter().enumerate() {
                let addr = frag
                    .addr
                    .checked_add(i as u32)
                    .ok_or(SimError::AddressOutOfRange {
                        addr: frag.addr,
                        bits: memory.address_bits(),
                    })?;
                memory.write_u8(addr, *byte)?;
            }
        }

        let cache = Cache::new(&config.cache, policy, memory)?;
        let mut cpu = Cpu::new(cache, &config.general);
        cpu.pc = image.pc;
        for idx in 1..GPR_COUNT {
            cpu.regs.write(idx, image.regs[idx]);
        }
        cpu.capture_initial_ra();

        Ok(Self {
            cpu,
            max_instructions: config.general.max_instructions,
        })
    }

    /// Runs the guest to termination and flushes the cache.
    ///
    /// The loop stops when the program counter equals the captured return
    /// address, when an ECALL/EBREAK halts the core, or when the
    /// retired-instruction ceiling is reached (a diagnostic is emitted and
    /// statistics remain valid). The cache is flushed on every termination
    /// path so memory holds the definitive run result.
    ///
    /// # Errors
    ///
    /// Propagates fatal cache/memory errors and, in strict mode, unknown
    /// opcodes.
    pub fn run(&mut self) -> SimResult<RunOutcome> {
        let mut retired: u64 = 0;
        let reason = loop {
            if self.cpu.pc == self.cpu.initial_ra() {
                break TerminationReason::ReturnedToCaller;
            }
            if retired >= self.max_instructions {
                warn!(
                    "reached the {} instruction ceiling at pc {:#010x} (initial ra {:#010x})",
                    self.max_instructions,
                    self.cpu.pc,
                    self.cpu.initial_ra()
                );
                break TerminationReason::InstructionLimit;
            }
            self.cpu.step()?;
            retired += 1;
            if self.cpu.halted() {
                break TerminationReason::EnvironmentCall;
            }
        };

        self.cpu.cache.flush()?;
        Ok(RunOutcome {
            reason,
            instructions_retired: retired,
        })
    }

    /// Copy of the cache statistics accumulated so far.
    pub fn stats(&self) -> CacheStats {
        *self.cpu.cache.stats()
    }
}
