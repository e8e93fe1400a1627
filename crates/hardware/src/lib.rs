//! RV32IM trace-driven cache simulator library.
//!
//! This crate models the hit-rate behavior of two cache replacement policies,
//! true LRU and tree-bit pseudo-LRU, under the access stream of a small guest
//! program executed by a minimal RV32IM core. It provides:
//! 1. **Memory:** Sparse byte-addressable backing store with bounds checking.
//! 2. **Cache:** Set-associative write-back/write-allocate cache with
//!    pluggable replacement policies and per-stream hit counters.
//! 3. **ISA:** Decoding and execution of RV32I plus the M extension.
//! 4. **Simulation:** Image loading, the per-policy run driver, and the
//!    policy comparison table.

/// Common types and constants (access types, errors, registers).
pub mod common;
/// Simulator configuration (defaults, geometry, policy selection).
pub mod config;
/// Hardware models (memory, cache, CPU core).
pub mod core;
/// Instruction set (field extraction, decode, RV32I/M constants).
pub mod isa;
/// Image loader and run driver.
pub mod sim;
/// Statistics collection and the comparison table.
pub mod stats;

/// Root configuration type; use `SimConfig::default()` or deserialize from JSON.
pub use crate::config::SimConfig;
/// Hardware models re-exported for direct construction in tests and drivers.
pub use crate::core::{Cache, Cpu, Memory};
/// Per-policy run driver; construct one per replacement policy.
pub use crate::sim::Simulation;
