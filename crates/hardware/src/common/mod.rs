//! Common utilities and types used throughout the cache simulator.
//!
//! This module provides fundamental building blocks that are shared across all
//! components of the simulator. It includes:
//! 1. **Constants:** System-wide constants for instruction encoding and the image format.
//! 2. **Memory Access:** Definitions for categorizing memory operations (Fetch/Read/Write).
//! 3. **Error Handling:** The simulator-wide error taxonomy.
//! 4. **Register Management:** The general-purpose register file.

/// Common constants used throughout the simulator.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Error types and the simulator result alias.
pub mod error;

/// Register file implementation.
pub mod reg;

pub use data::AccessType;
pub use error::{SimError, SimResult};
pub use reg::Gpr;
