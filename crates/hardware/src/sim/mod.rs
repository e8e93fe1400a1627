//! Simulation orchestration: image loading and the run driver.
//!
//! This module connects the hardware models to the outside world:
//! 1. **Loader:** Parses register/memory image files and writes result images.
//! 2. **Simulator:** Seeds a core from an image and runs it to termination
//!    under one replacement policy.

/// Image file parsing and serialization.
pub mod loader;

/// Per-policy run driver.
pub mod simulator;

pub use loader::{Fragment, Image};
pub use simulator::{RunOutcome, Simulation, TerminationReason};
