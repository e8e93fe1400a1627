//! Configuration system for the cache simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (address width, cache geometry, run limits).
//! 2. **Structures:** Hierarchical config for general simulation settings and the cache.
//! 3. **Enums:** Replacement policy selection.
//!
//! Configuration is supplied as JSON via the CLI's `--config` flag, or use
//! `SimConfig::default()` for the built-in geometry.

use serde::Deserialize;

use crate::common::error::{SimError, SimResult};

/// Default configuration constants for the simulator.
///
/// These values define the baseline hardware configuration when not
/// explicitly overridden by a JSON configuration file.
mod defaults {
    /// Width of the physical byte address space in bits.
    ///
    /// Addresses with a numeric value of `2^ADDRESS_BITS` or more are
    /// rejected by the backing memory.
    pub const ADDRESS_BITS: u32 = 17;

    /// Number of cache sets.
    pub const CACHE_SETS: usize = 16;

    /// Cache associativity (number of ways per set).
    pub const CACHE_WAYS: usize = 4;

    /// Cache line size in bytes.
    ///
    /// Lines are the unit of transfer between the cache and backing memory.
    pub const CACHE_LINE: usize = 64;

    /// Hard ceiling on retired instructions per run.
    ///
    /// Guards against guests that never reach their return address.
    pub const MAX_INSTRUCTIONS: u64 = 1_000_000;
}

/// Cache replacement policy algorithms.
///
/// Specifies the algorithm used to select which cache line to evict
/// when a new line must be installed in a fully valid set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicyKind {
    /// True Least Recently Used replacement.
    ///
    /// Tracks exact recency with a monotonic counter per line; the line
    /// with the smallest counter is the victim.
    #[default]
    #[serde(alias = "Lru")]
    Lru,

    /// Tree-bit pseudo-LRU replacement.
    ///
    /// Approximates LRU with a 3-bit binary tree per 4-way set. Constant
    /// time per access and per victim choice.
    #[serde(alias = "BitPlru", alias = "bpLRU")]
    BitPlru,
}

impl ReplacementPolicyKind {
    /// Name used for this policy in the result table.
    pub fn label(&self) -> &'static str {
        match self {
            ReplacementPolicyKind::Lru => "LRU",
            ReplacementPolicyKind::BitPlru => "bpLRU",
        }
    }
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use rvcache_core::config::SimConfig;
///
/// let config = SimConfig::default();
/// assert_eq!(config.cache.sets, 16);
/// assert_eq!(config.cache.ways, 4);
/// assert_eq!(config.general.max_instructions, 1_000_000);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimConfig {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Cache geometry.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl SimConfig {
    /// Validates the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] when any section fails validation.
    pub fn validate(&self) -> SimResult<()> {
        self.cache.validate()?;
        if self.general.max_instructions == 0 {
            return Err(SimError::Config(
                "max_instructions must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Enable per-instruction tracing and diagnostic output.
    #[serde(default)]
    pub trace_instructions: bool,

    /// Fail on unknown opcodes instead of skipping them.
    #[serde(default)]
    pub strict_decode: bool,

    /// Hard ceiling on retired instructions per run.
    #[serde(default = "GeneralConfig::default_max_instructions")]
    pub max_instructions: u64,
}

impl GeneralConfig {
    /// Returns the default instruction ceiling.
    fn default_max_instructions() -> u64 {
        defaults::MAX_INSTRUCTIONS
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_instructions: false,
            strict_decode: false,
            max_instructions: defaults::MAX_INSTRUCTIONS,
        }
    }
}

/// Cache geometry configuration.
///
/// The address decomposition follows directly from the geometry: the low
/// `log2(line_bytes)` bits are the block offset, the next `log2(sets)` bits
/// are the set index, and the remaining address bits form the tag.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Width of the physical byte address space in bits.
    #[serde(default = "CacheConfig::default_address_bits")]
    pub address_bits: u32,

    /// Number of sets.
    #[serde(default = "CacheConfig::default_sets")]
    pub sets: usize,

    /// Associativity (number of ways per set).
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,

    /// Cache line size in bytes.
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,
}

impl CacheConfig {
    /// Returns the default physical address width in bits.
    fn default_address_bits() -> u32 {
        defaults::ADDRESS_BITS
    }

    /// Returns the default number of sets.
    fn default_sets() -> usize {
        defaults::CACHE_SETS
    }

    /// Returns the default associativity.
    fn default_ways() -> usize {
        defaults::CACHE_WAYS
    }

    /// Returns the default line size in bytes.
    fn default_line() -> usize {
        defaults::CACHE_LINE
    }

    /// Number of block-offset bits.
    #[inline]
    pub fn offset_bits(&self) -> u32 {
        self.line_bytes.trailing_zeros()
    }

    /// Number of set-index bits.
    #[inline]
    pub fn index_bits(&self) -> u32 {
        self.sets.trailing_zeros()
    }

    /// Number of tag bits.
    #[inline]
    pub fn tag_bits(&self) -> u32 {
        self.address_bits - self.index_bits() - self.offset_bits()
    }

    /// Largest valid byte address.
    #[inline]
    pub fn max_address(&self) -> u32 {
        (1u32 << self.address_bits) - 1
    }

    /// Validates the cache geometry.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] when the geometry is inconsistent:
    /// non-power-of-two sets or line size, zero ways, or an address width
    /// too small to leave room for a tag.
    pub fn validate(&self) -> SimResult<()> {
        if !self.sets.is_power_of_two() {
            return Err(SimError::Config(format!(
                "set count {} is not a power of two",
                self.sets
            )));
        }
        if !self.line_bytes.is_power_of_two() || self.line_bytes < 4 {
            return Err(SimError::Config(format!(
                "line size {} must be a power of two of at least 4 bytes",
                self.line_bytes
            )));
        }
        if self.ways == 0 {
            return Err(SimError::Config("way count must be at least 1".into()));
        }
        if self.address_bits == 0 || self.address_bits > 31 {
            return Err(SimError::Config(format!(
                "address width {} is outside the supported 1..=31 bit range",
                self.address_bits
            )));
        }
        if self.index_bits() + self.offset_bits() >= self.address_bits {
            return Err(SimError::Config(format!(
                "{} sets of {}-byte lines leave no tag bits in a {}-bit address",
                self.sets, self.line_bytes, self.address_bits
            )));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    /// Creates the default cache geometry: a 4 KiB cache of 16 sets with
    /// 4 ways of 64-byte lines in a 17-bit address space.
    fn default() -> Self {
        Self {
            address_bits: defaults::ADDRESS_BITS,
            sets: defaults::CACHE_SETS,
            ways: defaults::CACHE_WAYS,
            line_bytes: defaults::CACHE_LINE,
        }
    }
}
