//! Set-Associative Cache Model.
//!
//! This module implements the data-carrying set-associative cache that sits in
//! front of the backing memory. It models:
//! 1. **Address Decomposition:** Tag / set index / block offset split derived
//!    from the configured geometry.
//! 2. **Write-Back, Write-Allocate Semantics:** Stores update only the cache;
//!    dirty lines return to memory on eviction or flush.
//! 3. **Replacement:** A pluggable policy (LRU or bit-pLRU) chosen at
//!    construction, with invalid ways always preferred over any policy choice.
//! 4. **Statistics:** Hit/access counters per access category.

/// Cache replacement policy implementations (LRU, bit-pLRU).
pub mod policies;

use self::policies::{BitPlruPolicy, LruPolicy, ReplacementPolicy};
use crate::common::data::AccessType;
use crate::common::error::{SimError, SimResult};
use crate::config::{CacheConfig, ReplacementPolicyKind};
use crate::core::mem::Memory;
use crate::stats::CacheStats;

/// Cache line entry: tag and state bits plus the line's data bytes.
#[derive(Clone)]
struct CacheLine {
    tag: u32,
    valid: bool,
    dirty: bool,
    data: Vec<u8>,
}

impl CacheLine {
    /// Creates an invalid, clean, zero-filled line.
    fn new(line_bytes: usize) -> Self {
        Self {
            tag: 0,
            valid: false,
            dirty: false,
            data: vec![0; line_bytes],
        }
    }
}

/// Set-associative write-back cache in front of a backing [`Memory`].
///
/// The cache owns its backing memory for the duration of a run; line fills
/// and write-backs are issued against it as byte sequences. All guest memory
/// traffic, instruction fetches included, goes through [`Cache::access`].
pub struct Cache {
    lines: Vec<CacheLine>,
    num_sets: usize,
    ways: usize,
    line_bytes: usize,
    offset_bits: u32,
    index_bits: u32,
    policy: Box<dyn ReplacementPolicy>,
    memory: Memory,
    stats: CacheStats,
}

impl Cache {
    /// Creates a new cache with the specified geometry and replacement policy.
    ///
    /// All lines start invalid and clean, and the policy state starts zeroed.
    ///
    /// # Arguments
    ///
    /// * `config` - Cache geometry (sets, ways, line size, address width).
    /// * `kind` - Replacement policy to instantiate.
    /// * `memory` - Backing memory the cache takes ownership of.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] when the geometry fails validation or
    /// when bit-pLRU is requested with a non-power-of-two way count.
    pub fn new(
        config: &CacheConfig,
        kind: ReplacementPolicyKind,
        memory: Memory,
    ) -> SimResult<Self> {
        config.validate()?;

        let policy: Box<dyn ReplacementPolicy> = match kind {
            ReplacementPolicyKind::Lru => Box::new(LruPolicy::new(config.sets, config.ways)),
            ReplacementPolicyKind::BitPlru => {
                if !config.ways.is_power_of_two() {
                    return Err(SimError::Config(format!(
                        "bit-pLRU requires a power-of-two way count, got {}",
                        config.ways
                    )));
                }
                Box::new(BitPlruPolicy::new(config.sets, config.ways))
            }
        };

        Ok(Self {
            lines: vec![CacheLine::new(config.line_bytes); config.sets * config.ways],
            num_sets: config.sets,
            ways: config.ways,
            line_bytes: config.line_bytes,
            offset_bits: config.offset_bits(),
            index_bits: config.index_bits(),
            policy,
            memory,
            stats: CacheStats::default(),
        })
    }

    /// Tag bits of an address.
    #[inline]
    fn tag_of(&self, addr: u32) -> u32 {
        addr >> (self.offset_bits + self.index_bits)
    }

    /// Set index of an address.
    #[inline]
    fn index_of(&self, addr: u32) -> usize {
        ((addr >> self.offset_bits) as usize) & (self.num_sets - 1)
    }

    /// Block offset of an address within its line.
    #[inline]
    fn offset_of(&self, addr: u32) -> usize {
        (addr as usize) & (self.line_bytes - 1)
    }

    /// Base address of the block containing `addr`.
    #[inline]
    fn block_base(&self, addr: u32) -> u32 {
        addr & !((self.line_bytes as u32) - 1)
    }

    /// Reconstructs the base address of the block held by a line.
    #[inline]
    fn line_address(&self, tag: u32, set: usize) -> u32 {
        (tag << (self.offset_bits + self.index_bits)) | ((set as u32) << self.offset_bits)
    }

    /// Flat index of a way within a set.
    #[inline]
    fn line_index(&self, set: usize, way: usize) -> usize {
        set * self.ways + way
    }

    /// Checks whether the block containing `addr` currently resides in the cache.
    ///
    /// Purely observational: no counters or recency state are touched.
    pub fn contains(&self, addr: u32) -> bool {
        let tag = self.tag_of(addr);
        let set = self.index_of(addr);
        (0..self.ways).any(|way| {
            let line = &self.lines[self.line_index(set, way)];
            line.valid && line.tag == tag
        })
    }

    /// Performs one guest access through the cache.
    ///
    /// Looks up the addressed block, installing it from memory on a miss
    /// (write-allocate). Writes deposit the low `size` bytes of `write_data`
    /// at `addr` and mark the line dirty (write-back). The returned value is
    /// the zero-extended contents of the `size` bytes starting at `addr`,
    /// read after any write effect; sign extension of loads is the
    /// executor's concern.
    ///
    /// # Arguments
    ///
    /// * `addr` - Byte address of the access.
    /// * `access` - Access category; `Fetch` and `Read` ignore `write_data`.
    /// * `write_data` - Data for `Write` accesses, low `size` bytes significant.
    /// * `size` - Access width in bytes: 1, 2, or 4.
    ///
    /// # Errors
    ///
    /// * [`SimError::InvalidAccessSize`] for widths other than 1, 2, or 4.
    /// * [`SimError::CrossesLineBoundary`] when the access would span two lines.
    /// * [`SimError::AddressOutOfRange`] when any byte falls outside the
    ///   physical address space.
    pub fn access(
        &mut self,
        addr: u32,
        access: AccessType,
        write_data: u32,
        size: u32,
    ) -> SimResult<u32> {
        if !matches!(size, 1 | 2 | 4) {
            return Err(SimError::InvalidAccessSize { size });
        }
        let offset = self.offset_of(addr);
        if offset + size as usize > self.line_bytes {
            return Err(SimError::CrossesLineBoundary { addr, size });
        }
        self.memory.check_range(addr, size)?;

        self.stats.record_access(access);

        let tag = self.tag_of(addr);
        let set = self.index_of(addr);

        let hit_way = (0..self.ways).find(|&way| {
            let line = &self.lines[self.line_index(set, way)];
            line.valid && line.tag == tag
        });

        let way = match hit_way {
            Some(way) => {
                self.stats.record_hit(access);
                way
            }
            None => {
                let victim = self.choose_way(set);
                self.load_line(set, victim, addr)?;
                victim
            }
        };
        self.policy.update(set, way);

        let idx = self.line_index(set, way);
        let line = &mut self.lines[idx];
        if access.is_write() {
            line.dirty = true;
            for i in 0..size as usize {
                line.data[offset + i] = (write_data >> (i * 8)) as u8;
            }
        }

        let mut result = 0u32;
        for i in 0..size as usize {
            result |= (line.data[offset + i] as u32) << (i * 8);
        }
        Ok(result)
    }

    /// Chooses the way a missing block will be installed into.
    ///
    /// Any invalid way is taken before the policy is consulted; the policy
    /// only ranks fully valid sets.
    fn choose_way(&mut self, set: usize) -> usize {
        for way in 0..self.ways {
            if !self.lines[self.line_index(set, way)].valid {
                return way;
            }
        }
        self.policy.get_victim(set)
    }

    /// Installs the block containing `addr` into the given way.
    ///
    /// A valid dirty victim is first written back to memory byte by byte at
    /// its reconstructed block address. The line is then revalidated with the
    /// new tag, marked clean, and filled from the block base address.
    fn load_line(&mut self, set: usize, way: usize, addr: u32) -> SimResult<()> {
        let idx = self.line_index(set, way);

        if self.lines[idx].valid {
            self.stats.evictions += 1;
            if self.lines[idx].dirty {
                let old_addr = self.line_address(self.lines[idx].tag, set);
                for i in 0..self.line_bytes {
                    self.memory
                        .write_u8(old_addr + i as u32, self.lines[idx].data[i])?;
                }
                self.stats.writebacks += 1;
            }
        }

        let base = self.block_base(addr);
        self.lines[idx].valid = true;
        self.lines[idx].tag = self.tag_of(addr);
        self.lines[idx].dirty = false;
        for i in 0..self.line_bytes {
            let byte = self.memory.read_u8(base + i as u32)?;
            self.lines[idx].data[i] = byte;
        }
        Ok(())
    }

    /// Writes every valid dirty line back to memory.
    ///
    /// Lines stay valid and are left clean, so flushing twice is a no-op the
    /// second time.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfRange`] if a write-back target escapes
    /// the physical address space, which cannot happen for lines installed
    /// through [`Cache::access`].
    pub fn flush(&mut self) -> SimResult<()> {
        for set in 0..self.num_sets {
            for way in 0..self.ways {
                let idx = self.line_index(set, way);
                if self.lines[idx].valid && self.lines[idx].dirty {
                    let base = self.line_address(self.lines[idx].tag, set);
                    for i in 0..self.line_bytes {
                        self.memory
                            .write_u8(base + i as u32, self.lines[idx].data[i])?;
                    }
                    self.stats.writebacks += 1;
                    self.lines[idx].dirty = false;
                }
            }
        }
        Ok(())
    }

    /// Access and hit counters accumulated so far.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Shared view of the backing memory.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable view of the backing memory.
    ///
    /// Used by the loader to seed guest memory before execution; going around
    /// the cache after the first access would desynchronize resident lines.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
}
