//! Sparse Backing Memory.
//!
//! This module implements the byte-addressable backing store behind the cache.
//! It performs the following:
//! 1. **Sparse Storage:** Only written bytes consume host memory; unwritten
//!    addresses read as zero.
//! 2. **Bounds Enforcement:** Every byte of every access is checked against
//!    the configured physical address width.
//! 3. **Little-Endian Composition:** 16-bit and 32-bit helpers built on the
//!    byte operations.
//!
//! There is no bulk-transfer interface: cache line fills and write-backs are
//! issued as byte sequences by the cache.

use std::collections::BTreeMap;

use crate::common::error::{SimError, SimResult};

/// Sparse byte-addressable memory.
///
/// A mapping from physical byte address to byte value. Reads of unwritten
/// addresses yield zero. Accesses outside the configured address space fail
/// with [`SimError::AddressOutOfRange`].
pub struct Memory {
    bytes: BTreeMap<u32, u8>,
    address_bits: u32,
    max_address: u32,
}

impl Memory {
    /// Creates an empty memory covering a `address_bits`-wide address space.
    pub fn new(address_bits: u32) -> Self {
        Self {
            bytes: BTreeMap::new(),
            address_bits,
            max_address: (1u32 << address_bits) - 1,
        }
    }

    /// Width of the physical address space in bits.
    pub fn address_bits(&self) -> u32 {
        self.address_bits
    }

    /// Checks that a single address lies inside the physical address space.
    #[inline]
    fn check(&self, addr: u32) -> SimResult<()> {
        if addr > self.max_address {
            return Err(SimError::AddressOutOfRange {
                addr,
                bits: self.address_bits,
            });
        }
        Ok(())
    }

    /// Checks that every byte of an access lies inside the address space.
    ///
    /// # Arguments
    ///
    /// * `addr` - First byte of the access.
    /// * `len` - Length of the access in bytes; must be non-zero.
    pub fn check_range(&self, addr: u32, len: u32) -> SimResult<()> {
        self.check(addr)?;
        let last = addr
            .checked_add(len - 1)
            .ok_or(SimError::AddressOutOfRange {
                addr,
                bits: self.address_bits,
            })?;
        self.check(last)
    }

    /// Reads one byte. Unwritten addresses read as zero.
    pub fn read_u8(&self, addr: u32) -> SimResult<u8> {
        self.check(addr)?;
        Ok(self.bytes.get(&addr).copied().unwrap_or(0))
    }

    /// Writes one byte.
    pub fn write_u8(&mut self, addr: u32, val: u8) -> SimResult<()> {
        self.check(addr)?;
        self.bytes.insert(addr, val);
        Ok(())
    }

    /// Reads a little-endian halfword. The whole span is validated first.
    pub fn read_u16(&self, addr: u32) -> SimResult<u16> {
        self.check_range(addr, 2)?;
        let lo = self.read_u8(addr)? as u16;
        let hi = self.read_u8(addr + 1)? as u16;
        Ok(lo | (hi << 8))
    }

    /// Writes a little-endian halfword. The whole span is validated before
    /// any byte is stored.
    pub fn write_u16(&mut self, addr: u32, val: u16) -> SimResult<()> {
        self.check_range(addr, 2)?;
        self.write_u8(addr, val as u8)?;
        self.write_u8(addr + 1, (val >> 8) as u8)
    }

    /// Reads a little-endian word. The whole span is validated first.
    pub fn read_u32(&self, addr: u32) -> SimResult<u32> {
        self.check_range(addr, 4)?;
        let mut val = 0u32;
        for i in 0..4 {
            val |= (self.read_u8(addr + i)? as u32) << (i * 8);
        }
        Ok(val)
    }

    /// Writes a little-endian word. The whole span is validated before any
    /// byte is stored.
    pub fn write_u32(&mut self, addr: u32, val: u32) -> SimResult<()> {
        self.check_range(addr, 4)?;
        for i in 0..4 {
            self.write_u8(addr + i, (val >> (i * 8)) as u8)?;
        }
        Ok(())
    }
}
