//! Image Loader and Result Writer.
//!
//! This module reads and writes the binary register/memory image format. It
//! performs the following:
//! 1. **Parsing:** The register prologue (PC, then `x1`-`x31`) followed by any
//!    number of memory fragments, each `(addr: u32, size: u32, bytes)`.
//! 2. **Serialization:** The same prologue followed by exactly one fragment
//!    read back from post-run memory.
//! 3. **File Access:** Thin wrappers around `std::fs`; the byte-level
//!    functions stay pure so they can be tested without touching disk.
//!
//! All multi-byte values are little-endian.

use std::fs;
use std::path::Path;

use crate::common::constants::{GPR_COUNT, IMAGE_FRAGMENT_HEADER, IMAGE_PROLOGUE_WORDS};
use crate::common::error::{SimError, SimResult};
use crate::common::reg::Gpr;
use crate::core::mem::Memory;

/// One contiguous span of initial memory contents.
#[derive(Debug)]
pub struct Fragment {
    /// First byte address the fragment occupies.
    pub addr: u32,
    /// Fragment payload.
    pub data: Vec<u8>,
}

/// Parsed contents of an input image.
#[derive(Debug)]
pub struct Image {
    /// Initial program counter.
    pub pc: u32,
    /// Initial register values; index 0 is unused and stays zero.
    pub regs: [u32; GPR_COUNT],
    /// Initial memory contents.
    pub fragments: Vec<Fragment>,
}

/// Reads a little-endian word at a byte offset. Callers check bounds.
fn read_word(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Parses an image from raw bytes.
///
/// # Errors
///
/// Returns [`SimError::ImageFormat`] when the prologue is short, a fragment
/// header is truncated, or a fragment declares more payload than remains.
pub fn parse_image(bytes: &[u8]) -> SimResult<Image> {
    let prologue = IMAGE_PROLOGUE_WORDS * 4;
    if bytes.len() < prologue {
        return Err(SimError::ImageFormat(format!(
            "register prologue needs {} bytes, file has {}",
            prologue,
            bytes.len()
        )));
    }

    let pc = read_word(bytes, 0);
    let mut regs = [0u32; GPR_COUNT];
    for (i, reg) in regs.iter_mut().enumerate().skip(1) {
        *reg = read_word(bytes, i * 4);
    }

    let mut fragments = Vec::new();
    let mut offset = prologue;
    while offset < bytes.len() {
        if bytes.len() - offset < IMAGE_FRAGMENT_HEADER {
            return Err(SimError::ImageFormat(format!(
                "truncated fragment header at byte {}",
                offset
            )));
        }
        let addr = read_word(bytes, offset);
        let size = read_word(bytes, offset + 4) as usize;
        offset += IMAGE_FRAGMENT_HEADER;

        if bytes.len() - offset < size {
            return Err(SimError::ImageFormat(format!(
                "fragment at {:#x} declares {} bytes but only {} remain",
                addr,
                size,
                bytes.len() - offset
            )));
        }
        fragments.push(Fragment {
            addr,
            data: bytes[offset..offset + size].to_vec(),
        });
        offset += size;
    }

    Ok(Image { pc, regs, fragments })
}

/// Loads and parses an image file.
pub fn load_image(path: &Path) -> SimResult<Image> {
    parse_image(&fs::read(path)?)
}

/// Serializes the post-run state into image bytes.
///
/// Writes the register prologue followed by one fragment of `size` bytes
/// starting at `start_addr`, read back from the (post-flush) memory.
///
/// # Errors
///
/// Returns [`SimError::AddressOutOfRange`] when the requested window escapes
/// the physical address space.
pub fn render_image(
    pc: u32,
    regs: &Gpr,
    memory: &Memory,
    start_addr: u32,
    size: u32,
) -> SimResult<Vec<u8>> {
    let mut out =
        Vec::with_capacity(IMAGE_PROLOGUE_WORDS * 4 + IMAGE_FRAGMENT_HEADER + size as usize);

    out.extend_from_slice(&pc.to_le_bytes());
    for i in 1..GPR_COUNT {
        out.extend_from_slice(&regs.read(i).to_le_bytes());
    }

    out.extend_from_slice(&start_addr.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    for i in 0..size {
        let addr = start_addr
            .checked_add(i)
            .ok_or(SimError::AddressOutOfRange {
                addr: start_addr,
                bits: memory.address_bits(),
            })?;
        out.push(memory.read_u8(addr)?);
    }

    Ok(out)
}

/// Writes the post-run state to an image file.
///
/// The bytes are fully rendered before the file is created, so a failing
/// memory window never leaves a partial file behind.
pub fn write_image(
    path: &Path,
    pc: u32,
    regs: &Gpr,
    memory: &Memory,
    start_addr: u32,
    size: u32,
) -> SimResult<()> {
    let bytes = render_image(pc, regs, memory, start_addr, size)?;
    fs::write(path, bytes)?;
    Ok(())
}
