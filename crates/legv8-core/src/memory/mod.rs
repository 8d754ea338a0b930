//! Memory model primitives and the fixed two-region backing store.

/// Sub-word lane and doubleword helpers over [`MemoryBus`].
pub mod access;
/// Fixed memory-region map and address decoder.
pub mod map;

use std::fmt;

pub use access::{
    aligned_word_address, byte_lane, extract_byte, extract_halfword, halfword_lane, insert_byte,
    insert_halfword, read_byte, read_doubleword, read_halfword, write_byte, write_doubleword,
    write_halfword, WORD_ACCESS_BYTES,
};
pub use map::{
    decode_memory_region, MemoryRegion, RegionDescriptor, DATA_END, DATA_START,
    FIXED_MEMORY_REGIONS, REGION_BYTES, TEXT_END, TEXT_START,
};

use crate::api::MemoryBus;

/// Byte-addressable store backing the text and data regions.
///
/// Bytes outside both regions read as zero and writes to them are dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct RegionMemory {
    regions: [Box<[u8]>; FIXED_MEMORY_REGIONS.len()],
}

impl Default for RegionMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RegionMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionMemory")
            .field("regions", &FIXED_MEMORY_REGIONS)
            .finish_non_exhaustive()
    }
}

impl RegionMemory {
    /// Allocates zeroed text and data regions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: [new_region(), new_region()],
        }
    }

    /// Reads one byte. Unbacked addresses read as zero.
    #[must_use]
    pub fn read_u8(&self, addr: u64) -> u8 {
        locate(addr).map_or(0, |(region, offset)| self.regions[region.index()][offset])
    }

    /// Writes one byte. Writes to unbacked addresses are dropped.
    pub fn write_u8(&mut self, addr: u64, value: u8) {
        match locate(addr) {
            Some((region, offset)) => self.regions[region.index()][offset] = value,
            None => tracing::trace!(addr, value, "dropped write to unbacked address"),
        }
    }

    /// Returns the raw bytes of one region.
    #[must_use]
    pub fn region_bytes(&self, region: MemoryRegion) -> &[u8] {
        &self.regions[region.index()]
    }
}

impl MemoryBus for RegionMemory {
    fn read_word(&self, addr: u64) -> u32 {
        let mut bytes = [0_u8; 4];
        for (offset, byte) in (0_u64..).zip(bytes.iter_mut()) {
            *byte = self.read_u8(addr.wrapping_add(offset));
        }
        let value = u32::from_le_bytes(bytes);
        tracing::trace!(addr, value, "memory read");
        value
    }

    fn write_word(&mut self, addr: u64, value: u32) {
        tracing::trace!(addr, value, "memory write");
        for (offset, byte) in (0_u64..).zip(value.to_le_bytes()) {
            self.write_u8(addr.wrapping_add(offset), byte);
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn new_region() -> Box<[u8]> {
    vec![0; REGION_BYTES as usize].into_boxed_slice()
}

fn locate(addr: u64) -> Option<(MemoryRegion, usize)> {
    let region = decode_memory_region(addr)?;
    let (start, _) = region.bounds();
    let offset = usize::try_from(addr - start).ok()?;
    Some((region, offset))
}
