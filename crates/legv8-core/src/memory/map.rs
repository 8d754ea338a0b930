//! Fixed memory-region map and address decoding helpers.

/// Size in bytes of every backed region (1 MiB).
pub const REGION_BYTES: u64 = 0x0010_0000;
/// Inclusive start address of the text region.
pub const TEXT_START: u64 = 0x0040_0000;
/// Inclusive end address of the text region.
pub const TEXT_END: u64 = TEXT_START + REGION_BYTES - 1;
/// Inclusive start address of the data region.
pub const DATA_START: u64 = 0x1000_0000;
/// Inclusive end address of the data region.
pub const DATA_END: u64 = DATA_START + REGION_BYTES - 1;

/// Canonical fixed-region descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionDescriptor {
    /// Region classification.
    pub region: MemoryRegion,
    /// Inclusive start address.
    pub start: u64,
    /// Inclusive end address.
    pub end: u64,
}

/// Backed regions of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryRegion {
    /// Program text (`0x0040_0000..=0x004F_FFFF`).
    Text,
    /// Program data (`0x1000_0000..=0x100F_FFFF`).
    Data,
}

impl MemoryRegion {
    /// Returns the inclusive bounds for this region.
    #[must_use]
    pub const fn bounds(self) -> (u64, u64) {
        match self {
            Self::Text => (TEXT_START, TEXT_END),
            Self::Data => (DATA_START, DATA_END),
        }
    }

    /// Returns `true` when `addr` belongs to this region.
    #[must_use]
    pub const fn contains(self, addr: u64) -> bool {
        let (start, end) = self.bounds();
        addr >= start && addr <= end
    }

    /// Returns the canonical descriptor for this region.
    #[must_use]
    pub const fn descriptor(self) -> RegionDescriptor {
        let (start, end) = self.bounds();
        RegionDescriptor {
            region: self,
            start,
            end,
        }
    }

    /// Position of this region in [`FIXED_MEMORY_REGIONS`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Text => 0,
            Self::Data => 1,
        }
    }
}

/// Fixed region layout in ascending address order.
pub const FIXED_MEMORY_REGIONS: [RegionDescriptor; 2] = [
    MemoryRegion::Text.descriptor(),
    MemoryRegion::Data.descriptor(),
];

const _: () = assert_fixed_region_layout();

const fn assert_fixed_region_layout() {
    assert!(
        FIXED_MEMORY_REGIONS[0].end < FIXED_MEMORY_REGIONS[1].start,
        "regions must be ascending and disjoint"
    );
    assert!(TEXT_START % 4 == 0, "text region must be word aligned");
    assert!(DATA_START % 4 == 0, "data region must be word aligned");
}

/// Decodes an address into its backing region, or `None` when unbacked.
#[must_use]
pub const fn decode_memory_region(addr: u64) -> Option<MemoryRegion> {
    if MemoryRegion::Text.contains(addr) {
        Some(MemoryRegion::Text)
    } else if MemoryRegion::Data.contains(addr) {
        Some(MemoryRegion::Data)
    } else {
        None
    }
}
