//! Boot flash layouts of the segmented architecture.
//!
//! Devices report a single boot configuration region.  Depending on its size, the device belongs
//! to a family whose boot flash is split into fixed sub-regions by the silicon and the debugger:
//!
//! | boot region size | family     | debugger reservation |
//! |------------------|------------|----------------------|
//! | ≤ 3 KiB          | small      | `debug_exec_mem`     |
//! | ≤ 12 KiB         | mid-range  | `debug_exec_mem`     |
//! | ≤ 20 KiB         | high-end A | `debug_exec_mem`     |
//! | larger           | high-end B | none                 |
//!
//! The addresses are taken from the device data sheets, they cannot be derived from the size.
//! Zero-length regions mark addresses the startup code refers to by name.

use log::debug;

use crate::region::{Access, MemoryRegion};

const KIB: u32 = 1024;

type Layout = &'static [(&'static str, u32, u32)];

const SMALL: Layout = &[
    ("debug_exec_mem", 0x9FC0_0490, 0x9FC0_0BF0),
    ("kseg0_boot_mem", 0x9FC0_0490, 0x9FC0_0490),
    ("kseg1_boot_mem", 0xBFC0_0000, 0xBFC0_0490),
];

// debug_exec_mem ends before it starts, which the device database reports like this
const MID_RANGE: Layout = &[
    ("kseg0_boot_mem", 0x9FC0_0490, 0x9FC0_0E00),
    ("kseg1_boot_mem", 0xBFC0_0000, 0xBFC0_0490),
    ("debug_exec_mem", 0xBFC0_2000, 0xBFC0_0FF0),
];

const HIGH_END_A: Layout = &[
    ("kseg0_boot_mem", 0x9FC0_04B0, 0x9FC0_04B0),
    ("debug_exec_mem", 0x9FC2_0490, 0x9FC2_3FB0),
    ("kseg0_boot_mem", 0x9FC2_0490, 0x9FC2_0490),
    ("kseg1_boot_mem", 0xBFC0_0000, 0xBFC0_0480),
    ("kseg1_boot_mem_4B0", 0xBFC0_04B0, 0xBFC0_3FB0),
];

const HIGH_END_B: Layout = &[
    ("kseg0_boot_mem", 0x9FC0_04B0, 0x9FC0_04B0),
    ("kseg1_boot_mem", 0xBFC0_0000, 0xBFC0_0480),
    ("kseg1_boot_mem_4B0", 0xBFC0_04B0, 0xBFC0_FF00),
];

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BootTier {
    Small,
    MidRange,
    HighEndA,
    HighEndB,
}

impl BootTier {
    /// Upper size bounds of the tiers, checked in order.
    const LADDER: [(u32, Self); 3] = [
        (3 * KIB, Self::Small),
        (12 * KIB, Self::MidRange),
        (20 * KIB, Self::HighEndA),
    ];

    /// Selects the tier for a boot region of `length` bytes.
    pub fn for_length(length: u32) -> Self {
        Self::LADDER
            .iter()
            .find(|(limit, _)| length <= *limit)
            .map(|(_, tier)| *tier)
            .unwrap_or(Self::HighEndB)
    }

    fn layout(self) -> Layout {
        match self {
            Self::Small => SMALL,
            Self::MidRange => MID_RANGE,
            Self::HighEndA => HIGH_END_A,
            Self::HighEndB => HIGH_END_B,
        }
    }

    /// The sub-regions of this tier in data sheet order.
    pub fn regions(self) -> Vec<MemoryRegion> {
        self.layout()
            .iter()
            .map(|&(name, start, end)| {
                MemoryRegion::new(name, Access::empty(), start.into(), end.into())
            })
            .collect()
    }
}

/// Replaces the raw boot configuration region with the sub-regions of its family.
pub fn layout_boot_regions(raw: &MemoryRegion) -> Vec<MemoryRegion> {
    let tier = BootTier::for_length(raw.length());
    debug!(
        "Boot region {} with {:#x} bytes uses the {:?} layout",
        raw.name(),
        raw.length(),
        tier
    );
    tier.regions()
}
