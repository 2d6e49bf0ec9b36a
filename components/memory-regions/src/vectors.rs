use log::debug;
use serde::Deserialize;

use crate::region::{deserialize_address, Access, MemoryRegion};

/// Name of the region holding the exception entry points and the interrupt vector table.
pub const EXCEPTION_MEM: &str = "exception_mem";
/// Base address used when the device does not specify one.
pub const DEFAULT_EXCEPTION_BASE: u32 = 0x9D00_0000;
/// Space for the general exception and TLB refill entry points in front of the vectors.
pub const EXCEPTION_PROLOGUE_SIZE: u32 = 0x200;
/// Size of one vector slot with fixed vector offsets.
pub const VECTOR_SLOT_SIZE: u32 = 32;

/// Interrupt controller properties of a device.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct InterruptInfo {
    /// Whether vector offsets are programmable.  If set, the vectors are placed in program
    /// memory by the linker and need no region of their own.
    #[serde(default)]
    pub has_variable_offsets: bool,
    /// Base of the exception region, `0` selects [`DEFAULT_EXCEPTION_BASE`].
    #[serde(default, deserialize_with = "deserialize_address")]
    pub default_base_address: u32,
    pub last_vector_number: u32,
}

impl InterruptInfo {
    pub fn effective_base(&self) -> u32 {
        match self.default_base_address {
            0 => DEFAULT_EXCEPTION_BASE,
            base => base,
        }
    }

    /// Size of the exception region: the prologue followed by one slot per vector.
    pub fn region_length(&self) -> u32 {
        let vectors = self.last_vector_number.wrapping_add(1);
        EXCEPTION_PROLOGUE_SIZE.wrapping_add(VECTOR_SLOT_SIZE.wrapping_mul(vectors))
    }

    /// Returns the exception region if the vectors need one.
    ///
    /// Devices with variable offsets and devices of an `excluded` subfamily keep their vectors
    /// inside another region.
    pub fn exception_region(&self, excluded: bool) -> Option<MemoryRegion> {
        if self.has_variable_offsets || excluded {
            debug!("No separate exception region (excluded: {excluded}, {self:?})");
            return None;
        }
        let start = u64::from(self.effective_base());
        let end = start + u64::from(self.region_length());
        Some(MemoryRegion::new(EXCEPTION_MEM, Access::empty(), start, end))
    }
}
