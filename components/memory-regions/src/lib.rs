//! Memory layout computation for microcontroller linker scripts.
//!
//! A generation pass takes the regions of one [`Device`] as reported by the device database,
//! moves them to the address view the linker needs, expands the boot configuration region into
//! the layout of the device family, adds the exception vector region if required and renders the
//! result, sorted by address, as the MEMORY block of a linker script:
//!
//! ```text
//! MEMORY
//! {
//!   kseg0_program_mem(rx)            : ORIGIN = 0x9D000000, LENGTH = 0x80000
//!   exception_mem                    : ORIGIN = 0x9D000000, LENGTH = 0xA00
//!   kseg1_boot_mem                   : ORIGIN = 0xBFC00000, LENGTH = 0x490
//! }
//! ```
//!
//! Each pass owns its [`RegionCatalog`], so passes for different devices are independent.

mod boot;
mod catalog;
mod device;
mod error;
mod region;
mod render;
mod vectors;

pub use boot::{layout_boot_regions, BootTier};
pub use catalog::RegionCatalog;
pub use device::{Architecture, Device, RawRegion, RegionKind, Subfamily};
pub use error::{Error, Result};
pub use region::{parse_address, Access, Address, MemoryRegion, Segment, NAME_COLUMN_WIDTH};
pub use render::{render, write_linker_script};
pub use vectors::{
    InterruptInfo, DEFAULT_EXCEPTION_BASE, EXCEPTION_MEM, EXCEPTION_PROLOGUE_SIZE,
    VECTOR_SLOT_SIZE,
};
