use core::{cmp::Ordering, fmt};

use bitflags::bitflags;
use serde::{de::Error as _, Deserialize, Deserializer};

use crate::{Error, Result};

/// Width of the name column in a rendered MEMORY line, access suffix included.
pub const NAME_COLUMN_WIDTH: usize = 32;

bitflags! {
    /// Access attributes of a memory region as understood by the linker.
    ///
    /// The empty set leaves placement to the linker.  Combinations are not validated, so
    /// `EXECUTE` and `NOT_EXECUTABLE` may be set at the same time.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Access: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXECUTE = 1 << 2;
        const NOT_EXECUTABLE = 1 << 3;
    }
}

impl fmt::Display for Access {
    /// Writes the linker attribute suffix, e. g. `(rx)` or `(w!x)`, or nothing if empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (flag, letter) in [
            (Self::READ, "r"),
            (Self::WRITE, "w"),
            (Self::EXECUTE, "x"),
            (Self::NOT_EXECUTABLE, "!x"),
        ] {
            if self.contains(flag) {
                f.write_str(letter)?;
            }
        }
        f.write_str(")")
    }
}

/// Alternate views of the physical address space on the segmented (MIPS32) architecture.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Segment {
    /// Kernel, cached, unmapped.
    Kseg0,
    /// Kernel, uncached, unmapped.
    Kseg1,
    /// Kernel, mapped.
    Kseg2,
    /// Kernel, mapped.
    Kseg3,
}

impl Segment {
    /// Bits of an address that select the physical location.
    pub const PHYSICAL_MASK: u32 = 0x1FFF_FFFF;

    pub const fn base(self) -> u32 {
        match self {
            Self::Kseg0 => 0x8000_0000,
            Self::Kseg1 => 0xA000_0000,
            Self::Kseg2 => 0xC000_0000,
            Self::Kseg3 => 0xE000_0000,
        }
    }

    /// Maps `address` into this segment.  Only the physical bits of `address` are used, so the
    /// result does not depend on the segment `address` was in before.
    pub const fn overlay(self, address: u32) -> u32 {
        (address & Self::PHYSICAL_MASK) | self.base()
    }
}

/// A named, contiguous range of the 32-bit address space.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MemoryRegion {
    name: String,
    access: Access,
    start: u32,
    length: u32,
}

impl MemoryRegion {
    /// Creates a region spanning `start..end`.
    ///
    /// Both bounds are truncated to 32 bits.  The length is `end - start` modulo 2^32, so an
    /// inverted range yields a huge length instead of an error.  Use [`MemoryRegion::checked`]
    /// for untrusted bounds.
    pub fn new(name: impl Into<String>, access: Access, start: u64, end: u64) -> Self {
        let start = truncate(start);
        let end = truncate(end);
        Self {
            name: name.into(),
            access,
            start,
            length: end.wrapping_sub(start),
        }
    }

    /// Like [`MemoryRegion::new`] but rejects ranges whose end lies before their start after
    /// truncation.
    pub fn checked(name: impl Into<String>, access: Access, start: u64, end: u64) -> Result<Self> {
        let name = name.into();
        if truncate(end) < truncate(start) {
            return Err(Error::InvertedRange {
                name,
                start: truncate(start),
                end: truncate(end),
            });
        }
        Ok(Self::new(name, access, start, end))
    }

    /// Creates a region from textual bounds as found in device databases, either hexadecimal
    /// with a `0x` prefix or decimal.
    pub fn from_descriptor(
        name: impl Into<String>,
        access: Access,
        begin: &str,
        end: &str,
    ) -> Result<Self> {
        let start = parse_address("begin", begin)?;
        let end = parse_address("end", end)?;
        Self::checked(name, access, start, end)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// The first address after the region, modulo 2^32.
    pub fn end(&self) -> u32 {
        self.start.wrapping_add(self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn with_access(self, access: Access) -> Self {
        Self { access, ..self }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// Moves the region into `segment`, keeping its length.
    pub fn in_segment(self, segment: Segment) -> Self {
        Self {
            start: segment.overlay(self.start),
            ..self
        }
    }

    pub fn to_kseg0(self) -> Self {
        self.in_segment(Segment::Kseg0)
    }

    pub fn to_kseg1(self) -> Self {
        self.in_segment(Segment::Kseg1)
    }

    pub fn to_kseg2(self) -> Self {
        self.in_segment(Segment::Kseg2)
    }

    pub fn to_kseg3(self) -> Self {
        self.in_segment(Segment::Kseg3)
    }

    /// Placement order: regions are ordered by start address only, so two regions starting at
    /// the same address compare equal whatever their names and lengths.
    pub fn address_order(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start)
    }
}

impl fmt::Display for MemoryRegion {
    /// Formats the region as a line of a linker script MEMORY block (without indentation).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = format!("{}{}", self.name, self.access);
        write!(
            f,
            "{label:<width$} : ORIGIN = 0x{start:08X}, LENGTH = 0x{length:X}",
            width = NAME_COLUMN_WIDTH,
            start = self.start,
            length = self.length,
        )
    }
}

const fn truncate(address: u64) -> u32 {
    // the address bus is 32 bits wide
    address as u32
}

/// Decodes an address given as `0x`-prefixed hexadecimal or as decimal.
pub fn parse_address(field: &'static str, value: &str) -> Result<u64> {
    let trimmed = value.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| Error::InvalidAddress {
        field,
        value: value.to_owned(),
    })
}

/// An address as found in a device description: a number or a hexadecimal or decimal string.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum Address {
    Value(u64),
    Text(String),
}

impl Address {
    pub fn decode(&self, field: &'static str) -> Result<u64> {
        match self {
            Self::Value(value) => Ok(*value),
            Self::Text(text) => parse_address(field, text),
        }
    }
}

/// Deserializes a 32-bit address given in any form accepted by [`Address`].
pub(crate) fn deserialize_address<'de, D>(deserializer: D) -> core::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let address = Address::deserialize(deserializer)?;
    address
        .decode("address")
        .map(truncate)
        .map_err(D::Error::custom)
}
