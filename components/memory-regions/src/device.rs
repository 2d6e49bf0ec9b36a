use std::io::Read;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::{
    boot::layout_boot_regions,
    catalog::RegionCatalog,
    region::{Access, Address, MemoryRegion},
    render,
    vectors::InterruptInfo,
    Result,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// Segmented address space with kernel segment views of the physical memory.
    Mips32,
    /// Flat address space.
    Arm,
}

impl Architecture {
    pub fn is_segmented(self) -> bool {
        self == Self::Mips32
    }

    /// Moves a freshly decoded region to the address view the linker uses for its kind.
    fn place(self, kind: RegionKind, region: MemoryRegion) -> MemoryRegion {
        match (self, kind) {
            (Self::Mips32, RegionKind::Program) => region
                .to_kseg0()
                .with_access(Access::READ | Access::EXECUTE),
            (Self::Mips32, RegionKind::Data) => region
                .to_kseg1()
                .with_access(Access::WRITE | Access::NOT_EXECUTABLE),
            (Self::Mips32, RegionKind::Peripheral) => region.to_kseg1(),
            (Self::Arm, RegionKind::Program) => region.with_access(Access::READ | Access::EXECUTE),
            (Self::Arm, RegionKind::Data) => {
                region.with_access(Access::READ | Access::WRITE | Access::EXECUTE)
            }
            (_, RegionKind::Boot | RegionKind::Peripheral | RegionKind::Other) => region,
        }
    }

    fn boot_regions(self, raw: &MemoryRegion) -> Vec<MemoryRegion> {
        match self {
            Self::Mips32 => layout_boot_regions(raw),
            Self::Arm => vec![raw.clone()],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Subfamily {
    Mx,
    Mm,
    Mz,
    Mk,
    #[default]
    #[serde(other)]
    Other,
}

impl Subfamily {
    /// The MM devices keep their vectors in program memory even with fixed offsets.
    pub fn excludes_exception_region(self) -> bool {
        self == Self::Mm
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// Boot configuration memory, expanded into the family layout.
    Boot,
    Program,
    Data,
    Peripheral,
    #[default]
    #[serde(other)]
    Other,
}

/// A region as reported by the device database, with physical addresses.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RawRegion {
    pub name: String,
    #[serde(default)]
    pub kind: RegionKind,
    pub begin: Address,
    pub end: Address,
}

impl RawRegion {
    pub fn new(name: impl Into<String>, kind: RegionKind, begin: u64, end: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            begin: Address::Value(begin),
            end: Address::Value(end),
        }
    }

    /// Creates a region with textual bounds, decoded by [`RawRegion::to_region`].
    pub fn from_text(name: impl Into<String>, kind: RegionKind, begin: &str, end: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            begin: Address::Text(begin.to_owned()),
            end: Address::Text(end.to_owned()),
        }
    }

    /// Decodes the bounds, rejecting malformed addresses and inverted ranges.
    pub fn to_region(&self) -> Result<MemoryRegion> {
        let start = self.begin.decode("begin")?;
        let end = self.end.decode("end")?;
        MemoryRegion::checked(self.name.as_str(), Access::empty(), start, end)
    }
}

/// Everything needed for one generation pass.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Device {
    pub name: String,
    pub architecture: Architecture,
    #[serde(default)]
    pub subfamily: Subfamily,
    pub regions: Vec<RawRegion>,
    /// Missing interrupt information means the vectors need no region of their own.
    #[serde(default)]
    pub interrupts: Option<InterruptInfo>,
}

impl Device {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Computes the memory layout of the device, sorted by start address.
    pub fn catalog(&self) -> Result<RegionCatalog> {
        info!(
            "Computing memory layout for {} ({:?}, {:?})",
            self.name, self.architecture, self.subfamily
        );

        let mut catalog = RegionCatalog::new();
        let mut boot = None;
        for raw in &self.regions {
            let region = raw.to_region()?;
            if raw.kind == RegionKind::Boot {
                match boot {
                    None => boot = Some((catalog.len(), raw.name.as_str())),
                    Some((_, first)) => warn!(
                        "{}: keeping boot region {} as is, only {} is expanded",
                        self.name, raw.name, first
                    ),
                }
            }
            let region = self.architecture.place(raw.kind, region);
            debug!("{}: {}", self.name, region);
            catalog.add(region);
        }

        // names are not unique, so the boot region is tracked by its position
        if let Some((index, _)) = boot {
            let layout = catalog
                .get(index)
                .map(|raw| self.architecture.boot_regions(raw));
            if let Some(layout) = layout {
                catalog.replace_at(index, layout);
            }
        }

        if self.architecture.is_segmented() {
            let excluded = self.subfamily.excludes_exception_region();
            if let Some(region) = self
                .interrupts
                .and_then(|interrupts| interrupts.exception_region(excluded))
            {
                debug!("{}: {}", self.name, region);
                catalog.add(region);
            }
        }

        catalog.sort_by_address();
        Ok(catalog)
    }

    /// Runs a full generation pass and writes the MEMORY block to `sink`.
    pub fn write_linker_script(&self, sink: &mut impl std::io::Write) -> Result<()> {
        let catalog = self.catalog()?;
        render::write_linker_script(&self.name, &catalog, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{vectors::EXCEPTION_MEM, Error};

    fn pic32mx() -> Device {
        Device {
            name: "PIC32MX795F512L".to_owned(),
            architecture: Architecture::Mips32,
            subfamily: Subfamily::Mx,
            regions: vec![
                RawRegion::new("kseg0_program_mem", RegionKind::Program, 0x1D00_0000, 0x1D08_0000),
                RawRegion::new("kseg1_data_mem", RegionKind::Data, 0x0000_0000, 0x0002_0000),
                RawRegion::new("sfrs", RegionKind::Peripheral, 0x1F80_0000, 0x1F90_0000),
                RawRegion::from_text("boot", RegionKind::Boot, "0x1FC00000", "0x1FC00BB0"),
                RawRegion::new("configsfrs", RegionKind::Other, 0x1FC0_2FF0, 0x1FC0_3000),
            ],
            interrupts: Some(InterruptInfo {
                has_variable_offsets: false,
                default_base_address: 0,
                last_vector_number: 63,
            }),
        }
    }

    fn summary(catalog: &RegionCatalog) -> Vec<(&str, u32, u32)> {
        catalog
            .iter()
            .map(|region| (region.name(), region.start(), region.length()))
            .collect()
    }

    #[test]
    fn test_segmented_layout() {
        let catalog = pic32mx().catalog().unwrap();
        assert!(catalog.is_sorted_by_address());
        assert_eq!(
            summary(&catalog),
            [
                ("configsfrs", 0x1FC0_2FF0, 0x10),
                ("kseg0_program_mem", 0x9D00_0000, 0x8_0000),
                (EXCEPTION_MEM, 0x9D00_0000, 0xA00),
                ("debug_exec_mem", 0x9FC0_0490, 0x760),
                ("kseg0_boot_mem", 0x9FC0_0490, 0),
                ("kseg1_data_mem", 0xA000_0000, 0x2_0000),
                ("sfrs", 0xBF80_0000, 0x10_0000),
                ("kseg1_boot_mem", 0xBFC0_0000, 0x490),
            ]
        );
        assert!(catalog.find_by_name("boot").is_none());

        let program = catalog.find_by_name("kseg0_program_mem").unwrap();
        assert_eq!(program.access(), Access::READ | Access::EXECUTE);
        let data = catalog.find_by_name("kseg1_data_mem").unwrap();
        assert_eq!(data.access(), Access::WRITE | Access::NOT_EXECUTABLE);
    }

    #[test]
    fn test_excluded_subfamily() {
        let device = Device {
            subfamily: Subfamily::Mm,
            ..pic32mx()
        };
        let catalog = device.catalog().unwrap();
        assert!(catalog.find_by_name(EXCEPTION_MEM).is_none());

        let device = Device {
            interrupts: None,
            ..pic32mx()
        };
        assert!(device.catalog().unwrap().find_by_name(EXCEPTION_MEM).is_none());
    }

    #[test]
    fn test_flat_layout() {
        let device = Device {
            name: "ATSAME70Q21".to_owned(),
            architecture: Architecture::Arm,
            subfamily: Subfamily::Other,
            regions: vec![
                RawRegion::new("ram", RegionKind::Data, 0x2040_0000, 0x2046_0000),
                RawRegion::new("rom", RegionKind::Program, 0x0040_0000, 0x0060_0000),
                RawRegion::new("boot", RegionKind::Boot, 0x0000_0000, 0x0000_0C00),
            ],
            interrupts: Some(InterruptInfo::default()),
        };
        let catalog = device.catalog().unwrap();
        assert_eq!(
            summary(&catalog),
            [
                ("boot", 0x0000_0000, 0xC00),
                ("rom", 0x0040_0000, 0x20_0000),
                ("ram", 0x2040_0000, 0x6_0000),
            ]
        );
        let ram = catalog.find_by_name("ram").unwrap();
        assert_eq!(ram.access(), Access::READ | Access::WRITE | Access::EXECUTE);
    }

    #[test]
    fn test_second_boot_region_is_kept() {
        let mut device = pic32mx();
        device.regions.push(RawRegion::new(
            "boot_alias",
            RegionKind::Boot,
            0x1FC4_0000,
            0x1FC4_0100,
        ));
        let catalog = device.catalog().unwrap();
        assert!(catalog.find_by_name("boot_alias").is_some());
        assert!(catalog.find_by_name("kseg1_boot_mem").is_some());
    }

    #[test]
    fn test_boot_region_sharing_a_name() {
        let mut device = pic32mx();
        device.regions = vec![
            RawRegion::new("boot", RegionKind::Program, 0x1D00_0000, 0x1D08_0000),
            RawRegion::new("boot", RegionKind::Boot, 0x1FC0_0000, 0x1FC0_0BB0),
        ];
        let catalog = device.catalog().unwrap();
        let program = catalog.find_by_name("boot").unwrap();
        assert_eq!(program.start(), 0x9D00_0000);
        assert_eq!(program.length(), 0x8_0000);
        // the 2784 byte boot region selects the small layout
        assert_eq!(
            catalog.find_by_name("debug_exec_mem").unwrap().start(),
            0x9FC0_0490
        );
        assert!(catalog.find_by_name("kseg1_boot_mem_4B0").is_none());
        assert_eq!(catalog.iter().filter(|region| region.name() == "boot").count(), 1);
    }

    #[test]
    fn test_invalid_regions() {
        let mut device = pic32mx();
        device.regions.push(RawRegion::from_text("broken", RegionKind::Other, "0x100", "zz"));
        assert!(matches!(
            device.catalog(),
            Err(Error::InvalidAddress { field: "end", .. })
        ));

        let mut device = pic32mx();
        device.regions.push(RawRegion::new("inverted", RegionKind::Other, 0x200, 0x100));
        assert!(matches!(device.catalog(), Err(Error::InvertedRange { .. })));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "name": "PIC32MZ2048EFH144",
            "architecture": "mips32",
            "subfamily": "mz",
            "regions": [
                { "name": "kseg0_program_mem", "kind": "program", "begin": "0x1D000000", "end": "0x1D200000" },
                { "name": "boot", "kind": "boot", "begin": 532676608, "end": "0x1FC14000" },
                { "name": "unknown", "kind": "eeprom", "begin": 0, "end": 16 }
            ],
            "interrupts": { "has_variable_offsets": true, "last_vector_number": 213 }
        }"#;
        let device = Device::from_json(json).unwrap();
        assert_eq!(device.subfamily, Subfamily::Mz);
        assert_eq!(device.regions[2].kind, RegionKind::Other);

        let catalog = device.catalog().unwrap();
        assert!(catalog.find_by_name(EXCEPTION_MEM).is_none());
        // 80 KiB of boot flash selects the layout without debugger reservation
        assert!(catalog.find_by_name("debug_exec_mem").is_none());
        assert_eq!(
            catalog.find_by_name("kseg1_boot_mem_4B0").unwrap().end(),
            0xBFC0_FF00
        );

        assert!(matches!(
            Device::from_json("{\"name\": 1}"),
            Err(Error::Description(_))
        ));
    }
}
