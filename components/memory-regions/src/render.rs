use std::io::Write;

use askama::Template;
use log::info;

use crate::{catalog::RegionCatalog, Result};

const GENERATOR: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Template)]
#[template(path = "memory.x", escape = "none")]
struct LinkerScript<'a> {
    device: &'a str,
    generator: &'a str,
    regions: &'a RegionCatalog,
}

/// Renders the MEMORY block for `device`.
///
/// The regions are rendered in catalog order, so the catalog must be sorted by address.
pub fn render(device: &str, regions: &RegionCatalog) -> Result<String> {
    debug_assert!(regions.is_sorted_by_address(), "unsorted regions for {device}");
    let script = LinkerScript {
        device,
        generator: GENERATOR,
        regions,
    };
    Ok(script.render()?)
}

/// Renders the MEMORY block for `device` and writes it to `sink`.
///
/// Nothing is written if rendering fails.
pub fn write_linker_script(
    device: &str,
    regions: &RegionCatalog,
    sink: &mut impl Write,
) -> Result<()> {
    let script = render(device, regions)?;
    writeln!(sink, "{}", script.trim_end())?;
    sink.flush()?;
    info!("Wrote {} memory regions for {}", regions.len(), device);
    Ok(())
}
