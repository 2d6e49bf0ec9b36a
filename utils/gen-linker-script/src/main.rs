use std::{
    error::Error as _,
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use clap_num::maybe_hex;
use log::{error, info};
use memory_regions::{write_linker_script, Device, Error, Result};

/// Generates the MEMORY block of a linker script for each given device description.
///
/// A device that cannot be processed is reported and skipped, the remaining devices are still
/// generated.
#[derive(Debug, Parser)]
#[command(about, version)]
struct Args {
    /// Directory for the generated linker scripts.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// File extension of the generated linker scripts.
    #[arg(long, default_value = "ld")]
    suffix: String,

    /// Print the linker scripts to stdout instead of writing files.
    #[arg(long)]
    stdout: bool,

    /// Base address of the exception region, overriding the device descriptions.
    #[arg(long, value_parser = maybe_hex::<u32>)]
    vector_base: Option<u32>,

    /// Device description files (JSON).
    #[arg(required = true)]
    devices: Vec<PathBuf>,
}

impl Args {
    fn load(&self, path: &Path) -> Result<Device> {
        let file = File::open(path)?;
        let mut device = Device::from_reader(BufReader::new(file))?;
        if let (Some(base), Some(interrupts)) = (self.vector_base, device.interrupts.as_mut()) {
            interrupts.default_base_address = base;
        }
        Ok(device)
    }

    fn output_path(&self, device: &Device) -> PathBuf {
        self.output
            .join(format!("{}.{}", file_stem(&device.name), self.suffix))
    }

    fn generate(&self, path: &Path) -> Result<()> {
        let device = self.load(path)?;
        if self.stdout {
            return device.write_linker_script(&mut io::stdout().lock());
        }

        // only create the file once the layout is known to be valid
        let catalog = device.catalog()?;
        let output = self.output_path(&device);
        let mut file = File::create(&output)?;
        write_linker_script(&device.name, &catalog, &mut file)?;
        info!("{} -> {}", path.display(), output.display());
        Ok(())
    }
}

/// Lower-cases the device name and replaces characters that could leave the output directory.
fn file_stem(device: &str) -> String {
    device
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

fn report(err: &Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    let args = Args::parse();
    let mut failed = 0;
    for path in &args.devices {
        if let Err(err) = args.generate(path) {
            error!("{}: {}", path.display(), report(&err));
            failed += 1;
        }
    }

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        error!("{failed} of {} devices failed", args.devices.len());
        ExitCode::FAILURE
    }
}
