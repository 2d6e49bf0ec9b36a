use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode {field} address {value:?}")]
    InvalidAddress { field: &'static str, value: String },
    #[error("region {name} ends at {end:#010x} before it starts at {start:#010x}")]
    InvertedRange { name: String, start: u32, end: u32 },
    #[error("failed to parse device description")]
    Description(#[from] serde_json::Error),
    #[error("failed to render linker script")]
    Render(#[from] askama::Error),
    #[error("failed to write linker script")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
