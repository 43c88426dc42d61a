pub mod chips;
pub mod config;
pub mod converter;
pub mod error;
pub mod midi;
pub mod vgm;

pub use config::{AllocationMode, ConvertOptions};
pub use converter::{convert, convert_to_vec, Converter, Summary};
pub use error::{Error, Warning};
