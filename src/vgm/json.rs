//! JSON serialization types for VGM data

use super::commands::VgmCommand;
use super::reader::{ChipInfo, VgmHeader};
use serde::Serialize;
use std::collections::HashMap;

/// Top-level JSON structure for a VGM file
#[derive(Debug, Clone, Serialize)]
pub struct VgmJson {
    /// VGM version as a string (e.g., "1.51")
    pub version: String,
    pub header: VgmHeaderJson,
    pub commands: Vec<VgmCommand>,
}

/// JSON representation of VGM header
#[derive(Debug, Clone, Serialize)]
pub struct VgmHeaderJson {
    /// Total samples in the file, 0 when the file was streamed
    pub total_samples: u32,
    /// End of file offset, 0 when the file was streamed
    pub eof_offset: u32,
    /// Sound chips used in this file
    pub chips: HashMap<String, ChipJson>,
}

/// JSON representation of chip information
#[derive(Debug, Clone, Serialize)]
pub struct ChipJson {
    /// Clock frequency in Hz
    pub clock: u32,
    /// Whether this is a dual-chip configuration
    #[serde(skip_serializing_if = "is_false")]
    pub dual: bool,
    /// Extra chip-specific parameters
    #[serde(flatten, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, u32>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl VgmJson {
    /// Create a VgmJson from parsed VGM data
    pub fn new(header: &VgmHeader, commands: Vec<VgmCommand>) -> Self {
        Self {
            version: format_version(header.version),
            header: VgmHeaderJson::from(header),
            commands,
        }
    }

    /// Sum of all wait commands in samples
    pub fn waited_samples(&self) -> u64 {
        self.commands
            .iter()
            .map(|c| match c {
                VgmCommand::Wait { samples } => *samples as u64,
                _ => 0,
            })
            .sum()
    }
}

impl From<&VgmHeader> for VgmHeaderJson {
    fn from(header: &VgmHeader) -> Self {
        let chips = header
            .chips
            .iter()
            .map(|(name, info)| (name.clone(), ChipJson::from(info)))
            .collect();

        Self {
            total_samples: header.total_samples,
            eof_offset: header.eof_offset,
            chips,
        }
    }
}

impl From<&ChipInfo> for ChipJson {
    fn from(info: &ChipInfo) -> Self {
        Self {
            clock: info.clock,
            dual: info.dual,
            extra: info.extra.clone(),
        }
    }
}

/// Format a BCD version number as a string
fn format_version(version: u32) -> String {
    let major = (version >> 8) & 0xFF;
    let minor = version & 0xFF;
    format!("{}.{:02x}", major, minor)
}
