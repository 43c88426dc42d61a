//! Conversion options

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Master clock of each AY-3-8910 in Hz
pub const DEFAULT_AY_CLOCK: u32 = 1789773;

/// Output samples per MIDI tick
pub const DEFAULT_SAMPLES_PER_TICK: u32 = 30;

/// How MIDI notes are assigned to the six AY voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMode {
    /// Any free voice, stealing the oldest when all six are busy
    #[default]
    Ring,
    /// MIDI channel N plays on voice N
    Voice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub mode: AllocationMode,
    /// Fixed linear delta-time scale; the file's tempo and division are ignored
    pub samples_per_tick: u32,
    /// Clock written to the VGM header
    pub ay_clock: u32,
    /// Append the 0x66 end-of-sound-data command when the input is exhausted
    pub end_marker: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            mode: AllocationMode::Ring,
            samples_per_tick: DEFAULT_SAMPLES_PER_TICK,
            ay_clock: DEFAULT_AY_CLOCK,
            end_marker: true,
        }
    }
}

impl ConvertOptions {
    /// Load options from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ay_clock == 0 || self.ay_clock > 0x3FFF_FFFF {
            return Err(Error::Config(format!(
                "AY clock {} does not fit the VGM header field",
                self.ay_clock
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = ConvertOptions::from_json(r#"{ "mode": "voice" }"#).unwrap();
        assert_eq!(options.mode, AllocationMode::Voice);
        assert_eq!(options.samples_per_tick, DEFAULT_SAMPLES_PER_TICK);
        assert!(options.end_marker);
    }

    #[test]
    fn test_rejects_oversized_clock() {
        let err = ConvertOptions::from_json(r#"{ "ay_clock": 1073741824 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
