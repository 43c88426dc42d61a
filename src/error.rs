use std::fmt;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed MIDI at byte {offset}: {message}")]
    Structural { offset: u64, message: String },

    #[error("Unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: u64 },

    #[error("VGM parse error: {0}")]
    VgmParse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Anomalies that are reported but never abort a conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Header declared a format other than 0
    UnsupportedFormat(u16),
    /// Input ended on a chunk boundary before all declared tracks were seen
    MissingTracks(u16),
    /// Note-off that matched no sounding voice
    UnmatchedNoteOff { channel: u8, note: u8 },
    /// Note-on that could not be placed on any voice
    AllocatorMiss { channel: u8, note: u8 },
    /// Data byte seen while no running status was active
    OrphanDataByte(u8),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnsupportedFormat(format) => write!(
                f,
                "MIDI format {format} is not supported properly, only format 0 is; output may not be what you expect"
            ),
            Warning::MissingTracks(count) => {
                write!(f, "input ended with {count} declared track chunk(s) missing")
            }
            Warning::UnmatchedNoteOff { channel, note } => {
                write!(f, "note-off for note {note} on channel {channel} matched no voice")
            }
            Warning::AllocatorMiss { channel, note } => {
                write!(f, "no voice available for note {note} on channel {channel}")
            }
            Warning::OrphanDataByte(byte) => {
                write!(f, "data byte 0x{byte:02x} without running status")
            }
        }
    }
}
