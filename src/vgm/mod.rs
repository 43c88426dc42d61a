pub mod commands;
pub mod delay;
pub mod header;
pub mod json;
pub mod reader;
pub mod voices;
pub mod writer;

pub use commands::VgmCommand;
pub use json::VgmJson;
pub use reader::{ChipInfo, VgmHeader, VgmReader};
pub use voices::{group_by_voice, VoiceTrack};
pub use writer::VgmWriter;
