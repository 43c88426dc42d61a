//! Standard MIDI File decoding

pub mod cursor;
pub mod event;
pub mod note;

pub use cursor::ByteCursor;
pub use event::{ChannelMessage, EventBody, MetaEvent, TrackEvent};

/// Chunk tags
pub mod tag {
    pub const HEADER: [u8; 4] = *b"MThd";
    pub const TRACK: [u8; 4] = *b"MTrk";
}

/// Size of the fixed part of the header chunk body
pub const HEADER_BODY_LEN: u32 = 6;

/// Contents of the `MThd` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiHeader {
    /// 0 = single track, 1 = simultaneous tracks, 2 = independent tracks
    pub format: u16,
    pub tracks: u16,
    /// Ticks per quarter note, or SMPTE frames/ticks when bit 15 is set
    pub division: u16,
}

impl MidiHeader {
    pub fn is_smpte(&self) -> bool {
        self.division & 0x8000 != 0
    }
}
