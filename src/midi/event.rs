//! Track event decoding

use super::cursor::ByteCursor;
use crate::error::Result;
use std::io::Read;

/// Status bytes that are not channel messages
pub mod status {
    pub const SYSEX: u8 = 0xF0;
    pub const SYSEX_ESCAPE: u8 = 0xF7;
    pub const META: u8 = 0xFF;
}

/// Meta event types that carry a payload we look at
pub mod meta {
    pub const TEXT_FIRST: u8 = 0x01;
    pub const TEXT_LAST: u8 = 0x07;
    pub const END_OF_TRACK: u8 = 0x2F;
    pub const TEMPO: u8 = 0x51;
}

/// Longest text meta payload kept; the rest is skipped
pub const MAX_TEXT_LEN: usize = 1024;

/// Pitch wheel center position
pub const PITCH_BEND_CENTER: u16 = 0x2000;

/// Raw pitch wheel steps per semitone of bend
pub const PITCH_BEND_PER_SEMITONE: f64 = 0x1000 as f64;

/// A voice/channel message with its data bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMessage {
    NoteOff { note: u8, velocity: u8 },
    NoteOn { note: u8, velocity: u8 },
    PolyAftertouch { note: u8, pressure: u8 },
    Controller { controller: u8, value: u8 },
    ProgramChange { program: u8 },
    ChannelAftertouch { pressure: u8 },
    PitchBend { raw: u16 },
    /// 0xF1-0xFE outside of sysex, consumed and ignored
    System { status: u8, data: [u8; 2] },
}

impl ChannelMessage {
    /// Number of data bytes following a status byte of this kind
    pub fn data_len(status: u8) -> usize {
        match status >> 4 {
            0xC | 0xD => 1,
            _ => 2,
        }
    }

    fn from_status(status: u8, data1: u8, data2: u8) -> Self {
        match status >> 4 {
            0x8 => ChannelMessage::NoteOff {
                note: data1,
                velocity: data2,
            },
            0x9 => ChannelMessage::NoteOn {
                note: data1,
                velocity: data2,
            },
            0xA => ChannelMessage::PolyAftertouch {
                note: data1,
                pressure: data2,
            },
            0xB => ChannelMessage::Controller {
                controller: data1,
                value: data2,
            },
            0xC => ChannelMessage::ProgramChange { program: data1 },
            0xD => ChannelMessage::ChannelAftertouch { pressure: data1 },
            0xE => ChannelMessage::PitchBend {
                raw: (data1 & 0x7F) as u16 | (((data2 & 0x7F) as u16) << 7),
            },
            _ => ChannelMessage::System {
                status,
                data: [data1, data2],
            },
        }
    }
}

/// Convert a raw 14-bit pitch wheel value into semitones, in [-2, +2)
pub fn bend_semitones(raw: u16) -> f64 {
    (raw as i32 - PITCH_BEND_CENTER as i32) as f64 / PITCH_BEND_PER_SEMITONE
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaEvent {
    /// Microseconds per quarter note
    Tempo(u32),
    EndOfTrack,
    Text { kind: u8, text: String },
    Other { kind: u8, len: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventBody {
    Channel { channel: u8, message: ChannelMessage },
    Meta(MetaEvent),
    SysEx { len: u32 },
    /// Data bytes that arrived with no running status to attach them to
    Orphan { data: [u8; 2] },
}

/// One delta-timed event of a track chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent {
    pub delta: u32,
    pub body: EventBody,
}

/// Decode the next event, updating the running status
///
/// `running` holds the last channel status byte seen in this track. Meta and
/// sysex events clear it.
pub fn read_event<R: Read>(
    cursor: &mut ByteCursor<R>,
    running: &mut Option<u8>,
) -> Result<TrackEvent> {
    let delta = cursor.read_vlq()?;
    let first = cursor.read_u8()?;

    let body = match first {
        status::META => {
            *running = None;
            EventBody::Meta(read_meta(cursor)?)
        }
        status::SYSEX | status::SYSEX_ESCAPE => {
            *running = None;
            let len = cursor.read_vlq()?;
            cursor.skip(len as u64)?;
            EventBody::SysEx { len }
        }
        status if status & 0x80 != 0 => {
            *running = Some(status);
            let data1 = cursor.read_u8()?;
            read_channel(cursor, status, data1)?
        }
        data1 => match *running {
            Some(status) => read_channel(cursor, status, data1)?,
            None => {
                let data2 = cursor.read_u8()?;
                EventBody::Orphan {
                    data: [data1, data2],
                }
            }
        },
    };

    Ok(TrackEvent { delta, body })
}

fn read_channel<R: Read>(cursor: &mut ByteCursor<R>, status: u8, data1: u8) -> Result<EventBody> {
    let data2 = if ChannelMessage::data_len(status) == 2 {
        cursor.read_u8()?
    } else {
        0
    };
    Ok(EventBody::Channel {
        channel: status & 0x0F,
        message: ChannelMessage::from_status(status, data1, data2),
    })
}

fn read_meta<R: Read>(cursor: &mut ByteCursor<R>) -> Result<MetaEvent> {
    let kind = cursor.read_u8()?;
    let len = cursor.read_vlq()?;

    let event = match kind {
        meta::TEMPO if len == 3 => MetaEvent::Tempo(cursor.read_be(3)? as u32),
        meta::END_OF_TRACK if len == 0 => MetaEvent::EndOfTrack,
        meta::TEXT_FIRST..=meta::TEXT_LAST => {
            let bytes = cursor.read_bytes(len as u64, MAX_TEXT_LEN)?;
            MetaEvent::Text {
                kind,
                text: String::from_utf8_lossy(&bytes).into_owned(),
            }
        }
        _ => {
            cursor.skip(len as u64)?;
            MetaEvent::Other { kind, len }
        }
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(data: &[u8]) -> Vec<TrackEvent> {
        let mut cursor = ByteCursor::new(data);
        cursor.set_remaining(data.len() as i64);
        let mut running = None;
        let mut events = Vec::new();
        while cursor.remaining() > 0 {
            events.push(read_event(&mut cursor, &mut running).unwrap());
        }
        events
    }

    #[test]
    fn test_running_status_keeps_kind_and_channel() {
        let events = decode_all(&[0x00, 0x93, 60, 100, 0x10, 64, 90]);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            TrackEvent {
                delta: 0x10,
                body: EventBody::Channel {
                    channel: 3,
                    message: ChannelMessage::NoteOn {
                        note: 64,
                        velocity: 90
                    },
                },
            }
        );
    }

    #[test]
    fn test_single_data_byte_kinds() {
        let events = decode_all(&[0x00, 0xC1, 5, 0x00, 0xD2, 40, 0x00, 7]);
        assert_eq!(
            events[0].body,
            EventBody::Channel {
                channel: 1,
                message: ChannelMessage::ProgramChange { program: 5 }
            }
        );
        assert_eq!(
            events[2].body,
            EventBody::Channel {
                channel: 2,
                message: ChannelMessage::ChannelAftertouch { pressure: 7 }
            }
        );
    }

    #[test]
    fn test_meta_clears_running_status() {
        let data = [0x00, 0x90, 60, 100, 0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, 0x00, 61, 0];
        let events = decode_all(&data);
        assert_eq!(events[1].body, EventBody::Meta(MetaEvent::Tempo(500_000)));
        assert_eq!(events[2].body, EventBody::Orphan { data: [61, 0] });
    }

    #[test]
    fn test_sysex_is_skipped() {
        let events = decode_all(&[0x05, 0xF0, 0x03, 1, 2, 0xF7, 0x00, 0xFF, 0x2F, 0x00]);
        assert_eq!(events[0], TrackEvent { delta: 5, body: EventBody::SysEx { len: 3 } });
        assert_eq!(events[1].body, EventBody::Meta(MetaEvent::EndOfTrack));
    }

    #[test]
    fn test_text_meta() {
        let events = decode_all(&[0x00, 0xFF, 0x03, 0x04, b'L', b'e', b'a', b'd']);
        assert_eq!(
            events[0].body,
            EventBody::Meta(MetaEvent::Text {
                kind: 0x03,
                text: "Lead".to_string()
            })
        );
    }

    #[test]
    fn test_declared_text_length_beyond_input() {
        // Text event claiming 0x0FFFFFFF bytes with three present
        let data = [0x00, 0xFF, 0x01, 0xFF, 0xFF, 0xFF, 0x7F, b'a', b'b', b'c'];
        let mut cursor = ByteCursor::new(&data[..]);
        cursor.set_remaining(data.len() as i64);
        let err = read_event(&mut cursor, &mut None).unwrap_err();
        assert!(matches!(err, crate::error::Error::UnexpectedEof { .. }));
    }

    #[test]
    fn test_pitch_bend_range() {
        assert_eq!(bend_semitones(PITCH_BEND_CENTER), 0.0);
        assert_eq!(bend_semitones(0), -2.0);
        let up = bend_semitones(0x3FFF);
        assert!(up > 1.999 && up < 2.0);

        let events = decode_all(&[0x00, 0xE0, 0x7F, 0x7F]);
        assert_eq!(
            events[0].body,
            EventBody::Channel {
                channel: 0,
                message: ChannelMessage::PitchBend { raw: 0x3FFF }
            }
        );
    }
}
