//! MIDI to VGM conversion driver
//!
//! A single pass over the input: chunks are parsed as they arrive, every event
//! is acted on as soon as it is decoded, and register writes and waits are
//! appended to the output in input order. There is no intermediate event list.

pub mod voice;

use crate::chips::ay8910::{note_to_frequency, velocity_to_volume};
use crate::chips::DualAy8910;
use crate::config::ConvertOptions;
use crate::error::{Error, Result, Warning};
use crate::midi::event::{bend_semitones, read_event};
use crate::midi::note::note_name;
use crate::midi::{
    tag, ByteCursor, ChannelMessage, EventBody, MetaEvent, MidiHeader, TrackEvent,
    HEADER_BODY_LEN,
};
use crate::vgm::header::VgmHeader;
use crate::vgm::VgmWriter;
use std::io::{Read, Seek, Write};
use voice::VoiceAllocator;

/// Number of MIDI channels
pub const MIDI_CHANNELS: usize = 16;

/// Outcome of a conversion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub header: Option<MidiHeader>,
    /// Track chunks processed
    pub tracks: u32,
    /// Timed events decoded
    pub events: u64,
    /// Samples of wait emitted
    pub samples: u64,
    /// Bytes of VGM written, header included
    pub bytes: u64,
    pub warnings: Vec<Warning>,
}

/// Conversion context: parser, voice table, pitch table and output
pub struct Converter<R, W> {
    cursor: ByteCursor<R>,
    writer: VgmWriter<W>,
    chip: DualAy8910,
    voices: VoiceAllocator,
    /// Current bend per MIDI channel, in semitones
    pitch_bends: [f64; MIDI_CHANNELS],
    /// Last channel status byte of the current track
    running_status: Option<u8>,
    options: ConvertOptions,
    summary: Summary,
}

impl<R: Read, W: Write> Converter<R, W> {
    pub fn new(input: R, output: W, options: ConvertOptions) -> Self {
        Self {
            cursor: ByteCursor::new(input),
            writer: VgmWriter::new(output),
            chip: DualAy8910::new(),
            voices: VoiceAllocator::new(options.mode),
            pitch_bends: [0.0; MIDI_CHANNELS],
            running_status: None,
            options,
            summary: Summary::default(),
        }
    }

    pub fn voices(&self) -> &VoiceAllocator {
        &self.voices
    }

    pub fn pitch_bend(&self, channel: u8) -> f64 {
        self.pitch_bends[channel as usize & 0x0F]
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.summary.warnings
    }

    /// Process every chunk of the input
    pub fn run(&mut self) -> Result<()> {
        // The header chunk is expected first; it replaces this count with its
        // own track count.
        let mut chunks: u32 = 1;

        while chunks > 0 {
            let offset = self.cursor.position();
            let Some(chunk_tag) = self.cursor.try_read_tag()? else {
                if self.summary.header.is_none() {
                    return Err(Error::UnexpectedEof { offset });
                }
                self.warn(Warning::MissingTracks(chunks as u16));
                break;
            };
            let length = self.cursor.read_u32_be()?;
            log::trace!(
                "chunk {} length {} at {}",
                String::from_utf8_lossy(&chunk_tag),
                length,
                offset
            );

            match chunk_tag {
                tag::HEADER => {
                    chunks = self.process_header(offset, length)? as u32;
                }
                tag::TRACK => {
                    self.require_header(offset, &chunk_tag)?;
                    chunks -= 1;
                    self.process_track(length)?;
                }
                other => {
                    self.require_header(offset, &other)?;
                    if !other.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
                        return Err(Error::Structural {
                            offset,
                            message: format!("invalid chunk tag {:02x?}", other),
                        });
                    }
                    log::debug!(
                        "skipping unknown chunk {} ({} bytes)",
                        String::from_utf8_lossy(&other),
                        length
                    );
                    // Counts against the declared total like any other chunk
                    chunks -= 1;
                    self.cursor.skip(length as u64)?;
                }
            }
        }

        Ok(())
    }

    fn require_header(&self, offset: u64, chunk_tag: &[u8; 4]) -> Result<()> {
        if self.summary.header.is_none() {
            return Err(Error::Structural {
                offset,
                message: format!(
                    "expected MThd header chunk, found {}",
                    String::from_utf8_lossy(chunk_tag)
                ),
            });
        }
        Ok(())
    }

    /// Parse the header chunk, emit the VGM header and return the track count
    fn process_header(&mut self, offset: u64, length: u32) -> Result<u16> {
        if self.summary.header.is_some() {
            return Err(Error::Structural {
                offset,
                message: "duplicate MThd header chunk".into(),
            });
        }
        if length < HEADER_BODY_LEN {
            return Err(Error::Structural {
                offset,
                message: format!("header chunk too short ({} bytes)", length),
            });
        }

        let header = MidiHeader {
            format: self.cursor.read_u16_be()?,
            tracks: self.cursor.read_u16_be()?,
            division: self.cursor.read_u16_be()?,
        };
        self.cursor.skip((length - HEADER_BODY_LEN) as u64)?;

        log::debug!(
            "header: format {} tracks {} division 0x{:04x}{}",
            header.format,
            header.tracks,
            header.division,
            if header.is_smpte() { " (SMPTE)" } else { "" }
        );
        self.summary.header = Some(header);

        if header.format != 0 {
            self.warn(Warning::UnsupportedFormat(header.format));
        }

        self.writer
            .write_header(&VgmHeader::dual_ay8910(self.options.ay_clock))?;
        self.chip.init(&mut self.writer)?;

        Ok(header.tracks)
    }

    fn process_track(&mut self, length: u32) -> Result<()> {
        self.summary.tracks += 1;
        self.running_status = None;
        self.cursor.set_remaining(length as i64);

        while self.cursor.remaining() > 0 {
            let event = read_event(&mut self.cursor, &mut self.running_status)?;
            self.process_event(event)?;
        }

        if self.cursor.remaining() < 0 {
            log::debug!(
                "last event ran {} byte(s) past the end of its track chunk",
                -self.cursor.remaining()
            );
        }
        Ok(())
    }

    fn process_event(&mut self, event: TrackEvent) -> Result<()> {
        log::trace!("delta {} {:?}", event.delta, event.body);
        self.summary.events += 1;

        // Time moves before the event takes effect. Meta and sysex deltas
        // count too; dropping them would shift every later event.
        self.advance(event.delta)?;

        match event.body {
            EventBody::Channel { channel, message } => match message {
                ChannelMessage::NoteOn { note, velocity } if velocity > 0 => {
                    self.note_on(channel, note, velocity)
                }
                ChannelMessage::NoteOn { note, velocity }
                | ChannelMessage::NoteOff { note, velocity } => {
                    self.note_off(channel, note, velocity)
                }
                ChannelMessage::PitchBend { raw } => self.pitch_bend_change(channel, raw),
                _ => Ok(()),
            },
            EventBody::Meta(MetaEvent::Tempo(tempo)) => {
                // Timing uses the fixed tick scale; tempo changes have no effect
                log::debug!("tempo {} us per quarter note (ignored)", tempo);
                Ok(())
            }
            EventBody::Meta(MetaEvent::Text { kind, text }) => {
                log::debug!("text 0x{:02x}: {}", kind, text);
                Ok(())
            }
            EventBody::Meta(_) | EventBody::SysEx { .. } => Ok(()),
            EventBody::Orphan { data } => {
                self.warn(Warning::OrphanDataByte(data[0]));
                Ok(())
            }
        }
    }

    /// Emit a wait for `delta` ticks
    pub fn advance(&mut self, delta: u32) -> Result<()> {
        let samples = delta as u64 * self.options.samples_per_tick as u64;
        self.writer.write_delay(samples)
    }

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        log::debug!(
            "NOTE_ON(channel={}, note={}, velocity={})",
            channel,
            note_name(note),
            velocity
        );

        let Some(voice) = self.voices.allocate(channel, note) else {
            self.warn(Warning::AllocatorMiss { channel, note });
            return Ok(());
        };

        let freq = note_to_frequency(note, self.pitch_bends[channel as usize]);
        self.chip
            .set_volume(&mut self.writer, voice, velocity_to_volume(velocity))?;
        self.chip.set_frequency(&mut self.writer, voice, freq)
    }

    fn note_off(&mut self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        log::debug!(
            "NOTE_OFF(channel={}, note={}, velocity={})",
            channel,
            note_name(note),
            velocity
        );

        match self.voices.release(channel, note) {
            Some(voice) => self.chip.set_volume(&mut self.writer, voice, 0),
            None => {
                self.warn(Warning::UnmatchedNoteOff { channel, note });
                Ok(())
            }
        }
    }

    /// Store the channel's bend and retune every voice it is sounding on
    fn pitch_bend_change(&mut self, channel: u8, raw: u16) -> Result<()> {
        let bend = bend_semitones(raw);
        log::trace!("pitch bend channel {} {:+.3} semitones", channel, bend);
        self.pitch_bends[channel as usize] = bend;

        for (voice, note) in self.voices.sounding_on_channel(channel) {
            self.chip
                .set_frequency(&mut self.writer, voice, note_to_frequency(note, bend))?;
        }
        Ok(())
    }

    fn warn(&mut self, warning: Warning) {
        match warning {
            // Routine after voice stealing
            Warning::UnmatchedNoteOff { .. } => log::debug!("{}", warning),
            _ => log::warn!("{}", warning),
        }
        self.summary.warnings.push(warning);
    }

    fn end(&mut self) -> Result<()> {
        if self.options.end_marker && self.summary.header.is_some() {
            self.writer.write_end()?;
        }
        self.writer.flush()?;
        self.summary.samples = self.writer.total_samples();
        self.summary.bytes = self.writer.position();
        Ok(())
    }

    /// Terminate the stream and hand back the output
    pub fn finish(mut self) -> Result<(Summary, W)> {
        self.end()?;
        Ok((self.summary, self.writer.into_inner()))
    }
}

impl<R: Read, W: Write + Seek> Converter<R, W> {
    /// Like `finish`, also filling in the header's EOF offset and sample count
    pub fn finish_patched(mut self) -> Result<(Summary, W)> {
        self.end()?;
        self.writer.patch_header()?;
        self.writer.flush()?;
        Ok((self.summary, self.writer.into_inner()))
    }
}

/// Stream-convert `input` into `output`, leaving the header placeholders at zero
pub fn convert<R: Read, W: Write>(input: R, output: W, options: ConvertOptions) -> Result<Summary> {
    let mut converter = Converter::new(input, output, options);
    converter.run()?;
    let (summary, _) = converter.finish()?;
    Ok(summary)
}

/// Convert a complete MIDI file in memory, with a fully patched VGM header
pub fn convert_to_vec(input: &[u8], options: ConvertOptions) -> Result<(Vec<u8>, Summary)> {
    let mut converter = Converter::new(input, std::io::Cursor::new(Vec::new()), options);
    converter.run()?;
    let (summary, out) = converter.finish_patched()?;
    Ok((out.into_inner(), summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocationMode;

    fn midi_file(format: u16, tracks: u16, track_body: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"MThd");
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&format.to_be_bytes());
        data.extend_from_slice(&tracks.to_be_bytes());
        data.extend_from_slice(&0x0060u16.to_be_bytes());
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&(track_body.len() as u32).to_be_bytes());
        data.extend_from_slice(track_body);
        data
    }

    fn run(data: &[u8], options: ConvertOptions) -> Converter<&[u8], Vec<u8>> {
        let mut converter = Converter::new(data, Vec::new(), options);
        converter.run().unwrap();
        converter
    }

    /// Commands after the header and the two mixer writes
    fn body(converter: Converter<&[u8], Vec<u8>>) -> Vec<u8> {
        let (_, out) = converter.finish().unwrap();
        out[0x80 + 6..].to_vec()
    }

    #[test]
    fn test_advance_zero_and_exact() {
        let mut converter = Converter::new(&[0u8; 0][..], Vec::new(), ConvertOptions {
            samples_per_tick: 1,
            end_marker: false,
            ..Default::default()
        });
        converter.advance(0).unwrap();
        converter.advance(735).unwrap();
        let (_, out) = converter.finish().unwrap();
        assert_eq!(out, vec![0x62]);
    }

    #[test]
    fn test_pitch_bend_retunes_channel_voices() {
        let track = [
            0x00, 0x90, 69, 127, // voice 0, channel 0
            0x00, 0x91, 69 + 12, 127, // voice 1, channel 1
            0x00, 0xE0, 0x7F, 0x7F, // bend channel 0 fully up
        ];
        let file = midi_file(0, 1, &track);
        let converter = run(&file, ConvertOptions::default());
        assert!(converter.pitch_bend(0) > 1.999);
        assert_eq!(converter.pitch_bend(1), 0.0);

        let out = body(converter);
        // Two note-ons (3 writes each), then one period rewrite for voice 0
        let bend = &out[18..24];
        let period = frequency_to_period_bytes(note_to_frequency(69, bend_semitones(0x3FFF)));
        assert_eq!(bend, &[0xA0, 0x00, period[0], 0xA0, 0x01, period[1]]);
        assert_eq!(out[24], 0x66);
    }

    fn frequency_to_period_bytes(freq: f64) -> [u8; 2] {
        let period = crate::chips::ay8910::frequency_to_period(freq);
        [(period & 0xFF) as u8, (period >> 8) as u8]
    }

    #[test]
    fn test_pitch_bend_skips_released_voices() {
        let track = [0x00, 0x90, 60, 100, 0x00, 0x80, 60, 0, 0x00, 0xE0, 0x00, 0x50];
        let file = midi_file(0, 1, &track);
        let out = body(run(&file, ConvertOptions::default()));
        // note-on (9) + note-off (3) + end marker
        assert_eq!(out.len(), 13);
    }

    #[test]
    fn test_zero_velocity_note_on_releases() {
        let track = [0x00, 0x90, 60, 100, 0x00, 60, 0];
        let file = midi_file(0, 1, &track);
        let converter = run(&file, ConvertOptions::default());
        assert!(converter.voices().voices()[0].is_free());
        let out = body(converter);
        assert_eq!(&out[9..12], &[0xA0, 0x08, 0x00]);
    }

    #[test]
    fn test_voice_mode_drops_high_channels() {
        let track = [0x00, 0x95, 60, 100, 0x00, 0x9A, 60, 100];
        let options = ConvertOptions {
            mode: AllocationMode::Voice,
            ..Default::default()
        };
        let file = midi_file(0, 1, &track);
        let converter = run(&file, options);
        assert_eq!(converter.voices().voices()[5].note, Some(60));
        assert_eq!(
            converter.warnings(),
            &[Warning::AllocatorMiss {
                channel: 10,
                note: 60
            }]
        );
        // Voice 5 is channel C of the second chip
        let out = body(converter);
        assert_eq!(&out[0..3], &[0xA0, 0x8A, 12]);
    }

    #[test]
    fn test_format_warning_is_not_fatal() {
        let file = midi_file(1, 1, &[0x00, 0xFF, 0x2F, 0x00]);
        let converter = run(&file, ConvertOptions::default());
        assert_eq!(converter.warnings(), &[Warning::UnsupportedFormat(1)]);
    }

    #[test]
    fn test_track_before_header_is_structural() {
        let mut data = Vec::new();
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&0u32.to_be_bytes());
        let mut converter = Converter::new(&data[..], Vec::new(), ConvertOptions::default());
        assert!(matches!(
            converter.run(),
            Err(Error::Structural { offset: 0, .. })
        ));
    }

    #[test]
    fn test_overlong_event_is_tolerated() {
        // Declared length cuts the note-on short; the event completes anyway
        let mut data = midi_file(0, 1, &[0x00, 0x90, 60, 100]);
        let len_at = data.len() - 4 - 4;
        data[len_at..len_at + 4].copy_from_slice(&2u32.to_be_bytes());
        let converter = run(&data, ConvertOptions::default());
        assert_eq!(converter.voices().voices()[0].note, Some(60));
    }
}
