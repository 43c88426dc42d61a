//! Dual AY-3-8910 register driver

use crate::error::Result;
use crate::vgm::VgmWriter;
use std::io::Write;

/// Tone channels per chip
pub const CHANNELS_PER_CHIP: usize = 3;

/// Voices across both chips
pub const VOICE_COUNT: usize = 2 * CHANNELS_PER_CHIP;

/// Tone period divisor: the 1789773 Hz master clock over 16
pub const PERIOD_CLOCK: f64 = 111861.0;

/// Largest value of the 12-bit tone period
pub const MAX_PERIOD: u16 = 0x0FFF;

/// Register numbers
pub mod reg {
    /// Fine tone period of channel A; channel n uses `TONE_FINE + 2n`
    pub const TONE_FINE: u8 = 0x00;
    /// Coarse tone period of channel A; channel n uses `TONE_COARSE + 2n`
    pub const TONE_COARSE: u8 = 0x01;
    pub const MIXER: u8 = 0x07;
    /// Amplitude of channel A; channel n uses `AMPLITUDE + n`
    pub const AMPLITUDE: u8 = 0x08;
}

/// Mixer value with tone enabled and noise disabled on A, B and C
pub const MIXER_TONE_ONLY: u8 = 0x38;

/// Frequency in Hz of a MIDI note bent by `bend` semitones (A4 = 69 = 440 Hz)
pub fn note_to_frequency(note: u8, bend: f64) -> f64 {
    440.0 * 2f64.powf((note as f64 + bend - 69.0) / 12.0)
}

/// Tone period for a frequency, truncated and clamped to 12 bits
pub fn frequency_to_period(freq: f64) -> u16 {
    let period = PERIOD_CLOCK / freq;
    if period >= MAX_PERIOD as f64 {
        MAX_PERIOD
    } else {
        period as u16
    }
}

/// Chip index and channel within the chip for a voice
pub fn voice_location(voice: usize) -> (u8, u8) {
    (
        (voice / CHANNELS_PER_CHIP) as u8,
        (voice % CHANNELS_PER_CHIP) as u8,
    )
}

/// Two AY-3-8910 chips seen as six voices, 0-2 on the first chip and 3-5 on the second
#[derive(Debug, Default)]
pub struct DualAy8910;

impl DualAy8910 {
    pub fn new() -> Self {
        Self
    }

    /// Enable the three tone channels on both chips
    pub fn init<W: Write>(&self, writer: &mut VgmWriter<W>) -> Result<()> {
        writer.write_ay(0, reg::MIXER, MIXER_TONE_ONLY)?;
        writer.write_ay(1, reg::MIXER, MIXER_TONE_ONLY)?;
        Ok(())
    }

    pub fn set_volume<W: Write>(
        &self,
        writer: &mut VgmWriter<W>,
        voice: usize,
        volume: u8,
    ) -> Result<()> {
        let (chip, channel) = voice_location(voice);
        writer.write_ay(chip, reg::AMPLITUDE + channel, volume & 0x0F)
    }

    pub fn set_frequency<W: Write>(
        &self,
        writer: &mut VgmWriter<W>,
        voice: usize,
        freq: f64,
    ) -> Result<()> {
        let (chip, channel) = voice_location(voice);
        let period = frequency_to_period(freq);
        writer.write_ay(chip, reg::TONE_FINE + channel * 2, (period & 0xFF) as u8)?;
        writer.write_ay(chip, reg::TONE_COARSE + channel * 2, (period >> 8) as u8)?;
        Ok(())
    }
}

/// AY volume for a MIDI velocity, keeping the top four of its seven bits
pub fn velocity_to_volume(velocity: u8) -> u8 {
    (velocity & 0x7F) >> 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a440() {
        assert!((note_to_frequency(69, 0.0) - 440.0).abs() < 1e-9);
        assert!((note_to_frequency(81, 0.0) - 880.0).abs() < 1e-9);
        assert!((note_to_frequency(67, 2.0) - 440.0).abs() < 1e-9);
        assert_eq!(frequency_to_period(440.0), 254);
    }

    #[test]
    fn test_frequency_monotonic_in_note() {
        for bend in [-2.0, 0.0, 1.5] {
            for note in 0..127u8 {
                assert!(note_to_frequency(note + 1, bend) > note_to_frequency(note, bend));
            }
        }
    }

    #[test]
    fn test_period_monotonic_in_frequency() {
        let mut last = u16::MAX;
        for note in 0..=127u8 {
            let period = frequency_to_period(note_to_frequency(note, 0.0));
            assert!(period <= last);
            last = period;
        }
        assert!(frequency_to_period(100.0) > frequency_to_period(1000.0));
    }

    #[test]
    fn test_low_notes_clamp_to_12_bits() {
        assert_eq!(frequency_to_period(note_to_frequency(0, -2.0)), MAX_PERIOD);
    }

    #[test]
    fn test_voice_registers() {
        let ay = DualAy8910::new();
        let mut writer = VgmWriter::new(Vec::new());
        ay.set_volume(&mut writer, 4, 15).unwrap();
        ay.set_frequency(&mut writer, 4, 440.0).unwrap();
        assert_eq!(
            writer.into_inner(),
            vec![0xA0, 0x89, 0x0F, 0xA0, 0x82, 0xFE, 0xA0, 0x83, 0x00]
        );
    }

    #[test]
    fn test_velocity_to_volume() {
        assert_eq!(velocity_to_volume(127), 15);
        assert_eq!(velocity_to_volume(8), 1);
        assert_eq!(velocity_to_volume(7), 0);
        assert_eq!(velocity_to_volume(0xFF), 15);
    }
}
