//! Assignment of MIDI notes to hardware voices

use crate::chips::ay8910::VOICE_COUNT;
use crate::config::AllocationMode;

/// State of one hardware voice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Voice {
    /// Note currently sounding, `None` when the voice is free
    pub note: Option<u8>,
    /// MIDI channel that last claimed the voice
    pub channel: u8,
    /// Allocation order; later allocations get larger tags, modulo 256
    pub order: u8,
}

impl Voice {
    pub fn is_free(&self) -> bool {
        self.note.is_none()
    }
}

/// Fixed table of voices and the policy that fills it
#[derive(Debug, Clone)]
pub struct VoiceAllocator {
    mode: AllocationMode,
    voices: [Voice; VOICE_COUNT],
    /// Tag handed to the next allocation
    next_order: u8,
}

impl VoiceAllocator {
    pub fn new(mode: AllocationMode) -> Self {
        Self {
            mode,
            voices: [Voice::default(); VOICE_COUNT],
            next_order: 0,
        }
    }

    pub fn voices(&self) -> &[Voice; VOICE_COUNT] {
        &self.voices
    }

    /// Claim a voice for a note-on and return its index
    pub fn allocate(&mut self, channel: u8, note: u8) -> Option<usize> {
        let index = match self.mode {
            AllocationMode::Ring => self.free_or_oldest()?,
            AllocationMode::Voice => channel as usize,
        };
        let order = self.next_order;
        let voice = self.voices.get_mut(index)?;

        voice.note = Some(note);
        voice.channel = channel;
        voice.order = order;
        self.next_order = self.next_order.wrapping_add(1);
        Some(index)
    }

    /// Free the voice playing `note` and return its index
    ///
    /// In ring mode the channel is not compared: whichever voice sounds the
    /// note is released, even if another channel started it.
    pub fn release(&mut self, channel: u8, note: u8) -> Option<usize> {
        let index = match self.mode {
            AllocationMode::Ring => self.voices.iter().position(|v| v.note == Some(note))?,
            AllocationMode::Voice => channel as usize,
        };
        let voice = self.voices.get_mut(index)?;
        voice.note = None;
        Some(index)
    }

    /// Sounding voices last claimed by `channel`, with their notes
    pub fn sounding_on_channel(&self, channel: u8) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.voices
            .iter()
            .enumerate()
            .filter(move |(_, v)| v.channel == channel)
            .filter_map(|(i, v)| v.note.map(|note| (i, note)))
    }

    fn free_or_oldest(&self) -> Option<usize> {
        if let Some(index) = self.voices.iter().position(Voice::is_free) {
            return Some(index);
        }

        // Walk tags forward from just after the next one to be issued; the
        // first tag found is the least recently allocated voice.
        let mut order = self.next_order.wrapping_add(1);
        while order != self.next_order {
            if let Some(index) = self.voices.iter().position(|v| v.order == order) {
                return Some(index);
            }
            order = order.wrapping_add(1);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seventh_note_steals_first_voice() {
        let mut alloc = VoiceAllocator::new(AllocationMode::Ring);
        for (i, note) in (60..66).enumerate() {
            assert_eq!(alloc.allocate(0, note), Some(i));
        }
        assert!(alloc.voices().iter().all(|v| !v.is_free()));

        assert_eq!(alloc.allocate(0, 72), Some(0));
        assert_eq!(alloc.voices()[0].note, Some(72));
        assert_eq!(alloc.voices().iter().filter(|v| !v.is_free()).count(), 6);

        // Voice 1 is now the oldest
        assert_eq!(alloc.allocate(0, 73), Some(1));
    }

    #[test]
    fn test_free_voice_preferred_over_stealing() {
        let mut alloc = VoiceAllocator::new(AllocationMode::Ring);
        for note in 60..66 {
            alloc.allocate(0, note);
        }
        assert_eq!(alloc.release(0, 63), Some(3));
        assert_eq!(alloc.allocate(0, 70), Some(3));
    }

    #[test]
    fn test_release_ignores_channel() {
        let mut alloc = VoiceAllocator::new(AllocationMode::Ring);
        assert_eq!(alloc.allocate(0, 60), Some(0));
        assert_eq!(alloc.release(1, 60), Some(0));
        assert!(alloc.voices()[0].is_free());
        assert_eq!(alloc.release(0, 60), None);
    }

    #[test]
    fn test_stealing_across_tag_wrap() {
        let mut alloc = VoiceAllocator::new(AllocationMode::Ring);
        for note in 0..6 {
            alloc.allocate(0, note);
        }
        // Cycle enough allocations to wrap the 8-bit tag several times
        for i in 0..600u32 {
            let expected = (i as usize) % VOICE_COUNT;
            assert_eq!(alloc.allocate(0, (i % 128) as u8), Some(expected));
        }
    }

    #[test]
    fn test_voice_mode_maps_channel_to_voice() {
        let mut alloc = VoiceAllocator::new(AllocationMode::Voice);
        assert_eq!(alloc.allocate(4, 60), Some(4));
        assert_eq!(alloc.allocate(4, 62), Some(4));
        assert_eq!(alloc.release(4, 10), Some(4));
        assert_eq!(alloc.allocate(9, 60), None);
        assert_eq!(alloc.release(9, 60), None);
    }

    #[test]
    fn test_sounding_on_channel() {
        let mut alloc = VoiceAllocator::new(AllocationMode::Ring);
        alloc.allocate(2, 60);
        alloc.allocate(3, 61);
        alloc.allocate(2, 62);
        alloc.release(2, 60);
        let sounding: Vec<_> = alloc.sounding_on_channel(2).collect();
        assert_eq!(sounding, vec![(2, 62)]);
    }
}
