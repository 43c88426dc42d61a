//! Per-voice view of AY-3-8910 register writes
//!
//! Folds the flat command stream back into the six converter voices so a
//! dump reads as notes and levels rather than register pokes.

use super::commands::VgmCommand;
use crate::chips::ay8910::{reg, CHANNELS_PER_CHIP, VOICE_COUNT};
use serde::Serialize;

/// Register activity of one voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceTrack {
    pub voice: usize,
    pub chip: u8,
    pub channel: u8,
    pub events: Vec<VoiceEvent>,
}

/// A state change on a voice, stamped with its sample time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoiceEvent {
    Period { sample: u64, period: u16 },
    Volume { sample: u64, volume: u8 },
}

/// Group AY writes by voice (`chip * 3 + channel`)
///
/// Fine and coarse tone writes landing on the same sample are merged into a
/// single period change. Mixer, noise and envelope registers are skipped.
pub fn group_by_voice(commands: &[VgmCommand]) -> Vec<VoiceTrack> {
    let mut tracks: Vec<VoiceTrack> = (0..VOICE_COUNT)
        .map(|voice| VoiceTrack {
            voice,
            chip: (voice / CHANNELS_PER_CHIP) as u8,
            channel: (voice % CHANNELS_PER_CHIP) as u8,
            events: Vec::new(),
        })
        .collect();
    let mut periods = [0u16; VOICE_COUNT];
    // (sample, index into events) of each voice's latest period change
    let mut last_period: [Option<(u64, usize)>; VOICE_COUNT] = [None; VOICE_COUNT];
    let mut sample = 0u64;

    for command in commands {
        match *command {
            VgmCommand::Wait { samples } => sample += samples as u64,
            VgmCommand::End => break,
            VgmCommand::Ay8910Write { chip, reg, data } => {
                let Some((voice, register)) = locate(chip, reg) else {
                    continue;
                };
                let events = &mut tracks[voice].events;
                match register {
                    Register::Fine | Register::Coarse => {
                        let period = &mut periods[voice];
                        *period = match register {
                            Register::Fine => (*period & 0x0F00) | data as u16,
                            _ => (*period & 0x00FF) | ((data as u16 & 0x0F) << 8),
                        };
                        let period = *period;
                        match last_period[voice] {
                            Some((at, index)) if at == sample => {
                                events[index] = VoiceEvent::Period { sample, period };
                            }
                            _ => {
                                last_period[voice] = Some((sample, events.len()));
                                events.push(VoiceEvent::Period { sample, period });
                            }
                        }
                    }
                    Register::Amplitude => events.push(VoiceEvent::Volume {
                        sample,
                        volume: data & 0x0F,
                    }),
                }
            }
            VgmCommand::Unknown { .. } => {}
        }
    }

    tracks
}

#[derive(Clone, Copy)]
enum Register {
    Fine,
    Coarse,
    Amplitude,
}

fn locate(chip: u8, register: u8) -> Option<(usize, Register)> {
    if chip as usize >= VOICE_COUNT / CHANNELS_PER_CHIP {
        return None;
    }
    let base = chip as usize * CHANNELS_PER_CHIP;
    let channels = CHANNELS_PER_CHIP as u8;
    match register {
        r if r < 2 * channels => {
            let kind = if r % 2 == reg::TONE_FINE {
                Register::Fine
            } else {
                Register::Coarse
            };
            Some((base + (r / 2) as usize, kind))
        }
        r if (reg::AMPLITUDE..reg::AMPLITUDE + channels).contains(&r) => {
            Some((base + (r - reg::AMPLITUDE) as usize, Register::Amplitude))
        }
        _ => None,
    }
}
