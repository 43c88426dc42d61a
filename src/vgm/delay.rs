//! VGM wait command generation

/// VGM delay commands
pub mod cmd {
    /// Wait n samples (16-bit)
    pub const WAIT_NNNN: u8 = 0x61;
    /// Wait 735 samples (1/60 second at 44100Hz)
    pub const WAIT_60TH: u8 = 0x62;
    /// Wait 882 samples (1/50 second at 44100Hz)
    pub const WAIT_50TH: u8 = 0x63;
    /// End of sound data
    pub const END: u8 = 0x66;
    /// Wait n+1 samples (n = 0-15, command 0x70-0x7F)
    pub const WAIT_N_BASE: u8 = 0x70;
}

/// Longest wait a single 0x61 command can express
pub const MAX_WAIT: u64 = 0xFFFF;

/// Generate wait commands for `duration` samples
///
/// Exact 735 and 882 sample waits use their one-byte opcodes, 1-16 samples use
/// the short form and everything else the 16-bit form. Durations above
/// `MAX_WAIT` are emitted as full-length waits followed by the remainder.
pub fn generate_delay(mut duration: u64) -> Vec<u8> {
    let mut commands = Vec::new();

    while duration > MAX_WAIT {
        commands.extend_from_slice(&[cmd::WAIT_NNNN, 0xFF, 0xFF]);
        duration -= MAX_WAIT;
    }

    match duration {
        0 => {}
        735 => commands.push(cmd::WAIT_60TH),
        882 => commands.push(cmd::WAIT_50TH),
        1..=16 => commands.push(cmd::WAIT_N_BASE + (duration as u8) - 1),
        _ => {
            commands.push(cmd::WAIT_NNNN);
            commands.extend_from_slice(&(duration as u16).to_le_bytes());
        }
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_delay() {
        assert!(generate_delay(0).is_empty());
    }

    #[test]
    fn test_short_delay() {
        assert_eq!(generate_delay(1), vec![0x70]);
        assert_eq!(generate_delay(5), vec![0x74]);
        assert_eq!(generate_delay(16), vec![0x7F]);
    }

    #[test]
    fn test_60th_delay() {
        assert_eq!(generate_delay(735), vec![0x62]);
    }

    #[test]
    fn test_50th_delay() {
        assert_eq!(generate_delay(882), vec![0x63]);
    }

    #[test]
    fn test_16bit_delay() {
        assert_eq!(generate_delay(17), vec![0x61, 0x11, 0x00]);
        assert_eq!(generate_delay(736), vec![0x61, 0xE0, 0x02]);
        assert_eq!(generate_delay(65535), vec![0x61, 0xFF, 0xFF]);
    }

    #[test]
    fn test_split_delay() {
        // 70000 = 65535 + 4465 (0x1171)
        assert_eq!(
            generate_delay(70000),
            vec![0x61, 0xFF, 0xFF, 0x61, 0x71, 0x11]
        );
        assert_eq!(generate_delay(65535 + 735), vec![0x61, 0xFF, 0xFF, 0x62]);
        assert_eq!(
            generate_delay(65535 * 2 + 3),
            vec![0x61, 0xFF, 0xFF, 0x61, 0xFF, 0xFF, 0x72]
        );
    }
}
