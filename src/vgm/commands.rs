//! VGM command definitions

use serde::Serialize;

/// VGM command opcodes
pub mod opcode {
    pub const WAIT_NNNN: u8 = 0x61;
    pub const WAIT_60TH: u8 = 0x62;
    pub const WAIT_50TH: u8 = 0x63;
    pub const END: u8 = 0x66;
    pub const AY8910: u8 = 0xA0;
    pub const WAIT_N_FIRST: u8 = 0x70;
    pub const WAIT_N_LAST: u8 = 0x7F;
}

/// A parsed VGM command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum VgmCommand {
    /// AY-3-8910 write; `chip` is 1 when bit 0x80 of the address byte is set
    Ay8910Write { chip: u8, reg: u8, data: u8 },
    /// Wait N samples
    Wait { samples: u32 },
    /// End of sound data
    End,
    /// Any other command, with its operand bytes
    Unknown { opcode: u8, bytes: Vec<u8> },
}

/// Operand bytes after an opcode the converter does not write
///
/// Follows the fixed-size opcode ranges reserved by the VGM format.
pub fn command_size(opcode: u8) -> usize {
    match opcode {
        0x30..=0x3F => 1,
        0x40..=0x5F | 0xA0..=0xBF => 2,
        0xC0..=0xDF => 3,
        0xE0..=0xFF => 4,
        _ => 0,
    }
}
