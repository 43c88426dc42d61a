//! VGM file reader and parser

use super::commands::{command_size, opcode, VgmCommand};
use super::header::{offset, DUAL_CHIP};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Parsed VGM header information
#[derive(Debug, Clone, Default)]
pub struct VgmHeader {
    pub version: u32,
    pub eof_offset: u32,
    pub total_samples: u32,
    pub data_offset: u32,
    pub chips: HashMap<String, ChipInfo>,
}

/// Information about a chip in the VGM
#[derive(Debug, Clone)]
pub struct ChipInfo {
    pub clock: u32,
    pub dual: bool,
    pub extra: HashMap<String, u32>,
}

/// VGM file reader
pub struct VgmReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VgmReader<'a> {
    /// Create a new reader from raw VGM data
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Check if we've reached the end of data
    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Read a single byte
    fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(Error::VgmParse("Unexpected end of data".into()));
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Read a 16-bit little-endian value
    fn read_u16_le(&mut self) -> Result<u16> {
        let lo = self.read_u8()? as u16;
        let hi = self.read_u8()? as u16;
        Ok(lo | (hi << 8))
    }

    /// Read bytes into a buffer
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.pos + len > self.data.len() {
            return Err(Error::VgmParse("Unexpected end of data".into()));
        }
        let bytes = self.data[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(bytes)
    }

    /// Read a u32 at a specific offset without advancing position
    fn peek_u32_at(&self, offset: usize) -> Result<u32> {
        match self.data.get(offset..offset + 4) {
            Some(b) => Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            None => Err(Error::VgmParse("Offset out of bounds".into())),
        }
    }

    fn peek_u8_at(&self, offset: usize) -> Result<u8> {
        self.data
            .get(offset)
            .copied()
            .ok_or_else(|| Error::VgmParse("Offset out of bounds".into()))
    }

    /// Validate VGM magic and parse header
    pub fn parse_header(&mut self) -> Result<VgmHeader> {
        if self.data.len() < 0x40 {
            return Err(Error::VgmParse("File too small for VGM header".into()));
        }
        if &self.data[0..4] != b"Vgm " {
            return Err(Error::VgmParse("Invalid VGM magic".into()));
        }

        let version = self.peek_u32_at(offset::VERSION)?;
        let eof_offset = self.peek_u32_at(offset::EOF_OFFSET)?;
        let total_samples = self.peek_u32_at(offset::TOTAL_SAMPLES)?;

        // Data offset is relative to 0x34, default to 0x0C (so data starts at 0x40) for older versions
        let data_offset = if version >= 0x150 {
            match self.peek_u32_at(offset::DATA_OFFSET)? {
                0 => 0x0C,
                rel_offset => rel_offset,
            }
        } else {
            0x0C
        };

        let mut chips = HashMap::new();
        if version >= 0x151 {
            self.parse_chip_clock(&mut chips, "ay8910", offset::AY8910_CLOCK)?;
            if let Some(chip) = chips.get_mut("ay8910") {
                let chip_type = self.peek_u8_at(offset::AY8910_TYPE)?;
                let flags = self.peek_u8_at(offset::AY8910_FLAGS)?;
                chip.extra.insert("type".into(), chip_type as u32);
                chip.extra.insert("flags".into(), flags as u32);
            }
        }

        Ok(VgmHeader {
            version,
            eof_offset,
            total_samples,
            data_offset,
            chips,
        })
    }

    /// Parse a chip clock from the header
    fn parse_chip_clock(
        &self,
        chips: &mut HashMap<String, ChipInfo>,
        name: &str,
        clock_offset: usize,
    ) -> Result<()> {
        if clock_offset + 4 > self.data.len() {
            return Ok(());
        }
        let clock = self.peek_u32_at(clock_offset)?;
        if clock != 0 {
            chips.insert(
                name.to_string(),
                ChipInfo {
                    clock: clock & 0x3FFF_FFFF,
                    dual: (clock & DUAL_CHIP) != 0,
                    extra: HashMap::new(),
                },
            );
        }
        Ok(())
    }

    /// Parse all VGM commands from the data section
    ///
    /// Stops at the end marker or at the end of the data, whichever comes first;
    /// a stream written without an end marker is accepted.
    pub fn parse_commands(&mut self, header: &VgmHeader) -> Result<Vec<VgmCommand>> {
        let data_start = (header.data_offset as usize) + offset::DATA_OFFSET;
        self.seek(data_start);

        let mut commands = Vec::new();
        while !self.is_eof() {
            let cmd = self.parse_command()?;
            let is_end = matches!(cmd, VgmCommand::End);
            commands.push(cmd);
            if is_end {
                break;
            }
        }

        Ok(commands)
    }

    /// Parse a single VGM command
    fn parse_command(&mut self) -> Result<VgmCommand> {
        let op = self.read_u8()?;

        let cmd = match op {
            opcode::AY8910 => {
                let address = self.read_u8()?;
                let data = self.read_u8()?;
                VgmCommand::Ay8910Write {
                    chip: address >> 7,
                    reg: address & 0x7F,
                    data,
                }
            }
            opcode::WAIT_NNNN => {
                let samples = self.read_u16_le()? as u32;
                VgmCommand::Wait { samples }
            }
            opcode::WAIT_60TH => VgmCommand::Wait { samples: 735 },
            opcode::WAIT_50TH => VgmCommand::Wait { samples: 882 },
            opcode::WAIT_N_FIRST..=opcode::WAIT_N_LAST => VgmCommand::Wait {
                samples: (op - opcode::WAIT_N_FIRST) as u32 + 1,
            },
            opcode::END => VgmCommand::End,
            _ => {
                let bytes = self.read_bytes(command_size(op))?;
                VgmCommand::Unknown { opcode: op, bytes }
            }
        };

        Ok(cmd)
    }
}
