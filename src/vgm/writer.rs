//! Streaming VGM writer

use super::commands::opcode;
use super::delay;
use super::header::{offset, VgmHeader, VGM_HEADER_SIZE};
use crate::error::Result;
use std::io::{Seek, SeekFrom, Write};

/// Register address bit that selects the second AY chip
pub const AY_SECOND_CHIP: u8 = 0x80;

/// VGM writer that appends commands to any byte sink
///
/// Nothing is rewritten once emitted, so the header's EOF offset and total
/// sample count stay zero unless `patch_header` is called on a seekable sink.
pub struct VgmWriter<W> {
    out: W,
    /// Bytes written so far, header included
    written: u64,
    /// Samples covered by the wait commands written so far
    samples: u64,
}

impl<W: Write> VgmWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            written: 0,
            samples: 0,
        }
    }

    /// Write the VGM header (call once, before any command)
    pub fn write_header(&mut self, header: &VgmHeader) -> Result<()> {
        self.write_data(header.as_bytes())
    }

    /// Write raw bytes to the data section
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.out.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Write an AY-3-8910 register; `chip` 0 or 1
    pub fn write_ay(&mut self, chip: u8, register: u8, data: u8) -> Result<()> {
        let mut address = register & 0x0F;
        if chip != 0 {
            address |= AY_SECOND_CHIP;
        }
        self.write_data(&[opcode::AY8910, address, data])
    }

    /// Write a delay
    pub fn write_delay(&mut self, samples: u64) -> Result<()> {
        let commands = delay::generate_delay(samples);
        self.write_data(&commands)?;
        self.samples += samples;
        Ok(())
    }

    /// Write end of data marker
    pub fn write_end(&mut self) -> Result<()> {
        self.write_data(&[delay::cmd::END])
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Bytes written so far
    pub fn position(&self) -> u64 {
        self.written
    }

    /// Samples waited so far
    pub fn total_samples(&self) -> u64 {
        self.samples
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Seek> VgmWriter<W> {
    /// Fill in the EOF offset and total sample count, then return to the end
    pub fn patch_header(&mut self) -> Result<()> {
        if self.written < VGM_HEADER_SIZE as u64 {
            return Ok(());
        }
        let eof_offset = (self.written - offset::EOF_OFFSET as u64) as u32;
        let samples = self.samples.min(u32::MAX as u64) as u32;

        self.out.seek(SeekFrom::Start(offset::EOF_OFFSET as u64))?;
        self.out.write_all(&eof_offset.to_le_bytes())?;
        self.out.seek(SeekFrom::Start(offset::TOTAL_SAMPLES as u64))?;
        self.out.write_all(&samples.to_le_bytes())?;
        self.out.seek(SeekFrom::Start(self.written))?;
        Ok(())
    }
}
