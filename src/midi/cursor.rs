//! Byte-level reads from the MIDI input stream

use crate::error::{Error, Result};
use std::io::{self, Read};

/// Sequential reader that tracks absolute position and a per-chunk byte budget
///
/// Every read decrements `remaining`. The budget may go negative when an event
/// runs past the end of its chunk; the caller decides what to do with that.
pub struct ByteCursor<R> {
    reader: R,
    position: u64,
    remaining: i64,
}

impl<R: Read> ByteCursor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
            remaining: 0,
        }
    }

    /// Absolute offset of the next byte
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// Start a new budget, typically the declared length of a chunk
    pub fn set_remaining(&mut self, remaining: i64) {
        self.remaining = remaining;
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEof {
                offset: self.position,
            },
            _ => Error::Io(e),
        })?;
        self.position += buf.len() as u64;
        self.remaining -= buf.len() as i64;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    /// Read `n` bytes (at most 8) as a big-endian integer
    pub fn read_be(&mut self, n: usize) -> Result<u64> {
        debug_assert!(n <= 8);
        let mut buf = [0u8; 8];
        self.fill(&mut buf[..n])?;
        Ok(buf[..n].iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Read `n` bytes (at most 8) as a little-endian integer
    pub fn read_le(&mut self, n: usize) -> Result<u64> {
        debug_assert!(n <= 8);
        let mut buf = [0u8; 8];
        self.fill(&mut buf[..n])?;
        Ok(buf[..n].iter().rev().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        Ok(self.read_be(2)? as u16)
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        Ok(self.read_be(4)? as u32)
    }

    /// Read a chunk tag, or `None` if the input ends before its first byte
    pub fn try_read_tag(&mut self) -> Result<Option<[u8; 4]>> {
        let mut first = [0u8; 1];
        loop {
            match self.reader.read(&mut first) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        self.position += 1;
        self.remaining -= 1;

        let mut rest = [0u8; 3];
        self.fill(&mut rest)?;
        Ok(Some([first[0], rest[0], rest[1], rest[2]]))
    }

    /// Read a MIDI variable-length quantity
    ///
    /// No length limit is imposed; bits shifted past 32 are lost.
    pub fn read_vlq(&mut self) -> Result<u32> {
        let mut value = 0u32;
        loop {
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
    }

    /// Read `len` bytes, keeping at most the first `keep` of them
    ///
    /// The buffer only grows with bytes actually received, so a huge declared
    /// length on a short stream fails with `UnexpectedEof` without allocating it.
    pub fn read_bytes(&mut self, len: u64, keep: usize) -> Result<Vec<u8>> {
        let kept = len.min(keep as u64);
        let mut buf = Vec::new();
        let read = (&mut self.reader).take(kept).read_to_end(&mut buf)? as u64;
        self.position += read;
        self.remaining -= read as i64;
        if read < kept {
            return Err(Error::UnexpectedEof {
                offset: self.position,
            });
        }
        self.skip(len - kept)?;
        Ok(buf)
    }

    /// Consume and discard `len` bytes
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let copied = io::copy(&mut (&mut self.reader).take(len), &mut io::sink())?;
        self.position += copied;
        self.remaining -= copied as i64;
        if copied < len {
            return Err(Error::UnexpectedEof {
                offset: self.position,
            });
        }
        Ok(())
    }
}
