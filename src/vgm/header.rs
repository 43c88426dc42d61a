//! VGM header layout and construction

/// VGM file version written by the converter
pub const VGM_VERSION: u32 = 0x151;

/// Header size in bytes; command data starts right after it
pub const VGM_HEADER_SIZE: usize = 0x80;

/// Bit set in a chip clock field when two instances of the chip are present
pub const DUAL_CHIP: u32 = 0x4000_0000;

/// VGM header offsets (in bytes)
pub mod offset {
    /// "Vgm " identifier
    pub const IDENT: usize = 0x00;
    /// End of file offset (relative to 0x04)
    pub const EOF_OFFSET: usize = 0x04;
    /// Version number
    pub const VERSION: usize = 0x08;
    /// Total samples
    pub const TOTAL_SAMPLES: usize = 0x18;
    /// VGM data offset (relative to 0x34)
    pub const DATA_OFFSET: usize = 0x34;
    /// AY8910 clock
    pub const AY8910_CLOCK: usize = 0x74;
    /// AY8910 chip type
    pub const AY8910_TYPE: usize = 0x78;
    /// AY8910 flags
    pub const AY8910_FLAGS: usize = 0x79;
}

/// AY8910 chip type byte for a plain AY-3-8910
pub const AY8910_TYPE_AY8910: u8 = 0x00;

/// AY8910 flags byte: legacy output
pub const AY8910_FLAG_LEGACY_OUTPUT: u8 = 0x01;

/// VGM header structure
#[derive(Debug, Clone)]
pub struct VgmHeader {
    data: [u8; VGM_HEADER_SIZE],
}

impl VgmHeader {
    pub fn new() -> Self {
        let mut header = Self {
            data: [0; VGM_HEADER_SIZE],
        };

        header.data[offset::IDENT..offset::IDENT + 4].copy_from_slice(b"Vgm ");
        header.write_u32(offset::VERSION, VGM_VERSION);
        header.write_u32(offset::DATA_OFFSET, (VGM_HEADER_SIZE - offset::DATA_OFFSET) as u32);

        header
    }

    /// Header for two AY-3-8910 chips sharing `clock`
    pub fn dual_ay8910(clock: u32) -> Self {
        let mut header = Self::new();
        header.write_u32(offset::AY8910_CLOCK, clock | DUAL_CHIP);
        header.write_u8(offset::AY8910_TYPE, AY8910_TYPE_AY8910);
        header.write_u8(offset::AY8910_FLAGS, AY8910_FLAG_LEGACY_OUTPUT);
        header
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) {
        if offset < VGM_HEADER_SIZE {
            self.data[offset] = value;
        }
    }

    pub fn write_u32(&mut self, offset: usize, value: u32) {
        if offset + 3 < VGM_HEADER_SIZE {
            self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for VgmHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dual_ay_header_layout() {
        let header = VgmHeader::dual_ay8910(1789773);
        let bytes = header.as_bytes();
        assert_eq!(bytes.len(), 0x80);
        assert_eq!(&bytes[0..4], b"Vgm ");
        assert_eq!(&bytes[0x04..0x08], &[0, 0, 0, 0]);
        assert_eq!(&bytes[0x08..0x0C], &[0x51, 0x01, 0x00, 0x00]);
        assert_eq!(&bytes[0x18..0x1C], &[0, 0, 0, 0]);
        assert_eq!(&bytes[0x34..0x38], &[0x4C, 0x00, 0x00, 0x00]);
        assert_eq!(
            u32::from_le_bytes([bytes[0x74], bytes[0x75], bytes[0x76], bytes[0x77]]),
            1789773 | 0x4000_0000
        );
        assert_eq!(bytes[0x78], 0);
        assert_eq!(bytes[0x79], 1);
        assert!(bytes[0x7A..].iter().all(|&b| b == 0));
    }
}
