//! DDS container header inspection.
//!
//! Only the handful of header fields needed to locate the first mip level are
//! decoded. The payload itself is never validated.

use std::io::Read;
use std::ops::Range;

use binrw::{io::Cursor, BinRead};

use crate::error::{Error, Result};

/// Size of the fixed DDS header, including the `DDS ` magic.
pub const DDS_HEADER_LEN: u64 = 128;

/// Pixel format contains alpha data only.
pub const DDPF_ALPHA: u32 = 0x2;
/// Compressed RGB data, `four_cc` holds the format tag.
pub const DDPF_FOURCC: u32 = 0x4;
/// Uncompressed RGB data.
pub const DDPF_RGB: u32 = 0x40;
/// YUV uncompressed data.
pub const DDPF_YUV: u32 = 0x200;
/// Single channel luminance data.
pub const DDPF_LUMINANCE: u32 = 0x20000;

const UNCOMPRESSED_MASK: u32 = DDPF_ALPHA | DDPF_RGB | DDPF_YUV | DDPF_LUMINANCE;

/// Block compression format 1, 4 bits per pixel.
pub const FOURCC_DXT1: [u8; 4] = *b"DXT1";

/// The subset of a DDS header that determines where mip 0 lives.
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
#[br(little)]
pub struct DdsHeader {
    #[br(pad_before = 12)]
    pub height: u32,
    pub width: u32,
    #[br(pad_before = 60)]
    pub pixel_format_flags: u32,
    pub four_cc: [u8; 4],
    #[br(pad_after = 36)]
    pub rgb_bit_count: u32,
}

impl DdsHeader {
    /// Parse the header from the first bytes of a DDS file.
    ///
    /// `bytes` must hold at least [`DDS_HEADER_LEN`] bytes; anything after the
    /// header is ignored.
    pub fn read_from(bytes: &[u8]) -> Result<Self> {
        if (bytes.len() as u64) < DDS_HEADER_LEN {
            return Err(Error::TruncatedHeader {
                expected: DDS_HEADER_LEN,
                actual: bytes.len() as u64,
            });
        }

        let mut cursor = Cursor::new(&bytes[..DDS_HEADER_LEN as usize]);
        Ok(Self::read(&mut cursor)?)
    }

    /// Read exactly one header from a stream, leaving it positioned at the payload.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buffer = [0u8; DDS_HEADER_LEN as usize];
        let filled = read_full(reader, &mut buffer)?;
        Self::read_from(&buffer[..filled])
    }

    pub fn is_compressed(&self) -> bool {
        self.pixel_format_flags & DDPF_FOURCC != 0
    }

    /// Byte length of mip level 0.
    pub fn mip0_len(&self) -> Result<u64> {
        let pixels = u64::from(self.width) * u64::from(self.height);

        if self.is_compressed() {
            // Other block formats are assumed to be 8 bits per pixel.
            if self.four_cc == FOURCC_DXT1 {
                return Ok(pixels / 2);
            }
            return Ok(pixels);
        }

        if self.pixel_format_flags & UNCOMPRESSED_MASK != 0 {
            return pixels
                .checked_mul(u64::from(self.rgb_bit_count / 8))
                .ok_or(Error::SizeOverflow {
                    width: self.width,
                    height: self.height,
                    bit_count: self.rgb_bit_count,
                });
        }

        Ok(pixels)
    }

    /// Absolute byte range of mip 0 within the file.
    pub fn mip0_range(&self) -> Result<Range<u64>> {
        let len = self.mip0_len()?;
        let end = DDS_HEADER_LEN.checked_add(len).ok_or(Error::SizeOverflow {
            width: self.width,
            height: self.height,
            bit_count: self.rgb_bit_count,
        })?;
        Ok(DDS_HEADER_LEN..end)
    }

    /// Short human readable description of the pixel format.
    pub fn format_label(&self) -> String {
        if self.is_compressed() {
            return String::from_utf8_lossy(&self.four_cc)
                .trim_end_matches('\0')
                .to_string();
        }
        if self.pixel_format_flags & UNCOMPRESSED_MASK != 0 {
            return format!("uncompressed {}bpp", self.rgb_bit_count);
        }
        "unknown".to_string()
    }
}

/// Fill `buffer` from `reader`, stopping early only at end of stream.
pub(crate) fn read_full<R: Read>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
