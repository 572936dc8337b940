//! Header module for cache entries
//!
//! Every cache entry starts with a fixed-size header that identifies the file as a
//! seqplug entry and describes how the payload that follows is encoded.

use byteorder::{ByteOrder, LittleEndian};
use std::io::Write;

use crate::{error::CacheError, Result};

/// Current magic number: "SQCH" in ASCII (in little-endian byte order)
///
/// This is used to identify cache entries and reject foreign files.
const MAGIC: u32 = 0x4843_5153;

/// Current format version of the cache entry layout
///
/// Entries written with a different version are treated as corrupt and recomputed.
const FORMAT: u8 = 1;

/// Size of the header in bytes
pub const SIZE_HEADER: usize = 16;

/// How the payload following the header is encoded
///
/// The JSON codecs only hold values JSON can represent: map keys must be strings and
/// non-finite floats do not survive. Use [`Codec::ZstdBincode`] for anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Codec {
    /// Plain JSON
    Json = 0,
    /// zstd-compressed JSON
    ZstdJson = 1,
    /// zstd-compressed bincode
    #[default]
    ZstdBincode = 2,
}
impl TryFrom<u8> for Codec {
    type Error = CacheError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Json),
            1 => Ok(Self::ZstdJson),
            2 => Ok(Self::ZstdBincode),
            other => Err(CacheError::InvalidCodec(other)),
        }
    }
}

/// Header structure for cache entries
///
/// The layout is 16 bytes:
///
/// | bytes  | field            |
/// |--------|------------------|
/// | 0..4   | magic            |
/// | 4      | format version   |
/// | 5      | payload codec    |
/// | 6..8   | reserved         |
/// | 8..16  | payload length   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    /// Magic number to identify the file format
    pub magic: u32,

    /// Version of the entry layout
    pub format: u8,

    /// Encoding of the payload
    pub codec: Codec,

    /// Reserve remaining bytes for future use
    pub reserved: [u8; 2],

    /// Number of payload bytes following the header
    pub payload_len: u64,
}
impl EntryHeader {
    /// Creates a new header for a payload of `payload_len` bytes
    #[must_use]
    pub fn new(codec: Codec, payload_len: u64) -> Self {
        Self {
            magic: MAGIC,
            format: FORMAT,
            codec,
            reserved: [0; 2],
            payload_len,
        }
    }

    /// Parses a header from a fixed-size byte array
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The magic number is incorrect
    /// * The format version is unsupported
    /// * The codec byte is unknown
    pub fn from_bytes(buffer: &[u8; SIZE_HEADER]) -> Result<Self> {
        let magic = LittleEndian::read_u32(&buffer[0..4]);
        if magic != MAGIC {
            return Err(CacheError::InvalidMagicNumber(magic).into());
        }
        let format = buffer[4];
        if format != FORMAT {
            return Err(CacheError::InvalidFormatVersion(format).into());
        }
        let codec = Codec::try_from(buffer[5])?;
        let reserved = [buffer[6], buffer[7]];
        let payload_len = LittleEndian::read_u64(&buffer[8..16]);
        Ok(Self {
            magic,
            format,
            codec,
            reserved,
            payload_len,
        })
    }

    /// Parses a header from the start of an arbitrarily sized buffer
    pub fn from_buffer(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < SIZE_HEADER {
            return Err(CacheError::Truncated(buffer.len(), SIZE_HEADER).into());
        }
        let mut bytes = [0u8; SIZE_HEADER];
        bytes.copy_from_slice(&buffer[..SIZE_HEADER]);
        Self::from_bytes(&bytes)
    }

    /// Writes the header to a writer
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut buffer = [0u8; SIZE_HEADER];
        LittleEndian::write_u32(&mut buffer[0..4], self.magic);
        buffer[4] = self.format;
        buffer[5] = self.codec as u8;
        buffer[6..8].copy_from_slice(&self.reserved);
        LittleEndian::write_u64(&mut buffer[8..16], self.payload_len);
        writer.write_all(&buffer)?;
        Ok(())
    }
}
