//! The document header codec.
//!
//! A document is one or more chained segments, each opened by a 12- or
//! 14-byte header and closed by a two-byte CRC over the record section.
//! Decoding a header also verifies both CRCs, so the record loop that
//! follows can read without re-checking.

use std::io::{Read, Seek, SeekFrom};

use zerocopy::FromBytes;

use crate::check;
use crate::error::{Error, Result};

/// The filetype marker every header carries.
pub const MAGIC: [u8; 4] = *b".FIT";

/// Protocol version written when building documents from scratch.
pub const DEFAULT_PROTOCOL_VERSION: u8 = 16;

/// Profile version written when building documents from scratch.
pub const DEFAULT_PROFILE_VERSION: u16 = 2093;

/// The fixed-width preamble of a document segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Total header length in bytes; 12, or 14 with a trailing CRC.
    pub header_size: u8,
    /// Protocol version byte.
    pub protocol_version: u8,
    /// Profile version, little-endian on the wire.
    pub profile_version: u16,
    /// Record-section length, excluding header and trailing CRC.
    pub data_size: u32,
    /// CRC over the first `header_size - 2` bytes; zero when absent or
    /// unset.
    pub crc: u16,
}

impl Default for FileHeader {
    fn default() -> Self {
        FileHeader {
            header_size: 14,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            profile_version: DEFAULT_PROFILE_VERSION,
            data_size: 0,
            crc: 0,
        }
    }
}

impl FileHeader {
    /// Decode a segment header and verify its CRCs.
    ///
    /// Expects the stream positioned at the start of a segment. The
    /// trailing CRC over the whole record section is verified here as
    /// well; on success the stream is left at the start of the records.
    pub fn decode<R: Read + Seek>(r: &mut R) -> Result<FileHeader> {
        let start = r.stream_position()?;

        let mut prefix = [0u8; 12];
        r.read_exact(&mut prefix)?;

        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct Prefix {
            header_size: u8,
            protocol_version: u8,
            profile_version: [u8; 2],
            data_size: [u8; 4],
            data_type: [u8; 4],
        }

        let Prefix {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = zerocopy::transmute!(prefix);

        if header_size != 12 && header_size != 14 {
            return Err(Error::UnsupportedHeader { size: header_size });
        }

        if data_type != MAGIC {
            return Err(Error::BadMagic {
                got: String::from_utf8_lossy(&data_type).into_owned(),
            });
        }

        let crc = if header_size == 14 {
            let mut raw = [0u8; 2];
            r.read_exact(&mut raw)?;
            u16::from_le_bytes(raw)
        } else {
            0
        };

        // A zero header CRC means "not set" and is accepted as-is.
        if crc != 0 {
            let computed = check::compute(&prefix);
            if computed != crc {
                return Err(Error::HeaderCrcMismatch {
                    computed,
                    found: crc,
                });
            }
        }

        let header = FileHeader {
            header_size,
            protocol_version,
            profile_version: u16::from_le_bytes(profile_version),
            data_size: u32::from_le_bytes(data_size),
            crc,
        };

        let mut body = vec![0u8; header.data_size as usize];
        r.read_exact(&mut body)?;
        let mut trailing = [0u8; 2];
        r.read_exact(&mut trailing)?;

        let computed = check::compute(&body);
        let found = u16::from_le_bytes(trailing);
        if computed != found {
            return Err(Error::FileCrcMismatch { computed, found });
        }

        r.seek(SeekFrom::Start(start + u64::from(header.header_size)))?;

        Ok(header)
    }

    /// Serialize the header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.header_size as usize);
        bytes.push(self.header_size);
        bytes.push(self.protocol_version);
        bytes.extend_from_slice(&self.profile_version.to_le_bytes());
        bytes.extend_from_slice(&self.data_size.to_le_bytes());
        bytes.extend_from_slice(&MAGIC);

        if self.header_size == 14 {
            bytes.extend_from_slice(&self.crc.to_le_bytes());
        }

        bytes
    }

    /// Recompute the header CRC over everything but the CRC bytes.
    ///
    /// A 12-byte header has no CRC field; sealing it is a no-op.
    pub fn seal(&mut self) {
        if self.header_size == 14 {
            self.crc = 0;
            let bytes = self.to_bytes();
            self.crc = check::compute(&bytes[..self.header_size as usize - 2]);
        }
    }
}
