//! The one-byte record header codec.
//!
//! Every record opens with a single byte naming a local message slot and
//! telling definition records apart from data records. Compressed
//! timestamp headers (bit 7) exist on the wire but are not supported.

use tartan_bitfield::bitfield;

use crate::error::{Error, Result};

bitfield! {
    struct Normal(u8) {
        [0..4] local_message_type: u8,
        [4] reserved,
        [5] developer_data,
        [6] message_type,
        [7] compressed,
    }
}

/// The decoded form of a record's leading byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Whether the record is a definition (true) or data (false).
    pub message_type: bool,
    /// Whether the definition carries a developer-field section.
    pub developer_data: bool,
    /// Bit 4, carried through unchanged.
    pub reserved: bool,
    /// The local message slot, 0–15.
    pub local_message_type: u8,
}

impl RecordHeader {
    /// Decode a record header byte.
    pub fn decode(byte: u8) -> Result<RecordHeader> {
        let header = Normal(byte);

        if header.compressed() {
            return Err(Error::CompressedTimestampUnsupported);
        }

        Ok(RecordHeader {
            message_type: header.message_type(),
            developer_data: header.developer_data(),
            reserved: header.reserved(),
            local_message_type: header.local_message_type(),
        })
    }

    /// A definition header for the given local slot.
    pub fn definition(local: u8) -> RecordHeader {
        RecordHeader {
            message_type: true,
            developer_data: false,
            reserved: false,
            local_message_type: local,
        }
    }

    /// A data header for the given local slot.
    pub fn data(local: u8) -> RecordHeader {
        RecordHeader {
            message_type: false,
            developer_data: false,
            reserved: false,
            local_message_type: local,
        }
    }

    /// Whether this header opens a new definition record.
    pub fn for_new_definition(&self) -> bool {
        self.message_type
    }

    /// Serialize the header byte.
    pub fn encode(&self) -> u8 {
        let mut byte = Normal(0);
        byte.set_local_message_type(self.local_message_type);
        byte.set_reserved(self.reserved);
        byte.set_developer_data(self.developer_data);
        byte.set_message_type(self.message_type);
        byte.0
    }
}
