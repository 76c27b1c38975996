//! The definition record codec.
//!
//! A definition record installs the schema for subsequent data records at
//! a local message slot: the byte order, the global message it encodes,
//! and one field entry per slot in the payload. The resolved schema is
//! built once, when the definition is decoded or constructed; data records
//! then read and write against it without further profile lookups.

use std::io::Read;

use zerocopy::FromBytes;

use crate::error::{Error, Result};
use crate::profile::{MessageSource, Profile};

use super::field_definition::{FieldDefEntry, SchemaField};

/// The byte order a definition declares for its data records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    /// Architecture byte 0.
    LittleEndian,
    /// Architecture byte 1.
    BigEndian,
}

impl Architecture {
    /// Decode the architecture byte; anything but 0 or 1 is invalid.
    pub fn from_byte(value: u8) -> Result<Architecture> {
        match value {
            0 => Ok(Architecture::LittleEndian),
            1 => Ok(Architecture::BigEndian),
            _ => Err(Error::InvalidArchitecture { value }),
        }
    }

    /// The wire byte.
    pub fn byte(self) -> u8 {
        match self {
            Architecture::LittleEndian => 0,
            Architecture::BigEndian => 1,
        }
    }

    /// Whether multi-byte values are little-endian.
    pub fn is_little_endian(self) -> bool {
        self == Architecture::LittleEndian
    }
}

/// A definition record, with its schema resolved against the profile.
#[derive(Debug, Clone)]
pub struct DefinitionRecord {
    /// The byte order of this definition's data records.
    pub architecture: Architecture,
    /// The global message number.
    pub global_message_number: u16,
    /// The resolved message name.
    pub message_name: String,
    /// Which profile dictionary named the message.
    pub message_source: MessageSource,
    /// The wire field entries, in declared order.
    pub entries: Vec<FieldDefEntry>,
    /// The resolved schema, aligned with `entries`.
    pub fields: Vec<SchemaField>,
}

impl DefinitionRecord {
    /// Decode a definition record from the stream.
    ///
    /// `developer_data` reflects bit 5 of the record header; a
    /// developer-field section is tolerated only when its count is zero.
    pub fn decode<R: Read>(
        r: &mut R,
        profile: &Profile,
        developer_data: bool,
    ) -> Result<DefinitionRecord> {
        let mut prefix = [0u8; 5];
        r.read_exact(&mut prefix)?;

        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct Prefix {
            reserved: u8,
            architecture: u8,
            global_message: [u8; 2],
            field_count: u8,
        }

        let Prefix {
            architecture,
            global_message,
            field_count,
            ..
        } = zerocopy::transmute!(prefix);

        let architecture = Architecture::from_byte(architecture)?;
        let global_message_number = if architecture.is_little_endian() {
            u16::from_le_bytes(global_message)
        } else {
            u16::from_be_bytes(global_message)
        };

        let message = profile
            .message_by_number(global_message_number)
            .ok_or(Error::UnknownGlobalMessage {
                number: global_message_number,
            })?;

        let mut entries = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let mut raw = [0u8; 3];
            r.read_exact(&mut raw)?;
            entries.push(FieldDefEntry::decode(raw));
        }

        if developer_data {
            let mut count = [0u8; 1];
            r.read_exact(&mut count)?;
            if count[0] != 0 {
                return Err(Error::DeveloperFieldsUnsupported);
            }
        }

        let fields = entries
            .iter()
            .map(|entry| SchemaField::resolve(*entry, message))
            .collect::<Result<Vec<_>>>()?;

        Ok(DefinitionRecord {
            architecture,
            global_message_number,
            message_name: message.name.clone(),
            message_source: message.source,
            entries,
            fields,
        })
    }

    /// Serialize this definition record (without its record header).
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![0, self.architecture.byte()];

        if self.architecture.is_little_endian() {
            bytes.extend_from_slice(&self.global_message_number.to_le_bytes());
        } else {
            bytes.extend_from_slice(&self.global_message_number.to_be_bytes());
        }

        bytes.push(self.entries.len() as u8);
        for entry in &self.entries {
            bytes.extend_from_slice(&entry.encode());
        }

        bytes
    }

    /// The payload length of data records under this definition.
    pub fn payload_len(&self) -> usize {
        self.entries.iter().map(|e| e.byte_count as usize).sum()
    }
}
