//! The decoding driver.
//!
//! Walks a document segment by segment: each header is decoded (and its
//! CRCs verified), then the record loop dispatches on every record header,
//! installing definitions and materializing data records until the
//! declared record section is exhausted. Chained segments append to the
//! same registry.

use std::io::{Read, Seek, SeekFrom};

use either::Either::{self, Left, Right};
use tracing::debug;

use crate::error::{Error, Result};
use crate::profile::Profile;
use crate::registry::{DecodedRecord, Registry};
use crate::wire::data;
use crate::wire::definition::DefinitionRecord;
use crate::wire::header::FileHeader;
use crate::wire::record_header::RecordHeader;

/// Decodes documents against a profile catalog.
#[derive(Debug)]
pub struct Decoder<'p> {
    profile: &'p Profile,
}

impl<'p> Decoder<'p> {
    /// A decoder borrowing the given catalog.
    pub fn new(profile: &'p Profile) -> Decoder<'p> {
        Decoder { profile }
    }

    /// Decode a document into a registry.
    ///
    /// Chained segments merge into one registry: the first header is
    /// kept, later records append in stream order, and definitions
    /// accumulate in the shared table.
    pub fn decode<R: Read + Seek>(&self, r: &mut R) -> Result<Registry> {
        let mut offset = r.stream_position()?;
        let len = r.seek(SeekFrom::End(0))?;
        r.seek(SeekFrom::Start(offset))?;

        let mut registry: Option<Registry> = None;

        while offset < len {
            let header = FileHeader::decode(r)?;
            debug!(
                data_size = header.data_size,
                header_size = header.header_size,
                "segment header",
            );

            let registry = registry.get_or_insert_with(|| Registry::new(header.clone()));

            let body_end = offset + u64::from(header.header_size) + u64::from(header.data_size);
            while r.stream_position()? < body_end {
                self.record(r, registry)?;
            }

            // The trailing CRC was verified with the header.
            offset = body_end + 2;
            r.seek(SeekFrom::Start(offset))?;
        }

        registry.ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "empty document",
            ))
        })
    }

    fn record<R: Read>(&self, r: &mut R, registry: &mut Registry) -> Result<()> {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)?;

        let header = RecordHeader::decode(byte[0])?;
        let local = header.local_message_type;

        match self.message(r, registry, &header)? {
            Left(definition) => {
                debug!(local, message = %definition.message_name, "definition record");
                registry.install_definition(local, header, definition);
            }
            Right(record) => registry.append_record(record),
        }

        Ok(())
    }

    fn message<R: Read>(
        &self,
        r: &mut R,
        registry: &Registry,
        header: &RecordHeader,
    ) -> Result<Either<DefinitionRecord, DecodedRecord>> {
        let local = header.local_message_type;

        if header.for_new_definition() {
            let definition = DefinitionRecord::decode(r, self.profile, header.developer_data)?;
            return Ok(Left(definition));
        }

        let slot = registry
            .active_definition(local)
            .ok_or(Error::MissingLocalDefinition { local })?;

        let mut payload = vec![0u8; slot.definition.payload_len()];
        r.read_exact(&mut payload)?;

        let values = data::decode(&slot.definition, &payload);
        Ok(Right(DecodedRecord::materialize(
            registry.records().len(),
            local,
            &slot.definition,
            values,
        )))
    }
}
