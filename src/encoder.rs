//! The encoding driver.
//!
//! Writes a registry back to a seekable sink: a placeholder header,
//! definitions emitted lazily ahead of their first use, one data record
//! per registry record, the trailing CRC over the record section, and a
//! final seek back to patch the header with the real `data_size` and CRC.

use std::collections::HashSet;
use std::io::{Seek, SeekFrom, Write};

use tracing::debug;

use crate::check;
use crate::error::{Error, Result};
use crate::registry::{DecodedRecord, Registry};
use crate::value::Value;
use crate::wire::data;
use crate::wire::definition::DefinitionRecord;
use crate::wire::record_header::RecordHeader;

/// Encode a registry as one document segment.
pub fn encode<W: Write + Seek>(w: &mut W, registry: &Registry) -> Result<()> {
    let start = w.stream_position()?;

    let mut header = registry.header().clone();
    header.data_size = 0;
    header.crc = 0;
    w.write_all(&header.to_bytes())?;

    let (crc, written) = {
        let mut body = Sink {
            inner: w,
            crc: 0,
            written: 0,
        };

        let mut installed: HashSet<(u8, String)> = HashSet::new();
        let mut last_local: Option<u8> = None;

        for record in registry.records() {
            let local = record.local_message_number;
            let slot = registry
                .find_definition(local, &record.message_name)
                .ok_or(Error::MissingLocalDefinition { local })?;

            let key = (local, record.message_name.clone());
            if !installed.contains(&key) && last_local != Some(local) {
                debug!(local, message = %record.message_name, "emitting definition");
                body.write(&[RecordHeader::definition(local).encode()])?;
                body.write(&slot.definition.encode())?;
                installed.insert(key);
            }

            let values = align_values(record, &slot.definition);
            body.write(&[RecordHeader::data(local).encode()])?;
            body.write(&data::encode(&slot.definition, &values))?;

            last_local = Some(local);
        }

        (body.crc, body.written)
    };

    w.write_all(&crc.to_le_bytes())?;

    header.data_size = written as u32;
    header.seal();
    w.seek(SeekFrom::Start(start))?;
    w.write_all(&header.to_bytes())?;
    w.seek(SeekFrom::End(0))?;

    Ok(())
}

/// Order a record's values to its definition, substituting the undef
/// sentinel for any field the record does not carry.
fn align_values(record: &DecodedRecord, definition: &DefinitionRecord) -> Vec<Value> {
    definition
        .fields
        .iter()
        .map(|field| {
            record
                .field(&field.name)
                .map(|f| f.value.clone())
                .unwrap_or_else(|| field.shape.undef_value())
        })
        .collect()
}

/// A sink accumulating the record-section CRC as it writes.
struct Sink<'w, W: Write> {
    inner: &'w mut W,
    crc: u16,
    written: u64,
}

impl<W: Write> Sink<'_, W> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.crc = check::accumulate(self.crc, bytes);
        self.written += bytes.len() as u64;
        Ok(())
    }
}
