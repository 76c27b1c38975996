//! The in-memory form of a document.
//!
//! A registry holds the header, the decoded records in stream order, and
//! the active definition table. The table is append-only: redefining a
//! local slot appends a new entry, and lookups scan from newest to oldest
//! so the latest binding shadows earlier ones while history stays
//! available for diagnostics.

use crate::profile::base_type::BaseType;
use crate::profile::{MessageSource, ProfileField};
use crate::value::Value;
use crate::wire::definition::DefinitionRecord;
use crate::wire::header::FileHeader;
use crate::wire::record_header::RecordHeader;

/// One installed definition.
#[derive(Debug, Clone)]
pub struct DefinitionSlot {
    /// The local message slot the definition was installed at.
    pub local_message_number: u8,
    /// The resolved message name.
    pub message_name: String,
    /// The record header the definition arrived under.
    pub record_header: RecordHeader,
    /// The definition itself, immutable once installed.
    pub definition: DefinitionRecord,
}

/// One decoded field of a data record.
#[derive(Debug, Clone)]
pub struct DecodedField {
    /// The resolved field name.
    pub name: String,
    /// The raw decoded value.
    pub value: Value,
    /// The field's base type.
    pub base_type: BaseType,
    /// The profile properties of the field.
    pub properties: ProfileField,
    /// The owning message name.
    pub message_name: String,
    /// The owning global message number.
    pub message_number: u16,
}

/// One decoded data record.
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    /// Position in stream order, counted across chained segments.
    pub index: usize,
    /// The resolved message name.
    pub message_name: String,
    /// The global message number.
    pub message_number: u16,
    /// Which profile dictionary named the message.
    pub message_source: MessageSource,
    /// The local message slot the record decoded under.
    pub local_message_number: u8,
    /// The decoded fields, in definition order.
    pub fields: Vec<DecodedField>,
}

impl DecodedRecord {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&DecodedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Build a record from a definition and its payload values.
    pub(crate) fn materialize(
        index: usize,
        local: u8,
        definition: &DefinitionRecord,
        values: Vec<Value>,
    ) -> DecodedRecord {
        let fields = definition
            .fields
            .iter()
            .zip(values)
            .map(|(field, value)| DecodedField {
                name: field.name.clone(),
                value,
                base_type: field.shape.base_type(),
                properties: field.properties.clone(),
                message_name: definition.message_name.clone(),
                message_number: definition.global_message_number,
            })
            .collect();

        DecodedRecord {
            index,
            message_name: definition.message_name.clone(),
            message_number: definition.global_message_number,
            message_source: definition.message_source,
            local_message_number: local,
            fields,
        }
    }
}

/// A document held in memory: header, records, and definitions.
#[derive(Debug)]
pub struct Registry {
    header: FileHeader,
    records: Vec<DecodedRecord>,
    definitions: Vec<DefinitionSlot>,
}

impl Registry {
    /// An empty registry under the given header.
    pub fn new(header: FileHeader) -> Registry {
        Registry {
            header,
            records: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// The document header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// The decoded records, in stream order.
    pub fn records(&self) -> &[DecodedRecord] {
        &self.records
    }

    /// The definition table, in installation order.
    pub fn definitions(&self) -> &[DefinitionSlot] {
        &self.definitions
    }

    /// Append a decoded record.
    pub fn append_record(&mut self, record: DecodedRecord) {
        self.records.push(record);
    }

    /// Install a definition at a local slot.
    ///
    /// Earlier entries for the slot are kept; newest-wins lookup shadows
    /// them.
    pub fn install_definition(
        &mut self,
        local_message_number: u8,
        record_header: RecordHeader,
        definition: DefinitionRecord,
    ) {
        self.definitions.push(DefinitionSlot {
            local_message_number,
            message_name: definition.message_name.clone(),
            record_header,
            definition,
        });
    }

    /// The newest definition for a `(local slot, message name)` pair.
    pub fn find_definition(&self, local: u8, message_name: &str) -> Option<&DefinitionSlot> {
        self.definitions
            .iter()
            .rev()
            .find(|slot| slot.local_message_number == local && slot.message_name == message_name)
    }

    /// The newest definition bound to a local slot.
    pub fn active_definition(&self, local: u8) -> Option<&DefinitionSlot> {
        self.definitions
            .iter()
            .rev()
            .find(|slot| slot.local_message_number == local)
    }

    /// Keep the header and definitions, dropping the records.
    ///
    /// This is the template form used by the encoder's builder: the
    /// cloned structure, with user records overlaid afterward.
    pub fn structure_only(mut self) -> Registry {
        self.records.clear();
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::profile::Profile;

    fn definition(bytes: &[u8]) -> DefinitionRecord {
        let profile = Profile::bundled();
        DefinitionRecord::decode(&mut Cursor::new(bytes.to_vec()), &profile, false).unwrap()
    }

    #[test]
    fn newest_definition_wins() {
        let mut registry = Registry::new(FileHeader::default());

        // file_id, then file_creator, both at slot 0.
        let file_id = definition(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00]);
        let file_creator = definition(&[0x00, 0x00, 0x31, 0x00, 0x01, 0x00, 0x02, 0x84]);

        registry.install_definition(0, RecordHeader::definition(0), file_id);
        registry.install_definition(0, RecordHeader::definition(0), file_creator);

        assert_eq!(registry.definitions().len(), 2);
        assert_eq!(
            registry.active_definition(0).unwrap().message_name,
            "file_creator",
        );
        assert_eq!(
            registry.find_definition(0, "file_id").unwrap().message_name,
            "file_id",
        );
        assert!(registry.find_definition(1, "file_id").is_none());
    }

    #[test]
    fn structure_only_drops_records() {
        let mut registry = Registry::new(FileHeader::default());
        let file_id = definition(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00]);

        registry.install_definition(0, RecordHeader::definition(0), file_id);
        let record = DecodedRecord::materialize(
            0,
            0,
            &registry.active_definition(0).unwrap().definition.clone(),
            vec![crate::value::Value::Enum(4)],
        );
        registry.append_record(record);

        let structure = registry.structure_only();
        assert!(structure.records().is_empty());
        assert_eq!(structure.definitions().len(), 1);
    }
}
