//! Building a registry from user records.
//!
//! The encoder consumes a registry; these builders produce one from plain
//! user records, either by deriving minimal definitions from the records
//! themselves or by cloning the definitions of an existing document so the
//! encoded output byte-matches its layout.

use std::collections::HashSet;
use std::io::{Read, Seek};

use crate::decoder::Decoder;
use crate::error::{Error, Result};
use crate::profile::base_type::BaseType;
use crate::profile::{Profile, ProfileField};
use crate::registry::{DecodedRecord, Registry};
use crate::value::Value;
use crate::wire::definition::{Architecture, DefinitionRecord};
use crate::wire::field_definition::{FieldDefEntry, FieldShape, SchemaField};
use crate::wire::header::FileHeader;
use crate::wire::record_header::RecordHeader;

/// One user-supplied record.
///
/// Fields are named; a `None` value (or an omitted field) encodes as the
/// base type's undef sentinel. Field numbers the profile does not name are
/// addressed as `undocumented_field_<n>`.
#[derive(Debug, Clone, Default)]
pub struct RecordSpec {
    /// The profile message this record encodes.
    pub message_name: String,
    /// The local message slot to encode under, 0–15.
    pub local_message_number: u8,
    /// Named field values, in the order the definition should declare
    /// them.
    pub fields: Vec<(String, Option<Value>)>,
}

impl RecordSpec {
    /// A record of the given message at the given local slot.
    pub fn new(message_name: impl Into<String>, local_message_number: u8) -> RecordSpec {
        RecordSpec {
            message_name: message_name.into(),
            local_message_number,
            fields: Vec::new(),
        }
    }

    /// Add a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> RecordSpec {
        self.fields.push((name.into(), Some(value)));
        self
    }

    /// Add a field with no value; it encodes as the undef sentinel.
    pub fn with_null_field(mut self, name: impl Into<String>) -> RecordSpec {
        self.fields.push((name.into(), None));
        self
    }

    fn value_of(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, value)| value.as_ref())
    }
}

/// Build a registry from records alone, deriving minimal definitions.
///
/// For each message the record with the most fields is the archetype: its
/// field order becomes the definition's, widths come from the widest
/// values observed across all sibling records, and everything is declared
/// little-endian.
pub fn registry_from_records(records: &[RecordSpec], profile: &Profile) -> Result<Registry> {
    let mut registry = Registry::new(FileHeader::default());

    let mut derived: Vec<(String, DefinitionRecord)> = Vec::new();
    for spec in records {
        if !derived.iter().any(|(name, _)| name == &spec.message_name) {
            let definition = derive_definition(spec, records, profile)?;
            derived.push((spec.message_name.clone(), definition));
        }
    }

    // Install the message's definition at every slot it is used under,
    // in first-appearance order.
    let mut seen: HashSet<(u8, &str)> = HashSet::new();
    for spec in records {
        if seen.insert((spec.local_message_number, spec.message_name.as_str())) {
            if let Some((_, definition)) = derived.iter().find(|(name, _)| name == &spec.message_name)
            {
                registry.install_definition(
                    spec.local_message_number,
                    RecordHeader::definition(spec.local_message_number),
                    definition.clone(),
                );
            }
        }
    }

    build_records(records, &mut registry)?;
    Ok(registry)
}

/// Build a registry from records, cloning structure from a template.
///
/// The template document's header and definitions are used verbatim, so
/// field order, byte counts, and architecture are preserved exactly; only
/// the records come from the caller.
pub fn registry_from_records_with_template<R: Read + Seek>(
    records: &[RecordSpec],
    profile: &Profile,
    template: &mut R,
) -> Result<Registry> {
    let mut registry = Decoder::new(profile).decode(template)?.structure_only();
    build_records(records, &mut registry)?;
    Ok(registry)
}

/// Derive a definition for `seed`'s message from its sibling records.
fn derive_definition(
    seed: &RecordSpec,
    records: &[RecordSpec],
    profile: &Profile,
) -> Result<DefinitionRecord> {
    let message = profile
        .message_by_name(&seed.message_name)
        .ok_or_else(|| Error::MissingProfileMessage {
            name: seed.message_name.clone(),
        })?;

    let siblings: Vec<&RecordSpec> = records
        .iter()
        .filter(|r| r.message_name == seed.message_name)
        .collect();

    let archetype = siblings.iter().copied().fold(seed, |best, next| {
        if next.fields.len() > best.fields.len() {
            next
        } else {
            best
        }
    });

    let mut entries = Vec::with_capacity(archetype.fields.len());
    let mut fields = Vec::with_capacity(archetype.fields.len());

    for (field_name, _) in &archetype.fields {
        let (number, base) = if let Some(field) = message.field_by_name(field_name) {
            let base = profile.field_base_type(field).ok_or_else(|| {
                Error::UnresolvableFieldType {
                    message: message.name.clone(),
                    field: field_name.clone(),
                }
            })?;
            (field.number, base)
        } else if let Some(number) = undocumented_number(field_name) {
            let base = siblings
                .iter()
                .find_map(|r| r.value_of(field_name))
                .and_then(Value::base_type)
                .ok_or_else(|| Error::UnresolvableFieldType {
                    message: message.name.clone(),
                    field: field_name.clone(),
                })?;
            (number, base)
        } else {
            return Err(Error::UnknownMessageField {
                message: message.name.clone(),
                field: field_name.clone(),
            });
        };

        let byte_count = if base == BaseType::String {
            string_width(field_name, &siblings)
        } else {
            base.width() * observed_length(field_name, &siblings)
        };
        let byte_count = u8::try_from(byte_count).map_err(|_| Error::FieldTooWide {
            field: field_name.clone(),
            byte_count,
        })?;

        let def = FieldDefEntry::for_base_type(number, byte_count, base);
        let shape = FieldShape::of(base, byte_count, number)?;
        let properties = message
            .field_by_number(number)
            .cloned()
            .unwrap_or_else(|| ProfileField::undocumented(number, base));

        entries.push(def);
        fields.push(SchemaField {
            def,
            name: properties.name.clone(),
            shape,
            properties,
        });
    }

    Ok(DefinitionRecord {
        architecture: Architecture::LittleEndian,
        global_message_number: message.number,
        message_name: message.name.clone(),
        message_source: message.source,
        entries,
        fields,
    })
}

/// Overlay the user records onto the registry's definitions.
///
/// Each record resolves its definition by `(local slot, message name)`;
/// missing or null fields become undef sentinels, arrays sized by the
/// definition's shape.
fn build_records(records: &[RecordSpec], registry: &mut Registry) -> Result<()> {
    for spec in records {
        let record = {
            let slot = registry
                .find_definition(spec.local_message_number, &spec.message_name)
                .ok_or(Error::MissingLocalDefinition {
                    local: spec.local_message_number,
                })?;

            let values: Vec<Value> = slot
                .definition
                .fields
                .iter()
                .map(|field| {
                    spec.value_of(&field.name)
                        .cloned()
                        .unwrap_or_else(|| field.shape.undef_value())
                })
                .collect();

            DecodedRecord::materialize(
                registry.records().len(),
                spec.local_message_number,
                &slot.definition,
                values,
            )
        };

        registry.append_record(record);
    }

    Ok(())
}

/// The encoded width of a string field: the next multiple of 8 strictly
/// greater than the longest value observed across sibling records.
fn string_width(field_name: &str, siblings: &[&RecordSpec]) -> usize {
    let longest = siblings
        .iter()
        .filter_map(|r| match r.value_of(field_name) {
            Some(Value::String(s)) => Some(s.len()),
            _ => None,
        })
        .max()
        .unwrap_or(0);

    (longest / 8) * 8 + 8
}

/// The element count of a field: the longest value any sibling supplies,
/// or 1 when none does.
fn observed_length(field_name: &str, siblings: &[&RecordSpec]) -> usize {
    siblings
        .iter()
        .filter_map(|r| r.value_of(field_name))
        .map(Value::element_count)
        .max()
        .unwrap_or(1)
        .max(1)
}

fn undocumented_number(name: &str) -> Option<u8> {
    name.strip_prefix("undocumented_field_")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_derive_from_the_widest_record() {
        let profile = Profile::bundled();
        let records = [
            RecordSpec::new("file_id", 0).with_field("type", Value::Enum(4)),
            RecordSpec::new("file_id", 0)
                .with_field("type", Value::Enum(4))
                .with_field("manufacturer", Value::UInt16(1))
                .with_field("serial_number", Value::UInt32z(1234)),
        ];

        let registry = registry_from_records(&records, &profile).unwrap();
        assert_eq!(registry.definitions().len(), 1);

        let definition = &registry.definitions()[0].definition;
        assert_eq!(definition.architecture, Architecture::LittleEndian);
        assert_eq!(definition.global_message_number, 0);
        assert_eq!(definition.entries.len(), 3);
        assert_eq!(definition.entries[0].encode(), [0, 1, 0x00]);
        assert_eq!(definition.entries[1].encode(), [1, 2, 0x84]);
        assert_eq!(definition.entries[2].encode(), [3, 4, 0x8C]);

        // The narrow record fills its missing fields with sentinels.
        let first = &registry.records()[0];
        assert_eq!(first.field("manufacturer").unwrap().value, Value::UInt16(65535));
        assert_eq!(first.field("serial_number").unwrap().value, Value::UInt32z(0));
    }

    #[test]
    fn string_widths_step_past_the_longest_value() {
        let records = [
            RecordSpec::new("file_creator", 0)
                .with_field("undocumented_field_2", Value::String("Foo".into())),
            RecordSpec::new("file_creator", 0)
                .with_field("undocumented_field_2", Value::String("Bar Baz".into())),
            RecordSpec::new("file_creator", 0)
                .with_field("undocumented_field_2", Value::String(String::new())),
        ];
        let siblings: Vec<&RecordSpec> = records.iter().collect();

        assert_eq!(string_width("undocumented_field_2", &siblings), 8);
        assert_eq!(string_width("unsupplied", &siblings), 8);

        let records = [RecordSpec::new("file_creator", 0)
            .with_field("undocumented_field_2", Value::String("exactly8".into()))];
        let siblings: Vec<&RecordSpec> = records.iter().collect();
        assert_eq!(string_width("undocumented_field_2", &siblings), 16);
    }

    #[test]
    fn array_lengths_come_from_any_supplying_sibling() {
        let profile = Profile::bundled();
        let records = [
            RecordSpec::new("device_info", 0).with_field(
                "undocumented_field_29",
                Value::Array(vec![Value::Enum(0); 6]),
            ),
            RecordSpec::new("device_info", 0),
        ];

        let registry = registry_from_records(&records, &profile).unwrap();
        let definition = &registry.definitions()[0].definition;
        assert_eq!(definition.entries[0].byte_count, 6);
        assert_eq!(definition.fields[0].shape, FieldShape::Array(BaseType::Enum, 6));

        let second = &registry.records()[1];
        assert_eq!(
            second.field("undocumented_field_29").unwrap().value,
            Value::Array(vec![Value::Enum(255); 6]),
        );
    }

    #[test]
    fn unknown_messages_are_rejected() {
        let profile = Profile::bundled();
        let records = [RecordSpec::new("not_a_message", 0)];

        assert!(matches!(
            registry_from_records(&records, &profile),
            Err(Error::MissingProfileMessage { .. }),
        ));
    }

    #[test]
    fn unknown_field_names_are_rejected() {
        let profile = Profile::bundled();
        let records =
            [RecordSpec::new("file_id", 0).with_field("no_such_field", Value::UInt8(1))];

        match registry_from_records(&records, &profile) {
            Err(Error::UnknownMessageField { message, field }) => {
                assert_eq!(message, "file_id");
                assert_eq!(field, "no_such_field");
            }
            other => panic!("expected UnknownMessageField, got {other:?}"),
        }
    }

    #[test]
    fn uninferable_base_types_are_rejected() {
        let profile = Profile::bundled();

        // No sibling supplies a value, so the field's base type is unknowable.
        let records = [RecordSpec::new("file_id", 0).with_null_field("undocumented_field_9")];

        assert!(matches!(
            registry_from_records(&records, &profile),
            Err(Error::UnresolvableFieldType { .. }),
        ));
    }

    #[test]
    fn fields_wider_than_a_definition_allows_are_rejected() {
        let profile = Profile::bundled();
        let records = [RecordSpec::new("file_creator", 0)
            .with_field("undocumented_field_2", Value::String("x".repeat(250)))];

        match registry_from_records(&records, &profile) {
            Err(Error::FieldTooWide { field, byte_count }) => {
                assert_eq!(field, "undocumented_field_2");
                assert_eq!(byte_count, 256);
            }
            other => panic!("expected FieldTooWide, got {other:?}"),
        }
    }
}
