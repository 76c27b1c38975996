//! Read-only view over the FIT profile catalog.
//!
//! The catalog names every known message, its fields, and the named types
//! their values draw from. It merges two dictionaries: the documented
//! profile and an undocumented supplement; documented entries win on name
//! collisions, undocumented-only entries are appended.
//!
//! The codec treats the catalog as pure data, passed by reference; nothing
//! here is mutated after loading.

pub mod base_type;
pub mod loader;

use std::collections::HashMap;
use std::path::Path;

use base_type::BaseType;

use crate::error::Result;

/// Which dictionary a catalog entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// The documented profile.
    Documented,
    /// The undocumented supplement.
    Undocumented,
}

impl MessageSource {
    /// The catalog's name for this source.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageSource::Documented => "documented",
            MessageSource::Undocumented => "undocumented",
        }
    }
}

/// One field of a profile message.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileField {
    /// The schema-level field definition number.
    pub number: u8,
    /// The field name.
    pub name: String,
    /// The named type or base type of the field's values.
    pub type_name: String,
    /// Whether the profile declares the field as an array.
    pub array: bool,
    /// Scale applied by semantic layers (the codec never applies it).
    pub scale: f64,
    /// Offset applied by semantic layers (the codec never applies it).
    pub offset: f64,
    /// Units of the scaled value.
    pub units: String,
}

impl ProfileField {
    /// Synthesize properties for a field number the catalog does not name.
    pub(crate) fn undocumented(number: u8, base: BaseType) -> ProfileField {
        ProfileField {
            number,
            name: format!("undocumented_field_{number}"),
            type_name: base.name().to_string(),
            array: false,
            scale: 1.0,
            offset: 0.0,
            units: String::new(),
        }
    }
}

/// One message of the profile catalog.
#[derive(Debug, Clone)]
pub struct ProfileMessage {
    /// The message name.
    pub name: String,
    /// The global message number.
    pub number: u16,
    /// Which dictionary the message came from.
    pub source: MessageSource,
    /// The message's fields, in catalog order.
    pub fields: Vec<ProfileField>,
}

impl ProfileMessage {
    /// Look up a field by its field definition number.
    pub fn field_by_number(&self, number: u8) -> Option<&ProfileField> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Look up a field by name.
    pub fn field_by_name(&self, name: &str) -> Option<&ProfileField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One named value of a profile type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeValue {
    /// The value name.
    pub name: String,
    /// The numeric value.
    pub value: i64,
    /// Free-form catalog comment.
    pub comment: String,
}

/// A named type: a base type plus its named values.
#[derive(Debug, Clone)]
pub struct ProfileType {
    /// The type name.
    pub name: String,
    /// The base type its values serialize as.
    pub base_type: BaseType,
    /// The named values.
    pub values: Vec<TypeValue>,
}

/// The merged, read-only profile catalog.
#[derive(Debug, Default)]
pub struct Profile {
    messages: Vec<ProfileMessage>,
    by_name: HashMap<String, usize>,
    by_number: HashMap<u16, usize>,
    types: HashMap<String, ProfileType>,
}

impl Profile {
    /// The catalog bundled with the crate.
    pub fn bundled() -> Profile {
        loader::bundled()
    }

    /// Load a catalog from a directory of profile tables.
    ///
    /// The directory must hold `messages.csv` and `types.csv`;
    /// `messages_undocumented.csv` is read when present.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Profile> {
        loader::from_dir(dir.as_ref())
    }

    /// Every message, documented first, in catalog order.
    pub fn messages(&self) -> &[ProfileMessage] {
        &self.messages
    }

    /// Look up a message by name.
    pub fn message_by_name(&self, name: &str) -> Option<&ProfileMessage> {
        self.by_name.get(name).map(|i| &self.messages[*i])
    }

    /// Look up a message by global message number.
    pub fn message_by_number(&self, number: u16) -> Option<&ProfileMessage> {
        self.by_number.get(&number).map(|i| &self.messages[*i])
    }

    /// The named types, keyed by type name.
    pub fn types(&self) -> &HashMap<String, ProfileType> {
        &self.types
    }

    /// Look up a named type.
    pub fn type_by_name(&self, name: &str) -> Option<&ProfileType> {
        self.types.get(name)
    }

    /// The static base-type table.
    pub fn base_types(&self) -> &'static [BaseType] {
        &BaseType::ALL
    }

    /// Resolve a field's type name to a base type, directly or through
    /// the named types.
    pub fn field_base_type(&self, field: &ProfileField) -> Option<BaseType> {
        BaseType::from_name(&field.type_name)
            .or_else(|| self.types.get(&field.type_name).map(|t| t.base_type))
    }

    /// Assemble a catalog from its parsed tables, merging the
    /// undocumented dictionary into the documented one.
    pub(crate) fn assemble(
        documented: Vec<ProfileMessage>,
        undocumented: Vec<ProfileMessage>,
        types: HashMap<String, ProfileType>,
    ) -> Profile {
        let mut profile = Profile {
            messages: documented,
            types,
            ..Profile::default()
        };

        for message in undocumented {
            match profile.messages.iter().position(|m| m.name == message.name) {
                // Documented fields win; undocumented-only numbers append.
                Some(i) => {
                    let existing = &mut profile.messages[i];
                    for field in message.fields {
                        if existing.field_by_number(field.number).is_none()
                            && existing.field_by_name(&field.name).is_none()
                        {
                            existing.fields.push(field);
                        }
                    }
                }
                None => profile.messages.push(message),
            }
        }

        for (i, message) in profile.messages.iter().enumerate() {
            profile.by_name.entry(message.name.clone()).or_insert(i);
            profile.by_number.entry(message.number).or_insert(i);
        }

        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_resolves_core_messages() {
        let profile = Profile::bundled();

        let file_id = profile.message_by_number(0).unwrap();
        assert_eq!(file_id.name, "file_id");
        assert_eq!(file_id.source, MessageSource::Documented);
        assert_eq!(file_id.field_by_number(3).unwrap().name, "serial_number");
        assert_eq!(file_id.field_by_name("manufacturer").unwrap().number, 1);

        assert_eq!(profile.message_by_name("device_info").unwrap().number, 23);
        assert_eq!(profile.message_by_name("file_creator").unwrap().number, 49);
    }

    #[test]
    fn undocumented_entries_merge_behind_documented_ones() {
        let profile = Profile::bundled();

        // A wholly undocumented message is appended.
        let xdata = profile.message_by_name("xdata").unwrap();
        assert_eq!(xdata.source, MessageSource::Undocumented);
        assert_eq!(xdata.fields.len(), 1);

        // A documented message keeps its own fields and gains the
        // undocumented-only ones.
        let device_info = profile.message_by_name("device_info").unwrap();
        assert_eq!(device_info.source, MessageSource::Documented);
        assert_eq!(device_info.field_by_number(2).unwrap().name, "manufacturer");
        assert_eq!(device_info.field_by_number(32).unwrap().name, "sensor_id");
    }

    #[test]
    fn field_types_resolve_through_named_types() {
        let profile = Profile::bundled();
        let file_id = profile.message_by_name("file_id").unwrap();

        let manufacturer = file_id.field_by_name("manufacturer").unwrap();
        assert_eq!(profile.field_base_type(manufacturer), Some(BaseType::UInt16));

        let serial = file_id.field_by_name("serial_number").unwrap();
        assert_eq!(profile.field_base_type(serial), Some(BaseType::UInt32z));

        let file_type = profile.type_by_name("file").unwrap();
        assert_eq!(file_type.base_type, BaseType::Enum);
        assert!(file_type.values.iter().any(|v| v.name == "activity"));
    }
}
