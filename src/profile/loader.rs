//! Loading the profile catalog from its tabular files.
//!
//! The catalog ships as three CSV tables: the documented messages, an
//! optional undocumented supplement, and the named types. A copy of the
//! tables is bundled into the crate so decoding works without any
//! configuration; callers with their own tables point [`Profile::from_dir`]
//! at a directory instead.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;

use super::base_type::BaseType;
use super::{MessageSource, Profile, ProfileField, ProfileMessage, ProfileType, TypeValue};
use crate::error::{Error, Result};

const BUNDLED_MESSAGES: &str = include_str!("../../profile/messages.csv");
const BUNDLED_UNDOCUMENTED: &str = include_str!("../../profile/messages_undocumented.csv");
const BUNDLED_TYPES: &str = include_str!("../../profile/types.csv");

#[derive(Debug, Deserialize)]
struct MessageRow {
    message: String,
    number: u16,
    // Rows without a field number are headings; they are filtered out.
    field: Option<u8>,
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    array: Option<String>,
    scale: Option<f64>,
    offset: Option<f64>,
    units: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TypeRow {
    #[serde(rename = "type")]
    type_name: String,
    base_type: String,
    value_name: String,
    value: i64,
    comment: Option<String>,
}

pub(super) fn bundled() -> Profile {
    assemble(
        BUNDLED_MESSAGES.as_bytes(),
        Some(BUNDLED_UNDOCUMENTED.as_bytes()),
        BUNDLED_TYPES.as_bytes(),
    )
    .expect("bundled profile tables are well-formed")
}

pub(super) fn from_dir(dir: &Path) -> Result<Profile> {
    let messages = std::fs::read(dir.join("messages.csv"))?;
    let types = std::fs::read(dir.join("types.csv"))?;

    let undocumented = match std::fs::read(dir.join("messages_undocumented.csv")) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    assemble(
        messages.as_slice(),
        undocumented.as_deref(),
        types.as_slice(),
    )
}

fn assemble(
    messages: impl Read,
    undocumented: Option<impl Read>,
    types: impl Read,
) -> Result<Profile> {
    let documented = parse_messages(messages, MessageSource::Documented)?;
    let undocumented = match undocumented {
        Some(table) => parse_messages(table, MessageSource::Undocumented)?,
        None => Vec::new(),
    };

    Ok(Profile::assemble(
        documented,
        undocumented,
        parse_types(types)?,
    ))
}

fn parse_messages(table: impl Read, source: MessageSource) -> Result<Vec<ProfileMessage>> {
    let mut reader = ReaderBuilder::new().from_reader(table);
    let mut messages: Vec<ProfileMessage> = Vec::new();

    for row in reader.deserialize() {
        let row: MessageRow = row.map_err(|e| Error::Catalog(e.to_string()))?;

        // Fields without a number cannot appear in a definition record.
        let Some(number) = row.field else {
            continue;
        };

        let field = ProfileField {
            number,
            name: row.name,
            type_name: row.type_name,
            array: row.array.as_deref().is_some_and(|a| !a.is_empty()),
            scale: row.scale.unwrap_or(1.0),
            offset: row.offset.unwrap_or(0.0),
            units: row.units.unwrap_or_default(),
        };

        match messages.last_mut() {
            Some(message) if message.name == row.message => message.fields.push(field),
            _ => messages.push(ProfileMessage {
                name: row.message,
                number: row.number,
                source,
                fields: vec![field],
            }),
        }
    }

    Ok(messages)
}

fn parse_types(table: impl Read) -> Result<HashMap<String, ProfileType>> {
    let mut reader = ReaderBuilder::new().from_reader(table);
    let mut types: HashMap<String, ProfileType> = HashMap::new();

    for row in reader.deserialize() {
        let row: TypeRow = row.map_err(|e| Error::Catalog(e.to_string()))?;

        let base_type = BaseType::from_name(&row.base_type).ok_or_else(|| {
            Error::Catalog(format!(
                "type {:?} names unknown base type {:?}",
                row.type_name, row.base_type
            ))
        })?;

        types
            .entry(row.type_name.clone())
            .or_insert_with(|| ProfileType {
                name: row.type_name,
                base_type,
                values: Vec::new(),
            })
            .values
            .push(TypeValue {
                name: row.value_name,
                value: row.value,
                comment: row.comment.unwrap_or_default(),
            });
    }

    Ok(types)
}
