//! Data record payloads.
//!
//! A data payload is read and written field-by-field against the resolved
//! schema of its definition, in declared order and in the definition's
//! byte order. Strings are fixed-width byte sequences; trailing NULs are
//! preserved in decoded values and written back on encode.

use tracing::warn;

use crate::value::Value;

use super::definition::DefinitionRecord;
use super::field_definition::FieldShape;

/// Decode one payload, yielding a value per schema field.
///
/// `payload` must be exactly `definition.payload_len()` bytes.
pub fn decode(definition: &DefinitionRecord, payload: &[u8]) -> Vec<Value> {
    let little_endian = definition.architecture.is_little_endian();

    let mut values = Vec::with_capacity(definition.fields.len());
    let mut offset = 0;

    for field in &definition.fields {
        let raw = &payload[offset..offset + field.shape.byte_count()];
        offset += raw.len();
        values.push(read_field(&field.shape, raw, little_endian));
    }

    values
}

/// Encode one payload from values aligned with the schema fields.
pub fn encode(definition: &DefinitionRecord, values: &[Value]) -> Vec<u8> {
    let little_endian = definition.architecture.is_little_endian();

    let mut bytes = Vec::with_capacity(definition.payload_len());
    for (field, value) in definition.fields.iter().zip(values) {
        write_field(&field.shape, value, little_endian, &mut bytes);
    }

    bytes
}

fn read_field(shape: &FieldShape, raw: &[u8], little_endian: bool) -> Value {
    match *shape {
        FieldShape::Scalar(base) => Value::read_scalar(base, raw, little_endian),
        FieldShape::Array(base, length) => {
            let width = base.width();
            Value::Array(
                (0..length)
                    .map(|i| Value::read_scalar(base, &raw[i * width..(i + 1) * width], little_endian))
                    .collect(),
            )
        }
        FieldShape::String(_) => match std::str::from_utf8(raw) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => {
                warn!("string field holds invalid UTF-8, passing raw bytes through");
                Value::Array(raw.iter().map(|b| Value::Byte(*b)).collect())
            }
        },
    }
}

fn write_field(shape: &FieldShape, value: &Value, little_endian: bool, out: &mut Vec<u8>) {
    match *shape {
        FieldShape::Scalar(base) => value.write_scalar(base, little_endian, out),
        FieldShape::Array(base, length) => {
            let items: &[Value] = match value {
                Value::Array(items) => items,
                other => core::slice::from_ref(other),
            };

            // Missing tail elements fill with the sentinel.
            for i in 0..length {
                match items.get(i) {
                    Some(item) => item.write_scalar(base, little_endian, out),
                    None => base.undef().write_scalar(base, little_endian, out),
                }
            }
        }
        FieldShape::String(width) => {
            let raw = string_bytes(value);
            for i in 0..width {
                out.push(raw.get(i).copied().unwrap_or(0));
            }
        }
    }
}

fn string_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::String(s) => s.as_bytes().to_vec(),
        // The raw-bytes fallback for invalid UTF-8 writes back unchanged.
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Byte(b) => Some(*b),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
