//! The three-byte field entries of a definition record.
//!
//! Each entry names a schema-level field, declares how many bytes it
//! occupies in data records, and packs its base type into one byte. From
//! an entry and the owning profile message the codec derives a *schema
//! field*: the field's name, its properties, and the shape of its slot in
//! a data payload.

use tartan_bitfield::bitfield;
use tracing::warn;
use zerocopy::FromBytes;

use crate::error::{Error, Result};
use crate::profile::base_type::BaseType;
use crate::profile::{ProfileField, ProfileMessage};
use crate::value::Value;

bitfield! {
    struct Packed(u8) {
        [0..5] base_type_number: u8,
        [7] endian_ability,
    }
}

/// One field entry of a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefEntry {
    /// The schema-level field definition number.
    pub field_definition_number: u8,
    /// Bytes this field occupies in each data record.
    pub byte_count: u8,
    /// Bit 7 of the packed byte.
    pub endian_ability: bool,
    /// The five-bit base type number.
    pub base_type_number: u8,
}

impl FieldDefEntry {
    /// Decode one wire entry.
    pub fn decode(raw: [u8; 3]) -> FieldDefEntry {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct Entry {
            field: u8,
            size: u8,
            base_type: u8,
        }

        let Entry {
            field,
            size,
            base_type,
        } = zerocopy::transmute!(raw);

        let packed = Packed(base_type);

        FieldDefEntry {
            field_definition_number: field,
            byte_count: size,
            endian_ability: packed.endian_ability(),
            base_type_number: packed.base_type_number(),
        }
    }

    /// Serialize this entry.
    pub fn encode(&self) -> [u8; 3] {
        let mut packed = Packed(0);
        packed.set_base_type_number(self.base_type_number);
        packed.set_endian_ability(self.endian_ability);

        [self.field_definition_number, self.byte_count, packed.0]
    }

    /// An entry for a known base type.
    pub fn for_base_type(number: u8, byte_count: u8, base: BaseType) -> FieldDefEntry {
        FieldDefEntry {
            field_definition_number: number,
            byte_count,
            endian_ability: base.endian_capable(),
            base_type_number: base.number(),
        }
    }

    /// The base type named by this entry.
    pub fn base_type(&self) -> Result<BaseType> {
        BaseType::from_number(self.base_type_number).ok_or(Error::UnknownBaseType {
            number: self.base_type_number,
        })
    }

    /// The shape of this field's slot in a data record.
    ///
    /// An unknown base type number is not fatal: the slot decodes as raw
    /// bytes of the declared width.
    pub fn shape(&self) -> Result<FieldShape> {
        let base = match self.base_type() {
            Ok(base) => base,
            Err(_) => {
                warn!(
                    number = self.base_type_number,
                    field = self.field_definition_number,
                    "unknown base type, passing raw bytes through",
                );
                BaseType::Byte
            }
        };

        FieldShape::of(base, self.byte_count, self.field_definition_number)
    }
}

/// The shape of one field's slot in a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A single value of a base type.
    Scalar(BaseType),
    /// A fixed-length array of a base type.
    Array(BaseType, usize),
    /// A fixed-width byte string.
    String(usize),
}

impl FieldShape {
    /// Derive a shape from a base type and a declared byte count.
    pub fn of(base: BaseType, byte_count: u8, field: u8) -> Result<FieldShape> {
        if base == BaseType::String {
            return Ok(FieldShape::String(byte_count as usize));
        }

        let width = base.width() as u8;

        if byte_count == width {
            Ok(FieldShape::Scalar(base))
        } else if byte_count > width && byte_count % width == 0 {
            Ok(FieldShape::Array(base, (byte_count / width) as usize))
        } else {
            Err(Error::InvalidFieldWidth {
                field,
                byte_count,
                base_width: width,
            })
        }
    }

    /// Bytes this shape occupies in a data record.
    pub fn byte_count(&self) -> usize {
        match *self {
            FieldShape::Scalar(base) => base.width(),
            FieldShape::Array(base, length) => base.width() * length,
            FieldShape::String(length) => length,
        }
    }

    /// The base type of the shape's elements.
    pub fn base_type(&self) -> BaseType {
        match *self {
            FieldShape::Scalar(base) | FieldShape::Array(base, _) => base,
            FieldShape::String(_) => BaseType::String,
        }
    }

    /// The value written when no value is supplied for this slot.
    pub fn undef_value(&self) -> Value {
        match *self {
            FieldShape::Scalar(base) => base.undef(),
            FieldShape::Array(base, length) => Value::Array(vec![base.undef(); length]),
            FieldShape::String(_) => Value::String(String::new()),
        }
    }
}

/// A field entry resolved against the profile.
#[derive(Debug, Clone)]
pub struct SchemaField {
    /// The wire entry.
    pub def: FieldDefEntry,
    /// The resolved field name.
    pub name: String,
    /// The shape of the field's slot in a data record.
    pub shape: FieldShape,
    /// The profile properties, synthesized for unknown field numbers.
    pub properties: ProfileField,
}

impl SchemaField {
    /// Resolve a wire entry against the profile message it belongs to.
    ///
    /// Field numbers the catalog does not name resolve to a synthetic
    /// `undocumented_field_<n>` whose base type comes from the wire entry
    /// alone.
    pub fn resolve(def: FieldDefEntry, message: &ProfileMessage) -> Result<SchemaField> {
        let shape = def.shape()?;

        match message.field_by_number(def.field_definition_number) {
            Some(field) => Ok(SchemaField {
                def,
                name: field.name.clone(),
                shape,
                properties: field.clone(),
            }),
            None => {
                warn!(
                    message = %message.name,
                    field = def.field_definition_number,
                    "unknown field number, synthesizing",
                );

                let properties =
                    ProfileField::undocumented(def.field_definition_number, shape.base_type());

                Ok(SchemaField {
                    def,
                    name: properties.name.clone(),
                    shape,
                    properties,
                })
            }
        }
    }
}
