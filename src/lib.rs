//! A structure-preserving encoder and decoder for Garmin's Flexible and
//! Interoperable Data Transfer protocol.
//!
//! Cassette translates between FIT byte streams and an in-memory
//! [`Registry`] of raw, field-tagged records, keeping every byte-level
//! property intact — field widths, string paddings, CRCs, and the order
//! definitions are declared in — so re-encoded output is accepted by
//! parsers that validate structure strictly.
//!
//! Values are returned exactly as they appear on the wire: no scaling, no
//! unit conversion, no sub-field expansion. Those belong to semantic
//! layers built on top of this crate.
//!
//! # Decoding
//!
//! ```no_run
//! let profile = cassette::Profile::bundled();
//! let registry = cassette::decode_file("activity.fit", &profile)?;
//!
//! for record in registry.records() {
//!     println!("{}: {} fields", record.message_name, record.fields.len());
//! }
//! # Ok::<(), cassette::Error>(())
//! ```
//!
//! # Encoding
//!
//! Encode a decoded registry back out, or build one from plain records.
//! Passing a template document clones its definitions so the output keeps
//! the template's exact layout.
//!
//! ```no_run
//! use cassette::{RecordSpec, Value};
//!
//! let profile = cassette::Profile::bundled();
//! let records = [
//!     RecordSpec::new("file_id", 0)
//!         .with_field("type", Value::Enum(4))
//!         .with_field("manufacturer", Value::UInt16(255)),
//! ];
//! cassette::encode_records_file("out.fit", &records, &profile, None)?;
//! # Ok::<(), cassette::Error>(())
//! ```
//!
//! # Profile catalog
//!
//! Decoding is driven by the profile catalog: the merged dictionary of
//! documented and undocumented messages and types. A bundled copy covers
//! the core activity messages; [`Profile::from_dir`] loads a caller's own
//! tables from a directory.

pub mod builder;
pub mod check;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod profile;
pub mod registry;
pub mod value;
pub mod wire;

pub use builder::RecordSpec;
pub use decoder::Decoder;
pub use error::{Error, Result};
pub use profile::base_type::BaseType;
pub use profile::Profile;
pub use registry::{DecodedField, DecodedRecord, DefinitionSlot, Registry};
pub use value::Value;

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

/// Decode a document from a seekable stream.
pub fn decode<R: Read + Seek>(reader: &mut R, profile: &Profile) -> Result<Registry> {
    Decoder::new(profile).decode(reader)
}

/// Decode a document from a file.
pub fn decode_file(path: impl AsRef<Path>, profile: &Profile) -> Result<Registry> {
    let mut file = File::open(path)?;
    decode(&mut file, profile)
}

/// Encode a registry to a seekable sink.
pub fn encode<W: Write + Seek>(writer: &mut W, registry: &Registry) -> Result<()> {
    encoder::encode(writer, registry)
}

/// Encode a registry to a file.
pub fn encode_file(path: impl AsRef<Path>, registry: &Registry) -> Result<()> {
    let mut file = File::create(path)?;
    encode(&mut file, registry)
}

/// Encode user records to a seekable sink.
///
/// With a `template`, definitions are cloned from the named document and
/// the output preserves its binary layout; otherwise minimal definitions
/// are derived from the records.
pub fn encode_records<W: Write + Seek>(
    writer: &mut W,
    records: &[RecordSpec],
    profile: &Profile,
    template: Option<&Path>,
) -> Result<()> {
    let registry = match template {
        Some(path) => {
            let mut template = File::open(path)?;
            builder::registry_from_records_with_template(records, profile, &mut template)?
        }
        None => builder::registry_from_records(records, profile)?,
    };

    encode(writer, &registry)
}

/// Encode user records to a file.
pub fn encode_records_file(
    path: impl AsRef<Path>,
    records: &[RecordSpec],
    profile: &Profile,
    template: Option<&Path>,
) -> Result<()> {
    let mut file = File::create(path)?;
    encode_records(&mut file, records, profile, template)
}
