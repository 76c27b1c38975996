//! Errors reported while encoding or decoding a document.

use thiserror::Error;

/// An error encoding or decoding a FIT document.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown document header length.
    #[error("Unknown document header length ({size}).")]
    UnsupportedHeader {
        /// The length byte found at the start of the document.
        size: u8,
    },
    /// Incorrect filetype marker.
    #[error("Incorrect filetype marker ({got:?}).")]
    BadMagic {
        /// The four bytes found where `.FIT` was expected.
        got: String,
    },
    /// Calculated and found header CRC values do not match.
    #[error("Calculated ({computed}) and found ({found}) header CRC values do not match.")]
    HeaderCrcMismatch {
        /// The CRC calculated over the header bytes.
        computed: u16,
        /// The CRC stored in the header.
        found: u16,
    },
    /// Calculated and found record-section CRC values do not match.
    #[error("Calculated ({computed}) and found ({found}) file CRC values do not match.")]
    FileCrcMismatch {
        /// The CRC calculated over the record section.
        computed: u16,
        /// The CRC trailing the record section.
        found: u16,
    },
    /// Found a compressed-timestamp record header (not supported).
    #[error("Compressed-timestamp record headers are not supported.")]
    CompressedTimestampUnsupported,
    /// Found developer field definitions (not supported).
    #[error("Developer fields are not supported.")]
    DeveloperFieldsUnsupported,
    /// A definition record declared an architecture other than 0 or 1.
    #[error("Invalid architecture byte ({value}).")]
    InvalidArchitecture {
        /// The architecture byte found.
        value: u8,
    },
    /// A definition record named a message absent from the profile catalog.
    #[error("Unknown global message number ({number}).")]
    UnknownGlobalMessage {
        /// The global message number found.
        number: u16,
    },
    /// A field's byte count does not fit its base type.
    #[error("Field {field}: byte count {byte_count} is not a multiple of base width {base_width}.")]
    InvalidFieldWidth {
        /// The field definition number.
        field: u8,
        /// The byte count declared for the field.
        byte_count: u8,
        /// The wire width of the field's base type.
        base_width: u8,
    },
    /// A base type number absent from the base-type table.
    #[error("Unknown base type number ({number}).")]
    UnknownBaseType {
        /// The five-bit base type number found.
        number: u8,
    },
    /// An encode input named a message absent from the profile catalog.
    #[error("Message {name:?} is not in the profile catalog.")]
    MissingProfileMessage {
        /// The message name supplied by the caller.
        name: String,
    },
    /// A data record arrived before any definition for its local slot.
    #[error("No active definition for local message number {local}.")]
    MissingLocalDefinition {
        /// The local message number of the orphaned record.
        local: u8,
    },
    /// An encode input field whose base type could not be determined.
    #[error("Field {field:?} of {message:?} has no resolvable base type.")]
    UnresolvableFieldType {
        /// The message the field belongs to.
        message: String,
        /// The field name supplied by the caller.
        field: String,
    },
    /// An encode input named a field its message does not have.
    #[error("Message {message:?} has no field {field:?}.")]
    UnknownMessageField {
        /// The message the field was supplied for.
        message: String,
        /// The field name supplied by the caller.
        field: String,
    },
    /// An encode input value too wide for a one-byte field width.
    #[error("Field {field:?} is wider than 255 bytes ({byte_count}).")]
    FieldTooWide {
        /// The field name supplied by the caller.
        field: String,
        /// The width the field's values would need.
        byte_count: usize,
    },
    /// A profile catalog table could not be read.
    #[error("Profile table: {0}.")]
    Catalog(String),
    /// An error from the underlying stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for codec operations.
pub type Result<T> = core::result::Result<T, Error>;
