use std::io::Cursor;

use cassette::{check, decode, Error, Profile, Value};

/// A single-segment document wrapping the given record bytes.
fn document(records: &[u8]) -> Vec<u8> {
    let mut header = cassette::wire::header::FileHeader {
        data_size: records.len() as u32,
        ..Default::default()
    };
    header.seal();

    let mut bytes = header.to_bytes();
    bytes.extend_from_slice(records);
    bytes.extend_from_slice(&check::compute(records).to_le_bytes());
    bytes
}

#[test]
fn unsupported_header_size() {
    let profile = Profile::bundled();
    let mut input = Cursor::new(b"\xDA\x10\x2D\x08\xEB\x16\x00\x00.FIT\xAC\xEF".to_vec());

    assert!(matches!(
        decode(&mut input, &profile),
        Err(Error::UnsupportedHeader { size: 218 }),
    ));
}

#[test]
fn bad_magic() {
    let profile = Profile::bundled();
    let mut input = Cursor::new(b"\x0E\x10\x2D\x08\xEB\x16\x00\x00.AIT\xAC\xEF".to_vec());

    match decode(&mut input, &profile) {
        Err(Error::BadMagic { got }) => assert_eq!(got, ".AIT"),
        other => panic!("expected BadMagic, got {other:?}"),
    }
}

#[test]
fn header_crc_mismatch() {
    let profile = Profile::bundled();
    let mut input = Cursor::new(b"\x0E\x10\x2D\x08\xEB\x16\x00\x00.FIT\xAC\xEA".to_vec());

    match decode(&mut input, &profile) {
        Err(Error::HeaderCrcMismatch { computed, found }) => {
            assert_eq!(computed, 61356);
            assert_eq!(found, 60076);
        }
        other => panic!("expected HeaderCrcMismatch, got {other:?}"),
    }
}

#[test]
fn file_crc_mismatch() {
    let profile = Profile::bundled();

    let mut bytes = document(&[]);
    let end = bytes.len();
    bytes[end - 2..].copy_from_slice(&0xBEEFu16.to_le_bytes());

    assert!(matches!(
        decode(&mut Cursor::new(bytes), &profile),
        Err(Error::FileCrcMismatch { computed: 0, found: 0xBEEF }),
    ));
}

#[test]
fn big_endian_definition_and_data() {
    let mut records = vec![0x40];
    records.extend_from_slice(&[
        0x00, 0x01, 0x00, 0x00, 0x05, 0x03, 0x04, 0x8C, 0x04, 0x04, 0x86, 0x01, 0x02, 0x84, 0x02,
        0x02, 0x84, 0x00, 0x01, 0x00,
    ]);
    records.push(0x00);
    records.extend_from_slice(&[
        0x7F, 0xFF, 0xFF, 0xFF, 0x29, 0xE6, 0x07, 0x12, 0x00, 0x0F, 0x00, 0x01, 0x04,
    ]);

    let profile = Profile::bundled();
    let registry = decode(&mut Cursor::new(document(&records)), &profile).unwrap();

    let slot = &registry.definitions()[0];
    assert_eq!(slot.local_message_number, 0);
    assert_eq!(slot.definition.global_message_number, 0);
    assert_eq!(slot.definition.entries.len(), 5);

    let record = &registry.records()[0];
    assert_eq!(record.message_name, "file_id");
    assert_eq!(record.message_source.as_str(), "documented");
    assert_eq!(record.fields.len(), 5);
    assert_eq!(
        record.field("serial_number").unwrap().value,
        Value::UInt32z(2147483647),
    );
    assert_eq!(
        record.field("time_created").unwrap().value,
        Value::UInt32(702940946),
    );
    assert_eq!(record.field("manufacturer").unwrap().value, Value::UInt16(15));
    assert_eq!(record.field("product").unwrap().value, Value::UInt16(1));
    assert_eq!(record.field("type").unwrap().value, Value::Enum(4));

    // Every field carries its owning message and base type.
    let serial = record.field("serial_number").unwrap();
    assert_eq!(serial.message_name, "file_id");
    assert_eq!(serial.message_number, 0);
    assert_eq!(serial.base_type, cassette::BaseType::UInt32z);
    assert_eq!(serial.properties.type_name, "uint32z");
}

#[test]
fn chained_segments_decode_into_one_registry() {
    let mut records = vec![0x40];
    records.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00]);
    records.extend_from_slice(&[0x00, 0x04]);

    let mut bytes = document(&records);
    bytes.extend_from_slice(&document(&records));

    let profile = Profile::bundled();
    let registry = decode(&mut Cursor::new(bytes), &profile).unwrap();

    assert_eq!(registry.records().len(), 2);
    assert_eq!(registry.records()[1].index, 1);
    assert_eq!(registry.records()[1].message_name, "file_id");
}

#[test]
fn developer_field_sections_must_be_empty() {
    let profile = Profile::bundled();

    // Definition at slot 0 with the developer-data flag and a zero count
    // is tolerated.
    let mut accepted = vec![0x60];
    accepted.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    accepted.extend_from_slice(&[0x00, 0x04]);
    assert!(decode(&mut Cursor::new(document(&accepted)), &profile).is_ok());

    let mut rejected = vec![0x60];
    rejected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01]);
    assert!(matches!(
        decode(&mut Cursor::new(document(&rejected)), &profile),
        Err(Error::DeveloperFieldsUnsupported),
    ));
}

#[test]
fn unknown_global_message_is_rejected() {
    let profile = Profile::bundled();

    let mut records = vec![0x40];
    records.extend_from_slice(&[0x00, 0x00, 0xE7, 0x03, 0x00]);

    assert!(matches!(
        decode(&mut Cursor::new(document(&records)), &profile),
        Err(Error::UnknownGlobalMessage { number: 999 }),
    ));
}

#[test]
fn misaligned_field_width_is_rejected() {
    let profile = Profile::bundled();

    // file_id's manufacturer (uint16) declared three bytes wide.
    let mut records = vec![0x40];
    records.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x03, 0x84]);

    assert!(matches!(
        decode(&mut Cursor::new(document(&records)), &profile),
        Err(Error::InvalidFieldWidth {
            field: 1,
            byte_count: 3,
            base_width: 2,
        }),
    ));
}

#[test]
fn unknown_field_numbers_synthesize_names() {
    let profile = Profile::bundled();

    // file_creator with an undeclared string field number 2.
    let mut records = vec![0x40];
    records.extend_from_slice(&[0x00, 0x00, 0x31, 0x00, 0x01, 0x02, 0x08, 0x07]);
    records.push(0x00);
    records.extend_from_slice(b"Bar Baz\0");

    let registry = decode(&mut Cursor::new(document(&records)), &profile).unwrap();
    let record = &registry.records()[0];
    assert_eq!(
        record.field("undocumented_field_2").unwrap().value,
        Value::String("Bar Baz\0".to_string()),
    );
}
