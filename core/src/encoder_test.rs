use std::collections::BTreeMap;

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;

fn encoded(schema: &Schema, value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode(schema, value, &mut buf).unwrap();
    buf
}

#[test]
fn test_record_bytes() {
    let schema = Schema::parse(indoc! {r#"
        {"type": "record", "name": "R", "fields": [
          {"name": "id", "type": "long"},
          {"name": "name", "type": ["null", "string"]},
          {"name": "tags", "type": {"type": "array", "items": "int"}}
        ]}
    "#})
    .unwrap();
    let value = Value::record([
        ("id", Value::Long(-1)),
        ("name", Value::union(1, Value::String("ab".to_string()))),
        ("tags", Value::Array(vec![Value::Int(1), Value::Int(2)])),
    ]);
    assert_eq!(
        encoded(&schema, &value),
        vec![0x01, 0x02, 0x04, b'a', b'b', 0x04, 0x02, 0x04, 0x00]
    );
}

#[test]
fn test_empty_containers_write_only_the_terminator() {
    let schema = Schema::parse(r#"{"type": "map", "values": "string"}"#).unwrap();
    assert_eq!(encoded(&schema, &Value::Map(BTreeMap::new())), vec![0x00]);
}

#[test]
fn test_enum_and_fixed() {
    let schema = Schema::parse(indoc! {r#"
        {"type": "record", "name": "R", "fields": [
          {"name": "suit", "type": {"type": "enum", "name": "Suit", "symbols": ["A", "B", "C"]}},
          {"name": "hash", "type": {"type": "fixed", "name": "H", "size": 2}}
        ]}
    "#})
    .unwrap();
    let value = Value::record([
        (
            "suit",
            Value::Enum {
                index: 2,
                symbol: "C".to_string(),
            },
        ),
        ("hash", Value::Fixed(vec![0xca, 0xfe])),
    ]);
    assert_eq!(encoded(&schema, &value), vec![0x04, 0xca, 0xfe]);
}

#[test]
fn test_errors() {
    let schema = Schema::parse(indoc! {r#"
        {"type": "record", "name": "R", "fields": [
          {"name": "id", "type": "long"},
          {"name": "hash", "type": {"type": "fixed", "name": "H", "size": 2}}
        ]}
    "#})
    .unwrap();
    let mut buf = Vec::new();

    let missing = Value::record([("id", Value::Long(1))]);
    assert!(matches!(
        encode(&schema, &missing, &mut buf),
        Err(EncodeError::MissingField { field, .. }) if field == "hash"
    ));

    let wrong_type = Value::record([("id", Value::Int(1)), ("hash", Value::Fixed(vec![0, 0]))]);
    let err = encode(&schema, &wrong_type, &mut buf).unwrap_err();
    assert_eq!(err.to_string(), "expected long, got int");

    let short = Value::record([("id", Value::Long(1)), ("hash", Value::Fixed(vec![0]))]);
    assert!(matches!(
        encode(&schema, &short, &mut buf),
        Err(EncodeError::FixedSize { expected: 2, actual: 1, .. })
    ));

    let union = Schema::parse(r#"["null", "int"]"#).unwrap();
    assert!(matches!(
        encode(&union, &Value::union(2, Value::Null), &mut buf),
        Err(EncodeError::InvalidBranch { index: 2, .. })
    ));
}
