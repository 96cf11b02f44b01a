use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;

const PERSON: &str = indoc! {r#"
    {
      "type": "record", "name": "Person",
      "fields": [
        {"name": "name", "type": "string"},
        {"name": "age", "type": "int", "default": 18},
        {"name": "nothing", "type": "null"},
        {"name": "email", "type": ["null", "string"]},
        {"name": "tags", "type": {"type": "array", "items": "string"}},
        {"name": "scores", "type": {"type": "map", "values": "long"}}
      ]
    }
"#};

#[test]
fn test_record_assembly() {
    let schema = Schema::parse(PERSON).unwrap();
    let mut sink = ValueSink::new(&schema);

    sink.field(0).unwrap().set_string("Ada".into()).unwrap();
    sink.set_default(1).unwrap();
    {
        let email = sink.field(3).unwrap();
        email.set_long(1).unwrap();
        email.field(1).unwrap().set_string("ada@example.com".into()).unwrap();
    }
    {
        let tags = sink.field(4).unwrap();
        tags.append_array().unwrap().set_string("math".into()).unwrap();
        tags.append_array().unwrap().set_string("engines".into()).unwrap();
    }
    sink.field(5)
        .unwrap()
        .append_map("chess".into())
        .unwrap()
        .set_long(1200)
        .unwrap();

    assert_eq!(
        sink.into_value().unwrap(),
        Value::record([
            ("name", Value::String("Ada".into())),
            ("age", Value::Int(18)),
            ("nothing", Value::Null),
            ("email", Value::union(1, Value::String("ada@example.com".into()))),
            (
                "tags",
                Value::Array(vec![
                    Value::String("math".into()),
                    Value::String("engines".into()),
                ]),
            ),
            ("scores", Value::Map([("chess".to_string(), Value::Long(1200))].into())),
        ])
    );
}

#[test]
fn test_null_branch_needs_no_entry() {
    let schema = Schema::parse(r#"["null", "string"]"#).unwrap();
    let mut sink = ValueSink::new(&schema);
    sink.set_long(0).unwrap();
    assert_eq!(sink.into_value(), Ok(Value::union(0, Value::Null)));
}

#[test]
fn test_unpopulated_field_is_an_error() {
    let schema = Schema::parse(PERSON).unwrap();
    let mut sink = ValueSink::new(&schema);
    sink.field(0).unwrap().set_string("Ada".into()).unwrap();
    assert_eq!(
        sink.into_value(),
        Err(SinkError::Incomplete("field `age` of `Person`".into()))
    );
}

#[test]
fn test_shape_mismatch_is_unsupported() {
    let schema = Schema::parse(PERSON).unwrap();
    let mut sink = ValueSink::new(&schema);
    assert_eq!(
        sink.set_int(1),
        Err(SinkError::Unsupported {
            operation: "set_int",
            target: "record",
        })
    );
    assert!(matches!(
        sink.field(0).unwrap().set_long(5),
        Err(SinkError::Unsupported { target: "string", .. })
    ));
    assert!(matches!(
        sink.field(17),
        Err(SinkError::InvalidIndex { index: 17, .. })
    ));
}

#[test]
fn test_enum_and_fixed() {
    let schema = Schema::parse(indoc! {r#"
        {
          "type": "record", "name": "R",
          "fields": [
            {"name": "suit", "type": {"type": "enum", "name": "Suit", "symbols": ["HEARTS", "SPADES"]}},
            {"name": "id", "type": {"type": "fixed", "name": "Id", "size": 2}}
          ]
        }
    "#})
    .unwrap();
    let mut sink = ValueSink::new(&schema);
    sink.field(0).unwrap().set_long(1).unwrap();
    assert!(matches!(
        sink.field(1).unwrap().set_bytes(vec![1, 2, 3]),
        Err(SinkError::FixedSize { expected: 2, actual: 3 })
    ));
    sink.field(1).unwrap().set_bytes(vec![1, 2]).unwrap();
    assert!(sink.field(0).unwrap().set_long(2).is_err());
    sink.field(0).unwrap().set_long(1).unwrap();

    assert_eq!(
        sink.into_value().unwrap(),
        Value::record([
            (
                "suit",
                Value::Enum {
                    index: 1,
                    symbol: "SPADES".into(),
                },
            ),
            ("id", Value::Fixed(vec![1, 2])),
        ])
    );
}
