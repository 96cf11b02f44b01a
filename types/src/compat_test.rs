use indoc::indoc;

use super::*;
use crate::Primitive;

fn schema(json: &str) -> Schema {
    Schema::parse(json).unwrap()
}

fn readable(writer: &str, reader: &str) -> bool {
    let w = schema(writer);
    let r = schema(reader);
    is_readable_by(&w, w.root(), &r, r.root())
}

#[test]
fn test_primitive_promotions() {
    assert!(readable(r#""int""#, r#""long""#));
    assert!(readable(r#""int""#, r#""double""#));
    assert!(readable(r#""long""#, r#""float""#));
    assert!(readable(r#""float""#, r#""double""#));
    assert!(readable(r#""string""#, r#""bytes""#));
    assert!(readable(r#""bytes""#, r#""string""#));

    assert!(!readable(r#""long""#, r#""int""#));
    assert!(!readable(r#""double""#, r#""float""#));
    assert!(!readable(r#""boolean""#, r#""int""#));
}

#[test]
fn test_union_readability() {
    assert!(readable(r#"["null", "int"]"#, r#""long""#));
    assert!(readable(r#""int""#, r#"["null", "long"]"#));
    assert!(!readable(r#"["null", "string"]"#, r#""int""#));
}

#[test]
fn test_containers_recurse() {
    assert!(readable(
        r#"{"type": "array", "items": "int"}"#,
        r#"{"type": "array", "items": "long"}"#
    ));
    assert!(!readable(
        r#"{"type": "map", "values": "string"}"#,
        r#"{"type": "map", "values": "int"}"#
    ));
    assert!(!readable(
        r#"{"type": "map", "values": "int"}"#,
        r#"{"type": "array", "items": "int"}"#
    ));
}

#[test]
fn test_named_types_match_by_name_or_alias() {
    let writer = r#"{"type": "fixed", "name": "a.Hash", "size": 16}"#;
    assert!(readable(writer, r#"{"type": "fixed", "name": "b.Hash", "size": 16}"#));
    assert!(!readable(writer, r#"{"type": "fixed", "name": "a.Hash", "size": 8}"#));
    assert!(readable(
        writer,
        r#"{"type": "fixed", "name": "Digest", "aliases": ["a.Hash"], "size": 16}"#
    ));
    assert!(!readable(writer, r#"{"type": "fixed", "name": "Digest", "size": 16}"#));
}

#[test]
fn test_recursive_records_terminate() {
    let list = indoc! {r#"
        {
          "type": "record", "name": "List",
          "fields": [
            {"name": "head", "type": "int"},
            {"name": "tail", "type": ["null", "List"]}
          ]
        }
    "#};
    assert!(readable(list, list));
}

#[test]
fn test_exact_match_ignores_promotions() {
    let w = schema(r#""int""#);
    let r = schema(r#"["long", "int"]"#);
    let AvroType::Union(branches) = r.root() else {
        panic!("expected union");
    };
    assert!(!is_exact_match(&w, w.root(), &r, &branches[0]));
    assert!(is_exact_match(&w, w.root(), &r, &branches[1]));
    assert_eq!(branches[1], AvroType::Primitive(Primitive::Int));
}
