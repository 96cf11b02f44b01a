//! Tests for schema parsing, reference resolution and canonical forms.

use avrokit_types::{
    AvroType, Definition, Primitive, QualifiedName, Resolved, Schema, SchemaError,
};
use indoc::indoc;
use pretty_assertions::assert_eq;

// ============================================================================
// Primitives and anonymous types
// ============================================================================

#[test]
fn test_primitive_names() {
    for primitive in Primitive::ALL {
        let schema = Schema::parse(&format!("\"{}\"", primitive.name())).unwrap();
        assert_eq!(schema.root(), &AvroType::Primitive(primitive));
    }
}

#[test]
fn test_wrapped_primitive_with_logical_type() {
    let schema = Schema::parse(r#"{"type": "long", "logicalType": "timestamp-millis"}"#).unwrap();
    assert_eq!(schema.root(), &AvroType::Primitive(Primitive::Long));
}

#[test]
fn test_array_map_and_union() {
    let schema = Schema::parse(indoc! {r#"
        {
          "type": "map",
          "values": {"type": "array", "items": ["null", "string"]}
        }
    "#})
    .unwrap();
    assert_eq!(
        schema.root(),
        &AvroType::Map(Box::new(AvroType::Array(Box::new(AvroType::Union(vec![
            AvroType::Primitive(Primitive::Null),
            AvroType::Primitive(Primitive::String),
        ])))))
    );
}

#[test]
fn test_nested_unions_are_rejected() {
    let err = Schema::parse(r#"["null", ["int", "long"]]"#).unwrap_err();
    assert!(matches!(err, SchemaError::Invalid(_)), "got {err:?}");
}

// ============================================================================
// Named types
// ============================================================================

#[test]
fn test_record_fields_defaults_and_aliases() {
    let schema = Schema::parse(indoc! {r#"
        {
          "type": "record",
          "name": "Person",
          "namespace": "com.example",
          "aliases": ["Human"],
          "fields": [
            {"name": "name", "type": "string", "aliases": ["full_name"]},
            {"name": "nickname", "type": ["null", "string"], "default": null},
            {"name": "age", "type": "int", "default": 0}
          ]
        }
    "#})
    .unwrap();

    let Some(Resolved::Record(person)) = schema.resolve(schema.root()) else {
        panic!("expected a record");
    };
    assert_eq!(person.name, QualifiedName::new("Person", "com.example"));
    assert_eq!(person.aliases, vec![QualifiedName::new("Human", "com.example")]);
    assert_eq!(person.fields[0].aliases, vec!["full_name".to_string()]);
    assert!(!person.fields[0].has_default());
    // An explicit `null` default is still a default.
    assert_eq!(person.fields[1].default, Some(serde_json::Value::Null));
    assert_eq!(person.fields[2].default, Some(serde_json::json!(0)));
}

#[test]
fn test_namespace_is_inherited_by_nested_definitions() {
    let schema = Schema::parse(indoc! {r#"
        {
          "type": "record", "name": "Outer", "namespace": "a.b",
          "fields": [
            {"name": "color", "type": {"type": "enum", "name": "Color", "symbols": ["RED", "GREEN"]}},
            {"name": "hash", "type": {"type": "fixed", "name": "c.Hash", "size": 4}},
            {"name": "again", "type": "Color"}
          ]
        }
    "#})
    .unwrap();

    let names: Vec<String> = schema.definitions().map(|d| d.name().to_string()).collect();
    assert_eq!(names, vec!["a.b.Outer", "a.b.Color", "c.Hash"]);

    let color = schema
        .definition(&QualifiedName::new("Color", "a.b"))
        .unwrap();
    let Definition::Enum(color) = color else {
        panic!("expected an enum");
    };
    assert_eq!(color.symbols, vec!["RED", "GREEN"]);
}

#[test]
fn test_recursive_reference_resolves() {
    let schema = Schema::parse(indoc! {r#"
        {
          "type": "record", "name": "Node",
          "fields": [
            {"name": "children", "type": {"type": "array", "items": "Node"}}
          ]
        }
    "#})
    .unwrap();
    let Some(Resolved::Record(node)) = schema.resolve(schema.root()) else {
        panic!("expected a record");
    };
    let AvroType::Array(items) = &node.fields[0].ty else {
        panic!("expected an array");
    };
    assert!(matches!(schema.resolve(items), Some(Resolved::Record(_))));
}

#[test]
fn test_reference_falls_back_to_null_namespace() {
    let schema = Schema::parse(indoc! {r#"
        [
          {"type": "fixed", "name": "Id", "size": 8},
          {"type": "record", "name": "Wrapper", "namespace": "ns",
           "fields": [{"name": "id", "type": "Id"}]}
        ]
    "#})
    .unwrap();
    let wrapper = schema
        .definition(&QualifiedName::new("Wrapper", "ns"))
        .unwrap();
    let Definition::Record(wrapper) = wrapper else {
        panic!("expected a record");
    };
    assert_eq!(
        wrapper.fields[0].ty,
        AvroType::Reference(QualifiedName::new("Id", ""))
    );
}

#[test]
fn test_unresolved_reference() {
    let source = r#"{"type": "array", "items": "Missing"}"#;
    let err = Schema::parse(source).unwrap_err();
    assert!(matches!(err, SchemaError::UnresolvedReference(ref n) if n.name == "Missing"));
    assert_eq!(err.span(source), Some(28..35));
}

#[test]
fn test_duplicate_definition() {
    let err = Schema::parse(indoc! {r#"
        [
          {"type": "enum", "name": "E", "symbols": ["A"]},
          {"type": "enum", "name": "E", "symbols": ["B"]}
        ]
    "#})
    .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateDefinition(_)));
}

#[test]
fn test_enum_default_must_be_a_symbol() {
    let err = Schema::parse(r#"{"type": "enum", "name": "E", "symbols": ["A"], "default": "B"}"#)
        .unwrap_err();
    assert!(matches!(err, SchemaError::Invalid(_)));
}

#[test]
fn test_json_syntax_error_has_location() {
    let source = "{\n  \"type\": \"record\",\n  oops\n}";
    let err = Schema::parse(source).unwrap_err();
    let SchemaError::Json { line, .. } = err else {
        panic!("expected a JSON error, got {err:?}");
    };
    assert_eq!(line, 3);
    assert!(err.span(source).is_some());
}

// ============================================================================
// Canonical form
// ============================================================================

#[test]
fn test_canonical_form_strips_irrelevant_attributes() {
    let verbose = Schema::parse(indoc! {r#"
        {
          "type": "record",
          "name": "Point",
          "namespace": "geo",
          "doc": "A point",
          "aliases": ["Coordinate"],
          "fields": [
            {"name": "x", "type": {"type": "double"}, "default": 0.0},
            {"name": "y", "type": "double", "doc": "vertical"},
            {"name": "next", "type": ["null", "Point"]}
          ]
        }
    "#})
    .unwrap();
    let terse = Schema::parse(
        r#"{"name":"geo.Point","type":"record","fields":[{"name":"x","type":"double"},{"name":"y","type":"double"},{"name":"next","type":["null","geo.Point"]}]}"#,
    )
    .unwrap();

    assert_eq!(
        verbose.canonical_form(),
        r#"{"name":"geo.Point","type":"record","fields":[{"name":"x","type":"double"},{"name":"y","type":"double"},{"name":"next","type":["null","geo.Point"]}]}"#
    );
    assert_eq!(verbose.canonical_form(), terse.canonical_form());
    assert_eq!(verbose.fingerprint(), terse.fingerprint());
}

#[test]
fn test_fingerprint_distinguishes_schemas() {
    let int = Schema::parse(r#""int""#).unwrap();
    let long = Schema::parse(r#""long""#).unwrap();
    assert_ne!(int.fingerprint(), long.fingerprint());
}
