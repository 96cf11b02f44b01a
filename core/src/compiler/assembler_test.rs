use avrokit_types::Schema;
use expect_test::expect;
use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;

fn schema(json: &str) -> Schema {
    Schema::parse(json).unwrap()
}

fn compile_pair(writer: &str, reader: &str) -> Result<Program, CompileError> {
    compile(&schema(writer), &schema(reader))
}

#[test]
fn test_disassembly() {
    let program = compile_pair(
        indoc! {r#"
            {"type": "record", "name": "Point", "fields": [
              {"name": "x", "type": "int"},
              {"name": "label", "type": ["null", "string"]}
            ]}
        "#},
        indoc! {r#"
            {"type": "record", "name": "Point", "fields": [
              {"name": "label", "type": ["string", "null"]},
              {"name": "x", "type": "long"},
              {"name": "z", "type": "double", "default": 0.0}
            ]}
        "#},
    )
    .unwrap();

    expect![[r#"
        main:
           0  call         2               ; record:Point->Point
           1  halt         0               ; end
        record:Point->Point:
           2  enter        1               ; Point.x
           3  read         int_as_long     ; Point.x
           4  set          long            ; Point.x
           5  exit                         ; Point.x
           6  enter        0               ; Point.label
           7  read         long            ; Point.label
           8  eval_equal   0               ; Point.label
           9  cond_jump    14              ; Point.label
          10  eval_equal   1               ; Point.label
          11  cond_jump    17              ; Point.label
          12  halt         1               ; Point.label
          13  jump         23              ; Point.label
          14  add_long     1               ; Point.label
          15  set          long            ; Point.label
          16  jump         23              ; Point.label
          17  add_long     -1              ; Point.label
          18  set          long            ; Point.label
          19  enter        0               ; Point.label
          20  read         string          ; Point.label
          21  set          string          ; Point.label
          22  exit                         ; Point.label
          23  exit                         ; Point.label
          24  set_default  2               ; Point.z
          25  return                       ; record:Point->Point
        error 1: written branch of `union[null, string]` cannot be read as `union[string, null]`
    "#]]
    .assert_eq(&program.to_string());
}

#[test]
fn test_recursive_schema_compiles_to_one_method() {
    let list = indoc! {r#"
        {"type": "record", "name": "Node", "namespace": "list", "fields": [
          {"name": "value", "type": "int"},
          {"name": "next", "type": ["null", "Node"]}
        ]}
    "#};
    let program = compile_pair(list, list).unwrap();
    assert_eq!(program.methods(), vec![("record:list.Node->list.Node", 2)]);

    let calls = program
        .instructions()
        .iter()
        .filter(|i| i.op == Opcode::Call)
        .count();
    assert_eq!(calls, 2, "one from main, one from the `next` branch");
}

#[test]
fn test_shared_record_type_is_compiled_once() {
    let json = indoc! {r#"
        {"type": "record", "name": "Line", "fields": [
          {"name": "from", "type": {"type": "record", "name": "Point", "fields": [
            {"name": "x", "type": "double"},
            {"name": "y", "type": "double"}
          ]}},
          {"name": "to", "type": "Point"}
        ]}
    "#};
    let program = compile_pair(json, json).unwrap();
    let names: Vec<_> = program.methods().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["record:Line->Line", "record:Point->Point"]);
}

#[test]
fn test_removed_record_field_is_skipped_by_its_own_method() {
    let writer = indoc! {r#"
        {"type": "record", "name": "Outer", "fields": [
          {"name": "inner", "type": {"type": "record", "name": "Inner", "fields": [
            {"name": "tags", "type": {"type": "array", "items": "string"}}
          ]}},
          {"name": "id", "type": "long"}
        ]}
    "#};
    let reader = indoc! {r#"
        {"type": "record", "name": "Outer", "fields": [
          {"name": "id", "type": "long"}
        ]}
    "#};
    let program = compile_pair(writer, reader).unwrap();
    let names: Vec<_> = program.methods().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["record:Outer->Outer", "record:Inner->_"]);

    // Skipping delivers nothing to the sink.
    let inner = program.method("record:Inner->_").unwrap();
    assert!(program.instructions()[inner..].iter().all(|i| !matches!(
        i.op,
        Opcode::Set | Opcode::Enter | Opcode::AppendArray | Opcode::AppendMap
    )));
}

#[test]
fn test_enum_errors_are_registered() {
    let program = compile_pair(
        r#"{"type": "enum", "name": "Suit", "symbols": ["HEARTS", "SPADES", "CLUBS"]}"#,
        r#"{"type": "enum", "name": "Suit", "symbols": ["SPADES", "HEARTS"]}"#,
    )
    .unwrap();
    assert_eq!(
        program.errors(),
        &[EcoString::from("symbol of `Suit` is not declared by `Suit`")]
    );

    // Only HEARTS and SPADES have cases; CLUBS falls through to the halt.
    let tests: Vec<i64> = program
        .instructions()
        .iter()
        .filter(|i| i.op == Opcode::EvalEqual)
        .map(|i| i.operand)
        .collect();
    assert_eq!(tests, vec![0, 1]);
}

#[test]
fn test_incompatible_primitives() {
    assert_eq!(
        compile_pair(r#""int""#, r#""string""#).unwrap_err(),
        CompileError::Incompatible {
            writer: "int".to_string(),
            reader: "string".to_string(),
            context: "root".to_string(),
        }
    );
    assert!(compile_pair(r#""long""#, r#""int""#).is_err());
    assert!(compile_pair(r#""double""#, r#""float""#).is_err());
}

#[test]
fn test_fixed_size_mismatch() {
    let err = compile_pair(
        r#"{"type": "fixed", "name": "Hash", "namespace": "h", "size": 16}"#,
        r#"{"type": "fixed", "name": "Hash", "namespace": "h", "size": 32}"#,
    )
    .unwrap_err();
    assert_eq!(
        err,
        CompileError::FixedSizeMismatch {
            name: "h.Hash".to_string(),
            writer: 16,
            reader: 32,
        }
    );
    assert_eq!(err.subject(), Some("Hash"));
}

#[test]
fn test_missing_and_invalid_defaults() {
    let writer = r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#;

    let err = compile_pair(
        writer,
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string"}
        ]}"#,
    )
    .unwrap_err();
    assert_eq!(
        err,
        CompileError::MissingDefault {
            record: "R".to_string(),
            field: "b".to_string(),
        }
    );

    let err = compile_pair(
        writer,
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "int", "default": "seven"}
        ]}"#,
    )
    .unwrap_err();
    assert!(
        matches!(&err, CompileError::InvalidDefault { field, .. } if field == "b"),
        "got {err:?}"
    );
}

#[test]
fn test_union_without_readable_branch() {
    assert_eq!(
        compile_pair(r#"["int", "boolean"]"#, r#""string""#).unwrap_err(),
        CompileError::NoReadableBranch {
            writer: "union[int, boolean]".to_string(),
            reader: "string".to_string(),
        }
    );
}

#[test]
fn test_reader_union_prefers_exact_branch() {
    let program = compile_pair(r#""int""#, r#"["null", "long", "int"]"#).unwrap();
    let ops: Vec<_> = program
        .instructions()
        .iter()
        .map(|i| (i.op, i.operand))
        .collect();
    assert_eq!(
        ops,
        vec![
            (Opcode::MultLong, 0),
            (Opcode::AddLong, 2),
            (Opcode::Set, Kind::Long.operand()),
            (Opcode::Enter, 2),
            (Opcode::Read, Kind::Int.operand()),
            (Opcode::Set, Kind::Int.operand()),
            (Opcode::Exit, 0),
            (Opcode::Halt, 0),
        ]
    );
}
