//! One linked program driving many evaluations, across threads and after
//! being persisted.

use std::{sync::Arc, thread};

use avrokit_core::{
    api::{Engine, EngineOptions, Error},
    compiler::compile,
    encoder::encode,
    vm::{EvalOptions, ExecutionErrorKind, InternalError, Program, VM, eval},
};
use avrokit_types::Schema;
use avrokit_values::{Value, ValueSink};
use indoc::indoc;
use pretty_assertions::assert_eq;

const READING: &str = indoc! {r#"
    {"type": "record", "name": "Reading", "fields": [
      {"name": "sensor", "type": "string"},
      {"name": "samples", "type": {"type": "array", "items": "float"}}
    ]}
"#};

const READING_V2: &str = indoc! {r#"
    {"type": "record", "name": "Reading", "fields": [
      {"name": "samples", "type": {"type": "array", "items": "double"}},
      {"name": "sensor", "type": "string"},
      {"name": "unit", "type": "string", "default": "celsius"}
    ]}
"#};

fn reading(sensor: &str, count: usize) -> Value {
    Value::record([
        ("sensor", Value::String(sensor.to_string())),
        (
            "samples",
            Value::Array((0..count).map(|i| Value::Float(i as f32 / 2.0)).collect()),
        ),
    ])
}

fn expected(sensor: &str, count: usize) -> Value {
    Value::record([
        (
            "samples",
            Value::Array((0..count).map(|i| Value::Double(i as f64 / 2.0)).collect()),
        ),
        ("sensor", Value::String(sensor.to_string())),
        ("unit", Value::String("celsius".to_string())),
    ])
}

#[test]
fn test_concurrent_evaluations_share_one_program() {
    let writer = Schema::parse(READING).unwrap();
    let reader = Schema::parse(READING_V2).unwrap();
    let program = compile(&writer, &reader).unwrap();

    let inputs: Vec<(String, usize, Vec<u8>)> = (0..8)
        .map(|n| {
            let sensor = format!("sensor-{n}");
            let count = n * 50;
            let mut bytes = Vec::new();
            encode(&writer, &reading(&sensor, count), &mut bytes).unwrap();
            (sensor, count, bytes)
        })
        .collect();

    thread::scope(|scope| {
        for (sensor, count, bytes) in &inputs {
            let (program, reader) = (&program, &reader);
            scope.spawn(move || {
                for _ in 0..20 {
                    let mut sink = ValueSink::new(reader);
                    eval(&mut bytes.as_slice(), program, &mut sink).unwrap();
                    assert_eq!(sink.into_value().unwrap(), expected(sensor, *count));
                }
            });
        }
    });
}

#[test]
fn test_engine_shared_between_threads() {
    let engine = Arc::new(Engine::default());
    let writer = engine.parse_schema(READING).unwrap();
    let reader = engine.parse_schema(READING_V2).unwrap();
    let mut bytes = Vec::new();
    encode(&writer, &reading("t", 3), &mut bytes).unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let value = engine
                    .decode_value(&writer, &reader, &mut bytes.as_slice())
                    .unwrap();
                assert_eq!(value, expected("t", 3));
            });
        }
    });
    assert_eq!(engine.cached_programs(), 1);
}

#[test]
fn test_persisted_program_decodes_the_same() {
    let writer = Schema::parse(READING).unwrap();
    let reader = Schema::parse(READING_V2).unwrap();
    let program = compile(&writer, &reader).unwrap();

    let restored = Program::from_bytes(&program.to_bytes().unwrap()).unwrap();
    assert_eq!(restored, program);

    let mut bytes = Vec::new();
    encode(&writer, &reading("x", 2), &mut bytes).unwrap();
    let mut sink = ValueSink::new(&reader);
    eval(&mut bytes.as_slice(), &restored, &mut sink).unwrap();
    assert_eq!(sink.into_value().unwrap(), expected("x", 2));
}

#[test]
fn test_unknown_opcode_is_rejected_on_load() {
    let int = Schema::parse(r#""int""#).unwrap();
    let mut bytes = compile(&int, &int).unwrap().to_bytes().unwrap();
    // Instruction count, then the first opcode byte.
    bytes[1] = 0xff;
    assert_eq!(
        Program::from_bytes(&bytes),
        Err(InternalError::UnknownOpcode(0xff))
    );
}

#[test]
fn test_deep_nesting_hits_the_depth_limit() {
    let list = Schema::parse(indoc! {r#"
        {"type": "record", "name": "Node", "fields": [
          {"name": "next", "type": ["null", "Node"]}
        ]}
    "#})
    .unwrap();
    let program = compile(&list, &list).unwrap();

    // A list far deeper than the limit: every node picks branch 1.
    let mut bytes = vec![0x02; 100_000];
    bytes.push(0x00);

    let mut sink = ValueSink::new(&list);
    let err = VM::with_options(&program, &mut bytes.as_slice(), EvalOptions { max_depth: 64 })
        .run(&mut sink)
        .unwrap_err();
    assert!(
        matches!(err.kind, ExecutionErrorKind::ResourceExceeded { limit: 64, .. }),
        "got {err:?}"
    );

    let engine = Engine::new(EngineOptions {
        eval: EvalOptions { max_depth: 64 },
        ..EngineOptions::default()
    });
    let err = engine
        .decode_value(&list, &list, &mut bytes.as_slice())
        .unwrap_err();
    assert!(matches!(err, Error::ResourceExceeded(_)), "got {err:?}");
}
