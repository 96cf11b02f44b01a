use ecow::EcoString;
use pretty_assertions::assert_eq;
use smallvec::smallvec;

use super::*;

fn label() -> EcoString {
    EcoString::from("items")
}

fn ops(code: &[Instruction]) -> Vec<(Opcode, i64)> {
    code.iter().map(|i| (i.op, i.operand)).collect()
}

#[test]
fn test_block_targets() {
    let layout = Layout {
        blocks: vec![BlockLayout { start: 10, end: 30 }],
        ..Layout::default()
    };

    let start = IrInstruction::BlockStart { id: 0, label: label() };
    let code = start.lower(&layout).unwrap();
    assert_eq!(code.len(), start.len());
    assert_eq!(
        ops(&code),
        vec![
            (Opcode::Read, Kind::Long.operand()),
            (Opcode::EvalEqual, 0),
            // Past the block end.
            (Opcode::CondJump, 35),
            (Opcode::EvalGreater, 0),
            // Straight to the loop entry.
            (Opcode::CondJump, 17),
            (Opcode::Read, Kind::UnusedLong.operand()),
            (Opcode::MultLong, -1),
            (Opcode::PushLoop, 0),
        ]
    );

    let end = IrInstruction::BlockEnd { id: 0, label: label() };
    let code = end.lower(&layout).unwrap();
    assert_eq!(code.len(), end.len());
    assert_eq!(
        ops(&code),
        vec![
            (Opcode::PopLoop, 0),
            (Opcode::AddLong, -1),
            (Opcode::EvalEqual, 0),
            (Opcode::CondJump, 10),
            (Opcode::Jump, 17),
        ]
    );
    assert!(code.iter().all(|i| i.label.as_str() == "items"));
}

#[test]
fn test_switch_targets() {
    let layout = Layout {
        switches: vec![SwitchLayout {
            cases: vec![(0, 20), (2, 25)],
            end: 30,
        }],
        ..Layout::default()
    };

    let start = IrInstruction::SwitchStart {
        id: 0,
        tags: smallvec![0, 2],
        error: 3,
        label: label(),
    };
    let code = start.lower(&layout).unwrap();
    assert_eq!(code.len(), start.len());
    assert_eq!(
        ops(&code),
        vec![
            (Opcode::EvalEqual, 0),
            (Opcode::CondJump, 21),
            (Opcode::EvalEqual, 2),
            (Opcode::CondJump, 26),
            (Opcode::Halt, 3),
        ]
    );

    let case = IrInstruction::SwitchCase {
        id: 0,
        tag: 2,
        reader_index: Some(0),
        label: label(),
    };
    let code = case.lower(&layout).unwrap();
    assert_eq!(code.len(), case.len());
    assert_eq!(
        ops(&code),
        vec![
            (Opcode::Jump, 30),
            (Opcode::AddLong, -2),
            (Opcode::Set, Kind::Long.operand()),
        ]
    );

    let discard = IrInstruction::SwitchCase {
        id: 0,
        tag: 0,
        reader_index: None,
        label: label(),
    };
    assert_eq!(ops(&discard.lower(&layout).unwrap()), vec![(Opcode::Jump, 30)]);
    assert!(IrInstruction::SwitchEnd(0).lower(&layout).unwrap().is_empty());
}

#[test]
fn test_method_call() {
    let mut layout = Layout::default();
    layout.methods.insert(EcoString::from("record:a.B->a.B"), 12);

    let call = IrInstruction::MethodCall(EcoString::from("record:a.B->a.B"));
    assert_eq!(ops(&call.lower(&layout).unwrap()), vec![(Opcode::Call, 12)]);

    let missing = IrInstruction::MethodCall(EcoString::from("record:a.C->a.C"));
    assert_eq!(
        missing.lower(&layout),
        Err(CompileError::UnknownMethod(EcoString::from("record:a.C->a.C")))
    );
}

#[test]
fn test_unlaid_switch() {
    let case = IrInstruction::SwitchCase {
        id: 4,
        tag: 0,
        reader_index: None,
        label: label(),
    };
    assert!(matches!(
        case.lower(&Layout::default()),
        Err(CompileError::Internal(_))
    ));
}
