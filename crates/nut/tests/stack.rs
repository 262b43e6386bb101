//! Value stack and scoped guard behaviour

mod common;

use nut::{Null, ObjectType, ScalarValue, Session, Stack, UserPointer};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

#[test]
fn test_string_round_trip() {
    let session = Session::new();
    let stack = session.stack();
    stack.push("blah");
    assert_eq!(stack.type_of(-1), ObjectType::String);
    assert_eq!(stack.read::<String>(stack.top() as isize), "blah");
}

#[test]
fn test_float_round_trip() {
    let session = Session::new();
    let stack = session.stack();
    stack.push(1998.1);
    assert_eq!(stack.read::<f64>(-1), 1998.1);
}

#[rstest]
#[case(ScalarValue::Null)]
#[case(ScalarValue::Bool(true))]
#[case(ScalarValue::Integer(i64::MIN))]
#[case(ScalarValue::Float(-0.25))]
#[case(ScalarValue::String(String::new()))]
#[case(ScalarValue::String("ünïcödé".to_string()))]
fn test_scalar_round_trip(#[case] value: ScalarValue) {
    let session = Session::new();
    let stack = session.stack();
    stack.push_value(value.clone());
    assert_eq!(stack.top(), 1);
    assert_eq!(stack.type_of(1), value.tag());
    assert_eq!(stack.read_value(1), Some(value));
}

#[test]
fn test_typed_reads_by_category() {
    let session = Session::new();
    let stack = session.stack();
    let target = 11_u8;
    stack.push(true);
    stack.push(-7_i32);
    stack.push(0.5_f32);
    stack.push(UserPointer::from_ref(&target));
    stack.push(Null);

    assert!(stack.read::<bool>(1));
    assert_eq!(stack.read::<i32>(2), -7);
    assert_eq!(stack.read::<f32>(3), 0.5);
    assert_eq!(stack.read::<UserPointer>(4).as_ptr() as *const u8, &target as *const u8);
    assert_eq!(stack.read::<Null>(5), Null);
}

#[test]
#[should_panic(expected = "stack read failed")]
fn test_mismatched_read_is_fatal() {
    let session = Session::new();
    let stack = session.stack();
    stack.push("blah");
    let _ = stack.read::<f64>(-1);
}

#[test]
#[should_panic(expected = "invalid stack position")]
fn test_position_zero_is_fatal() {
    let session = Session::new();
    session.stack().push(1_i64);
    let _ = session.stack().type_of(0);
}

#[test]
fn test_views_share_one_stack() {
    let session = Session::new();
    let first = session.stack();
    let second = Stack::new(session.vm());
    first.push(1_i64);
    second.push(2_i64);
    assert_eq!(first.top(), 2);
    assert_eq!(second.read::<i64>(1), 1);
}

#[test]
fn test_guard_restores_after_failed_scope() {
    fn parse_and_push(stack: Stack<'_>, text: &str) -> Result<(), std::num::ParseIntError> {
        let _guard = stack.guard();
        stack.push(text);
        let n: i64 = text.parse()?;
        stack.push(n);
        Ok(())
    }

    let session = Session::new();
    let stack = session.stack();
    stack.push("keep");
    assert!(parse_and_push(stack, "12").is_ok());
    assert!(parse_and_push(stack, "twelve").is_err());
    assert_eq!(stack.top(), 1);
    assert_eq!(stack.read::<String>(1), "keep");
}

#[derive(Debug, Clone)]
enum Op {
    PushInt(i64),
    PushStr(String),
    PushNull,
    Pop,
    Nested(Vec<Op>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Op::PushInt),
        "[a-z]{0,8}".prop_map(Op::PushStr),
        Just(Op::PushNull),
        Just(Op::Pop),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| prop::collection::vec(inner, 0..6).prop_map(Op::Nested))
}

fn apply(stack: Stack<'_>, ops: &[Op]) {
    for op in ops {
        match op {
            Op::PushInt(n) => stack.push(*n),
            Op::PushStr(s) => stack.push(s.as_str()),
            Op::PushNull => stack.push_null(),
            Op::Pop => {
                if stack.top() > 0 {
                    stack.pop(1);
                }
            }
            Op::Nested(inner) => {
                let before = stack.top();
                {
                    let _guard = stack.guard();
                    apply(stack, inner);
                }
                assert_eq!(stack.top(), before);
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_guard_balances_any_sequence(
        baseline in 0usize..4,
        ops in prop::collection::vec(op_strategy(), 0..24),
    ) {
        let session = Session::new();
        let stack = session.stack();
        for n in 0..baseline {
            stack.push(n as i64);
        }
        {
            let _guard = stack.guard();
            apply(stack, &ops);
        }
        prop_assert_eq!(stack.top(), baseline);
    }
}
