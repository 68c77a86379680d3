mod common;

use common::Player;
use lb_stack::{Arg, ArgType, TOP, ValueKind};
use lb_table::{ArgSide, Error, TableFunction, hydrate};

#[test]
fn global_function_fills_outputs_in_result_order() {
    let mut stack = common::loaded();
    stack.push_str("sentinel").unwrap();
    let f = TableFunction::<2, 2>::global("f");

    let mut outputs = [Arg::Int(0), Arg::Int(0)];
    f.call(&mut stack, &[Arg::Int(32), Arg::Int(20)], &mut outputs)
        .unwrap();
    assert_eq!(outputs, [Arg::Int(52), Arg::Int(12)]);
    assert_eq!(stack.size(), 1);
    assert_eq!(stack.to_str(TOP).as_deref(), Some("sentinel"));
}

#[test]
fn hydrated_function_calls_through_its_table() {
    let mut stack = common::loaded();
    let mut player = Player::default();
    hydrate(&mut stack, &mut player, "Player").unwrap();

    let [sum, diff] = player
        .fun
        .call_typed(&mut stack, &[Arg::Int(32), Arg::Int(20)], [ArgType::Int, ArgType::Double])
        .unwrap();
    assert_eq!(sum, Arg::Int(52));
    assert_eq!(diff, Arg::Double(12.0));
    assert_eq!(stack.size(), 0);
}

#[test]
fn table_functions_are_looked_up_on_every_call() {
    let mut stack = common::loaded();
    let mut player = Player::default();
    hydrate(&mut stack, &mut player, "Player").unwrap();
    stack
        .run_source("Player.Fun = function(a, b) return a * b, 0 end", "swap")
        .unwrap();

    let mut outputs = [Arg::Int(-1), Arg::Int(-1)];
    player
        .fun
        .call(&mut stack, &[Arg::Int(32), Arg::Int(20)], &mut outputs)
        .unwrap();
    assert_eq!(outputs, [Arg::Int(640), Arg::Int(0)]);
}

#[test]
fn arity_mismatch_is_reported_before_anything_runs() {
    let mut stack = common::loaded();
    let f = TableFunction::<2, 2>::global("f");

    let mut outputs = [Arg::Int(7), Arg::Int(7)];
    let err = f
        .call(&mut stack, &[Arg::Int(1)], &mut outputs)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Arity {
            side: ArgSide::Inputs,
            declared: 2,
            supplied: 1,
            ..
        }
    ));

    let mut short = [Arg::Int(7)];
    let err = f
        .call(&mut stack, &[Arg::Int(1), Arg::Int(2)], &mut short)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Arity {
            side: ArgSide::Outputs,
            declared: 2,
            supplied: 1,
            ..
        }
    ));
    assert_eq!(outputs, [Arg::Int(7), Arg::Int(7)]);
    assert_eq!(short, [Arg::Int(7)]);
    assert_eq!(stack.size(), 0);
}

#[test]
fn missing_functions_are_not_callable() {
    let mut stack = common::loaded();
    let err = TableFunction::<0, 0>::global("nope")
        .call(&mut stack, &[], &mut [])
        .unwrap_err();
    match err {
        Error::NotCallable { name, found } => {
            assert_eq!(name, "nope");
            assert_eq!(found, ValueKind::Nil);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(stack.size(), 0);
}

#[test]
fn unbound_handles_fail() {
    let mut stack = common::loaded();
    let f = TableFunction::<0, 1>::default();
    assert!(!f.is_bound());
    assert_eq!(f.name(), None);
    let err = f.call(&mut stack, &[], &mut [Arg::Int(0)]).unwrap_err();
    assert!(matches!(err, Error::Unbound));
}

#[test]
fn runtime_errors_carry_the_diagnostic() {
    let mut stack = common::loaded();
    let fail = TableFunction::<1, 0>::global("fail");
    let err = fail
        .call(&mut stack, &[Arg::from("boom")], &mut [])
        .unwrap_err();
    match err {
        Error::Call { name, source } => {
            assert_eq!(name, "fail");
            assert_eq!(source.message, "boom");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(stack.size(), 0);
}

#[test]
fn fault_handler_sees_the_failure_first() {
    let mut stack = common::loaded();
    stack
        .run_source("function wrap(m) return 'handled: ' .. m end", "wrap")
        .unwrap();
    stack.request_global("wrap").unwrap();

    let fail = TableFunction::<1, 0>::global("fail").with_fault_handler(TOP);
    let err = fail
        .call(&mut stack, &[Arg::from("boom")], &mut [])
        .unwrap_err();
    let Error::Call { source, .. } = err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(source.message, "handled: boom");
    assert_eq!(stack.size(), 1);
    assert!(stack.has_function(TOP));
}

#[test]
fn mistyped_results_keep_output_payloads() {
    let mut stack = common::loaded();
    let half = TableFunction::<1, 1>::global("half");

    let mut int_out = [Arg::Int(-1)];
    half.call(&mut stack, &[Arg::Int(4)], &mut int_out).unwrap();
    assert_eq!(int_out, [Arg::Int(-1)]);

    let mut double_out = [Arg::Double(0.0)];
    half.call(&mut stack, &[Arg::Int(5)], &mut double_out).unwrap();
    assert_eq!(double_out, [Arg::Double(2.5)]);
    assert_eq!(stack.size(), 0);
}

#[test]
fn strict_mismatch_still_restores_the_stack() {
    let mut stack = common::loaded_strict();
    let half = TableFunction::<1, 1>::global("half");

    let err = half
        .call(&mut stack, &[Arg::Int(4)], &mut [Arg::Str(String::new())])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Stack(lb_stack::Error::TypeMismatch {
            expected: ArgType::Str,
            ..
        })
    ));
    assert_eq!(stack.size(), 0);
}

#[test]
fn arity_is_part_of_the_type() {
    let f = TableFunction::<3, 1>::global("g");
    assert_eq!(f.input_arity(), 3);
    assert_eq!(f.output_arity(), 1);
    assert_eq!(TableFunction::<3, 1>::INPUTS, 3);
    assert_eq!(f.table_name(), None);
}
