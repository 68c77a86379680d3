mod common;

use lb_stack::{Arg, ArgType, Error, TOP, ValueKind};

#[test]
fn args_push_their_own_type() {
    let mut stack = common::fresh();
    for arg in [
        Arg::from("s"),
        Arg::from(7),
        Arg::from(2.5),
        Arg::from(true),
    ] {
        arg.push_to(&mut stack).unwrap();
    }
    assert_eq!(stack.kind(1), ValueKind::String);
    assert_eq!(stack.kind(2), ValueKind::Integer);
    assert_eq!(stack.kind(3), ValueKind::Number);
    assert_eq!(stack.kind(4), ValueKind::Boolean);
}

#[test]
fn matching_values_overwrite_the_payload() {
    let mut stack = common::fresh();
    stack.push_str("hello").unwrap();
    stack.push_integer(9).unwrap();

    let mut s = Arg::placeholder(ArgType::Str);
    let mut i = Arg::placeholder(ArgType::Int);
    assert!(s.fill_from(&stack, 1).unwrap());
    assert!(i.fill_from(&stack, 2).unwrap());
    assert_eq!(s.as_str(), Some("hello"));
    assert_eq!(i.as_int(), Some(9));
}

#[test]
fn double_slots_accept_both_number_subtypes() {
    let mut stack = common::fresh();
    stack.push_integer(4).unwrap();
    stack.push_number(0.25).unwrap();

    let mut d = Arg::Double(-1.0);
    assert!(d.fill_from(&stack, 1).unwrap());
    assert_eq!(d.as_double(), Some(4.0));
    assert!(d.fill_from(&stack, 2).unwrap());
    assert_eq!(d.as_double(), Some(0.25));
}

#[test]
fn mismatches_keep_the_previous_payload() {
    let mut stack = common::fresh();
    stack.push_str("42").unwrap();
    stack.push_integer(42).unwrap();
    stack.push_number(3.0).unwrap();

    let mut int = Arg::Int(-1);
    assert!(!int.fill_from(&stack, 1).unwrap());
    assert!(!int.fill_from(&stack, 3).unwrap());
    assert_eq!(int, Arg::Int(-1));

    let mut s = Arg::Str("keep".into());
    assert!(!s.fill_from(&stack, 2).unwrap());
    assert_eq!(s.as_str(), Some("keep"));

    let mut b = Arg::Bool(true);
    assert!(!b.fill_from(&stack, 2).unwrap());
    assert!(!b.fill_from(&stack, 10).unwrap());
    assert_eq!(b.as_bool(), Some(true));
}

#[test]
fn strict_coercion_reports_mismatches() {
    let mut stack = common::strict();
    stack.push_str("x").unwrap();

    let mut int = Arg::Int(5);
    let err = int.fill_from(&stack, TOP).unwrap_err();
    assert!(matches!(
        err,
        Error::TypeMismatch {
            index: -1,
            expected: ArgType::Int,
            found: ValueKind::String
        }
    ));
    assert_eq!(int, Arg::Int(5));
}

#[test]
fn tags_and_accessors_agree() {
    let arg = Arg::from(String::from("t"));
    assert_eq!(arg.arg_type(), ArgType::Str);
    assert_eq!(arg.as_int(), None);
    assert_eq!(Arg::from(ArgType::Bool), Arg::Bool(false));
    assert_eq!(Arg::from(1.5f32).arg_type(), ArgType::Double);
}

#[test]
fn display_renders_payloads() {
    assert_eq!(Arg::Int(-7).to_string(), "-7");
    assert_eq!(Arg::Double(1.5).to_string(), "1.5");
    assert_eq!(Arg::Bool(false).to_string(), "false");
    assert_eq!(Arg::Str("plain".into()).to_string(), "plain");
    assert_eq!(ArgType::Double.to_string(), "double");
}
