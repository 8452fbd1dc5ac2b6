//! End-to-end scenarios against the public `evaluate` entry point.

use unitexpr::{evaluate, EvalError, Kind, Quantity, Resolver, Scalar, Value};

struct FixedPosition;

impl Resolver for FixedPosition {
    fn lookup(&self, name: &str) -> Option<Value> {
        match name {
            "position" => Some(Value::Scalar(Scalar::new(
                100.0,
                Quantity::new(0, 1, 0, 0, 0, 0, 0),
                Kind::Absolute,
            ))),
            _ => None,
        }
    }
}

fn scalar_of(value: Value) -> Scalar {
    value.as_scalar().expect("expected a scalar result")
}

#[test]
fn scenario_1_compound_unit_literal() {
    let result = evaluate("3[kg.m/s2]", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 3.0).abs() < 1e-12);
    let newton = Quantity::new(0, 1, 1, 0, 0, 0, 0).div(Quantity::new(2, 0, 0, 0, 0, 0, 0));
    assert_eq!(s.quantity(), newton);
}

#[test]
fn scenario_2_comparing_mismatched_dimensions_is_an_error() {
    let err = evaluate("12[m/s] > 7[m]", None, None).unwrap_err();
    assert!(matches!(err, EvalError::DimensionMismatch { .. }));
}

#[test]
fn scenario_3_false_condition_skips_then_branch() {
    let result = evaluate("(2>3) ? 5 : 1+100", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 101.0).abs() < 1e-12);
    assert!(s.is_dimensionless());
}

#[test]
fn scenario_4_constant_call_syntax() {
    let result = evaluate("PI()/PI()", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 1.0).abs() < 1e-12);
    assert!(s.is_dimensionless());
}

#[test]
fn scenario_5_mixed_literal_and_unit_arithmetic() {
    let result = evaluate("5*2[s]/5[s]", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 2.0).abs() < 1e-12);
    assert!(s.is_dimensionless());
}

#[test]
fn scenario_6_bare_trailing_exponent_does_not_merge_across_letters() {
    let result = evaluate("12[ms-1] / 123[/s]", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 12.0 / 123.0).abs() < 1e-9);
    assert_eq!(s.quantity(), Quantity::new(0, 1, 0, 0, 0, 0, 0));
}

#[test]
fn scenario_7_absolute_minus_absolute_is_relative() {
    let result = evaluate("position - position", Some(&FixedPosition), None).unwrap();
    let s = scalar_of(result);
    assert_eq!(s.kind(), Kind::Relative);
    assert!((s.si() - 0.0).abs() < 1e-12);
    assert_eq!(s.quantity(), Quantity::new(0, 1, 0, 0, 0, 0, 0));
}

#[test]
fn scenario_8_absolute_plus_absolute_is_rejected() {
    let err = evaluate("position + position", Some(&FixedPosition), None).unwrap_err();
    assert!(matches!(err, EvalError::AbsoluteOperation(_)));
}

#[test]
fn comparing_scalars_of_mismatched_quantity_with_eq_is_an_error() {
    let err = evaluate("5[m] == 5[s]", None, None).unwrap_err();
    assert!(matches!(err, EvalError::DimensionMismatch { .. }));
}

#[test]
fn scenario_9_boolean_and_scalar_never_compare_equal() {
    let result = evaluate("TRUE() == 5", None, None).unwrap();
    assert_eq!(result.as_boolean(), Some(false));
}

#[test]
fn scenario_10_trailing_bang_is_a_bad_operator_not_trailing_garbage() {
    let err = evaluate("3 == 5!", None, None).unwrap_err();
    assert!(matches!(err, EvalError::BadOperator { .. }));
}

#[test]
fn property_whitespace_is_insignificant_outside_unit_brackets() {
    let tight = evaluate("1[m]+2[m]", None, None).unwrap();
    let padded = evaluate("  1[m]   +   2[m]  ", None, None).unwrap();
    assert!(tight.value_eq(padded, 0).unwrap());
}

#[test]
fn property_precedence_and_associativity() {
    let a = evaluate("2+3*4", None, None).unwrap();
    let b = evaluate("2+(3*4)", None, None).unwrap();
    assert!(a.value_eq(b, 0).unwrap());

    let c = evaluate("10-3-2", None, None).unwrap();
    let d = evaluate("(10-3)-2", None, None).unwrap();
    assert!(c.value_eq(d, 0).unwrap());

    let e = evaluate("2^3^2", None, None).unwrap();
    let f = evaluate("2^(3^2)", None, None).unwrap();
    assert!(e.value_eq(f, 0).unwrap());
}

#[test]
fn property_short_circuit_true_branch_skips_undefined_else() {
    let result = evaluate("TRUE() ? 1 : undefined_var", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 1.0).abs() < 1e-12);
}

#[test]
fn property_short_circuit_false_branch_skips_undefined_then() {
    let result = evaluate("FALSE() ? undefined_var : 2", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 2.0).abs() < 1e-12);
}

#[test]
fn property_short_circuit_does_not_skip_the_taken_branch() {
    let err = evaluate("TRUE() ? (undefined_func(1)) : 0", None, None).unwrap_err();
    assert!(matches!(err, EvalError::UnknownFunction { .. }));
}

#[test]
fn property_nested_ternary_in_skipped_branch_is_fully_skipped() {
    let result = evaluate("FALSE() ? (nope ? 1 : 2) : 3", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 3.0).abs() < 1e-12);
}

#[test]
fn property_ternary_inside_parens_still_parses_following_operator() {
    let result = evaluate("(TRUE() ? 1 : undefined_var)+1", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 2.0).abs() < 1e-12);
}

#[test]
fn property_right_associative_else_chain() {
    let result = evaluate("FALSE() ? 1 : FALSE() ? 2 : 3", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 3.0).abs() < 1e-12);
}

#[test]
fn property_dimensional_closure_under_addition() {
    for unit in ["m", "s", "kg", "mm", "km", "N", "Hz"] {
        let expr = format!("1[{unit}] + 1[{unit}]");
        let sum = evaluate(&expr, None, None).unwrap();
        let single = evaluate(&format!("1[{unit}]"), None, None).unwrap();
        assert_eq!(
            scalar_of(sum).quantity(),
            scalar_of(single).quantity(),
            "unit {unit} did not preserve its quantity under addition"
        );
    }
}

#[test]
fn property_multiplication_sums_quantity_exponents() {
    let result = evaluate("2[m] * 3[s]", None, None).unwrap();
    let s = scalar_of(result);
    assert_eq!(s.quantity(), Quantity::new(1, 1, 0, 0, 0, 0, 0));
    assert!((s.si() - 6.0).abs() < 1e-12);
}

#[test]
fn property_dimensionless_gate_on_transcendental_functions() {
    let err = evaluate("sin(1[m])", None, None).unwrap_err();
    assert!(matches!(err, EvalError::DimensionMismatch { .. }));

    let result = evaluate("sin(1)", None, None).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 1.0_f64.sin()).abs() < 1e-12);
}

#[test]
fn unary_bang_distinguishes_from_not_equal() {
    let result = evaluate("!(1==2)", None, None).unwrap();
    assert_eq!(result.as_boolean(), Some(true));

    let result = evaluate("1!=2", None, None).unwrap();
    assert_eq!(result.as_boolean(), Some(true));
}

#[test]
fn lone_ampersand_and_pipe_are_bad_operators() {
    assert!(matches!(
        evaluate("1 & 2", None, None).unwrap_err(),
        EvalError::BadOperator { .. }
    ));
    assert!(matches!(
        evaluate("1 | 2", None, None).unwrap_err(),
        EvalError::BadOperator { .. }
    ));
    assert!(matches!(
        evaluate("1 = 2", None, None).unwrap_err(),
        EvalError::BadOperator { .. }
    ));
}

#[test]
fn custom_unit_parser_is_consulted_after_the_built_in_table() {
    struct Furlongs;
    impl unitexpr::UnitParser for Furlongs {
        fn parse(&self, value: f64, unit: &str) -> Option<Scalar> {
            if unit == "furlong" {
                Some(Scalar::new(
                    value * 201.168,
                    Quantity::new(0, 1, 0, 0, 0, 0, 0),
                    Kind::Relative,
                ))
            } else {
                None
            }
        }
    }

    let result = evaluate("2[furlong]", None, Some(&Furlongs)).unwrap();
    let s = scalar_of(result);
    assert!((s.si() - 402.336).abs() < 1e-9);

    let err = evaluate("2[parsec]", None, Some(&Furlongs)).unwrap_err();
    assert!(matches!(err, EvalError::UnknownUnit { .. }));
}

#[test]
fn missing_variable_without_resolver_is_unresolved_name() {
    let err = evaluate("unknown_thing + 1", None, None).unwrap_err();
    assert!(matches!(err, EvalError::UnresolvedName { .. }));
}

#[test]
fn wrong_arity_is_distinguished_from_unknown_function() {
    let err = evaluate("sin(1, 2)", None, None).unwrap_err();
    assert!(matches!(err, EvalError::WrongArity { .. }));

    let err = evaluate("frobnicate(1)", None, None).unwrap_err();
    assert!(matches!(err, EvalError::UnknownFunction { .. }));
}

#[test]
fn unclosed_paren_and_bracket_are_reported() {
    assert!(matches!(
        evaluate("(1+2", None, None).unwrap_err(),
        EvalError::MissingCloseParen(_)
    ));
    assert!(matches!(
        evaluate("1[m", None, None).unwrap_err(),
        EvalError::MissingCloseBracket(_)
    ));
}

#[test]
fn missing_colon_in_a_taken_conditional_is_reported() {
    let err = evaluate("TRUE() ? 1", None, None).unwrap_err();
    assert!(matches!(err, EvalError::MissingColon(_)));
}

#[test]
fn a_literal_with_two_dots_is_a_bad_number_not_trailing_garbage() {
    let err = evaluate("1.2.3", None, None).unwrap_err();
    assert!(matches!(err, EvalError::BadNumber(0)));
}
