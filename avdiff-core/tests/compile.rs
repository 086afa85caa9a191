use avdiff_ast::{Color, Direction, Operator};
use avdiff_core::{
    CompileError, LowerError, Space, SpaceRegistry, color_formula, compile_source,
    direction_formula,
};
use avdiff_logic::{Assignment, NameSupply, Rational, Scalar, Term};
use avdiff_parse::ParseError;
use avdiff_scene::{Preset, Scenario, ScenarioConfig, ScenarioModel, Value};
use proptest::prelude::*;

fn toy_registry() -> SpaceRegistry {
    let mut reg = SpaceRegistry::new();
    reg.define(Space::Model, "x", Value::Term(Term::real("x")));
    reg.define(Space::Model, "p", Value::Term(Term::bool_const("p")));
    reg
}

fn scene_registry(preset: Preset) -> SpaceRegistry {
    let mut reg = SpaceRegistry::new();
    for (name, value) in Scenario::from_preset(preset, ScenarioConfig::default()).variables() {
        reg.define(Space::Model, name, value);
    }
    reg
}

#[test]
fn nested_policy_lowers_to_one_formula() {
    let reg = toy_registry();
    let f = compile_source("and(>=(x, 10), or(p, <(x, 0.5)))", &reg, &mut NameSupply::new())
        .expect("compile");
    assert_eq!(f.to_string(), "(and (>= x 10) (or p (< x (/ 1.0 2.0))))");
}

#[test]
fn decimal_literals_are_exact() {
    let reg = toy_registry();
    let f = compile_source("==(x, 2.50)", &reg, &mut NameSupply::new()).unwrap();
    assert_eq!(
        f,
        Term::real("x").eq(Term::RealLit(Rational::new(5, 2).unwrap()))
    );
}

#[test]
fn wide_literals_keep_every_digit() {
    let reg = toy_registry();
    let at = |x: f64| Assignment::from([("x".to_string(), Scalar::Real(x))]);

    let f = compile_source("<(x, 9999999999999999999999999)", &reg, &mut NameSupply::new())
        .expect("25-digit integer");
    assert_eq!(f.to_string(), "(< x 9999999999999999999999999)");
    assert!(f.holds(&at(5.0)).unwrap());

    let tiny = "0.00000000000000000001";
    let f = compile_source(&format!("<(x, {tiny})"), &reg, &mut NameSupply::new())
        .expect("20 fraction digits");
    assert_eq!(
        f,
        Term::real("x").lt(Term::RealLit(Rational::from_decimal(tiny).unwrap()))
    );
    assert!(f.holds(&at(0.0)).unwrap());
    assert!(!f.holds(&at(1.0)).unwrap());
}

#[test]
fn not_equal_negates_equality() {
    let reg = toy_registry();
    let f = compile_source("!=(p, True)", &reg, &mut NameSupply::new()).unwrap();
    assert_eq!(f, Term::bool_const("p").eq(Term::bool(true)).not());
}

#[test]
fn type_mismatch_names_the_operator() {
    let reg = toy_registry();
    let err = compile_source("and(x, p)", &reg, &mut NameSupply::new()).unwrap_err();
    match &err {
        CompileError::Lower(LowerError::TypeMismatch { op, message, .. }) => {
            assert_eq!(*op, Operator::And);
            assert!(message.contains("expected a boolean"), "{message}");
        }
        other => panic!("expected a type mismatch, got {other:?}"),
    }
    assert!(err.to_string().contains("'and'"));
}

#[test]
fn wrong_arity_is_a_type_mismatch() {
    let reg = toy_registry();
    let err = compile_source("not(p, p)", &reg, &mut NameSupply::new()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Lower(LowerError::TypeMismatch { op: Operator::Not, .. })
    ));
}

#[test]
fn arithmetic_root_is_not_a_formula() {
    let reg = toy_registry();
    let err = compile_source("+(x, 1)", &reg, &mut NameSupply::new()).unwrap_err();
    assert!(matches!(err, CompileError::Lower(LowerError::NotAFormula { .. })));
}

#[test]
fn unresolved_symbol_fails_before_any_formula_is_built() {
    let reg = scene_registry(Preset::Crosswalk);
    let mut names = NameSupply::new();
    let err = compile_source(
        "and(cross(vehicle_ego.trajectory, pedestrian_0.trajectory), >(ghost.pos.s, 0))",
        &reg,
        &mut names,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CompileError::Parse(ParseError::UnresolvedSymbol { ref name, .. }) if name == "ghost.pos.s"
    ));
    assert_eq!(names.issued(), 0);
}

#[test]
fn unbalanced_policy_never_reaches_lowering() {
    let reg = toy_registry();
    let err = compile_source("and(>=(x,10)", &reg, &mut NameSupply::new()).unwrap_err();
    assert!(matches!(err, CompileError::Parse(ParseError::Syntax { .. })));
}

#[test]
fn spatial_operators_over_scene_objects() {
    let reg = scene_registry(Preset::Crosswalk);
    let mut names = NameSupply::new();

    let f = compile_source("in(pedestrian_0.pos, crosswalk_0.boundary)", &reg, &mut names).unwrap();
    assert!(matches!(f, Term::Exists(..)));

    let f = compile_source("in(vehicle_ego.trajectory, road_boundary)", &reg, &mut names).unwrap();
    assert!(matches!(f, Term::ForAll(..)));

    let f = compile_source("cross(crosswalk_0.boundary, vehicle_0.trajectory)", &reg, &mut names)
        .unwrap();
    assert!(matches!(f, Term::Exists(..)));

    let f = compile_source("st_cross(ego_vehicle, pedestrian_0)", &reg, &mut names).unwrap();
    assert!(!f.is_quantifier_free());
    assert_eq!(names.issued(), 4);
}

#[test]
fn traffic_light_and_lane_macros() {
    let reg = scene_registry(Preset::TrafficLight);
    let mut names = NameSupply::new();
    let f = compile_source(
        "and(is_color(traffic_light_self, yellow), is_direction(vehicle_ego.lane, left))",
        &reg,
        &mut names,
    )
    .unwrap();
    assert_eq!(
        f.to_string(),
        "(and (= traffic_light_self_color 1) (< vehicle_ego_lane_turn 0))"
    );

    let f = compile_source("is_color(traffic_light_main.color, green)", &reg, &mut names).unwrap();
    assert_eq!(f.to_string(), "(> traffic_light_main_color 1)");
}

#[test]
fn macro_outside_its_operator_is_rejected() {
    let reg = toy_registry();
    let err = compile_source("==(x, red)", &reg, &mut NameSupply::new()).unwrap_err();
    assert!(matches!(err, CompileError::Lower(LowerError::TypeMismatch { op: Operator::Eq, .. })));
}

/// Which of `all` make `f` hold.
fn holding<T: Copy>(all: &[T], f: impl Fn(T) -> Term) -> Vec<T> {
    let env = Assignment::new();
    all.iter()
        .copied()
        .filter(|c| f(*c).holds(&env).expect("ground formula"))
        .collect()
}

#[test]
fn color_boundaries() {
    let one = Term::ratio(1, 1);
    let zero = Term::ratio(0, 1);
    let colors = |v: Term| holding(&Color::ALL, move |c| color_formula(v.clone(), c));
    assert_eq!(colors(one), vec![Color::Yellow]);
    assert_eq!(colors(zero), vec![Color::Unknown]);
    assert_eq!(colors(Term::ratio(1, 2)), vec![Color::Red]);
}

proptest! {
    #[test]
    fn is_color_partitions_the_real_line(hundredths in -100_000i64..100_000) {
        let v = Term::ratio(hundredths, 100);
        let hits = holding(&Color::ALL, |c| color_formula(v.clone(), c));
        prop_assert_eq!(hits.len(), 1, "value {} matched {:?}", hundredths, hits);
    }

    #[test]
    fn is_direction_partitions_by_sign(turn in -1_000i64..1_000) {
        let t = Term::int(turn);
        let hits = holding(&Direction::ALL, |d| direction_formula(t.clone(), d));
        prop_assert_eq!(hits.len(), 1);
        if turn == 0 {
            prop_assert_eq!(hits[0], Direction::Straight);
        }
    }
}
