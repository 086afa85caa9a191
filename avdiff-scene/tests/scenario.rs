use std::collections::BTreeSet;

use avdiff_logic::{Assignment, Scalar, Term};
use avdiff_scene::{
    Capability, ObjectKind, Preset, Scenario, ScenarioConfig, ScenarioModel, Value,
};

fn crosswalk() -> Scenario {
    Scenario::from_preset(Preset::Crosswalk, ScenarioConfig::default())
}

fn concrete_crosswalk_scene() -> Assignment {
    let r = Scalar::Real;
    [
        ("lane_left_width", r(2.0)),
        ("lane_right_width", r(2.0)),
        ("road_left_width", r(5.0)),
        ("road_right_width", r(5.0)),
        ("vehicle_ego_pos_l", r(0.0)),
        ("vehicle_ego_pos_s", r(0.0)),
        ("vehicle_ego_size_l", r(2.0)),
        ("vehicle_ego_size_s", r(2.0)),
        ("vehicle_ego_v_l", r(0.0)),
        ("vehicle_ego_v_s", r(1.0)),
        ("destination_pos_l", r(0.0)),
        ("destination_pos_s", r(100.0)),
        ("destination_size_l", r(2.0)),
        ("destination_size_s", r(2.0)),
        ("crosswalk_0_pos_l", r(0.0)),
        ("crosswalk_0_pos_s", r(20.0)),
        ("crosswalk_0_size_l", r(6.0)),
        ("crosswalk_0_size_s", r(2.0)),
        ("pedestrian_0_pos_l", r(-3.0)),
        ("pedestrian_0_pos_s", r(20.0)),
        ("pedestrian_0_size_l", r(0.5)),
        ("pedestrian_0_size_s", r(0.5)),
        ("pedestrian_0_v_l", r(1.0)),
        ("pedestrian_0_v_s", r(1.0)),
        ("vehicle_0_pos_l", r(4.0)),
        ("vehicle_0_pos_s", r(30.0)),
        ("vehicle_0_size_l", r(2.0)),
        ("vehicle_0_size_s", r(2.0)),
        ("vehicle_0_v_l", r(0.0)),
        ("vehicle_0_v_s", r(3.0)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

#[test]
fn crosswalk_preset_installs_its_objects() {
    let s = crosswalk();
    let names: Vec<_> = s.objects().iter().map(|o| o.name.as_str()).collect();
    assert_eq!(
        names,
        ["vehicle_ego", "destination", "crosswalk_0", "pedestrian_0", "vehicle_0"]
    );
    assert_eq!(s.ego().kind, ObjectKind::Vehicle);
    assert_eq!(s.first_of(ObjectKind::Vehicle).map(|o| o.name.as_str()), Some("vehicle_0"));
    assert!(s.has(Capability::Crosswalk));
    assert!(!s.has(Capability::Intersection));
}

#[test]
fn full_preset_shares_one_other_vehicle() {
    let s = Scenario::from_preset(Preset::Full, ScenarioConfig::default());
    let vehicles = s
        .objects()
        .iter()
        .filter(|o| o.kind == ObjectKind::Vehicle)
        .count();
    assert_eq!(vehicles, 2);
    for name in ["traffic_light_self", "traffic_light_main", "stop_sign_0", "intersection"] {
        assert!(s.object(name).is_some(), "missing {name}");
    }
}

#[test]
fn symbol_names_are_unique_and_dotted() {
    let vars = Scenario::from_preset(Preset::Full, ScenarioConfig::default()).variables();
    let mut seen = BTreeSet::new();
    for (name, _) in &vars {
        assert!(seen.insert(name.clone()), "duplicate symbol {name}");
    }
    for name in [
        "ego_vehicle",
        "vehicle_ego.pos.l",
        "vehicle_ego.trajectory",
        "vehicle_ego.lane.turn",
        "pedestrian_0.boundary",
        "traffic_light_self.color",
        "stop_sign_0.lane",
        "road_boundary",
        "max_stop_deceleration",
    ] {
        assert!(seen.contains(name), "missing symbol {name}");
    }

    let lookup = |n: &str| vars.iter().find(|(k, _)| k == n).map(|(_, v)| v.clone());
    assert!(matches!(lookup("vehicle_ego.trajectory"), Some(Value::Line(_))));
    assert!(matches!(lookup("stop_sign_0.lane"), Some(Value::Lane(_))));
    assert_eq!(
        lookup("vehicle_ego.pos.l"),
        Some(Value::Term(Term::real("vehicle_ego_pos_l")))
    );
}

#[test]
fn variables_and_invariants_are_restartable() {
    let s = crosswalk();
    assert_eq!(s.variables(), s.variables());
    assert_eq!(s.invariants(), s.invariants());
}

#[test]
fn concrete_scene_satisfies_every_invariant() {
    let env = concrete_crosswalk_scene();
    for inv in crosswalk().invariants() {
        assert_eq!(inv.holds(&env), Ok(true), "violated: {inv}");
    }
}

#[test]
fn crosswalk_beyond_fifty_metres_is_rejected() {
    let mut env = concrete_crosswalk_scene();
    env.insert("crosswalk_0_pos_s".into(), Scalar::Real(50.0));
    let failed = crosswalk()
        .invariants()
        .into_iter()
        .filter(|inv| inv.holds(&env) != Ok(true))
        .count();
    assert_eq!(failed, 1);
}

#[test]
fn intersection_bounds_every_vehicle_way() {
    let config = ScenarioConfig {
        way_num: 3,
        ..ScenarioConfig::default()
    };
    let s = Scenario::from_preset(Preset::Intersection, config);
    let text: Vec<String> = s.invariants().iter().map(Term::to_string).collect();
    assert!(text.contains(&"(= vehicle_ego_lane_way_id 0)".to_string()));
    assert!(text.contains(&"(and (>= vehicle_0_lane_way_id 0) (< vehicle_0_lane_way_id 3))".to_string()));
    assert!(text.contains(&"(and (>= vehicle_ego_lane_way_id 0) (< vehicle_ego_lane_way_id 3))".to_string()));
}

#[test]
fn presets_parse_from_cli_spellings() {
    assert_eq!("traffic-light".parse::<Preset>(), Ok(Preset::TrafficLight));
    assert_eq!("stop_sign".parse::<Preset>(), Ok(Preset::StopSign));
    assert!("roundabout".parse::<Preset>().unwrap_err().contains("crosswalk"));
}
