#![forbid(unsafe_code)]

//! Names the extracted code policy refers to, bound to scenario terms.

use avdiff_logic::{NameSupply, Term};
use avdiff_scene::geometry::areas_cross;
use avdiff_scene::kinematics::st_cross;
use avdiff_scene::{Capability, ObjectKind, Scenario, Value};
use tracing::warn;

/// Symbols for the `code` space and the parameter facts that go to `model`.
#[derive(Clone, Debug, Default)]
pub struct CodeBindings {
    pub symbols: Vec<(String, Value)>,
    pub model_facts: Vec<Term>,
}

impl CodeBindings {
    fn bind(&mut self, name: &str, value: impl Into<Value>) {
        self.symbols.push((name.to_string(), value.into()));
    }

    /// A free real parameter pinned to `value` in the model space.
    fn param(&mut self, name: &str, value: i64) {
        let c = Term::real(name);
        self.model_facts.push(c.clone().eq(Term::int(value)));
        self.bind(name, c);
    }
}

pub fn code_bindings(scenario: &Scenario, names: &mut NameSupply) -> CodeBindings {
    let mut out = CodeBindings::default();
    let ego = scenario.ego();

    if let Some(dest) = scenario.first_of(ObjectKind::Destination) {
        let ds = dest.pos.s.clone() - ego.pos.s.clone();
        let dl = dest.pos.l.clone() - ego.pos.l.clone();
        // Both lateral bounds read `< 10` and `> 10`, so this never holds.
        warn!(
            "binding 'is_near_destination' keeps its unsatisfiable lateral bound \
             (l-diff < 10 and l-diff > 10); it is always false"
        );
        out.bind(
            "is_near_destination",
            Term::and(vec![
                ds.clone().lt(Term::int(10)),
                ds.gt(Term::int(-10)),
                dl.clone().lt(Term::int(10)),
                dl.gt(Term::int(10)),
            ]),
        );
    }
    out.bind("has_passed_destination", Term::bool(false));

    if scenario.has(Capability::Crosswalk) {
        crosswalk_bindings(scenario, names, &mut out);
    }
    if scenario.has(Capability::TrafficLight) {
        traffic_light_bindings(scenario, &mut out);
    }
    out
}

fn crosswalk_bindings(scenario: &Scenario, names: &mut NameSupply, out: &mut CodeBindings) {
    let ego = scenario.ego();
    let (Some(ped), Some(cw)) = (
        scenario.first_of(ObjectKind::Pedestrian),
        scenario.first_of(ObjectKind::Crosswalk),
    ) else {
        return;
    };

    out.bind("end_s_15", ego.end_s());
    out.bind("end_s_17", cw.end_s());
    out.param("min_pass_s_distance_19", 0);
    out.bind("IsPointIn_19", areas_cross(&ped.boundary(), &cw.boundary(), names));
    out.bind("min_24", ped.pos.l.clone().abs());
    out.param("stop_loose_l_distance_28", 6);
    out.param("stop_strict_l_distance_32", 4);
    out.param("stop_strict_l_distance_29", 4);
    if let Some(t) = st_cross(ego, ped, names) {
        out.bind("IsEmpty_26", t);
    }
    out.param("max_stop_deceleration_31", 2);
    out.param("stop_deceleration.addr_12", 1);

    let found = Term::bool_const("FindCrosswalks_3");
    out.model_facts.push(found.clone().eq(Term::bool(true)));
    out.bind("FindCrosswalks_3", found);

    out.bind(
        "IsOnRoad_25",
        areas_cross(&ped.boundary(), scenario.road_boundary(), names),
    );
    out.bind("s_30", ped.pos.s.clone());
    out.bind("start_s_14", ego.start_s());
    out.param("type_13", 3);
}

fn traffic_light_bindings(scenario: &Scenario, out: &mut CodeBindings) {
    let ego = scenario.ego();
    let Some(light) = scenario.object("traffic_light_self") else {
        return;
    };

    out.bind("start_s60_33", light.start_s());
    out.bind("end_s_19", ego.end_s());
    out.bind("end_s_21", light.end_s());
    out.bind("start_s_20", ego.start_s());
    out.bind("color_35", light.clone());
    out.bind(
        "max_stop_deceleration_38",
        Term::int(scenario.config().max_stop_deceleration),
    );
    if let Some(m) = &ego.motion {
        out.bind(
            "GetADCStopDeceleration_37",
            m.velocity.clone() / Term::int(2) / (light.start_s() - ego.end_s()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avdiff_scene::{Preset, ScenarioConfig};

    fn bound<'a>(b: &'a CodeBindings, name: &str) -> Option<&'a Value> {
        b.symbols.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[test]
    fn crosswalk_bindings_pin_parameters_in_model() {
        let s = Scenario::from_preset(Preset::Crosswalk, ScenarioConfig::default());
        let b = code_bindings(&s, &mut NameSupply::new());
        assert!(bound(&b, "IsEmpty_26").is_some());
        assert!(bound(&b, "color_35").is_none());
        assert_eq!(
            bound(&b, "s_30"),
            Some(&Value::Term(Term::real("pedestrian_0_pos_s")))
        );
        assert_eq!(b.model_facts.len(), 8);
        assert!(b
            .model_facts
            .contains(&Term::real("type_13").eq(Term::int(3))));
    }

    #[test]
    fn traffic_light_bindings_expose_the_light_object() {
        let s = Scenario::from_preset(Preset::TrafficLight, ScenarioConfig::default());
        let b = code_bindings(&s, &mut NameSupply::new());
        assert!(matches!(bound(&b, "color_35"), Some(Value::Object(o)) if o.name == "traffic_light_self"));
        assert_eq!(
            bound(&b, "max_stop_deceleration_38"),
            Some(&Value::Term(Term::int(10)))
        );
        assert!(b.model_facts.is_empty());
    }

    #[test]
    fn near_destination_is_kept_unsatisfiable() {
        let s = Scenario::from_preset(Preset::Intersection, ScenarioConfig::default());
        let b = code_bindings(&s, &mut NameSupply::new());
        let Some(Value::Term(Term::And(parts))) = bound(&b, "is_near_destination") else {
            panic!("missing is_near_destination");
        };
        assert_eq!(parts.len(), 4);
        assert!(matches!(parts[3], Term::Gt(..)));
        assert_eq!(bound(&b, "has_passed_destination"), Some(&Value::Term(Term::bool(false))));
    }
}
