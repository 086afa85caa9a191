#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use avdiff_logic::Term;
use serde::Deserialize;
use tracing::debug;

use crate::geometry::Area;
use crate::objects::{ObjectKind, SceneObject};
use crate::value::Value;

/// Source of the `model` space: named values plus domain invariants.
///
/// Both methods may be called any number of times and return the same data.
pub trait ScenarioModel {
    fn variables(&self) -> Vec<(String, Value)>;
    fn invariants(&self) -> Vec<Term>;
}

/// Minimum total widths, in decimetres.
const MIN_LANE_WIDTH_DM: i64 = 33;
const MIN_ROAD_WIDTH_DM: i64 = 99;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Number of ways meeting at an intersection.
    pub way_num: u32,
    pub max_stop_deceleration: i64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            way_num: 4,
            max_stop_deceleration: 10,
        }
    }
}

/// An installable group of objects and invariants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    Crosswalk,
    TrafficLight,
    StopSign,
    Intersection,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[default]
    Crosswalk,
    Intersection,
    #[serde(alias = "traffic_light")]
    TrafficLight,
    #[serde(alias = "stop_sign")]
    StopSign,
    Full,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Crosswalk,
        Preset::Intersection,
        Preset::TrafficLight,
        Preset::StopSign,
        Preset::Full,
    ];

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Preset::Crosswalk => &[Capability::Crosswalk],
            Preset::Intersection => &[Capability::Intersection],
            Preset::TrafficLight => &[Capability::Intersection, Capability::TrafficLight],
            Preset::StopSign => &[Capability::Intersection, Capability::StopSign],
            Preset::Full => &[
                Capability::Crosswalk,
                Capability::StopSign,
                Capability::TrafficLight,
                Capability::Intersection,
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Crosswalk => "crosswalk",
            Preset::Intersection => "intersection",
            Preset::TrafficLight => "traffic-light",
            Preset::StopSign => "stop-sign",
            Preset::Full => "full",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.replace('_', "-");
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Preset::ALL.iter().map(|p| p.as_str()).collect();
                format!("unknown scenario '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Ego vehicle at the origin heading along `s`, a destination, lane and
/// road corridors, plus whatever capabilities were installed.
#[derive(Clone, Debug)]
pub struct Scenario {
    config: ScenarioConfig,
    capabilities: Vec<Capability>,
    objects: Vec<SceneObject>,
    lane_boundary: Area,
    road_boundary: Area,
    constraints: Vec<Term>,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Self {
        let mut ego = SceneObject::vehicle("ego");
        ego.constraints.push(Term::and(vec![
            ego.pos.l.clone().eq(Term::int(0)),
            ego.pos.s.clone().eq(Term::int(0)),
        ]));
        if let Some(m) = &ego.motion {
            let v = m.v.clone();
            ego.constraints.push(Term::and(vec![
                v.l.eq(Term::int(0)),
                v.s.gt(Term::int(0)),
            ]));
        }

        let (lane_left, lane_right) = (
            Term::real("lane_left_width"),
            Term::real("lane_right_width"),
        );
        let (road_left, road_right) = (
            Term::real("road_left_width"),
            Term::real("road_right_width"),
        );
        let constraints = vec![
            Term::and(vec![
                lane_left.clone().gt(Term::int(0)),
                lane_right.clone().gt(Term::int(0)),
                (lane_left.clone() + lane_right.clone())
                    .ge(Term::ratio(MIN_LANE_WIDTH_DM, 10)),
            ]),
            road_left.clone().gt(lane_left.clone()),
            road_right.clone().gt(lane_right.clone()),
            Term::and(vec![
                road_left.clone().gt(Term::int(0)),
                road_right.clone().gt(Term::int(0)),
                (road_left.clone() + road_right.clone())
                    .ge(Term::ratio(MIN_ROAD_WIDTH_DM, 10)),
            ]),
        ];

        Self {
            config,
            capabilities: Vec::new(),
            objects: vec![ego, SceneObject::destination("")],
            lane_boundary: Area::Corridor {
                left: lane_left,
                right: lane_right,
            },
            road_boundary: Area::Corridor {
                left: road_left,
                right: road_right,
            },
            constraints,
        }
    }

    pub fn from_preset(preset: Preset, config: ScenarioConfig) -> Self {
        let mut scenario = Self::new(config);
        for cap in preset.capabilities() {
            scenario.install(*cap);
        }
        scenario
    }

    /// Installing the same capability twice has no further effect.
    pub fn install(&mut self, cap: Capability) -> &mut Self {
        if self.capabilities.contains(&cap) {
            return self;
        }
        debug!(capability = ?cap, "installing scenario capability");
        match cap {
            Capability::Crosswalk => {
                self.add_object(SceneObject::crosswalk("0"));
                self.add_object(SceneObject::pedestrian("0"));
                self.add_object(SceneObject::vehicle("0"));
            }
            Capability::TrafficLight => {
                self.add_object(SceneObject::traffic_light("self"));
                self.add_object(SceneObject::traffic_light("main"));
            }
            Capability::StopSign => {
                self.add_object(SceneObject::stop_sign("0"));
            }
            Capability::Intersection => {
                self.add_object(SceneObject::intersection(""));
                self.add_object(SceneObject::vehicle("0"));
            }
        }
        self.capabilities.push(cap);
        self
    }

    /// Adds `obj`, replacing an object of the same name in place.
    pub fn add_object(&mut self, obj: SceneObject) {
        match self.objects.iter_mut().find(|o| o.name == obj.name) {
            Some(slot) => *slot = obj,
            None => self.objects.push(obj),
        }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn has(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    pub fn ego(&self) -> &SceneObject {
        &self.objects[0]
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// First object of `kind` other than the ego vehicle.
    pub fn first_of(&self, kind: ObjectKind) -> Option<&SceneObject> {
        self.objects.iter().skip(1).find(|o| o.kind == kind)
    }

    pub fn lane_boundary(&self) -> &Area {
        &self.lane_boundary
    }

    pub fn road_boundary(&self) -> &Area {
        &self.road_boundary
    }

    fn capability_invariants(&self, cap: Capability) -> Vec<Term> {
        match cap {
            Capability::Intersection => {
                let mut out = Vec::new();
                if let Some(lane) = &self.ego().lane {
                    out.push(lane.way_id.clone().eq(Term::int(0)));
                }
                let way_num = i64::from(self.config.way_num);
                for v in self.objects.iter().filter(|o| o.kind == ObjectKind::Vehicle) {
                    if let Some(lane) = &v.lane {
                        out.push(Term::and(vec![
                            lane.way_id.clone().ge(Term::int(0)),
                            lane.way_id.clone().lt(Term::int(way_num)),
                        ]));
                    }
                }
                out
            }
            Capability::Crosswalk | Capability::TrafficLight | Capability::StopSign => Vec::new(),
        }
    }
}

fn object_symbols(obj: &SceneObject, out: &mut Vec<(String, Value)>) {
    let n = &obj.name;
    out.push((n.clone(), Value::from(obj.clone())));
    out.push((format!("{n}.pos"), Value::Point(obj.pos.clone())));
    out.push((format!("{n}.pos.l"), Value::Term(obj.pos.l.clone())));
    out.push((format!("{n}.pos.s"), Value::Term(obj.pos.s.clone())));
    out.push((format!("{n}.size"), Value::Point(obj.size.clone())));
    out.push((format!("{n}.size.l"), Value::Term(obj.size.l.clone())));
    out.push((format!("{n}.size.s"), Value::Term(obj.size.s.clone())));
    out.push((format!("{n}.boundary"), Value::Area(obj.boundary())));
    out.push((format!("{n}.start_l"), Value::Term(obj.start_l())));
    out.push((format!("{n}.end_l"), Value::Term(obj.end_l())));
    out.push((format!("{n}.start_s"), Value::Term(obj.start_s())));
    out.push((format!("{n}.end_s"), Value::Term(obj.end_s())));

    if let Some(m) = &obj.motion {
        out.push((format!("{n}.v"), Value::Point(m.v.clone())));
        out.push((format!("{n}.v.l"), Value::Term(m.v.l.clone())));
        out.push((format!("{n}.v.s"), Value::Term(m.v.s.clone())));
        out.push((format!("{n}.velocity"), Value::Term(m.velocity.clone())));
        out.push((format!("{n}.trajectory"), Value::Line(m.trajectory.clone())));
    }
    if let Some(lane) = &obj.lane {
        out.push((format!("{n}.lane"), Value::Lane(lane.clone())));
        out.push((format!("{n}.lane.way_id"), Value::Term(lane.way_id.clone())));
        out.push((format!("{n}.lane.road_id"), Value::Term(lane.road_id.clone())));
        out.push((format!("{n}.lane.lane_id"), Value::Term(lane.lane_id.clone())));
        out.push((format!("{n}.lane.turn"), Value::Term(lane.turn.clone())));
    }
    if let Some(color) = &obj.color {
        out.push((format!("{n}.color"), Value::Term(color.clone())));
    }
    if let Some(t) = &obj.arrive_time {
        out.push((format!("{n}.arrive_time"), Value::Term(t.clone())));
    }
}

impl ScenarioModel for Scenario {
    fn variables(&self) -> Vec<(String, Value)> {
        let mut out = vec![
            ("ego_vehicle".to_string(), Value::from(self.ego().clone())),
            ("lane_boundary".to_string(), Value::Area(self.lane_boundary.clone())),
            ("road_boundary".to_string(), Value::Area(self.road_boundary.clone())),
            (
                "max_stop_deceleration".to_string(),
                Value::Term(Term::int(self.config.max_stop_deceleration)),
            ),
        ];
        for obj in &self.objects {
            object_symbols(obj, &mut out);
        }
        out
    }

    fn invariants(&self) -> Vec<Term> {
        let mut out = self.constraints.clone();
        for obj in &self.objects {
            out.extend(obj.constraints.iter().cloned());
        }
        for cap in &self.capabilities {
            out.extend(self.capability_invariants(*cap));
        }
        out
    }
}
