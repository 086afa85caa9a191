#![forbid(unsafe_code)]

use std::fmt;

use avdiff_logic::Term;

use crate::geometry::{Area, Line, Point};

/// Seconds of motion covered by an agent's trajectory.
pub const TRAJECTORY_HORIZON: i64 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Vehicle,
    Pedestrian,
    Destination,
    Crosswalk,
    TrafficLight,
    StopSign,
    YieldSign,
    Intersection,
}

impl ObjectKind {
    /// Name prefix, also the counterexample label.
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Vehicle => "vehicle",
            ObjectKind::Pedestrian => "pedestrian",
            ObjectKind::Destination => "destination",
            ObjectKind::Crosswalk => "crosswalk",
            ObjectKind::TrafficLight => "traffic_light",
            ObjectKind::StopSign => "stop_sign",
            ObjectKind::YieldSign => "yield_sign",
            ObjectKind::Intersection => "intersection",
        }
    }

    pub fn is_mobile(self) -> bool {
        matches!(self, ObjectKind::Vehicle | ObjectKind::Pedestrian)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lane attributes; `turn` is negative for left, zero straight, positive right.
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
    pub way_id: Term,
    pub road_id: Term,
    pub lane_id: Term,
    pub turn: Term,
}

impl Lane {
    fn named(prefix: &str) -> Self {
        Self {
            way_id: Term::real(format!("{prefix}_way_id")),
            road_id: Term::real(format!("{prefix}_road_id")),
            lane_id: Term::real(format!("{prefix}_lane_id")),
            turn: Term::real(format!("{prefix}_turn")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Motion {
    pub v: Point,
    /// `v.l^2 + v.s^2`
    pub velocity: Term,
    pub trajectory: Line,
}

/// A scenario object. Solver constants are named `<name>_<field>`, where
/// `name` is `<label>` or `<label>_<id>`.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub name: String,
    pub pos: Point,
    /// Half extents.
    pub size: Point,
    pub motion: Option<Motion>,
    pub lane: Option<Lane>,
    pub color: Option<Term>,
    pub arrive_time: Option<Term>,
    pub constraints: Vec<Term>,
}

impl SceneObject {
    fn base(kind: ObjectKind, id: &str) -> Self {
        let name = if id.is_empty() {
            kind.label().to_string()
        } else {
            format!("{}_{id}", kind.label())
        };
        let pos = Point::named(&format!("{name}_pos"));
        let size = Point::named(&format!("{name}_size"));
        let positive = Term::and(vec![
            size.l.clone().gt(Term::int(0)),
            size.s.clone().gt(Term::int(0)),
        ]);
        let motion = kind.is_mobile().then(|| {
            let v = Point::named(&format!("{name}_v"));
            Motion {
                velocity: v.l.clone().square() + v.s.clone().square(),
                trajectory: Line::Trajectory {
                    origin: pos.clone(),
                    v: v.clone(),
                    horizon: Term::int(TRAJECTORY_HORIZON),
                },
                v,
            }
        });
        Self {
            kind,
            pos,
            size,
            motion,
            lane: None,
            color: None,
            arrive_time: None,
            constraints: vec![positive],
            name,
        }
    }

    fn fixed_size(mut self, l: Term, s: Term) -> Self {
        self.constraints.push(Term::and(vec![
            self.size.l.clone().eq(l),
            self.size.s.clone().eq(s),
        ]));
        self
    }

    fn speed_limit(mut self, max: i64) -> Self {
        if let Some(m) = &self.motion {
            self.constraints.push(m.velocity.clone().le(Term::int(max)));
        }
        self
    }

    fn with_lane(mut self) -> Self {
        self.lane = Some(Lane::named(&format!("{}_lane", self.name)));
        self
    }

    pub fn vehicle(id: &str) -> Self {
        let mut v = Self::base(ObjectKind::Vehicle, id)
            .fixed_size(Term::int(2), Term::int(2))
            .speed_limit(80)
            .with_lane();
        v.arrive_time = Some(Term::real(format!("{}_arrive_time", v.name)));
        v
    }

    pub fn pedestrian(id: &str) -> Self {
        Self::base(ObjectKind::Pedestrian, id)
            .fixed_size(Term::ratio(1, 2), Term::ratio(1, 2))
            .speed_limit(5)
    }

    pub fn destination(id: &str) -> Self {
        Self::base(ObjectKind::Destination, id).fixed_size(Term::int(2), Term::int(2))
    }

    pub fn crosswalk(id: &str) -> Self {
        let mut c = Self::base(ObjectKind::Crosswalk, id);
        let (start_l, end_l) = (c.start_l(), c.end_l());
        c.constraints.extend([
            Term::and(vec![
                c.size.s.clone().eq(Term::int(2)),
                c.size.l.clone().ge(Term::int(5)),
            ]),
            Term::and(vec![
                c.pos.s.clone().ge(Term::int(5)),
                c.pos.s.clone().lt(Term::int(50)),
            ]),
            (start_l * end_l).le(Term::int(0)),
        ]);
        c
    }

    pub fn traffic_light(id: &str) -> Self {
        let mut t = Self::base(ObjectKind::TrafficLight, id);
        t.color = Some(Term::real(format!("{}_color", t.name)));
        t
    }

    pub fn stop_sign(id: &str) -> Self {
        Self::base(ObjectKind::StopSign, id).with_lane()
    }

    pub fn yield_sign(id: &str) -> Self {
        Self::base(ObjectKind::YieldSign, id).with_lane()
    }

    pub fn intersection(id: &str) -> Self {
        let mut i = Self::base(ObjectKind::Intersection, id);
        i.constraints.push(Term::and(vec![
            i.size.s.clone().ge(Term::int(10)),
            i.size.l.clone().ge(Term::int(5)),
        ]));
        i
    }

    pub fn start_l(&self) -> Term {
        self.pos.l.clone() - self.size.l.clone()
    }

    pub fn end_l(&self) -> Term {
        self.pos.l.clone() + self.size.l.clone()
    }

    pub fn start_s(&self) -> Term {
        self.pos.s.clone() - self.size.s.clone()
    }

    pub fn end_s(&self) -> Term {
        self.pos.s.clone() + self.size.s.clone()
    }

    pub fn boundary(&self) -> Area {
        Area::Centered {
            center: self.pos.clone(),
            half: self.size.clone(),
        }
    }
}
