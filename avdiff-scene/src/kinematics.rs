#![forbid(unsafe_code)]

//! Spatio-temporal relations between the ego vehicle and a moving obstacle.
//!
//! The obstacle's path is projected onto the ego's lateral extent: `a` and `b`
//! are the `s` coordinates where it enters and leaves the band
//! `[-(E.size.l + O.size.l), E.size.l + O.size.l]`, compared against the ego's
//! longitudinal window widened by both half-lengths.

use avdiff_logic::{NameSupply, Term};

use crate::geometry::lines_cross;
use crate::objects::{Motion, SceneObject};

struct Band {
    a: Term,
    b: Term,
    lo: Term,
    hi: Term,
}

fn band(ego: &SceneObject, obs: &SceneObject, obs_motion: &Motion) -> Band {
    let reach = ego.size.l.clone() + obs.size.l.clone();
    let slope = |offset: Term| {
        (offset - obs.pos.l.clone()) / obs_motion.v.l.clone() * obs_motion.v.s.clone()
            + obs.pos.s.clone()
    };
    let window = ego.size.s.clone() + obs.size.s.clone();
    Band {
        a: slope(-reach.clone()),
        b: slope(reach),
        lo: ego.pos.s.clone() - window.clone(),
        hi: ego.pos.s.clone() + window,
    }
}

fn relate(
    ego: &SceneObject,
    obs: &SceneObject,
    names: &mut NameSupply,
    timing: impl FnOnce(Band) -> Term,
) -> Option<Term> {
    let ego_motion = ego.motion.as_ref()?;
    let obs_motion = obs.motion.as_ref()?;
    let b = band(ego, obs, obs_motion);
    let paths = lines_cross(&ego_motion.trajectory, &obs_motion.trajectory, names);
    Some(Term::and(vec![timing(b), paths]))
}

/// The obstacle is inside the ego's window while crossing its lane band.
/// `None` unless both objects are mobile.
pub fn st_cross(ego: &SceneObject, obs: &SceneObject, names: &mut NameSupply) -> Option<Term> {
    relate(ego, obs, names, |b| {
        let inside = |x: Term| Term::and(vec![x.clone().ge(b.lo.clone()), x.le(b.hi.clone())]);
        Term::or(vec![inside(b.a.clone()), inside(b.b.clone())])
    })
}

/// Both band crossings happen strictly before the ego's window.
pub fn st_above(ego: &SceneObject, obs: &SceneObject, names: &mut NameSupply) -> Option<Term> {
    relate(ego, obs, names, |b| {
        Term::and(vec![b.a.lt(b.lo.clone()), b.b.lt(b.lo)])
    })
}

/// Both band crossings happen strictly after the ego's window.
pub fn st_below(ego: &SceneObject, obs: &SceneObject, names: &mut NameSupply) -> Option<Term> {
    relate(ego, obs, names, |b| {
        Term::and(vec![b.a.gt(b.hi.clone()), b.b.gt(b.hi)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use avdiff_logic::{Assignment, Scalar};

    fn timing_part(t: Term) -> Term {
        match t {
            Term::And(mut parts) => parts.remove(0),
            other => panic!("unexpected shape {other}"),
        }
    }

    /// Ego 2x2 at the origin; a 0.5x0.5 pedestrian at `(-3, s)` moving `(1, 1)`.
    /// The ego window is `[-2.5, 2.5]` and the band crossings are `s + 0.5`, `s + 5.5`.
    fn scene_at(s: f64) -> Assignment {
        [
            ("vehicle_ego_pos_l", 0.0),
            ("vehicle_ego_pos_s", 0.0),
            ("vehicle_ego_size_l", 2.0),
            ("vehicle_ego_size_s", 2.0),
            ("pedestrian_0_pos_l", -3.0),
            ("pedestrian_0_pos_s", s),
            ("pedestrian_0_size_l", 0.5),
            ("pedestrian_0_size_s", 0.5),
            ("pedestrian_0_v_l", 1.0),
            ("pedestrian_0_v_s", 1.0),
        ]
        .into_iter()
        .map(|(name, x)| (name.to_string(), Scalar::Real(x)))
        .collect()
    }

    /// Which of cross, above and below have their timing conjunct hold.
    fn timing_at(s: f64) -> [bool; 3] {
        let ego = SceneObject::vehicle("ego");
        let ped = SceneObject::pedestrian("0");
        let env = scene_at(s);
        [st_cross, st_above, st_below].map(|f| {
            timing_part(f(&ego, &ped, &mut NameSupply::new()).unwrap())
                .holds(&env)
                .expect("every timing constant is bound")
        })
    }

    #[test]
    fn static_obstacles_have_no_timing() {
        let ego = SceneObject::vehicle("ego");
        let cw = SceneObject::crosswalk("0");
        assert!(st_cross(&ego, &cw, &mut NameSupply::new()).is_none());
    }

    #[test]
    fn every_relation_requires_crossing_paths() {
        let ego = SceneObject::vehicle("ego");
        let ped = SceneObject::pedestrian("0");
        let mut names = NameSupply::new();
        for f in [st_cross, st_above, st_below] {
            let Some(Term::And(parts)) = f(&ego, &ped, &mut names) else {
                panic!("expected a conjunction");
            };
            assert!(matches!(parts.last(), Some(Term::Exists(..))));
        }
        assert_eq!(names.issued(), 3);
    }

    #[test]
    fn windows_use_both_half_lengths() {
        let ego = SceneObject::vehicle("ego");
        let ped = SceneObject::pedestrian("0");
        let above = timing_part(st_above(&ego, &ped, &mut NameSupply::new()).unwrap());
        let text = above.to_string();
        assert!(text.contains("vehicle_ego_size_s"), "{text}");
        assert!(text.contains("pedestrian_0_size_s"), "{text}");
        assert!(text.starts_with("(and (<"), "{text}");
    }

    #[test]
    fn obstacle_past_the_window_is_below() {
        assert_eq!(timing_at(20.0), [false, false, true]);
    }

    #[test]
    fn entry_inside_the_window_is_a_cross() {
        assert_eq!(timing_at(-1.0), [true, false, false]);
    }

    #[test]
    fn window_edges_count_as_crossing() {
        // a == lo and b == hi: inclusive for cross, strict for above and below
        assert_eq!(timing_at(-3.0), [true, false, false]);
        assert_eq!(timing_at(-10.0), [false, true, false]);
    }
}
