#![forbid(unsafe_code)]

//! Road-frame geometry: `l` is lateral offset, `s` is distance along the road.
//!
//! Lines and areas are point-set predicates. The relation predicates
//! quantify over a fresh point drawn from the run's [`NameSupply`].

use std::fmt;

use avdiff_logic::{NameSupply, Sort, Term};

#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub l: Term,
    pub s: Term,
}

impl Point {
    pub fn new(l: Term, s: Term) -> Self {
        Self { l, s }
    }

    /// Two real constants `<prefix>_l` and `<prefix>_s`.
    pub fn named(prefix: &str) -> Self {
        Self::new(
            Term::real(format!("{prefix}_l")),
            Term::real(format!("{prefix}_s")),
        )
    }

    pub fn square_distance(&self, l: &Term, s: &Term) -> Term {
        (l.clone() - self.l.clone()).square() + (s.clone() - self.s.clone()).square()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Line {
    Segment { from: Point, to: Point },
    Ray { origin: Point, dir: Point },
    LimitedRay { origin: Point, dir: Point, length: Term },
    /// Ray from `origin` along `v`, cut off at the distance covered in `horizon` seconds.
    Trajectory { origin: Point, v: Point, horizon: Term },
}

fn on_ray(origin: &Point, dir: &Point, l: &Term, s: &Term) -> Vec<Term> {
    let ds = s.clone() - origin.s.clone();
    let dl = l.clone() - origin.l.clone();
    vec![
        (dir.l.clone() * ds.clone()).eq(dir.s.clone() * dl.clone()),
        (dir.s.clone() * ds).ge(Term::int(0)),
        (dir.l.clone() * dl).ge(Term::int(0)),
    ]
}

impl Line {
    pub fn contains(&self, l: &Term, s: &Term) -> Term {
        match self {
            Line::Segment { from, to } => {
                let collinear = ((to.s.clone() - from.s.clone()) * (to.l.clone() - l.clone()))
                    .eq((to.s.clone() - s.clone()) * (to.l.clone() - from.l.clone()));
                let between = Term::or(vec![
                    Term::and(vec![l.clone().le(to.l.clone()), l.clone().ge(from.l.clone())]),
                    Term::and(vec![l.clone().ge(to.l.clone()), l.clone().le(from.l.clone())]),
                ]);
                Term::and(vec![collinear, between])
            }
            Line::Ray { origin, dir } => Term::and(on_ray(origin, dir, l, s)),
            Line::LimitedRay {
                origin,
                dir,
                length,
            } => {
                let mut parts = vec![origin.square_distance(l, s).le(length.clone().square())];
                parts.extend(on_ray(origin, dir, l, s));
                Term::and(parts)
            }
            Line::Trajectory { origin, v, horizon } => {
                let reach = (v.l.clone() * horizon.clone()).square()
                    + (v.s.clone() * horizon.clone()).square();
                let mut parts = vec![origin.square_distance(l, s).le(reach)];
                parts.extend(on_ray(origin, v, l, s));
                Term::and(parts)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Area {
    /// `|l - center.l| <= half.l` and `|s - center.s| <= half.s`.
    Centered { center: Point, half: Point },
    Bounded { start: Point, end: Point },
    /// Everything ahead (`s > 0`) between `-left` and `right`.
    Corridor { left: Term, right: Term },
}

impl Area {
    pub fn contains(&self, l: &Term, s: &Term) -> Term {
        match self {
            Area::Centered { center, half } => {
                let dl = l.clone() - center.l.clone();
                let ds = s.clone() - center.s.clone();
                Term::and(vec![
                    dl.clone().le(half.l.clone()),
                    dl.ge(-half.l.clone()),
                    ds.clone().le(half.s.clone()),
                    ds.ge(-half.s.clone()),
                ])
            }
            Area::Bounded { start, end } => Term::and(vec![
                l.clone().ge(start.l.clone()),
                l.clone().le(end.l.clone()),
                s.clone().ge(start.s.clone()),
                s.clone().le(end.s.clone()),
            ]),
            Area::Corridor { left, right } => Term::and(vec![
                s.clone().gt(Term::int(0)),
                l.clone().ge(-left.clone()),
                l.clone().le(right.clone()),
            ]),
        }
    }
}

/// Fresh bound point for one quantified relation.
fn binder(names: &mut NameSupply) -> (Vec<(String, Sort)>, Term, Term) {
    let base = names.fresh("q");
    let (l, s) = (format!("{base}_l"), format!("{base}_s"));
    let terms = (Term::real(l.clone()), Term::real(s.clone()));
    (vec![(l, Sort::Real), (s, Sort::Real)], terms.0, terms.1)
}

fn exists_point(names: &mut NameSupply, body: impl FnOnce(&Term, &Term) -> Term) -> Term {
    let (vars, l, s) = binder(names);
    Term::exists(vars, body(&l, &s))
}

fn forall_point(names: &mut NameSupply, body: impl FnOnce(&Term, &Term) -> Term) -> Term {
    let (vars, l, s) = binder(names);
    Term::forall(vars, body(&l, &s))
}

pub fn point_on_line(p: &Point, line: &Line, names: &mut NameSupply) -> Term {
    exists_point(names, |l, s| {
        Term::and(vec![
            l.clone().eq(p.l.clone()),
            s.clone().eq(p.s.clone()),
            line.contains(l, s),
        ])
    })
}

pub fn point_in_area(p: &Point, area: &Area, names: &mut NameSupply) -> Term {
    exists_point(names, |l, s| {
        Term::and(vec![
            l.clone().eq(p.l.clone()),
            s.clone().eq(p.s.clone()),
            area.contains(l, s),
        ])
    })
}

pub fn line_in_area(line: &Line, area: &Area, names: &mut NameSupply) -> Term {
    forall_point(names, |l, s| line.contains(l, s).implies(area.contains(l, s)))
}

pub fn area_in_area(inner: &Area, outer: &Area, names: &mut NameSupply) -> Term {
    forall_point(names, |l, s| inner.contains(l, s).implies(outer.contains(l, s)))
}

pub fn lines_cross(a: &Line, b: &Line, names: &mut NameSupply) -> Term {
    exists_point(names, |l, s| Term::and(vec![a.contains(l, s), b.contains(l, s)]))
}

pub fn areas_cross(a: &Area, b: &Area, names: &mut NameSupply) -> Term {
    exists_point(names, |l, s| Term::and(vec![a.contains(l, s), b.contains(l, s)]))
}

pub fn line_cross_area(line: &Line, area: &Area, names: &mut NameSupply) -> Term {
    exists_point(names, |l, s| Term::and(vec![line.contains(l, s), area.contains(l, s)]))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Line,
    Area,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeometryKind::Point => "point",
            GeometryKind::Line => "line",
            GeometryKind::Area => "area",
        })
    }
}

/// Borrowed, kind-tagged geometric operand.
#[derive(Clone, Copy, Debug)]
pub enum Geometry<'a> {
    Point(&'a Point),
    Line(&'a Line),
    Area(&'a Area),
}

impl Geometry<'_> {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Line(_) => GeometryKind::Line,
            Geometry::Area(_) => GeometryKind::Area,
        }
    }
}

/// `inner in outer`. `None` for a kind pair with no containment meaning.
pub fn containment(inner: Geometry<'_>, outer: Geometry<'_>, names: &mut NameSupply) -> Option<Term> {
    match (inner, outer) {
        (Geometry::Point(p), Geometry::Line(l)) => Some(point_on_line(p, l, names)),
        (Geometry::Point(p), Geometry::Area(a)) => Some(point_in_area(p, a, names)),
        (Geometry::Line(l), Geometry::Area(a)) => Some(line_in_area(l, a, names)),
        (Geometry::Area(a), Geometry::Area(b)) => Some(area_in_area(a, b, names)),
        (Geometry::Point(_), Geometry::Point(_))
        | (Geometry::Line(_), Geometry::Point(_))
        | (Geometry::Line(_), Geometry::Line(_))
        | (Geometry::Area(_), Geometry::Point(_))
        | (Geometry::Area(_), Geometry::Line(_)) => None,
    }
}

/// `a cross b`, symmetric for line/area. `None` when points are involved.
pub fn crossing(a: Geometry<'_>, b: Geometry<'_>, names: &mut NameSupply) -> Option<Term> {
    match (a, b) {
        (Geometry::Line(x), Geometry::Line(y)) => Some(lines_cross(x, y, names)),
        (Geometry::Area(x), Geometry::Area(y)) => Some(areas_cross(x, y, names)),
        (Geometry::Line(x), Geometry::Area(y)) | (Geometry::Area(y), Geometry::Line(x)) => {
            Some(line_cross_area(x, y, names))
        }
        (Geometry::Point(_), _) | (_, Geometry::Point(_)) => None,
    }
}
