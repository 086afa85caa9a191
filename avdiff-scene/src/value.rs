#![forbid(unsafe_code)]

use std::fmt;

use avdiff_logic::{Sort, Term};

use crate::geometry::{Area, Geometry, Line, Point};
use crate::objects::{Lane, SceneObject};

/// Anything a DSL name can denote.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Boolean or numeric term.
    Term(Term),
    Point(Point),
    Line(Line),
    Area(Area),
    Lane(Lane),
    Object(Box<SceneObject>),
}

impl Value {
    pub fn kind_name(&self) -> String {
        match self {
            Value::Term(t) => match t.sort() {
                Sort::Bool => "boolean".to_string(),
                Sort::Int | Sort::Real => "number".to_string(),
            },
            Value::Point(_) => "point".to_string(),
            Value::Line(_) => "line".to_string(),
            Value::Area(_) => "area".to_string(),
            Value::Lane(_) => "lane".to_string(),
            Value::Object(o) => format!("{} object", o.kind),
        }
    }

    pub fn as_term(&self) -> Option<&Term> {
        match self {
            Value::Term(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<Geometry<'_>> {
        match self {
            Value::Point(p) => Some(Geometry::Point(p)),
            Value::Line(l) => Some(Geometry::Line(l)),
            Value::Area(a) => Some(Geometry::Area(a)),
            Value::Term(_) | Value::Lane(_) | Value::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&SceneObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl From<Term> for Value {
    fn from(t: Term) -> Self {
        Value::Term(t)
    }
}

impl From<SceneObject> for Value {
    fn from(o: SceneObject) -> Self {
        Value::Object(Box::new(o))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Term(t) => write!(f, "{t}"),
            Value::Object(o) => f.write_str(&o.name),
            other => f.write_str(&other.kind_name()),
        }
    }
}
