#![forbid(unsafe_code)]

//! Operator table: one formula builder per DSL operator.

use std::fmt;

use avdiff_ast::{Color, Direction, Macro, Operator};
use avdiff_logic::{NameSupply, Sort, Term};
use avdiff_scene::{Value, geometry, kinematics};

/// A lowered node: a value, or a macro waiting for its operator.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Value(Value),
    Macro(Macro),
}

impl Operand {
    pub fn into_term(self) -> Option<Term> {
        match self {
            Operand::Value(Value::Term(t)) => Some(t),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Operand::Value(v) => v.kind_name(),
            Operand::Macro(Macro::Color(_)) => "color macro".to_string(),
            Operand::Macro(Macro::Direction(_)) => "direction macro".to_string(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{v}"),
            Operand::Macro(m) => write!(f, "{m}"),
        }
    }
}

/// green: `v > 1`, yellow: `v == 1`, red: `0 < v < 1`, unknown: `v <= 0`.
pub fn color_formula(signal: Term, color: Color) -> Term {
    match color {
        Color::Green => signal.gt(Term::int(1)),
        Color::Yellow => signal.eq(Term::int(1)),
        Color::Red => Term::and(vec![
            signal.clone().lt(Term::int(1)),
            signal.gt(Term::int(0)),
        ]),
        Color::Unknown => signal.le(Term::int(0)),
    }
}

/// left: `t < 0`, straight: `t == 0`, right: `t > 0`.
pub fn direction_formula(turn: Term, direction: Direction) -> Term {
    match direction {
        Direction::Left => turn.lt(Term::int(0)),
        Direction::Straight => turn.eq(Term::int(0)),
        Direction::Right => turn.gt(Term::int(0)),
    }
}

fn numeric(arg: &Operand) -> Result<Term, String> {
    match arg {
        Operand::Value(Value::Term(t)) if t.sort().is_numeric() => Ok(t.clone()),
        other => Err(format!("expected a number, found {}", other.describe())),
    }
}

fn boolean(arg: &Operand) -> Result<Term, String> {
    match arg {
        Operand::Value(Value::Term(t)) if t.sort() == Sort::Bool => Ok(t.clone()),
        other => Err(format!("expected a boolean, found {}", other.describe())),
    }
}

fn same_sort_pair(a: &Operand, b: &Operand) -> Result<(Term, Term), String> {
    match (a, b) {
        (Operand::Value(Value::Term(x)), Operand::Value(Value::Term(y)))
            if (x.sort() == Sort::Bool) == (y.sort() == Sort::Bool) =>
        {
            Ok((x.clone(), y.clone()))
        }
        _ => Err(format!(
            "cannot compare {} with {}",
            a.describe(),
            b.describe()
        )),
    }
}

fn geometry_pair<'a>(
    a: &'a Operand,
    b: &'a Operand,
) -> Result<(avdiff_scene::Geometry<'a>, avdiff_scene::Geometry<'a>), String> {
    let as_geo = |o: &'a Operand| match o {
        Operand::Value(v) => v.as_geometry(),
        Operand::Macro(_) => None,
    };
    match (as_geo(a), as_geo(b)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(format!(
            "expected two geometric values, found {} and {}",
            a.describe(),
            b.describe()
        )),
    }
}

fn color_signal(arg: &Operand) -> Result<Term, String> {
    match arg {
        Operand::Value(Value::Object(obj)) => obj
            .color
            .clone()
            .ok_or_else(|| format!("{} object has no color signal", obj.kind)),
        other => numeric(other).map_err(|_| {
            format!(
                "expected a traffic light or a number, found {}",
                other.describe()
            )
        }),
    }
}

fn turn_signal(arg: &Operand) -> Result<Term, String> {
    match arg {
        Operand::Value(Value::Lane(lane)) => Ok(lane.turn.clone()),
        other => numeric(other).map_err(|_| {
            format!("expected a lane or a number, found {}", other.describe())
        }),
    }
}

/// Builds the formula for `op` applied to already-lowered `args`.
/// The error message does not include the operator; callers add it.
pub fn apply(op: Operator, args: &[Operand], names: &mut NameSupply) -> Result<Operand, String> {
    if !op.arity().accepts(args.len()) {
        return Err(format!(
            "expects {} argument(s), found {}",
            op.arity(),
            args.len()
        ));
    }

    let term = match op {
        Operator::And => Term::and(args.iter().map(boolean).collect::<Result<_, _>>()?),
        Operator::Or => Term::or(args.iter().map(boolean).collect::<Result<_, _>>()?),
        Operator::Not => boolean(&args[0])?.not(),

        Operator::Eq => {
            let (a, b) = same_sort_pair(&args[0], &args[1])?;
            a.eq(b)
        }
        Operator::Ne => {
            let (a, b) = same_sort_pair(&args[0], &args[1])?;
            a.ne(b)
        }
        Operator::Lt => numeric(&args[0])?.lt(numeric(&args[1])?),
        Operator::Le => numeric(&args[0])?.le(numeric(&args[1])?),
        Operator::Gt => numeric(&args[0])?.gt(numeric(&args[1])?),
        Operator::Ge => numeric(&args[0])?.ge(numeric(&args[1])?),

        Operator::Add => numeric(&args[0])? + numeric(&args[1])?,
        Operator::Sub if args.len() == 1 => -numeric(&args[0])?,
        Operator::Sub => numeric(&args[0])? - numeric(&args[1])?,
        Operator::Mul => numeric(&args[0])? * numeric(&args[1])?,
        Operator::Div => numeric(&args[0])? / numeric(&args[1])?,
        Operator::Abs => numeric(&args[0])?.abs(),

        Operator::In => {
            let (a, b) = geometry_pair(&args[0], &args[1])?;
            geometry::containment(a, b, names)
                .ok_or_else(|| format!("{} in {} is not supported", a.kind(), b.kind()))?
        }
        Operator::Cross => {
            let (a, b) = geometry_pair(&args[0], &args[1])?;
            geometry::crossing(a, b, names)
                .ok_or_else(|| format!("{} crossing {} is not supported", a.kind(), b.kind()))?
        }

        Operator::IsColor => {
            let signal = color_signal(&args[0])?;
            match &args[1] {
                Operand::Macro(Macro::Color(c)) => color_formula(signal, *c),
                other => return Err(format!("expected a color, found {}", other.describe())),
            }
        }
        Operator::IsDirection => {
            let turn = turn_signal(&args[0])?;
            match &args[1] {
                Operand::Macro(Macro::Direction(d)) => direction_formula(turn, *d),
                other => {
                    return Err(format!("expected a direction, found {}", other.describe()));
                }
            }
        }

        Operator::StCross | Operator::StAbove | Operator::StBelow => {
            let (Some(ego), Some(obs)) = (object(&args[0]), object(&args[1])) else {
                return Err(format!(
                    "expected two objects, found {} and {}",
                    args[0].describe(),
                    args[1].describe()
                ));
            };
            let relation = match op {
                Operator::StCross => kinematics::st_cross,
                Operator::StAbove => kinematics::st_above,
                _ => kinematics::st_below,
            };
            relation(ego, obs, names).ok_or_else(|| {
                format!(
                    "both objects must be moving agents, found {} and {}",
                    ego.kind, obs.kind
                )
            })?
        }
    };
    Ok(Operand::Value(Value::Term(term)))
}

fn object(arg: &Operand) -> Option<&avdiff_scene::SceneObject> {
    match arg {
        Operand::Value(v) => v.as_object(),
        Operand::Macro(_) => None,
    }
}
