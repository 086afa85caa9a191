#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use miette::Diagnostic;
use num_traits::ToPrimitive;
use serde::Serialize;
use thiserror::Error;

use crate::term::{Sort, Term};

/// A decoded ground value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Real(f64),
}

impl Scalar {
    pub fn sort(self) -> Sort {
        match self {
            Scalar::Bool(_) => Sort::Bool,
            Scalar::Int(_) => Sort::Int,
            Scalar::Real(_) => Sort::Real,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            Scalar::Int(n) => Some(n as f64),
            Scalar::Real(x) => Some(x),
            Scalar::Bool(_) => None,
        }
    }
}

/// Free-constant name to value.
pub type Assignment = BTreeMap<String, Scalar>;

#[derive(Debug, Error, Diagnostic, PartialEq)]
pub enum EvalError {
    #[error("constant '{0}' has no value in the assignment")]
    #[diagnostic(code(avdiff::eval))]
    Unbound(String),

    #[error("division by zero")]
    #[diagnostic(code(avdiff::eval))]
    DivisionByZero,

    #[error("quantified terms cannot be evaluated directly")]
    #[diagnostic(code(avdiff::eval))]
    Quantifier,

    #[error("sort mismatch: expected {expected}, found {found}")]
    #[diagnostic(code(avdiff::eval))]
    SortMismatch { expected: Sort, found: Sort },

    #[error("integer overflow")]
    #[diagnostic(code(avdiff::eval))]
    Overflow,
}

impl Term {
    /// Evaluates a ground, quantifier-free term under `env`.
    pub fn eval(&self, env: &Assignment) -> Result<Scalar, EvalError> {
        match self {
            Term::Const(name, _) => env
                .get(name)
                .copied()
                .ok_or_else(|| EvalError::Unbound(name.clone())),
            Term::BoolLit(b) => Ok(Scalar::Bool(*b)),
            // Literals past i64 evaluate as the nearest float.
            Term::IntLit(n) => Ok(n
                .to_i64()
                .map(Scalar::Int)
                .unwrap_or_else(|| Scalar::Real(n.to_f64().unwrap_or(f64::NAN)))),
            Term::RealLit(r) => Ok(Scalar::Real(r.to_f64())),

            Term::Add(a, b) => arith(a.eval(env)?, b.eval(env)?, i64::checked_add, |x, y| x + y),
            Term::Sub(a, b) => arith(a.eval(env)?, b.eval(env)?, i64::checked_sub, |x, y| x - y),
            Term::Mul(a, b) => arith(a.eval(env)?, b.eval(env)?, i64::checked_mul, |x, y| x * y),
            Term::Div(a, b) => {
                let x = num(a.eval(env)?)?;
                let y = num(b.eval(env)?)?;
                if y == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Scalar::Real(x / y))
            }
            Term::Neg(a) => match a.eval(env)? {
                Scalar::Int(n) => n.checked_neg().map(Scalar::Int).ok_or(EvalError::Overflow),
                Scalar::Real(x) => Ok(Scalar::Real(-x)),
                Scalar::Bool(_) => Err(mismatch(Sort::Real, Sort::Bool)),
            },
            Term::Ite(c, a, b) => {
                if truth(c.eval(env)?)? {
                    a.eval(env)
                } else {
                    b.eval(env)
                }
            }

            Term::Eq(a, b) => {
                let (x, y) = (a.eval(env)?, b.eval(env)?);
                match (x, y) {
                    (Scalar::Bool(p), Scalar::Bool(q)) => Ok(Scalar::Bool(p == q)),
                    (Scalar::Int(m), Scalar::Int(n)) => Ok(Scalar::Bool(m == n)),
                    _ => Ok(Scalar::Bool(num(x)? == num(y)?)),
                }
            }
            Term::Lt(a, b) => compare(a, b, env, |x, y| x < y),
            Term::Le(a, b) => compare(a, b, env, |x, y| x <= y),
            Term::Gt(a, b) => compare(a, b, env, |x, y| x > y),
            Term::Ge(a, b) => compare(a, b, env, |x, y| x >= y),

            Term::And(ts) => {
                for t in ts {
                    if !truth(t.eval(env)?)? {
                        return Ok(Scalar::Bool(false));
                    }
                }
                Ok(Scalar::Bool(true))
            }
            Term::Or(ts) => {
                for t in ts {
                    if truth(t.eval(env)?)? {
                        return Ok(Scalar::Bool(true));
                    }
                }
                Ok(Scalar::Bool(false))
            }
            Term::Not(a) => Ok(Scalar::Bool(!truth(a.eval(env)?)?)),
            Term::Implies(a, b) => {
                if truth(a.eval(env)?)? {
                    Ok(Scalar::Bool(truth(b.eval(env)?)?))
                } else {
                    Ok(Scalar::Bool(true))
                }
            }
            Term::ForAll(..) | Term::Exists(..) => Err(EvalError::Quantifier),
        }
    }

    /// Shorthand for boolean terms.
    pub fn holds(&self, env: &Assignment) -> Result<bool, EvalError> {
        truth(self.eval(env)?)
    }
}

fn mismatch(expected: Sort, found: Sort) -> EvalError {
    EvalError::SortMismatch { expected, found }
}

fn truth(v: Scalar) -> Result<bool, EvalError> {
    v.as_bool().ok_or_else(|| mismatch(Sort::Bool, v.sort()))
}

fn num(v: Scalar) -> Result<f64, EvalError> {
    v.as_f64().ok_or_else(|| mismatch(Sort::Real, v.sort()))
}

fn arith(
    x: Scalar,
    y: Scalar,
    int_op: fn(i64, i64) -> Option<i64>,
    real_op: fn(f64, f64) -> f64,
) -> Result<Scalar, EvalError> {
    match (x, y) {
        (Scalar::Int(m), Scalar::Int(n)) => int_op(m, n).map(Scalar::Int).ok_or(EvalError::Overflow),
        _ => Ok(Scalar::Real(real_op(num(x)?, num(y)?))),
    }
}

fn compare(
    a: &Term,
    b: &Term,
    env: &Assignment,
    op: fn(f64, f64) -> bool,
) -> Result<Scalar, EvalError> {
    let x = num(a.eval(env)?)?;
    let y = num(b.eval(env)?)?;
    Ok(Scalar::Bool(op(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, Scalar)]) -> Assignment {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn arithmetic_mixes_ints_and_reals() {
        let t = Term::int_const("n") * Term::int(3) + Term::real("x") / Term::int(4);
        let v = t.eval(&env(&[("n", Scalar::Int(2)), ("x", Scalar::Real(2.0))]));
        assert_eq!(v, Ok(Scalar::Real(6.5)));

        let t = Term::int(7) - Term::int(9);
        assert_eq!(t.eval(&Assignment::new()), Ok(Scalar::Int(-2)));
    }

    #[test]
    fn abs_uses_ite() {
        let t = Term::real("x").abs();
        assert_eq!(t.eval(&env(&[("x", Scalar::Real(-1.5))])), Ok(Scalar::Real(1.5)));
        assert_eq!(t.eval(&env(&[("x", Scalar::Real(0.25))])), Ok(Scalar::Real(0.25)));
    }

    #[test]
    fn errors_are_reported() {
        let e = Assignment::new();
        assert_eq!(Term::real("x").eval(&e), Err(EvalError::Unbound("x".into())));
        assert_eq!((Term::int(1) / Term::int(0)).eval(&e), Err(EvalError::DivisionByZero));
        assert_eq!(
            Term::exists(vec![("q".into(), Sort::Real)], Term::bool(true)).eval(&e),
            Err(EvalError::Quantifier)
        );
        assert!(matches!(
            Term::and(vec![Term::int(1)]).eval(&e),
            Err(EvalError::SortMismatch { .. })
        ));
        assert_eq!((Term::int(i64::MAX) + Term::int(1)).eval(&e), Err(EvalError::Overflow));
    }

    #[test]
    fn wide_integer_literals_evaluate_as_floats() {
        let big = Term::int_digits("1000000000000000000000000").unwrap();
        assert_eq!(big.eval(&Assignment::new()), Ok(Scalar::Real(1e24)));
        let t = Term::real("x").lt(big);
        assert_eq!(t.holds(&env(&[("x", Scalar::Real(5.0))])), Ok(true));
        assert_eq!(Term::int_digits("12").unwrap(), Term::int(12));
        assert_eq!(Term::int_digits("1.5"), None);
    }

    #[test]
    fn boolean_connectives() {
        let p = Term::bool_const("p");
        let q = Term::bool_const("q");
        let e = env(&[("p", Scalar::Bool(true)), ("q", Scalar::Bool(false))]);
        assert_eq!(p.clone().implies(q.clone()).holds(&e), Ok(false));
        assert_eq!(q.clone().implies(p.clone()).holds(&e), Ok(true));
        assert_eq!(Term::or(vec![q.clone(), p.clone()]).holds(&e), Ok(true));
        assert_eq!(p.eq(q.not()).holds(&e), Ok(true));
    }
}
