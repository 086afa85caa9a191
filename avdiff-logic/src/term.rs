#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops;

use num_bigint::BigInt;

use crate::rational::Rational;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sort {
    Bool,
    Int,
    Real,
}

impl Sort {
    pub fn is_numeric(self) -> bool {
        matches!(self, Sort::Int | Sort::Real)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sort::Bool => "Bool",
            Sort::Int => "Int",
            Sort::Real => "Real",
        })
    }
}

/// Abstract formula or arithmetic term.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// Uninterpreted constant (free, or bound by an enclosing quantifier).
    Const(String, Sort),
    BoolLit(bool),
    IntLit(BigInt),
    RealLit(Rational),

    // Arithmetic
    Add(Box<Term>, Box<Term>),
    Sub(Box<Term>, Box<Term>),
    Mul(Box<Term>, Box<Term>),
    /// Always real division.
    Div(Box<Term>, Box<Term>),
    Neg(Box<Term>),
    Ite(Box<Term>, Box<Term>, Box<Term>),

    // Comparison
    Eq(Box<Term>, Box<Term>),
    Lt(Box<Term>, Box<Term>),
    Le(Box<Term>, Box<Term>),
    Gt(Box<Term>, Box<Term>),
    Ge(Box<Term>, Box<Term>),

    // Boolean logic
    And(Vec<Term>),
    Or(Vec<Term>),
    Not(Box<Term>),
    Implies(Box<Term>, Box<Term>),

    ForAll(Vec<(String, Sort)>, Box<Term>),
    Exists(Vec<(String, Sort)>, Box<Term>),
}

#[allow(clippy::should_implement_trait)]
impl Term {
    pub fn real(name: impl Into<String>) -> Self {
        Term::Const(name.into(), Sort::Real)
    }

    pub fn int_const(name: impl Into<String>) -> Self {
        Term::Const(name.into(), Sort::Int)
    }

    pub fn bool_const(name: impl Into<String>) -> Self {
        Term::Const(name.into(), Sort::Bool)
    }

    pub fn int(n: i64) -> Self {
        Term::IntLit(n.into())
    }

    /// Integer literal from decimal digits of any length.
    pub fn int_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        BigInt::parse_bytes(digits.as_bytes(), 10).map(Term::IntLit)
    }

    pub fn bool(b: bool) -> Self {
        Term::BoolLit(b)
    }

    /// Exact `num/den` literal; a zero denominator is a programming error.
    pub fn ratio(num: i64, den: i64) -> Self {
        Term::RealLit(Rational::new(num, den).expect("literal with zero denominator"))
    }

    pub fn eq(self, other: Term) -> Self {
        Term::Eq(Box::new(self), Box::new(other))
    }

    pub fn ne(self, other: Term) -> Self {
        self.eq(other).not()
    }

    pub fn lt(self, other: Term) -> Self {
        Term::Lt(Box::new(self), Box::new(other))
    }

    pub fn le(self, other: Term) -> Self {
        Term::Le(Box::new(self), Box::new(other))
    }

    pub fn gt(self, other: Term) -> Self {
        Term::Gt(Box::new(self), Box::new(other))
    }

    pub fn ge(self, other: Term) -> Self {
        Term::Ge(Box::new(self), Box::new(other))
    }

    pub fn and(terms: Vec<Term>) -> Self {
        Term::And(terms)
    }

    pub fn or(terms: Vec<Term>) -> Self {
        Term::Or(terms)
    }

    pub fn not(self) -> Self {
        Term::Not(Box::new(self))
    }

    pub fn implies(self, other: Term) -> Self {
        Term::Implies(Box::new(self), Box::new(other))
    }

    pub fn ite(cond: Term, then: Term, els: Term) -> Self {
        Term::Ite(Box::new(cond), Box::new(then), Box::new(els))
    }

    /// `ite(v >= 0, v, -v)`
    pub fn abs(self) -> Self {
        Term::ite(self.clone().ge(Term::int(0)), self.clone(), -self)
    }

    pub fn square(self) -> Self {
        self.clone() * self
    }

    pub fn forall(binders: Vec<(String, Sort)>, body: Term) -> Self {
        Term::ForAll(binders, Box::new(body))
    }

    pub fn exists(binders: Vec<(String, Sort)>, body: Term) -> Self {
        Term::Exists(binders, Box::new(body))
    }

    pub fn as_bool_lit(&self) -> Option<bool> {
        match self {
            Term::BoolLit(b) => Some(*b),
            _ => None,
        }
    }

    /// Mixed int/real arithmetic is real.
    pub fn sort(&self) -> Sort {
        match self {
            Term::Const(_, sort) => *sort,
            Term::BoolLit(_) => Sort::Bool,
            Term::IntLit(_) => Sort::Int,
            Term::RealLit(_) | Term::Div(..) => Sort::Real,
            Term::Add(a, b) | Term::Sub(a, b) | Term::Mul(a, b) => {
                if a.sort() == Sort::Int && b.sort() == Sort::Int {
                    Sort::Int
                } else {
                    Sort::Real
                }
            }
            Term::Neg(a) => a.sort(),
            Term::Ite(_, a, b) => match (a.sort(), b.sort()) {
                (Sort::Int, Sort::Real) | (Sort::Real, Sort::Int) => Sort::Real,
                (s, _) => s,
            },
            Term::Eq(..)
            | Term::Lt(..)
            | Term::Le(..)
            | Term::Gt(..)
            | Term::Ge(..)
            | Term::And(_)
            | Term::Or(_)
            | Term::Not(_)
            | Term::Implies(..)
            | Term::ForAll(..)
            | Term::Exists(..) => Sort::Bool,
        }
    }

    /// Free constants with their sorts, excluding quantifier-bound names.
    pub fn free_consts(&self) -> BTreeMap<String, Sort> {
        let mut out = BTreeMap::new();
        let mut bound = Vec::new();
        self.collect_free(&mut bound, &mut out);
        out
    }

    fn collect_free(&self, bound: &mut Vec<String>, out: &mut BTreeMap<String, Sort>) {
        match self {
            Term::Const(name, sort) => {
                if !bound.iter().any(|b| b == name) {
                    out.insert(name.clone(), *sort);
                }
            }
            Term::BoolLit(_) | Term::IntLit(_) | Term::RealLit(_) => {}
            Term::Neg(a) | Term::Not(a) => a.collect_free(bound, out),
            Term::Add(a, b)
            | Term::Sub(a, b)
            | Term::Mul(a, b)
            | Term::Div(a, b)
            | Term::Eq(a, b)
            | Term::Lt(a, b)
            | Term::Le(a, b)
            | Term::Gt(a, b)
            | Term::Ge(a, b)
            | Term::Implies(a, b) => {
                a.collect_free(bound, out);
                b.collect_free(bound, out);
            }
            Term::Ite(c, a, b) => {
                c.collect_free(bound, out);
                a.collect_free(bound, out);
                b.collect_free(bound, out);
            }
            Term::And(ts) | Term::Or(ts) => {
                for t in ts {
                    t.collect_free(bound, out);
                }
            }
            Term::ForAll(binders, body) | Term::Exists(binders, body) => {
                let depth = bound.len();
                bound.extend(binders.iter().map(|(n, _)| n.clone()));
                body.collect_free(bound, out);
                bound.truncate(depth);
            }
        }
    }

    pub fn is_quantifier_free(&self) -> bool {
        match self {
            Term::ForAll(..) | Term::Exists(..) => false,
            Term::Const(..) | Term::BoolLit(_) | Term::IntLit(_) | Term::RealLit(_) => true,
            Term::Neg(a) | Term::Not(a) => a.is_quantifier_free(),
            Term::Add(a, b)
            | Term::Sub(a, b)
            | Term::Mul(a, b)
            | Term::Div(a, b)
            | Term::Eq(a, b)
            | Term::Lt(a, b)
            | Term::Le(a, b)
            | Term::Gt(a, b)
            | Term::Ge(a, b)
            | Term::Implies(a, b) => a.is_quantifier_free() && b.is_quantifier_free(),
            Term::Ite(c, a, b) => {
                c.is_quantifier_free() && a.is_quantifier_free() && b.is_quantifier_free()
            }
            Term::And(ts) | Term::Or(ts) => ts.iter().all(Term::is_quantifier_free),
        }
    }

    /// Cheap structural cleanup: flattens nested `and`/`or`, folds boolean
    /// constants and double negation. Never changes meaning.
    pub fn simplify(self) -> Term {
        match self {
            Term::And(ts) => {
                let mut out = Vec::with_capacity(ts.len());
                for t in ts {
                    match t.simplify() {
                        Term::BoolLit(true) => {}
                        Term::BoolLit(false) => return Term::BoolLit(false),
                        Term::And(inner) => out.extend(inner),
                        other => out.push(other),
                    }
                }
                match out.len() {
                    0 => Term::BoolLit(true),
                    1 => out.pop().unwrap_or(Term::BoolLit(true)),
                    _ => Term::And(out),
                }
            }
            Term::Or(ts) => {
                let mut out = Vec::with_capacity(ts.len());
                for t in ts {
                    match t.simplify() {
                        Term::BoolLit(false) => {}
                        Term::BoolLit(true) => return Term::BoolLit(true),
                        Term::Or(inner) => out.extend(inner),
                        other => out.push(other),
                    }
                }
                match out.len() {
                    0 => Term::BoolLit(false),
                    1 => out.pop().unwrap_or(Term::BoolLit(false)),
                    _ => Term::Or(out),
                }
            }
            Term::Not(a) => match a.simplify() {
                Term::BoolLit(b) => Term::BoolLit(!b),
                Term::Not(inner) => *inner,
                other => other.not(),
            },
            Term::Implies(a, b) => match (a.simplify(), b.simplify()) {
                (Term::BoolLit(false), _) | (_, Term::BoolLit(true)) => Term::BoolLit(true),
                (Term::BoolLit(true), b) => b,
                (a, b) => a.implies(b),
            },
            Term::Ite(c, a, b) => match c.simplify() {
                Term::BoolLit(true) => a.simplify(),
                Term::BoolLit(false) => b.simplify(),
                c => Term::ite(c, a.simplify(), b.simplify()),
            },
            Term::Add(a, b) => a.simplify() + b.simplify(),
            Term::Sub(a, b) => a.simplify() - b.simplify(),
            Term::Mul(a, b) => a.simplify() * b.simplify(),
            Term::Div(a, b) => a.simplify() / b.simplify(),
            Term::Neg(a) => -a.simplify(),
            Term::Eq(a, b) => a.simplify().eq(b.simplify()),
            Term::Lt(a, b) => a.simplify().lt(b.simplify()),
            Term::Le(a, b) => a.simplify().le(b.simplify()),
            Term::Gt(a, b) => a.simplify().gt(b.simplify()),
            Term::Ge(a, b) => a.simplify().ge(b.simplify()),
            Term::ForAll(vs, body) => match body.simplify() {
                lit @ Term::BoolLit(_) => lit,
                body => Term::forall(vs, body),
            },
            Term::Exists(vs, body) => match body.simplify() {
                lit @ Term::BoolLit(_) => lit,
                body => Term::exists(vs, body),
            },
            leaf => leaf,
        }
    }

    /// Names of every constant, free or bound.
    pub fn const_names(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.visit(&mut |t| {
            if let Term::Const(name, _) = t {
                out.insert(name.clone());
            }
        });
        out
    }

    /// Pre-order visit of every sub-term.
    pub fn visit(&self, f: &mut impl FnMut(&Term)) {
        f(self);
        match self {
            Term::Const(..) | Term::BoolLit(_) | Term::IntLit(_) | Term::RealLit(_) => {}
            Term::Neg(a) | Term::Not(a) => a.visit(f),
            Term::Add(a, b)
            | Term::Sub(a, b)
            | Term::Mul(a, b)
            | Term::Div(a, b)
            | Term::Eq(a, b)
            | Term::Lt(a, b)
            | Term::Le(a, b)
            | Term::Gt(a, b)
            | Term::Ge(a, b)
            | Term::Implies(a, b) => {
                a.visit(f);
                b.visit(f);
            }
            Term::Ite(c, a, b) => {
                c.visit(f);
                a.visit(f);
                b.visit(f);
            }
            Term::And(ts) | Term::Or(ts) => ts.iter().for_each(|t| t.visit(f)),
            Term::ForAll(_, body) | Term::Exists(_, body) => body.visit(f),
        }
    }
}

impl ops::Add for Term {
    type Output = Term;

    fn add(self, rhs: Term) -> Term {
        Term::Add(Box::new(self), Box::new(rhs))
    }
}

impl ops::Sub for Term {
    type Output = Term;

    fn sub(self, rhs: Term) -> Term {
        Term::Sub(Box::new(self), Box::new(rhs))
    }
}

impl ops::Mul for Term {
    type Output = Term;

    fn mul(self, rhs: Term) -> Term {
        Term::Mul(Box::new(self), Box::new(rhs))
    }
}

impl ops::Div for Term {
    type Output = Term;

    fn div(self, rhs: Term) -> Term {
        Term::Div(Box::new(self), Box::new(rhs))
    }
}

impl ops::Neg for Term {
    type Output = Term;

    fn neg(self) -> Term {
        Term::Neg(Box::new(self))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::smtlib::to_smtlib(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_promote_to_real() {
        let x = Term::real("x");
        let n = Term::int_const("n");
        assert_eq!((n.clone() + Term::int(1)).sort(), Sort::Int);
        assert_eq!((n.clone() + x.clone()).sort(), Sort::Real);
        assert_eq!((n.clone() / Term::int(2)).sort(), Sort::Real);
        assert_eq!(x.clone().abs().sort(), Sort::Real);
        assert_eq!(x.gt(n).sort(), Sort::Bool);
    }

    #[test]
    fn free_consts_skip_bound_names() {
        let body = Term::and(vec![
            Term::real("q_l").eq(Term::real("p_l")),
            Term::real("q_s").gt(Term::int(0)),
        ]);
        let t = Term::exists(
            vec![("q_l".into(), Sort::Real), ("q_s".into(), Sort::Real)],
            body,
        );
        let free = t.free_consts();
        assert_eq!(free.keys().collect::<Vec<_>>(), vec!["p_l"]);
        assert_eq!(t.const_names().len(), 3);
        assert!(!t.is_quantifier_free());
    }

    #[test]
    fn simplify_flattens_and_folds() {
        let x = Term::bool_const("x");
        let y = Term::bool_const("y");
        let t = Term::and(vec![
            Term::bool(true),
            Term::and(vec![x.clone(), y.clone()]),
            x.clone().not().not(),
        ]);
        assert_eq!(t.simplify(), Term::and(vec![x.clone(), y.clone(), x.clone()]));

        let t = Term::or(vec![Term::bool(false), Term::and(vec![y.clone(), Term::bool(false)])]);
        assert_eq!(t.simplify(), Term::bool(false));

        assert_eq!(Term::and(vec![]).simplify(), Term::bool(true));
        assert_eq!(Term::or(vec![x.clone()]).simplify(), x);
    }
}
