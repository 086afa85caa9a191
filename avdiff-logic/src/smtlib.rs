#![forbid(unsafe_code)]

//! SMT-LIB2 rendering of terms and whole queries.

use std::collections::BTreeMap;
use std::fmt::Write;

use num_bigint::{BigInt, Sign};

use crate::term::{Sort, Term};

/// Renders `name` as an SMT-LIB symbol, quoting with `|...|` when needed.
pub fn symbol(name: &str) -> String {
    let simple = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "~!@$%^&*_-+=<>.?/".contains(c));
    if simple {
        name.to_string()
    } else {
        format!("|{}|", name.replace('|', "_"))
    }
}

fn int_lit(n: &BigInt) -> String {
    match n.sign() {
        Sign::Minus => format!("(- {})", n.magnitude()),
        Sign::NoSign | Sign::Plus => n.to_string(),
    }
}

pub fn to_smtlib(term: &Term) -> String {
    let mut out = String::new();
    render(term, &mut out);
    out
}

fn render(term: &Term, out: &mut String) {
    match term {
        Term::Const(name, _) => out.push_str(&symbol(name)),
        Term::BoolLit(b) => out.push_str(if *b { "true" } else { "false" }),
        Term::IntLit(n) => out.push_str(&int_lit(n)),
        Term::RealLit(r) => {
            let num = match r.numer().sign() {
                Sign::Minus => format!("(- {}.0)", r.numer().magnitude()),
                Sign::NoSign | Sign::Plus => format!("{}.0", r.numer()),
            };
            if r.is_integer() {
                out.push_str(&num);
            } else {
                let _ = write!(out, "(/ {num} {}.0)", r.denom());
            }
        }
        Term::Add(a, b) => app("+", &[a, b], out),
        Term::Sub(a, b) => app("-", &[a, b], out),
        Term::Mul(a, b) => app("*", &[a, b], out),
        Term::Div(a, b) => app("/", &[a, b], out),
        Term::Neg(a) => app("-", &[a], out),
        Term::Ite(c, a, b) => app("ite", &[c, a, b], out),
        Term::Eq(a, b) => app("=", &[a, b], out),
        Term::Lt(a, b) => app("<", &[a, b], out),
        Term::Le(a, b) => app("<=", &[a, b], out),
        Term::Gt(a, b) => app(">", &[a, b], out),
        Term::Ge(a, b) => app(">=", &[a, b], out),
        Term::And(ts) if ts.is_empty() => out.push_str("true"),
        Term::Or(ts) if ts.is_empty() => out.push_str("false"),
        Term::And(ts) => app("and", &ts.iter().collect::<Vec<_>>(), out),
        Term::Or(ts) => app("or", &ts.iter().collect::<Vec<_>>(), out),
        Term::Not(a) => app("not", &[a], out),
        Term::Implies(a, b) => app("=>", &[a, b], out),
        Term::ForAll(vs, body) => quantifier("forall", vs, body, out),
        Term::Exists(vs, body) => quantifier("exists", vs, body, out),
    }
}

fn app(head: &str, args: &[&Term], out: &mut String) {
    out.push('(');
    out.push_str(head);
    for a in args {
        out.push(' ');
        render(a, out);
    }
    out.push(')');
}

fn quantifier(head: &str, binders: &[(String, Sort)], body: &Term, out: &mut String) {
    let _ = write!(out, "({head} (");
    for (i, (name, sort)) in binders.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "({} {sort})", symbol(name));
    }
    out.push_str(") ");
    render(body, out);
    out.push(')');
}

/// A complete script: declarations for every free constant, one `assert` per
/// formula, then `(check-sat)` and `(get-model)`.
pub fn script(formulas: &[Term]) -> String {
    let mut decls: BTreeMap<String, Sort> = BTreeMap::new();
    for f in formulas {
        decls.extend(f.free_consts());
    }

    let mut out = String::new();
    for (name, sort) in &decls {
        let _ = writeln!(out, "(declare-const {} {sort})", symbol(name));
    }
    for f in formulas {
        let _ = writeln!(out, "(assert {})", to_smtlib(f));
    }
    out.push_str("(check-sat)\n(get-model)\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::Rational;

    #[test]
    fn prints_nested_terms() {
        let t = Term::and(vec![
            Term::real("x").gt(Term::int(10)),
            Term::real("y").le(Term::ratio(-1, 2)),
        ]);
        assert_eq!(to_smtlib(&t), "(and (> x 10) (<= y (/ (- 1.0) 2.0)))");
        assert_eq!((-Term::int(-3)).to_string(), "(- (- 3))");
    }

    #[test]
    fn wide_literals_print_every_digit() {
        let n = Term::int_digits("1234567890123456789012345").unwrap();
        assert_eq!(to_smtlib(&n), "1234567890123456789012345");
        let r = Term::RealLit(Rational::from_decimal("0.00000000000000000001").unwrap());
        assert_eq!(to_smtlib(&r), "(/ 1.0 100000000000000000000.0)");
    }

    #[test]
    fn quotes_unusual_symbols() {
        assert_eq!(symbol("vehicle_ego.pos.l"), "vehicle_ego.pos.l");
        assert_eq!(symbol("q!3"), "q!3");
        assert_eq!(symbol("a b"), "|a b|");
        assert_eq!(symbol("9lives"), "|9lives|");
    }

    #[test]
    fn script_declares_only_free_constants() {
        let body = Term::real("q").eq(Term::real("p"));
        let f = Term::exists(vec![("q".into(), Sort::Real)], body);
        let s = script(&[f, Term::bool_const("flag")]);
        assert!(s.contains("(declare-const p Real)"));
        assert!(s.contains("(declare-const flag Bool)"));
        assert!(!s.contains("(declare-const q "));
        assert!(s.contains("(assert (exists ((q Real)) (= q p)))"));
        assert!(s.ends_with("(check-sat)\n(get-model)\n"));
    }
}
