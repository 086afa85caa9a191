#![forbid(unsafe_code)]

use avdiff_core::CompileError;
use avdiff_logic::{Model, Term};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum VerifyError {
    #[error("usage error: {0}")]
    #[diagnostic(code(avdiff::usage))]
    Usage(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error("solver backend error: {message}")]
    #[diagnostic(code(avdiff::backend))]
    Backend {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl VerifyError {
    pub fn backend(message: impl Into<String>) -> Self {
        VerifyError::Backend {
            message: message.into(),
            help: None,
        }
    }
}

/// Result of one satisfiability check.
#[derive(Clone, Debug, PartialEq)]
pub enum CheckOutcome {
    Sat(Model),
    Unsat,
    Unknown(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// `None` lets the backend run unbounded.
    pub timeout_ms: Option<u32>,
    pub random_seed: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(10_000),
            random_seed: 0,
        }
    }
}

/// A satisfiability backend. `formulas` are asserted together.
pub trait Backend {
    fn check(&mut self, formulas: &[Term]) -> Result<CheckOutcome, VerifyError>;
}

/// Fallback backend when compiled without `--features avdiff-verify/z3`.
///
/// This keeps the workspace buildable on machines without Z3.
pub struct NoZ3Backend;

impl Backend for NoZ3Backend {
    fn check(&mut self, _formulas: &[Term]) -> Result<CheckOutcome, VerifyError> {
        Err(VerifyError::Backend {
            message: "Z3 backend is not enabled".to_string(),
            help: Some("Rebuild with `--features z3`.".to_string()),
        })
    }
}

#[cfg(feature = "z3")]
pub mod z3_backend {
    use std::collections::BTreeMap;

    use avdiff_logic::{Model, ModelValue, Sort, Term};
    use tracing::debug;
    use z3::{
        Config, Context, Params, SatResult, Solver,
        ast::{self, Ast, Bool, Int, Real},
    };

    use super::{Backend, CheckOutcome, SolverConfig, VerifyError};

    /// Z3 with a fresh context per check, so nothing outlives one query.
    pub struct Z3Backend {
        config: SolverConfig,
    }

    impl Z3Backend {
        pub fn new(config: SolverConfig) -> Self {
            Self { config }
        }
    }

    impl Default for Z3Backend {
        fn default() -> Self {
            Self::new(SolverConfig::default())
        }
    }

    enum Z3Term<'ctx> {
        Bool(Bool<'ctx>),
        Int(Int<'ctx>),
        Real(Real<'ctx>),
    }

    impl<'ctx> Z3Term<'ctx> {
        fn into_bool(self) -> Result<Bool<'ctx>, VerifyError> {
            match self {
                Z3Term::Bool(b) => Ok(b),
                _ => Err(VerifyError::backend("expected a boolean term")),
            }
        }

        fn into_real(self) -> Result<Real<'ctx>, VerifyError> {
            match self {
                Z3Term::Real(r) => Ok(r),
                Z3Term::Int(i) => Ok(Real::from_int(&i)),
                Z3Term::Bool(_) => Err(VerifyError::backend("expected a numeric term")),
            }
        }
    }

    struct Translator<'ctx> {
        ctx: &'ctx Context,
    }

    impl<'ctx> Translator<'ctx> {
        fn constant(&self, name: &str, sort: Sort) -> Z3Term<'ctx> {
            match sort {
                Sort::Bool => Z3Term::Bool(Bool::new_const(self.ctx, name)),
                Sort::Int => Z3Term::Int(Int::new_const(self.ctx, name)),
                Sort::Real => Z3Term::Real(Real::new_const(self.ctx, name)),
            }
        }

        /// Decimal text of any width, with an optional leading `-`.
        fn numeral(&self, text: &str) -> Result<Int<'ctx>, VerifyError> {
            let (negative, digits) = match text.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, text),
            };
            let n = Int::from_str(self.ctx, digits)
                .ok_or_else(|| VerifyError::backend(format!("z3 rejected numeral '{text}'")))?;
            Ok(if negative { n.unary_minus() } else { n })
        }

        fn boolean(&self, t: &Term) -> Result<Bool<'ctx>, VerifyError> {
            self.term(t)?.into_bool()
        }

        fn arith(
            &self,
            a: &Term,
            b: &Term,
            int_op: fn(&'ctx Context, &Int<'ctx>, &Int<'ctx>) -> Int<'ctx>,
            real_op: fn(&'ctx Context, &Real<'ctx>, &Real<'ctx>) -> Real<'ctx>,
        ) -> Result<Z3Term<'ctx>, VerifyError> {
            match (self.term(a)?, self.term(b)?) {
                (Z3Term::Int(x), Z3Term::Int(y)) => Ok(Z3Term::Int(int_op(self.ctx, &x, &y))),
                (x, y) => Ok(Z3Term::Real(real_op(self.ctx, &x.into_real()?, &y.into_real()?))),
            }
        }

        fn compare(
            &self,
            a: &Term,
            b: &Term,
            int_op: fn(&Int<'ctx>, &Int<'ctx>) -> Bool<'ctx>,
            real_op: fn(&Real<'ctx>, &Real<'ctx>) -> Bool<'ctx>,
        ) -> Result<Z3Term<'ctx>, VerifyError> {
            match (self.term(a)?, self.term(b)?) {
                (Z3Term::Int(x), Z3Term::Int(y)) => Ok(Z3Term::Bool(int_op(&x, &y))),
                (x, y) => Ok(Z3Term::Bool(real_op(&x.into_real()?, &y.into_real()?))),
            }
        }

        fn quantified(
            &self,
            binders: &[(String, Sort)],
            body: &Term,
            universal: bool,
        ) -> Result<Z3Term<'ctx>, VerifyError> {
            let bound: Vec<Z3Term<'ctx>> = binders
                .iter()
                .map(|(name, sort)| self.constant(name, *sort))
                .collect();
            let refs: Vec<&dyn Ast<'ctx>> = bound
                .iter()
                .map(|b| match b {
                    Z3Term::Bool(x) => x as &dyn Ast<'ctx>,
                    Z3Term::Int(x) => x as &dyn Ast<'ctx>,
                    Z3Term::Real(x) => x as &dyn Ast<'ctx>,
                })
                .collect();
            let body = self.boolean(body)?;
            let q = if universal {
                ast::forall_const(self.ctx, &refs, &[], &body)
            } else {
                ast::exists_const(self.ctx, &refs, &[], &body)
            };
            Ok(Z3Term::Bool(q))
        }

        fn term(&self, t: &Term) -> Result<Z3Term<'ctx>, VerifyError> {
            let ctx = self.ctx;
            Ok(match t {
                Term::Const(name, sort) => self.constant(name, *sort),
                Term::BoolLit(b) => Z3Term::Bool(Bool::from_bool(ctx, *b)),
                Term::IntLit(n) => Z3Term::Int(self.numeral(&n.to_string())?),
                Term::RealLit(r) => {
                    let num = Real::from_int(&self.numeral(&r.numer().to_string())?);
                    let den = Real::from_int(&self.numeral(&r.denom().to_string())?);
                    Z3Term::Real(num.div(&den))
                }

                Term::Add(a, b) => self.arith(a, b, |c, x, y| Int::add(c, &[x, y]), |c, x, y| {
                    Real::add(c, &[x, y])
                })?,
                Term::Sub(a, b) => self.arith(a, b, |c, x, y| Int::sub(c, &[x, y]), |c, x, y| {
                    Real::sub(c, &[x, y])
                })?,
                Term::Mul(a, b) => self.arith(a, b, |c, x, y| Int::mul(c, &[x, y]), |c, x, y| {
                    Real::mul(c, &[x, y])
                })?,
                Term::Div(a, b) => {
                    let x = self.term(a)?.into_real()?;
                    let y = self.term(b)?.into_real()?;
                    Z3Term::Real(x.div(&y))
                }
                Term::Neg(a) => match self.term(a)? {
                    Z3Term::Int(x) => Z3Term::Int(x.unary_minus()),
                    other => Z3Term::Real(other.into_real()?.unary_minus()),
                },
                Term::Ite(c, a, b) => {
                    let cond = self.boolean(c)?;
                    match (self.term(a)?, self.term(b)?) {
                        (Z3Term::Bool(x), Z3Term::Bool(y)) => Z3Term::Bool(cond.ite(&x, &y)),
                        (Z3Term::Int(x), Z3Term::Int(y)) => Z3Term::Int(cond.ite(&x, &y)),
                        (x, y) => Z3Term::Real(cond.ite(&x.into_real()?, &y.into_real()?)),
                    }
                }

                Term::Eq(a, b) => match (self.term(a)?, self.term(b)?) {
                    (Z3Term::Bool(x), Z3Term::Bool(y)) => Z3Term::Bool(x._eq(&y)),
                    (Z3Term::Int(x), Z3Term::Int(y)) => Z3Term::Bool(x._eq(&y)),
                    (x, y) => Z3Term::Bool(x.into_real()?._eq(&y.into_real()?)),
                },
                Term::Lt(a, b) => self.compare(a, b, |x, y| x.lt(y), |x, y| x.lt(y))?,
                Term::Le(a, b) => self.compare(a, b, |x, y| x.le(y), |x, y| x.le(y))?,
                Term::Gt(a, b) => self.compare(a, b, |x, y| x.gt(y), |x, y| x.gt(y))?,
                Term::Ge(a, b) => self.compare(a, b, |x, y| x.ge(y), |x, y| x.ge(y))?,

                Term::And(ts) => {
                    let parts = ts.iter().map(|t| self.boolean(t)).collect::<Result<Vec<_>, _>>()?;
                    let refs: Vec<&Bool<'ctx>> = parts.iter().collect();
                    Z3Term::Bool(Bool::and(ctx, &refs))
                }
                Term::Or(ts) => {
                    let parts = ts.iter().map(|t| self.boolean(t)).collect::<Result<Vec<_>, _>>()?;
                    let refs: Vec<&Bool<'ctx>> = parts.iter().collect();
                    Z3Term::Bool(Bool::or(ctx, &refs))
                }
                Term::Not(a) => Z3Term::Bool(self.boolean(a)?.not()),
                Term::Implies(a, b) => Z3Term::Bool(self.boolean(a)?.implies(&self.boolean(b)?)),
                Term::ForAll(vs, body) => self.quantified(vs, body, true)?,
                Term::Exists(vs, body) => self.quantified(vs, body, false)?,
            })
        }
    }

    impl Backend for Z3Backend {
        fn check(&mut self, formulas: &[Term]) -> Result<CheckOutcome, VerifyError> {
            let mut cfg = Config::new();
            cfg.set_model_generation(true);
            let ctx = Context::new(&cfg);
            let solver = Solver::new(&ctx);

            let mut params = Params::new(&ctx);
            if let Some(ms) = self.config.timeout_ms {
                params.set_u32("timeout", ms);
            }
            params.set_u32("random_seed", self.config.random_seed);
            solver.set_params(&params);

            let tr = Translator { ctx: &ctx };
            let mut free: BTreeMap<String, Sort> = BTreeMap::new();
            for f in formulas {
                free.extend(f.free_consts());
                solver.assert(&tr.boolean(f)?);
            }
            debug!(assertions = formulas.len(), constants = free.len(), "z3 check");

            match solver.check() {
                SatResult::Unsat => Ok(CheckOutcome::Unsat),
                SatResult::Unknown => Ok(CheckOutcome::Unknown(
                    solver
                        .get_reason_unknown()
                        .unwrap_or_else(|| "unknown".to_string()),
                )),
                SatResult::Sat => {
                    let z3_model = solver
                        .get_model()
                        .ok_or_else(|| VerifyError::backend("solver reported sat without a model"))?;
                    let mut model = Model::new();
                    for (name, sort) in &free {
                        let value = match tr.constant(name, *sort) {
                            Z3Term::Bool(c) => z3_model
                                .eval(&c, true)
                                .and_then(|v| v.as_bool())
                                .map(ModelValue::Bool),
                            Z3Term::Int(c) => z3_model
                                .eval(&c, true)
                                .and_then(|v| v.as_i64())
                                .map(ModelValue::Int),
                            Z3Term::Real(c) => z3_model
                                .eval(&c, true)
                                .and_then(|v| v.as_real())
                                .map(|(num, den)| ModelValue::Rational {
                                    num: num as i64,
                                    den: den as i64,
                                }),
                        };
                        match value {
                            Some(v) => model.insert(name.clone(), v),
                            None => debug!(%name, "skipping non-numeral model value"),
                        }
                    }
                    Ok(CheckOutcome::Sat(model))
                }
            }
        }
    }
}
