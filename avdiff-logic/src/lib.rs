#![forbid(unsafe_code)]

//! Solver-agnostic formula layer.
//!
//! Everything the compiler produces is a [`Term`]. Backends translate terms
//! into their own representation; tests evaluate them directly.

mod eval;
mod model;
mod names;
mod rational;
pub mod smtlib;
mod term;

pub use eval::{Assignment, EvalError, Scalar};
pub use model::{Model, ModelValue};
pub use names::NameSupply;
pub use rational::Rational;
pub use term::{Sort, Term};
