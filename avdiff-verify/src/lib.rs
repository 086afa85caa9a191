#![forbid(unsafe_code)]

pub mod counterexample;
pub mod solver;
mod verifier;

pub use counterexample::ScenarioReport;
pub use solver::{Backend, CheckOutcome, NoZ3Backend, SolverConfig, VerifyError};
#[cfg(feature = "z3")]
pub use solver::z3_backend::Z3Backend;
pub use verifier::{ActionMode, Stage, Verdict, Verifier};
