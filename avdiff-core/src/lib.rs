#![forbid(unsafe_code)]

//! DSL compilation: space registry, post-order lowering and the operator table.

mod compile;
pub mod dispatch;
mod lower;
pub mod policy;
mod space;

pub use compile::{CompileError, compile_source};
pub use dispatch::{Operand, color_formula, direction_formula};
pub use lower::{LowerError, Lowerer};
pub use policy::{CodeBindings, code_bindings};
pub use space::{Space, SpaceRegistry};
