#![forbid(unsafe_code)]

use avdiff_ast::Span;
use avdiff_logic::{NameSupply, Term};
use avdiff_parse::{ParseError, parse_tree};
use miette::Diagnostic;
use thiserror::Error;

use crate::lower::{LowerError, Lowerer};
use crate::space::SpaceRegistry;

#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lower(#[from] LowerError),
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::Parse(e) => e.span(),
            CompileError::Lower(e) => e.span(),
        }
    }
}

/// Parses and lowers one DSL source against every space in `registry`.
///
/// Nothing is registered; the caller decides which space receives the formula.
pub fn compile_source(
    src: &str,
    registry: &SpaceRegistry,
    names: &mut NameSupply,
) -> Result<Term, CompileError> {
    let tree = parse_tree(src, registry)?;
    let formula = Lowerer::new(registry, names).lower(&tree)?;
    Ok(formula.simplify())
}
