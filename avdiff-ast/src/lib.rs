#![forbid(unsafe_code)]

mod tree;
mod vocab;

use miette::SourceSpan;

pub use tree::{ExprTree, Node, NodeId, NodeValue};
pub use vocab::{Arity, Color, Direction, Literal, Macro, Operator};

pub type Span = SourceSpan;

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

pub fn span_between(start: usize, end: usize) -> Span {
    debug_assert!(end >= start);
    span(start, end - start)
}
