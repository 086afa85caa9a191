#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use avdiff_ast::{ExprTree, Literal, NodeId, NodeValue, Operator, Span};
use avdiff_logic::{NameSupply, Rational, Sort, Term};
use avdiff_scene::Value;
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::dispatch::{self, Operand};
use crate::space::SpaceRegistry;

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum LowerError {
    #[error("type mismatch in '{op}': {message}")]
    #[diagnostic(code(avdiff::type_mismatch))]
    TypeMismatch {
        op: Operator,
        message: String,
        #[label("in this operator")]
        span: Span,
    },

    #[error("malformed literal '{text}'")]
    #[diagnostic(code(avdiff::lower))]
    Literal {
        text: String,
        #[label]
        span: Span,
    },

    #[error("unresolved symbol '{name}': it is not defined in any space")]
    #[diagnostic(code(avdiff::unresolved_symbol))]
    Unresolved {
        name: String,
        #[label]
        span: Span,
    },

    #[error("expression must be a boolean formula, but it is a {found}")]
    #[diagnostic(
        code(avdiff::lower),
        help("wrap it in a comparison, e.g. '>(expr, 0)'")
    )]
    NotAFormula {
        found: String,
        #[label]
        span: Span,
    },
}

impl LowerError {
    pub fn span(&self) -> Span {
        match self {
            LowerError::TypeMismatch { span, .. }
            | LowerError::Literal { span, .. }
            | LowerError::Unresolved { span, .. }
            | LowerError::NotAFormula { span, .. } => *span,
        }
    }
}

/// Post-order lowering of a parsed tree into one formula.
///
/// Every node is lowered exactly once; its result is cached by node id and
/// consumed by the parent.
pub struct Lowerer<'a> {
    registry: &'a SpaceRegistry,
    names: &'a mut NameSupply,
}

impl<'a> Lowerer<'a> {
    pub fn new(registry: &'a SpaceRegistry, names: &'a mut NameSupply) -> Self {
        Self { registry, names }
    }

    pub fn lower(&mut self, tree: &ExprTree) -> Result<Term, LowerError> {
        let Some(root) = tree.root() else {
            return Err(LowerError::NotAFormula {
                found: "empty expression".into(),
                span: avdiff_ast::span(0, 0),
            });
        };

        let mut cache: Vec<Option<Operand>> = vec![None; tree.len()];
        tree.walk_post_order::<LowerError>(root, |id, node| {
            let lowered = match &node.value {
                NodeValue::Literal(lit) => Operand::Value(Value::Term(literal(lit, node.span)?)),
                NodeValue::Macro(m) => Operand::Macro(*m),
                NodeValue::Symbol(name) => match self.registry.lookup(name) {
                    Some(v) => Operand::Value(v.clone()),
                    None => {
                        return Err(LowerError::Unresolved {
                            name: name.clone(),
                            span: node.span,
                        });
                    }
                },
                NodeValue::Operator(op) => {
                    let args: Vec<Operand> = node
                        .children()
                        .iter()
                        .filter_map(|c| cache[c.index()].take())
                        .collect();
                    dispatch::apply(*op, &args, self.names).map_err(|message| {
                        LowerError::TypeMismatch {
                            op: *op,
                            message,
                            span: node.span,
                        }
                    })?
                }
            };
            debug!(node = id.index(), value = %node.value, lowered = %lowered, "lower");
            cache[id.index()] = Some(lowered);
            Ok(())
        })?;

        finish(cache[root.index()].take(), tree, root)
    }
}

fn literal(lit: &Literal, span: Span) -> Result<Term, LowerError> {
    match lit {
        Literal::Int(digits) => Term::int_digits(digits).ok_or_else(|| LowerError::Literal {
            text: digits.clone(),
            span,
        }),
        Literal::Bool(b) => Ok(Term::bool(*b)),
        Literal::Decimal(text) => Rational::from_decimal(text)
            .map(Term::RealLit)
            .ok_or_else(|| LowerError::Literal {
                text: text.clone(),
                span,
            }),
    }
}

fn finish(result: Option<Operand>, tree: &ExprTree, root: NodeId) -> Result<Term, LowerError> {
    let span = tree.node(root).span;
    match result {
        Some(Operand::Value(Value::Term(t))) if t.sort() == Sort::Bool => Ok(t),
        Some(other) => Err(LowerError::NotAFormula {
            found: match other {
                Operand::Value(v) => v.kind_name(),
                Operand::Macro(m) => format!("macro '{m}'"),
            },
            span,
        }),
        None => Err(LowerError::NotAFormula {
            found: "empty expression".into(),
            span,
        }),
    }
}
