#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use avdiff_ast::Span;
use avdiff_lex::LexError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum ParseError {
    #[error("parse error: {message}")]
    #[diagnostic(code(avdiff::parse))]
    Syntax {
        message: String,
        #[label]
        span: Span,
    },

    #[error("unresolved symbol '{name}': it is not defined in any space")]
    #[diagnostic(code(avdiff::unresolved_symbol))]
    UnresolvedSymbol {
        name: String,
        #[label]
        span: Span,
    },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Syntax { span, .. } | ParseError::UnresolvedSymbol { span, .. } => *span,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::Syntax {
            message: e.message,
            span: e.span,
        }
    }
}
