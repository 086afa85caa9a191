#![forbid(unsafe_code)]

mod error;
mod parser;

use avdiff_ast::ExprTree;
use avdiff_lex::Lexer;
use miette::IntoDiagnostic;

pub use error::ParseError;
pub use parser::Parser;

/// Answers "is this name defined in any space?" while parsing.
pub trait SymbolResolver {
    fn resolves(&self, name: &str) -> bool;
}

impl<F> SymbolResolver for F
where
    F: Fn(&str) -> bool,
{
    fn resolves(&self, name: &str) -> bool {
        (self)(name)
    }
}

/// Tokenizes and parses one DSL source into a tree.
pub fn parse_tree<R>(src: &str, resolver: &R) -> Result<ExprTree, ParseError>
where
    R: SymbolResolver + ?Sized,
{
    let tokens = Lexer::new(src).lex()?;
    Parser::new(&tokens, resolver).parse()
}

pub fn parse_source<R>(src: &str, resolver: &R) -> miette::Result<ExprTree>
where
    R: SymbolResolver + ?Sized,
{
    parse_tree(src, resolver).into_diagnostic()
}
