#![forbid(unsafe_code)]

use avdiff_ast::{span_between, ExprTree, Literal, Macro, NodeId, NodeValue, Operator, Span};
use avdiff_lex::{Token, TokenKind};
use tracing::debug;

use crate::error::ParseError;
use crate::SymbolResolver;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// An operator, literal, macro or name must come next.
    ExpectToken,
    /// An operator was just read; only `(` may follow.
    ExpectOpenParen,
    /// A complete argument was read; `,` or `)` may follow.
    AfterValue,
}

/// Finite-state parser from DSL tokens to an [`ExprTree`].
///
/// Names are checked against the resolver as they are read, so an unknown
/// identifier fails here, before any formula exists.
pub struct Parser<'a, R: SymbolResolver + ?Sized> {
    tokens: &'a [Token],
    resolver: &'a R,
    tree: ExprTree,
    stack: Vec<NodeId>,
    state: State,
}

impl<'a, R: SymbolResolver + ?Sized> Parser<'a, R> {
    pub fn new(tokens: &'a [Token], resolver: &'a R) -> Self {
        Self {
            tokens,
            resolver,
            tree: ExprTree::new(),
            stack: Vec::new(),
            state: State::ExpectToken,
        }
    }

    pub fn parse(mut self) -> Result<ExprTree, ParseError> {
        let tokens = self.tokens;
        for tok in tokens {
            debug!(token = %tok.kind, state = ?self.state, depth = self.stack.len(), "parse");
            match self.state {
                State::ExpectToken => self.expect_token(tok)?,
                State::ExpectOpenParen => self.expect_open_paren(tok)?,
                State::AfterValue => self.after_value(tok)?,
            }
        }
        self.finish()
    }

    fn expect_token(&mut self, tok: &Token) -> Result<(), ParseError> {
        let TokenKind::Word(word) = &tok.kind else {
            return Err(syntax(
                format!(
                    "expected an operator, literal, macro or name, found '{}'",
                    tok.kind
                ),
                tok.span,
            ));
        };

        if let Some(op) = Operator::from_token(word) {
            let id = self.tree.push(NodeValue::Operator(op), tok.span);
            self.attach(id, tok)?;
            self.stack.push(id);
            self.state = State::ExpectOpenParen;
            return Ok(());
        }

        let value = self.classify_leaf(word, tok.span)?;
        let id = self.tree.push(value, tok.span);
        self.attach(id, tok)?;
        self.state = State::AfterValue;
        Ok(())
    }

    /// Literal, then macro, then a name known to some space.
    fn classify_leaf(&self, word: &str, span: Span) -> Result<NodeValue, ParseError> {
        if let Some(lit) = Literal::classify(word) {
            return Ok(NodeValue::Literal(lit));
        }
        if let Some(m) = Macro::from_token(word) {
            return Ok(NodeValue::Macro(m));
        }
        if self.resolver.resolves(word) {
            return Ok(NodeValue::Symbol(word.to_string()));
        }
        if is_identifier(word) {
            Err(ParseError::UnresolvedSymbol {
                name: word.to_string(),
                span,
            })
        } else {
            Err(syntax(format!("unrecognized token '{word}'"), span))
        }
    }

    fn attach(&mut self, id: NodeId, tok: &Token) -> Result<(), ParseError> {
        match self.stack.last() {
            Some(&parent) => {
                self.tree.add_child(parent, id);
                Ok(())
            }
            None if self.tree.root().is_none() => {
                self.tree.set_root(id);
                Ok(())
            }
            None => Err(syntax(
                format!("unexpected '{}' after the end of the expression", tok.kind),
                tok.span,
            )),
        }
    }

    fn expect_open_paren(&mut self, tok: &Token) -> Result<(), ParseError> {
        if tok.kind == TokenKind::LParen {
            self.state = State::ExpectToken;
            return Ok(());
        }
        let op = self
            .stack
            .last()
            .map(|id| self.tree.node(*id).value.to_string())
            .unwrap_or_default();
        Err(syntax(
            format!("expected '(' after operator '{op}', found '{}'", tok.kind),
            tok.span,
        ))
    }

    fn after_value(&mut self, tok: &Token) -> Result<(), ParseError> {
        match &tok.kind {
            TokenKind::Comma if !self.stack.is_empty() => {
                self.state = State::ExpectToken;
                Ok(())
            }
            TokenKind::Comma => Err(syntax("',' outside of an argument list", tok.span)),
            TokenKind::RParen => match self.stack.pop() {
                Some(_) => Ok(()),
                None => Err(syntax("unbalanced ')'", tok.span)),
            },
            other => Err(syntax(format!("expected ',' or ')', found '{other}'"), tok.span)),
        }
    }

    fn finish(self) -> Result<ExprTree, ParseError> {
        let end = self
            .tokens
            .last()
            .map(|t| t.span.offset() + t.span.len())
            .unwrap_or(0);
        let eof = span_between(end, end);

        if self.tree.root().is_none() {
            return Err(syntax("empty expression", eof));
        }
        if let Some(open) = self.stack.last() {
            let node = self.tree.node(*open);
            return Err(syntax(
                format!(
                    "unexpected end of input: '{}' and {} enclosing operator(s) are not closed",
                    node.value,
                    self.stack.len() - 1
                ),
                node.span,
            ));
        }
        if self.state != State::AfterValue {
            return Err(syntax("unexpected end of input", eof));
        }
        Ok(self.tree)
    }
}

fn syntax(message: impl Into<String>, span: Span) -> ParseError {
    ParseError::Syntax {
        message: message.into(),
        span,
    }
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
