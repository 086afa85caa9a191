#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use avdiff_ast::{span_between, Span};
use logos::Logos;
use miette::Diagnostic;
use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, Error, Diagnostic)]
#[error("lex error: {message}")]
#[diagnostic(code(avdiff::lex))]
#[allow(unused_assignments)]
pub struct LexError {
    pub message: String,
    #[label]
    pub span: Span,
}

// Whitespace is removed before this lexer runs, so there is nothing to skip.
#[derive(Logos, Debug, Clone, PartialEq)]
enum RawToken {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,

    #[regex(r"[^(),]+", |lex| lex.slice().to_string())]
    Word(String),
}

/// Whitespace-free copy of the source, remembering where each byte came from.
struct Compacted {
    text: String,
    origin: Vec<usize>,
}

impl Compacted {
    fn new(src: &str) -> Self {
        let mut text = String::with_capacity(src.len());
        let mut origin = Vec::with_capacity(src.len());
        for (offset, ch) in src.char_indices() {
            if ch.is_whitespace() {
                continue;
            }
            text.push(ch);
            origin.extend((0..ch.len_utf8()).map(|i| offset + i));
        }
        Self { text, origin }
    }

    /// Maps a compacted byte range back to the original source. A word that
    /// had whitespace inside it (`> =`) spans the whole original stretch.
    fn span(&self, range: std::ops::Range<usize>) -> Span {
        if range.is_empty() {
            let at = self.origin.get(range.start).copied().unwrap_or(0);
            return span_between(at, at);
        }
        let start = self.origin[range.start];
        let end = self.origin[range.end - 1] + 1;
        span_between(start, end)
    }
}

/// Tokenizer for the policy DSL.
///
/// All whitespace is dropped first, then the text is split on `(`, `)` and
/// `,`. Empty pieces never appear. Spans point into the original text.
pub struct Lexer<'a> {
    src: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src }
    }

    pub fn lex(&self) -> Result<Vec<Token>, LexError> {
        let compact = Compacted::new(self.src);
        let mut tokens = Vec::new();

        let mut lex = RawToken::lexer(&compact.text);
        while let Some(raw) = lex.next() {
            let span = compact.span(lex.span());
            let kind = match raw {
                Ok(RawToken::LParen) => TokenKind::LParen,
                Ok(RawToken::RParen) => TokenKind::RParen,
                Ok(RawToken::Comma) => TokenKind::Comma,
                Ok(RawToken::Word(w)) => TokenKind::Word(w),
                Err(()) => {
                    return Err(LexError {
                        message: format!("unrecognized input '{}'", lex.slice()),
                        span,
                    });
                }
            };
            tokens.push(Token { kind, span });
        }

        Ok(tokens)
    }
}
