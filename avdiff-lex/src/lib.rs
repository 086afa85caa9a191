#![forbid(unsafe_code)]

mod lexer;
mod token;

pub use lexer::{LexError, Lexer};
pub use token::{Token, TokenKind};

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn word(w: &str) -> TokenKind {
        TokenKind::Word(w.to_string())
    }

    #[test]
    fn splits_on_delimiters_only() {
        assert_eq!(
            kinds("and(>=(pedestrian_0.pos.s, 10), is_path_cross)"),
            vec![
                word("and"),
                TokenKind::LParen,
                word(">="),
                TokenKind::LParen,
                word("pedestrian_0.pos.s"),
                TokenKind::Comma,
                word("10"),
                TokenKind::RParen,
                TokenKind::Comma,
                word("is_path_cross"),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn whitespace_is_stripped_before_splitting() {
        // Whitespace never separates words: `> =` is one token.
        assert_eq!(kinds("  > = ( a\n,\tb )"), kinds(">=(a,b)"));
        assert_eq!(kinds("1 0"), vec![word("10")]);
    }

    #[test]
    fn empty_and_blank_inputs_produce_no_tokens() {
        assert!(kinds("").is_empty());
        assert!(kinds(" \n\t ").is_empty());
    }

    #[test]
    fn spans_point_into_original_text() {
        let src = "not( flag )";
        let tokens = Lexer::new(src).lex().unwrap();
        let flag = &tokens[2];
        assert_eq!(flag.kind, word("flag"));
        let start: usize = flag.span.offset();
        assert_eq!(&src[start..start + flag.span.len()], "flag");
    }

    #[test]
    fn split_word_span_covers_inner_whitespace() {
        let src = "> =";
        let tokens = Lexer::new(src).lex().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].span.offset(), 0);
        assert_eq!(tokens[0].span.len(), 3);
    }
}
