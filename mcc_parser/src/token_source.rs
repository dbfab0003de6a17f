//! The parser's view of its input: a lazy, infinite-with-`Eof` stream with
//! single-token lookahead. Generic over [`TokenSource`] rather
//! than hard-wired to `mcc_preprocessor::Preprocessor` so the parser can be
//! unit-tested against hand-built token vectors without running the macro
//! expander.

use mcc_lexer::{Token, TokenKind};

pub trait TokenSource {
    /// The next significant token without consuming it. Always returns
    /// something (an `Eof` token past the end), matching the
    /// "infinite-with-EOF" contract.
    fn peek(&mut self) -> &Token;

    /// Looks one token further ahead than `peek`, without consuming either.
    /// Needed for a handful of two-token lookahead decisions (e.g.
    /// distinguishing `(T)` cast/compound-literal from a parenthesized
    /// expression once a type-start is already known).
    fn peek2(&mut self) -> &Token;

    /// Consumes and returns the current token, advancing the stream.
    fn advance(&mut self) -> Token;
}

/// The default token source: a flat `Vec<Token>` (as produced by
/// [`mcc_preprocessor::Preprocessor::preprocess`]), with newline tokens
/// skipped at this layer ("Newline tokens are skipped at this
/// layer").
pub struct VecTokenSource {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
}

impl VecTokenSource {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        tokens.retain(|t| !matches!(t.kind, TokenKind::Newline));
        let eof = tokens
            .last()
            .filter(|t| matches!(t.kind, TokenKind::Eof))
            .cloned()
            .unwrap_or_else(|| {
                let span = tokens.last().map(|t| t.span).unwrap_or(mcc_common::Span::dummy());
                Token::new(TokenKind::Eof, "", span)
            });
        Self { tokens, pos: 0, eof }
    }

    fn at(&self, index: usize) -> &Token {
        self.tokens.get(index).unwrap_or(&self.eof)
    }
}

impl TokenSource for VecTokenSource {
    fn peek(&mut self) -> &Token {
        self.at(self.pos)
    }

    fn peek2(&mut self) -> &Token {
        self.at(self.pos + 1)
    }

    fn advance(&mut self) -> Token {
        let tok = self.at(self.pos).clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcc_common::Span;

    fn tok(kind: TokenKind) -> Token {
        Token::new(kind, "", Span::dummy())
    }

    #[test]
    fn advancing_past_the_end_repeats_eof() {
        let mut src = VecTokenSource::new(vec![tok(TokenKind::Semicolon)]);
        assert_eq!(src.advance().kind, TokenKind::Semicolon);
        assert!(matches!(src.peek().kind, TokenKind::Eof));
        assert!(matches!(src.advance().kind, TokenKind::Eof));
        assert!(matches!(src.advance().kind, TokenKind::Eof));
    }

    #[test]
    fn newlines_are_filtered_out() {
        let mut src = VecTokenSource::new(vec![tok(TokenKind::Newline), tok(TokenKind::Semicolon)]);
        assert_eq!(src.peek().kind, TokenKind::Semicolon);
    }
}
