//! The top-level `Parser`: owns the token source, the typedef registry, the
//! type arena, and diagnostics, and dispatches external declarations. The
//! expression, declarator and statement grammars are implemented as `impl
//! Parser` blocks in sibling modules ([`crate::expr`], [`crate::declarator`],
//! [`crate::stmt`]) to keep each concern in its own file, the way the
//! reference parser splits `ast.rs`/`parser.rs`/`precedence.rs` apart.

use crate::error_recovery::{is_consumed_sync_point, is_sync_point};
use crate::token_source::{TokenSource, VecTokenSource};
use mcc_ast::{Decl, TypeArena, TypedefScope};
use mcc_common::{CStd, Diagnostics, Span};
use mcc_lexer::{Token, TokenKind};

pub struct Parser<S: TokenSource> {
    pub(crate) tokens: S,
    pub(crate) std: CStd,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) typedefs: TypedefScope,
    pub(crate) types: TypeArena,
    pub(crate) panic_mode: bool,
}

impl Parser<VecTokenSource> {
    /// Builds a parser directly over a flat token vector — the shape
    /// `mcc_preprocessor::Preprocessor::preprocess` returns.
    pub fn from_tokens(tokens: Vec<Token>, std: CStd) -> Self {
        Self::new(VecTokenSource::new(tokens), std)
    }
}

impl<S: TokenSource> Parser<S> {
    pub fn new(tokens: S, std: CStd) -> Self {
        Self {
            tokens,
            std,
            diagnostics: Diagnostics::new(),
            typedefs: TypedefScope::new(),
            types: TypeArena::new(),
            panic_mode: false,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn types(&self) -> &TypeArena {
        &self.types
    }

    pub(crate) fn peek(&mut self) -> Token {
        self.tokens.peek().clone()
    }

    pub(crate) fn peek_kind(&mut self) -> TokenKind {
        self.tokens.peek().kind.clone()
    }

    pub(crate) fn peek2_kind(&mut self) -> TokenKind {
        self.tokens.peek2().kind.clone()
    }

    pub(crate) fn advance(&mut self) -> Token {
        self.tokens.advance()
    }

    pub(crate) fn check(&mut self, kind: &TokenKind) -> bool {
        self.peek_kind() == *kind
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Token {
        if self.check(&kind) {
            self.advance()
        } else {
            let got = self.peek();
            self.error(format!("expected `{kind}`, found `{}`", got.kind), got.span);
            got
        }
    }

    pub(crate) fn error(&mut self, message: impl Into<String>, span: Span) {
        log::debug!("parse error: entering panic mode at {span}");
        self.diagnostics.error(message, span);
        self.panic_mode = true;
    }

    pub(crate) fn current_span(&mut self) -> Span {
        self.peek().span
    }

    /// Discards tokens until a synchronization point. Clears
    /// panic mode once a production is successfully re-entered.
    pub(crate) fn synchronize(&mut self) {
        while !is_sync_point(&self.peek_kind()) {
            if is_consumed_sync_point(&self.peek_kind()) {
                self.advance();
                break;
            }
            self.advance();
        }
        self.panic_mode = false;
    }

    /// Parses a whole translation unit: external declarations until `Eof`.
    /// Each end-to-end test case parses a single statement/declaration
    /// through this entry point.
    pub fn parse_translation_unit(mut self) -> (Vec<Decl>, TypeArena, Diagnostics) {
        let start = self.current_span();
        let mut decls = Vec::new();
        while !self.check(&TokenKind::Eof) {
            match self.parse_external_declaration() {
                Some(d) => decls.push(d),
                None => {
                    if self.panic_mode {
                        self.synchronize();
                    } else {
                        // Couldn't make progress without a diagnosed error;
                        // force one so we don't spin forever.
                        let tok = self.peek();
                        self.error(format!("unexpected token `{}`", tok.kind), tok.span);
                        self.synchronize();
                    }
                }
            }
        }
        let _ = start;
        (decls, self.types, self.diagnostics)
    }

    fn parse_external_declaration(&mut self) -> Option<Decl> {
        self.parse_declaration_or_definition()
    }
}
