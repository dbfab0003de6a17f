//! Statement parser: dispatches on the leading token, with the
//! three-way identifier classification (label / declaration / expression
//! statement) that C's grammar needs a typedef lookup to resolve.

use crate::token_source::TokenSource;
use crate::Parser;
use mcc_ast::{BlockItem, CompoundStmt, Stmt, StmtKind};
use mcc_lexer::TokenKind;

impl<S: TokenSource> Parser<S> {
    pub(crate) fn parse_compound_statement(&mut self) -> CompoundStmt {
        let start = self.current_span();
        self.expect(TokenKind::LBrace);
        self.typedefs.push_scope();
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            items.push(self.parse_block_item());
            if self.panic_mode {
                self.synchronize();
            }
        }
        self.typedefs.pop_scope();
        let end = self.current_span();
        self.expect(TokenKind::RBrace);
        CompoundStmt { items, span: start.combine(end) }
    }

    fn parse_block_item(&mut self) -> BlockItem {
        if self.starts_declaration() {
            match self.parse_declaration_or_definition() {
                Some(decl) => BlockItem::Decl(decl),
                None => {
                    let span = self.current_span();
                    BlockItem::Stmt(Stmt { kind: StmtKind::Null, span })
                }
            }
        } else {
            BlockItem::Stmt(self.parse_statement())
        }
    }

    /// Whether the current position starts a declaration rather than an
    /// expression statement: a storage-class/type-qualifier/type-specifier
    /// keyword, `_Static_assert`, or an identifier that the typedef
    /// registry currently resolves to a type (the "lexer hack").
    fn starts_declaration(&mut self) -> bool {
        use TokenKind::*;
        match self.peek_kind() {
            KwTypedef | KwExtern | KwStatic | KwAuto | KwRegister | KwThreadLocal | KwConst
            | KwVolatile | KwRestrict | KwInline | KwNoreturn | KwVoid | KwBool | KwChar
            | KwShort | KwInt | KwLong | KwFloat | KwDouble | KwSigned | KwUnsigned | KwStruct
            | KwUnion | KwEnum | KwStaticAssert | KwAtomic => true,
            Identifier(name) => self.typedefs.is_typedef_name(&name),
            _ => false,
        }
    }

    pub(crate) fn parse_statement(&mut self) -> Stmt {
        let start = self.current_span();
        let kind = match self.peek_kind() {
            TokenKind::LBrace => StmtKind::Compound(self.parse_compound_statement()),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwDo => self.parse_do_while(),
            TokenKind::KwFor => self.parse_for(),
            TokenKind::KwSwitch => self.parse_switch(),
            TokenKind::KwCase => self.parse_case(),
            TokenKind::KwDefault => self.parse_default(),
            TokenKind::KwBreak => {
                self.advance();
                self.eat(&TokenKind::Semicolon);
                StmtKind::Break
            }
            TokenKind::KwContinue => {
                self.advance();
                self.eat(&TokenKind::Semicolon);
                StmtKind::Continue
            }
            TokenKind::KwReturn => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression())
                };
                self.eat(&TokenKind::Semicolon);
                StmtKind::Return(value)
            }
            TokenKind::KwGoto => {
                self.advance();
                let name = match self.peek_kind() {
                    TokenKind::Identifier(name) => {
                        self.advance();
                        name
                    }
                    _ => {
                        let span = self.current_span();
                        self.error("expected a label name after goto", span);
                        String::new()
                    }
                };
                self.eat(&TokenKind::Semicolon);
                StmtKind::Goto(name)
            }
            TokenKind::Semicolon => {
                self.advance();
                StmtKind::Null
            }
            TokenKind::Identifier(name) if matches!(self.peek2_kind(), TokenKind::Colon) => {
                self.advance();
                self.advance();
                let body = Box::new(self.parse_statement());
                StmtKind::Label { name, body }
            }
            _ => {
                let expr = self.parse_expression();
                self.eat(&TokenKind::Semicolon);
                StmtKind::Expr(expr)
            }
        };
        let end = self.current_span();
        Stmt { kind, span: start.combine(end) }
    }

    fn parse_if(&mut self) -> StmtKind {
        self.advance();
        self.expect(TokenKind::LParen);
        let cond = self.parse_expression();
        self.expect(TokenKind::RParen);
        let then_branch = Box::new(self.parse_statement());
        let else_branch = if self.eat(&TokenKind::KwElse) {
            Some(Box::new(self.parse_statement()))
        } else {
            None
        };
        StmtKind::If { cond, then_branch, else_branch }
    }

    fn parse_while(&mut self) -> StmtKind {
        self.advance();
        self.expect(TokenKind::LParen);
        let cond = self.parse_expression();
        self.expect(TokenKind::RParen);
        let body = Box::new(self.parse_statement());
        StmtKind::While { cond, body }
    }

    fn parse_do_while(&mut self) -> StmtKind {
        self.advance();
        let body = Box::new(self.parse_statement());
        self.expect(TokenKind::KwWhile);
        self.expect(TokenKind::LParen);
        let cond = self.parse_expression();
        self.expect(TokenKind::RParen);
        self.eat(&TokenKind::Semicolon);
        StmtKind::DoWhile { body, cond }
    }

    fn parse_for(&mut self) -> StmtKind {
        self.advance();
        self.expect(TokenKind::LParen);
        self.typedefs.push_scope();
        let init = if self.check(&TokenKind::Semicolon) {
            self.advance();
            None
        } else if self.starts_declaration() {
            let decl = self.parse_declaration_or_definition();
            decl.map(|d| Box::new(BlockItem::Decl(d)))
        } else {
            let expr = self.parse_expression();
            let span = expr.span;
            self.eat(&TokenKind::Semicolon);
            Some(Box::new(BlockItem::Stmt(Stmt { kind: StmtKind::Expr(expr), span })))
        };
        let cond = if self.check(&TokenKind::Semicolon) { None } else { Some(self.parse_expression()) };
        self.expect(TokenKind::Semicolon);
        let step = if self.check(&TokenKind::RParen) { None } else { Some(self.parse_expression()) };
        self.expect(TokenKind::RParen);
        let body = Box::new(self.parse_statement());
        self.typedefs.pop_scope();
        StmtKind::For { init, cond, step, body }
    }

    fn parse_switch(&mut self) -> StmtKind {
        self.advance();
        self.expect(TokenKind::LParen);
        let control = self.parse_expression();
        self.expect(TokenKind::RParen);
        let body = Box::new(self.parse_statement());
        StmtKind::Switch { control, body }
    }

    fn parse_case(&mut self) -> StmtKind {
        self.advance();
        let value = self.parse_conditional_expr_for_case();
        // GNU case-range extension: `case 1 ... 5:`.
        let range_end = if self.eat(&TokenKind::Ellipsis) {
            Some(self.parse_conditional_expr_for_case())
        } else {
            None
        };
        self.expect(TokenKind::Colon);
        let body = Box::new(self.parse_statement());
        StmtKind::Case { value, range_end, body }
    }

    /// `case` labels take a constant-expression, which excludes the comma
    /// operator; reuse the assignment-expression entry point (which itself
    /// excludes comma) rather than the full `parse_expression`.
    fn parse_conditional_expr_for_case(&mut self) -> mcc_ast::Expr {
        self.parse_assignment_expr()
    }

    fn parse_default(&mut self) -> StmtKind {
        self.advance();
        self.expect(TokenKind::Colon);
        let body = Box::new(self.parse_statement());
        StmtKind::Default { body }
    }
}
