//! Expression parser: precedence climbing over the table in
//! [`crate::precedence`], plus the handful of constructs that sit outside a
//! pure binary-operator grammar — unary prefix operators, the
//! cast/compound-literal/parenthesized-expression/statement-expression
//! disambiguation on `(`, postfix operators, `sizeof`/`_Alignof`,
//! `_Generic`, and brace-initializer lists.

use crate::precedence::{binary_op, Assoc, Precedence};
use crate::token_source::TokenSource;
use crate::Parser;
use mcc_ast::{
    Designator, Expr, ExprKind, GenericAssoc, InitItem, Initializer, PostfixOp, SizeofArg, UnOp,
};
use mcc_lexer::TokenKind;

impl<S: TokenSource> Parser<S> {
    /// The comma operator: the widest expression grammar, used wherever a
    /// full `expression` (not `assignment-expression`) is called for.
    pub(crate) fn parse_expression(&mut self) -> Expr {
        let mut lhs = self.parse_assignment_expr();
        while self.check(&TokenKind::Comma) {
            let span = self.current_span();
            self.advance();
            let rhs = self.parse_assignment_expr();
            let combined = span.combine(rhs.span);
            lhs = Expr::new(ExprKind::Comma { lhs: Box::new(lhs), rhs: Box::new(rhs) }, combined);
        }
        lhs
    }

    /// `assignment-expression`: right-associative, one of the eleven forms.
    pub(crate) fn parse_assignment_expr(&mut self) -> Expr {
        let lhs = self.parse_conditional_expr();
        if let Some((op, Precedence::Assignment, Assoc::Right)) = binary_op(&self.peek_kind()) {
            self.advance();
            let rhs = self.parse_assignment_expr();
            let span = lhs.span.combine(rhs.span);
            return Expr::new(ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span);
        }
        lhs
    }

    /// `conditional-expression`: right-associative ternary. The
    /// middle operand is a full `expression` (comma allowed); the else
    /// branch recurses into another conditional-expression so chained
    /// ternaries without parentheses associate to the right.
    fn parse_conditional_expr(&mut self) -> Expr {
        let cond = self.parse_binary(Precedence::LogicalOr);
        if self.check(&TokenKind::Question) {
            self.advance();
            let then_expr = self.parse_expression();
            self.expect(TokenKind::Colon);
            let else_expr = self.parse_conditional_expr();
            let span = cond.span.combine(else_expr.span);
            return Expr::new(
                ExprKind::Ternary {
                    cond: Box::new(cond),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                },
                span,
            );
        }
        cond
    }

    /// Generic precedence-climbing loop over [`crate::precedence::binary_op`]
    /// from `min_prec` up through multiplicative. Never consumes assignment
    /// or comma operators when called with `min_prec >= Precedence::LogicalOr`
    /// (both sit below every level this function is ever invoked at), so
    /// ternary/assignment/comma stay the explicit callers' responsibility.
    fn parse_binary(&mut self, min_prec: Precedence) -> Expr {
        let mut lhs = self.parse_cast_or_unary();
        loop {
            let Some((op, prec, assoc)) = binary_op(&self.peek_kind()) else { break };
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_min = match assoc {
                Assoc::Left => bump(prec),
                Assoc::Right => prec,
            };
            let rhs = self.parse_binary(next_min);
            let span = lhs.span.combine(rhs.span);
            lhs = Expr::new(ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span);
        }
        lhs
    }

    /// Unary-prefix level, including the cast disambiguation: `(` begins a
    /// cast when followed by a type-start.
    fn parse_cast_or_unary(&mut self) -> Expr {
        if self.check(&TokenKind::LParen) && self.at_type_start_after_paren() {
            let start = self.current_span();
            self.advance();
            let ty = self.parse_type_name();
            self.expect(TokenKind::RParen);
            if self.check(&TokenKind::LBrace) {
                let items = self.parse_brace_init_list();
                let span = start.combine(self.current_span());
                return Expr::new(ExprKind::CompoundLiteral { ty, init: items }, span);
            }
            let operand = self.parse_cast_or_unary();
            let span = start.combine(operand.span);
            return Expr::new(ExprKind::Cast { ty, operand: Box::new(operand) }, span);
        }

        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::PlusPlus => Some(UnOp::PreInc),
            TokenKind::MinusMinus => Some(UnOp::PreDec),
            TokenKind::Amp => Some(UnOp::AddrOf),
            TokenKind::Star => Some(UnOp::Deref),
            TokenKind::Plus => Some(UnOp::Plus),
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Tilde => Some(UnOp::BitNot),
            TokenKind::Bang => Some(UnOp::LogNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_cast_or_unary();
            let span = start.combine(operand.span);
            return Expr::new(ExprKind::Unary { op, operand: Box::new(operand) }, span);
        }

        if self.check(&TokenKind::KwSizeof) {
            return self.parse_sizeof();
        }
        if self.check(&TokenKind::KwAlignof) {
            self.advance();
            self.expect(TokenKind::LParen);
            let ty = self.parse_type_name();
            let end = self.current_span();
            self.expect(TokenKind::RParen);
            return Expr::new(ExprKind::Alignof(ty), start.combine(end));
        }

        self.parse_postfix()
    }

    fn parse_sizeof(&mut self) -> Expr {
        let start = self.current_span();
        self.advance();
        if self.check(&TokenKind::LParen) && self.at_type_start_after_paren() {
            self.advance();
            let ty = self.parse_type_name();
            let end = self.current_span();
            self.expect(TokenKind::RParen);
            return Expr::new(ExprKind::Sizeof(SizeofArg::Type(ty)), start.combine(end));
        }
        let operand = self.parse_cast_or_unary();
        let span = start.combine(operand.span);
        Expr::new(ExprKind::Sizeof(SizeofArg::Expr(Box::new(operand))), span)
    }

    /// Whether the token after an (unconsumed) `(` begins a type-name — the
    /// cast/compound-literal disambiguation.
    fn at_type_start_after_paren(&mut self) -> bool {
        matches!(self.peek2_kind(), TokenKind::Identifier(ref n) if self.typedefs.is_typedef_name(n))
            || is_type_keyword(&self.peek2_kind())
    }

    /// Parses a bare type-name (decl-specifiers + optional abstract
    /// declarator), as used by casts, `sizeof`, `_Alignof` and compound
    /// literals.
    fn parse_type_name(&mut self) -> mcc_ast::types::TypeId {
        let spec = self.parse_decl_specifiers().unwrap_or_else(|| {
            let span = self.current_span();
            self.error("expected a type name", span);
            crate::declarator::DeclSpec { base: self.types.void(), storage: mcc_ast::StorageClass::None, inline: false, noreturn: false }
        });
        let (_name, ty) = self.parse_declarator(spec.base, true);
        ty
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.peek_kind() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression();
                    let end = self.current_span();
                    self.expect(TokenKind::RBracket);
                    let span = expr.span.combine(end);
                    expr = Expr::new(ExprKind::Subscript { base: Box::new(expr), index: Box::new(index) }, span);
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_assignment_expr());
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.current_span();
                    self.expect(TokenKind::RParen);
                    let span = expr.span.combine(end);
                    expr = Expr::new(ExprKind::Call { callee: Box::new(expr), args }, span);
                }
                TokenKind::Dot => {
                    self.advance();
                    let (field, end) = self.expect_identifier_name();
                    let span = expr.span.combine(end);
                    expr = Expr::new(ExprKind::Member { base: Box::new(expr), field, arrow: false }, span);
                }
                TokenKind::Arrow => {
                    self.advance();
                    let (field, end) = self.expect_identifier_name();
                    let span = expr.span.combine(end);
                    expr = Expr::new(ExprKind::Member { base: Box::new(expr), field, arrow: true }, span);
                }
                TokenKind::PlusPlus => {
                    let end = self.current_span();
                    self.advance();
                    let span = expr.span.combine(end);
                    expr = Expr::new(ExprKind::PostfixUnary { op: PostfixOp::PostInc, operand: Box::new(expr) }, span);
                }
                TokenKind::MinusMinus => {
                    let end = self.current_span();
                    self.advance();
                    let span = expr.span.combine(end);
                    expr = Expr::new(ExprKind::PostfixUnary { op: PostfixOp::PostDec, operand: Box::new(expr) }, span);
                }
                _ => break,
            }
        }
        expr
    }

    fn expect_identifier_name(&mut self) -> (String, mcc_common::Span) {
        let span = self.current_span();
        match self.peek_kind() {
            TokenKind::Identifier(name) => {
                self.advance();
                (name, span)
            }
            _ => {
                self.error("expected a member name", span);
                (String::new(), span)
            }
        }
    }

    fn parse_primary(&mut self) -> Expr {
        let span = self.current_span();
        match self.peek_kind() {
            TokenKind::IntLiteral { value, .. } => {
                self.advance();
                Expr::new(ExprKind::IntLiteral(value), span)
            }
            TokenKind::FloatLiteral { text, .. } => {
                self.advance();
                let value: f64 = text.parse().unwrap_or(0.0);
                Expr::new(ExprKind::FloatLiteral(value), span)
            }
            TokenKind::CharLiteral(c) => {
                self.advance();
                Expr::new(ExprKind::CharLiteral(c), span)
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                Expr::new(ExprKind::StringLiteral(s), span)
            }
            TokenKind::KwNullptr => {
                self.advance();
                Expr::new(ExprKind::NullPointer, span)
            }
            TokenKind::KwTrue => {
                self.advance();
                Expr::new(ExprKind::IntLiteral(1), span)
            }
            TokenKind::KwFalse => {
                self.advance();
                Expr::new(ExprKind::IntLiteral(0), span)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Expr::new(ExprKind::Identifier(name), span)
            }
            TokenKind::KwGeneric => self.parse_generic_selection(),
            TokenKind::AmpAmp => {
                // GNU labels-as-values: `&&label`.
                self.advance();
                let (name, end) = self.expect_identifier_name();
                Expr::new(ExprKind::LabelAddress(name), span.combine(end))
            }
            TokenKind::LParen => {
                self.advance();
                if self.check(&TokenKind::LBrace) {
                    // GNU statement expression `({ ... })`.
                    let body = self.parse_compound_statement();
                    let end = self.current_span();
                    self.expect(TokenKind::RParen);
                    return Expr::new(ExprKind::StatementExpr(body), span.combine(end));
                }
                let inner = self.parse_expression();
                let end = self.current_span();
                self.expect(TokenKind::RParen);
                Expr { span: span.combine(end), ..inner }
            }
            _ => {
                let tok = self.peek();
                self.error(format!("expected an expression, found `{}`", tok.kind), tok.span);
                self.advance();
                Expr::new(ExprKind::IntLiteral(0), span)
            }
        }
    }

    fn parse_generic_selection(&mut self) -> Expr {
        let start = self.current_span();
        self.advance();
        self.expect(TokenKind::LParen);
        let control = self.parse_assignment_expr();
        let mut assocs = Vec::new();
        while self.eat(&TokenKind::Comma) {
            let ty = if self.eat(&TokenKind::KwDefault) {
                None
            } else {
                Some(self.parse_type_name())
            };
            self.expect(TokenKind::Colon);
            let value = self.parse_assignment_expr();
            assocs.push(GenericAssoc { ty, value: Box::new(value) });
        }
        let end = self.current_span();
        self.expect(TokenKind::RParen);
        Expr::new(
            ExprKind::Generic { control: Box::new(control), assocs },
            start.combine(end),
        )
    }

    /// An initializer: a brace-init list, or a plain assignment-expression.
    pub(crate) fn parse_initializer(&mut self) -> Initializer {
        if self.check(&TokenKind::LBrace) {
            Initializer::List(self.parse_brace_init_list())
        } else {
            Initializer::Expr(self.parse_assignment_expr())
        }
    }

    fn parse_brace_init_list(&mut self) -> Vec<InitItem> {
        self.expect(TokenKind::LBrace);
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            let mut designators = Vec::new();
            loop {
                if self.check(&TokenKind::Dot) {
                    self.advance();
                    let (name, _) = self.expect_identifier_name();
                    designators.push(Designator::Field(name));
                } else if self.eat(&TokenKind::LBracket) {
                    let index = self.parse_assignment_expr();
                    self.expect(TokenKind::RBracket);
                    designators.push(Designator::Index(index));
                } else {
                    break;
                }
            }
            if !designators.is_empty() {
                self.expect(TokenKind::Eq);
            }
            let value = self.parse_initializer();
            items.push(InitItem { designators, value });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace);
        items
    }
}

fn bump(prec: Precedence) -> Precedence {
    use Precedence::*;
    match prec {
        None => None,
        Comma => Assignment,
        Assignment => Ternary,
        Ternary => LogicalOr,
        LogicalOr => LogicalAnd,
        LogicalAnd => BitOr,
        BitOr => BitXor,
        BitXor => BitAnd,
        BitAnd => Equality,
        Equality => Relational,
        Relational => Shift,
        Shift => Additive,
        Additive => Multiplicative,
        Multiplicative => Multiplicative,
    }
}

fn is_type_keyword(kind: &TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        KwVoid | KwChar | KwShort | KwInt | KwLong | KwFloat | KwDouble | KwSigned | KwUnsigned
            | KwBool | KwComplex | KwStruct | KwUnion | KwEnum | KwConst | KwVolatile | KwRestrict
            | KwAtomic
    )
}

