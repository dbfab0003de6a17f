//! The `#if`/`#elif` constant-expression evaluator.
//!
//! `defined(X)` / `defined X` are resolved against the macro table *before*
//! macro expansion runs (X itself must never be expanded), then the
//! remaining tokens are macro-expanded and folded down to an `i64` by a
//! small precedence-climbing evaluator restricted to the ternary-and-below
//! grammar a constant expression actually needs.

use crate::expander::{expand_all, ExpansionContext};
use crate::macro_table::MacroTable;
use mcc_common::{Diagnostics, Span};
use mcc_lexer::{Token, TokenKind};

pub fn evaluate(
    tokens: Vec<Token>,
    macros: &MacroTable,
    ctx: &mut ExpansionContext,
    diags: &mut Diagnostics,
) -> i64 {
    let substituted = substitute_defined(tokens, macros, diags);
    let expanded = expand_all(substituted, macros, ctx, diags);
    if expanded.is_empty() {
        diags.error("expected a value in preprocessor expression", Span::dummy());
        return 0;
    }
    let mut ev = Evaluator { tokens: &expanded, pos: 0 };
    match ev.parse_ternary() {
        Ok(value) => value,
        Err(message) => {
            let span = expanded.get(ev.pos.min(expanded.len().saturating_sub(1))).map(|t| t.span).unwrap_or_else(Span::dummy);
            diags.error(message, span);
            0
        }
    }
}

fn substitute_defined(tokens: Vec<Token>, macros: &MacroTable, diags: &mut Diagnostics) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].identifier_name() == Some("defined") {
            let span = tokens[i].span;
            if matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::LParen)) {
                if let Some(name) = tokens.get(i + 2).and_then(|t| t.identifier_name()) {
                    let closes = matches!(tokens.get(i + 3).map(|t| &t.kind), Some(TokenKind::RParen));
                    if closes {
                        out.push(defined_literal(macros.is_defined(name), span));
                        i += 4;
                        continue;
                    }
                }
                diags.error("malformed 'defined(...)' in preprocessor expression", span);
                out.push(defined_literal(false, span));
                i += 1;
                continue;
            }
            if let Some(name) = tokens.get(i + 1).and_then(|t| t.identifier_name()) {
                out.push(defined_literal(macros.is_defined(name), span));
                i += 2;
                continue;
            }
            diags.error("'defined' requires an identifier", span);
            out.push(defined_literal(false, span));
            i += 1;
            continue;
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

fn defined_literal(value: bool, span: Span) -> Token {
    Token::new(
        TokenKind::IntLiteral { value: value as u64, suffix: mcc_lexer::IntSuffix::None },
        if value { "1" } else { "0" },
        span,
    )
}

struct Evaluator<'a> {
    tokens: &'a [Token],
    pos: usize,
}

type EvalResult = Result<i64, String>;

impl<'a> Evaluator<'a> {
    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_ternary(&mut self) -> EvalResult {
        let cond = self.parse_binary(0)?;
        if self.eat(&TokenKind::Question) {
            let then_val = self.parse_ternary()?;
            if !self.eat(&TokenKind::Colon) {
                return Err("expected ':' in conditional expression".to_string());
            }
            let else_val = self.parse_ternary()?;
            Ok(if cond != 0 { then_val } else { else_val })
        } else {
            Ok(cond)
        }
    }

    /// Precedence-climbing over the binary operator levels (logical-or down
    /// through multiplicative); `min_prec` is the lowest precedence this
    /// call will consume.
    fn parse_binary(&mut self, min_prec: u8) -> EvalResult {
        let mut left = self.parse_unary()?;
        loop {
            let Some((prec, op)) = self.peek_kind().and_then(binary_op_info) else { break };
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            left = apply_binary(op, left, right)?;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> EvalResult {
        match self.peek_kind() {
            Some(TokenKind::Plus) => {
                self.advance();
                self.parse_unary()
            }
            Some(TokenKind::Minus) => {
                self.advance();
                Ok(-self.parse_unary()?)
            }
            Some(TokenKind::Bang) => {
                self.advance();
                Ok((self.parse_unary()? == 0) as i64)
            }
            Some(TokenKind::Tilde) => {
                self.advance();
                Ok(!self.parse_unary()?)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> EvalResult {
        let Some(tok) = self.advance().cloned() else {
            return Err("unexpected end of preprocessor expression".to_string());
        };
        match tok.kind {
            TokenKind::IntLiteral { value, .. } => Ok(value as i64),
            TokenKind::CharLiteral(c) => Ok(c as i64),
            TokenKind::KwTrue => Ok(1),
            TokenKind::KwFalse => Ok(0),
            TokenKind::Identifier(_) => Ok(0),
            TokenKind::LParen => {
                let value = self.parse_ternary()?;
                if !self.eat(&TokenKind::RParen) {
                    return Err("expected ')' in preprocessor expression".to_string());
                }
                Ok(value)
            }
            other => Err(format!("unexpected token '{other}' in preprocessor expression")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BinOp {
    LogOr, LogAnd, BitOr, BitXor, BitAnd, Eq, Ne, Lt, Gt, Le, Ge, Shl, Shr, Add, Sub, Mul, Div, Mod,
}

fn binary_op_info(kind: &TokenKind) -> Option<(u8, BinOp)> {
    use TokenKind::*;
    Some(match kind {
        PipePipe => (1, BinOp::LogOr),
        AmpAmp => (2, BinOp::LogAnd),
        Pipe => (3, BinOp::BitOr),
        Caret => (4, BinOp::BitXor),
        Amp => (5, BinOp::BitAnd),
        EqEq => (6, BinOp::Eq),
        BangEq => (6, BinOp::Ne),
        Lt => (7, BinOp::Lt),
        Gt => (7, BinOp::Gt),
        LtEq => (7, BinOp::Le),
        GtEq => (7, BinOp::Ge),
        LtLt => (8, BinOp::Shl),
        GtGt => (8, BinOp::Shr),
        Plus => (9, BinOp::Add),
        Minus => (9, BinOp::Sub),
        Star => (10, BinOp::Mul),
        Slash => (10, BinOp::Div),
        Percent => (10, BinOp::Mod),
        _ => return None,
    })
}

fn apply_binary(op: BinOp, a: i64, b: i64) -> EvalResult {
    use BinOp::*;
    Ok(match op {
        LogOr => ((a != 0) || (b != 0)) as i64,
        LogAnd => ((a != 0) && (b != 0)) as i64,
        BitOr => a | b,
        BitXor => a ^ b,
        BitAnd => a & b,
        Eq => (a == b) as i64,
        Ne => (a != b) as i64,
        Lt => (a < b) as i64,
        Gt => (a > b) as i64,
        Le => (a <= b) as i64,
        Ge => (a >= b) as i64,
        Shl => a.wrapping_shl(b as u32),
        Shr => a.wrapping_shr(b as u32),
        Add => a.wrapping_add(b),
        Sub => a.wrapping_sub(b),
        Mul => a.wrapping_mul(b),
        Div => {
            if b == 0 {
                return Err("division by zero in preprocessor expression".to_string());
            }
            a.wrapping_div(b)
        }
        Mod => {
            if b == 0 {
                return Err("modulo by zero in preprocessor expression".to_string());
            }
            a.wrapping_rem(b)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcc_lexer::Lexer;

    fn eval(src: &str, macros: &MacroTable) -> i64 {
        let mut toks = Lexer::new(src, 0).tokenize();
        toks.pop();
        let mut diags = Diagnostics::new();
        let mut counter = 0u64;
        let mut ctx = ExpansionContext { file_id: 0, file_name: "t.c", counter: &mut counter };
        evaluate(toks, macros, &mut ctx, &mut diags)
    }

    #[test]
    fn arithmetic_and_precedence() {
        let macros = MacroTable::new();
        assert_eq!(eval("1 + 2 * 3", &macros), 7);
        assert_eq!(eval("(1 + 2) * 3", &macros), 9);
    }

    #[test]
    fn logical_operators_both_sides_consumed() {
        let macros = MacroTable::new();
        assert_eq!(eval("0 && 1", &macros), 0);
        assert_eq!(eval("1 || 0", &macros), 1);
    }

    #[test]
    fn defined_checks_macro_table_without_expanding() {
        let mut macros = MacroTable::new();
        macros.define(crate::macro_table::Macro {
            name: "FOO".into(),
            kind: crate::macro_table::MacroKind::ObjectLike,
            replacement: Default::default(),
            defined_at: Span::dummy(),
        });
        assert_eq!(eval("defined(FOO)", &macros), 1);
        assert_eq!(eval("defined(BAR)", &macros), 0);
        assert_eq!(eval("defined FOO", &macros), 1);
    }

    #[test]
    fn undefined_identifier_evaluates_to_zero() {
        let macros = MacroTable::new();
        assert_eq!(eval("UNDEFINED_THING == 0", &macros), 1);
    }

    #[test]
    fn division_by_zero_reports_diagnostic() {
        let macros = MacroTable::new();
        let mut toks = Lexer::new("1 / 0", 0).tokenize();
        toks.pop();
        let mut diags = Diagnostics::new();
        let mut counter = 0u64;
        let mut ctx = ExpansionContext { file_id: 0, file_name: "t.c", counter: &mut counter };
        evaluate(toks, &macros, &mut ctx, &mut diags);
        assert!(diags.has_errors());
    }
}
