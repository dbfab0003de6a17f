//! The ISO C "rescanning and further replacement" macro expansion algorithm
//! with hide sets. This is the hard part of the preprocessor: an
//! incorrect implementation here silently produces wrong code rather than
//! failing loudly.
//!
//! Follows the shape of Dave Prosser's `expand`/`subst`/`hsadd` functions,
//! adapted to operate over an owned token deque instead of a cons-list, since
//! prepending the substitution result back onto the remaining input and
//! continuing the same scan *is* rescanning.

use crate::macro_table::{Macro, MacroTable};
use mcc_common::{Diagnostics, Span};
use mcc_lexer::{HideSet, Lexer, Token, TokenKind};
use std::collections::VecDeque;

/// Per-expansion dynamic state: things that vary by *where* a token is being
/// expanded (current line/file) rather than by macro definition.
pub struct ExpansionContext<'a> {
    pub file_id: u32,
    pub file_name: &'a str,
    pub counter: &'a mut u64,
}

/// Expands a flat token sequence to a fixed point under the rescan-until-
/// stable contract. `tokens` must not include a trailing `Eof`; the
/// caller appends whatever sentinel it needs downstream.
pub fn expand_all(
    tokens: Vec<Token>,
    macros: &MacroTable,
    ctx: &mut ExpansionContext,
    diags: &mut Diagnostics,
) -> Vec<Token> {
    let mut remaining: VecDeque<Token> = tokens.into();
    let mut output = Vec::new();

    while let Some(tok) = remaining.pop_front() {
        if let Some(dynamic) = dynamic_macro_token(&tok, ctx) {
            output.push(dynamic);
            continue;
        }

        let Some(name) = tok.identifier_name().map(str::to_string) else {
            output.push(tok);
            continue;
        };

        if tok.hide_set.contains(&name) {
            output.push(tok);
            continue;
        }

        let Some(mac) = macros.get(&name) else {
            output.push(tok);
            continue;
        };

        if !mac.is_function_like() {
            let new_hide_set = tok.hide_set.extended(&name);
            let substituted = subst_object_like(mac, new_hide_set, macros, ctx, diags);
            prepend(&mut remaining, substituted);
            continue;
        }

        // Function-like: only invoked if the next non-placemarker token is `(`.
        if !matches!(remaining.front(), Some(t) if t.is_lparen()) {
            output.push(tok);
            continue;
        }
        let lparen = remaining.pop_front().unwrap();

        match collect_arguments(&mut remaining, mac, &tok.span) {
            Ok((args, rparen)) => {
                let new_hide_set = tok.hide_set.intersection(&rparen.hide_set).extended(&name);
                let substituted = subst_function_like(mac, &args, new_hide_set, macros, ctx, diags);
                prepend(&mut remaining, substituted);
            }
            Err(message) => {
                diags.error(message, tok.span);
                output.push(tok);
                output.push(lparen);
            }
        }
    }

    output
}

fn prepend(remaining: &mut VecDeque<Token>, tokens: Vec<Token>) {
    for tok in tokens.into_iter().rev() {
        remaining.push_front(tok);
    }
}

fn dynamic_macro_token(tok: &Token, ctx: &mut ExpansionContext) -> Option<Token> {
    let name = tok.identifier_name()?;
    if tok.hide_set.contains(name) {
        return None;
    }
    let span = tok.span;
    match name {
        "__LINE__" => Some(Token::new(
            TokenKind::IntLiteral { value: span.start.line as u64, suffix: mcc_lexer::IntSuffix::None },
            span.start.line.to_string(),
            span,
        )),
        "__FILE__" => Some(Token::new(
            TokenKind::StringLiteral(ctx.file_name.to_string()),
            format!("\"{}\"", ctx.file_name),
            span,
        )),
        "__BASE_FILE__" => Some(Token::new(
            TokenKind::StringLiteral(ctx.file_name.to_string()),
            format!("\"{}\"", ctx.file_name),
            span,
        )),
        "__COUNTER__" => {
            let value = *ctx.counter;
            *ctx.counter += 1;
            Some(Token::new(
                TokenKind::IntLiteral { value, suffix: mcc_lexer::IntSuffix::None },
                value.to_string(),
                span,
            ))
        }
        _ => None,
    }
}

/// Splits the tokens between a function-like macro's `(` and its matching
/// `)` into raw argument token lists, honoring nested parens (commas inside
/// them do not separate arguments).
fn collect_arguments(
    remaining: &mut VecDeque<Token>,
    mac: &Macro,
    call_span: &Span,
) -> Result<(Vec<Vec<Token>>, Token), String> {
    let mut args: Vec<Vec<Token>> = vec![Vec::new()];
    let mut depth = 0usize;
    let rparen;
    loop {
        let Some(tok) = remaining.pop_front() else {
            return Err(format!("unterminated argument list for macro invocation at {call_span}"));
        };
        match tok.kind {
            TokenKind::LParen => {
                depth += 1;
                args.last_mut().unwrap().push(tok);
            }
            TokenKind::RParen if depth == 0 => {
                rparen = tok;
                break;
            }
            TokenKind::RParen => {
                depth -= 1;
                args.last_mut().unwrap().push(tok);
            }
            TokenKind::Comma if depth == 0 => {
                args.push(Vec::new());
            }
            TokenKind::Eof => {
                return Err(format!("unterminated argument list for macro invocation at {call_span}"));
            }
            _ => args.last_mut().unwrap().push(tok),
        }
    }

    // A macro invoked with an empty argument list, e.g. `F()`, yields one
    // empty (placemarker) argument rather than zero.
    if args.len() == 1 && args[0].is_empty() && mac.params().is_empty() && !mac.is_variadic() {
        args.clear();
    }

    if mac.is_variadic() {
        let named = mac.params().len();
        if args.len() < named {
            return Err(format!(
                "macro '{}' requires at least {named} arguments, got {}",
                mac.name,
                args.len()
            ));
        }
        let variadic_parts = args.split_off(named);
        let mut va_args = Vec::new();
        for (i, part) in variadic_parts.into_iter().enumerate() {
            if i > 0 {
                va_args.push(Token::new(TokenKind::Comma, ",", *call_span));
            }
            va_args.extend(part);
        }
        args.push(va_args);
    } else if args.len() != mac.params().len() {
        return Err(format!(
            "macro '{}' expects {} arguments, got {}",
            mac.name,
            mac.params().len(),
            args.len()
        ));
    }

    Ok((args, rparen))
}

fn subst_object_like(
    mac: &Macro,
    new_hide_set: HideSet,
    macros: &MacroTable,
    ctx: &mut ExpansionContext,
    diags: &mut Diagnostics,
) -> Vec<Token> {
    subst(&mac.replacement, &[], &[], false, new_hide_set, macros, ctx, diags)
}

fn subst_function_like(
    mac: &Macro,
    args: &[Vec<Token>],
    new_hide_set: HideSet,
    macros: &MacroTable,
    ctx: &mut ExpansionContext,
    diags: &mut Diagnostics,
) -> Vec<Token> {
    subst(&mac.replacement, mac.params(), args, mac.is_variadic(), new_hide_set, macros, ctx, diags)
}

/// Finds the argument index for `name`, treating `__VA_ARGS__` as an
/// implicit trailing parameter when the macro is variadic.
fn param_index(params: &[String], variadic: bool, name: &str) -> Option<usize> {
    if let Some(i) = params.iter().position(|p| p == name) {
        return Some(i);
    }
    if variadic && name == "__VA_ARGS__" {
        return Some(params.len());
    }
    None
}

/// Builds the substituted replacement-token sequence for one macro
/// invocation, handling `#` stringize and `##` paste before the uniform
/// hide-set paint is applied by the caller.
#[allow(clippy::too_many_arguments)]
fn subst(
    body: &[Token],
    params: &[String],
    args: &[Vec<Token>],
    variadic: bool,
    new_hide_set: HideSet,
    macros: &MacroTable,
    ctx: &mut ExpansionContext,
    diags: &mut Diagnostics,
) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::new();
    let mut i = 0;
    while i < body.len() {
        let tok = &body[i];

        if tok.kind == TokenKind::Hash {
            match body.get(i + 1).and_then(|t| t.identifier_name()) {
                Some(name) => {
                    if let Some(idx) = param_index(params, variadic, name) {
                        out.push(stringize(&args[idx], tok.span));
                        i += 2;
                        continue;
                    }
                }
                None => {}
            }
            diags.error("'#' is not followed by a macro parameter", tok.span);
            out.push(tok.clone());
            i += 1;
            continue;
        }

        if tok.kind == TokenKind::HashHash {
            if out.is_empty() || i + 1 >= body.len() {
                diags.error("'##' cannot appear at the start or end of a macro body", tok.span);
                i += 1;
                continue;
            }
            let next = &body[i + 1];
            let right = if let Some(name) = next.identifier_name() {
                param_index(params, variadic, name).map(|idx| args[idx].clone())
            } else {
                None
            };
            let right_tokens = right.unwrap_or_else(|| vec![next.clone()]);
            glue(&mut out, right_tokens);
            i += 2;
            continue;
        }

        if let Some(name) = tok.identifier_name() {
            if let Some(idx) = param_index(params, variadic, name) {
                // Adjacent to a following `##`: use the raw (unexpanded)
                // argument; otherwise pre-expand it.
                if matches!(body.get(i + 1), Some(t) if t.kind == TokenKind::HashHash) {
                    out.extend(args[idx].iter().cloned());
                } else {
                    let mut pre_ctx = ExpansionContext {
                        file_id: ctx.file_id,
                        file_name: ctx.file_name,
                        counter: &mut *ctx.counter,
                    };
                    let expanded = expand_all(args[idx].clone(), macros, &mut pre_ctx, diags);
                    out.extend(expanded);
                }
                i += 1;
                continue;
            }
        }

        out.push(tok.clone());
        i += 1;
    }

    for t in &mut out {
        t.hide_set = t.hide_set.union(&new_hide_set);
    }
    out
}

/// `A##B`: concatenates the spelling of the last token of `out` with the
/// spelling of the first token of `right` and re-lexes the result as a
/// single token, observationally identical to a lexer-produced token.
fn glue(out: &mut Vec<Token>, mut right: Vec<Token>) {
    if right.is_empty() {
        // Pasting against an empty (placemarker) argument is a no-op.
        return;
    }
    let Some(left) = out.pop() else {
        out.append(&mut right);
        return;
    };
    let first_right = right.remove(0);
    let pasted_text = format!("{}{}", left.text, first_right.text);
    let mut pasted = Lexer::relex_one(&pasted_text, left.span.file_id);
    pasted.span = left.span.combine(first_right.span);
    pasted.had_preceding_space = left.had_preceding_space;
    out.push(pasted);
    out.extend(right);
}

/// `#X`: stringizes the raw (unexpanded) argument tokens.
fn stringize(arg: &[Token], span: Span) -> Token {
    let mut text = String::new();
    for (i, tok) in arg.iter().enumerate() {
        if i > 0 && tok.had_preceding_space {
            text.push(' ');
        }
        text.push_str(&tok.text);
    }
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('"');
    Token::new(TokenKind::StringLiteral(text), escaped, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macro_table::MacroKind;
    use smallvec::SmallVec;

    fn lex(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src, 0);
        let mut toks = lexer.tokenize();
        toks.pop(); // drop Eof
        toks
    }

    fn run(src: &str, macros: &MacroTable) -> String {
        let mut diags = Diagnostics::new();
        let mut counter = 0u64;
        let mut ctx = ExpansionContext { file_id: 0, file_name: "test.c", counter: &mut counter };
        let result = expand_all(lex(src), macros, &mut ctx, &mut diags);
        result.iter().map(|t| t.text.clone()).collect::<Vec<_>>().join(" ")
    }

    fn define_object(table: &mut MacroTable, name: &str, body: &str) {
        table.define(Macro {
            name: name.to_string(),
            kind: MacroKind::ObjectLike,
            replacement: SmallVec::from_vec(lex(body)),
            defined_at: Span::dummy(),
        });
    }

    fn define_function(table: &mut MacroTable, name: &str, params: &[&str], variadic: bool, body: &str) {
        table.define(Macro {
            name: name.to_string(),
            kind: MacroKind::FunctionLike {
                params: params.iter().map(|s| s.to_string()).collect(),
                variadic,
            },
            replacement: SmallVec::from_vec(lex(body)),
            defined_at: Span::dummy(),
        });
    }

    #[test]
    fn scenario_2_rescans_through_object_like_indirection() {
        let mut table = MacroTable::new();
        define_object(&mut table, "A", "B");
        define_function(&mut table, "B", &["x"], false, "x");
        assert_eq!(run("A(42)", &table), "42");
    }

    #[test]
    fn scenario_3_blue_paint_stops_inner_self_reference() {
        let mut table = MacroTable::new();
        define_function(&mut table, "f", &["x"], false, "x+f");
        assert_eq!(run("f(f)(1)", &table), "f + f ( 1 )");
    }

    #[test]
    fn scenario_1_paste_and_rescan_produce_v1() {
        let mut table = MacroTable::new();
        define_function(&mut table, "CAT", &["a", "b"], false, "a##b");
        define_function(&mut table, "X", &["n"], false, "CAT(v,n)");
        assert_eq!(run("X(1)", &table), "v1");
    }

    #[test]
    fn stringize_inserts_escaped_quotes() {
        let mut table = MacroTable::new();
        define_function(&mut table, "STR", &["x"], false, "#x");
        assert_eq!(run(r#"STR("hi")"#, &table), r#""\"hi\"""#);
    }

    #[test]
    fn variadic_macro_binds_trailing_args_to_va_args() {
        let mut table = MacroTable::new();
        define_function(&mut table, "LOG", &["fmt"], true, "printf(fmt, __VA_ARGS__)");
        assert_eq!(run(r#"LOG("x", 1, 2)"#, &table), r#"printf ( "x" , 1 , 2 )"#);
    }

    #[test]
    fn object_like_self_reference_does_not_loop() {
        let mut table = MacroTable::new();
        define_object(&mut table, "X", "X + 1");
        assert_eq!(run("X", &table), "X + 1");
    }
}
