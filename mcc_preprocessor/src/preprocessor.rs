//! The top-level preprocessor driver. Owns the macro table, conditional
//! stack, include search state and predefined macros, and turns a raw
//! token stream into the fully macro-expanded output a parser can consume.

use crate::cond_expr;
use crate::conditional::{ConditionalFrame, ConditionalStack};
use crate::expander::{expand_all, ExpansionContext};
use crate::file_loader::FileLoader;
use crate::macro_table::{Macro, MacroKind, MacroTable};
use hashbrown::HashSet;
use log::{debug, warn};
use mcc_common::{CStd, Diagnostics, Span};
use mcc_lexer::{Lexer, Token, TokenKind};
use smallvec::SmallVec;
use std::path::PathBuf;

/// GCC and Clang both default somewhere around this; deep enough for real
/// header trees, shallow enough to turn a self-including header into a
/// diagnosable error instead of a stack overflow.
const DEFAULT_MAX_INCLUDE_DEPTH: usize = 200;

pub struct Preprocessor<L: FileLoader> {
    std: CStd,
    macros: MacroTable,
    conditional: ConditionalStack,
    diagnostics: Diagnostics,
    pragma_once_files: HashSet<PathBuf>,
    counter: u64,
    include_depth: usize,
    max_include_depth: usize,
    loader: L,
    file_names: Vec<String>,
}

impl<L: FileLoader> Preprocessor<L> {
    pub fn new(std: CStd, loader: L) -> Self {
        let mut pp = Self {
            std,
            macros: MacroTable::new(),
            conditional: ConditionalStack::new(),
            diagnostics: Diagnostics::new(),
            pragma_once_files: HashSet::new(),
            counter: 0,
            include_depth: 0,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            loader,
            file_names: Vec::new(),
        };
        pp.install_predefined_macros();
        pp
    }

    pub fn set_max_include_depth(&mut self, depth: usize) {
        self.max_include_depth = depth;
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Installs a `-D NAME` or `-D NAME=VALUE` command-line macro.
    pub fn define_cli(&mut self, name: &str, value: Option<&str>) {
        self.define_object_macro(name, value.unwrap_or("1"));
    }

    /// Removes a macro as if by `-U NAME`.
    pub fn undef_cli(&mut self, name: &str) {
        self.macros.undef(name);
    }

    fn install_predefined_macros(&mut self) {
        self.define_object_macro("__STDC__", "1");
        if let Some(version) = self.std.stdc_version() {
            self.define_object_macro("__STDC_VERSION__", version);
        }
        self.define_object_macro("__STDC_HOSTED__", "1");
        // No `chrono`/`time` dependency: these are fixed placeholders rather
        // than the actual build date, same limitation real bootstrapping
        // compilers accept before they grow a clock dependency.
        self.define_object_macro("__DATE__", "\"Jan  1 1970\"");
        self.define_object_macro("__TIME__", "\"00:00:00\"");
        self.define_object_macro("__MCC__", "1");
        self.define_object_macro("__ANVIL__", "1");
    }

    fn define_object_macro(&mut self, name: &str, replacement_src: &str) {
        let mut toks = Lexer::new(replacement_src, u32::MAX).tokenize();
        toks.pop();
        if let Some(warning) = self.macros.define(Macro {
            name: name.to_string(),
            kind: MacroKind::ObjectLike,
            replacement: SmallVec::from_vec(toks),
            defined_at: Span::dummy(),
        }) {
            self.diagnostics.warning(warning, Span::dummy());
        }
    }

    fn register_file(&mut self, name: String) -> u32 {
        let id = self.file_names.len() as u32;
        self.file_names.push(name);
        id
    }

    /// Preprocesses one translation unit and returns its fully expanded
    /// token stream, terminated by a single `Eof`.
    pub fn preprocess(&mut self, source: &str, file_name: impl Into<String>) -> Vec<Token> {
        let file_id = self.register_file(file_name.into());
        let tokens = Lexer::new(source, file_id).tokenize();
        let mut out = self.process_file_tokens(file_id, tokens);
        out.push(Token::new(TokenKind::Eof, "", Span::dummy()));
        out
    }

    fn process_file_tokens(&mut self, file_id: u32, mut tokens: Vec<Token>) -> Vec<Token> {
        if matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            tokens.pop();
        }
        let mut output = Vec::new();
        let mut pending: Vec<Token> = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let start = i;
            let mut j = i + 1;
            while j < tokens.len() && !tokens[j].at_bol {
                j += 1;
            }
            if tokens[start].at_bol && tokens[start].kind == TokenKind::Hash {
                self.flush_pending(&mut pending, file_id, &mut output);
                self.handle_directive(&tokens[start + 1..j], file_id, &mut output);
            } else if !self.conditional.is_skipping() {
                pending.extend_from_slice(&tokens[start..j]);
            }
            i = j;
        }
        if self.include_depth == 0 && !self.conditional.is_empty() {
            self.diagnostics.error("unterminated conditional directive", Span::dummy());
        }
        self.flush_pending(&mut pending, file_id, &mut output);
        output
    }

    fn flush_pending(&mut self, pending: &mut Vec<Token>, file_id: u32, output: &mut Vec<Token>) {
        if pending.is_empty() {
            return;
        }
        let taken = std::mem::take(pending);
        let file_name = self.file_names[file_id as usize].clone();
        let mut ctx = ExpansionContext { file_id, file_name: &file_name, counter: &mut self.counter };
        let expanded = expand_all(taken, &self.macros, &mut ctx, &mut self.diagnostics);
        output.extend(expanded);
    }

    fn handle_directive(&mut self, toks: &[Token], file_id: u32, output: &mut Vec<Token>) {
        let Some(name_tok) = toks.first() else {
            return; // the null directive, `#` alone on a line
        };
        let Some(name) = directive_name(name_tok) else {
            if !self.conditional.is_skipping() {
                self.diagnostics.warning(
                    format!("invalid preprocessing directive '{}'", name_tok.kind),
                    name_tok.span,
                );
            }
            return;
        };
        let is_conditional = matches!(
            name,
            "if" | "ifdef" | "ifndef" | "elif" | "elifdef" | "elifndef" | "else" | "endif"
        );
        if !is_conditional && self.conditional.is_skipping() {
            return;
        }
        let rest = &toks[1..];
        debug!("directive #{name} at {}", name_tok.span);
        match name {
            "define" => self.handle_define(rest, name_tok.span),
            "undef" => self.handle_undef(rest, name_tok.span),
            "include" => self.handle_include(rest, file_id, output, false),
            "include_next" => self.handle_include(rest, file_id, output, true),
            "if" => self.handle_if(rest, file_id, name_tok.span),
            "ifdef" => self.handle_ifdef(rest, name_tok.span, true),
            "ifndef" => self.handle_ifdef(rest, name_tok.span, false),
            "elif" => self.handle_elif(rest, file_id, name_tok.span),
            "elifdef" => self.handle_elifdef(rest, name_tok.span, true),
            "elifndef" => self.handle_elifdef(rest, name_tok.span, false),
            "else" => self.handle_else(name_tok.span),
            "endif" => self.handle_endif(name_tok.span),
            "error" => self.diagnostics.error(render_message("error", rest), name_tok.span),
            "warning" => self.diagnostics.warning(render_message("warning", rest), name_tok.span),
            "line" => { /* accepted, does not renumber diagnostics in this implementation */ }
            "pragma" => self.handle_pragma(rest, file_id, name_tok.span),
            _ => self
                .diagnostics
                .warning(format!("unknown preprocessing directive '#{name}'"), name_tok.span),
        }
    }

    fn handle_define(&mut self, rest: &[Token], directive_span: Span) {
        let Some(name_tok) = rest.first().filter(|t| t.is_identifier()) else {
            self.diagnostics.error("macro name must be an identifier", directive_span);
            return;
        };
        let name = name_tok.identifier_name().unwrap().to_string();
        let is_function_like = matches!(rest.get(1), Some(t) if t.kind == TokenKind::LParen && !t.had_preceding_space);
        let (kind, body_start) = if is_function_like {
            match parse_param_list(&rest[2..]) {
                Ok((params, variadic, consumed)) => {
                    (MacroKind::FunctionLike { params, variadic }, 2 + consumed)
                }
                Err(message) => {
                    self.diagnostics.error(message, name_tok.span);
                    return;
                }
            }
        } else {
            (MacroKind::ObjectLike, 1)
        };
        let body: Vec<Token> = rest.get(body_start..).unwrap_or(&[]).to_vec();
        if let Some(warning) = self.macros.define(Macro {
            name,
            kind,
            replacement: SmallVec::from_vec(body),
            defined_at: directive_span,
        }) {
            self.diagnostics.warning(warning, directive_span);
        }
    }

    fn handle_undef(&mut self, rest: &[Token], directive_span: Span) {
        match rest.first().and_then(|t| t.identifier_name()) {
            Some(name) => self.macros.undef(name),
            None => self.diagnostics.error("macro name must be an identifier", directive_span),
        }
    }

    fn handle_include(&mut self, rest: &[Token], file_id: u32, output: &mut Vec<Token>, is_next: bool) {
        let Some((name, is_system)) = self.resolve_include_spelling(rest, file_id) else {
            self.diagnostics.error("expected \"FILENAME\" or <FILENAME>", Span::dummy());
            return;
        };
        if self.include_depth >= self.max_include_depth {
            self.diagnostics.error(
                format!("#include nested too deeply (limit {})", self.max_include_depth),
                Span::dummy(),
            );
            return;
        }
        let from_dir = self
            .file_names
            .get(file_id as usize)
            .map(PathBuf::from)
            .and_then(|p| p.parent().map(|d| d.to_path_buf()));
        // `include_next` starts its search past the including file's own
        // directory even for quoted names, per the usual extension semantics.
        let from_dir = if is_next { None } else { from_dir };
        let Some((path, contents)) = self.loader.open(&name, is_system, from_dir.as_deref()) else {
            self.diagnostics.error(format!("'{name}' file not found"), Span::dummy());
            return;
        };
        if self.pragma_once_files.contains(&path) {
            return;
        }
        self.include_depth += 1;
        let included_id = self.register_file(path.to_string_lossy().into_owned());
        let tokens = Lexer::new(&contents, included_id).tokenize();
        let expanded = self.process_file_tokens(included_id, tokens);
        self.include_depth -= 1;
        output.extend(expanded);
    }

    /// `#include` accepts both `<sys/header.h>` (re-lexed from the raw
    /// spelling since `<` and `>` tokenize as separate operators) and a
    /// plain string literal; a macro-expanded name is also permitted.
    fn resolve_include_spelling(&mut self, rest: &[Token], file_id: u32) -> Option<(String, bool)> {
        if let Some(TokenKind::StringLiteral(s)) = rest.first().map(|t| &t.kind) {
            return Some((s.clone(), false));
        }
        if matches!(rest.first().map(|t| &t.kind), Some(TokenKind::Lt)) {
            let mut name = String::new();
            let mut i = 1;
            while i < rest.len() && rest[i].kind != TokenKind::Gt {
                if rest[i].had_preceding_space && !name.is_empty() {
                    name.push(' ');
                }
                name.push_str(&rest[i].text);
                i += 1;
            }
            if i < rest.len() {
                return Some((name, true));
            }
            return None;
        }
        let file_name = self.file_names[file_id as usize].clone();
        let mut ctx = ExpansionContext { file_id, file_name: &file_name, counter: &mut self.counter };
        let expanded = expand_all(rest.to_vec(), &self.macros, &mut ctx, &mut self.diagnostics);
        if let Some(TokenKind::StringLiteral(s)) = expanded.first().map(|t| &t.kind) {
            return Some((s.clone(), false));
        }
        if matches!(expanded.first().map(|t| &t.kind), Some(TokenKind::Lt)) {
            let mut name = String::new();
            for tok in expanded.iter().skip(1) {
                if tok.kind == TokenKind::Gt {
                    return Some((name, true));
                }
                if tok.had_preceding_space && !name.is_empty() {
                    name.push(' ');
                }
                name.push_str(&tok.text);
            }
        }
        None
    }

    fn handle_if(&mut self, rest: &[Token], file_id: u32, span: Span) {
        if self.conditional.is_skipping() {
            self.conditional.push(ConditionalFrame::new(false, span));
            return;
        }
        let file_name = self.file_names[file_id as usize].clone();
        let mut ctx = ExpansionContext { file_id, file_name: &file_name, counter: &mut self.counter };
        let value = cond_expr::evaluate(rest.to_vec(), &self.macros, &mut ctx, &mut self.diagnostics);
        self.conditional.push(ConditionalFrame::new(value != 0, span));
    }

    fn handle_ifdef(&mut self, rest: &[Token], span: Span, want_defined: bool) {
        if self.conditional.is_skipping() {
            self.conditional.push(ConditionalFrame::new(false, span));
            return;
        }
        let defined = rest.first().and_then(|t| t.identifier_name()).is_some_and(|n| self.macros.is_defined(n));
        self.conditional.push(ConditionalFrame::new(defined == want_defined, span));
    }

    fn handle_elif(&mut self, rest: &[Token], file_id: u32, span: Span) {
        let outer_skipping = self.conditional_outer_skipping();
        let Some(frame) = self.conditional.top_mut() else {
            self.diagnostics.error("'#elif' without a matching '#if'", span);
            return;
        };
        if frame.else_seen {
            self.diagnostics.error("'#elif' after '#else'", span);
            return;
        }
        if outer_skipping || frame.any_branch_taken {
            frame.branch_taken = false;
            return;
        }
        let file_name = self.file_names[file_id as usize].clone();
        let mut ctx = ExpansionContext { file_id, file_name: &file_name, counter: &mut self.counter };
        let value = cond_expr::evaluate(rest.to_vec(), &self.macros, &mut ctx, &mut self.diagnostics);
        let taken = value != 0;
        if let Some(frame) = self.conditional.top_mut() {
            frame.branch_taken = taken;
            frame.any_branch_taken |= taken;
        }
    }

    fn handle_elifdef(&mut self, rest: &[Token], span: Span, want_defined: bool) {
        let outer_skipping = self.conditional_outer_skipping();
        let defined = rest.first().and_then(|t| t.identifier_name()).is_some_and(|n| self.macros.is_defined(n));
        let Some(frame) = self.conditional.top_mut() else {
            self.diagnostics.error("'#elifdef'/'#elifndef' without a matching '#if'", span);
            return;
        };
        if frame.else_seen {
            self.diagnostics.error("'#elifdef'/'#elifndef' after '#else'", span);
            return;
        }
        if outer_skipping || frame.any_branch_taken {
            frame.branch_taken = false;
            return;
        }
        let taken = defined == want_defined;
        frame.branch_taken = taken;
        frame.any_branch_taken |= taken;
    }

    fn handle_else(&mut self, span: Span) {
        let outer_skipping = self.conditional_outer_skipping();
        let Some(frame) = self.conditional.top_mut() else {
            self.diagnostics.error("'#else' without a matching '#if'", span);
            return;
        };
        if frame.else_seen {
            self.diagnostics.error("'#else' after '#else'", span);
            return;
        }
        frame.else_seen = true;
        if outer_skipping {
            frame.branch_taken = false;
            return;
        }
        let taken = !frame.any_branch_taken;
        frame.branch_taken = taken;
        frame.any_branch_taken |= taken;
    }

    fn handle_endif(&mut self, span: Span) {
        if self.conditional.pop().is_none() {
            self.diagnostics.error("'#endif' without a matching '#if'", span);
        }
    }

    fn conditional_outer_skipping(&self) -> bool {
        self.conditional.outer_skipping()
    }

    fn handle_pragma(&mut self, rest: &[Token], file_id: u32, span: Span) {
        if matches!(rest.first().and_then(|t| t.identifier_name()), Some("once")) {
            if let Some(name) = self.file_names.get(file_id as usize) {
                self.pragma_once_files.insert(PathBuf::from(name));
            }
            return;
        }
        warn!("ignoring unrecognized #pragma at {span}");
    }
}

fn directive_name(tok: &Token) -> Option<&'static str> {
    match &tok.kind {
        TokenKind::Identifier(name) => match name.as_str() {
            "define" => Some("define"),
            "undef" => Some("undef"),
            "include" => Some("include"),
            "include_next" => Some("include_next"),
            "ifdef" => Some("ifdef"),
            "ifndef" => Some("ifndef"),
            "elif" => Some("elif"),
            "elifdef" => Some("elifdef"),
            "elifndef" => Some("elifndef"),
            "error" => Some("error"),
            "warning" => Some("warning"),
            "line" => Some("line"),
            "pragma" => Some("pragma"),
            _ => None,
        },
        TokenKind::KwIf => Some("if"),
        TokenKind::KwElse => Some("else"),
        _ => None,
    }
}

fn render_message(kind: &str, toks: &[Token]) -> String {
    let text = toks
        .iter()
        .enumerate()
        .map(|(i, t)| if i > 0 && t.had_preceding_space { format!(" {}", t.text) } else { t.text.clone() })
        .collect::<String>();
    if text.is_empty() {
        format!("#{kind}")
    } else {
        text
    }
}

/// Parses the parameter list of a function-like macro definition, starting
/// just past the opening `(`. Returns the parameter names, whether it ends
/// in `...`/a named variadic parameter, and how many tokens (including the
/// closing `)`) were consumed.
fn parse_param_list(toks: &[Token]) -> Result<(Vec<String>, bool, usize), String> {
    let mut params = Vec::new();
    let mut variadic = false;
    let mut i = 0;
    if matches!(toks.first().map(|t| &t.kind), Some(TokenKind::RParen)) {
        return Ok((params, false, 1));
    }
    loop {
        match toks.get(i).map(|t| &t.kind) {
            Some(TokenKind::Ellipsis) => {
                variadic = true;
                i += 1;
                match toks.get(i).map(|t| &t.kind) {
                    Some(TokenKind::RParen) => return Ok((params, variadic, i + 1)),
                    _ => return Err("expected ')' after '...' in macro parameter list".to_string()),
                }
            }
            Some(TokenKind::Identifier(name)) => {
                params.push(name.clone());
                i += 1;
                match toks.get(i).map(|t| &t.kind) {
                    Some(TokenKind::Comma) => {
                        i += 1;
                        continue;
                    }
                    Some(TokenKind::RParen) => return Ok((params, variadic, i + 1)),
                    Some(TokenKind::Ellipsis) => {
                        // GNU named variadic parameter: `args...`.
                        variadic = true;
                        i += 1;
                        match toks.get(i).map(|t| &t.kind) {
                            Some(TokenKind::RParen) => return Ok((params, variadic, i + 1)),
                            _ => return Err("expected ')' after '...' in macro parameter list".to_string()),
                        }
                    }
                    _ => return Err("expected ',' or ')' in macro parameter list".to_string()),
                }
            }
            _ => return Err("expected a parameter name, '...', or ')' in macro parameter list".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_loader::{MapFileLoader, NullFileLoader};

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().filter(|t| t.kind != TokenKind::Eof).map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn object_and_function_like_macros_expand() {
        let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
        let out = pp.preprocess("#define TWICE(x) ((x) + (x))\nTWICE(3)\n", "t.c");
        assert!(!pp.diagnostics().has_errors());
        assert_eq!(texts(&out), vec!["(", "(", "3", ")", "+", "(", "3", ")", ")"]);
    }

    #[test]
    fn conditional_skips_false_branch() {
        let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
        let out = pp.preprocess("#if 0\nshould_not_appear\n#else\nkept\n#endif\n", "t.c");
        assert!(!pp.diagnostics().has_errors());
        assert_eq!(texts(&out), vec!["kept"]);
    }

    #[test]
    fn elif_chain_takes_first_true_branch() {
        let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
        let out = pp.preprocess(
            "#if 0\na\n#elif 1\nb\n#elif 1\nc\n#else\nd\n#endif\n",
            "t.c",
        );
        assert!(!pp.diagnostics().has_errors());
        assert_eq!(texts(&out), vec!["b"]);
    }

    #[test]
    fn ifdef_checks_macro_table() {
        let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
        let out = pp.preprocess("#define FOO\n#ifdef FOO\nyes\n#endif\n#ifndef FOO\nno\n#endif\n", "t.c");
        assert_eq!(texts(&out), vec!["yes"]);
    }

    #[test]
    fn include_splices_expanded_tokens_from_the_loaded_file() {
        let loader = MapFileLoader::new().with_file("greet.h", "#define GREETING hi\n");
        let mut pp = Preprocessor::new(CStd::C17, loader);
        let out = pp.preprocess("#include \"greet.h\"\nGREETING\n", "t.c");
        assert!(!pp.diagnostics().has_errors());
        assert_eq!(texts(&out), vec!["hi"]);
    }

    #[test]
    fn pragma_once_suppresses_second_inclusion() {
        let loader = MapFileLoader::new().with_file("once.h", "#pragma once\nmarker\n");
        let mut pp = Preprocessor::new(CStd::C17, loader);
        let out = pp.preprocess("#include \"once.h\"\n#include \"once.h\"\n", "t.c");
        assert_eq!(texts(&out), vec!["marker"]);
    }

    #[test]
    fn stdc_version_reflects_configured_standard() {
        let mut pp = Preprocessor::new(CStd::C11, NullFileLoader);
        let out = pp.preprocess("__STDC_VERSION__\n", "t.c");
        assert_eq!(texts(&out), vec!["201112L"]);
    }

    #[test]
    fn unterminated_conditional_is_an_error() {
        let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
        pp.preprocess("#if 1\nx\n", "t.c");
        assert!(pp.diagnostics().has_errors());
    }

    #[test]
    fn redefinition_warning_is_reported() {
        let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
        pp.preprocess("#define A 1\n#define A 2\n", "t.c");
        assert!(!pp.diagnostics().has_errors());
        assert_eq!(pp.diagnostics().warnings().count(), 1);
    }
}
