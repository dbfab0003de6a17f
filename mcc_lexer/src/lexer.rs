//! Character-level lexer. Produces a flat `Vec<Token>` for one source file;
//! the preprocessor re-lexes pasted strings through [`Lexer::relex_one`] to
//! satisfy the "pasted token is observationally identical" invariant.

use crate::hide_set::HideSet;
use crate::token::{keyword_kind, FloatSuffix, IntSuffix, Token, TokenKind};
use mcc_common::{Diagnostics, Position, Span};
use unicode_xid::UnicodeXID;

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    cur: Position,
    file_id: u32,
    at_bol: bool,
    diagnostics: Diagnostics,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, file_id: u32) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            cur: Position::start(),
            file_id,
            at_bol: true,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let had_space = self.skip_whitespace_and_comments();
            let at_bol = self.at_bol;
            if self.is_at_end() {
                tokens.push(
                    Token::new(TokenKind::Eof, "", Span::single(self.cur, self.file_id))
                        .with_space(had_space)
                        .with_bol(at_bol),
                );
                break;
            }
            let start = self.cur;
            let kind = self.scan_one();
            let end = self.cur;
            let text = self.input[self.byte_offset(start)..self.byte_offset(end)].to_string();
            self.at_bol = false;
            tokens.push(
                Token::new(kind, text, Span::new(start, end, self.file_id))
                    .with_space(had_space)
                    .with_bol(at_bol),
            );
        }
        tokens
    }

    /// Re-lexes a single synthesized string (the result of `##` pasting) as
    /// exactly one token, per the tokenization invariant in the data model:
    /// a pasted token must be observationally identical to one the lexer
    /// would have produced directly.
    pub fn relex_one(text: &str, file_id: u32) -> Token {
        let mut lx = Lexer::new(text, file_id);
        let had_space = lx.skip_whitespace_and_comments();
        if lx.is_at_end() {
            return Token::new(TokenKind::Placemarker, "", Span::single(lx.cur, file_id));
        }
        let start = lx.cur;
        let kind = lx.scan_one();
        let end = lx.cur;
        if !lx.is_at_end() {
            let rest = &lx.input[lx.byte_offset(lx.cur)..];
            if !rest.trim().is_empty() {
                return Token::new(
                    TokenKind::Error(format!("pasting produced invalid token '{text}'")),
                    text.to_string(),
                    Span::single(start, file_id),
                );
            }
        }
        Token::new(kind, text, Span::new(start, end, file_id)).with_space(had_space)
    }

    fn byte_offset(&self, pos: Position) -> usize {
        pos.offset as usize
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().nth(1)
    }

    fn advance(&mut self) -> char {
        let c = self.current_char();
        self.pos += c.len_utf8();
        self.cur.column += 1;
        self.cur.offset += c.len_utf8() as u32;
        c
    }

    fn advance_newline(&mut self) {
        self.advance();
        self.cur.line += 1;
        self.cur.column = 1;
    }

    /// Skips whitespace and comments, honoring backslash-newline splicing.
    /// Returns whether any whitespace (including a comment, which the
    /// standard treats as a single space) preceded the next token, and
    /// updates `at_bol` when a real newline was crossed.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        let mut had_space = false;
        loop {
            if self.is_at_end() {
                return had_space;
            }
            match self.current_char() {
                ' ' | '\t' | '\r' => {
                    self.advance();
                    had_space = true;
                }
                '\n' => {
                    self.advance_newline();
                    had_space = true;
                    self.at_bol = true;
                }
                '\\' if self.peek_char() == Some('\n') => {
                    self.advance();
                    self.advance_newline();
                    had_space = true;
                }
                '/' if self.peek_char() == Some('/') => {
                    while !self.is_at_end() && self.current_char() != '\n' {
                        self.advance();
                    }
                    had_space = true;
                }
                '/' if self.peek_char() == Some('*') => {
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while !self.is_at_end() {
                        if self.current_char() == '*' && self.peek_char() == Some('/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        if self.current_char() == '\n' {
                            self.advance_newline();
                        } else {
                            self.advance();
                        }
                    }
                    if !closed {
                        self.diagnostics.error(
                            "unterminated block comment",
                            Span::single(self.cur, self.file_id),
                        );
                    }
                    had_space = true;
                }
                _ => return had_space,
            }
        }
    }

    fn scan_one(&mut self) -> TokenKind {
        let start = self.cur;
        let c = self.current_char();
        match c {
            '[' => { self.advance(); TokenKind::LBracket }
            ']' => { self.advance(); TokenKind::RBracket }
            '(' => { self.advance(); TokenKind::LParen }
            ')' => { self.advance(); TokenKind::RParen }
            '{' => { self.advance(); TokenKind::LBrace }
            '}' => { self.advance(); TokenKind::RBrace }
            ';' => { self.advance(); TokenKind::Semicolon }
            ',' => { self.advance(); TokenKind::Comma }
            '~' => { self.advance(); TokenKind::Tilde }
            '?' => { self.advance(); TokenKind::Question }
            '"' => self.scan_string(),
            '\'' => self.scan_char(),
            '.' => self.scan_dot(),
            '+' => self.scan_two('+', TokenKind::PlusPlus, '=', TokenKind::PlusEq, TokenKind::Plus),
            '-' => self.scan_minus(),
            '*' => self.scan_eq_variant('*', TokenKind::StarEq, TokenKind::Star),
            '/' => self.scan_eq_variant('/', TokenKind::SlashEq, TokenKind::Slash),
            '%' => self.scan_percent(),
            '=' => self.scan_eq_variant('=', TokenKind::EqEq, TokenKind::Eq),
            '!' => self.scan_eq_variant('!', TokenKind::BangEq, TokenKind::Bang),
            '^' => self.scan_eq_variant('^', TokenKind::CaretEq, TokenKind::Caret),
            ':' => self.scan_colon(),
            '#' => self.scan_hash(),
            '<' => self.scan_lt(),
            '>' => self.scan_gt(),
            '&' => self.scan_two('&', TokenKind::AmpAmp, '=', TokenKind::AmpEq, TokenKind::Amp),
            '|' => self.scan_two('|', TokenKind::PipePipe, '=', TokenKind::PipeEq, TokenKind::Pipe),
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_xid_start() || c == '_' => self.scan_identifier(),
            c => {
                self.advance();
                let msg = format!("unexpected character '{c}'");
                self.diagnostics.error(msg.clone(), Span::single(start, self.file_id));
                TokenKind::Error(msg)
            }
        }
    }

    /// `first`-`first` forms `double`; `first`=`forms `eq_kind`; else `plain`.
    fn scan_two(
        &mut self,
        first: char,
        double: TokenKind,
        eq: char,
        eq_kind: TokenKind,
        plain: TokenKind,
    ) -> TokenKind {
        self.advance();
        if self.current_char() == first {
            self.advance();
            double
        } else if self.current_char() == eq {
            self.advance();
            eq_kind
        } else {
            plain
        }
    }

    fn scan_eq_variant(&mut self, _self_char: char, eq_kind: TokenKind, plain: TokenKind) -> TokenKind {
        self.advance();
        if self.current_char() == '=' {
            self.advance();
            eq_kind
        } else {
            plain
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        self.advance();
        match self.current_char() {
            '-' => { self.advance(); TokenKind::MinusMinus }
            '>' => { self.advance(); TokenKind::Arrow }
            '=' => { self.advance(); TokenKind::MinusEq }
            _ => TokenKind::Minus,
        }
    }

    fn scan_dot(&mut self) -> TokenKind {
        if matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            let start_byte = self.pos;
            self.advance(); // the leading '.'
            while !self.is_at_end() && self.current_char().is_ascii_digit() {
                self.advance();
            }
            return self.finish_float(start_byte);
        }
        if self.peek_char() == Some('.') && self.input[self.pos..].chars().nth(2) == Some('.') {
            self.advance();
            self.advance();
            self.advance();
            return TokenKind::Ellipsis;
        }
        self.advance();
        TokenKind::Dot
    }

    /// `%` alone, `%=`, or the digraphs `%>` (`}`) and `%:` (`#`, with
    /// `%:%:` forming `##`).
    fn scan_percent(&mut self) -> TokenKind {
        self.advance();
        match self.current_char() {
            '=' => { self.advance(); TokenKind::PercentEq }
            '>' => { self.advance(); TokenKind::RBrace }
            ':' => {
                self.advance();
                if self.current_char() == '%' && self.peek_char() == Some(':') {
                    self.advance();
                    self.advance();
                    TokenKind::HashHash
                } else {
                    TokenKind::Hash
                }
            }
            _ => TokenKind::Percent,
        }
    }

    /// `:` alone, or the digraph `:>` (`]`).
    fn scan_colon(&mut self) -> TokenKind {
        self.advance();
        if self.current_char() == '>' {
            self.advance();
            TokenKind::RBracket
        } else {
            TokenKind::Colon
        }
    }

    fn scan_hash(&mut self) -> TokenKind {
        self.advance();
        if self.current_char() == '#' {
            self.advance();
            TokenKind::HashHash
        } else {
            TokenKind::Hash
        }
    }

    fn scan_lt(&mut self) -> TokenKind {
        self.advance();
        match self.current_char() {
            '<' => {
                self.advance();
                if self.current_char() == '=' { self.advance(); TokenKind::LtLtEq } else { TokenKind::LtLt }
            }
            '=' => { self.advance(); TokenKind::LtEq }
            ':' => { self.advance(); TokenKind::LBracket } // digraph <:
            '%' => { self.advance(); TokenKind::LBrace }   // digraph <%
            _ => TokenKind::Lt,
        }
    }

    fn scan_gt(&mut self) -> TokenKind {
        self.advance();
        match self.current_char() {
            '>' => {
                self.advance();
                if self.current_char() == '=' { self.advance(); TokenKind::GtGtEq } else { TokenKind::GtGt }
            }
            '=' => { self.advance(); TokenKind::GtEq }
            _ => TokenKind::Gt,
        }
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start_byte = self.pos;
        self.advance();
        while !self.is_at_end() && (self.current_char().is_xid_continue() || self.current_char() == '_') {
            self.advance();
        }
        let name = &self.input[start_byte..self.pos];
        keyword_kind(name).unwrap_or_else(|| TokenKind::Identifier(name.to_string()))
    }

    fn scan_number(&mut self) -> TokenKind {
        let start_byte = self.pos;
        let is_hex = self.current_char() == '0' && matches!(self.peek_char(), Some('x') | Some('X'));
        if is_hex {
            self.advance();
            self.advance();
            while !self.is_at_end() && (self.current_char().is_ascii_hexdigit()) {
                self.advance();
            }
        } else {
            while !self.is_at_end() && self.current_char().is_ascii_digit() {
                self.advance();
            }
        }
        if !is_hex && self.current_char() == '.' {
            self.advance();
            while !self.is_at_end() && self.current_char().is_ascii_digit() {
                self.advance();
            }
            return self.finish_float(start_byte);
        }
        if !is_hex && matches!(self.current_char(), 'e' | 'E') {
            return self.finish_float_exponent(start_byte);
        }
        let digits = &self.input[start_byte..self.pos];
        let radix = if is_hex { 16 } else if digits.starts_with('0') && digits.len() > 1 { 8 } else { 10 };
        let clean = if is_hex { &digits[2..] } else { digits };
        let value = u64::from_str_radix(clean, radix).unwrap_or(0);
        let suffix = self.scan_int_suffix();
        TokenKind::IntLiteral { value, suffix }
    }

    fn finish_float_exponent(&mut self, start_byte: usize) -> TokenKind {
        self.advance(); // e/E
        if matches!(self.current_char(), '+' | '-') {
            self.advance();
        }
        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            self.advance();
        }
        self.finish_float(start_byte)
    }

    fn finish_float(&mut self, start_byte: usize) -> TokenKind {
        if matches!(self.current_char(), 'e' | 'E') {
            self.advance();
            if matches!(self.current_char(), '+' | '-') {
                self.advance();
            }
            while !self.is_at_end() && self.current_char().is_ascii_digit() {
                self.advance();
            }
        }
        let text = self.input[start_byte..self.pos].to_string();
        let suffix = match self.current_char() {
            'f' | 'F' => { self.advance(); FloatSuffix::F }
            'l' | 'L' => { self.advance(); FloatSuffix::L }
            _ => FloatSuffix::None,
        };
        TokenKind::FloatLiteral { text, suffix }
    }

    fn scan_int_suffix(&mut self) -> IntSuffix {
        let mut unsigned = false;
        let mut long_count = 0;
        loop {
            match self.current_char() {
                'u' | 'U' => { self.advance(); unsigned = true; }
                'l' | 'L' => { self.advance(); long_count += 1; }
                _ => break,
            }
        }
        match (unsigned, long_count) {
            (false, 0) => IntSuffix::None,
            (true, 0) => IntSuffix::U,
            (false, 1) => IntSuffix::L,
            (true, 1) => IntSuffix::UL,
            (false, _) => IntSuffix::LL,
            (true, _) => IntSuffix::ULL,
        }
    }

    fn scan_escape(&mut self) -> char {
        self.advance(); // backslash
        let c = self.advance();
        match c {
            'n' => '\n', 't' => '\t', 'r' => '\r', '0' => '\0',
            '\\' => '\\', '\'' => '\'', '"' => '"', 'a' => '\u{7}',
            'b' => '\u{8}', 'f' => '\u{c}', 'v' => '\u{b}',
            'x' => {
                let mut value: u32 = 0;
                while !self.is_at_end() && self.current_char().is_ascii_hexdigit() {
                    value = value * 16 + self.advance().to_digit(16).unwrap_or(0);
                }
                char::from_u32(value).unwrap_or('\u{FFFD}')
            }
            other => {
                self.diagnostics.error(
                    format!("unknown escape sequence '\\{other}'"),
                    Span::single(self.cur, self.file_id),
                );
                other
            }
        }
    }

    fn scan_char(&mut self) -> TokenKind {
        let start = self.cur;
        self.advance(); // opening quote
        let value = if self.current_char() == '\\' { self.scan_escape() } else { self.advance() };
        if self.current_char() != '\'' {
            self.diagnostics.error("unterminated character literal", Span::single(start, self.file_id));
        } else {
            self.advance();
        }
        TokenKind::CharLiteral(value)
    }

    fn scan_string(&mut self) -> TokenKind {
        let start = self.cur;
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            if self.is_at_end() || self.current_char() == '\n' {
                self.diagnostics.error("unterminated string literal", Span::single(start, self.file_id));
                break;
            }
            match self.current_char() {
                '"' => { self.advance(); break; }
                '\\' => s.push(self.scan_escape()),
                _ => s.push(self.advance()),
            }
        }
        TokenKind::StringLiteral(s)
    }
}

/// Attaches an explicit hide set to every token in a slice; used when the
/// preprocessor hands a freshly re-lexed paste result back into the
/// expansion algorithm.
pub fn paint(tokens: &mut [Token], hide_set: &HideSet) {
    for tok in tokens {
        tok.hide_set = tok.hide_set.union(hide_set);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src, 0).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        let ks = kinds("int main foo_bar");
        assert_eq!(ks[0], TokenKind::KwInt);
        assert!(matches!(ks[1], TokenKind::Identifier(ref s) if s == "main"));
        assert!(matches!(ks[2], TokenKind::Identifier(ref s) if s == "foo_bar"));
    }

    #[test]
    fn lexes_integer_suffixes() {
        let ks = kinds("42 42u 42UL 0x2A");
        assert_eq!(ks[0], TokenKind::IntLiteral { value: 42, suffix: IntSuffix::None });
        assert_eq!(ks[1], TokenKind::IntLiteral { value: 42, suffix: IntSuffix::U });
        assert_eq!(ks[2], TokenKind::IntLiteral { value: 42, suffix: IntSuffix::UL });
        assert_eq!(ks[3], TokenKind::IntLiteral { value: 42, suffix: IntSuffix::None });
    }

    #[test]
    fn function_like_macro_detection_flag() {
        let toks = Lexer::new("FOO(x) FOO (x)", 0).tokenize();
        // FOO immediately followed by '(' with no space
        assert!(!toks[1].had_preceding_space);
        // second FOO has a space before its '('
        assert!(toks[5].had_preceding_space);
    }

    #[test]
    fn directive_start_flag_tracks_lines() {
        let toks = Lexer::new("int x;\n#define A 1", 0).tokenize();
        let hash = toks.iter().find(|t| t.kind == TokenKind::Hash).unwrap();
        assert!(hash.at_bol);
    }

    #[test]
    fn relex_one_round_trips_pasted_identifier() {
        let tok = Lexer::relex_one("v1", 0);
        assert!(matches!(tok.kind, TokenKind::Identifier(ref s) if s == "v1"));
    }
}
