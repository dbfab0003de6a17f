//! Token definitions for the MCC C front end.

use crate::hide_set::HideSet;
use mcc_common::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The parsed payload of a numeric literal: kept separate from its
/// spelling so the parser never has to re-parse `text`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IntSuffix {
    None,
    U,
    L,
    UL,
    LL,
    ULL,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FloatSuffix {
    None,
    F,
    L,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // --- Literals ---
    IntLiteral { value: u64, suffix: IntSuffix },
    FloatLiteral { text: String, suffix: FloatSuffix },
    CharLiteral(char),
    StringLiteral(String),
    Identifier(String),

    // --- Keywords ---
    KwAuto, KwBreak, KwCase, KwChar, KwConst, KwContinue, KwDefault, KwDo,
    KwDouble, KwElse, KwEnum, KwExtern, KwFloat, KwFor, KwGoto, KwIf,
    KwInline, KwInt, KwLong, KwRegister, KwRestrict, KwReturn, KwShort,
    KwSigned, KwSizeof, KwStatic, KwStruct, KwSwitch, KwTypedef, KwUnion,
    KwUnsigned, KwVoid, KwVolatile, KwWhile,
    // C99+
    KwBool, KwComplex, KwImaginary,
    // C11+
    KwAlignas, KwAlignof, KwAtomic, KwGeneric, KwNoreturn, KwStaticAssert,
    KwThreadLocal,
    // C23
    KwBitInt, KwDecimal128, KwDecimal32, KwDecimal64, KwNullptr, KwTrue,
    KwFalse, KwTypeof, KwTypeofUnqual, KwConstexpr,
    // GNU / common extensions
    KwAsm, KwTypeofGnu,

    // --- Punctuators / operators ---
    LBracket, RBracket, LParen, RParen, LBrace, RBrace,
    Dot, Arrow, PlusPlus, MinusMinus,
    Amp, Star, Plus, Minus, Tilde, Bang,
    Slash, Percent,
    LtLt, GtGt,
    Lt, Gt, LtEq, GtEq, EqEq, BangEq,
    Caret, Pipe, AmpAmp, PipePipe,
    Question, Colon, Semicolon, Ellipsis,
    Eq, StarEq, SlashEq, PercentEq, PlusEq, MinusEq,
    LtLtEq, GtGtEq, AmpEq, CaretEq, PipeEq,
    Comma, Hash, HashHash,

    // --- Special ---
    Newline,
    Eof,
    /// Emitted by the lexer or preprocessor when it cannot make sense of the
    /// input; carries the diagnostic text so the parser can still
    /// synchronize past it in panic mode.
    Error(String),
    /// Produced only by the preprocessor: the placemarker left behind by an
    /// empty macro argument, consumed silently by `##` pasting.
    Placemarker,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        match self {
            IntLiteral { value, .. } => write!(f, "{value}"),
            FloatLiteral { text, .. } => write!(f, "{text}"),
            CharLiteral(c) => write!(f, "'{c}'"),
            StringLiteral(s) => write!(f, "\"{s}\""),
            Identifier(name) => write!(f, "{name}"),
            Error(msg) => write!(f, "<error: {msg}>"),
            Placemarker => write!(f, ""),
            Newline => write!(f, "\\n"),
            Eof => write!(f, "<eof>"),
            _ => write!(f, "{}", spelling(self).unwrap_or("?")),
        }
    }
}

/// The canonical spelling of a fixed-text token kind, used both for
/// `Display` and by the lexer's keyword table.
pub fn spelling(kind: &TokenKind) -> Option<&'static str> {
    use TokenKind::*;
    Some(match kind {
        KwAuto => "auto", KwBreak => "break", KwCase => "case", KwChar => "char",
        KwConst => "const", KwContinue => "continue", KwDefault => "default",
        KwDo => "do", KwDouble => "double", KwElse => "else", KwEnum => "enum",
        KwExtern => "extern", KwFloat => "float", KwFor => "for", KwGoto => "goto",
        KwIf => "if", KwInline => "inline", KwInt => "int", KwLong => "long",
        KwRegister => "register", KwRestrict => "restrict", KwReturn => "return",
        KwShort => "short", KwSigned => "signed", KwSizeof => "sizeof",
        KwStatic => "static", KwStruct => "struct", KwSwitch => "switch",
        KwTypedef => "typedef", KwUnion => "union", KwUnsigned => "unsigned",
        KwVoid => "void", KwVolatile => "volatile", KwWhile => "while",
        KwBool => "_Bool", KwComplex => "_Complex", KwImaginary => "_Imaginary",
        KwAlignas => "_Alignas", KwAlignof => "_Alignof", KwAtomic => "_Atomic",
        KwGeneric => "_Generic", KwNoreturn => "_Noreturn",
        KwStaticAssert => "_Static_assert", KwThreadLocal => "_Thread_local",
        KwBitInt => "_BitInt", KwDecimal128 => "_Decimal128", KwDecimal32 => "_Decimal32",
        KwDecimal64 => "_Decimal64", KwNullptr => "nullptr", KwTrue => "true",
        KwFalse => "false", KwTypeof => "typeof", KwTypeofUnqual => "typeof_unqual",
        KwConstexpr => "constexpr", KwAsm => "asm", KwTypeofGnu => "__typeof__",
        LBracket => "[", RBracket => "]", LParen => "(", RParen => ")",
        LBrace => "{", RBrace => "}", Dot => ".", Arrow => "->",
        PlusPlus => "++", MinusMinus => "--", Amp => "&", Star => "*",
        Plus => "+", Minus => "-", Tilde => "~", Bang => "!",
        Slash => "/", Percent => "%", LtLt => "<<", GtGt => ">>",
        Lt => "<", Gt => ">", LtEq => "<=", GtEq => ">=", EqEq => "==",
        BangEq => "!=", Caret => "^", Pipe => "|", AmpAmp => "&&",
        PipePipe => "||", Question => "?", Colon => ":", Semicolon => ";",
        Ellipsis => "...", Eq => "=", StarEq => "*=", SlashEq => "/=",
        PercentEq => "%=", PlusEq => "+=", MinusEq => "-=", LtLtEq => "<<=",
        GtGtEq => ">>=", AmpEq => "&=", CaretEq => "^=", PipeEq => "|=",
        Comma => ",", Hash => "#", HashHash => "##",
        _ => return None,
    })
}

/// Looks up the keyword kind for an identifier spelling, if any. Feature
/// gating (e.g. `_Bool` before C99) is the parser's job, not the lexer's;
/// the lexer always recognizes the widest keyword set so the parser can
/// issue a precise "not available before -std=..." diagnostic instead of
/// seeing a bare identifier.
pub fn keyword_kind(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "auto" => KwAuto, "break" => KwBreak, "case" => KwCase, "char" => KwChar,
        "const" => KwConst, "continue" => KwContinue, "default" => KwDefault,
        "do" => KwDo, "double" => KwDouble, "else" => KwElse, "enum" => KwEnum,
        "extern" => KwExtern, "float" => KwFloat, "for" => KwFor, "goto" => KwGoto,
        "if" => KwIf, "inline" => KwInline, "int" => KwInt, "long" => KwLong,
        "register" => KwRegister, "restrict" => KwRestrict, "return" => KwReturn,
        "short" => KwShort, "signed" => KwSigned, "sizeof" => KwSizeof,
        "static" => KwStatic, "struct" => KwStruct, "switch" => KwSwitch,
        "typedef" => KwTypedef, "union" => KwUnion, "unsigned" => KwUnsigned,
        "void" => KwVoid, "volatile" => KwVolatile, "while" => KwWhile,
        "_Bool" => KwBool, "_Complex" => KwComplex, "_Imaginary" => KwImaginary,
        "_Alignas" => KwAlignas, "_Alignof" => KwAlignof, "_Atomic" => KwAtomic,
        "_Generic" => KwGeneric, "_Noreturn" => KwNoreturn,
        "_Static_assert" => KwStaticAssert, "_Thread_local" => KwThreadLocal,
        "_BitInt" => KwBitInt, "_Decimal128" => KwDecimal128, "_Decimal32" => KwDecimal32,
        "_Decimal64" => KwDecimal64, "nullptr" => KwNullptr, "true" => KwTrue,
        "false" => KwFalse, "typeof" => KwTypeof, "typeof_unqual" => KwTypeofUnqual,
        "constexpr" => KwConstexpr, "asm" => KwAsm, "__typeof__" => KwTypeofGnu,
        _ => return None,
    })
}

/// A single lexical token with the whitespace metadata the preprocessor
/// needs to decide function-like macro invocation and directive starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    /// Needed for function-like macro detection: a `(` touching the macro
    /// name (no preceding whitespace) makes it an invocation.
    pub had_preceding_space: bool,
    /// Needed for directive detection: `#` only starts a directive at the
    /// beginning of a logical line.
    pub at_bol: bool,
    pub hide_set: HideSet,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            had_preceding_space: false,
            at_bol: false,
            hide_set: HideSet::empty(),
        }
    }

    pub fn with_space(mut self, had_space: bool) -> Self {
        self.had_preceding_space = had_space;
        self
    }

    pub fn with_bol(mut self, at_bol: bool) -> Self {
        self.at_bol = at_bol;
        self
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier(_))
    }

    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_lparen(&self) -> bool {
        matches!(self.kind, TokenKind::LParen)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TokenKind::Error(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}
