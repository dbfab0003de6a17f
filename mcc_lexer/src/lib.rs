//! Character-level lexer for the MCC C front end.
//!
//! Produces a flat token stream with the whitespace/line-start metadata the
//! preprocessor needs (function-like macro detection, directive starts) and
//! the hide-set field the macro expander paints onto tokens as they flow
//! through expansion.

pub mod hide_set;
pub mod lexer;
pub mod token;

pub use hide_set::HideSet;
pub use lexer::{paint, Lexer};
pub use token::{keyword_kind, spelling, FloatSuffix, IntSuffix, Token, TokenKind};
