//! The error kinds shared across lexing, preprocessing, parsing and codegen.
//!
//! Each stage owns its own local recovery: a lexer resynchronizes at the
//! next whitespace, the
//! parser enters panic mode, a directive is skipped to end of line. These
//! variants are what ultimately gets attached to a [`crate::Diagnostic`] or
//! bubbled up to the driver when recovery isn't possible (I/O failure,
//! include-depth overflow, an internal invariant violation).

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum McError {
    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("lexical error: {message}")]
    Lex { message: String },

    #[error("preprocessor error: {message}")]
    Preprocessor { message: String },

    #[error("parse error: {message}")]
    Parse { message: String },

    #[error("semantic error: {message}")]
    Semantic { message: String },

    #[error("codegen error: {message}")]
    Codegen { message: String },

    #[error("internal invariant violated: {message}")]
    Internal { message: String },
}

pub type McResult<T> = Result<T, McError>;

impl McError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn lex(message: impl Into<String>) -> Self {
        Self::Lex { message: message.into() }
    }

    pub fn preprocessor(message: impl Into<String>) -> Self {
        Self::Preprocessor { message: message.into() }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse { message: message.into() }
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        Self::Semantic { message: message.into() }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::Codegen { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}
