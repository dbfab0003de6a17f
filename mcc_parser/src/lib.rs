//! The C parser: precedence-climbing expressions, the full
//! declarator grammar (named and abstract), statement parsing with
//! panic-mode recovery, and per-standard feature gating.
//!
//! `Parser<S>` is generic over [`token_source::TokenSource`] so it can run
//! either directly over `mcc_preprocessor::Preprocessor::preprocess`'s
//! output or over hand-built token vectors in tests.

mod declarator;
mod expr;
mod stmt;

pub mod error_recovery;
pub mod feature;
pub mod parser;
pub mod precedence;
pub mod token_source;

pub use parser::Parser;
pub use token_source::{TokenSource, VecTokenSource};
