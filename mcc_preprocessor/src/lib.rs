//! Macro table, conditional-inclusion stack, and hide-set rescanning
//! expander that together implement the C preprocessing-translation-unit
//! phase.

pub mod cond_expr;
pub mod conditional;
pub mod expander;
pub mod file_loader;
pub mod macro_table;
pub mod preprocessor;

pub use conditional::{ConditionalFrame, ConditionalStack};
pub use expander::{expand_all, ExpansionContext};
pub use file_loader::{FileLoader, MapFileLoader, NullFileLoader};
pub use macro_table::{Macro, MacroKind, MacroTable};
pub use preprocessor::Preprocessor;
