//! The typed AST node set and C type graph (component C): declarations,
//! statements, expressions, and the arena-backed type model they reference,
//! plus the typedef scope the parser consults to resolve C's
//! declaration-vs-expression ambiguity.

pub mod ast;
pub mod typedef_scope;
pub mod types;

pub use ast::*;
pub use typedef_scope::TypedefScope;
pub use types::{AggKind, FloatKind, IntKind, Qualifiers, Signedness, TypeArena, TypeId, TypeKind, TypeNode};
