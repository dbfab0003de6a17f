//! Shared utilities for the MCC front end and the ANVIL IR/backend crates.
//!
//! This crate provides:
//! - Error types and handling utilities ([`McError`])
//! - Source location tracking ([`Span`], [`Spanned`])
//! - Diagnostic collection ([`Diagnostics`])
//! - A small arena for ID-indexed graphs ([`arena::Arena`])

pub mod arena;
pub mod diagnostics;
pub mod error;
pub mod span;
pub mod std_version;

pub use arena::{Arena, Id};
pub use diagnostics::*;
pub use error::*;
pub use span::*;
pub use std_version::CStd;
