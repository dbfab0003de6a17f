//! Library half of the `mcc` driver: the CLI config types, the filesystem
//! `FileLoader`, the minimal AST-to-IR lowering, and the `pipeline` module
//! that wires the whole source-to-assembly run. Split out from `main.rs`
//! (which is a thin wrapper over [`pipeline::compile`]) so the pipeline can
//! be exercised directly from integration tests without spawning the
//! binary.

pub mod config;
pub mod fs_loader;
pub mod lower;
pub mod pipeline;

pub use config::{Cli, Config, Target};
pub use pipeline::{compile, CompileOutput};
