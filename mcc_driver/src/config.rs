//! Parsed CLI state: include paths, predefined
//! and undefined macros, the configured standard, the selected backend
//! target, and the driver's mode flags. This is the only configuration
//! surface — there is no project config file; everything is a CLI flag.

use std::path::PathBuf;

use clap::Parser as ClapParser;
use mcc_common::CStd;

/// Which assembly dialect/target `-m<arch>` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    X86Gas,
    X86Nasm,
    Ppc64le,
}

impl Target {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "x86" | "x86-gas" | "i386" => Target::X86Gas,
            "x86-nasm" => Target::X86Nasm,
            "ppc64le" | "ppc64" | "powerpc64le" => Target::Ppc64le,
            _ => return None,
        })
    }
}

/// One `-Dname[=value]` entry.
#[derive(Debug, Clone)]
pub struct Define {
    pub name: String,
    pub value: Option<String>,
}

fn parse_define(raw: &str) -> Result<Define, String> {
    match raw.split_once('=') {
        Some((name, value)) => Ok(Define { name: name.to_string(), value: Some(value.to_string()) }),
        None => Ok(Define { name: raw.to_string(), value: None }),
    }
}

fn parse_std(raw: &str) -> Result<CStd, String> {
    CStd::parse(raw).ok_or_else(|| format!("unrecognized -std= value '{raw}' (expected c89|c99|c11|c17|c23)"))
}

fn parse_target(raw: &str) -> Result<Target, String> {
    Target::parse(raw).ok_or_else(|| format!("unrecognized -m target '{raw}' (expected x86|x86-nasm|ppc64le)"))
}

/// Raw CLI flags, one field per switch this driver accepts. `clap`'s derive
/// API models this as a flat flag set, since this CLI has no subcommands.
#[derive(Debug, ClapParser)]
#[command(name = "mcc", about = "The MCC/ANVIL C compiler driver")]
pub struct Cli {
    /// Source files to compile.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Appends a directory to the `#include` search path.
    #[arg(short = 'I', value_name = "path")]
    pub include_paths: Vec<PathBuf>,

    /// Predefines a macro, optionally with `=value`.
    #[arg(short = 'D', value_name = "name[=value]", value_parser = parse_define)]
    pub defines: Vec<Define>,

    /// Undefines a macro.
    #[arg(short = 'U', value_name = "name")]
    pub undefs: Vec<String>,

    /// Selects the C standard used for feature gating and predefined macros.
    #[arg(long = "std", value_name = "c89|c99|c11|c17|c23", default_value = "c17", value_parser = parse_std)]
    pub std: CStd,

    /// Selects the backend target.
    #[arg(short = 'm', value_name = "arch", default_value = "x86", value_parser = parse_target)]
    pub target: Target,

    /// Emits assembly text, the only output form this driver produces
    /// (accepted as a flag anyway, for compatibility with `cc`-style CLIs).
    #[arg(short = 'S')]
    pub emit_asm: bool,

    /// Stops after preprocessing and prints the expanded source.
    #[arg(short = 'E')]
    pub expand_only: bool,

    /// Output file path; stdout if omitted.
    #[arg(short = 'o', value_name = "file")]
    pub output: Option<PathBuf>,

    /// Enables debug logging regardless of `RUST_LOG`.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// The resolved configuration a single translation unit is compiled under.
/// Separated from [`Cli`] so tests can build one directly without going
/// through argument parsing.
#[derive(Debug, Clone)]
pub struct Config {
    pub include_paths: Vec<PathBuf>,
    pub defines: Vec<Define>,
    pub undefs: Vec<String>,
    pub std: CStd,
    pub target: Target,
    pub emit_asm: bool,
    pub expand_only: bool,
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            include_paths: cli.include_paths.clone(),
            defines: cli.defines.clone(),
            undefs: cli.undefs.clone(),
            std: cli.std,
            target: cli.target,
            emit_asm: cli.emit_asm,
            expand_only: cli.expand_only,
        }
    }
}

/// Search-path environment variable consulted alongside `-I` ("A
/// search-path environment variable may append to include paths").
pub const INCLUDE_PATH_ENV_VAR: &str = "MCC_INCLUDE_PATH";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_without_value_defaults_to_none() {
        let d = parse_define("FOO").unwrap();
        assert_eq!(d.name, "FOO");
        assert!(d.value.is_none());
    }

    #[test]
    fn define_with_value_splits_on_first_equals() {
        let d = parse_define("FOO=1=2").unwrap();
        assert_eq!(d.name, "FOO");
        assert_eq!(d.value.as_deref(), Some("1=2"));
    }

    #[test]
    fn target_accepts_known_aliases() {
        assert_eq!(Target::parse("x86"), Some(Target::X86Gas));
        assert_eq!(Target::parse("powerpc64le"), Some(Target::Ppc64le));
        assert_eq!(Target::parse("bogus"), None);
    }
}
