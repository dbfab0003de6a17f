//! The pipeline driver itself (the data flow): source -> (preprocessor) ->
//! expanded tokens -> (parser) -> AST + type graph -> (minimal lowering) ->
//! ANVIL IR -> (optimizer) -> transformed IR -> (backend) -> assembly text.
//! `main.rs` is a thin CLI wrapper over [`compile`]; tests call it directly.

use std::path::PathBuf;

use anvil_backend::{ppc64le::Ppc64leBackend, x86::gas::X86GasBackend, x86::nasm::X86NasmBackend, Backend};
use mcc_common::{CStd, Diagnostics, McResult};
use mcc_parser::Parser;
use mcc_preprocessor::Preprocessor;

use crate::config::{Config, Target};
use crate::fs_loader::FsFileLoader;
use crate::lower;

/// Either the assembly text of a successful `-S` run, or the joined,
/// re-lexable token text of a `-E` run, plus every diagnostic collected
/// across every stage that actually ran. `text` is empty whenever
/// `diagnostics.has_errors` —, "after any error, code generation is
/// suppressed" — rather than the pipeline bailing out early and discarding
/// diagnostics a caller would otherwise want to print.
pub struct CompileOutput {
    pub text: String,
    pub diagnostics: Diagnostics,
}

/// Runs the whole pipeline over one translation unit's source text.
/// `file_name` feeds `__FILE__`/diagnostic locations; `search_paths`
/// mirrors the driver's resolved `-I`/`MCC_INCLUDE_PATH` list (a plain
/// argument here rather than read from the environment, so tests don't
/// need to mutate process-global state).
pub fn compile(source: &str, file_name: &str, config: &Config, search_paths: Vec<PathBuf>) -> CompileOutput {
    let mut diagnostics = Diagnostics::new();

    let loader = FsFileLoader::new(search_paths);
    let mut pp = Preprocessor::new(config.std, loader);
    for define in &config.defines {
        pp.define_cli(&define.name, define.value.as_deref());
    }
    for undef in &config.undefs {
        pp.undef_cli(undef);
    }

    let tokens = pp.preprocess(source, file_name);
    diagnostics.extend(pp.into_diagnostics());

    if config.expand_only {
        return CompileOutput { text: render_expanded(&tokens), diagnostics };
    }
    if diagnostics.has_errors() {
        return CompileOutput { text: String::new(), diagnostics };
    }

    let parser = Parser::from_tokens(tokens, config.std);
    let (decls, types, parse_diagnostics) = parser.parse_translation_unit();
    diagnostics.extend(parse_diagnostics);
    if diagnostics.has_errors() {
        return CompileOutput { text: String::new(), diagnostics };
    }

    let mut lowering_diagnostics = Diagnostics::new();
    let mut module = lower::lower_translation_unit(&decls, &types, &mut lowering_diagnostics);
    diagnostics.extend(lowering_diagnostics);
    if diagnostics.has_errors() {
        return CompileOutput { text: String::new(), diagnostics };
    }

    anvil_opt::run_to_fixed_point(&mut module);

    match codegen(&module, config.target) {
        Ok(text) => CompileOutput { text, diagnostics },
        Err(err) => {
            diagnostics.error(err.to_string(), mcc_common::Span::dummy());
            CompileOutput { text: String::new(), diagnostics }
        }
    }
}

/// Preprocesses and macro-expands only, with no parser/lowering/codegen
/// involved — the CLI's `-E` shortcut, also handy for tests that only care
/// about the expander (scenarios from table, rows 1-3).
pub fn expand(source: &str, file_name: &str, std: CStd) -> (String, Diagnostics) {
    let mut pp = Preprocessor::new(std, mcc_preprocessor::NullFileLoader);
    let tokens = pp.preprocess(source, file_name);
    (render_expanded(&tokens), pp.into_diagnostics())
}

/// Preprocesses and parses, stopping short of lowering — gives tests (and
/// any future `-ast-dump`-style driver mode) direct access to the AST and
/// type graph without going through codegen.
pub fn parse_translation_unit(source: &str, file_name: &str, std: CStd) -> (Vec<mcc_ast::Decl>, mcc_ast::TypeArena, Diagnostics) {
    let mut pp = Preprocessor::new(std, mcc_preprocessor::NullFileLoader);
    let tokens = pp.preprocess(source, file_name);
    let mut diagnostics = pp.into_diagnostics();

    let parser = Parser::from_tokens(tokens, std);
    let (decls, types, parse_diagnostics) = parser.parse_translation_unit();
    diagnostics.extend(parse_diagnostics);
    (decls, types, diagnostics)
}

fn codegen(module: &anvil_ir::Module, target: Target) -> McResult<String> {
    match target {
        Target::X86Gas => run_backend(X86GasBackend::new(), module),
        Target::X86Nasm => run_backend(X86NasmBackend::new(), module),
        Target::Ppc64le => run_backend(Ppc64leBackend::new(), module),
    }
}

fn run_backend<B: Backend>(mut backend: B, module: &anvil_ir::Module) -> McResult<String> {
    backend.init();
    let asm = backend.codegen_module(module);
    backend.cleanup();
    asm
}

/// Joins token text with a single space wherever the next token had
/// preceding whitespace, a newline wherever it began a new line — enough
/// fidelity to eyeball macro expansion, not a byte-exact re-lex (that's
/// the testable property 1, exercised directly against the lexer/expander
/// rather than through this rendering).
fn render_expanded(tokens: &[mcc_lexer::Token]) -> String {
    let mut out = String::new();
    for (i, tok) in tokens.iter().enumerate() {
        if i > 0 {
            if tok.at_bol {
                out.push('\n');
            } else if tok.had_preceding_space {
                out.push(' ');
            }
        }
        out.push_str(&tok.text);
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_only_config_short_circuits_before_parsing() {
        let config = Config {
            include_paths: vec![],
            defines: vec![],
            undefs: vec![],
            std: CStd::C17,
            target: Target::X86Gas,
            emit_asm: false,
            expand_only: true,
        };
        // `int main( {` would fail to parse, but -E never reaches the parser.
        let out = compile("#define X 1\nint main( { X\n", "t.c", &config, vec![]);
        assert!(!out.diagnostics.has_errors());
        assert!(out.text.contains('1'));
    }

    #[test]
    fn errors_suppress_code_emission() {
        let config = Config {
            include_paths: vec![],
            defines: vec![],
            undefs: vec![],
            std: CStd::C17,
            target: Target::X86Gas,
            emit_asm: true,
            expand_only: false,
        };
        let out = compile("int main( { return 0; }\n", "t.c", &config, vec![]);
        assert!(out.diagnostics.has_errors());
        assert!(out.text.is_empty(), "code generation must be suppressed after a parse error");
    }
}
