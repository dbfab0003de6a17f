//! The `mcc` binary: parses the CLI surface and hands each input file
//! to [`mcc_driver::pipeline::compile`].

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser as ClapParser;

use mcc_driver::config::{Cli, Config, INCLUDE_PATH_ENV_VAR};
use mcc_driver::pipeline;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::from(&cli);

    let mut had_error = false;
    for input in &cli.inputs {
        match compile_one(input, &config, &cli.output) {
            Ok(()) => {}
            Err(err) => {
                eprintln!("mcc: {err:#}");
                had_error = true;
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
    env_logger::Builder::from_default_env().filter_level(level).format_timestamp(None).format_target(false).init();
}

fn search_paths(config: &Config) -> Vec<PathBuf> {
    let mut paths = config.include_paths.clone();
    if let Ok(env_paths) = std::env::var(INCLUDE_PATH_ENV_VAR) {
        paths.extend(std::env::split_paths(&env_paths));
    }
    paths
}

fn compile_one(input: &PathBuf, config: &Config, output: &Option<PathBuf>) -> anyhow::Result<()> {
    let source = fs::read_to_string(input).with_context(|| format!("reading '{}'", input.display()))?;
    let file_name = input.to_string_lossy().into_owned();

    let out = pipeline::compile(&source, &file_name, config, search_paths(config));
    print_diagnostics(&out.diagnostics);
    if out.diagnostics.has_errors() {
        anyhow::bail!("compilation failed for '{}'", input.display());
    }
    write_output(output, &out.text)
}

fn write_output(output: &Option<PathBuf>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => fs::write(path, text).with_context(|| format!("writing '{}'", path.display())),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn print_diagnostics(diagnostics: &mcc_common::Diagnostics) {
    for diag in diagnostics.iter() {
        eprintln!("{diag}");
    }
}
