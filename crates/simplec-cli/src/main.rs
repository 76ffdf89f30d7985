//! `simplec`: drives the scheduler over a directory of AST fixtures, prints
//! diagnostics, and offers a `hover` subcommand exercising `simplec-lsp`.
//!
//! Parsing is out of scope for this workspace (§2), so there is no
//! `.simple` front end here: fixtures are pre-serialized `Vec<Statement>`
//! JSON, not source text (`driver::load_fixtures`).

mod args;
mod driver;

use anyhow::{bail, Result};
use args::{CliArgs, Command};
use clap::Parser;
use simplec_common::Diagnostic;

fn print_diagnostic(d: &Diagnostic) {
    println!(
        "{}:{}:{}: error[{:?}]: {}",
        d.path, d.range.first_line, d.range.first_column, d.kind, d.message
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = CliArgs::parse();
    match args.command {
        Command::Check { fixtures } => {
            let sources = driver::load_fixtures(&fixtures)?;
            let (engine, _checker) = driver::run_check(sources);
            for diagnostic in &engine.diagnostics.diagnostics {
                print_diagnostic(diagnostic);
            }
            if engine.diagnostics.has_errors() {
                bail!("checking failed with {} diagnostic(s)", engine.diagnostics.diagnostics.len());
            }
            println!("ok: no diagnostics");
        }
        Command::Hover { fixtures, path, line, column } => {
            let sources = driver::load_fixtures(&fixtures)?;
            let (engine, _checker) = driver::run_check(sources);
            for diagnostic in &engine.diagnostics.diagnostics {
                print_diagnostic(diagnostic);
            }
            match simplec_lsp::hover(&engine, &path, line, column) {
                Some(info) => println!(
                    "{}:{}:{}: {}",
                    path, info.range.first_line, info.range.first_column, info.description
                ),
                None => println!("{path}:{line}:{column}: no hover information"),
            }
        }
    }
    Ok(())
}
