//! The Monkey Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::{fs, path::Path, process};

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};

use crate::cli::args::{Command, MonkeyArgs};
use crate::cli::output::{print_result, print_trace, StdoutSink};
use crate::engine::{on_eval_stack, Engine, EngineOptions, SourceContext};
use crate::runtime::EvalOptions;
use crate::syntax::parser;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = MonkeyArgs::parse();
    let options = engine_options(args.max_depth);

    // Evaluation recurses on the native stack, so every handler runs on the
    // dedicated evaluation thread.
    let result = on_eval_stack(|| dispatch(&args.command, options))
        .into_diagnostic()
        .wrap_err("failed to start the evaluation thread")
        .and_then(|result| result);

    if let Err(report) = result {
        eprintln!("{:?}", report);
        process::exit(1);
    }
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch(command: &Command, options: EngineOptions) -> Result<()> {
    match command {
        Command::Run { file } => handle_run(file, options),
        Command::Macroexpand { file } => handle_macroexpand(file, options),
        Command::Macrotrace { file } => handle_macrotrace(file, options),
        Command::Ast { file } => handle_ast(file),
        Command::ListMacros { file } => handle_list_macros(file, options),
    }
}

fn engine_options(max_depth: Option<usize>) -> EngineOptions {
    let mut options = EngineOptions::default();
    if let Some(max_depth) = max_depth {
        options.eval = EvalOptions { max_depth };
    }
    options
}

fn load_source(path: &Path) -> Result<SourceContext> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    Ok(SourceContext::from_file(path.display().to_string(), content))
}

/// Handles the `run` subcommand.
fn handle_run(path: &Path, options: EngineOptions) -> Result<()> {
    let source = load_source(path)?;
    let mut sink = StdoutSink;
    let value = Engine::new(&mut sink, options).run(&source)?;
    if !value.is_null() {
        print_result(&value);
    }
    Ok(())
}

/// Handles the `macroexpand` subcommand.
fn handle_macroexpand(path: &Path, options: EngineOptions) -> Result<()> {
    let source = load_source(path)?;
    let mut sink = StdoutSink;
    let expansion = Engine::new(&mut sink, options).expand(&source)?;
    println!("{}", expansion.program);
    Ok(())
}

/// Handles the `macrotrace` subcommand.
fn handle_macrotrace(path: &Path, options: EngineOptions) -> Result<()> {
    let source = load_source(path)?;
    let mut sink = StdoutSink;
    let expansion = Engine::new(&mut sink, options).expand(&source)?;
    print_trace(&expansion.trace);
    Ok(())
}

/// Handles the `ast` subcommand. Parsing only; macros are neither collected
/// nor expanded.
fn handle_ast(path: &Path) -> Result<()> {
    let source = load_source(path)?;
    let program = parser::parse(&source).map_err(|e| e.with_source(&source.to_named_source()))?;
    let json = serde_json::to_string_pretty(&program).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

/// Handles the `list-macros` subcommand.
fn handle_list_macros(path: &Path, options: EngineOptions) -> Result<()> {
    let source = load_source(path)?;
    let mut sink = StdoutSink;
    let expansion = Engine::new(&mut sink, options).expand(&source)?;
    for name in &expansion.macros {
        println!("{}", name);
    }
    Ok(())
}
