//! Defines the command-line arguments and subcommands for the Monkey CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "monkey",
    version,
    about = "A tree-walking Monkey interpreter with compile-time macros."
)]
pub struct MonkeyArgs {
    /// Maximum nesting of function calls during evaluation.
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Full pipeline: parse, collect macros, expand, evaluate, print the result.
    Run {
        /// The path to the Monkey script to run.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Print the fully macro-expanded program.
    Macroexpand {
        /// The path to the Monkey script to expand.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Show each macro expansion step with a diff.
    Macrotrace {
        /// The path to the Monkey script to trace.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Show the parsed syntax tree as JSON.
    Ast {
        /// The path to the Monkey script to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// List the top-level macros a script defines.
    ListMacros {
        /// The path to the Monkey script to inspect.
        #[arg(required = true)]
        file: PathBuf,
    },
}
