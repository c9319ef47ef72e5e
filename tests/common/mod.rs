//! # Monkey Test Helpers
//!
//! Small wrappers over the engine so test files can work from source text.

#![allow(dead_code)]

use monkey::ast::Program;
use monkey::cli::output::OutputBuffer;
use monkey::engine::{expand_source, on_eval_stack, Engine, EngineOptions, SourceContext};
use monkey::runtime::{EvalOptions, Value};
use monkey::syntax::parse_str;
use monkey::{ErrorType, MonkeyError};

pub fn source(text: &str) -> SourceContext {
    SourceContext::from_file("test.mk", text)
}

/// Parses and expands `text`, returning the expanded program.
pub fn expand(text: &str) -> Result<Program, MonkeyError> {
    expand_source(&source(text)).map(|expansion| expansion.program)
}

/// The canonical rendering of `text` as parsed, without any expansion.
pub fn canonical(text: &str) -> String {
    parse_str(text)
        .unwrap_or_else(|e| panic!("expected `{}` to parse: {}", text, e))
        .to_string()
}

/// Asserts that `text` expands to the same tree as `expected` parses to.
pub fn assert_expands_to(text: &str, expected: &str) {
    let program = expand(text).unwrap_or_else(|e| panic!("expansion failed: {:?}", e));
    assert_eq!(program.to_string(), canonical(expected));
}

/// Runs the whole pipeline, returning the value and everything `puts` wrote.
pub fn run_with_output(text: &str) -> (Result<Value, MonkeyError>, String) {
    run_with_options(text, EngineOptions::default())
}

pub fn run_with_options(text: &str, options: EngineOptions) -> (Result<Value, MonkeyError>, String) {
    let mut out = OutputBuffer::new();
    let result = Engine::new(&mut out, options).run(&source(text));
    (result, out.buffer)
}

pub fn run(text: &str) -> Result<Value, MonkeyError> {
    run_with_output(text).0
}

/// Runs `text` with default options on the evaluation thread, as the CLI does.
/// Values are not `Send`, so the result comes back rendered.
pub fn run_on_eval_stack(text: &str) -> Result<String, MonkeyError> {
    on_eval_stack(|| run(text).map(|value| value.to_string())).expect("evaluation thread")
}

pub fn run_ok(text: &str) -> Value {
    run(text).unwrap_or_else(|e| panic!("expected `{}` to run: {:?}", text, e))
}

pub fn with_max_depth(max_depth: usize) -> EngineOptions {
    EngineOptions {
        eval: EvalOptions { max_depth },
    }
}

pub fn error_type_of(result: Result<impl std::fmt::Debug, MonkeyError>) -> ErrorType {
    match result {
        Ok(value) => panic!("expected an error, got {:?}", value),
        Err(e) => e.error_type(),
    }
}
