//! The load pipeline: parse → collect macros → expand macros → evaluate.
//!
//! The [`Engine`] owns two environments. Macros are collected into, and
//! expanded from, the macro environment; the expanded program then runs in the
//! runtime environment, which never holds a macro. Both persist across calls,
//! so one engine can load several sources in sequence. A load that fails leaves
//! the macro environment as it was.

use std::sync::Arc;
use std::{io, panic, thread};

use miette::NamedSource;

use crate::ast::Program;
use crate::diagnostics::SourceArc;
use crate::macros::{self, MacroExpansionStep};
use crate::runtime::{Environment, EvalOptions, Evaluator, OutputSink, Value};
use crate::syntax::parser;
use crate::MonkeyError;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// A named piece of source text, for parsing and error reporting.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> SourceArc {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// EVALUATION STACK
// ============================================================================

/// Native stack reserved for evaluation threads.
///
/// Every Monkey call nests several evaluator frames, so the call-depth limit
/// in [`EvalOptions`] is only meaningful on a stack this large. The default
/// limit leaves a wide margin even for unoptimised builds.
pub const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Runs `f` on a scoped thread with an [`EVAL_STACK_SIZE`] stack and returns
/// its result. A panic inside `f` is resumed on the calling thread.
///
/// The engine holds non-`Send` state, so build it inside `f`.
pub fn on_eval_stack<F, R>(f: F) -> io::Result<R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name("monkey-eval".to_string())
            .stack_size(EVAL_STACK_SIZE)
            .spawn_scoped(scope, f)?;
        match handle.join() {
            Ok(result) => Ok(result),
            Err(payload) => panic::resume_unwind(payload),
        }
    })
}

// ============================================================================
// ENGINE
// ============================================================================

/// Engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub eval: EvalOptions,
}

/// The outcome of loading a source up to, but not including, evaluation.
#[derive(Debug, Clone)]
pub struct Expansion {
    /// The program with macro definitions removed and macro calls expanded.
    pub program: Program,
    /// Names of the macros defined by this source, in source order.
    pub macros: Vec<String>,
    /// One step per macro call expanded, in expansion order.
    pub trace: Vec<MacroExpansionStep>,
}

pub struct Engine<'o> {
    output: &'o mut dyn OutputSink,
    options: EngineOptions,
    macro_env: Environment,
    runtime_env: Environment,
}

impl<'o> Engine<'o> {
    pub fn new(output: &'o mut dyn OutputSink, options: EngineOptions) -> Self {
        Self {
            output,
            options,
            macro_env: Environment::new(),
            runtime_env: Environment::new(),
        }
    }

    /// The environment macros are collected into.
    pub fn macro_env(&self) -> &Environment {
        &self.macro_env
    }

    /// The environment ordinary evaluation runs in.
    pub fn runtime_env(&self) -> &Environment {
        &self.runtime_env
    }

    /// Parses `source` and runs macro collection and expansion over it.
    ///
    /// Any error aborts the whole load; nothing of the program is evaluated.
    pub fn expand(&mut self, source: &SourceContext) -> Result<Expansion, MonkeyError> {
        let named = source.to_named_source();
        self.expand_inner(source).map_err(|e| e.with_source(&named))
    }

    /// Expands `source` and evaluates the result, returning the program's value.
    pub fn run(&mut self, source: &SourceContext) -> Result<Value, MonkeyError> {
        let named = source.to_named_source();
        let expansion = self.expand_inner(source).map_err(|e| e.with_source(&named))?;
        let mut evaluator = Evaluator::new(&mut *self.output, &self.options.eval);
        evaluator
            .eval_program(&expansion.program, &self.runtime_env)
            .map_err(|e| e.with_source(&named))
    }

    /// Macros defined by `source` are staged in a child of the macro
    /// environment and only become visible to later loads once the whole
    /// source has expanded.
    fn expand_inner(&mut self, source: &SourceContext) -> Result<Expansion, MonkeyError> {
        let mut program = parser::parse(source)?;
        let staging = Environment::new_child_scope(&self.macro_env);
        let macros = macros::define_macros(&mut program, &staging);
        let mut evaluator = Evaluator::new(&mut *self.output, &self.options.eval);
        let (program, trace) = macros::expand_macros_with_trace(program, &staging, &mut evaluator)?;

        for (name, value) in staging.local_bindings() {
            self.macro_env.set(name, value);
        }
        Ok(Expansion {
            program,
            macros,
            trace,
        })
    }
}

/// Expands `source` with a fresh engine, discarding output produced while
/// expanding.
pub fn expand_source(source: &SourceContext) -> Result<Expansion, MonkeyError> {
    let mut sink = crate::runtime::NullSink;
    Engine::new(&mut sink, EngineOptions::default()).expand(source)
}
