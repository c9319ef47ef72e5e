//! Runtime: values, environments, builtins and the tree-walking evaluator.

pub mod builtins;
pub mod environment;
pub mod eval;
pub mod value;

pub use environment::Environment;
pub use eval::{EvalOptions, Evaluator};
pub use value::{Function, HashKey, MacroValue, Value};

/// Destination for program output (`puts`).
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

/// Discards everything.
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _text: &str) {}
}
