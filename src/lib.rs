pub use crate::ast::Span;
pub use crate::diagnostics::{to_error_source, ErrorContext, ErrorType, MonkeyError};

pub mod ast;
pub mod cli;
pub mod diagnostics;
pub mod engine;
pub mod macros;
pub mod runtime;
pub mod syntax;
