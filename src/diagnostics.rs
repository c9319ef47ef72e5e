//!
//! ****************************************************************************************
//! ** ERROR CONSTRUCTION RULES FOR Monkey Error Macros (`err_msg!`, `err_ctx!`)           **
//! ****************************************************************************************
//!
//! # Overview
//!
//! This module defines the unified, `miette`-based diagnostic system for the Monkey
//! interpreter. Every failure produced by parsing, macro expansion or evaluation is a
//! [`MonkeyError`]. Errors are built with the `err_msg!` and `err_ctx!` macros.
//!
//! # Error Construction Macros
//!
//! - **Use `err_msg!` for message-only errors.**
//!   - `err_msg!(Internal, "rewriter lost the program root")`
//!
//! - **Use `err_ctx!` when a span is known.**
//!   - `err_ctx!(Eval, span, "identifier not found: {}", name)`
//!
//! # Rules
//!
//! - **Never attach the source text where the error is raised.**
//!   Parser, expander and evaluator only know spans. The engine attaches the
//!   source once, at the boundary, via [`MonkeyError::with_source`].
//!
//! - **Never pass a `usize` as a span.**
//!   Always construct and pass a `Span`.
//!
//! - **Attach help with [`MonkeyError::with_help`].**
//!
//! ****************************************************************************************

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::Span;

// Type aliases for clarity and brevity
pub type SourceArc = Arc<NamedSource<String>>;

/// Coarse classification of a [`MonkeyError`] by pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Invalid syntax, bad literals, duplicate parameters
    Parse,
    /// Macro collection, expansion and quote/unquote failures
    Expansion,
    /// Runtime evaluation errors and type mismatches
    Eval,
    /// Interpreter defects
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Parse => "Parse",
            ErrorType::Expansion => "Expansion",
            ErrorType::Eval => "Eval",
            ErrorType::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single additional label for multi-span diagnostics.
#[derive(Debug, Clone)]
pub struct RelatedLabel {
    pub span: Span,
    pub label: String,
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The source the span points into (attached at the engine boundary).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
    /// Additional labeled spans in the same source.
    pub related: Vec<RelatedLabel>,
}

impl ErrorContext {
    /// Returns an empty error context (no source, span, or help).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with only a span.
    pub fn with_span(span: Span) -> Self {
        Self {
            span: Some(span),
            ..Self::default()
        }
    }
}

/// Unified error type for every Monkey failure mode.
///
/// The macro-specific variants are all fatal to the load: the engine stops before
/// evaluating any of the user's program.
#[derive(Debug, Error)]
pub enum MonkeyError {
    #[error("Parse error: {message}")]
    Parse { message: String, ctx: ErrorContext },
    #[error("Evaluation error: {message}")]
    Eval { message: String, ctx: ErrorContext },
    #[error("Type error: {message}")]
    TypeError { message: String, ctx: ErrorContext },
    #[error("Malformed macro result: {message}")]
    MalformedMacroResult { message: String, ctx: ErrorContext },
    #[error("Macro arity mismatch: {message}")]
    ArityMismatch { message: String, ctx: ErrorContext },
    #[error("Unsupported unquote argument: {message}")]
    UnsupportedUnquoteArgument { message: String, ctx: ErrorContext },
    #[error("Unsupported unquote arity: {message}")]
    UnsupportedUnquoteArity { message: String, ctx: ErrorContext },
    #[error("Unknown node variant: {message}")]
    UnknownNodeVariant { message: String, ctx: ErrorContext },
    #[error("Internal error: {message}")]
    Internal { message: String, ctx: ErrorContext },
}

impl MonkeyError {
    fn parts(&self) -> (&str, &ErrorContext) {
        match self {
            MonkeyError::Parse { message, ctx }
            | MonkeyError::Eval { message, ctx }
            | MonkeyError::TypeError { message, ctx }
            | MonkeyError::MalformedMacroResult { message, ctx }
            | MonkeyError::ArityMismatch { message, ctx }
            | MonkeyError::UnsupportedUnquoteArgument { message, ctx }
            | MonkeyError::UnsupportedUnquoteArity { message, ctx }
            | MonkeyError::UnknownNodeVariant { message, ctx }
            | MonkeyError::Internal { message, ctx } => (message, ctx),
        }
    }

    fn ctx_mut(&mut self) -> &mut ErrorContext {
        match self {
            MonkeyError::Parse { ctx, .. }
            | MonkeyError::Eval { ctx, .. }
            | MonkeyError::TypeError { ctx, .. }
            | MonkeyError::MalformedMacroResult { ctx, .. }
            | MonkeyError::ArityMismatch { ctx, .. }
            | MonkeyError::UnsupportedUnquoteArgument { ctx, .. }
            | MonkeyError::UnsupportedUnquoteArity { ctx, .. }
            | MonkeyError::UnknownNodeVariant { ctx, .. }
            | MonkeyError::Internal { ctx, .. } => ctx,
        }
    }

    /// The bare message, without the variant prefix.
    pub fn message(&self) -> &str {
        self.parts().0
    }

    /// The primary span, if one was recorded.
    pub fn span(&self) -> Option<Span> {
        self.parts().1.span
    }

    /// Returns the phase classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            MonkeyError::Parse { .. } => ErrorType::Parse,
            MonkeyError::Eval { .. } | MonkeyError::TypeError { .. } => ErrorType::Eval,
            MonkeyError::MalformedMacroResult { .. }
            | MonkeyError::ArityMismatch { .. }
            | MonkeyError::UnsupportedUnquoteArgument { .. }
            | MonkeyError::UnsupportedUnquoteArity { .. } => ErrorType::Expansion,
            MonkeyError::UnknownNodeVariant { .. } | MonkeyError::Internal { .. } => {
                ErrorType::Internal
            }
        }
    }

    /// Attaches the source text, keeping any source already present.
    pub fn with_source(mut self, source: &SourceArc) -> Self {
        let ctx = self.ctx_mut();
        if ctx.source.is_none() {
            ctx.source = Some(Arc::clone(source));
        }
        self
    }

    /// Records `span` as the primary span unless a more precise one is already set.
    pub fn at(mut self, span: Span) -> Self {
        let ctx = self.ctx_mut();
        if ctx.span.is_none() {
            ctx.span = Some(span);
        }
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.ctx_mut().help = Some(help.into());
        self
    }

    pub fn with_related(mut self, span: Span, label: impl Into<String>) -> Self {
        self.ctx_mut().related.push(RelatedLabel {
            span,
            label: label.into(),
        });
        self
    }
}

impl Diagnostic for MonkeyError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self.error_type() {
            ErrorType::Parse => "monkey::parse",
            ErrorType::Expansion => "monkey::expansion",
            ErrorType::Eval => "monkey::eval",
            ErrorType::Internal => "monkey::internal",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.parts()
            .1
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.parts()
            .1
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (message, ctx) = self.parts();
        // Labels without a source cannot be rendered.
        ctx.source.as_ref()?;
        let mut labels = Vec::new();
        if let Some(span) = ctx.span {
            labels.push(LabeledSpan::new(
                Some(message.to_string()),
                span.start,
                label_len(span),
            ));
        }
        for rel in &ctx.related {
            labels.push(LabeledSpan::new(
                Some(rel.label.clone()),
                rel.span.start,
                label_len(rel.span),
            ));
        }
        if labels.is_empty() {
            None
        } else {
            Some(Box::new(labels.into_iter()))
        }
    }
}

fn label_len(span: Span) -> usize {
    if span.end > span.start {
        span.end - span.start
    } else {
        1
    }
}

/// Converts a source string into an `Arc<NamedSource<String>>` for use in error contexts.
pub fn to_error_source<S: AsRef<str>>(name: &str, source: S) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}

/// Constructs a MonkeyError variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $($arg:tt)+) => {
        $crate::MonkeyError::$variant {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
        }
    };
}

/// Constructs a MonkeyError variant with a formatted message and a primary span.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $span:expr, $($arg:tt)+) => {
        $crate::MonkeyError::$variant {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::with_span($span),
        }
    };
}
