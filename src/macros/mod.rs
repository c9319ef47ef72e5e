//! # Monkey Macro Expansion System
//!
//! Macros run at expansion time, before ordinary evaluation. A macro is defined
//! by a top-level `let name = macro(params) { body };`, receives its arguments as
//! unevaluated syntax (quoted values), and must evaluate to a quoted value whose
//! syntax replaces the call site.
//!
//! ## Pipeline
//!
//! 1. [`define_macros`] scans the top-level statements once, binds every macro
//!    definition into the macro environment and drops those statements.
//! 2. [`expand_macros`] runs [`rewrite`] over the remaining program once and
//!    replaces each call to a bound macro with its expansion.
//! 3. The expanded program goes to the ordinary evaluator, which never sees a
//!    macro definition or call.
//!
//! Expansion is a single pass: a macro call produced *by* an expansion is left
//! as is. Macro calls nested inside another macro call's arguments are expanded
//! first, because the rewriter works bottom-up.
//!
//! ## Quote and unquote
//!
//! `quote(expr)` turns `expr` into a value without evaluating it. Inside the
//! quoted fragment, `unquote(x)` evaluates `x` in the environment where `quote`
//! was called and splices the result back as syntax; see [`quote`].
//!
//! ## Error Handling
//!
//! Every failure here is fatal to the load: `MalformedMacroResult`,
//! `ArityMismatch`, `UnsupportedUnquoteArgument`, `UnsupportedUnquoteArity` and
//! `UnknownNodeVariant` all propagate out before any user code runs.

use crate::ast::{Block, Expression};
use crate::runtime::{Environment, Value};
use crate::MonkeyError;

pub mod define;
pub mod expand;
pub mod quote;
pub mod rewrite;

pub use define::{define_macros, is_macro_definition};
pub use expand::{expand_macros, expand_macros_with_trace};
pub use quote::quote;
pub use rewrite::{rewrite, rewrite_expression, rewrite_program};

/// Reserved callee name of the quoting form.
pub const QUOTE: &str = "quote";
/// Reserved callee name recognised inside quoted fragments.
pub const UNQUOTE: &str = "unquote";

// ============================================================================
// EVALUATION HOOK
// ============================================================================

/// The slice of the evaluator the macro system needs.
///
/// The expander calls [`evaluate_block`](MacroEvaluator::evaluate_block) exactly
/// once per macro invocation; the unquote resolver calls
/// [`evaluate_expression`](MacroEvaluator::evaluate_expression) once per
/// `unquote` site.
pub trait MacroEvaluator {
    fn evaluate_block(&mut self, block: &Block, env: &Environment) -> Result<Value, MonkeyError>;

    fn evaluate_expression(&mut self, expr: &Expression, env: &Environment) -> Result<Value, MonkeyError>;
}

// ============================================================================
// TRACING
// ============================================================================

/// A single macro expansion step, for traceability.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroExpansionStep {
    /// The macro name invoked.
    pub macro_name: String,
    /// The call expression before expansion.
    pub input: Expression,
    /// The syntax that replaced it.
    pub output: Expression,
}
