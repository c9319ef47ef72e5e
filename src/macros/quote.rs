//! `quote` / `unquote` resolution.

use crate::ast::{Expr, Expression, Node, Span};
use crate::macros::{rewrite_expression, MacroEvaluator, UNQUOTE};
use crate::runtime::{Environment, Value};
use crate::{err_ctx, MonkeyError};

/// Captures `node` as a quoted value.
///
/// Every `unquote(x)` call inside `node`, however deeply nested, is replaced by
/// the syntax for the value of `x` evaluated in `env` (the environment where
/// `quote` itself was called). `unquote` is recognised by name alone; whether
/// anything named `unquote` is bound is irrelevant.
///
/// Resolution is one post-order pass: in `unquote(unquote(x))` the inner call is
/// resolved first and the outer call then evaluates the spliced syntax.
pub fn quote(
    node: Expression,
    env: &Environment,
    evaluator: &mut dyn MacroEvaluator,
) -> Result<Value, MonkeyError> {
    let resolved = resolve_unquotes(node, env, evaluator)?;
    Ok(Value::Quote(resolved))
}

fn resolve_unquotes(
    quoted: Expression,
    env: &Environment,
    evaluator: &mut dyn MacroEvaluator,
) -> Result<Expression, MonkeyError> {
    let mut transform = |node: Node| -> Result<Node, MonkeyError> {
        match node {
            Node::Expression(expr) if expr.value.callee_name() == Some(UNQUOTE) => {
                resolve_unquote(expr, env, &mut *evaluator).map(Node::Expression)
            }
            other => Ok(other),
        }
    };
    rewrite_expression(quoted, &mut transform)
}

/// Evaluates the single argument of an `unquote(...)` call and renders the result.
fn resolve_unquote(
    call: Expression,
    env: &Environment,
    evaluator: &mut dyn MacroEvaluator,
) -> Result<Expression, MonkeyError> {
    let span = call.span;
    let arguments = match call.value {
        Expr::Call { arguments, .. } => arguments,
        _ => return Ok(call),
    };
    let [argument] = arguments.as_slice() else {
        return Err(err_ctx!(
            UnsupportedUnquoteArity,
            span,
            "`unquote` takes exactly 1 argument, got {}",
            arguments.len()
        ));
    };

    let value = evaluator.evaluate_expression(argument, env)?;
    value_to_node(value, span)
}

/// Renders a value back into syntax at `span`.
///
/// Quoted values splice their carried node as is, which is what lets quotes
/// compose: `quote(unquote(quote(1 + 2)))` is the same tree as `quote(1 + 2)`.
fn value_to_node(value: Value, span: Span) -> Result<Expression, MonkeyError> {
    let expr = match value {
        Value::Quote(node) => return Ok(node),
        Value::Integer(n) => Expr::Integer(n),
        Value::Boolean(b) => Expr::Boolean(b),
        Value::Str(s) => Expr::Str(s),
        other => {
            return Err(err_ctx!(
                UnsupportedUnquoteArgument,
                span,
                "cannot convert {} to an AST node",
                other.type_name()
            )
            .with_help("`unquote` can splice integers, booleans, strings and quoted syntax"))
        }
    };
    Ok(Expression::new(expr, span))
}
