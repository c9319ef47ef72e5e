//! Macro call expansion.

use std::borrow::Cow;

use crate::ast::{Block, Expr, Expression, Node, Program, Span};
use crate::macros::{rewrite, rewrite_program, MacroEvaluator, MacroExpansionStep};
use crate::runtime::{Environment, MacroValue, Value};
use crate::{err_ctx, MonkeyError};

/// Replaces every call to a macro bound in `env` with its expansion.
///
/// The program is walked once, bottom-up. Calls to anything that is not a macro
/// are left untouched, and syntax produced by an expansion is not expanded again.
pub fn expand_macros(
    program: Program,
    env: &Environment,
    evaluator: &mut dyn MacroEvaluator,
) -> Result<Program, MonkeyError> {
    expand_macros_with_trace(program, env, evaluator).map(|(program, _)| program)
}

/// Like [`expand_macros`], also returning one [`MacroExpansionStep`] per expansion
/// in the order the expansions happened.
pub fn expand_macros_with_trace(
    program: Program,
    env: &Environment,
    evaluator: &mut dyn MacroEvaluator,
) -> Result<(Program, Vec<MacroExpansionStep>), MonkeyError> {
    let mut trace = Vec::new();
    let mut transform = |node: Node| -> Result<Node, MonkeyError> {
        let expr = match node {
            Node::Expression(expr) => expr,
            other => return Ok(other),
        };
        let Some((name, mac)) = lookup_macro(&expr, env) else {
            return Ok(Node::Expression(expr));
        };

        let output = expand_call(&name, &mac, &expr, env, &mut *evaluator)?;
        trace.push(MacroExpansionStep {
            macro_name: name,
            input: expr,
            output: output.clone(),
        });
        Ok(Node::Expression(output))
    };
    let expanded = rewrite_program(program, &mut transform)?;
    Ok((expanded, trace))
}

/// Resolves the callee of `expr` to a macro, if it is a call through a name
/// bound to one.
fn lookup_macro(expr: &Expression, env: &Environment) -> Option<(String, std::rc::Rc<MacroValue>)> {
    let name = expr.value.callee_name()?;
    match env.get(name)? {
        Value::Macro(mac) => Some((name.to_string(), mac)),
        _ => None,
    }
}

/// Runs one macro body against the call's unevaluated arguments.
///
/// A macro captured in a different environment than `env` was defined by an
/// earlier load, so its body spans index into another source. That body is
/// evaluated re-spanned to the call site, which keeps both the spliced syntax
/// and any error raised by the body pointing into the current source.
fn expand_call(
    name: &str,
    mac: &MacroValue,
    call: &Expression,
    env: &Environment,
    evaluator: &mut dyn MacroEvaluator,
) -> Result<Expression, MonkeyError> {
    let Expr::Call { arguments, .. } = &call.value else {
        return Err(err_ctx!(Internal, call.span, "macro `{}` resolved on a non-call", name));
    };

    let local = mac.env.ptr_eq(env);
    if arguments.len() < mac.parameters.len() {
        let err = err_ctx!(
            ArityMismatch,
            call.span,
            "macro `{}` expects {} argument(s), got {}",
            name,
            mac.parameters.len(),
            arguments.len()
        )
        .with_help(format!("parameters: ({})", mac.parameters.join(", ")));
        if local {
            return Err(err.with_related(mac.body.span, "macro body"));
        }
        return Err(err);
    }

    // Arguments beyond the declared parameters are ignored.
    let scope = Environment::new_child_scope(&mac.env);
    for (param, argument) in mac.parameters.iter().zip(arguments) {
        scope.set(param.clone(), Value::Quote(argument.clone()));
    }

    let body = if local {
        Cow::Borrowed(&mac.body)
    } else {
        Cow::Owned(respan_block(mac.body.clone(), call.span)?)
    };

    match evaluator.evaluate_block(&body, &scope)? {
        Value::Quote(node) => Ok(node),
        other => Err(err_ctx!(
            MalformedMacroResult,
            call.span,
            "macros must return quoted syntax; `{}` returned {}",
            name,
            other.type_name()
        )
        .with_help("wrap the macro result in quote(...)")),
    }
}

/// Moves every node of `block` onto `span`.
fn respan_block(block: Block, span: Span) -> Result<Block, MonkeyError> {
    let mut transform = |node: Node| -> Result<Node, MonkeyError> {
        Ok(match node {
            Node::Program(mut program) => {
                program.span = span;
                Node::Program(program)
            }
            Node::Block(mut block) => {
                block.span = span;
                Node::Block(block)
            }
            Node::Statement(mut stmt) => {
                stmt.span = span;
                Node::Statement(stmt)
            }
            Node::Expression(mut expr) => {
                expr.span = span;
                Node::Expression(expr)
            }
        })
    };
    match rewrite(Node::Block(block), &mut transform)? {
        Node::Block(block) => Ok(block),
        other => Err(err_ctx!(
            Internal,
            span,
            "re-spanning a macro body produced a {}",
            other.kind()
        )),
    }
}
