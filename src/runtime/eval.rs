//! This module provides the tree-walking evaluator for Monkey programs.
//!
//! ## Core Responsibility: AST → Value Translation
//!
//! The evaluator walks an already macro-expanded [`Program`] and produces runtime
//! values. It knows nothing about macro collection or expansion; its only ties to
//! the macro system are the reserved `quote(...)` form, which it hands to the
//! unquote resolver, and the [`MacroEvaluator`] hook the expander drives.
//!
//! ## Error Handling
//!
//! All errors are reported via [`MonkeyError`] and built with `err_ctx!`. Errors
//! coming out of builtins have no span; [`MonkeyError::at`] attaches the call site.
//!
//! ```rust
//! use monkey::err_msg;
//! let err = err_msg!(Eval, "identifier not found: {}", "x");
//! assert!(matches!(err, monkey::MonkeyError::Eval { .. }));
//! ```

use std::rc::Rc;

use im::OrdMap;

use crate::ast::{Block, Expr, Expression, InfixOp, PrefixOp, Program, Span, Statement, Stmt};
use crate::macros::{self, MacroEvaluator};
use crate::runtime::{builtins, Environment, Function, MacroValue, OutputSink, Value};
use crate::{err_ctx, MonkeyError};

// ===================================================================================================
// CORE DATA STRUCTURES: Evaluation Context
// ===================================================================================================

/// Evaluator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Maximum nesting of user function calls before evaluation is aborted.
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// The context for one evaluation run.
pub struct Evaluator<'o> {
    output: &'o mut dyn OutputSink,
    max_depth: usize,
    depth: usize,
}

/// Result of evaluating a statement: either carry on, or unwind to the
/// enclosing function with a `return` value.
enum Flow {
    Next(Value),
    Return(Value),
}

impl Flow {
    fn into_value(self) -> Value {
        match self {
            Flow::Next(value) | Flow::Return(value) => value,
        }
    }
}

// ===================================================================================================
// PUBLIC API
// ===================================================================================================

impl<'o> Evaluator<'o> {
    pub fn new(output: &'o mut dyn OutputSink, options: &EvalOptions) -> Self {
        Self {
            output,
            max_depth: options.max_depth,
            depth: 0,
        }
    }

    /// Evaluates every statement in order; the value of the last one (or of the
    /// first top-level `return`) is the program's value.
    pub fn eval_program(&mut self, program: &Program, env: &Environment) -> Result<Value, MonkeyError> {
        Ok(self.eval_statements(&program.statements, env)?.into_value())
    }

    /// Evaluates a block in `env`, unwrapping any `return`.
    pub fn eval_block(&mut self, block: &Block, env: &Environment) -> Result<Value, MonkeyError> {
        Ok(self.eval_statements(&block.statements, env)?.into_value())
    }

    pub fn eval_expression(&mut self, expr: &Expression, env: &Environment) -> Result<Value, MonkeyError> {
        Ok(self.eval_flow(expr, env)?.into_value())
    }
}

impl MacroEvaluator for Evaluator<'_> {
    fn evaluate_block(&mut self, block: &Block, env: &Environment) -> Result<Value, MonkeyError> {
        self.eval_block(block, env)
    }

    fn evaluate_expression(&mut self, expr: &Expression, env: &Environment) -> Result<Value, MonkeyError> {
        self.eval_expression(expr, env)
    }
}

// ===================================================================================================
// STATEMENTS
// ===================================================================================================

impl Evaluator<'_> {
    fn eval_statements(&mut self, statements: &[Statement], env: &Environment) -> Result<Flow, MonkeyError> {
        let mut last = Value::Null;
        for stmt in statements {
            match self.eval_statement(stmt, env)? {
                Flow::Next(value) => last = value,
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Next(last))
    }

    fn eval_statement(&mut self, stmt: &Statement, env: &Environment) -> Result<Flow, MonkeyError> {
        match &stmt.value {
            Stmt::Let { name, value } => {
                let value = self.eval_expression(value, env)?;
                env.set(name.clone(), value);
                Ok(Flow::Next(Value::Null))
            }
            Stmt::Return(value) => Ok(Flow::Return(self.eval_expression(value, env)?)),
            // An `if` used as a statement may carry a `return` out of its block.
            Stmt::Expression(expr) => self.eval_flow(expr, env),
        }
    }

    fn eval_block_flow(&mut self, block: &Block, env: &Environment) -> Result<Flow, MonkeyError> {
        self.eval_statements(&block.statements, env)
    }
}

// ===================================================================================================
// EXPRESSIONS
// ===================================================================================================

impl Evaluator<'_> {
    fn eval_flow(&mut self, expr: &Expression, env: &Environment) -> Result<Flow, MonkeyError> {
        let span = expr.span;
        let value = match &expr.value {
            Expr::Identifier(name) => self.eval_identifier(name, env, span)?,
            Expr::Integer(n) => Value::Integer(*n),
            Expr::Boolean(b) => Value::Boolean(*b),
            Expr::Str(s) => Value::Str(s.clone()),

            Expr::Prefix { operator, right } => {
                let right = self.eval_expression(right, env)?;
                eval_prefix(*operator, right, span)?
            }

            Expr::Infix { left, operator, right } => {
                let left = self.eval_expression(left, env)?;
                let right = self.eval_expression(right, env)?;
                eval_infix(*operator, left, right, span)?
            }

            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expression(condition, env)?;
                if condition.is_truthy() {
                    return self.eval_block_flow(consequence, env);
                }
                match alternative {
                    Some(alternative) => return self.eval_block_flow(alternative, env),
                    None => Value::Null,
                }
            }

            Expr::Function { parameters, body } => Value::Function(Rc::new(Function {
                parameters: parameters.clone(),
                body: body.clone(),
                env: env.clone(),
            })),

            Expr::Macro { parameters, body } => Value::Macro(Rc::new(MacroValue {
                parameters: parameters.clone(),
                body: body.clone(),
                env: env.clone(),
            })),

            Expr::Call { function, arguments } => {
                if expr.value.callee_name() == Some(macros::QUOTE) {
                    self.eval_quote(arguments, env, span)?
                } else {
                    let callee = self.eval_expression(function, env)?;
                    let args = self.eval_expressions(arguments, env)?;
                    self.apply_function(callee, args, span)?
                }
            }

            Expr::Array(items) => Value::Array(self.eval_expressions(items, env)?),

            Expr::Index { left, index } => {
                let left = self.eval_expression(left, env)?;
                let index = self.eval_expression(index, env)?;
                eval_index(left, index, span)?
            }

            Expr::Hash(pairs) => {
                let mut map = OrdMap::new();
                for (key_expr, value_expr) in pairs {
                    let key = self.eval_expression(key_expr, env)?;
                    let Some(hash_key) = key.hash_key() else {
                        return Err(err_ctx!(
                            TypeError,
                            key_expr.span,
                            "unusable as hash key: {}",
                            key.type_name()
                        ));
                    };
                    let value = self.eval_expression(value_expr, env)?;
                    map.insert(hash_key, value);
                }
                Value::Hash(map)
            }
        };
        Ok(Flow::Next(value))
    }

    fn eval_expressions(&mut self, exprs: &[Expression], env: &Environment) -> Result<Vec<Value>, MonkeyError> {
        exprs.iter().map(|e| self.eval_expression(e, env)).collect()
    }

    fn eval_identifier(&self, name: &str, env: &Environment, span: Span) -> Result<Value, MonkeyError> {
        if let Some(value) = env.get(name) {
            return Ok(value);
        }
        if let Some(builtin) = builtins::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }
        let err = err_ctx!(Eval, span, "identifier not found: {}", name);
        if name == macros::UNQUOTE {
            return Err(err.with_help("`unquote` is only valid inside `quote(...)`"));
        }
        Err(err)
    }

    /// `quote(expr)`: capture `expr` as syntax after resolving its `unquote` calls in `env`.
    fn eval_quote(&mut self, arguments: &[Expression], env: &Environment, span: Span) -> Result<Value, MonkeyError> {
        let [argument] = arguments else {
            return Err(err_ctx!(
                Eval,
                span,
                "`quote` takes exactly 1 argument, got {}",
                arguments.len()
            ));
        };
        macros::quote(argument.clone(), env, self)
    }

    fn apply_function(&mut self, callee: Value, args: Vec<Value>, span: Span) -> Result<Value, MonkeyError> {
        match callee {
            Value::Function(func) => {
                if args.len() != func.parameters.len() {
                    return Err(err_ctx!(
                        Eval,
                        span,
                        "wrong number of arguments: want {}, got {}",
                        func.parameters.len(),
                        args.len()
                    ));
                }
                if self.depth >= self.max_depth {
                    return Err(err_ctx!(
                        Eval,
                        span,
                        "maximum call depth of {} exceeded",
                        self.max_depth
                    )
                    .with_help("raise the limit with --max-depth if the recursion is intended"));
                }

                let scope = Environment::new_child_scope(&func.env);
                for (param, arg) in func.parameters.iter().zip(args) {
                    scope.set(param.clone(), arg);
                }

                self.depth += 1;
                let result = self.eval_block(&func.body, &scope);
                self.depth -= 1;
                result
            }
            Value::Builtin(builtin) => (builtin.func)(&args, self.output).map_err(|e| e.at(span)),
            Value::Macro(_) => Err(err_ctx!(Eval, span, "macros cannot be called at run time")
                .with_help("only top-level `let name = macro(...) {...}` definitions are expanded")),
            other => Err(err_ctx!(Eval, span, "not a function: {}", other.type_name())),
        }
    }
}

// ===================================================================================================
// OPERATORS
// ===================================================================================================

fn eval_prefix(operator: PrefixOp, right: Value, span: Span) -> Result<Value, MonkeyError> {
    match (operator, right) {
        (PrefixOp::Not, right) => Ok(Value::Boolean(!right.is_truthy())),
        (PrefixOp::Negate, Value::Integer(n)) => n
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| err_ctx!(Eval, span, "integer overflow in -{}", n)),
        (PrefixOp::Negate, right) => Err(err_ctx!(
            TypeError,
            span,
            "unknown operator: -{}",
            right.type_name()
        )),
    }
}

fn eval_infix(operator: InfixOp, left: Value, right: Value, span: Span) -> Result<Value, MonkeyError> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => eval_integer_infix(operator, *a, *b, span),
        (Value::Str(a), Value::Str(b)) if operator == InfixOp::Add => Ok(Value::Str(format!("{}{}", a, b))),
        _ if operator == InfixOp::Eq => Ok(Value::Boolean(left == right)),
        _ if operator == InfixOp::NotEq => Ok(Value::Boolean(left != right)),
        _ if left.type_name() != right.type_name() => Err(err_ctx!(
            TypeError,
            span,
            "type mismatch: {} {} {}",
            left.type_name(),
            operator.symbol(),
            right.type_name()
        )),
        _ => Err(err_ctx!(
            TypeError,
            span,
            "unknown operator: {} {} {}",
            left.type_name(),
            operator.symbol(),
            right.type_name()
        )),
    }
}

fn eval_integer_infix(operator: InfixOp, a: i64, b: i64, span: Span) -> Result<Value, MonkeyError> {
    let overflow = || err_ctx!(Eval, span, "integer overflow in {} {} {}", a, operator.symbol(), b);
    let value = match operator {
        InfixOp::Add => Value::Integer(a.checked_add(b).ok_or_else(overflow)?),
        InfixOp::Sub => Value::Integer(a.checked_sub(b).ok_or_else(overflow)?),
        InfixOp::Mul => Value::Integer(a.checked_mul(b).ok_or_else(overflow)?),
        InfixOp::Div => {
            if b == 0 {
                return Err(err_ctx!(Eval, span, "division by zero"));
            }
            Value::Integer(a.checked_div(b).ok_or_else(overflow)?)
        }
        InfixOp::Lt => Value::Boolean(a < b),
        InfixOp::Gt => Value::Boolean(a > b),
        InfixOp::Eq => Value::Boolean(a == b),
        InfixOp::NotEq => Value::Boolean(a != b),
    };
    Ok(value)
}

fn eval_index(left: Value, index: Value, span: Span) -> Result<Value, MonkeyError> {
    match (left, index) {
        (Value::Array(items), Value::Integer(i)) => Ok(usize::try_from(i)
            .ok()
            .and_then(|i| items.get(i).cloned())
            .unwrap_or_default()),
        (Value::Hash(map), key) => {
            let Some(hash_key) = key.hash_key() else {
                return Err(err_ctx!(TypeError, span, "unusable as hash key: {}", key.type_name()));
            };
            Ok(map.get(&hash_key).cloned().unwrap_or_default())
        }
        (left, _) => Err(err_ctx!(
            TypeError,
            span,
            "index operator not supported: {}",
            left.type_name()
        )),
    }
}
