//! Collection of top-level macro definitions.

use std::rc::Rc;

use crate::ast::{Expr, Program, Spanned, Statement, Stmt};
use crate::runtime::{Environment, MacroValue, Value};

/// Binds every top-level macro definition into `env` and removes it from
/// `program`. Returns the names defined, in source order.
///
/// Only statements of the form `let name = macro(...) {...};` directly in the
/// program count. Nested blocks are not searched, and a later
/// `let alias = name;` does not make `alias` a macro: recognition is purely
/// syntactic. All other statements keep their relative order.
///
/// # Examples
///
/// ```rust
/// use monkey::macros::define_macros;
/// use monkey::runtime::{Environment, Value};
/// use monkey::syntax::parser::parse_str;
///
/// let mut program = parse_str("let a = macro() { 1; }; let b = 5; b;").unwrap();
/// let env = Environment::new();
/// let defined = define_macros(&mut program, &env);
/// assert_eq!(defined, vec!["a".to_string()]);
/// assert_eq!(program.to_string(), "let b = 5;\nb;");
/// assert!(matches!(env.get("a"), Some(Value::Macro(_))));
/// ```
pub fn define_macros(program: &mut Program, env: &Environment) -> Vec<String> {
    let mut defined = Vec::new();
    let statements = std::mem::take(&mut program.statements);
    program.statements = statements
        .into_iter()
        .filter_map(|stmt| match add_macro(stmt, env) {
            Ok(name) => {
                defined.push(name);
                None
            }
            Err(stmt) => Some(stmt),
        })
        .collect();
    defined
}

/// True for `let name = macro(...) {...}`.
pub fn is_macro_definition(stmt: &Statement) -> bool {
    matches!(
        &stmt.value,
        Stmt::Let {
            value: Spanned {
                value: Expr::Macro { .. },
                ..
            },
            ..
        }
    )
}

/// Binds `stmt` if it is a macro definition, handing it back otherwise.
fn add_macro(stmt: Statement, env: &Environment) -> Result<String, Statement> {
    match stmt.value {
        Stmt::Let {
            name,
            value:
                Spanned {
                    value: Expr::Macro { parameters, body },
                    ..
                },
        } => {
            let mac = MacroValue {
                parameters,
                body,
                env: env.clone(),
            };
            env.set(name.clone(), Value::Macro(Rc::new(mac)));
            Ok(name)
        }
        value => Err(Statement::new(value, stmt.span)),
    }
}
