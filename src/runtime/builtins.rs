//! Built-in functions.
//!
//! Builtins receive already-evaluated arguments. Errors are raised without a
//! span; the evaluator attaches the call site.

use std::fmt;

use crate::runtime::{OutputSink, Value};
use crate::{err_msg, MonkeyError};

pub type BuiltinFn = fn(&[Value], &mut dyn OutputSink) -> Result<Value, MonkeyError>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

const BUILTINS: &[Builtin] = &[
    Builtin { name: "len", func: builtin_len },
    Builtin { name: "first", func: builtin_first },
    Builtin { name: "last", func: builtin_last },
    Builtin { name: "rest", func: builtin_rest },
    Builtin { name: "push", func: builtin_push },
    Builtin { name: "puts", func: builtin_puts },
];

/// Resolves a builtin by name. Environment bindings shadow builtins.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}

fn check_arity(name: &str, args: &[Value], expected: usize) -> Result<(), MonkeyError> {
    if args.len() != expected {
        return Err(err_msg!(
            Eval,
            "wrong number of arguments to `{}`: got {}, want {}",
            name,
            args.len(),
            expected
        ));
    }
    Ok(())
}

fn builtin_len(args: &[Value], _out: &mut dyn OutputSink) -> Result<Value, MonkeyError> {
    check_arity("len", args, 1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::Integer(s.chars().count() as i64)),
        Value::Array(items) => Ok(Value::Integer(items.len() as i64)),
        other => Err(err_msg!(
            TypeError,
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

fn builtin_first(args: &[Value], _out: &mut dyn OutputSink) -> Result<Value, MonkeyError> {
    check_arity("first", args, 1)?;
    let items = expect_array("first", &args[0])?;
    Ok(items.first().cloned().unwrap_or_default())
}

fn builtin_last(args: &[Value], _out: &mut dyn OutputSink) -> Result<Value, MonkeyError> {
    check_arity("last", args, 1)?;
    let items = expect_array("last", &args[0])?;
    Ok(items.last().cloned().unwrap_or_default())
}

fn builtin_rest(args: &[Value], _out: &mut dyn OutputSink) -> Result<Value, MonkeyError> {
    check_arity("rest", args, 1)?;
    let items = expect_array("rest", &args[0])?;
    if items.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::Array(items[1..].to_vec()))
}

fn builtin_push(args: &[Value], _out: &mut dyn OutputSink) -> Result<Value, MonkeyError> {
    check_arity("push", args, 2)?;
    let mut items = expect_array("push", &args[0])?.to_vec();
    items.push(args[1].clone());
    Ok(Value::Array(items))
}

fn builtin_puts(args: &[Value], out: &mut dyn OutputSink) -> Result<Value, MonkeyError> {
    for arg in args {
        out.emit(&arg.to_string());
    }
    Ok(Value::Null)
}

fn expect_array<'a>(name: &str, value: &'a Value) -> Result<&'a [Value], MonkeyError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(err_msg!(
            TypeError,
            "argument to `{}` must be ARRAY, got {}",
            name,
            other.type_name()
        )),
    }
}
