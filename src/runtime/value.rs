use std::fmt;
use std::rc::Rc;

use im::OrdMap;

use crate::ast::{Block, Expression};
use crate::runtime::builtins::Builtin;
use crate::runtime::environment::Environment;

/// Represents a value in the Monkey interpreter.
///
/// `Quote` and `Macro` only exist during macro collection and expansion; the
/// expander guarantees neither is left behind in the program it returns.
///
/// # Examples
///
/// ```rust
/// use monkey::runtime::Value;
/// let n = Value::Integer(3);
/// assert_eq!(n.type_name(), "INTEGER");
/// assert!(Value::Null.is_null());
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Boolean(bool),
    Str(String),
    Array(Vec<Value>),
    Hash(OrdMap<HashKey, Value>),
    Function(Rc<Function>),
    Builtin(Builtin),
    /// A syntax-tree fragment carried as a value.
    Quote(Expression),
    Macro(Rc<MacroValue>),
}

/// Values usable as hash keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    Str(String),
}

/// A closure: parameters, body and the environment it was created in.
///
/// `env` is a strong handle. A function bound with `let` lands in the scope
/// it captured, so a named function and its scope keep each other alive
/// until the process exits. Recursion resolves through that scope, so the
/// link cannot be weakened without losing closures that outlive their frame.
pub struct Function {
    pub parameters: Vec<String>,
    pub body: Block,
    pub env: Environment,
}

/// A macro captured at collection time.
pub struct MacroValue {
    pub parameters: Vec<String>,
    pub body: Block,
    pub env: Environment,
}

impl Value {
    /// Returns the type name of the value as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::Quote(_) => "QUOTE",
            Value::Macro(_) => "MACRO",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `false` and `null` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    /// Returns the hash key for this value, if it can be used as one.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(n) => Some(HashKey::Integer(*n)),
            Value::Boolean(b) => Some(HashKey::Boolean(*b)),
            Value::Str(s) => Some(HashKey::Str(s.clone())),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Quote(a), Value::Quote(b)) => a.value == b.value,
            (Value::Macro(a), Value::Macro(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<HashKey> for Value {
    fn from(key: HashKey) -> Self {
        match key {
            HashKey::Integer(n) => Value::Integer(n),
            HashKey::Boolean(b) => Value::Boolean(b),
            HashKey::Str(s) => Value::Str(s),
        }
    }
}

// Closures capture their environment, which may in turn hold the closure.
// Debug output stops at the environment to avoid walking that cycle.

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body.to_string())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for MacroValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroValue")
            .field("parameters", &self.parameters)
            .field("body", &self.body.to_string())
            .finish_non_exhaustive()
    }
}

// ------------------------------------------------------------------------
// Display formatting
// ------------------------------------------------------------------------

impl Value {
    fn fmt_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item)?;
        }
        write!(f, "]")
    }

    fn fmt_map(f: &mut fmt::Formatter<'_>, map: &OrdMap<HashKey, Value>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in map.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", Value::from(k.clone()), v)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(items) => Value::fmt_list(f, items),
            Value::Hash(map) => Value::fmt_map(f, map),
            Value::Function(func) => {
                write!(f, "fn({}) {}", func.parameters.join(", "), func.body)
            }
            Value::Builtin(builtin) => write!(f, "builtin function {}", builtin.name),
            Value::Quote(node) => write!(f, "QUOTE({})", node.value),
            Value::Macro(mac) => write!(f, "macro({}) {}", mac.parameters.join(", "), mac.body),
        }
    }
}
