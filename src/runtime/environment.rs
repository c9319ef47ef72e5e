//! Lexical environments.
//!
//! An [`Environment`] is a cheap, clonable handle to one scope. Each scope owns
//! its bindings and links to its enclosing scope; lookups walk outward, writes
//! always land in the innermost scope.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::runtime::Value;

#[derive(Clone, Default)]
pub struct Environment {
    scope: Rc<Scope>,
}

#[derive(Default)]
struct Scope {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Environment>,
}

impl Environment {
    /// A fresh outermost scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new scope enclosed by `parent`.
    pub fn new_child_scope(parent: &Environment) -> Self {
        Self {
            scope: Rc::new(Scope {
                bindings: RefCell::new(HashMap::new()),
                parent: Some(parent.clone()),
            }),
        }
    }

    /// Looks `name` up here, then in each enclosing scope.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.scope.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.scope.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.scope.bindings.borrow_mut().insert(name.into(), value);
    }

    /// True if `name` is bound in this scope itself, ignoring enclosing scopes.
    pub fn contains_local(&self, name: &str) -> bool {
        self.scope.bindings.borrow().contains_key(name)
    }

    /// Names bound in this scope itself, sorted.
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scope.bindings.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// The bindings of this scope alone, sorted by name.
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<(String, Value)> = self
            .scope
            .bindings
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    /// True if both handles refer to the same scope.
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.scope, &other.scope)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.local_names())
            .field("has_parent", &self.scope.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_through_to_parent() {
        let outer = Environment::new();
        outer.set("a", Value::Integer(1));
        let inner = Environment::new_child_scope(&outer);
        assert_eq!(inner.get("a"), Some(Value::Integer(1)));
        assert_eq!(inner.get("missing"), None);
    }

    #[test]
    fn writes_stay_in_innermost_scope() {
        let outer = Environment::new();
        outer.set("a", Value::Integer(1));
        let inner = Environment::new_child_scope(&outer);
        inner.set("a", Value::Integer(2));
        inner.set("b", Value::Integer(3));
        assert_eq!(inner.get("a"), Some(Value::Integer(2)));
        assert_eq!(outer.get("a"), Some(Value::Integer(1)));
        assert!(!outer.contains_local("b"));
    }

    #[test]
    fn local_bindings_skip_the_parent() {
        let outer = Environment::new();
        outer.set("a", Value::Integer(1));
        let inner = Environment::new_child_scope(&outer);
        inner.set("c", Value::Integer(3));
        inner.set("b", Value::Integer(2));
        assert_eq!(
            inner.local_bindings(),
            vec![
                ("b".to_string(), Value::Integer(2)),
                ("c".to_string(), Value::Integer(3)),
            ]
        );
    }

    #[test]
    fn clones_share_the_scope() {
        let env = Environment::new();
        let alias = env.clone();
        alias.set("x", Value::Boolean(true));
        assert_eq!(env.get("x"), Some(Value::Boolean(true)));
        assert!(env.ptr_eq(&alias));
        assert!(!env.ptr_eq(&Environment::new_child_scope(&env)));
    }
}
