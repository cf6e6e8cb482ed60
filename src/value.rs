//! The value model and the variable store.

use std::collections::HashMap;
use std::fmt;

/// A script value: a single string or a flat, ordered list of strings.
///
/// There is no numeric type and no nesting; everything a script manipulates is
/// text. List element order is the literal order and stays stable until the
/// variable is reassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
}

impl fmt::Display for Value {
    /// The fixed textual form used when a value lands inside a string.
    ///
    /// A scalar renders verbatim; a list renders in literal syntax,
    /// `[a, b, c]`, so it stays distinguishable from the space-joined
    /// `{name[]}` expansion.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => f.write_str(s),
            Value::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Variables visible to the running script.
///
/// One scope exists per [`Interpreter`](crate::Interpreter) instance and lives
/// for the whole run. Only the assignment handler mutates it; a later
/// assignment fully replaces the previous value, whatever its type.
#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    /// Create a scope seeded with the reserved entries: `argv` (the script's
    /// invocation arguments) plus `version` and `os` metadata. The metadata
    /// entries are ordinary variables with no special lookup behavior.
    pub fn new(argv: Vec<String>) -> Self {
        let mut vars = HashMap::new();
        vars.insert("argv".to_string(), Value::List(argv));
        vars.insert(
            "version".to_string(),
            Value::Scalar(env!("CARGO_PKG_VERSION").to_string()),
        );
        vars.insert(
            "os".to_string(),
            Value::Scalar(std::env::consts::OS.to_string()),
        );
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_and_list_render() {
        assert_eq!(Value::Scalar("hi".into()).to_string(), "hi");
        assert_eq!(
            Value::List(vec!["a".into(), "b".into(), "c".into()]).to_string(),
            "[a, b, c]"
        );
        assert_eq!(Value::List(vec![]).to_string(), "[]");
    }

    #[test]
    fn set_replaces_value_and_type() {
        let mut scope = Scope::new(vec![]);
        scope.set("x", Value::Scalar("one".into()));
        assert_eq!(scope.get("x"), Some(&Value::Scalar("one".into())));

        scope.set("x", Value::List(vec!["two".into()]));
        assert_eq!(scope.get("x"), Some(&Value::List(vec!["two".into()])));
    }

    #[test]
    fn seeded_entries_present() {
        let scope = Scope::new(vec!["a".into(), "b".into()]);
        assert_eq!(
            scope.get("argv"),
            Some(&Value::List(vec!["a".into(), "b".into()]))
        );
        assert!(matches!(scope.get("version"), Some(Value::Scalar(_))));
        assert!(matches!(scope.get("os"), Some(Value::Scalar(_))));
        assert_eq!(scope.get("missing"), None);
    }
}
