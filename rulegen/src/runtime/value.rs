//! Values exchanged between a rule's evaluation context and its functions.
//!
//! A context resolves reference expressions (`value['available']`, a guard
//! such as `load > 4`) to a [`Value`]; rule functions take and return them.

use std::fmt;

/// A value produced by a context lookup or returned by a rule function.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// A function that produced nothing.
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Renders the way a value reads once interpolated into a message, so
/// `str(x)` and `'{}'.format(x)` agree with the emitted expression text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(n) => write!(f, "{n}"),
            // `{:?}` keeps the `.0` on whole readings such as `90.0`.
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl Value {
    /// Whether a guard evaluating to this value fires its actions.
    ///
    /// `None`, `false`, zero and the empty string hold back; everything
    /// else fires.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}
