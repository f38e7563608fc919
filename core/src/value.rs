//! Value kinds and bound values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of value an option or argument accepts.
///
/// # Examples
///
/// ```
/// use command_tree_core::ValueKind;
///
/// assert_eq!(ValueKind::default(), ValueKind::String);
/// assert_eq!(ValueKind::Number.to_string(), "number");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Present/absent switch.
    Boolean,
    /// Free-form text (the default).
    #[default]
    String,
    /// Finite floating point number.
    Number,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueKind::Boolean => "boolean",
            ValueKind::String => "string",
            ValueKind::Number => "number",
        };
        f.write_str(label)
    }
}

/// A bound (or default) value.
///
/// Multi-valued options and arguments always bind to [`Value::List`].
///
/// # Examples
///
/// ```
/// use command_tree_core::Value;
///
/// let v = Value::from(vec!["a", "b"]);
/// assert_eq!(v.as_strings(), Some(vec!["a", "b"]));
/// assert_eq!(Value::from(3.0).as_f64(), Some(3.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the list items as strings, or `None` if this is not a list of
    /// strings.
    pub fn as_strings(&self) -> Option<Vec<&str>> {
        self.as_list()?.iter().map(Value::as_str).collect()
    }

    /// Returns `true` if this value is compatible with `kind`.
    ///
    /// Lists match when every item matches.
    pub fn matches_kind(&self, kind: ValueKind) -> bool {
        match (self, kind) {
            (Value::Bool(_), ValueKind::Boolean)
            | (Value::Number(_), ValueKind::Number)
            | (Value::String(_), ValueKind::String) => true,
            (Value::List(items), kind) => items.iter().all(|item| item.matches_kind(kind)),
            _ => false,
        }
    }

    /// Wraps a scalar in a single-element list; lists are returned as-is.
    pub fn into_list(self) -> Value {
        match self {
            Value::List(_) => self,
            scalar => Value::List(vec![scalar]),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&rendered.join(", "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<&str>> for Value {
    fn from(values: Vec<&str>) -> Self {
        Value::List(values.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<String>> for Value {
    fn from(values: Vec<String>) -> Self {
        Value::List(values.into_iter().map(Value::String).collect())
    }
}
