use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload carried by a scoped variable.
///
/// The scope engine never inspects values; it only moves references to them
/// between variables and getters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    /// Unevaluated source text, e.g. a formula typed into a block.
    Expression { expr: String },
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Expression { .. } => "Expression",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.is_finite() && *n == n.floor() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Expression { expr } => write!(f, "{{{}}}", expr),
        }
    }
}

/// What a variable holds, or what a getter observes.
///
/// `Unbound` is equivalent to the variable not existing, `Empty` is a
/// variable without data.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Data<T> {
    #[default]
    Unbound,
    Empty,
    Value(T),
}

impl<T> Data<T> {
    pub fn as_ref(&self) -> Data<&T> {
        match self {
            Data::Unbound => Data::Unbound,
            Data::Empty => Data::Empty,
            Data::Value(v) => Data::Value(v),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Data::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_unbound(&self) -> bool {
        matches!(self, Data::Unbound)
    }
}

impl<T: Clone> Data<&T> {
    pub fn cloned(&self) -> Data<T> {
        match self {
            Data::Unbound => Data::Unbound,
            Data::Empty => Data::Empty,
            Data::Value(v) => Data::Value((*v).clone()),
        }
    }
}

impl<T> From<Option<T>> for Data<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Data::Value(v),
            None => Data::Empty,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Data<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Unbound => write!(f, "<unbound>"),
            Data::Empty => write!(f, "<empty>"),
            Data::Value(v) => v.fmt(f),
        }
    }
}
