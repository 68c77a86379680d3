use std::fmt;

use mlua::Value;

/// Dynamic type observed at a stack slot.
///
/// `Integer` and `Number` are the two subtypes of the runtime's single number
/// type; both report `"number"` from [`ValueKind::type_name`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// No value: the index does not address a slot.
    None,
    Nil,
    Boolean,
    Integer,
    Number,
    String,
    Table,
    Function,
    UserData,
    Thread,
    Other,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Nil => Self::Nil,
            Value::Boolean(_) => Self::Boolean,
            Value::Integer(_) => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Table(_) => Self::Table,
            Value::Function(_) => Self::Function,
            Value::UserData(_) | Value::LightUserData(_) => Self::UserData,
            Value::Thread(_) => Self::Thread,
            _ => Self::Other,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::None => "no value",
            Self::Nil => "nil",
            Self::Boolean => "boolean",
            Self::Integer | Self::Number => "number",
            Self::String => "string",
            Self::Table => "table",
            Self::Function => "function",
            Self::UserData => "userdata",
            Self::Thread => "thread",
            Self::Other => "value",
        }
    }

    pub fn is_number(self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("number (integer)"),
            Self::Number => f.write_str("number (float)"),
            other => f.write_str(other.type_name()),
        }
    }
}

/// Integer view of a number the way the runtime converts it: integers as-is,
/// floats only when they hold an exact integral value in range.
pub fn exact_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Number(n) if n.fract() == 0.0 && *n >= -(2f64.powi(63)) && *n < 2f64.powi(63) => {
            Some(*n as i64)
        }
        _ => None,
    }
}

/// Integer view of any number, truncating floats toward zero. Non-finite or
/// out-of-range floats have no integer view.
pub fn truncated_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Number(n) => {
            let t = n.trunc();
            (t.is_finite() && t >= -(2f64.powi(63)) && t < 2f64.powi(63)).then_some(t as i64)
        }
        _ => None,
    }
}
