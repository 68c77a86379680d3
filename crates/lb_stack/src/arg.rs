//! Typed arguments crossing the stack boundary.
//!
//! An [`Arg`] carries exactly one primitive payload whose tag decides both how
//! it is pushed and which dynamic types it accepts when filled back from the
//! stack:
//! - `Str` accepts strings only
//! - `Int` accepts the integer number subtype only
//! - `Double` accepts any number
//! - `Bool` accepts booleans only
//!
//! Anything else is a mismatch. Under [`Coercion::Permissive`] a mismatch
//! keeps the previous payload; under [`Coercion::Strict`] it is an error.

use std::fmt;

use mlua::Value;

use crate::config::Coercion;
use crate::errors::{Error, Result};
use crate::stack::ValueStack;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgType {
    Str,
    Int,
    Double,
    Bool,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::Double => "double",
            Self::Bool => "boolean",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl Arg {
    /// Zero value for `ty`, used to declare output slots before a call.
    pub fn placeholder(ty: ArgType) -> Self {
        match ty {
            ArgType::Str => Self::Str(String::new()),
            ArgType::Int => Self::Int(0),
            ArgType::Double => Self::Double(0.0),
            ArgType::Bool => Self::Bool(false),
        }
    }

    pub fn arg_type(&self) -> ArgType {
        match self {
            Self::Str(_) => ArgType::Str,
            Self::Int(_) => ArgType::Int,
            Self::Double(_) => ArgType::Double,
            Self::Bool(_) => ArgType::Bool,
        }
    }

    pub fn push_to(&self, stack: &mut ValueStack<'_>) -> Result<()> {
        match self {
            Self::Str(s) => stack.push_str(s),
            Self::Int(i) => stack.push_integer(*i),
            Self::Double(d) => stack.push_number(*d),
            Self::Bool(b) => stack.push_bool(*b),
        }
    }

    /// Reads the value at `index` into the payload if its dynamic type fits
    /// the tag. Returns whether the payload was overwritten.
    pub fn fill_from(&mut self, stack: &ValueStack<'_>, index: i32) -> Result<bool> {
        let accepted = match stack.peek(index) {
            Some(value) => self.accept(value),
            None => false,
        };
        if !accepted && stack.config().coercion == Coercion::Strict {
            return Err(Error::TypeMismatch {
                index,
                expected: self.arg_type(),
                found: stack.kind(index),
            });
        }
        Ok(accepted)
    }

    /// The permissive fill rule: overwrite on a matching type, otherwise leave
    /// the payload alone.
    pub fn accept(&mut self, value: &Value) -> bool {
        match (self, value) {
            (Self::Str(slot), Value::String(s)) => {
                *slot = s.to_string_lossy();
                true
            }
            (Self::Int(slot), Value::Integer(i)) => {
                *slot = *i;
                true
            }
            (Self::Double(slot), Value::Integer(i)) => {
                *slot = *i as f64;
                true
            }
            (Self::Double(slot), Value::Number(n)) => {
                *slot = *n;
                true
            }
            (Self::Bool(slot), Value::Boolean(b)) => {
                *slot = *b;
                true
            }
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => f.write_str(itoa::Buffer::new().format(*i)),
            Self::Double(d) => f.write_str(ryu::Buffer::new().format(*d)),
            Self::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
        }
    }
}

impl From<ArgType> for Arg {
    fn from(ty: ArgType) -> Self {
        Self::placeholder(ty)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Arg {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Arg {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<f32> for Arg {
    fn from(d: f32) -> Self {
        Self::Double(f64::from(d))
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
