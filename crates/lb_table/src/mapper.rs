//! Field-by-field reads from the table on top of the stack.

use lb_stack::mlua::{Table, Value};
use lb_stack::{Arg, Coercion, TOP, ValueKind, ValueStack, truncated_integer};

use crate::errors::{Error, Result};

/// Where a mapped value came from.
pub struct FieldSite<'a> {
    pub table_name: &'a str,
    pub key: &'a str,
    pub table: &'a Table,
}

/// A host field that can be written from a runtime value.
///
/// Strings and numbers are kept apart: a numeric string never fills a number
/// field and a number never fills a string field. Integer fields take any
/// number, truncated toward zero, as long as it fits the field.
pub trait MapTarget {
    /// Writes `value` into the field if its dynamic type fits. Returns whether
    /// the field changed.
    fn assign(&mut self, value: &Value, site: &FieldSite<'_>) -> bool;

    /// Type name used in error messages.
    fn expected(&self) -> &'static str;
}

impl MapTarget for String {
    fn assign(&mut self, value: &Value, _site: &FieldSite<'_>) -> bool {
        match value {
            Value::String(s) => {
                *self = s.to_string_lossy();
                true
            }
            _ => false,
        }
    }

    fn expected(&self) -> &'static str {
        "string"
    }
}

macro_rules! integer_target {
    ($($ty:ty),*) => {
        $(
            impl MapTarget for $ty {
                fn assign(&mut self, value: &Value, _site: &FieldSite<'_>) -> bool {
                    match truncated_integer(value).and_then(|i| <$ty>::try_from(i).ok()) {
                        Some(i) => {
                            *self = i;
                            true
                        }
                        None => false,
                    }
                }

                fn expected(&self) -> &'static str {
                    "integer"
                }
            }
        )*
    };
}

integer_target!(i64, i32, u32, u64);

impl MapTarget for f64 {
    fn assign(&mut self, value: &Value, _site: &FieldSite<'_>) -> bool {
        match value {
            Value::Integer(i) => *self = *i as f64,
            Value::Number(n) => *self = *n,
            _ => return false,
        }
        true
    }

    fn expected(&self) -> &'static str {
        "number"
    }
}

impl MapTarget for f32 {
    fn assign(&mut self, value: &Value, _site: &FieldSite<'_>) -> bool {
        match value {
            Value::Integer(i) => *self = *i as f32,
            Value::Number(n) => *self = *n as f32,
            _ => return false,
        }
        true
    }

    fn expected(&self) -> &'static str {
        "number"
    }
}

impl MapTarget for bool {
    fn assign(&mut self, value: &Value, _site: &FieldSite<'_>) -> bool {
        match value {
            Value::Boolean(b) => {
                *self = *b;
                true
            }
            _ => false,
        }
    }

    fn expected(&self) -> &'static str {
        "boolean"
    }
}

impl MapTarget for Arg {
    fn assign(&mut self, value: &Value, _site: &FieldSite<'_>) -> bool {
        self.accept(value)
    }

    fn expected(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Double(_) => "number",
            Self::Bool(_) => "boolean",
        }
    }
}

/// Reads keys out of the table sitting on top of the stack.
///
/// Every lookup pushes the key, swaps it for `table[key]` and pops the result,
/// so the table stays on top between lookups whatever the outcome.
pub struct FieldMapper<'m, 'lua> {
    stack: &'m mut ValueStack<'lua>,
    table_name: &'m str,
    table: Table,
}

impl<'m, 'lua> FieldMapper<'m, 'lua> {
    pub fn new(stack: &'m mut ValueStack<'lua>, table_name: &'m str) -> Result<Self> {
        let table = match stack.peek(TOP) {
            Some(Value::Table(t)) => t.clone(),
            _ => {
                return Err(lb_stack::Error::NotATable {
                    index: TOP,
                    found: stack.kind(TOP),
                }
                .into());
            }
        };
        Ok(Self {
            stack,
            table_name,
            table,
        })
    }

    pub fn table_name(&self) -> &str {
        self.table_name
    }

    fn lookup(&mut self, target: &mut dyn MapTarget, key: &str) -> Result<(bool, ValueKind)> {
        self.stack.push_str(key)?;
        self.stack.request_field(-2)?;
        let found = self.stack.kind(TOP);
        let site = FieldSite {
            table_name: self.table_name,
            key,
            table: &self.table,
        };
        let assigned = match self.stack.peek(TOP) {
            Some(value) => target.assign(value, &site),
            None => false,
        };
        self.stack.pop(1)?;
        log::trace!("{}.{key}: {found} (assigned: {assigned})", self.table_name);
        Ok((assigned, found))
    }

    /// Optional mapping: an absent or mistyped value leaves `target` as it was.
    /// Under strict coercion a present but mistyped value is an error.
    pub fn map(&mut self, target: &mut dyn MapTarget, key: &str) -> Result<bool> {
        let (assigned, found) = self.lookup(target, key)?;
        if !assigned && found != ValueKind::Nil && self.stack.config().coercion == Coercion::Strict
        {
            return Err(Error::FieldType {
                table: self.table_name.to_string(),
                key: key.to_string(),
                expected: target.expected(),
                found,
            });
        }
        Ok(assigned)
    }

    /// Required mapping: an absent or mistyped value is an error naming `key`.
    pub fn required(&mut self, target: &mut dyn MapTarget, key: &str) -> Result<()> {
        let (assigned, found) = self.lookup(target, key)?;
        if assigned {
            return Ok(());
        }
        Err(Error::MissingField {
            table: self.table_name.to_string(),
            key: key.to_string(),
            expected: target.expected(),
            found,
        })
    }
}
