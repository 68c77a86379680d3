//! Hydration and call errors.

use std::fmt;

use lb_stack::{ScriptError, ValueKind};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgSide {
    Inputs,
    Outputs,
}

impl fmt::Display for ArgSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inputs => f.write_str("inputs"),
            Self::Outputs => f.write_str("outputs"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required mapping found no value of the expected type.
    #[error("required field `{key}` of `{table}` is missing or not a {expected} (found {found})")]
    MissingField {
        table: String,
        key: String,
        expected: &'static str,
        found: ValueKind,
    },
    /// An optional mapping found a mistyped value under strict coercion.
    #[error("field `{key}` of `{table}` is not a {expected} (found {found})")]
    FieldType {
        table: String,
        key: String,
        expected: &'static str,
        found: ValueKind,
    },
    /// The slots supplied at a call site disagree with the declared arity.
    #[error("`{name}` declares {declared} {side} but {supplied} were supplied")]
    Arity {
        name: String,
        side: ArgSide,
        declared: usize,
        supplied: usize,
    },
    #[error("`{name}` is not callable (found {found})")]
    NotCallable { name: String, found: ValueKind },
    #[error("table function is not bound")]
    Unbound,
    /// The runtime raised while running the function.
    #[error("call to `{name}` failed: {source}")]
    Call {
        name: String,
        #[source]
        source: ScriptError,
    },
    #[error(transparent)]
    Stack(#[from] lb_stack::Error),
}
