//! Error types and common diagnostic strings.

use std::fmt;

use crate::arg::ArgType;
use crate::kind::ValueKind;

pub mod messages {
    pub const CALL_NON_FUNCTION: &str = "attempt to call a";
    pub const ERROR_IN_HANDLER: &str = "error in error handling";
    pub const NOT_ENOUGH_ARGS: &str = "not enough arguments";
    pub const TOO_MANY_RESULTS: &str = "callback promised more results than it pushed";
    pub const TRACEBACK_MARKER: &str = "\nstack traceback:";
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptErrorKind {
    /// The chunk could not be read or compiled.
    Load,
    /// The chunk or a called function raised while running.
    Runtime,
}

impl fmt::Display for ScriptErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => f.write_str("load"),
            Self::Runtime => f.write_str("runtime"),
        }
    }
}

/// A failure reported by the runtime itself, carrying its diagnostic text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    pub message: String,
}

impl ScriptError {
    pub fn new(kind: ScriptErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("stack underflow: requested {requested} values, {available} available")]
    StackUnderflow { requested: usize, available: usize },
    #[error("stack overflow: capacity of {capacity} values reached")]
    StackOverflow { capacity: usize },
    #[error("invalid stack index {0}")]
    InvalidIndex(i32),
    #[error("value at index {index} is not a table (found {found})")]
    NotATable { index: i32, found: ValueKind },
    #[error("type mismatch at index {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: i32,
        expected: ArgType,
        found: ValueKind,
    },
    #[error("callback `{name}`: {message}")]
    Callback { name: String, message: String },
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

/// Extracts the runtime's own message from an `mlua` error, dropping the
/// callback wrappers and the appended traceback.
pub fn diagnostic(err: &mlua::Error) -> String {
    let text = match err {
        mlua::Error::RuntimeError(msg) | mlua::Error::MemoryError(msg) => msg.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        mlua::Error::CallbackError { cause, .. } => return diagnostic(cause),
        mlua::Error::WithContext { cause, .. } => return diagnostic(cause),
        mlua::Error::ExternalError(inner) => inner.to_string(),
        other => other.to_string(),
    };
    match text.find(messages::TRACEBACK_MARKER) {
        Some(end) => text[..end].to_string(),
        None => text,
    }
}
