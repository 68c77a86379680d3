//! Stack-based value exchange with an embedded Lua runtime.
//!
//! This crate contains the primitives every other part of the bridge is built on:
//! - `ValueStack` - owned runtime instance plus the shared value stack
//! - `Arg` / `ArgType` - tagged primitive values that push and fill themselves
//! - `HostCallback` - host functions callable from scripts
//! - `BalanceScope` - net push/pop tracking for multi-step operations

pub mod arg;
pub mod callback;
pub mod config;
pub mod errors;
mod guard;
mod kind;
pub mod stack;

pub use arg::{Arg, ArgType};
pub use callback::{CallbackProvider, CallbackRegistry, HostCallback};
pub use config::{BalanceCheck, Coercion, StackConfig};
pub use errors::{Error, Result, ScriptError, ScriptErrorKind};
pub use guard::BalanceScope;
pub use kind::{ValueKind, exact_integer, truncated_integer};
pub use stack::{TOP, ValueStack};

pub use mlua;
