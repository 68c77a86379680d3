//! The value stack handle.
//!
//! [`ValueStack`] owns one runtime instance plus the ordered sequence of values
//! that is the only channel between host code and scripts. Positions follow
//! the runtime's convention: `1..=size()` from the bottom, `-1..=-size()` from
//! the top, `0` never valid.
//!
//! Host callbacks receive a *frame*: a `ValueStack` that borrows the runtime of
//! the handle that registered them and starts out holding exactly the call's
//! arguments.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use mlua::{Lua, LuaOptions, MultiValue, StdLib, Table, Value};
use smallvec::SmallVec;

use crate::arg::Arg;
use crate::callback::HostCallback;
use crate::config::StackConfig;
use crate::errors::{Error, Result, ScriptError, ScriptErrorKind, diagnostic, messages};
use crate::kind::{ValueKind, exact_integer};

/// Index of the topmost slot.
pub const TOP: i32 = -1;

enum Runtime<'lua> {
    Owned(Lua),
    Borrowed(&'lua Lua),
}

pub struct ValueStack<'lua> {
    // Declared first so stacked values are released before an owned runtime.
    slots: Vec<Value>,
    runtime: Runtime<'lua>,
    config: StackConfig,
    callbacks: IndexMap<String, usize>,
}

impl ValueStack<'static> {
    /// Creates a fresh runtime instance with the default configuration.
    pub fn acquire() -> Result<Self> {
        Self::with_config(StackConfig::default())
    }

    pub fn with_config(config: StackConfig) -> Result<Self> {
        let lua = if config.open_libs {
            Lua::new()
        } else {
            Lua::new_with(StdLib::NONE, LuaOptions::default())?
        };
        log::debug!(
            "acquired runtime (capacity {}, libs {})",
            config.capacity,
            config.open_libs
        );
        Ok(Self {
            slots: Vec::new(),
            runtime: Runtime::Owned(lua),
            config,
            callbacks: IndexMap::new(),
        })
    }
}

impl<'lua> ValueStack<'lua> {
    pub(crate) fn frame(lua: &'lua Lua, args: Vec<Value>, config: StackConfig) -> Self {
        Self {
            slots: args,
            runtime: Runtime::Borrowed(lua),
            config,
            callbacks: IndexMap::new(),
        }
    }

    /// Tears the runtime down. Equivalent to dropping the handle.
    pub fn release(self) {
        drop(self);
    }

    pub fn lua(&self) -> &Lua {
        match &self.runtime {
            Runtime::Owned(lua) => lua,
            Runtime::Borrowed(lua) => lua,
        }
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn is_frame(&self) -> bool {
        matches!(self.runtime, Runtime::Borrowed(_))
    }

    // ---- positions ----------------------------------------------------

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: i32) -> Option<usize> {
        let len = self.slots.len();
        if index > 0 {
            let at = index as usize;
            (at <= len).then(|| at - 1)
        } else if index < 0 {
            let back = index.unsigned_abs() as usize;
            (back <= len).then(|| len - back)
        } else {
            None
        }
    }

    /// Converts `index` to its positive form, which stays valid while values
    /// are pushed above it.
    pub fn absolute(&self, index: i32) -> Option<i32> {
        self.slot(index).and_then(|at| i32::try_from(at + 1).ok())
    }

    // ---- pushing ------------------------------------------------------

    pub fn push_value(&mut self, value: Value) -> Result<()> {
        if self.slots.len() >= self.config.capacity {
            return Err(Error::StackOverflow {
                capacity: self.config.capacity,
            });
        }
        self.slots.push(value);
        Ok(())
    }

    /// Pushes any typed-argument-compatible primitive.
    pub fn push(&mut self, value: impl Into<Arg>) -> Result<()> {
        value.into().push_to(self)
    }

    pub fn push_nil(&mut self) -> Result<()> {
        self.push_value(Value::Nil)
    }

    pub fn push_bool(&mut self, value: bool) -> Result<()> {
        self.push_value(Value::Boolean(value))
    }

    pub fn push_integer(&mut self, value: i64) -> Result<()> {
        self.push_value(Value::Integer(value))
    }

    pub fn push_number(&mut self, value: f64) -> Result<()> {
        self.push_value(Value::Number(value))
    }

    pub fn push_str(&mut self, value: &str) -> Result<()> {
        let s = self.lua().create_string(value)?;
        self.push_value(Value::String(s))
    }

    pub fn push_copy(&mut self, index: i32) -> Result<()> {
        let value = self.peek(index).cloned().ok_or(Error::InvalidIndex(index))?;
        self.push_value(value)
    }

    /// Pushes a host function value without binding it to a global.
    pub fn push_callback(&mut self, callback: HostCallback) -> Result<()> {
        let function = callback.into_function(self.lua(), self.config)?;
        self.push_value(Value::Function(function))
    }

    // ---- removing -----------------------------------------------------

    pub fn pop(&mut self, count: usize) -> Result<()> {
        let available = self.slots.len();
        if count > available {
            return Err(Error::StackUnderflow {
                requested: count,
                available,
            });
        }
        self.slots.truncate(available - count);
        Ok(())
    }

    pub fn pop_value(&mut self) -> Result<Value> {
        self.slots.pop().ok_or(Error::StackUnderflow {
            requested: 1,
            available: 0,
        })
    }

    /// Removes the value at `index`, shifting the values above it down.
    pub fn remove(&mut self, index: i32) -> Result<Value> {
        let at = self.slot(index).ok_or(Error::InvalidIndex(index))?;
        Ok(self.slots.remove(at))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub(crate) fn take_results(&mut self, count: usize) -> Result<MultiValue> {
        let available = self.slots.len();
        if count > available {
            return Err(Error::StackUnderflow {
                requested: count,
                available,
            });
        }
        Ok(self.slots.drain(available - count..).collect())
    }

    // ---- inspecting ---------------------------------------------------

    pub fn peek(&self, index: i32) -> Option<&Value> {
        self.slot(index).map(|at| &self.slots[at])
    }

    pub fn kind(&self, index: i32) -> ValueKind {
        self.peek(index).map_or(ValueKind::None, ValueKind::of)
    }

    pub fn is_nil(&self, index: i32) -> bool {
        self.kind(index) == ValueKind::Nil
    }

    pub fn has_number(&self, index: i32) -> bool {
        self.kind(index).is_number()
    }

    pub fn has_integer(&self, index: i32) -> bool {
        self.kind(index) == ValueKind::Integer
    }

    pub fn has_string(&self, index: i32) -> bool {
        self.kind(index) == ValueKind::String
    }

    pub fn has_bool(&self, index: i32) -> bool {
        self.kind(index) == ValueKind::Boolean
    }

    pub fn has_table(&self, index: i32) -> bool {
        self.kind(index) == ValueKind::Table
    }

    pub fn has_function(&self, index: i32) -> bool {
        self.kind(index) == ValueKind::Function
    }

    pub fn to_number(&self, index: i32) -> Option<f64> {
        match self.peek(index)? {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_integer(&self, index: i32) -> Option<i64> {
        exact_integer(self.peek(index)?)
    }

    pub fn to_str(&self, index: i32) -> Option<String> {
        match self.peek(index)? {
            Value::String(s) => Some(s.to_string_lossy()),
            _ => None,
        }
    }

    /// Truthiness as the runtime sees it: only nil and false are false.
    pub fn to_bool(&self, index: i32) -> bool {
        !matches!(
            self.peek(index),
            None | Some(Value::Nil) | Some(Value::Boolean(false))
        )
    }

    fn table_at(&self, index: i32) -> Result<Table> {
        match self.peek(index) {
            Some(Value::Table(t)) => Ok(t.clone()),
            Some(other) => Err(Error::NotATable {
                index,
                found: ValueKind::of(other),
            }),
            None => Err(Error::InvalidIndex(index)),
        }
    }

    /// Renders every slot, bottom first. Meant for log output.
    pub fn dump(&self) -> String {
        let mut out = String::from("[");
        let mut ints = itoa::Buffer::new();
        let mut floats = ryu::Buffer::new();
        for (i, value) in self.slots.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(ints.format(i + 1));
            out.push('=');
            match value {
                Value::Integer(n) => out.push_str(ints.format(*n)),
                Value::Number(n) => out.push_str(floats.format(*n)),
                Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
                Value::String(s) => {
                    out.push('"');
                    out.push_str(&s.to_string_lossy());
                    out.push('"');
                }
                other => out.push_str(ValueKind::of(other).type_name()),
            }
        }
        out.push(']');
        out
    }

    // ---- globals and tables -------------------------------------------

    /// Pushes the global `name` (nil when unset).
    pub fn request_global(&mut self, name: &str) -> Result<()> {
        let value: Value = self.lua().globals().get(name)?;
        self.push_value(value)
    }

    /// Pops the top value and binds it to the global `name`.
    pub fn set_global(&mut self, name: &str) -> Result<()> {
        let value = self.pop_value()?;
        self.lua().globals().set(name, value)?;
        Ok(())
    }

    /// Pushes an empty table and returns its positive index.
    pub fn new_table(&mut self) -> Result<i32> {
        let index = i32::try_from(self.slots.len() + 1).map_err(|_| Error::StackOverflow {
            capacity: self.config.capacity,
        })?;
        let table = self.lua().create_table()?;
        self.push_value(Value::Table(table))?;
        Ok(index)
    }

    /// Pops the top value and stores it under `key` in the table at
    /// `table_index`.
    pub fn set_field(&mut self, table_index: i32, key: &str) -> Result<()> {
        let table = self.table_at(table_index)?;
        let value = self.pop_value()?;
        table.set(key, value)?;
        Ok(())
    }

    /// Pops a key and pushes `table[key]` for the table at `table_index`. The
    /// table index is resolved before the key is popped.
    pub fn request_field(&mut self, table_index: i32) -> Result<()> {
        let table = self.table_at(table_index)?;
        let key = self.pop_value()?;
        let value: Value = table.get(key)?;
        self.push_value(value)
    }

    pub fn request_named_field(&mut self, table_index: i32, key: &str) -> Result<()> {
        let table = self.table_at(table_index)?;
        let value: Value = table.get(key)?;
        self.push_value(value)
    }

    pub fn add_table_member(
        &mut self,
        table_index: i32,
        key: &str,
        value: impl Into<Arg>,
    ) -> Result<()> {
        let at = self
            .absolute(table_index)
            .ok_or(Error::InvalidIndex(table_index))?;
        self.push(value)?;
        self.set_field(at, key)
    }

    pub fn add_table_callback(
        &mut self,
        table_index: i32,
        key: &str,
        callback: HostCallback,
    ) -> Result<()> {
        let at = self
            .absolute(table_index)
            .ok_or(Error::InvalidIndex(table_index))?;
        self.push_callback(callback)?;
        self.set_field(at, key)
    }

    // ---- callbacks ----------------------------------------------------

    /// Exposes `callback` as a global under its own name. Registering a name
    /// twice replaces the earlier function.
    pub fn register_callback(&mut self, callback: HostCallback) -> Result<()> {
        let name = callback.name().to_string();
        let min_args = callback.min_args();
        self.push_callback(callback)?;
        self.set_global(&name)?;
        log::debug!("registered callback `{name}` (min args {min_args})");
        self.callbacks.insert(name, min_args);
        Ok(())
    }

    /// Names of callbacks registered through this handle, oldest first.
    pub fn callbacks(&self) -> impl Iterator<Item = &str> {
        self.callbacks.keys().map(String::as_str)
    }

    // ---- scripts ------------------------------------------------------

    /// Loads and runs the script at `path` once.
    pub fn run_script(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::debug!("running script {}", path.display());
        let outcome = match fs::read(path) {
            Ok(source) => run_chunk(
                self.lua()
                    .load(source.as_slice())
                    .set_name(format!("@{}", path.display())),
            ),
            Err(e) => Err((
                ScriptErrorKind::Load,
                format!("cannot open {}: {e}", path.display()),
            )),
        };
        settle(outcome)
    }

    /// Runs in-memory source under `chunk_name`.
    pub fn run_source(&mut self, source: &str, chunk_name: &str) -> Result<()> {
        let outcome = run_chunk(self.lua().load(source).set_name(format!("={chunk_name}")));
        settle(outcome)
    }

    // ---- calls --------------------------------------------------------

    /// Calls the value sitting below the top `n_inputs` values.
    ///
    /// On success the callee and its arguments are replaced by exactly
    /// `n_outputs` results. On failure they are replaced by one diagnostic
    /// string which the caller must pop. Too few values below the top, or too
    /// little capacity for the results, is an error that leaves the stack
    /// untouched.
    pub fn invoke(&mut self, n_inputs: usize, n_outputs: usize) -> Result<()> {
        self.invoke_with_handler(n_inputs, n_outputs, 0)
    }

    /// Like [`ValueStack::invoke`], routing a failure's diagnostic through the
    /// function at `handler` first. `0` means no handler; any other index must
    /// lie below the callee.
    pub fn invoke_with_handler(
        &mut self,
        n_inputs: usize,
        n_outputs: usize,
        handler: i32,
    ) -> Result<()> {
        let available = self.slots.len();
        let requested = n_inputs.checked_add(1).unwrap_or(usize::MAX);
        if available < requested {
            return Err(Error::StackUnderflow {
                requested,
                available,
            });
        }
        let base = available - requested;
        if n_outputs > self.config.capacity.saturating_sub(base) {
            return Err(Error::StackOverflow {
                capacity: self.config.capacity,
            });
        }
        let handler = match handler {
            0 => None,
            index => match self.slot(index) {
                Some(at) if at < base => Some(self.slots[at].clone()),
                _ => return Err(Error::InvalidIndex(index)),
            },
        };

        let mut call: SmallVec<[Value; 8]> = self.slots.drain(base..).collect();
        let callee = call.remove(0);
        log::trace!("invoke {n_inputs} -> {n_outputs} {}", self.dump());
        let outcome = match callee {
            Value::Function(f) => f
                .call::<MultiValue>(call.into_iter().collect::<MultiValue>())
                .map_err(|e| diagnostic(&e)),
            other => Err(format!(
                "{} {} value",
                messages::CALL_NON_FUNCTION,
                ValueKind::of(&other).type_name()
            )),
        };

        match outcome {
            Ok(results) => {
                let mut results = results.into_iter();
                for _ in 0..n_outputs {
                    self.push_value(results.next().unwrap_or(Value::Nil))?;
                }
                Ok(())
            }
            Err(message) => {
                let message = match handler {
                    Some(handler) => handle_fault(handler, message),
                    None => message,
                };
                log::warn!("{message}");
                self.push_str(&message)?;
                Err(Error::Script(ScriptError::new(
                    ScriptErrorKind::Runtime,
                    message,
                )))
            }
        }
    }
}

impl Drop for ValueStack<'_> {
    fn drop(&mut self) {
        if let Runtime::Owned(_) = self.runtime {
            log::debug!("releasing runtime ({} values left on stack)", self.slots.len());
        }
    }
}

/// Turns a failed load or run into its `ScriptError`. The stack is not used.
fn settle(outcome: std::result::Result<(), (ScriptErrorKind, String)>) -> Result<()> {
    let Err((kind, message)) = outcome else {
        return Ok(());
    };
    log::warn!("{message}");
    Err(Error::Script(ScriptError::new(kind, message)))
}

fn run_chunk(chunk: mlua::Chunk<'_>) -> std::result::Result<(), (ScriptErrorKind, String)> {
    let function = chunk
        .into_function()
        .map_err(|e| (ScriptErrorKind::Load, diagnostic(&e)))?;
    function
        .call::<()>(())
        .map_err(|e| (ScriptErrorKind::Runtime, diagnostic(&e)))
}

fn handle_fault(handler: Value, message: String) -> String {
    let Value::Function(handler) = handler else {
        return messages::ERROR_IN_HANDLER.to_string();
    };
    match handler.call::<Value>(message) {
        Ok(Value::String(s)) => s.to_string_lossy(),
        Ok(other) => format!(
            "(error object is a {} value)",
            ValueKind::of(&other).type_name()
        ),
        Err(e) => diagnostic(&e),
    }
}
