//! Host functions exposed to scripts.
//!
//! A callback body receives a frame holding exactly the arguments of the call
//! (index `1` is the first argument), pushes its results and returns how many
//! it pushed. The adapter then hands the top that-many values back to the
//! runtime.

use std::fmt;
use std::rc::Rc;

use mlua::{Function, Lua, MultiValue};

use crate::config::StackConfig;
use crate::errors::{Error, Result, messages};
use crate::stack::ValueStack;

type Body = dyn Fn(&mut ValueStack<'_>) -> Result<usize>;

#[derive(Clone)]
pub struct HostCallback {
    name: String,
    min_args: usize,
    body: Rc<Body>,
}

impl HostCallback {
    /// `min_args` is the argument count the body reads. Calls that supply
    /// fewer never reach the body; they get a single nil result instead.
    pub fn new<F>(name: impl Into<String>, min_args: usize, body: F) -> Self
    where
        F: Fn(&mut ValueStack<'_>) -> Result<usize> + 'static,
    {
        Self {
            name: name.into(),
            min_args,
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_args(&self) -> usize {
        self.min_args
    }

    pub(crate) fn into_function(self, lua: &Lua, config: StackConfig) -> Result<Function> {
        let function =
            lua.create_function(move |lua, args: MultiValue| self.dispatch(lua, args, config))?;
        Ok(function)
    }

    fn dispatch(&self, lua: &Lua, args: MultiValue, config: StackConfig) -> mlua::Result<MultiValue> {
        let mut frame = ValueStack::frame(lua, args.into_iter().collect(), config);
        let supplied = frame.size();
        let promised = if supplied < self.min_args {
            log::warn!(
                "{}: {} (expected {}, got {supplied})",
                self.name,
                messages::NOT_ENOUGH_ARGS,
                self.min_args
            );
            frame.push_nil().map_err(into_lua_error)?;
            1
        } else {
            (self.body)(&mut frame).map_err(into_lua_error)?
        };
        frame.take_results(promised).map_err(|_| {
            into_lua_error(Error::Callback {
                name: self.name.clone(),
                message: format!("{} ({promised})", messages::TOO_MANY_RESULTS),
            })
        })
    }
}

impl fmt::Debug for HostCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCallback")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .finish_non_exhaustive()
    }
}

fn into_lua_error(err: Error) -> mlua::Error {
    match err {
        Error::Lua(e) => e,
        other => mlua::Error::external(other),
    }
}

/// An ordered batch of callbacks installed together.
pub struct CallbackRegistry {
    entries: Vec<HostCallback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, callback: HostCallback) {
        self.entries.push(callback);
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|c| c.name.clone()).collect()
    }

    pub fn install_into(self, stack: &mut ValueStack<'_>) -> Result<()> {
        for callback in self.entries {
            stack.register_callback(callback)?;
        }
        Ok(())
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub trait CallbackProvider {
    fn install(&self, registry: &mut CallbackRegistry);
}
