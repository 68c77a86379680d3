//! Typed handles to script functions.
//!
//! A `TableFunction<I, O>` names a function that takes `I` arguments and
//! yields `O` results. Output slot `i` receives the `i`-th result.

use lb_stack::mlua::{Table, Value};
use lb_stack::{Arg, ArgType, ScriptErrorKind, TOP, ValueKind, ValueStack};

use crate::errors::{ArgSide, Error, Result};
use crate::mapper::{FieldSite, MapTarget};

#[derive(Clone, Debug)]
enum Enclosing {
    Globals,
    Table { name: String, table: Table },
}

#[derive(Clone, Debug)]
struct FunctionRef {
    name: String,
    enclosing: Enclosing,
}

#[derive(Clone, Debug, Default)]
pub struct TableFunction<const I: usize = 0, const O: usize = 0> {
    binding: Option<FunctionRef>,
    fault_handler: i32,
}

impl<const I: usize, const O: usize> TableFunction<I, O> {
    pub const INPUTS: usize = I;
    pub const OUTPUTS: usize = O;

    /// Binds to the global `name`. Nothing is resolved until the first call.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            binding: Some(FunctionRef {
                name: name.into(),
                enclosing: Enclosing::Globals,
            }),
            fault_handler: 0,
        }
    }

    pub(crate) fn bind(&mut self, name: &str, table_name: &str, table: &Table) {
        self.binding = Some(FunctionRef {
            name: name.to_string(),
            enclosing: Enclosing::Table {
                name: table_name.to_string(),
                table: table.clone(),
            },
        });
    }

    /// Routes failures through the function at stack `index` (`0` for none).
    pub fn with_fault_handler(mut self, index: i32) -> Self {
        self.fault_handler = index;
        self
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.name.as_str())
    }

    /// Name of the enclosing table, `None` for globals and unbound handles.
    pub fn table_name(&self) -> Option<&str> {
        match &self.binding.as_ref()?.enclosing {
            Enclosing::Globals => None,
            Enclosing::Table { name, .. } => Some(name),
        }
    }

    pub fn input_arity(&self) -> usize {
        I
    }

    pub fn output_arity(&self) -> usize {
        O
    }

    /// Calls the bound function with `inputs` and fills `outputs` from its
    /// results, leaving the stack as it found it.
    ///
    /// Arity is checked before anything is pushed. Outputs whose result has
    /// the wrong type keep their previous payload.
    pub fn call(&self, stack: &mut ValueStack<'_>, inputs: &[Arg], outputs: &mut [Arg]) -> Result<()> {
        let label = self.name().unwrap_or("<unbound>");
        check_arity(label, ArgSide::Inputs, I, inputs.len())?;
        check_arity(label, ArgSide::Outputs, O, outputs.len())?;
        let binding = self.binding.as_ref().ok_or(Error::Unbound)?;

        let handler = match self.fault_handler {
            0 => 0,
            index => stack
                .absolute(index)
                .ok_or(lb_stack::Error::InvalidIndex(index))?,
        };

        let mut scope = stack.balanced("table function call");
        match &binding.enclosing {
            Enclosing::Globals => scope.request_global(&binding.name)?,
            Enclosing::Table { table, .. } => {
                scope.push_value(Value::Table(table.clone()))?;
                scope.request_named_field(TOP, &binding.name)?;
                scope.remove(-2)?;
            }
        }
        if !scope.has_function(TOP) {
            let found = scope.kind(TOP);
            scope.pop(1)?;
            scope.finish();
            return Err(Error::NotCallable {
                name: binding.name.clone(),
                found,
            });
        }

        for input in inputs {
            input.push_to(&mut scope)?;
        }
        match scope.invoke_with_handler(I, O, handler) {
            Ok(()) => {}
            Err(lb_stack::Error::Script(source)) if source.kind == ScriptErrorKind::Runtime => {
                scope.pop(1)?;
                scope.finish();
                return Err(Error::Call {
                    name: binding.name.clone(),
                    source,
                });
            }
            Err(e) => return Err(e.into()),
        }

        for (i, output) in outputs.iter_mut().enumerate() {
            output.fill_from(&scope, -((O - i) as i32))?;
        }
        scope.pop(O)?;
        scope.finish();
        Ok(())
    }

    /// Like [`TableFunction::call`], returning fresh outputs of the given types.
    pub fn call_typed(
        &self,
        stack: &mut ValueStack<'_>,
        inputs: &[Arg; I],
        outputs: [ArgType; O],
    ) -> Result<[Arg; O]> {
        let mut results = outputs.map(Arg::placeholder);
        self.call(stack, inputs, &mut results)?;
        Ok(results)
    }
}

fn check_arity(name: &str, side: ArgSide, declared: usize, supplied: usize) -> Result<()> {
    if declared == supplied {
        return Ok(());
    }
    Err(Error::Arity {
        name: name.to_string(),
        side,
        declared,
        supplied,
    })
}

impl<const I: usize, const O: usize> MapTarget for TableFunction<I, O> {
    fn assign(&mut self, value: &Value, site: &FieldSite<'_>) -> bool {
        if ValueKind::of(value) != ValueKind::Function {
            return false;
        }
        self.bind(site.key, site.table_name, site.table);
        true
    }

    fn expected(&self) -> &'static str {
        "function"
    }
}
