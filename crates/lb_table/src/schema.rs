//! Declared field mappings and record hydration.
//!
//! A record type lists its mappings once, in [`TableRecord::describe`]:
//!
//! ```ignore
//! impl TableRecord for Player {
//!     fn describe(schema: &mut Schema<Self>) {
//!         schema
//!             .optional("Name", |p| &mut p.name)
//!             .optional("Level", |p| &mut p.level)
//!             .required("Fun", |p| &mut p.fun);
//!     }
//! }
//! ```
//!
//! Hydration walks that list in declaration order. The first failing required
//! mapping stops it: fields declared earlier keep their new values, fields
//! declared later are not touched.

use lb_stack::{TOP, ValueStack};

use crate::errors::Result;
use crate::mapper::{FieldMapper, MapTarget};

pub trait TableRecord: Sized + 'static {
    fn describe(schema: &mut Schema<Self>);

    /// Hydrates `self` from the global table `table_name`. See [`hydrate`].
    fn read_from_global(&mut self, stack: &mut ValueStack<'_>, table_name: &str) -> Result<bool> {
        hydrate(stack, self, table_name)
    }
}

trait Binding<R> {
    fn key(&self) -> &'static str;
    fn is_required(&self) -> bool;
    fn apply(&self, record: &mut R, mapper: &mut FieldMapper<'_, '_>) -> Result<()>;
}

struct FieldBinding<R, T> {
    key: &'static str,
    required: bool,
    field: fn(&mut R) -> &mut T,
}

impl<R, T: MapTarget> Binding<R> for FieldBinding<R, T> {
    fn key(&self) -> &'static str {
        self.key
    }

    fn is_required(&self) -> bool {
        self.required
    }

    fn apply(&self, record: &mut R, mapper: &mut FieldMapper<'_, '_>) -> Result<()> {
        let target = (self.field)(record);
        if self.required {
            mapper.required(target, self.key)
        } else {
            mapper.map(target, self.key).map(drop)
        }
    }
}

/// Ordered (field, key, required) declarations for one record type.
pub struct Schema<R> {
    bindings: Vec<Box<dyn Binding<R>>>,
}

impl<R: 'static> Schema<R> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn optional<T: MapTarget + 'static>(
        &mut self,
        key: &'static str,
        field: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        self.push(key, false, field)
    }

    pub fn required<T: MapTarget + 'static>(
        &mut self,
        key: &'static str,
        field: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        self.push(key, true, field)
    }

    fn push<T: MapTarget + 'static>(
        &mut self,
        key: &'static str,
        required: bool,
        field: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        self.bindings.push(Box::new(FieldBinding {
            key,
            required,
            field,
        }));
        self
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.bindings.iter().map(|b| b.key()).collect()
    }

    pub fn required_keys(&self) -> Vec<&'static str> {
        self.bindings
            .iter()
            .filter(|b| b.is_required())
            .map(|b| b.key())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Runs every mapping against the table on top of `mapper`'s stack.
    pub fn apply(&self, record: &mut R, mapper: &mut FieldMapper<'_, '_>) -> Result<()> {
        for binding in &self.bindings {
            binding.apply(record, mapper)?;
        }
        Ok(())
    }
}

impl<R: TableRecord> Schema<R> {
    /// The schema `R` declares.
    pub fn of() -> Self {
        let mut schema = Self::new();
        R::describe(&mut schema);
        schema
    }
}

impl<R: 'static> Default for Schema<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Populates `record` from the global table `table_name`.
///
/// Returns `Ok(false)` without touching the record when the global is not a
/// table, `Ok(true)` once every mapping ran, and the first mapping error
/// otherwise. The stack is left as it was in every case.
pub fn hydrate<R: TableRecord>(
    stack: &mut ValueStack<'_>,
    record: &mut R,
    table_name: &str,
) -> Result<bool> {
    let schema = Schema::<R>::of();
    let mut scope = stack.balanced("hydrate");
    scope.request_global(table_name)?;
    if !scope.has_table(TOP) {
        log::trace!("hydrate: global `{table_name}` is {}", scope.kind(TOP));
        scope.pop(1)?;
        scope.finish();
        return Ok(false);
    }

    let outcome = match FieldMapper::new(&mut scope, table_name) {
        Ok(mut mapper) => schema.apply(record, &mut mapper),
        Err(e) => Err(e),
    };
    if let Err(e) = outcome {
        // Dropping the unfinished scope discards the table.
        log::debug!("hydrate `{table_name}` stopped: {e}");
        return Err(e);
    }
    scope.pop(1)?;
    scope.finish();
    Ok(true)
}
