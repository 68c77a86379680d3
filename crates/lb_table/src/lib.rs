//! Declarative mapping of script tables onto host records.
//!
//! - `FieldMapper` - reads individual keys out of the table on top of the stack
//! - `Schema` / `TableRecord` - ordered field declarations and `hydrate`
//! - `TableFunction` - typed, fixed-arity handles to script functions

pub mod errors;
pub mod function;
pub mod mapper;
pub mod schema;

pub use errors::{ArgSide, Error, Result};
pub use function::TableFunction;
pub use mapper::{FieldMapper, FieldSite, MapTarget};
pub use schema::{Schema, TableRecord, hydrate};
