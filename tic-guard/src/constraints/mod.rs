//! Constraint declarations attached to a schema.
//!
//! Constraints are optional: a field without a [`DataType`] is unchecked and
//! a table without a [`ForeignKey`] is never reported for dangling
//! references. Both are registered through
//! [`SchemaBuilder`](crate::core::SchemaBuilder) and evaluated by the
//! [`validation`](crate::validation) engine.

mod datatype;
mod foreign_key;

pub use datatype::{DataType, StringsAllowed};
pub use foreign_key::{Cardinality, FieldMapping, ForeignKey};
