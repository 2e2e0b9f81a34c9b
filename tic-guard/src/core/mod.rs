//! Core types: values, schemas and data objects.
//!
//! ## Overview
//!
//! - **[`Value`]** / **[`PrimaryKey`]**: the contents of a cell and the key
//!   of a row
//! - **[`Schema`]**: the immutable declaration of tables, fields and
//!   constraints, assembled with a [`SchemaBuilder`]
//! - **[`TicDat`]**: a mutable data object with one [`Table`] per schema
//!   table
//! - **[`FrozenTicDat`]**: the immutable, shareable snapshot of a data object
//!
//! ## Lifecycle
//!
//! ```text
//! Schema ──tic_dat()──▶ TicDat ──(readers / insert)──▶ TicDat
//!                                                        │ freeze()
//!                                                        ▼
//!                        validation, writers ◀── FrozenTicDat ──thaw()──▶ TicDat
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tic_guard::core::{PrimaryKey, Schema, Value};
//!
//! # fn example() -> tic_guard::error::Result<()> {
//! let schema = Schema::builder()
//!     .table("arcs", ["source", "destination"], ["capacity"])?
//!     .build()?;
//!
//! let mut dat = schema.tic_dat();
//! dat.table_mut("arcs")?
//!     .insert(("Denver", "Boston"), vec![Value::from(120)])?;
//!
//! let frozen = dat.freeze();
//! let arcs = frozen.table("arcs")?;
//! let key = PrimaryKey::from(("Denver", "Boston"));
//! assert_eq!(arcs.get(&key).and_then(|r| r.number("capacity")), Some(120.0));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod dataset;
mod schema;
mod value;

pub use dataset::{FrozenTicDat, Row, Table, TicDat};
pub use schema::{Schema, SchemaBuilder, TableSchema};
pub use value::{PrimaryKey, Value};
