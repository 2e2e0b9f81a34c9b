//! # tic-guard - Declarative Schemas for Optimization Input Data
//!
//! tic-guard describes the input and output tables of an optimization model
//! as a schema: every table has primary-key fields and data fields, fields
//! may carry a data type, and tables may reference each other through
//! foreign keys. A schema hands out empty data objects, checks them for data
//! quality problems, and moves them between file formats.
//!
//! ## Quick Start
//!
//! ```rust
//! use tic_guard::prelude::*;
//! use tic_guard::constraints::FieldMapping;
//!
//! # fn example() -> tic_guard::error::Result<()> {
//! let schema = Schema::builder()
//!     .table("players", ["Player Name"], ["Position", "Expected Points"])?
//!     .table("drafted", ["Player Name"], ["Draft Position"])?
//!     .set_data_type("players", "Expected Points", DataType::number())?
//!     .add_foreign_key("drafted", "players", vec![FieldMapping::new("Player Name", "Player Name")])?
//!     .build()?;
//!
//! let mut dat = schema.tic_dat();
//! dat.table_mut("players")?
//!     .insert("Joe Flacco", vec![Value::from("QB"), Value::from(181.5)])?;
//! dat.table_mut("drafted")?
//!     .insert("Tom Brady", vec![Value::from(1)])?;
//!
//! let report = schema.validate(&dat);
//! assert!(!report.is_success());
//! assert_eq!(report.metrics.foreign_key_failures, 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Architecture
//!
//! - **`core`**: values, primary keys, schemas and data objects
//! - **`constraints`**: data types and foreign keys
//! - **`validation`**: failure detection and the [`ValidationReport`](validation::ValidationReport)
//! - **`sources`**: CSV, JSON, SQLite and XLSX readers and writers, plus
//!   Arrow-backed frames
//! - **`formatters`**: human-readable and JSON rendering of reports
//! - **`logging`**: log configuration and subscriber setup
//! - **`security`**: identifier checks for SQL and spreadsheet output
//!
//! ## Feature Flags
//!
//! - `sqlite` (default): SQLite database files
//! - `xlsx` (default): Excel workbooks

pub mod constraints;
pub mod core;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod security;
pub mod sources;
pub mod validation;
