//! Prelude for commonly used types and traits in tic-guard.

pub use crate::constraints::{DataType, FieldMapping, ForeignKey};
pub use crate::core::{FrozenTicDat, PrimaryKey, Schema, TicDat, Value};
pub use crate::error::{ErrorContext, Result, TicDatError};
pub use crate::formatters::{FormatterConfig, ResultFormatter};
pub use crate::logging::LogConfig;
pub use crate::sources::{DataFormat, TableReader, TableWriter};
pub use crate::validation::{Level, ValidationReport};
