//! Error types for the tic-guard library.
//!
//! Every fallible operation in the crate returns [`TicDatError`]. Data
//! quality problems (bad values, dangling foreign keys) are *not* errors:
//! they are reported as structured failures by the validation engine and
//! the caller decides whether to abort.

use thiserror::Error;

/// The main error type for the tic-guard library.
#[derive(Error, Debug)]
pub enum TicDatError {
    /// A schema definition was rejected while it was being built.
    #[error("Schema definition error: {0}")]
    SchemaDefinition(String),

    /// A table name that the schema does not declare.
    #[error("Table '{table}' is not part of the schema")]
    UnknownTable { table: String },

    /// A field name that the table does not declare.
    #[error("Field '{field}' is not part of table '{table}'")]
    UnknownField { table: String, field: String },

    /// A row was supplied with the wrong number of values.
    #[error("Table '{table}' expects {expected} values per row, got {found}")]
    RowArity {
        table: String,
        expected: usize,
        found: usize,
    },

    /// An external table does not carry every field the schema declares.
    #[error("Table '{table}' is missing declared fields {missing:?} (found columns {found:?})")]
    FieldMismatch {
        table: String,
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "CSV", "SQLite", "XLSX")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Refused to replace existing output.
    #[error("Output '{path}' already exists and overwriting is not allowed")]
    OutputExists { path: String },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A label selection asked for an index label that does not exist.
    #[error("Label {label} not found in index level {level} of '{table}'")]
    LabelNotFound {
        table: String,
        level: usize,
        label: String,
    },

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Security-related error.
    #[error("Security error: {0}")]
    SecurityError(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, TicDatError>`.
pub type Result<T> = std::result::Result<T, TicDatError>;

impl TicDatError {
    /// Creates a new schema definition error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaDefinition(message.into())
    }

    /// Creates a new unknown table error.
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }

    /// Creates a new unknown field error.
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }
}

impl From<serde_json::Error> for TicDatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for TicDatError {
    fn from(err: csv::Error) -> Self {
        Self::data_source_with_source("CSV", err.to_string(), Box::new(err))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for TicDatError {
    fn from(err: rusqlite::Error) -> Self {
        Self::data_source_with_source("SQLite", err.to_string(), Box::new(err))
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<TicDatError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            TicDatError::Internal(inner) => TicDatError::Internal(format!("{msg}: {inner}")),
            other => TicDatError::Internal(format!("{msg}: {other}")),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            match e.into() {
                TicDatError::Internal(inner) => TicDatError::Internal(format!("{msg}: {inner}")),
                other => TicDatError::Internal(format!("{msg}: {other}")),
            }
        })
    }
}
