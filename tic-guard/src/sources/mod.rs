//! Format converters between data objects and external storage.
//!
//! Every file-backed format implements [`TableReader`] and [`TableWriter`]
//! and shares the same contract:
//!
//! - a table absent from the source (file, sheet, database table, JSON key)
//!   reads as empty;
//! - a table present but missing a declared field fails with
//!   [`TicDatError::FieldMismatch`]; extra columns are ignored with a
//!   warning;
//! - when a primary key occurs more than once the last row wins, and
//!   [`TableReader::find_duplicates`] reports such keys;
//! - writers emit tables and fields in schema order (primary-key fields
//!   first) and refuse to replace existing output unless
//!   [`WriteOptions::allow_overwrite`] is set.
//!
//! [`DataFormat`] picks a converter from a path or a name. The columnar
//! [`frames`] view lives in memory and has its own API.
//!
//! ```rust,no_run
//! use tic_guard::sources::{DataFormat, WriteOptions};
//! # use tic_guard::core::Schema;
//! # fn example(schema: std::sync::Arc<Schema>) -> tic_guard::error::Result<()> {
//! let format = DataFormat::from_path("input.xlsx")?;
//! let dat = format.read("input.xlsx", &schema)?;
//! DataFormat::Json.write("output.json", &dat, &WriteOptions::default().with_overwrite(true))?;
//! # Ok(())
//! # }
//! ```

use crate::core::{PrimaryKey, Schema, TableSchema, TicDat, Value};
use crate::error::{Result, TicDatError};
use crate::validation::Duplicates;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

mod csv;
pub mod frames;
mod json;
#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(feature = "xlsx")]
mod xlsx;

pub use self::csv::{CsvDirectory, CsvOptions};
pub use self::json::JsonFile;
#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteFile;
#[cfg(feature = "xlsx")]
pub use self::xlsx::XlsxFile;

/// Reads a data object from an external source.
pub trait TableReader {
    /// Loads every schema table present in the source.
    fn read(&self, schema: &Arc<Schema>) -> Result<TicDat>;

    /// Primary keys that occur more than once in the source, per table.
    fn find_duplicates(&self, schema: &Schema) -> Result<Duplicates>;
}

/// Writes a data object to an external destination.
pub trait TableWriter {
    fn write(&self, dat: &TicDat) -> Result<()>;
}

/// Options shared by every writer.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Replace existing output instead of failing
    pub allow_overwrite: bool,
}

impl WriteOptions {
    pub fn with_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }
}

/// The file-backed formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    /// A directory with one `<table>.csv` per table
    Csv,
    /// One JSON document keyed by table name
    Json,
    /// A SQLite database file
    Sqlite,
    /// An Excel workbook with one sheet per table
    Xlsx,
}

impl DataFormat {
    pub const ALL: [DataFormat; 4] = [Self::Csv, Self::Json, Self::Sqlite, Self::Xlsx];

    /// Infers the format from a path: directories and extension-less paths
    /// are CSV directories, otherwise the extension decides.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            return Ok(Self::Csv);
        }
        let Some(extension) = path.extension() else {
            return Ok(Self::Csv);
        };
        match extension.to_string_lossy().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "db" | "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "xlsx" | "xlsm" | "xls" => Ok(Self::Xlsx),
            other => Err(TicDatError::Configuration(format!(
                "cannot infer a data format from extension '.{other}' of {}",
                path.display()
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Sqlite => "sqlite",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn read(self, path: impl AsRef<Path>, schema: &Arc<Schema>) -> Result<TicDat> {
        let path = path.as_ref();
        match self {
            Self::Csv => CsvDirectory::new(path).read(schema),
            Self::Json => JsonFile::new(path).read(schema),
            #[cfg(feature = "sqlite")]
            Self::Sqlite => SqliteFile::new(path).read(schema),
            #[cfg(feature = "xlsx")]
            Self::Xlsx => XlsxFile::new(path).read(schema),
            #[allow(unreachable_patterns)]
            other => Err(other.disabled()),
        }
    }

    pub fn find_duplicates(self, path: impl AsRef<Path>, schema: &Schema) -> Result<Duplicates> {
        let path = path.as_ref();
        match self {
            Self::Csv => CsvDirectory::new(path).find_duplicates(schema),
            Self::Json => JsonFile::new(path).find_duplicates(schema),
            #[cfg(feature = "sqlite")]
            Self::Sqlite => SqliteFile::new(path).find_duplicates(schema),
            #[cfg(feature = "xlsx")]
            Self::Xlsx => XlsxFile::new(path).find_duplicates(schema),
            #[allow(unreachable_patterns)]
            other => Err(other.disabled()),
        }
    }

    pub fn write(self, path: impl AsRef<Path>, dat: &TicDat, options: &WriteOptions) -> Result<()> {
        let path = path.as_ref();
        match self {
            Self::Csv => CsvDirectory::new(path)
                .with_options(CsvOptions::default().with_overwrite(options.allow_overwrite))
                .write(dat),
            Self::Json => JsonFile::new(path).with_options(options.clone()).write(dat),
            #[cfg(feature = "sqlite")]
            Self::Sqlite => SqliteFile::new(path).with_options(options.clone()).write(dat),
            #[cfg(feature = "xlsx")]
            Self::Xlsx => XlsxFile::new(path).with_options(options.clone()).write(dat),
            #[allow(unreachable_patterns)]
            other => Err(other.disabled()),
        }
    }

    #[allow(dead_code)]
    fn disabled(self) -> TicDatError {
        TicDatError::Configuration(format!(
            "support for the {self} format was not compiled in"
        ))
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = TicDatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "sqlite" | "db" => Ok(Self::Sqlite),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(TicDatError::Configuration(format!(
                "unknown data format '{other}' (expected one of csv, json, sqlite, xlsx)"
            ))),
        }
    }
}

/// Where each schema field sits in an external header.
///
/// Fails with `FieldMismatch` when a declared field is missing and warns
/// about columns the schema does not declare.
pub(crate) fn field_positions(table: &TableSchema, header: &[String]) -> Result<Vec<usize>> {
    let mut positions = Vec::with_capacity(table.field_count());
    let mut missing = Vec::new();
    for field in table.all_fields() {
        match header.iter().position(|h| h.trim() == field) {
            Some(i) => positions.push(i),
            None => missing.push(field.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(TicDatError::FieldMismatch {
            table: table.name().to_string(),
            missing,
            found: header.to_vec(),
        });
    }
    let extra: Vec<&str> = header
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty() && !table.has_field(h))
        .collect();
    if !extra.is_empty() {
        warn!(table = table.name(), columns = ?extra, "ignoring columns not declared by the schema");
    }
    Ok(positions)
}

/// Picks the schema fields out of a raw record, in schema order.
pub(crate) fn project_record(positions: &[usize], mut cell: impl FnMut(usize) -> Value) -> Vec<Value> {
    positions.iter().map(|&i| cell(i)).collect()
}

/// Keys that appear more than once, with their counts.
pub(crate) fn count_duplicates(keys: impl IntoIterator<Item = PrimaryKey>) -> BTreeMap<PrimaryKey, usize> {
    let mut counts: BTreeMap<PrimaryKey, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    counts.retain(|_, count| *count > 1);
    counts
}

/// The primary-key part of a flat record.
pub(crate) fn key_of(table: &TableSchema, record: &[Value]) -> PrimaryKey {
    PrimaryKey::new(record[..table.primary_key_fields().len()].to_vec())
}

/// Fails when `path` exists and overwriting is off.
pub(crate) fn check_overwrite(path: &Path, allow_overwrite: bool) -> Result<()> {
    if path.exists() && !allow_overwrite {
        return Err(TicDatError::OutputExists {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

pub(crate) fn log_missing_table(source: &str, table: &str) {
    debug!(source, table, "table not present in source, reading it as empty");
}
