//! Validation engine.
//!
//! The scans here are pure reads over a data object: they never mutate it
//! and never stop at the first failure. Every bad value and every dangling
//! foreign key is collected into a structured failure map, and
//! [`Schema::validate`] folds all of them into a [`ValidationReport`].
//!
//! ```rust
//! use tic_guard::constraints::{DataType, FieldMapping};
//! use tic_guard::core::{Schema, Value};
//!
//! # fn example() -> tic_guard::error::Result<()> {
//! let schema = Schema::builder()
//!     .table("nodes", ["name"], Vec::<String>::new())?
//!     .table("arcs", ["source", "destination"], ["capacity"])?
//!     .set_data_type("arcs", "capacity", DataType::number())?
//!     .add_foreign_key("arcs", "nodes", vec![FieldMapping::new("source", "name")])?
//!     .build()?;
//!
//! let mut dat = schema.tic_dat();
//! dat.table_mut("nodes")?.insert("Denver", vec![])?;
//! dat.table_mut("arcs")?.insert(("Denver", "Boston"), vec![Value::from(-5)])?;
//! dat.table_mut("arcs")?.insert(("Detroit", "Boston"), vec![Value::from(100)])?;
//!
//! assert_eq!(schema.find_data_type_failures(&dat)?.len(), 1);
//! assert_eq!(schema.find_foreign_key_failures(&dat)?.len(), 1);
//! assert!(!schema.validate(&dat).is_success());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod level;
mod report;

pub use level::Level;
pub use report::{IssueKind, ValidationIssue, ValidationMetrics, ValidationReport};

use crate::constraints::{DataType, ForeignKey};
use crate::core::{PrimaryKey, Schema, Table, TicDat, Value};
use crate::error::{Result, TicDatError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A `(table, field)` location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableField {
    pub table: String,
    pub field: String,
}

impl TableField {
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for TableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.field)
    }
}

/// The rows of one field that violate its data type.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTypeFailure {
    /// The violated domain
    pub data_type: DataType,
    /// Each distinct offending value
    pub bad_values: BTreeSet<Value>,
    /// The primary key of each offending row
    pub primary_keys: BTreeSet<PrimaryKey>,
}

/// The rows of a native table whose references do not resolve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignKeyFailure {
    /// Each distinct unresolved tuple of native-field values
    pub native_values: BTreeSet<PrimaryKey>,
    /// The primary key of each offending native row
    pub native_primary_keys: BTreeSet<PrimaryKey>,
}

pub type DataTypeFailures = BTreeMap<TableField, DataTypeFailure>;
pub type ForeignKeyFailures = BTreeMap<ForeignKey, ForeignKeyFailure>;
/// Table name → primary keys seen more than once in an external source,
/// with the number of occurrences.
pub type Duplicates = BTreeMap<String, BTreeMap<PrimaryKey, usize>>;

impl Schema {
    /// True when `dat` holds exactly the tables and fields this schema
    /// declares.
    pub fn good_tic_dat_object(&self, dat: &TicDat) -> bool {
        let good = std::ptr::eq(dat.schema().as_ref(), self) || self.same_structure(dat.schema());
        if !good {
            debug!("data object structure differs from schema");
        }
        good
    }

    /// Scans every field with a registered data type.
    #[instrument(skip(self, dat), fields(rows = dat.row_count()))]
    pub fn find_data_type_failures(&self, dat: &TicDat) -> Result<DataTypeFailures> {
        let mut failures = DataTypeFailures::new();
        let null = Value::Null;
        for table_schema in self.tables() {
            let table = dat.table(table_schema.name())?;
            for (field, data_type) in table_schema.data_types() {
                let mut bad_values = BTreeSet::new();
                let mut primary_keys = BTreeSet::new();
                for (key, row) in table {
                    let value = table.field_value(key, row, field).unwrap_or(&null);
                    if !data_type.valid(value) {
                        bad_values.insert(value.clone());
                        primary_keys.insert(key.clone());
                    }
                }
                if !primary_keys.is_empty() {
                    debug!(
                        table = table_schema.name(),
                        field,
                        rows = primary_keys.len(),
                        "data type failures"
                    );
                    failures.insert(
                        TableField::new(table_schema.name(), field),
                        DataTypeFailure {
                            data_type: data_type.clone(),
                            bad_values,
                            primary_keys,
                        },
                    );
                }
            }
        }
        Ok(failures)
    }

    /// Scans every registered foreign key.
    ///
    /// A native row fails when the tuple of its native-field values is not
    /// the projection of any foreign primary key onto the mapped fields.
    /// Rows holding `Null` in a nullable native field are not references
    /// and are skipped.
    #[instrument(skip(self, dat), fields(foreign_keys = self.foreign_keys().len()))]
    pub fn find_foreign_key_failures(&self, dat: &TicDat) -> Result<ForeignKeyFailures> {
        let mut failures = ForeignKeyFailures::new();
        for fk in self.foreign_keys() {
            let native = dat.table(fk.native_table())?;
            let foreign = dat.table(fk.foreign_table())?;
            let targets = foreign_projections(fk, foreign)?;

            let mut failure = ForeignKeyFailure::default();
            for (key, row) in native {
                let Some(tuple) = native_tuple(fk, native, key, row) else {
                    continue;
                };
                if !targets.contains(tuple.values()) {
                    failure.native_values.insert(tuple);
                    failure.native_primary_keys.insert(key.clone());
                }
            }
            if !failure.native_primary_keys.is_empty() {
                debug!(foreign_key = %fk, rows = failure.native_primary_keys.len(), "foreign key failures");
                failures.insert(fk.clone(), failure);
            }
        }
        Ok(failures)
    }

    /// The primary keys of the native rows of `fk` that reference the
    /// foreign row `parent_key`.
    pub fn find_foreign_key_children(
        &self,
        dat: &TicDat,
        fk: &ForeignKey,
        parent_key: &PrimaryKey,
    ) -> Result<Vec<PrimaryKey>> {
        if !self.foreign_keys().contains(fk) {
            return Err(TicDatError::schema(format!(
                "foreign key {fk} is not declared by this schema"
            )));
        }
        let native = dat.table(fk.native_table())?;
        let foreign = dat.table(fk.foreign_table())?;
        let pk_len = foreign.schema().primary_key_fields().len();
        if parent_key.len() != pk_len {
            return Err(TicDatError::RowArity {
                table: fk.foreign_table().to_string(),
                expected: pk_len,
                found: parent_key.len(),
            });
        }
        let target = project(fk, foreign, parent_key)?;
        Ok(native
            .iter()
            .filter(|(key, row)| {
                native_tuple(fk, native, key, row).is_some_and(|t| t.values() == target.as_slice())
            })
            .map(|(key, _)| key.clone())
            .collect())
    }

    /// Runs every check and gathers the outcome into one report.
    #[instrument(skip(self, dat))]
    pub fn validate(&self, dat: &TicDat) -> ValidationReport {
        let start = Instant::now();
        let mut report = ValidationReport::new();

        if !self.good_tic_dat_object(dat) {
            report.add_structure_issue(
                "*",
                "the data object does not declare the same tables and fields as the schema",
            );
        } else {
            report.metrics.tables_checked = dat.tables().count();
            report.metrics.rows_checked = dat.row_count();
            match self.find_data_type_failures(dat) {
                Ok(failures) => report.add_data_type_failures(&failures),
                Err(e) => report.add_structure_issue("*", e.to_string()),
            }
            match self.find_foreign_key_failures(dat) {
                Ok(failures) => report.add_foreign_key_failures(&failures),
                Err(e) => report.add_structure_issue("*", e.to_string()),
            }
        }

        report.metrics.execution_time_ms = start.elapsed().as_millis() as u64;
        if report.is_success() {
            info!(
                tables = report.metrics.tables_checked,
                rows = report.metrics.rows_checked,
                "validation passed"
            );
        } else {
            warn!(issues = report.issues.len(), "validation found problems");
        }
        report
    }
}

/// Every foreign primary key projected onto the mapped foreign fields.
fn foreign_projections(fk: &ForeignKey, foreign: &Table) -> Result<HashSet<Vec<Value>>> {
    foreign.keys().map(|key| project(fk, foreign, key)).collect()
}

fn project(fk: &ForeignKey, foreign: &Table, key: &PrimaryKey) -> Result<Vec<Value>> {
    fk.foreign_fields()
        .map(|field| {
            foreign
                .schema()
                .primary_key_index(field)
                .and_then(|i| key.values().get(i))
                .cloned()
                .ok_or_else(|| TicDatError::unknown_field(foreign.name(), field))
        })
        .collect()
}

/// The native-field values of a row, or `None` when a nullable field is
/// null.
fn native_tuple(fk: &ForeignKey, native: &Table, key: &PrimaryKey, row: &crate::core::Row) -> Option<PrimaryKey> {
    let mut values = Vec::with_capacity(fk.mappings().len());
    for field in fk.native_fields() {
        let value = native.field_value(key, row, field).cloned().unwrap_or_default();
        if value.is_null()
            && native
                .schema()
                .data_type(field)
                .is_some_and(|dt| dt.nullable)
        {
            return None;
        }
        values.push(value);
    }
    Some(PrimaryKey::new(values))
}
