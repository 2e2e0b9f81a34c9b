//! Validation report types.

use super::{DataTypeFailures, Duplicates, ForeignKeyFailures, Level};
use serde::{Deserialize, Serialize};

/// What kind of problem an issue describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Structure,
    DataType,
    ForeignKey,
    Duplicate,
}

/// Counters collected while validating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub tables_checked: usize,
    pub rows_checked: usize,
    /// Number of `(table, field)` pairs with at least one bad value
    pub data_type_failures: usize,
    /// Number of foreign keys with at least one dangling reference
    pub foreign_key_failures: usize,
    /// Number of primary keys seen more than once in the source
    pub duplicate_keys: usize,
    pub execution_time_ms: u64,
}

/// A single problem found during validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: Level,
    pub kind: IssueKind,
    pub table: String,
    /// The constraint that was violated, e.g. `players.Position` or a
    /// foreign key description
    pub constraint: String,
    pub message: String,
    /// How many rows are affected
    pub row_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bad_values: Vec<String>,
}

/// Every issue found in one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Timestamp when the validation was run (ISO 8601 format)
    pub timestamp: String,
    pub metrics: ValidationMetrics,
    pub issues: Vec<ValidationIssue>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            metrics: ValidationMetrics::default(),
            issues: Vec::new(),
        }
    }

    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Records a structural mismatch between the data and the schema.
    pub fn add_structure_issue(&mut self, table: impl Into<String>, message: impl Into<String>) {
        self.add_issue(ValidationIssue {
            level: Level::Error,
            kind: IssueKind::Structure,
            table: table.into(),
            constraint: "structure".to_string(),
            message: message.into(),
            row_count: 0,
            primary_keys: Vec::new(),
            bad_values: Vec::new(),
        });
    }

    pub fn add_data_type_failures(&mut self, failures: &DataTypeFailures) {
        self.metrics.data_type_failures += failures.len();
        for (location, failure) in failures {
            self.add_issue(ValidationIssue {
                level: Level::Error,
                kind: IssueKind::DataType,
                table: location.table.clone(),
                constraint: location.to_string(),
                message: format!(
                    "{} row(s) hold values outside {}",
                    failure.primary_keys.len(),
                    failure.data_type
                ),
                row_count: failure.primary_keys.len(),
                primary_keys: failure.primary_keys.iter().map(ToString::to_string).collect(),
                bad_values: failure.bad_values.iter().map(describe_value).collect(),
            });
        }
    }

    pub fn add_foreign_key_failures(&mut self, failures: &ForeignKeyFailures) {
        self.metrics.foreign_key_failures += failures.len();
        for (fk, failure) in failures {
            self.add_issue(ValidationIssue {
                level: Level::Error,
                kind: IssueKind::ForeignKey,
                table: fk.native_table().to_string(),
                constraint: fk.to_string(),
                message: format!(
                    "{} row(s) reference keys missing from '{}'",
                    failure.native_primary_keys.len(),
                    fk.foreign_table()
                ),
                row_count: failure.native_primary_keys.len(),
                primary_keys: failure
                    .native_primary_keys
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                bad_values: failure.native_values.iter().map(ToString::to_string).collect(),
            });
        }
    }

    pub fn add_duplicates(&mut self, duplicates: &Duplicates) {
        for (table, keys) in duplicates {
            self.metrics.duplicate_keys += keys.len();
            self.add_issue(ValidationIssue {
                level: Level::Warning,
                kind: IssueKind::Duplicate,
                table: table.clone(),
                constraint: format!("{table} primary key"),
                message: format!(
                    "{} primary key(s) appear more than once; the last row wins",
                    keys.len()
                ),
                row_count: keys.values().sum(),
                primary_keys: keys
                    .iter()
                    .map(|(key, count)| format!("{key} x{count}"))
                    .collect(),
                bad_values: Vec::new(),
            });
        }
    }

    /// True when no error-level issue was found.
    pub fn is_success(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|issue| issue.level == Level::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.level == Level::Warning)
    }

    pub fn issues_by_level(&self, level: Level) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.level == level)
            .collect()
    }

    pub fn issues_by_kind(&self, kind: IssueKind) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|issue| issue.kind == kind).collect()
    }
}

fn describe_value(value: &crate::core::Value) -> String {
    match value {
        crate::core::Value::Null => "<null>".to_string(),
        crate::core::Value::Text(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}
