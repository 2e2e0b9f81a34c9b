//! Foreign key declarations.
//!
//! A foreign key ties one or more fields of a *native* table to primary-key
//! fields of a *foreign* table. A native row satisfies the key when the
//! tuple of its mapped values appears among the foreign table's primary
//! keys, projected onto the mapped foreign fields.
//!
//! # Examples
//!
//! ```rust
//! use tic_guard::constraints::{FieldMapping, ForeignKey};
//!
//! // Every drafted player must exist in the players table.
//! let fk = ForeignKey::new("drafted", "players", vec![FieldMapping::new("Player Name", "Player Name")]);
//! assert_eq!(fk.to_string(), "drafted.[Player Name] -> players.[Player Name]");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `native_field -> foreign_field` pair of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldMapping {
    pub native_field: String,
    pub foreign_field: String,
}

impl FieldMapping {
    pub fn new(native_field: impl Into<String>, foreign_field: impl Into<String>) -> Self {
        Self {
            native_field: native_field.into(),
            foreign_field: foreign_field.into(),
        }
    }
}

/// Whether each native row references exactly one foreign row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    /// The mappings cover the whole foreign primary key.
    ManyToOne,
    /// The mappings cover only part of the foreign primary key.
    ManyToMany,
}

/// A referential-integrity declaration between two tables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    native_table: String,
    foreign_table: String,
    mappings: Vec<FieldMapping>,
}

impl ForeignKey {
    pub fn new(
        native_table: impl Into<String>,
        foreign_table: impl Into<String>,
        mappings: Vec<FieldMapping>,
    ) -> Self {
        Self {
            native_table: native_table.into(),
            foreign_table: foreign_table.into(),
            mappings,
        }
    }

    /// Convenience constructor for the common single-field case.
    pub fn single(
        native_table: impl Into<String>,
        native_field: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self::new(
            native_table,
            foreign_table,
            vec![FieldMapping::new(native_field, foreign_field)],
        )
    }

    pub fn native_table(&self) -> &str {
        &self.native_table
    }

    pub fn foreign_table(&self) -> &str {
        &self.foreign_table
    }

    pub fn mappings(&self) -> &[FieldMapping] {
        &self.mappings
    }

    pub fn native_fields(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.native_field.as_str())
    }

    pub fn foreign_fields(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.foreign_field.as_str())
    }

    /// Cardinality given the foreign table's primary-key width.
    pub fn cardinality(&self, foreign_pk_len: usize) -> Cardinality {
        if self.mappings.len() == foreign_pk_len {
            Cardinality::ManyToOne
        } else {
            Cardinality::ManyToMany
        }
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let native: Vec<&str> = self.native_fields().collect();
        let foreign: Vec<&str> = self.foreign_fields().collect();
        write!(
            f,
            "{}.[{}] -> {}.[{}]",
            self.native_table,
            native.join(", "),
            self.foreign_table,
            foreign.join(", ")
        )
    }
}
