//! Schema definition.
//!
//! A [`Schema`] names every table, its primary-key fields and its data
//! fields, together with the optional constraints that the validation engine
//! checks. Schemas are assembled with a [`SchemaBuilder`] and are immutable
//! (shared behind an `Arc`) once built.
//!
//! # Examples
//!
//! ```rust
//! use tic_guard::constraints::{DataType, FieldMapping};
//! use tic_guard::core::Schema;
//!
//! # fn example() -> tic_guard::error::Result<()> {
//! let schema = Schema::builder()
//!     .table("foods", ["name"], ["cost"])?
//!     .table("categories", ["name"], ["minNutrition", "maxNutrition"])?
//!     .table("nutritionQuantities", ["food", "category"], ["qty"])?
//!     .set_data_type("foods", "cost", DataType::number())?
//!     .add_foreign_key(
//!         "nutritionQuantities",
//!         "foods",
//!         vec![FieldMapping::new("food", "name")],
//!     )?
//!     .build()?;
//!
//! assert_eq!(schema.all_tables().collect::<Vec<_>>(), ["categories", "foods", "nutritionQuantities"]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::constraints::{DataType, FieldMapping, ForeignKey};
use crate::core::{TicDat, Value};
use crate::error::{Result, TicDatError};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// The declaration of a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    name: String,
    primary_key_fields: Vec<String>,
    data_fields: Vec<String>,
    data_types: BTreeMap<String, DataType>,
    default_values: BTreeMap<String, Value>,
}

impl TableSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key_fields(&self) -> &[String] {
        &self.primary_key_fields
    }

    pub fn data_fields(&self) -> &[String] {
        &self.data_fields
    }

    /// Primary-key fields followed by data fields, the order used by every
    /// external format.
    pub fn all_fields(&self) -> impl Iterator<Item = &str> {
        self.primary_key_fields
            .iter()
            .chain(self.data_fields.iter())
            .map(String::as_str)
    }

    pub fn field_count(&self) -> usize {
        self.primary_key_fields.len() + self.data_fields.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.is_primary_key_field(field) || self.data_field_index(field).is_some()
    }

    pub fn is_primary_key_field(&self, field: &str) -> bool {
        self.primary_key_index(field).is_some()
    }

    pub fn primary_key_index(&self, field: &str) -> Option<usize> {
        self.primary_key_fields.iter().position(|f| f == field)
    }

    pub fn data_field_index(&self, field: &str) -> Option<usize> {
        self.data_fields.iter().position(|f| f == field)
    }

    /// The registered domain of `field`, if any.
    pub fn data_type(&self, field: &str) -> Option<&DataType> {
        self.data_types.get(field)
    }

    pub fn data_types(&self) -> impl Iterator<Item = (&str, &DataType)> {
        self.data_types.iter().map(|(f, dt)| (f.as_str(), dt))
    }

    /// The value a data field takes when a row is created without it.
    pub fn default_value(&self, field: &str) -> Value {
        self.default_values
            .get(field)
            .cloned()
            .unwrap_or(Value::Number(0.0))
    }

    pub(crate) fn default_data_values(&self) -> Vec<Value> {
        self.data_fields
            .iter()
            .map(|f| self.default_value(f))
            .collect()
    }

    fn same_fields(&self, other: &TableSchema) -> bool {
        self.name == other.name
            && self.primary_key_fields == other.primary_key_fields
            && self.data_fields == other.data_fields
    }
}

/// An immutable set of table declarations plus their constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    tables: BTreeMap<String, Arc<TableSchema>>,
    foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Looks up a table declaration.
    pub fn table(&self, name: &str) -> Result<&Arc<TableSchema>> {
        self.tables
            .get(name)
            .ok_or_else(|| TicDatError::unknown_table(name))
    }

    /// All table names in sorted order.
    pub fn all_tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableSchema>> {
        self.tables.values()
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Foreign keys whose native table is `table`.
    pub fn foreign_keys_from<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ForeignKey> {
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.native_table() == table)
    }

    /// Creates an empty data object for this schema.
    pub fn tic_dat(self: &Arc<Self>) -> TicDat {
        TicDat::new(Arc::clone(self))
    }

    /// True when both schemas declare the same tables with the same fields.
    /// Constraints are not compared.
    pub fn same_structure(&self, other: &Schema) -> bool {
        self.tables.len() == other.tables.len()
            && self.tables.iter().all(|(name, table)| {
                other
                    .tables
                    .get(name)
                    .is_some_and(|o| table.same_fields(o))
            })
    }
}

/// Builder for [`Schema`].
///
/// Tables must be declared before constraints that reference them; every
/// registration is checked immediately and fails with a
/// [`TicDatError`] naming the offending table or field.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: BTreeMap<String, TableSchema>,
    foreign_keys: Vec<ForeignKey>,
}

impl SchemaBuilder {
    /// Declares a table.
    pub fn table<P, D>(mut self, name: impl Into<String>, primary_key_fields: P, data_fields: D) -> Result<Self>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TicDatError::schema("table names cannot be empty"));
        }
        if self.tables.contains_key(&name) {
            return Err(TicDatError::schema(format!(
                "table '{name}' is declared more than once"
            )));
        }
        let primary_key_fields: Vec<String> = primary_key_fields.into_iter().map(Into::into).collect();
        let data_fields: Vec<String> = data_fields.into_iter().map(Into::into).collect();
        if primary_key_fields.is_empty() {
            return Err(TicDatError::schema(format!(
                "table '{name}' needs at least one primary key field"
            )));
        }
        let mut seen = HashSet::new();
        for field in primary_key_fields.iter().chain(data_fields.iter()) {
            if field.trim().is_empty() {
                return Err(TicDatError::schema(format!(
                    "table '{name}' has an empty field name"
                )));
            }
            if !seen.insert(field.as_str()) {
                return Err(TicDatError::schema(format!(
                    "field '{field}' appears more than once in table '{name}'"
                )));
            }
        }
        debug!(table = %name, pk = ?primary_key_fields, data = ?data_fields, "declared table");
        self.tables.insert(
            name.clone(),
            TableSchema {
                name,
                primary_key_fields,
                data_fields,
                data_types: BTreeMap::new(),
                default_values: BTreeMap::new(),
            },
        );
        Ok(self)
    }

    /// Registers the value domain of a primary-key or data field, replacing
    /// any earlier registration.
    pub fn set_data_type(mut self, table: &str, field: &str, data_type: DataType) -> Result<Self> {
        data_type.check()?;
        let schema = self.table_mut(table)?;
        if !schema.has_field(field) {
            return Err(TicDatError::unknown_field(table, field));
        }
        schema.data_types.insert(field.to_string(), data_type);
        Ok(self)
    }

    /// Sets the value a data field takes when rows are created without it.
    pub fn set_default_value(mut self, table: &str, field: &str, value: impl Into<Value>) -> Result<Self> {
        let schema = self.table_mut(table)?;
        if schema.is_primary_key_field(field) {
            return Err(TicDatError::schema(format!(
                "'{field}' is a primary key field of '{table}' and cannot have a default"
            )));
        }
        if schema.data_field_index(field).is_none() {
            return Err(TicDatError::unknown_field(table, field));
        }
        schema.default_values.insert(field.to_string(), value.into());
        Ok(self)
    }

    /// Registers a foreign key from `native_table` to `foreign_table`.
    pub fn add_foreign_key(
        mut self,
        native_table: &str,
        foreign_table: &str,
        mappings: Vec<FieldMapping>,
    ) -> Result<Self> {
        let native = self
            .tables
            .get(native_table)
            .ok_or_else(|| TicDatError::unknown_table(native_table))?;
        let foreign = self
            .tables
            .get(foreign_table)
            .ok_or_else(|| TicDatError::unknown_table(foreign_table))?;
        if mappings.is_empty() {
            return Err(TicDatError::schema(format!(
                "foreign key {native_table} -> {foreign_table} needs at least one field mapping"
            )));
        }
        {
            let mut native_seen = HashSet::new();
            let mut foreign_seen = HashSet::new();
            for mapping in &mappings {
                if !native.has_field(&mapping.native_field) {
                    return Err(TicDatError::unknown_field(native_table, &mapping.native_field));
                }
                if !foreign.is_primary_key_field(&mapping.foreign_field) {
                    return Err(TicDatError::schema(format!(
                        "foreign key target '{}' is not a primary key field of '{foreign_table}'",
                        mapping.foreign_field
                    )));
                }
                if !native_seen.insert(&mapping.native_field) || !foreign_seen.insert(&mapping.foreign_field) {
                    return Err(TicDatError::schema(format!(
                        "foreign key {native_table} -> {foreign_table} maps a field twice"
                    )));
                }
            }
        }
        let fk = ForeignKey::new(native_table, foreign_table, mappings);
        if self.foreign_keys.contains(&fk) {
            return Err(TicDatError::schema(format!(
                "foreign key {fk} is declared more than once"
            )));
        }
        debug!(foreign_key = %fk, "declared foreign key");
        self.foreign_keys.push(fk);
        Ok(self)
    }

    /// Freezes the declarations into a shareable [`Schema`].
    pub fn build(self) -> Result<Arc<Schema>> {
        if self.tables.is_empty() {
            return Err(TicDatError::schema("a schema needs at least one table"));
        }
        Ok(Arc::new(Schema {
            tables: self
                .tables
                .into_iter()
                .map(|(name, table)| (name, Arc::new(table)))
                .collect(),
            foreign_keys: self.foreign_keys,
        }))
    }

    fn table_mut(&mut self, table: &str) -> Result<&mut TableSchema> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| TicDatError::unknown_table(table))
    }
}
