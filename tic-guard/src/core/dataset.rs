//! Data objects: populated instances of a schema.
//!
//! [`TicDat`] is the mutable form that loaders fill and solvers build their
//! output in. [`TicDat::freeze`] turns it into a [`FrozenTicDat`], an
//! immutable snapshot that is cheap to clone and safe to share between
//! threads. A frozen object dereferences to `&TicDat`, so every read-only
//! API (validation, writers, frames) accepts both forms.

use crate::core::{PrimaryKey, Schema, TableSchema, Value};
use crate::error::{Result, TicDatError};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

/// The data-field values of one row, aligned with the table's declared data
/// fields.
#[derive(Debug, Clone)]
pub struct Row {
    table: Arc<TableSchema>,
    values: Vec<Value>,
}

impl Row {
    fn new(table: Arc<TableSchema>, values: Vec<Value>) -> Self {
        Self { table, values }
    }

    /// The value of a data field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.table
            .data_field_index(field)
            .map(|i| &self.values[i])
    }

    /// The numeric value of a data field, if it holds a number.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_number)
    }

    /// The text value of a data field, if it holds text.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    /// Replaces the value of a data field.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let index = self
            .table
            .data_field_index(field)
            .ok_or_else(|| TicDatError::unknown_field(self.table.name(), field))?;
        self.values[index] = value.into();
        Ok(self)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// `(field, value)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.table
            .data_fields()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

/// The rows of one table, keyed by primary key and iterated in key order.
#[derive(Debug, Clone)]
pub struct Table {
    schema: Arc<TableSchema>,
    rows: BTreeMap<PrimaryKey, Row>,
}

impl Table {
    pub(crate) fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &PrimaryKey) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn get_mut(&mut self, key: &PrimaryKey) -> Option<&mut Row> {
        self.rows.get_mut(key)
    }

    pub fn contains_key(&self, key: &PrimaryKey) -> bool {
        self.rows.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PrimaryKey> {
        self.rows.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PrimaryKey, &Row)> {
        self.rows.iter()
    }

    /// Inserts a row given its key and every data value, returning the row
    /// it replaced.
    pub fn insert(&mut self, key: impl Into<PrimaryKey>, values: Vec<Value>) -> Result<Option<Row>> {
        let key = key.into();
        self.check_key(&key)?;
        if values.len() != self.schema.data_fields().len() {
            return Err(TicDatError::RowArity {
                table: self.name().to_string(),
                expected: self.schema.data_fields().len(),
                found: values.len(),
            });
        }
        let row = Row::new(Arc::clone(&self.schema), values);
        Ok(self.rows.insert(key, row))
    }

    /// Inserts a row from named data values; fields left out take their
    /// default value.
    pub fn insert_fields<'a, I>(&mut self, key: impl Into<PrimaryKey>, fields: I) -> Result<Option<Row>>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut row = Row::new(Arc::clone(&self.schema), self.schema.default_data_values());
        for (field, value) in fields {
            row.set(field, value)?;
        }
        let key = key.into();
        self.check_key(&key)?;
        Ok(self.rows.insert(key, row))
    }

    /// Inserts a row laid out as primary-key values followed by data values,
    /// the layout of every external format.
    pub fn insert_flat(&mut self, mut values: Vec<Value>) -> Result<Option<Row>> {
        let pk_len = self.schema.primary_key_fields().len();
        if values.len() != self.schema.field_count() {
            return Err(TicDatError::RowArity {
                table: self.name().to_string(),
                expected: self.schema.field_count(),
                found: values.len(),
            });
        }
        let data = values.split_off(pk_len);
        self.insert(PrimaryKey::new(values), data)
    }

    /// The row for `key`, created with default values when absent.
    pub fn entry(&mut self, key: impl Into<PrimaryKey>) -> Result<&mut Row> {
        let key = key.into();
        self.check_key(&key)?;
        let schema = &self.schema;
        Ok(self
            .rows
            .entry(key)
            .or_insert_with(|| Row::new(Arc::clone(schema), schema.default_data_values())))
    }

    pub fn remove(&mut self, key: &PrimaryKey) -> Option<Row> {
        self.rows.remove(key)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Every row flattened to primary-key values followed by data values.
    pub fn flat_rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        self.rows.iter().map(|(key, row)| {
            key.values()
                .iter()
                .chain(row.values().iter())
                .cloned()
                .collect()
        })
    }

    /// The value of any field (primary key or data) of a row.
    pub fn field_value<'a>(&self, key: &'a PrimaryKey, row: &'a Row, field: &str) -> Option<&'a Value> {
        match self.schema.primary_key_index(field) {
            Some(i) => key.values().get(i),
            None => row.get(field),
        }
    }

    fn check_key(&self, key: &PrimaryKey) -> Result<()> {
        let expected = self.schema.primary_key_fields().len();
        if key.len() != expected {
            return Err(TicDatError::RowArity {
                table: self.name().to_string(),
                expected,
                found: key.len(),
            });
        }
        Ok(())
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.rows == other.rows
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a PrimaryKey, &'a Row);
    type IntoIter = std::collections::btree_map::Iter<'a, PrimaryKey, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// A mutable data object holding one [`Table`] per schema table.
#[derive(Debug, Clone)]
pub struct TicDat {
    schema: Arc<Schema>,
    tables: BTreeMap<String, Table>,
}

impl TicDat {
    /// Creates an empty data object for `schema`.
    pub fn new(schema: Arc<Schema>) -> Self {
        let tables = schema
            .tables()
            .map(|t| (t.name().to_string(), Table::new(Arc::clone(t))))
            .collect();
        Self { schema, tables }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| TicDatError::unknown_table(name))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| TicDatError::unknown_table(name))
    }

    /// Tables in sorted name order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Table::len).sum()
    }

    /// Produces the immutable snapshot of this object.
    pub fn freeze(self) -> FrozenTicDat {
        FrozenTicDat(Arc::new(self))
    }
}

impl PartialEq for TicDat {
    fn eq(&self, other: &Self) -> bool {
        self.tables == other.tables
    }
}

/// An immutable, shareable data object.
///
/// Cloning is an `Arc` clone. Use [`FrozenTicDat::thaw`] to get a mutable
/// copy back.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenTicDat(Arc<TicDat>);

impl FrozenTicDat {
    /// A mutable deep copy of the snapshot.
    pub fn thaw(&self) -> TicDat {
        TicDat::clone(&self.0)
    }
}

impl Deref for FrozenTicDat {
    type Target = TicDat;

    fn deref(&self) -> &TicDat {
        &self.0
    }
}

impl From<TicDat> for FrozenTicDat {
    fn from(dat: TicDat) -> Self {
        dat.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diet_schema() -> Arc<Schema> {
        Schema::builder()
            .table("foods", ["name"], ["cost"])
            .unwrap()
            .table("nutritionQuantities", ["food", "category"], ["qty"])
            .unwrap()
            .set_default_value("foods", "cost", 1.5)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut dat = diet_schema().tic_dat();
        let foods = dat.table_mut("foods").unwrap();
        foods.insert("hamburger", vec![Value::from(2.49)]).unwrap();
        foods.insert("milk", vec![Value::from(0.89)]).unwrap();

        let row = foods.get(&PrimaryKey::from("milk")).unwrap();
        assert_eq!(row.number("cost"), Some(0.89));
        assert_eq!(foods.keys().cloned().collect::<Vec<_>>(), [
            PrimaryKey::from("hamburger"),
            PrimaryKey::from("milk")
        ]);
    }

    #[test]
    fn test_arity_checked() {
        let mut dat = diet_schema().tic_dat();
        let nq = dat.table_mut("nutritionQuantities").unwrap();
        assert!(matches!(
            nq.insert("hamburger", vec![Value::from(1)]),
            Err(TicDatError::RowArity { expected: 2, found: 1, .. })
        ));
        assert!(nq.insert(("hamburger", "fat"), vec![]).is_err());
        assert!(nq
            .insert_flat(vec![Value::from("hamburger"), Value::from("fat"), Value::from(26)])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_entry_uses_defaults() {
        let mut dat = diet_schema().tic_dat();
        let foods = dat.table_mut("foods").unwrap();
        assert_eq!(foods.entry("salad").unwrap().number("cost"), Some(1.5));
        foods.entry("salad").unwrap().set("cost", 2.49).unwrap();
        assert_eq!(foods.get(&"salad".into()).unwrap().number("cost"), Some(2.49));

        let nq = dat.table_mut("nutritionQuantities").unwrap();
        assert_eq!(nq.entry(("salad", "fat")).unwrap().number("qty"), Some(0.0));
    }

    #[test]
    fn test_insert_fields_rejects_unknown() {
        let mut dat = diet_schema().tic_dat();
        let foods = dat.table_mut("foods").unwrap();
        let err = foods
            .insert_fields("fries", [("price", Value::from(1.89))])
            .unwrap_err();
        assert!(matches!(err, TicDatError::UnknownField { .. }));
    }

    #[test]
    fn test_freeze_and_thaw() {
        let mut dat = diet_schema().tic_dat();
        dat.table_mut("foods")
            .unwrap()
            .insert("fries", vec![Value::from(1.89)])
            .unwrap();
        let frozen = dat.freeze();
        let shared = frozen.clone();
        assert_eq!(shared.table("foods").unwrap().len(), 1);

        let mut thawed = frozen.thaw();
        thawed.table_mut("foods").unwrap().clear();
        assert_eq!(frozen.table("foods").unwrap().len(), 1);
        assert_ne!(thawed, *frozen);
    }

    #[test]
    fn test_frozen_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FrozenTicDat>();
    }

    #[test]
    fn test_flat_rows_order() {
        let mut dat = diet_schema().tic_dat();
        let nq = dat.table_mut("nutritionQuantities").unwrap();
        nq.insert(("milk", "fat"), vec![Value::from(2.5)]).unwrap();
        let flat: Vec<Vec<Value>> = nq.flat_rows().collect();
        assert_eq!(
            flat,
            vec![vec![Value::from("milk"), Value::from("fat"), Value::from(2.5)]]
        );
    }
}
