//! JSON file format.
//!
//! The document is an object keyed by table name; each table is an array of
//! row objects keyed by field name:
//!
//! ```json
//! {
//!   "foods": [{"name": "milk", "cost": 0.89}],
//!   "categories": [{"name": "protein", "minNutrition": 91, "maxNutrition": "inf"}]
//! }
//! ```
//!
//! Infinite numbers are written as the strings `"inf"` and `"-inf"`.

use super::{
    check_overwrite, count_duplicates, key_of, log_missing_table, TableReader, TableWriter,
    WriteOptions,
};
use crate::core::{Schema, TableSchema, TicDat, Value};
use crate::error::{Result, TicDatError};
use crate::validation::Duplicates;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A single JSON document holding every table.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
    options: WriteOptions,
    pretty: bool,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: WriteOptions::default(),
            pretty: true,
        }
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn document(&self, schema: &Schema) -> Result<Map<String, JsonValue>> {
        let text = std::fs::read_to_string(&self.path)?;
        let document = match serde_json::from_str::<JsonValue>(&text)? {
            JsonValue::Object(map) => map,
            other => {
                return Err(TicDatError::data_source(
                    "JSON",
                    format!("expected an object of tables, found {}", kind(&other)),
                ))
            }
        };
        for name in document.keys() {
            if schema.table(name).is_err() {
                warn!(table = %name, "ignoring table not declared by the schema");
            }
        }
        Ok(document)
    }

    /// Flat records of one table in document order, or `None` when the
    /// document has no such key.
    fn records(document: &Map<String, JsonValue>, table: &TableSchema) -> Result<Option<Vec<Vec<Value>>>> {
        let Some(rows) = document.get(table.name()) else {
            log_missing_table("JSON", table.name());
            return Ok(None);
        };
        let JsonValue::Array(rows) = rows else {
            return Err(TicDatError::data_source(
                "JSON",
                format!("table '{}' must be an array of rows, found {}", table.name(), kind(rows)),
            ));
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let JsonValue::Object(row) = row else {
                return Err(TicDatError::data_source(
                    "JSON",
                    format!("rows of table '{}' must be objects, found {}", table.name(), kind(row)),
                ));
            };
            let cells: HashMap<&str, &JsonValue> = row.iter().map(|(k, v)| (k.trim(), v)).collect();
            let missing: Vec<String> = table
                .all_fields()
                .filter(|field| !cells.contains_key(field))
                .map(str::to_string)
                .collect();
            if !missing.is_empty() {
                return Err(TicDatError::FieldMismatch {
                    table: table.name().to_string(),
                    missing,
                    found: row.keys().cloned().collect(),
                });
            }
            let record = table
                .all_fields()
                .map(|field| cell(table, field, cells[field]))
                .collect::<Result<Vec<_>>>()?;
            records.push(record);
        }
        let extra = undeclared_fields(table, rows);
        if !extra.is_empty() {
            warn!(table = table.name(), columns = ?extra, "ignoring columns not declared by the schema");
        }
        debug!(table = table.name(), rows = records.len(), "read JSON table");
        Ok(Some(records))
    }
}

/// Keys used by any row of `rows` that `table` does not declare.
fn undeclared_fields<'a>(table: &TableSchema, rows: &'a [JsonValue]) -> BTreeSet<&'a str> {
    rows.iter()
        .filter_map(JsonValue::as_object)
        .flat_map(|row| row.keys())
        .map(|key| key.trim())
        .filter(|key| !key.is_empty() && !table.has_field(key))
        .collect()
}

/// Booleans become 1 and 0; arrays and objects are rejected.
fn cell(table: &TableSchema, field: &str, json: &JsonValue) -> Result<Value> {
    match json {
        JsonValue::Bool(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(TicDatError::data_source(
            "JSON",
            format!(
                "field '{field}' of table '{}' holds {}, which has no cell representation",
                table.name(),
                kind(json)
            ),
        )),
        other => Ok(serde_json::from_value::<Value>(other.clone())?),
    }
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

impl TableReader for JsonFile {
    #[instrument(skip(self, schema), fields(path = %self.path.display()))]
    fn read(&self, schema: &Arc<Schema>) -> Result<TicDat> {
        let document = self.document(schema)?;
        let mut dat = schema.tic_dat();
        for table in schema.tables() {
            let Some(records) = Self::records(&document, table)? else {
                continue;
            };
            let target = dat.table_mut(table.name())?;
            for record in records {
                target.insert_flat(record)?;
            }
        }
        info!(rows = dat.row_count(), "loaded JSON file");
        Ok(dat)
    }

    #[instrument(skip(self, schema), fields(path = %self.path.display()))]
    fn find_duplicates(&self, schema: &Schema) -> Result<Duplicates> {
        let document = self.document(schema)?;
        let mut duplicates = Duplicates::new();
        for table in schema.tables() {
            let Some(records) = Self::records(&document, table)? else {
                continue;
            };
            let counts = count_duplicates(records.iter().map(|r| key_of(table, r)));
            if !counts.is_empty() {
                duplicates.insert(table.name().to_string(), counts);
            }
        }
        Ok(duplicates)
    }
}

impl TableWriter for JsonFile {
    #[instrument(skip(self, dat), fields(path = %self.path.display()))]
    fn write(&self, dat: &TicDat) -> Result<()> {
        check_overwrite(&self.path, self.options.allow_overwrite)?;

        let mut document = Map::new();
        for table in dat.tables() {
            let fields: Vec<&str> = table.schema().all_fields().collect();
            let rows: Vec<JsonValue> = table
                .flat_rows()
                .map(|record| -> Result<JsonValue> {
                    let row: Map<String, JsonValue> = fields
                        .iter()
                        .zip(record)
                        .map(|(field, value)| -> Result<(String, JsonValue)> {
                            Ok((field.to_string(), serde_json::to_value(value)?))
                        })
                        .collect::<Result<_>>()?;
                    Ok(JsonValue::Object(row))
                })
                .collect::<Result<_>>()?;
            document.insert(table.name().to_string(), JsonValue::Array(rows));
        }

        let document = JsonValue::Object(document);
        let text = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        std::fs::write(&self.path, text)?;
        info!(rows = dat.row_count(), "wrote JSON file");
        Ok(())
    }
}
