//! SQLite database format: one SQL table per schema table.

use super::{check_overwrite, field_positions, log_missing_table, TableReader, TableWriter, WriteOptions};
use crate::core::{PrimaryKey, Schema, TableSchema, TicDat, Value};
use crate::error::{Result, TicDatError};
use crate::security::SqlSecurity;
use crate::validation::Duplicates;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Number(n) if self.is_integer() && n.abs() < 9.0e15 => ToSqlOutput::from(*n as i64),
            Value::Number(n) => ToSqlOutput::from(*n),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

fn from_sql(table: &str, value: ValueRef<'_>) -> Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::Number(i as f64)),
        ValueRef::Real(f) => Ok(Value::Number(f)),
        ValueRef::Text(bytes) => Ok(Value::Text(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(_) => Err(TicDatError::data_source(
            "SQLite",
            format!("table '{table}' holds a BLOB, which has no cell representation"),
        )),
    }
}

/// A SQLite database file.
///
/// Columns are declared without a type so that text and numbers keep their
/// storage class. Writing declares each table's `PRIMARY KEY` and every
/// foreign key of the schema; identifiers are validated and quoted with
/// [`SqlSecurity::escape_identifier`].
#[derive(Debug, Clone)]
pub struct SqliteFile {
    path: PathBuf,
    options: WriteOptions,
}

impl SqliteFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: WriteOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    fn open_read_only(&self) -> Result<Connection> {
        if !self.path.is_file() {
            return Err(TicDatError::data_source(
                "SQLite",
                format!("{} is not a database file", self.path.display()),
            ));
        }
        Ok(Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?)
    }

    /// The quoted `SELECT` list for `table`, or `None` when the database has
    /// no such table.
    fn select_list(conn: &Connection, table: &TableSchema) -> Result<Option<String>> {
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table.name()],
            |row| row.get(0),
        )?;
        if !exists {
            log_missing_table("SQLite", table.name());
            return Ok(None);
        }
        let quoted = SqlSecurity::escape_identifier(table.name())?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({quoted})"))?;
        let header = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        field_positions(table, &header)?;

        let columns = quoted_fields(table.all_fields())?;
        Ok(Some(columns.join(", ")))
    }
}

fn quoted_fields<'a>(fields: impl Iterator<Item = &'a str>) -> Result<Vec<String>> {
    fields.map(SqlSecurity::escape_identifier).collect()
}

impl TableReader for SqliteFile {
    #[instrument(skip(self, schema), fields(path = %self.path.display()))]
    fn read(&self, schema: &Arc<Schema>) -> Result<TicDat> {
        let conn = self.open_read_only()?;
        let mut dat = schema.tic_dat();
        for table in schema.tables() {
            let Some(columns) = Self::select_list(&conn, table)? else {
                continue;
            };
            let sql = format!(
                "SELECT {columns} FROM {}",
                SqlSecurity::escape_identifier(table.name())?
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            let target = dat.table_mut(table.name())?;
            while let Some(row) = rows.next()? {
                let record = (0..table.field_count())
                    .map(|i| from_sql(table.name(), row.get_ref(i)?))
                    .collect::<Result<Vec<_>>>()?;
                target.insert_flat(record)?;
            }
            debug!(table = table.name(), rows = target.len(), "read SQLite table");
        }
        info!(rows = dat.row_count(), "loaded SQLite database");
        Ok(dat)
    }

    /// Only databases written without primary key constraints can hold
    /// duplicates; they are found with a `GROUP BY` over the key fields.
    #[instrument(skip(self, schema), fields(path = %self.path.display()))]
    fn find_duplicates(&self, schema: &Schema) -> Result<Duplicates> {
        let conn = self.open_read_only()?;
        let mut duplicates = Duplicates::new();
        for table in schema.tables() {
            if Self::select_list(&conn, table)?.is_none() {
                continue;
            }
            let key_columns =
                quoted_fields(table.primary_key_fields().iter().map(String::as_str))?.join(", ");
            let sql = format!(
                "SELECT {key_columns}, COUNT(*) FROM {} GROUP BY {key_columns} HAVING COUNT(*) > 1",
                SqlSecurity::escape_identifier(table.name())?
            );
            let pk_len = table.primary_key_fields().len();
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            let mut counts = BTreeMap::new();
            while let Some(row) = rows.next()? {
                let key = (0..pk_len)
                    .map(|i| from_sql(table.name(), row.get_ref(i)?))
                    .collect::<Result<Vec<_>>>()?;
                let count: i64 = row.get(pk_len)?;
                counts.insert(PrimaryKey::new(key), count as usize);
            }
            if !counts.is_empty() {
                duplicates.insert(table.name().to_string(), counts);
            }
        }
        Ok(duplicates)
    }
}

impl TableWriter for SqliteFile {
    #[instrument(skip(self, dat), fields(path = %self.path.display()))]
    fn write(&self, dat: &TicDat) -> Result<()> {
        check_overwrite(&self.path, self.options.allow_overwrite)?;
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }

        let mut conn = Connection::open(&self.path)?;
        // Tables go in name order and dangling references are data, not
        // write errors.
        conn.pragma_update(None, "foreign_keys", false)?;
        let tx = conn.transaction()?;
        let schema = dat.schema();
        for table in schema.tables() {
            let sql = create_table_sql(schema, table)?;
            debug!(table = table.name(), %sql, "creating table");
            tx.execute(&sql, [])?;
        }
        for table in dat.tables() {
            let columns = quoted_fields(table.schema().all_fields())?;
            let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                SqlSecurity::escape_identifier(table.name())?,
                columns.join(", "),
                placeholders.join(", ")
            );
            let mut stmt = tx.prepare(&sql)?;
            for record in table.flat_rows() {
                stmt.execute(rusqlite::params_from_iter(record.iter()))?;
            }
        }
        tx.commit()?;
        info!(rows = dat.row_count(), "wrote SQLite database");
        Ok(())
    }
}

fn create_table_sql(schema: &Schema, table: &TableSchema) -> Result<String> {
    let mut clauses = quoted_fields(table.all_fields())?;
    clauses.push(format!(
        "PRIMARY KEY ({})",
        quoted_fields(table.primary_key_fields().iter().map(String::as_str))?.join(", ")
    ));
    for fk in schema.foreign_keys_from(table.name()) {
        clauses.push(format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            quoted_fields(fk.native_fields())?.join(", "),
            SqlSecurity::escape_identifier(fk.foreign_table())?,
            quoted_fields(fk.foreign_fields())?.join(", ")
        ));
    }
    Ok(format!(
        "CREATE TABLE {} ({})",
        SqlSecurity::escape_identifier(table.name())?,
        clauses.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::FieldMapping;
    use tempfile::TempDir;

    fn schema() -> Arc<Schema> {
        Schema::builder()
            .table("players", ["Player Name"], ["Position"])
            .unwrap()
            .table("drafted", ["Player Name"], ["Draft Position"])
            .unwrap()
            .add_foreign_key("drafted", "players", vec![FieldMapping::new("Player Name", "Player Name")])
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_table_sql() {
        let schema = schema();
        let sql = create_table_sql(&schema, schema.table("drafted").unwrap()).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE \"drafted\" (\"Player Name\", \"Draft Position\", PRIMARY KEY (\"Player Name\"), \
             FOREIGN KEY (\"Player Name\") REFERENCES \"players\" (\"Player Name\"))"
        );
    }

    #[test]
    fn test_text_and_numbers_keep_storage_class() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fantop.db");
        let schema = schema();
        let mut dat = schema.tic_dat();
        dat.table_mut("players")
            .unwrap()
            .insert("007", vec![Value::from("QB")])
            .unwrap();
        dat.table_mut("drafted")
            .unwrap()
            .insert("007", vec![Value::from(3)])
            .unwrap();
        SqliteFile::new(&path).write(&dat).unwrap();

        let back = SqliteFile::new(&path).read(&schema).unwrap();
        assert_eq!(back, dat);
        assert!(back.table("players").unwrap().contains_key(&PrimaryKey::from("007")));
    }

    #[test]
    fn test_write_ignores_reference_order_and_dangling_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("league.db");
        let schema = schema();
        let mut dat = schema.tic_dat();
        dat.table_mut("players")
            .unwrap()
            .insert("Tom Brady", vec![Value::from("QB")])
            .unwrap();
        let drafted = dat.table_mut("drafted").unwrap();
        drafted.insert("Tom Brady", vec![Value::from(1)]).unwrap();
        drafted.insert("Nobody", vec![Value::from(2)]).unwrap();
        SqliteFile::new(&path).write(&dat).unwrap();

        let back = SqliteFile::new(&path).read(&schema).unwrap();
        assert_eq!(back, dat);
        assert_eq!(schema.validate(&back).metrics.foreign_key_failures, 1);
    }

    #[test]
    fn test_duplicates_in_unkeyed_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE players (\"Player Name\", Position, Extra);
             INSERT INTO players VALUES ('Tom Brady', 'QB', 1);
             INSERT INTO players VALUES ('Tom Brady', 'WR', 2);
             INSERT INTO players VALUES ('Joe Flacco', 'QB', 3);",
        )
        .unwrap();
        drop(conn);

        let source = SqliteFile::new(&path);
        let duplicates = source.find_duplicates(&schema()).unwrap();
        assert_eq!(duplicates["players"][&PrimaryKey::from("Tom Brady")], 2);

        let dat = source.read(&schema()).unwrap();
        assert_eq!(dat.table("players").unwrap().len(), 2);
        assert!(dat.table("drafted").unwrap().is_empty());
    }
}
