//! CSV directory format: one `<table>.csv` file per table.

use super::{
    check_overwrite, count_duplicates, field_positions, key_of, log_missing_table, project_record,
    TableReader, TableWriter,
};
use crate::core::{Schema, TableSchema, TicDat, Value};
use crate::error::{Result, TicDatError};
use crate::validation::Duplicates;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Options for reading and writing CSV directories.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Replace existing files when writing
    pub allow_overwrite: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            allow_overwrite: false,
        }
    }
}

impl CsvOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }
}

/// A directory of CSV files, one per table, each with a header row.
///
/// Cells are read with [`Value::parse_text`]: blank cells are null, numeric
/// text (including `inf` and `-inf`) is a number, everything else is text.
///
/// # Examples
///
/// ```rust,no_run
/// use tic_guard::sources::{CsvDirectory, CsvOptions, TableReader};
/// # fn example(schema: std::sync::Arc<tic_guard::core::Schema>) -> tic_guard::error::Result<()> {
/// let source = CsvDirectory::new("data/diet")
///     .with_options(CsvOptions::default().with_delimiter(b';'));
/// let dat = source.read(&schema)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
    options: CsvOptions,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            options: CsvOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    /// Flat records of one table in file order, or `None` when its file is
    /// absent.
    fn records(&self, table: &TableSchema) -> Result<Option<Vec<Vec<Value>>>> {
        let path = self.table_path(table.name());
        if !path.is_file() {
            log_missing_table("CSV", table.name());
            return Ok(None);
        }
        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .has_headers(true)
            .flexible(true)
            .from_path(&path)?;
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let positions = field_positions(table, &header)?;

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            records.push(project_record(&positions, |i| {
                Value::parse_text(record.get(i).unwrap_or(""))
            }));
        }
        debug!(table = table.name(), path = %path.display(), rows = records.len(), "read CSV table");
        Ok(Some(records))
    }

    fn check_dir(&self) -> Result<()> {
        if !self.dir.is_dir() {
            return Err(TicDatError::data_source(
                "CSV",
                format!("{} is not a directory", self.dir.display()),
            ));
        }
        Ok(())
    }
}

impl TableReader for CsvDirectory {
    #[instrument(skip(self, schema), fields(dir = %self.dir.display()))]
    fn read(&self, schema: &Arc<Schema>) -> Result<TicDat> {
        self.check_dir()?;
        let mut dat = schema.tic_dat();
        for table in schema.tables() {
            let Some(records) = self.records(table)? else {
                continue;
            };
            let target = dat.table_mut(table.name())?;
            for record in records {
                target.insert_flat(record)?;
            }
        }
        info!(rows = dat.row_count(), "loaded CSV directory");
        Ok(dat)
    }

    #[instrument(skip(self, schema), fields(dir = %self.dir.display()))]
    fn find_duplicates(&self, schema: &Schema) -> Result<Duplicates> {
        self.check_dir()?;
        let mut duplicates = Duplicates::new();
        for table in schema.tables() {
            let Some(records) = self.records(table)? else {
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

impl TableWriter for CsvDirectory {
    #[instrument(skip(self, dat), fields(dir = %self.dir.display()))]
    fn write(&self, dat: &TicDat) -> Result<()> {
        let paths: Vec<(String, PathBuf)> = dat
            .schema()
            .all_tables()
            .map(|t| (t.to_string(), self.table_path(t)))
            .collect();
        for (_, path) in &paths {
            check_overwrite(path, self.options.allow_overwrite)?;
        }
        std::fs::create_dir_all(&self.dir)?;

        for (name, path) in &paths {
            let table = dat.table(name)?;
            write_table(path, table.schema(), table.flat_rows(), &self.options)?;
        }
        info!(tables = paths.len(), rows = dat.row_count(), "wrote CSV directory");
        Ok(())
    }
}

fn write_table(
    path: &Path,
    table: &TableSchema,
    rows: impl Iterator<Item = Vec<Value>>,
    options: &CsvOptions,
) -> Result<()> {
    let mut writer = ::csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote(options.quote)
        .from_path(path)?;
    writer.write_record(table.all_fields())?;
    for row in rows {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush()?;
    Ok(())
}
