//! Excel workbook format: one sheet per table, header in the first row.

use super::{
    check_overwrite, count_duplicates, field_positions, key_of, log_missing_table, project_record,
    TableReader, TableWriter, WriteOptions,
};
use crate::core::{Schema, TableSchema, TicDat, Value};
use crate::error::{Result, TicDatError};
use crate::security::InputValidator;
use crate::validation::Duplicates;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

fn xlsx_error(e: XlsxError) -> TicDatError {
    TicDatError::data_source("XLSX", e.to_string())
}

fn calamine_error(e: calamine::Error) -> TicDatError {
    TicDatError::data_source("XLSX", e.to_string())
}

/// Converts a spreadsheet cell. Text cells stay text except for blanks and
/// the infinity markers, which is how infinite numbers are written.
fn cell_value(table: &str, cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) => Value::Number(*f),
        Data::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => match s.trim() {
            "" => Value::Null,
            "inf" => Value::Number(f64::INFINITY),
            "-inf" => Value::Number(f64::NEG_INFINITY),
            _ => Value::Text(s.clone()),
        },
        Data::DateTime(dt) => Value::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => {
            warn!(table, error = ?e, "spreadsheet cell holds an error, reading it as null");
            Value::Null
        }
    }
}

/// An Excel workbook with one sheet per table.
///
/// Sheet names cannot exceed 31 characters, so schemas with longer table
/// names cannot be written to this format.
#[derive(Debug, Clone)]
pub struct XlsxFile {
    path: PathBuf,
    options: WriteOptions,
}

impl XlsxFile {
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

    fn open(&self) -> Result<Sheets<BufReader<File>>> {
        open_workbook_auto(&self.path).map_err(calamine_error)
    }

    /// Flat records of one sheet in row order, or `None` when the workbook
    /// has no such sheet.
    fn records(
        workbook: &mut Sheets<BufReader<File>>,
        sheet_names: &[String],
        table: &TableSchema,
    ) -> Result<Option<Vec<Vec<Value>>>> {
        if !sheet_names.iter().any(|s| s == table.name()) {
            log_missing_table("XLSX", table.name());
            return Ok(None);
        }
        let range = workbook
            .worksheet_range(table.name())
            .map_err(calamine_error)?;
        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            debug!(table = table.name(), "sheet is empty");
            return Ok(Some(Vec::new()));
        };
        let header: Vec<String> = header.iter().map(|c| c.to_string()).collect();
        let positions = field_positions(table, &header)?;

        let mut records = Vec::new();
        for row in rows {
            if row.iter().all(|c| matches!(c, Data::Empty)) {
                continue;
            }
            records.push(project_record(&positions, |i| {
                row.get(i)
                    .map(|c| cell_value(table.name(), c))
                    .unwrap_or_default()
            }));
        }
        debug!(table = table.name(), rows = records.len(), "read sheet");
        Ok(Some(records))
    }
}

impl TableReader for XlsxFile {
    #[instrument(skip(self, schema), fields(path = %self.path.display()))]
    fn read(&self, schema: &Arc<Schema>) -> Result<TicDat> {
        let mut workbook = self.open()?;
        let sheet_names = workbook.sheet_names();
        let mut dat = schema.tic_dat();
        for table in schema.tables() {
            let Some(records) = Self::records(&mut workbook, &sheet_names, table)? else {
                continue;
            };
            let target = dat.table_mut(table.name())?;
            for record in records {
                target.insert_flat(record)?;
            }
        }
        info!(rows = dat.row_count(), "loaded workbook");
        Ok(dat)
    }

    #[instrument(skip(self, schema), fields(path = %self.path.display()))]
    fn find_duplicates(&self, schema: &Schema) -> Result<Duplicates> {
        let mut workbook = self.open()?;
        let sheet_names = workbook.sheet_names();
        let mut duplicates = Duplicates::new();
        for table in schema.tables() {
            let Some(records) = Self::records(&mut workbook, &sheet_names, table)? else {
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

impl TableWriter for XlsxFile {
    #[instrument(skip(self, dat), fields(path = %self.path.display()))]
    fn write(&self, dat: &TicDat) -> Result<()> {
        // Reading handles the older workbook formats; writing produces xlsx only
        let extension = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        if let Some(ext @ ("xls" | "xlsm" | "xlsb")) = extension.as_deref() {
            return Err(TicDatError::Configuration(format!(
                "cannot write xlsx content to a .{ext} file: {}",
                self.path.display()
            )));
        }
        for name in dat.schema().all_tables() {
            InputValidator::validate_sheet_name(name)?;
        }
        check_overwrite(&self.path, self.options.allow_overwrite)?;

        let mut workbook = Workbook::new();
        for table in dat.tables() {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(table.name()).map_err(xlsx_error)?;
            for (col, field) in table.schema().all_fields().enumerate() {
                worksheet
                    .write_string(0, col as u16, field)
                    .map_err(xlsx_error)?;
            }
            for (row, record) in table.flat_rows().enumerate() {
                for (col, value) in record.iter().enumerate() {
                    write_cell(worksheet, row as u32 + 1, col as u16, value)?;
                }
            }
        }
        workbook.save(&self.path).map_err(xlsx_error)?;
        info!(rows = dat.row_count(), "wrote workbook");
        Ok(())
    }
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    let written = match value {
        Value::Null => return Ok(()),
        Value::Number(n) if n.is_finite() => worksheet.write_number(row, col, *n),
        Value::Number(n) => worksheet.write_string(row, col, if *n > 0.0 { "inf" } else { "-inf" }),
        Value::Text(s) => worksheet.write_string(row, col, s),
    };
    written.map_err(xlsx_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PrimaryKey;
    use tempfile::TempDir;

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value("t", &Data::Empty), Value::Null);
        assert_eq!(cell_value("t", &Data::Int(3)), Value::from(3));
        assert_eq!(cell_value("t", &Data::String("inf".into())), Value::from(f64::INFINITY));
        assert_eq!(cell_value("t", &Data::String("007".into())), Value::from("007"));
        assert_eq!(cell_value("t", &Data::String("  ".into())), Value::Null);
    }

    #[test]
    fn test_long_table_name_rejected() {
        let dir = TempDir::new().unwrap();
        let schema = Schema::builder()
            .table("a_table_name_that_is_far_too_long_for_excel", ["k"], ["v"])
            .unwrap()
            .build()
            .unwrap();
        let err = XlsxFile::new(dir.path().join("out.xlsx"))
            .write(&schema.tic_dat())
            .unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_legacy_extensions_refused_on_write() {
        let dir = TempDir::new().unwrap();
        let schema = Schema::builder().table("t", ["k"], ["v"]).unwrap().build().unwrap();
        for name in ["out.xls", "out.XLSM", "out.xlsb"] {
            let path = dir.path().join(name);
            let err = XlsxFile::new(&path).write(&schema.tic_dat()).unwrap_err();
            assert!(matches!(err, TicDatError::Configuration(_)), "{name}: {err}");
            assert!(!path.exists());
        }
        assert!(crate::sources::DataFormat::from_path("legacy.xls").is_ok());
    }

    #[test]
    fn test_round_trip_keeps_text_and_infinity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diet.xlsx");
        let schema = Schema::builder()
            .table("categories", ["name"], ["minNutrition", "maxNutrition"])
            .unwrap()
            .build()
            .unwrap();
        let mut dat = schema.tic_dat();
        dat.table_mut("categories")
            .unwrap()
            .insert("protein", vec![Value::from(91), Value::from(f64::INFINITY)])
            .unwrap();
        dat.table_mut("categories")
            .unwrap()
            .insert("007", vec![Value::Null, Value::from(2.5)])
            .unwrap();
        XlsxFile::new(&path).write(&dat).unwrap();

        let back = XlsxFile::new(&path).read(&schema).unwrap();
        assert_eq!(back, dat);
        assert!(back
            .table("categories")
            .unwrap()
            .contains_key(&PrimaryKey::from("007")));
    }
}
