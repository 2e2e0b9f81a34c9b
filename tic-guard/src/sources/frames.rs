//! Columnar frames: an in-memory, Arrow-backed view of a data object.
//!
//! Each table becomes a [`Frame`]: an index built from the primary keys plus
//! a [`RecordBatch`] holding one column per field. A table whose primary
//! key has one field gets a scalar index; longer keys give a multi-level
//! index. By default the primary-key fields appear only in the index
//! ([`FrameOptions::drop_pk_columns`]).
//!
//! Column types follow the values they hold:
//!
//! | Values in the column | Arrow type |
//! |----------------------|------------|
//! | numbers and nulls    | `Float64`  |
//! | text and nulls       | `Utf8`     |
//! | numbers and text     | `Struct { number: Float64, text: Utf8 }` |
//!
//! Label selection on a [`Series`] comes in two flavours: [`Series::loc`]
//! fails when a requested label is absent from its index level, while
//! [`Series::sloc`] returns an empty selection instead.
//!
//! ```rust
//! use tic_guard::core::{Schema, Value};
//! use tic_guard::sources::frames::{copy_to_frames, FrameOptions, Selector};
//!
//! # fn example() -> tic_guard::error::Result<()> {
//! let schema = Schema::builder()
//!     .table("arcs", ["source", "destination"], ["capacity"])?
//!     .build()?;
//! let mut dat = schema.tic_dat();
//! dat.table_mut("arcs")?.insert(("Denver", "Boston"), vec![Value::from(120)])?;
//! dat.table_mut("arcs")?.insert(("Detroit", "Boston"), vec![Value::from(100)])?;
//!
//! let frames = copy_to_frames(&dat, &FrameOptions::default())?;
//! let capacity = frames.frame("arcs")?.column("capacity")?;
//! assert_eq!(capacity.loc(&[Selector::Any, "Boston".into()])?.len(), 2);
//! assert!(capacity.loc(&["Boston".into()]).is_err());
//! assert!(capacity.sloc(&["Boston".into()]).is_empty());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::core::{PrimaryKey, Schema, TableSchema, TicDat, Value};
use crate::error::{Result, TicDatError};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray, StructArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Options for [`copy_to_frames`].
#[derive(Debug, Clone)]
pub struct FrameOptions {
    /// Only convert these tables (all tables when `None`)
    pub tables: Option<Vec<String>>,
    /// Keep primary-key fields out of the columns
    pub drop_pk_columns: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            tables: None,
            drop_pk_columns: true,
        }
    }
}

impl FrameOptions {
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = Some(tables.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_drop_pk_columns(mut self, drop: bool) -> Self {
        self.drop_pk_columns = drop;
        self
    }
}

/// The row labels of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameIndex {
    /// One label per row, from a single-field primary key
    Scalar { name: String, labels: Vec<Value> },
    /// One tuple of labels per row, one level per primary-key field
    Multi { names: Vec<String>, labels: Vec<PrimaryKey> },
}

impl FrameIndex {
    fn from_keys(names: &[String], keys: Vec<PrimaryKey>) -> Self {
        if let [name] = names {
            FrameIndex::Scalar {
                name: name.clone(),
                labels: keys
                    .into_iter()
                    .map(|k| k.into_values().into_iter().next().unwrap_or_default())
                    .collect(),
            }
        } else {
            FrameIndex::Multi {
                names: names.to_vec(),
                labels: keys,
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FrameIndex::Scalar { labels, .. } => labels.len(),
            FrameIndex::Multi { labels, .. } => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FrameIndex::Multi { .. })
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            FrameIndex::Scalar { name, .. } => vec![name.as_str()],
            FrameIndex::Multi { names, .. } => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn levels(&self) -> usize {
        match self {
            FrameIndex::Scalar { .. } => 1,
            FrameIndex::Multi { names, .. } => names.len(),
        }
    }

    /// The label of row `row` at `level`.
    pub fn label(&self, row: usize, level: usize) -> Option<&Value> {
        match self {
            FrameIndex::Scalar { labels, .. } if level == 0 => labels.get(row),
            FrameIndex::Scalar { .. } => None,
            FrameIndex::Multi { labels, .. } => labels.get(row).and_then(|k| k.values().get(level)),
        }
    }

    /// The full primary key of row `row`.
    pub fn key(&self, row: usize) -> Option<PrimaryKey> {
        match self {
            FrameIndex::Scalar { labels, .. } => labels.get(row).cloned().map(PrimaryKey::from),
            FrameIndex::Multi { labels, .. } => labels.get(row).cloned(),
        }
    }
}

/// One level of a label selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Every label of the level
    Any,
    /// Exactly this label
    Eq(Value),
}

impl Selector {
    pub fn label(value: impl Into<Value>) -> Self {
        Selector::Eq(value.into())
    }
}

macro_rules! selector_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Selector {
                fn from(v: $t) -> Self {
                    Selector::Eq(Value::from(v))
                }
            }
        )*
    };
}

selector_from!(&str, String, f64, i64, i32, u32, usize);

impl From<Value> for Selector {
    fn from(v: Value) -> Self {
        Selector::Eq(v)
    }
}

/// A table in columnar form.
#[derive(Debug, Clone)]
pub struct Frame {
    table: String,
    index: FrameIndex,
    batch: RecordBatch,
    positions: HashMap<PrimaryKey, usize>,
}

impl Frame {
    /// Assembles a frame from primary keys and a batch with one row per key.
    pub fn new(table: &TableSchema, keys: Vec<PrimaryKey>, batch: RecordBatch) -> Result<Self> {
        if keys.len() != batch.num_rows() {
            return Err(TicDatError::Configuration(format!(
                "frame '{}' has {} index labels for {} rows",
                table.name(),
                keys.len(),
                batch.num_rows()
            )));
        }
        let pk_len = table.primary_key_fields().len();
        let mut positions = HashMap::with_capacity(keys.len());
        for (row, key) in keys.iter().enumerate() {
            if key.len() != pk_len {
                return Err(TicDatError::RowArity {
                    table: table.name().to_string(),
                    expected: pk_len,
                    found: key.len(),
                });
            }
            if positions.insert(key.clone(), row).is_some() {
                return Err(TicDatError::Configuration(format!(
                    "frame '{}' repeats index label {key}",
                    table.name()
                )));
            }
        }
        Ok(Self {
            table: table.name().to_string(),
            index: FrameIndex::from_keys(table.primary_key_fields(), keys),
            batch,
            positions,
        })
    }

    pub fn name(&self) -> &str {
        &self.table
    }

    pub fn index(&self) -> &FrameIndex {
        &self.index
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema_ref().index_of(name).is_ok()
    }

    /// A column together with the frame's index.
    pub fn column(&self, name: &str) -> Result<Series<'_>> {
        let column = self
            .batch
            .schema_ref()
            .index_of(name)
            .map_err(|_| TicDatError::unknown_field(&self.table, name))?;
        Ok(Series {
            frame: self,
            name: name.to_string(),
            array: self.batch.column(column),
        })
    }

    /// The row position of a primary key.
    pub fn position(&self, key: &PrimaryKey) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Every column value of one row.
    pub fn row(&self, key: impl Into<PrimaryKey>) -> Option<Vec<(String, Value)>> {
        let row = self.position(&key.into())?;
        Some(
            self.batch
                .schema_ref()
                .fields()
                .iter()
                .zip(self.batch.columns())
                .map(|(field, array)| (field.name().clone(), cell(array, row)))
                .collect(),
        )
    }

    /// Row positions matching every selector. Missing trailing selectors
    /// match anything.
    fn select(&self, selectors: &[Selector]) -> Result<Vec<usize>> {
        let levels = self.index.levels();
        if selectors.len() > levels {
            return Err(TicDatError::Configuration(format!(
                "frame '{}' has {levels} index level(s) but {} selectors were given",
                self.table,
                selectors.len()
            )));
        }
        for (level, selector) in selectors.iter().enumerate() {
            if let Selector::Eq(label) = selector {
                let present = (0..self.index.len()).any(|row| self.index.label(row, level) == Some(label));
                if !present {
                    return Err(TicDatError::LabelNotFound {
                        table: self.table.clone(),
                        level,
                        label: label.to_string(),
                    });
                }
            }
        }
        Ok((0..self.index.len())
            .filter(|&row| {
                selectors.iter().enumerate().all(|(level, selector)| match selector {
                    Selector::Any => true,
                    Selector::Eq(label) => self.index.label(row, level) == Some(label),
                })
            })
            .collect())
    }
}

/// One column of a frame, addressed through the frame's index.
#[derive(Debug, Clone)]
pub struct Series<'a> {
    frame: &'a Frame,
    name: String,
    array: &'a ArrayRef,
}

impl<'a> Series<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// The underlying Arrow array.
    pub fn array(&self) -> &'a ArrayRef {
        self.array
    }

    /// The value at a primary key.
    pub fn get(&self, key: impl Into<PrimaryKey>) -> Option<Value> {
        self.frame
            .position(&key.into())
            .map(|row| cell(self.array, row))
    }

    /// Every `(key, value)` pair in index order.
    pub fn items(&self) -> Vec<(PrimaryKey, Value)> {
        self.collect((0..self.len()).collect())
    }

    /// Selects by label, one selector per index level.
    ///
    /// Fails with [`TicDatError::LabelNotFound`] when an `Eq` label does not
    /// occur at its level.
    pub fn loc(&self, selectors: &[Selector]) -> Result<Vec<(PrimaryKey, Value)>> {
        Ok(self.collect(self.frame.select(selectors)?))
    }

    /// Like [`Series::loc`], but an absent label yields an empty selection.
    pub fn sloc(&self, selectors: &[Selector]) -> Vec<(PrimaryKey, Value)> {
        match self.frame.select(selectors) {
            Ok(rows) => self.collect(rows),
            Err(e) => {
                debug!(series = %self.name, error = %e, "empty selection");
                Vec::new()
            }
        }
    }

    fn collect(&self, rows: Vec<usize>) -> Vec<(PrimaryKey, Value)> {
        rows.into_iter()
            .filter_map(|row| {
                let key = self.frame.index.key(row)?;
                Some((key, cell(self.array, row)))
            })
            .collect()
    }
}

/// Frames for a set of tables, keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    frames: BTreeMap<String, Frame>,
}

impl FrameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame: Frame) -> Option<Frame> {
        self.frames.insert(frame.name().to_string(), frame)
    }

    pub fn frame(&self, table: &str) -> Result<&Frame> {
        self.frames
            .get(table)
            .ok_or_else(|| TicDatError::unknown_table(table))
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.frames.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Converts a data object to frames.
#[instrument(skip(dat, options), fields(drop_pk_columns = options.drop_pk_columns))]
pub fn copy_to_frames(dat: &TicDat, options: &FrameOptions) -> Result<FrameSet> {
    let names: Vec<String> = match &options.tables {
        Some(tables) => tables.clone(),
        None => dat.schema().all_tables().map(str::to_string).collect(),
    };
    let mut set = FrameSet::new();
    for name in names {
        let table = dat.table(&name)?;
        let schema = table.schema();
        let columns: Vec<&str> = if options.drop_pk_columns {
            schema.data_fields().iter().map(String::as_str).collect()
        } else {
            schema.all_fields().collect()
        };

        let records: Vec<Vec<Value>> = table.flat_rows().collect();
        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays = Vec::with_capacity(columns.len());
        for column in columns {
            let position = schema
                .primary_key_index(column)
                .or_else(|| schema.data_field_index(column).map(|i| i + schema.primary_key_fields().len()))
                .ok_or_else(|| TicDatError::unknown_field(&name, column))?;
            let array = build_array(records.iter().map(|r| &r[position]));
            fields.push(Field::new(column, array.data_type().clone(), true));
            arrays.push(array);
        }
        let batch = RecordBatch::try_new_with_options(
            Arc::new(ArrowSchema::new(fields)),
            arrays,
            &RecordBatchOptions::new().with_row_count(Some(records.len())),
        )?;
        let frame = Frame::new(schema, table.keys().cloned().collect(), batch)?;
        debug!(table = %name, rows = frame.num_rows(), multi_index = frame.index().is_multi(), "built frame");
        set.insert(frame);
    }
    Ok(set)
}

/// Converts frames back into a data object of `schema`.
///
/// Frames for tables the schema lacks are rejected; tables without a frame
/// stay empty. Columns that are not data fields are ignored.
#[instrument(skip(frames, schema))]
pub fn copy_from_frames(frames: &FrameSet, schema: &Arc<Schema>) -> Result<TicDat> {
    let mut dat = schema.tic_dat();
    for frame in frames.frames() {
        let table_schema = Arc::clone(schema.table(frame.name())?);
        let missing: Vec<String> = table_schema
            .data_fields()
            .iter()
            .filter(|f| !frame.has_column(f))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TicDatError::FieldMismatch {
                table: frame.name().to_string(),
                missing,
                found: frame.column_names().into_iter().map(str::to_string).collect(),
            });
        }
        let columns = table_schema
            .data_fields()
            .iter()
            .map(|f| frame.column(f))
            .collect::<Result<Vec<_>>>()?;
        let table = dat.table_mut(frame.name())?;
        for row in 0..frame.num_rows() {
            let key = frame
                .index()
                .key(row)
                .ok_or_else(|| TicDatError::Internal(format!("frame '{}' lost row {row}", frame.name())))?;
            let values = columns.iter().map(|c| cell(c.array(), row)).collect();
            table.insert(key, values)?;
        }
    }
    Ok(dat)
}

fn build_array<'a>(values: impl Iterator<Item = &'a Value> + Clone) -> ArrayRef {
    let has_number = values.clone().any(|v| matches!(v, Value::Number(_)));
    let has_text = values.clone().any(|v| matches!(v, Value::Text(_)));
    let numbers = || -> ArrayRef { Arc::new(values.clone().map(Value::as_number).collect::<Float64Array>()) };
    let texts = || -> ArrayRef { Arc::new(values.clone().map(Value::as_text).collect::<StringArray>()) };
    match (has_number, has_text) {
        (true, true) => Arc::new(StructArray::from(vec![
            (Arc::new(Field::new("number", DataType::Float64, true)), numbers()),
            (Arc::new(Field::new("text", DataType::Utf8, true)), texts()),
        ])),
        (false, true) => texts(),
        _ => numbers(),
    }
}

/// Reads one cell of a column built by [`copy_to_frames`] or supplied by
/// the caller.
fn cell(array: &ArrayRef, row: usize) -> Value {
    if row >= array.len() || array.is_null(row) {
        return Value::Null;
    }
    let any = array.as_any();
    if let Some(a) = any.downcast_ref::<Float64Array>() {
        Value::Number(a.value(row))
    } else if let Some(a) = any.downcast_ref::<Int64Array>() {
        Value::Number(a.value(row) as f64)
    } else if let Some(a) = any.downcast_ref::<StringArray>() {
        Value::Text(a.value(row).to_string())
    } else if let Some(a) = any.downcast_ref::<StructArray>() {
        a.columns()
            .iter()
            .map(|child| cell(child, row))
            .find(|v| !v.is_null())
            .unwrap_or_default()
    } else {
        Value::Null
    }
}
