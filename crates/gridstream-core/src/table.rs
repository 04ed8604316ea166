//! Table extraction over a row source
//!
//! A table is a block of rows under a header row. [`TableRowIter`] finds the
//! first row, infers the column range and labels from it, then yields one
//! [`TableRow`] per data row until a stop condition is met.
//!
//! ```
//! use gridstream_core::{Cell, CellRef, Codec, DataType, DateSystem, MemoryRows};
//! use gridstream_core::{SharedStringTable, StyleSheet, TableOptions, TableRowIter};
//!
//! let mut sst = SharedStringTable::new();
//! let name = sst.intern("name", None);
//! let styles = StyleSheet::new();
//! let codec = Codec::new(&sst, &styles, DateSystem::V1900);
//!
//! let cells = vec![
//!     Cell::new(CellRef::parse("A1").unwrap(), DataType::SharedString, None, name.to_string()),
//!     Cell::new(CellRef::parse("A2").unwrap(), DataType::Number, None, "1"),
//! ];
//! let rows = MemoryRows::from_cells(&cells, &codec).unwrap();
//! let table = TableRowIter::new(rows, TableOptions::default()).into_data_table().unwrap();
//! assert_eq!(table.labels, vec!["name"]);
//! assert_eq!(table.columns[0].len(), 1);
//! ```

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use ahash::AHashSet;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;

use crate::cell::{encode_column, CellValue, ColumnRange};
use crate::error::{Error, Result};
use crate::rows::{RowSource, SheetRow};

/// Predicate deciding whether extraction stops at a candidate row
pub type StopPredicate = Box<dyn FnMut(&TableRow) -> bool>;

/// Options for table extraction
pub struct TableOptions {
    /// Columns of the table; inferred from the first row when `None`
    pub columns: Option<ColumnRange>,
    /// Sheet row to start looking for the table at
    pub first_row: Option<u32>,
    /// Whether the first row holds column labels (default: true)
    pub header: bool,
    /// Labels to use instead of the header cells or column letters
    pub column_labels: Option<Vec<String>>,
    /// Stop at the first row with no values in the table columns (default: true)
    pub stop_in_empty_row: bool,
    /// Stop before the first row this returns `true` for
    pub stop_in_row: Option<StopPredicate>,
    /// Narrow each column of a [`DataTable`] to one value type (default: false)
    pub infer_types: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            columns: None,
            first_row: None,
            header: true,
            column_labels: None,
            stop_in_empty_row: true,
            stop_in_row: None,
            infer_types: false,
        }
    }
}

impl fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("columns", &self.columns)
            .field("first_row", &self.first_row)
            .field("header", &self.header)
            .field("column_labels", &self.column_labels)
            .field("stop_in_empty_row", &self.stop_in_empty_row)
            .field("stop_in_row", &self.stop_in_row.as_ref().map(|_| "<fn>"))
            .field("infer_types", &self.infer_types)
            .finish()
    }
}

impl TableOptions {
    /// Restrict the table to a column range
    pub fn columns(mut self, columns: ColumnRange) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Start looking for the table at a sheet row
    pub fn first_row(mut self, row: u32) -> Self {
        self.first_row = Some(row);
        self
    }

    /// Set whether the first row is a header
    pub fn header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Use explicit column labels
    pub fn column_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Set whether an empty row ends the table
    pub fn stop_in_empty_row(mut self, stop: bool) -> Self {
        self.stop_in_empty_row = stop;
        self
    }

    /// End the table before the first row matching `predicate`
    pub fn stop_in_row<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&TableRow) -> bool + 'static,
    {
        self.stop_in_row = Some(Box::new(predicate));
        self
    }

    /// Set whether [`TableRowIter::into_data_table`] fills in typed columns
    pub fn infer_types(mut self, infer: bool) -> Self {
        self.infer_types = infer;
        self
    }
}

/// One data row of a table
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    index: usize,
    row: u32,
    labels: Arc<[String]>,
    values: Vec<CellValue>,
}

impl TableRow {
    /// 1-based position of the row among the table's data rows
    pub fn index(&self) -> usize {
        self.index
    }

    /// Sheet row number the data came from
    pub fn row_number(&self) -> u32 {
        self.row
    }

    /// Value in a table column (1-based)
    pub fn get(&self, column: usize) -> Option<&CellValue> {
        column.checked_sub(1).and_then(|i| self.values.get(i))
    }

    /// Value under a column label
    pub fn by_label(&self, label: &str) -> Option<&CellValue> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.values.get(i))
    }

    /// Column labels of the table
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Values in column order
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }
}

impl Index<usize> for TableRow {
    type Output = CellValue;

    fn index(&self, column: usize) -> &CellValue {
        self.get(column)
            .unwrap_or_else(|| panic!("table column {} out of range 1..={}", column, self.values.len()))
    }
}

impl Index<&str> for TableRow {
    type Output = CellValue;

    fn index(&self, label: &str) -> &CellValue {
        self.by_label(label)
            .unwrap_or_else(|| panic!("no table column labelled '{}'", label))
    }
}

/// A whole table, column-oriented
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataTable {
    /// Column labels
    pub labels: Vec<String>,
    /// One vector of values per column
    pub columns: Vec<Vec<CellValue>>,
    /// The columns narrowed to their value types, when asked for
    pub typed_columns: Option<Vec<TableColumn>>,
}

impl DataTable {
    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Values of the column with a label
    pub fn column(&self, label: &str) -> Option<&[CellValue]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.columns[i].as_slice())
    }

    /// Typed column with a label, when types were inferred
    pub fn typed_column(&self, label: &str) -> Option<&TableColumn> {
        let i = self.labels.iter().position(|l| l == label)?;
        self.typed_columns.as_ref()?.get(i)
    }
}

/// A table column whose values share one type
///
/// Empty cells are `None`. A column mixing value types, or holding nothing
/// but empty cells, stays [`TableColumn::Mixed`].
#[derive(Debug, Clone, PartialEq)]
pub enum TableColumn {
    Bool(Vec<Option<bool>>),
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
    Time(Vec<Option<NaiveTime>>),
    DateTime(Vec<Option<NaiveDateTime>>),
    Mixed(Vec<CellValue>),
}

impl TableColumn {
    /// Narrow `values` to the type of its first non-empty value
    pub fn infer(values: Vec<CellValue>) -> Self {
        let typed = match values.iter().find(|v| !v.is_empty()) {
            Some(CellValue::Bool(_)) => narrow(&values, |v| match v {
                CellValue::Bool(b) => Some(*b),
                _ => None,
            })
            .map(TableColumn::Bool),
            Some(CellValue::Int(_)) => narrow(&values, |v| match v {
                CellValue::Int(n) => Some(*n),
                _ => None,
            })
            .map(TableColumn::Int),
            Some(CellValue::Float(_)) => narrow(&values, |v| match v {
                CellValue::Float(n) => Some(*n),
                _ => None,
            })
            .map(TableColumn::Float),
            Some(CellValue::Text(_)) => narrow(&values, |v| match v {
                CellValue::Text(s) => Some(s.clone()),
                _ => None,
            })
            .map(TableColumn::Text),
            Some(CellValue::Date(_)) => narrow(&values, |v| match v {
                CellValue::Date(d) => Some(*d),
                _ => None,
            })
            .map(TableColumn::Date),
            Some(CellValue::Time(_)) => narrow(&values, |v| match v {
                CellValue::Time(t) => Some(*t),
                _ => None,
            })
            .map(TableColumn::Time),
            Some(CellValue::DateTime(_)) => narrow(&values, |v| match v {
                CellValue::DateTime(dt) => Some(*dt),
                _ => None,
            })
            .map(TableColumn::DateTime),
            Some(CellValue::Empty) | None => None,
        };
        typed.unwrap_or(TableColumn::Mixed(values))
    }

    /// Number of values, empty ones included
    pub fn len(&self) -> usize {
        match self {
            TableColumn::Bool(v) => v.len(),
            TableColumn::Int(v) => v.len(),
            TableColumn::Float(v) => v.len(),
            TableColumn::Text(v) => v.len(),
            TableColumn::Date(v) => v.len(),
            TableColumn::Time(v) => v.len(),
            TableColumn::DateTime(v) => v.len(),
            TableColumn::Mixed(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every value through `pick`, empty cells as `None`; `None` if one does not fit
fn narrow<T>(
    values: &[CellValue],
    pick: impl Fn(&CellValue) -> Option<T>,
) -> Option<Vec<Option<T>>> {
    values
        .iter()
        .map(|v| match v {
            CellValue::Empty => Some(None),
            v => pick(v).map(Some),
        })
        .collect()
}

/// Make labels unique and fill in empty ones
fn normalize_labels(raw: Vec<String>) -> Vec<String> {
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (i, label) in raw.into_iter().enumerate() {
        let base = if label.trim().is_empty() {
            format!("Column{}", i + 1)
        } else {
            label
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

/// First maximal run of contiguous non-empty cells in a row
fn infer_columns(row: &SheetRow) -> Option<ColumnRange> {
    let mut values = row.values().filter(|(_, v)| !v.is_empty()).map(|(c, _)| c);
    let start = values.next()?;
    let mut end = start;
    for col in values {
        if col != end + 1 {
            break;
        }
        end = col;
    }
    ColumnRange::new(start, end).ok()
}

fn has_values_in(row: &SheetRow, columns: Option<&ColumnRange>) -> bool {
    row.values()
        .any(|(c, v)| !v.is_empty() && columns.map_or(true, |r| r.contains(c)))
}

enum State {
    NotStarted,
    Running,
    Done,
}

/// Iterator over the data rows of a table
pub struct TableRowIter<S> {
    source: S,
    options: TableOptions,
    state: State,
    columns: Option<ColumnRange>,
    labels: Arc<[String]>,
    pending: Option<SheetRow>,
    last_row: u32,
    emitted: usize,
}

impl<S: RowSource> TableRowIter<S> {
    /// Extract a table from `source`
    pub fn new(source: S, options: TableOptions) -> Self {
        Self {
            source,
            options,
            state: State::NotStarted,
            columns: None,
            labels: Arc::from(Vec::new()),
            pending: None,
            last_row: 0,
            emitted: 0,
        }
    }

    /// Column labels; empty until the first row was located
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Column range of the table, once located
    pub fn column_range(&self) -> Option<ColumnRange> {
        self.columns
    }

    /// Locate the first row, settle columns and labels
    fn start(&mut self) -> Result<bool> {
        if self.options.first_row == Some(0) {
            return Err(Error::InvalidTableConfig(
                "first_row must be at least 1".into(),
            ));
        }
        let first_row = self.options.first_row.unwrap_or(1);

        let first = loop {
            match self.source.next_row()? {
                None => return Ok(false),
                Some(row)
                    if row.row_number() >= first_row
                        && has_values_in(&row, self.options.columns.as_ref()) =>
                {
                    break row
                }
                Some(_) => continue,
            }
        };

        let columns = match self.options.columns {
            Some(c) => c,
            None => infer_columns(&first).ok_or_else(|| {
                Error::TableNotFound(format!("row {} has no values", first.row_number()))
            })?,
        };
        let width = usize::from(columns.len());

        let labels = match &self.options.column_labels {
            Some(labels) if labels.len() != width => {
                return Err(Error::InvalidTableConfig(format!(
                    "{} column labels given for {} columns ({})",
                    labels.len(),
                    width,
                    columns
                )));
            }
            Some(labels) => labels.clone(),
            None if self.options.header => columns
                .iter()
                .map(|c| first.value(c).to_string())
                .collect(),
            None => columns.iter().map(encode_column).collect(),
        };

        debug!(
            "table at row {} over {} with labels {:?}",
            first.row_number(),
            columns,
            labels
        );

        self.columns = Some(columns);
        self.labels = Arc::from(normalize_labels(labels));
        if self.options.header {
            self.last_row = first.row_number();
        } else {
            self.last_row = first.row_number() - 1;
            self.pending = Some(first);
        }
        Ok(true)
    }

    fn advance(&mut self) -> Result<Option<TableRow>> {
        let Some(columns) = self.columns else {
            return Ok(None);
        };

        loop {
            let row = match self.pending.take() {
                Some(row) => row,
                None => match self.source.next_row()? {
                    Some(row) => row,
                    None => return Ok(None),
                },
            };

            // a skipped sheet row number is an empty row
            if self.options.stop_in_empty_row && row.row_number() > self.last_row + 1 {
                return Ok(None);
            }
            self.last_row = row.row_number();

            let values: Vec<CellValue> = columns.iter().map(|c| row.value(c).clone()).collect();
            if values.iter().all(CellValue::is_empty) {
                if self.options.stop_in_empty_row {
                    return Ok(None);
                }
                continue;
            }

            let candidate = TableRow {
                index: self.emitted + 1,
                row: row.row_number(),
                labels: Arc::clone(&self.labels),
                values,
            };
            if let Some(stop) = self.options.stop_in_row.as_mut() {
                if stop(&candidate) {
                    return Ok(None);
                }
            }
            self.emitted += 1;
            return Ok(Some(candidate));
        }
    }

    /// Collect all rows into a column-oriented table
    pub fn into_data_table(mut self) -> Result<DataTable> {
        let mut columns: Vec<Vec<CellValue>> = Vec::new();
        for row in self.by_ref() {
            let row = row?;
            if columns.is_empty() {
                columns = vec![Vec::new(); row.values.len()];
            }
            for (column, value) in columns.iter_mut().zip(row.values) {
                column.push(value);
            }
        }
        if columns.is_empty() {
            return Err(Error::TableNotFound("no data rows found".into()));
        }
        let typed_columns = self
            .options
            .infer_types
            .then(|| columns.iter().cloned().map(TableColumn::infer).collect());
        Ok(DataTable {
            labels: self.labels.to_vec(),
            columns,
            typed_columns,
        })
    }

    /// Give back the row source
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: RowSource> Iterator for TableRowIter<S> {
    type Item = Result<TableRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if let State::NotStarted = self.state {
            match self.start() {
                Ok(true) => self.state = State::Running,
                Ok(false) => self.state = State::Done,
                Err(e) => {
                    self.state = State::Done;
                    return Some(Err(e));
                }
            }
        }
        if let State::Done = self.state {
            return None;
        }

        match self.advance() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.state = State::Done;
                None
            }
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}
