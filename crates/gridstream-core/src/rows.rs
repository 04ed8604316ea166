//! Sheet rows and the row-source capability
//!
//! A [`RowSource`] yields the rows of one worksheet in ascending row order.
//! The package stream, the worksheet cache and in-memory rows all implement
//! it, so table extraction works the same over any of them.

use std::collections::BTreeMap;

use log::trace;

use crate::cell::{decode_column, Cell, CellValue};
use crate::codec::Codec;
use crate::error::{Error, Result};

static EMPTY: CellValue = CellValue::Empty;

/// A stored cell next to its decoded value
#[derive(Debug, Clone, PartialEq)]
pub struct RowCell {
    pub cell: Cell,
    pub value: CellValue,
}

/// One row of a worksheet, with every present cell decoded
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    row: u32,
    cells: BTreeMap<u16, RowCell>,
}

impl SheetRow {
    /// Create a row with no cells
    pub fn new(row: u32) -> Self {
        Self {
            row,
            cells: BTreeMap::new(),
        }
    }

    /// Decode stored cells into a row
    pub fn decode<'c, I>(row: u32, cells: I, codec: &Codec<'_>) -> Result<Self>
    where
        I: IntoIterator<Item = &'c Cell>,
    {
        let mut out = Self::new(row);
        for cell in cells {
            let value = codec.decode(cell)?;
            out.insert(cell.clone(), value);
        }
        Ok(out)
    }

    /// Add a decoded cell, replacing any cell in the same column
    pub fn insert(&mut self, cell: Cell, value: CellValue) {
        self.cells.insert(cell.column(), RowCell { cell, value });
    }

    /// Sheet row number (1-based)
    pub fn row_number(&self) -> u32 {
        self.row
    }

    /// Value in a column, [`CellValue::Empty`] when absent
    pub fn value(&self, col: u16) -> &CellValue {
        self.cells.get(&col).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    /// Value in a column given by letters (`"B"`)
    pub fn value_by_name(&self, column: &str) -> Result<&CellValue> {
        Ok(self.value(decode_column(column)?))
    }

    /// Stored cell in a column
    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col).map(|c| &c.cell)
    }

    /// First and last column holding a cell
    pub fn column_bounds(&self) -> Option<(u16, u16)> {
        let first = *self.cells.keys().next()?;
        let last = *self.cells.keys().next_back()?;
        Some((first, last))
    }

    /// True when no cell holds a value
    pub fn is_empty(&self) -> bool {
        self.cells.values().all(|c| c.value.is_empty())
    }

    /// Number of stored cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Present cells as `(column, value)` in column order
    pub fn values(&self) -> impl Iterator<Item = (u16, &CellValue)> {
        self.cells.iter().map(|(col, c)| (*col, &c.value))
    }

    /// Present stored cells in column order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values().map(|c| &c.cell)
    }

    /// Consume the row, keeping only the stored cells
    pub fn into_cells(self) -> impl Iterator<Item = Cell> {
        self.cells.into_values().map(|c| c.cell)
    }
}

/// Anything that yields the rows of a worksheet in ascending order
pub trait RowSource {
    /// Next row, `Ok(None)` once the source is exhausted
    fn next_row(&mut self) -> Result<Option<SheetRow>>;

    /// True once `next_row` can only return `Ok(None)`
    fn is_exhausted(&self) -> bool;

    /// Row `n`, or `Ok(None)` if the sheet has no such row
    ///
    /// Forward-only sources fail with [`Error::NotAvailable`] when `n` was
    /// already passed.
    fn row(&mut self, n: u32) -> Result<Option<SheetRow>>;

    /// Adapt the source into a standard iterator
    fn into_rows(self) -> Rows<Self>
    where
        Self: Sized,
    {
        Rows { source: self }
    }
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn next_row(&mut self) -> Result<Option<SheetRow>> {
        (**self).next_row()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }

    fn row(&mut self, n: u32) -> Result<Option<SheetRow>> {
        (**self).row(n)
    }
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn next_row(&mut self) -> Result<Option<SheetRow>> {
        (**self).next_row()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }

    fn row(&mut self, n: u32) -> Result<Option<SheetRow>> {
        (**self).row(n)
    }
}

/// Iterator over the rows of a [`RowSource`]
pub struct Rows<S> {
    source: S,
}

impl<S: RowSource> Rows<S> {
    /// Give back the underlying source
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: RowSource> Iterator for Rows<S> {
    type Item = Result<SheetRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next_row().transpose()
    }
}

/// Rows held in memory, yielded once in order
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    rows: std::collections::VecDeque<SheetRow>,
    position: Option<u32>,
}

impl MemoryRows {
    /// Rows in any order; they are sorted by row number
    pub fn new(mut rows: Vec<SheetRow>) -> Self {
        rows.sort_by_key(SheetRow::row_number);
        Self {
            rows: rows.into(),
            position: None,
        }
    }

    /// Group stored cells by row and decode them
    pub fn from_cells<'c, I>(cells: I, codec: &Codec<'_>) -> Result<Self>
    where
        I: IntoIterator<Item = &'c Cell>,
    {
        let mut by_row: BTreeMap<u32, Vec<&Cell>> = BTreeMap::new();
        for cell in cells {
            by_row.entry(cell.row()).or_default().push(cell);
        }
        let rows = by_row
            .into_iter()
            .map(|(row, cells)| SheetRow::decode(row, cells, codec))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rows))
    }
}

impl RowSource for MemoryRows {
    fn next_row(&mut self) -> Result<Option<SheetRow>> {
        let row = self.rows.pop_front();
        if let Some(r) = &row {
            trace!("memory row {}", r.row_number());
            self.position = Some(r.row_number());
        }
        Ok(row)
    }

    fn is_exhausted(&self) -> bool {
        self.rows.is_empty()
    }

    fn row(&mut self, n: u32) -> Result<Option<SheetRow>> {
        if let Some(position) = self.position {
            if n <= position {
                return Err(Error::NotAvailable {
                    requested: n,
                    position,
                });
            }
        }
        while let Some(front) = self.rows.front() {
            if front.row_number() > n {
                return Ok(None);
            }
            let row = self.next_row()?;
            if let Some(r) = row {
                if r.row_number() == n {
                    return Ok(Some(r));
                }
            }
        }
        Ok(None)
    }
}
