//! Sparse cell storage
//!
//! Only cells that were read or written are stored, using a row-based
//! BTreeMap structure: `BTreeMap<row, BTreeMap<column, Cell>>`. Ordered
//! iteration matches the row-major order cells are written back in.

use std::collections::BTreeMap;

use super::{Cell, CellRange, CellRef};

/// Sparse row-based storage for worksheet cells
#[derive(Debug, Clone, Default)]
pub struct CellStore {
    rows: BTreeMap<u32, BTreeMap<u16, Cell>>,
}

impl CellStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cell at a location
    pub fn get(&self, reference: &CellRef) -> Option<&Cell> {
        self.rows
            .get(&reference.row())
            .and_then(|row| row.get(&reference.column()))
    }

    /// Store a cell at its own reference, replacing any previous cell
    pub fn insert(&mut self, cell: Cell) -> Option<Cell> {
        self.rows
            .entry(cell.row())
            .or_default()
            .insert(cell.column(), cell)
    }

    /// Make sure a row exists, even when it holds no cells
    pub fn touch_row(&mut self, row: u32) {
        self.rows.entry(row).or_default();
    }

    /// Remove a cell
    pub fn remove(&mut self, reference: &CellRef) -> Option<Cell> {
        let row = self.rows.get_mut(&reference.row())?;
        let removed = row.remove(&reference.column());
        if row.is_empty() {
            self.rows.remove(&reference.row());
        }
        removed
    }

    /// Cells of a row, keyed by column
    pub fn row(&self, row: u32) -> Option<&BTreeMap<u16, Cell>> {
        self.rows.get(&row)
    }

    /// Check whether a row has been stored
    pub fn has_row(&self, row: u32) -> bool {
        self.rows.contains_key(&row)
    }

    /// Stored row numbers in ascending order
    pub fn row_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }

    /// Stored rows strictly after `row`, in order
    pub fn rows_after(&self, row: u32) -> impl Iterator<Item = (u32, &BTreeMap<u16, Cell>)> {
        self.rows
            .range(row.saturating_add(1)..)
            .map(|(r, cells)| (*r, cells))
    }

    /// Highest stored row number
    pub fn last_row(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Check if no cells are stored
    pub fn is_empty(&self) -> bool {
        self.rows.values().all(BTreeMap::is_empty)
    }

    /// Remove all cells
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Smallest range containing every stored cell
    pub fn used_range(&self) -> Option<CellRange> {
        let mut cells = self.iter().map(|cell| cell.reference);
        let first = cells.next()?;
        Some(cells.fold(CellRange::single(first), |range, r| range.extend_to(r)))
    }

    /// Iterate over all cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.rows.values().flat_map(BTreeMap::values)
    }

    /// Iterate over stored cells inside a range, in row-major order
    pub fn iter_range<'a>(&'a self, range: &CellRange) -> impl Iterator<Item = &'a Cell> + 'a {
        let columns = range.columns();
        self.rows
            .range(range.rows())
            .flat_map(move |(_, row)| row.range(columns.start()..=columns.end()))
            .map(|(_, cell)| cell)
    }
}
