//! Worksheet type

use crate::cell::{Cell, CellRange, CellRef, CellStore};

/// A worksheet: name, declared dimension and the cells read or written so far
///
/// Cells of a sheet that came from a package are only present once they
/// were read through the cache; see [`crate::cache::WorksheetCache`].
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// `<dimension ref>` from the sheet part, if any
    dimension: Option<CellRange>,
    /// Sparse cell storage
    cells: CellStore,
    /// Whether rows read through the stream are kept
    cache_enabled: bool,
    /// Highest row number the cache has consumed from the stream
    last_cached_row: Option<u32>,
    /// The stream was read to the end and every row is in `cells`
    fully_cached: bool,
    /// Cells were changed since loading
    dirty: bool,
}

impl Worksheet {
    /// Create a new, empty worksheet that lives only in memory
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            dimension: None,
            cells: CellStore::new(),
            cache_enabled: true,
            last_cached_row: None,
            fully_cached: true,
            dirty: true,
        }
    }

    /// A worksheet backed by a package part whose rows have not been read yet
    pub fn from_part<S: Into<String>>(name: S, cache_enabled: bool) -> Self {
        Self {
            name: name.into(),
            dimension: None,
            cells: CellStore::new(),
            cache_enabled,
            last_cached_row: None,
            fully_cached: false,
            dirty: false,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Declared dimension, or the used range once the sheet was modified
    pub fn dimension(&self) -> Option<CellRange> {
        if self.dirty || self.dimension.is_none() {
            self.cells.used_range().or(self.dimension)
        } else {
            self.dimension
        }
    }

    /// Record the dimension declared by the sheet part
    pub fn set_dimension(&mut self, dimension: Option<CellRange>) {
        self.dimension = dimension;
    }

    /// Sparse cell storage
    pub fn cells(&self) -> &CellStore {
        &self.cells
    }

    /// Stored cell at a location
    pub fn cell(&self, reference: &CellRef) -> Option<&Cell> {
        self.cells.get(reference)
    }

    /// Store a cell written by the caller
    pub fn set_cell(&mut self, cell: Cell) {
        self.dirty = true;
        if cell.is_empty() && cell.style.is_none() {
            self.cells.remove(&cell.reference);
        } else {
            self.cells.insert(cell);
        }
    }

    /// Whether rows read through the stream are kept
    pub fn is_cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Turn caching on or off for later reads
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    /// Highest row number consumed from the stream into the cache
    pub fn last_cached_row(&self) -> Option<u32> {
        self.last_cached_row
    }

    /// True once every row of the sheet is held in memory
    pub fn is_fully_cached(&self) -> bool {
        self.fully_cached
    }

    /// True when the sheet was changed since it was loaded
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forget pending modifications (after they were written out)
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Keep a row read from the stream
    pub(crate) fn cache_row<I: IntoIterator<Item = Cell>>(&mut self, row: u32, cells: I) {
        self.cells.touch_row(row);
        for cell in cells {
            self.cells.insert(cell);
        }
        self.last_cached_row = Some(self.last_cached_row.map_or(row, |last| last.max(row)));
    }

    /// Record that the stream was read to the end
    pub(crate) fn mark_fully_cached(&mut self) {
        self.fully_cached = true;
    }

    /// Check whether row `n` is answered from memory
    pub(crate) fn is_row_cached(&self, n: u32) -> bool {
        self.fully_cached || self.last_cached_row.is_some_and(|last| n <= last)
    }
}
