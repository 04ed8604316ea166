//! Worksheet cache
//!
//! [`WorksheetCache`] wraps a sheet's row stream. With caching enabled every
//! row the stream yields is kept in the worksheet's sparse store, rows
//! already kept are answered from memory, and any cell can be queried in any
//! order. Without caching it passes the stream through unchanged.

use log::{debug, trace};

use crate::cell::{CellRange, CellRef, CellValue};
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::rows::{RowSource, SheetRow};
use crate::worksheet::Worksheet;

/// Row source over a worksheet, reading its stream on demand
pub struct WorksheetCache<'a, S> {
    sheet: &'a mut Worksheet,
    codec: Codec<'a>,
    stream: Option<S>,
    /// Last row number handed out by `next_row`
    cursor: Option<u32>,
}

impl<'a, S: RowSource> WorksheetCache<'a, S> {
    /// Wrap `stream` (a fresh stream over the sheet part, or `None` when
    /// the sheet is fully cached)
    pub fn new(sheet: &'a mut Worksheet, codec: Codec<'a>, stream: Option<S>) -> Self {
        debug!(
            "worksheet cache over '{}' (enabled: {}, fully cached: {})",
            sheet.name(),
            sheet.is_cache_enabled(),
            sheet.is_fully_cached()
        );
        Self {
            sheet,
            codec,
            stream,
            cursor: None,
        }
    }

    /// The worksheet behind the cache
    pub fn worksheet(&self) -> &Worksheet {
        self.sheet
    }

    fn enabled(&self) -> bool {
        self.sheet.is_cache_enabled()
    }

    fn decode_cached(&self, n: u32) -> Result<Option<SheetRow>> {
        match self.sheet.cells().row(n) {
            Some(cells) => {
                trace!("cache hit for row {} of '{}'", n, self.sheet.name());
                SheetRow::decode(n, cells.values(), &self.codec).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Pull the next row from the stream that is not cached yet and keep it
    fn pull(&mut self) -> Result<Option<SheetRow>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        loop {
            match stream.next_row()? {
                Some(row) => {
                    if self.sheet.is_row_cached(row.row_number()) {
                        continue;
                    }
                    trace!(
                        "cache miss, keeping row {} of '{}'",
                        row.row_number(),
                        self.sheet.name()
                    );
                    self.sheet
                        .cache_row(row.row_number(), row.clone().into_cells());
                    return Ok(Some(row));
                }
                None => {
                    debug!("'{}' is now fully cached", self.sheet.name());
                    self.sheet.mark_fully_cached();
                    self.stream = None;
                    return Ok(None);
                }
            }
        }
    }

    /// Read the stream until row `n` is cached or the stream ends
    fn fill_to(&mut self, n: u32) -> Result<()> {
        while !self.sheet.is_row_cached(n) {
            if self.pull()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Read the rest of the stream into the cache
    pub fn fill(&mut self) -> Result<()> {
        if !self.enabled() {
            return Err(Error::CacheDisabled(format!(
                "'{}' cannot be filled",
                self.sheet.name()
            )));
        }
        while self.pull()?.is_some() {}
        Ok(())
    }

    /// Decoded value at any location, reading the stream as far as needed
    pub fn cell(&mut self, reference: &CellRef) -> Result<CellValue> {
        let row = self.row(reference.row())?;
        Ok(row
            .map(|r| r.value(reference.column()).clone())
            .unwrap_or(CellValue::Empty))
    }

    /// Decoded values of a range, row by row
    pub fn range(&mut self, range: &CellRange) -> Result<Vec<Vec<CellValue>>> {
        if !self.enabled() {
            let mut out = Vec::with_capacity(range.row_count() as usize);
            for n in range.rows() {
                let row = self.row(n)?;
                out.push(
                    range
                        .columns()
                        .iter()
                        .map(|c| row.as_ref().map(|r| r.value(c).clone()).unwrap_or_default())
                        .collect(),
                );
            }
            return Ok(out);
        }

        self.fill_to(range.end().row())?;
        let mut out = Vec::with_capacity(range.row_count() as usize);
        for n in range.rows() {
            let mut values = Vec::with_capacity(range.col_count() as usize);
            for col in range.columns().iter() {
                let value = match CellRef::new(n, col).ok().and_then(|r| self.sheet.cell(&r)) {
                    Some(cell) => self.codec.decode(cell)?,
                    None => CellValue::Empty,
                };
                values.push(value);
            }
            out.push(values);
        }
        Ok(out)
    }
}

impl<S: RowSource> RowSource for WorksheetCache<'_, S> {
    fn next_row(&mut self) -> Result<Option<SheetRow>> {
        if !self.enabled() {
            let row = match self.stream.as_mut() {
                Some(stream) => stream.next_row()?,
                None => None,
            };
            self.cursor = row.as_ref().map(SheetRow::row_number).or(self.cursor);
            return Ok(row);
        }

        let after = self.cursor.unwrap_or(0);
        let cached_next = self
            .sheet
            .cells()
            .rows_after(after)
            .map(|(n, _)| n)
            .next()
            .filter(|&n| self.sheet.is_row_cached(n));

        let row = match cached_next {
            Some(n) => self.decode_cached(n)?,
            None => self.pull()?,
        };
        if let Some(r) = &row {
            self.cursor = Some(r.row_number());
        }
        Ok(row)
    }

    fn is_exhausted(&self) -> bool {
        if !self.enabled() {
            return self.stream.as_ref().map_or(true, |s| s.is_exhausted());
        }
        let after = self.cursor.unwrap_or(0);
        self.stream.is_none() && self.sheet.cells().rows_after(after).next().is_none()
    }

    fn row(&mut self, n: u32) -> Result<Option<SheetRow>> {
        if !self.enabled() {
            return match self.stream.as_mut() {
                Some(stream) => stream.row(n),
                None => Ok(None),
            };
        }
        self.fill_to(n)?;
        self.decode_cached(n)
    }
}
