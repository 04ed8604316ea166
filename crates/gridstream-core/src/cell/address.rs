//! Cell references, ranges and column ranges
//!
//! Rows and columns are 1-based throughout, matching the A1 notation used in
//! the package XML: `A1` is row 1, column 1 and `XFD1048576` is the last cell
//! of a sheet.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// Convert a 1-based column number to its letters (1 = A, 26 = Z, 27 = AA).
///
/// Column numbers are bijective base-26: there is no zero digit. `0` has no
/// letter form and encodes to an empty string.
///
/// ```
/// use gridstream_core::encode_column;
///
/// assert_eq!(encode_column(4), "D");
/// assert_eq!(encode_column(28), "AB");
/// ```
pub fn encode_column(col: u16) -> String {
    let mut letters = Vec::with_capacity(3);
    let mut n = u32::from(col);

    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }

    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Convert column letters to a 1-based column number (A = 1, AA = 27).
///
/// Only upper-case `A-Z` is accepted. Fails with [`Error::InvalidAddress`] on
/// empty input, any other character, or a column beyond `XFD`.
pub fn decode_column(letters: &str) -> Result<u16> {
    if letters.is_empty() {
        return Err(Error::invalid_address("empty column letters"));
    }

    let mut col: u32 = 0;
    for c in letters.bytes() {
        if !c.is_ascii_uppercase() {
            return Err(Error::InvalidAddress(format!(
                "invalid column letter '{}' in '{}'",
                c as char, letters
            )));
        }
        col = col * 26 + u32::from(c - b'A' + 1);
        if col > u32::from(MAX_COLS) {
            return Err(Error::InvalidAddress(format!(
                "column '{}' is beyond the last column (max: {})",
                letters, MAX_COLS
            )));
        }
    }

    Ok(col as u16)
}

/// Split `AB12` into its column letters and row digits without validating them.
pub fn split_cellname(name: &str) -> Option<(&str, &str)> {
    let split = name.find(|c: char| !c.is_ascii_alphabetic())?;
    if split == 0 {
        return None;
    }
    Some(name.split_at(split))
}

fn parse_row(digits: &str, source: &str) -> Result<u32> {
    if digits.is_empty() {
        return Err(Error::InvalidAddress(format!("no row number in '{}'", source)));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAddress(format!(
            "invalid row number in '{}'",
            source
        )));
    }
    if digits.starts_with('0') {
        return Err(Error::InvalidAddress(format!(
            "row number must start with 1-9 in '{}'",
            source
        )));
    }

    let row: u32 = digits
        .parse()
        .map_err(|_| Error::InvalidAddress(format!("row number too large in '{}'", source)))?;
    if row > MAX_ROWS {
        return Err(Error::InvalidAddress(format!(
            "row {} is beyond the last row (max: {})",
            row, MAX_ROWS
        )));
    }

    Ok(row)
}

/// A single cell location, e.g. `AB12`
///
/// Ordering is row-major, which is the order cells appear in a worksheet part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRef {
    row: u32,
    col: u16,
}

impl CellRef {
    /// Create a reference from 1-based row and column numbers, checking sheet bounds
    pub fn new(row: u32, col: u16) -> Result<Self> {
        if row == 0 || row > MAX_ROWS {
            return Err(Error::InvalidAddress(format!(
                "row {} outside 1..={}",
                row, MAX_ROWS
            )));
        }
        if col == 0 || col > MAX_COLS {
            return Err(Error::InvalidAddress(format!(
                "column {} outside 1..={}",
                col, MAX_COLS
            )));
        }
        Ok(Self { row, col })
    }

    /// Parse an A1-style reference
    ///
    /// # Examples
    /// ```
    /// use gridstream_core::CellRef;
    ///
    /// let r = CellRef::parse("AB1").unwrap();
    /// assert_eq!(r.row(), 1);
    /// assert_eq!(r.column(), 28);
    /// assert_eq!(r.to_string(), "AB1");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let (letters, digits) = split_cellname(s)
            .ok_or_else(|| Error::InvalidAddress(format!("'{}' is not a cell reference", s)))?;
        let col = decode_column(letters)?;
        let row = parse_row(digits, s)?;
        Ok(Self { row, col })
    }

    /// Row number (1-based)
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Column number (1-based)
    pub fn column(&self) -> u16 {
        self.col
    }

    /// Column letters, e.g. `AB`
    pub fn column_name(&self) -> String {
        encode_column(self.col)
    }

    /// Single-cell range covering this reference
    pub fn to_range(&self) -> CellRange {
        CellRange::single(*self)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", encode_column(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Check whether `name` is a valid cell name, bounded by `A1:XFD1048576`
pub fn is_valid_cellname(name: &str) -> bool {
    CellRef::parse(name).is_ok()
}

/// Check whether `s` is a valid `A1:B2` cell range
pub fn is_valid_cellrange(s: &str) -> bool {
    CellRange::parse(s).is_ok()
}

/// Check whether `s` is a valid `A:B` column range
pub fn is_valid_column_range(s: &str) -> bool {
    ColumnRange::parse(s).is_ok()
}

/// A rectangular range of cells (e.g. `A1:C4`)
///
/// The first corner is always the top-left and the second the bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    start: CellRef,
    end: CellRef,
}

impl CellRange {
    /// Create a range from its top-left and bottom-right corners
    ///
    /// Reversed corners are rejected; use [`CellRange::spanning`] to accept
    /// corners in any order.
    pub fn new(start: CellRef, end: CellRef) -> Result<Self> {
        if start.row > end.row || start.col > end.col {
            return Err(Error::InvalidAddress(format!(
                "range corners {}:{} are not top-left/bottom-right",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Smallest range containing both cells, whatever their order
    pub fn spanning(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef {
                row: a.row.min(b.row),
                col: a.col.min(b.col),
            },
            end: CellRef {
                row: a.row.max(b.row),
                col: a.col.max(b.col),
            },
        }
    }

    /// Single-cell range
    pub fn single(cell: CellRef) -> Self {
        Self {
            start: cell,
            end: cell,
        }
    }

    /// Parse `A1:B10`
    ///
    /// Fails with [`Error::InvalidAddress`] if either side is not a cell
    /// reference or the corners are reversed (`D4:B2`).
    pub fn parse(s: &str) -> Result<Self> {
        let (left, right) = split_cellrange(s)?;
        Self::new(CellRef::parse(left)?, CellRef::parse(right)?)
    }

    /// Top-left corner
    pub fn start(&self) -> CellRef {
        self.start
    }

    /// Bottom-right corner
    pub fn end(&self) -> CellRef {
        self.end
    }

    /// Check whether a cell lies inside this range
    pub fn contains(&self, cell: &CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    /// Check whether this range lies entirely inside `outer`
    pub fn is_subset_of(&self, outer: &CellRange) -> bool {
        outer.contains(&self.start) && outer.contains(&self.end)
    }

    /// 1-based `(row, column)` position of `cell` relative to the top-left corner
    ///
    /// For `B2:D4`, `C3` is at `(2, 2)` and `D4` at `(3, 3)`.
    pub fn relative_position(&self, cell: &CellRef) -> Result<(u32, u16)> {
        if !self.contains(cell) {
            return Err(Error::InvalidAddress(format!(
                "{} is outside range {}",
                cell, self
            )));
        }
        Ok((
            cell.row - self.start.row + 1,
            cell.col - self.start.col + 1,
        ))
    }

    /// Number of rows
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Number of columns
    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// Total number of cells
    pub fn cell_count(&self) -> u64 {
        u64::from(self.row_count()) * u64::from(self.col_count())
    }

    /// Row numbers covered by the range
    pub fn rows(&self) -> RangeInclusive<u32> {
        self.start.row..=self.end.row
    }

    /// Columns covered by the range
    pub fn columns(&self) -> ColumnRange {
        ColumnRange {
            start: self.start.col,
            end: self.end.col,
        }
    }

    /// Grow the range so it also covers `cell`
    pub fn extend_to(&self, cell: CellRef) -> Self {
        Self::spanning(
            CellRef {
                row: self.start.row.min(cell.row),
                col: self.start.col.min(cell.col),
            },
            CellRef {
                row: self.end.row.max(cell.row),
                col: self.end.col.max(cell.col),
            },
        )
    }

    /// Iterate over all cells in the range, row by row
    pub fn cells(&self) -> CellRangeIter {
        CellRangeIter {
            range: *self,
            row: self.start.row,
            col: self.start.col,
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Split `AB12:CD24` into `("AB12", "CD24")`
pub fn split_cellrange(s: &str) -> Result<(&str, &str)> {
    let (left, right) = s
        .split_once(':')
        .ok_or_else(|| Error::InvalidAddress(format!("'{}' is not a range", s)))?;
    if left.is_empty() || right.is_empty() || right.contains(':') {
        return Err(Error::InvalidAddress(format!("'{}' is not a range", s)));
    }
    Ok((left, right))
}

/// Iterator over cells in a range
pub struct CellRangeIter {
    range: CellRange,
    row: u32,
    col: u16,
}

impl Iterator for CellRangeIter {
    type Item = CellRef;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row > self.range.end.row {
            return None;
        }

        let cell = CellRef {
            row: self.row,
            col: self.col,
        };

        self.col += 1;
        if self.col > self.range.end.col {
            self.col = self.range.start.col;
            self.row += 1;
        }

        Some(cell)
    }
}

/// A range of whole columns (e.g. `B:D`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnRange {
    start: u16,
    end: u16,
}

impl ColumnRange {
    /// Create a column range from 1-based first and last columns
    pub fn new(start: u16, end: u16) -> Result<Self> {
        if start == 0 || end > MAX_COLS || start > end {
            return Err(Error::InvalidAddress(format!(
                "invalid column range {}..={}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse `B:D`; a single column `B` is read as `B:B`
    ///
    /// Inputs with row digits (`B1:D4`) are rejected: they are cell ranges.
    pub fn parse(s: &str) -> Result<Self> {
        let (left, right) = split_column_range(s)?;
        Self::new(decode_column(left)?, decode_column(right)?)
    }

    /// First column (1-based)
    pub fn start(&self) -> u16 {
        self.start
    }

    /// Last column (1-based)
    pub fn end(&self) -> u16 {
        self.end
    }

    /// Number of columns
    pub fn len(&self) -> u16 {
        self.end - self.start + 1
    }

    /// A column range is never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check whether `col` lies inside this range
    pub fn contains(&self, col: u16) -> bool {
        (self.start..=self.end).contains(&col)
    }

    /// Iterate over column numbers
    pub fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }

    /// Restrict to `rows`, producing a cell range
    pub fn with_rows(&self, first_row: u32, last_row: u32) -> Result<CellRange> {
        CellRange::new(
            CellRef::new(first_row, self.start)?,
            CellRef::new(last_row, self.end)?,
        )
    }
}

impl fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", encode_column(self.start), encode_column(self.end))
    }
}

impl FromStr for ColumnRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Split `B:D` into `("B", "D")`
pub fn split_column_range(s: &str) -> Result<(&str, &str)> {
    if s.bytes().any(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAddress(format!(
            "'{}' is not a column range (contains row digits)",
            s
        )));
    }
    match s.split_once(':') {
        Some((left, right)) if !right.contains(':') => Ok((left, right)),
        Some(_) => Err(Error::InvalidAddress(format!(
            "'{}' is not a column range",
            s
        ))),
        None => Ok((s, s)),
    }
}

/// Split `Sheet1!A1` or `'My sheet'!A1` into the sheet name and the local part.
///
/// `$` absolute markers in the local part are dropped.
fn split_sheet_reference(s: &str) -> Option<(String, String)> {
    let bang = s.rfind('!')?;
    let (sheet, local) = (&s[..bang], &s[bang + 1..]);
    let sheet = if sheet.len() >= 2 && sheet.starts_with('\'') && sheet.ends_with('\'') {
        sheet[1..sheet.len() - 1].replace("''", "'")
    } else {
        sheet.to_string()
    };
    if sheet.is_empty() {
        return None;
    }
    Some((sheet, local.replace('$', "")))
}

fn write_sheet_name(f: &mut fmt::Formatter<'_>, sheet: &str) -> fmt::Result {
    let plain = sheet
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if plain {
        write!(f, "{}", sheet)
    } else {
        write!(f, "'{}'", sheet.replace('\'', "''"))
    }
}

/// A cell reference qualified by sheet name (`Sheet1!B4`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetCellRef {
    pub sheet: String,
    pub cell: CellRef,
}

impl SheetCellRef {
    /// Parse `Sheet1!B4`, `Sheet1!$B$4` or `'My sheet'!B4`
    pub fn parse(s: &str) -> Result<Self> {
        let (sheet, local) = split_sheet_reference(s)
            .ok_or_else(|| Error::InvalidAddress(format!("'{}' has no sheet name", s)))?;
        Ok(Self {
            sheet,
            cell: CellRef::parse(&local)?,
        })
    }
}

impl fmt::Display for SheetCellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet_name(f, &self.sheet)?;
        write!(f, "!{}", self.cell)
    }
}

/// A cell range qualified by sheet name (`Sheet1!A1:B2`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetCellRange {
    pub sheet: String,
    pub range: CellRange,
}

impl SheetCellRange {
    /// Parse `Sheet1!A1:B2`
    pub fn parse(s: &str) -> Result<Self> {
        let (sheet, local) = split_sheet_reference(s)
            .ok_or_else(|| Error::InvalidAddress(format!("'{}' has no sheet name", s)))?;
        Ok(Self {
            sheet,
            range: CellRange::parse(&local)?,
        })
    }
}

impl fmt::Display for SheetCellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet_name(f, &self.sheet)?;
        write!(f, "!{}", self.range)
    }
}

/// A column range qualified by sheet name (`Sheet1!A:B`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetColumnRange {
    pub sheet: String,
    pub columns: ColumnRange,
}

impl SheetColumnRange {
    /// Parse `Sheet1!A:B`
    pub fn parse(s: &str) -> Result<Self> {
        let (sheet, local) = split_sheet_reference(s)
            .ok_or_else(|| Error::InvalidAddress(format!("'{}' has no sheet name", s)))?;
        if !local.contains(':') {
            return Err(Error::InvalidAddress(format!(
                "'{}' is not a column range",
                s
            )));
        }
        Ok(Self {
            sheet,
            columns: ColumnRange::parse(&local)?,
        })
    }
}

impl fmt::Display for SheetColumnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet_name(f, &self.sheet)?;
        write!(f, "!{}", self.columns)
    }
}

/// Any reference string a caller may hand to a document lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Cell(CellRef),
    Range(CellRange),
    Columns(ColumnRange),
    SheetCell(SheetCellRef),
    SheetRange(SheetCellRange),
    SheetColumns(SheetColumnRange),
}

impl Reference {
    /// Classify a reference string. Anything else (e.g. a defined name) is
    /// an [`Error::InvalidAddress`].
    pub fn parse(s: &str) -> Result<Self> {
        if s.contains('!') {
            if let Ok(cell) = SheetCellRef::parse(s) {
                return Ok(Reference::SheetCell(cell));
            }
            if let Ok(range) = SheetCellRange::parse(s) {
                return Ok(Reference::SheetRange(range));
            }
            return SheetColumnRange::parse(s).map(Reference::SheetColumns);
        }
        if let Ok(cell) = CellRef::parse(s) {
            return Ok(Reference::Cell(cell));
        }
        if let Ok(range) = CellRange::parse(s) {
            return Ok(Reference::Range(range));
        }
        if s.contains(':') {
            if let Ok(columns) = ColumnRange::parse(s) {
                return Ok(Reference::Columns(columns));
            }
        }
        Err(Error::InvalidAddress(format!(
            "'{}' is not a cell, range or column reference",
            s
        )))
    }
}
