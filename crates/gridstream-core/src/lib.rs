//! # gridstream-core
//!
//! Format-independent model and algorithms of the gridstream spreadsheet engine.
//!
//! This crate provides:
//! - [`CellRef`], [`CellRange`] and [`ColumnRange`] - A1-style addressing
//! - [`SharedStringTable`] - The deduplicated string table text cells point into
//! - [`StyleSheet`] and [`classify`] - Style records, number formats and value typing
//! - [`Codec`] and [`Encoder`] - Conversion between stored cells and [`CellValue`]s
//! - [`RowSource`], [`WorksheetCache`] and [`TableRowIter`] - Row-by-row reading,
//!   caching and table extraction
//! - [`Workbook`], [`Worksheet`] - The document model
//!
//! ## Example
//!
//! ```rust
//! use gridstream_core::{CellRange, CellRef, CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let (sheet, mut encoder) = workbook.sheet_with_encoder(0).unwrap();
//! let a1 = CellRef::parse("A1").unwrap();
//! sheet.set_cell(encoder.encode(a1, &CellValue::from("Hello")).unwrap());
//!
//! let range = CellRange::parse("A1:C3").unwrap();
//! assert!(range.contains(&a1));
//! assert_eq!(range.relative_position(&CellRef::parse("B2").unwrap()).unwrap(), (2, 2));
//! ```

pub mod cache;
pub mod cell;
pub mod codec;
pub mod date;
pub mod error;
pub mod rows;
pub mod shared_strings;
pub mod style;
pub mod table;
pub mod workbook;
pub mod worksheet;

pub use cell::address;

// Re-exports for convenience
pub use cache::WorksheetCache;
pub use cell::{
    decode_column, encode_column, is_valid_cellname, is_valid_cellrange, is_valid_column_range,
    Cell, CellRange, CellRef, CellStore, CellValue, ColumnRange, DataType, Reference,
    SheetCellRange, SheetCellRef, SheetColumnRange,
};
pub use codec::{Codec, Encoder};
pub use date::DateSystem;
pub use error::{Error, Result};
pub use rows::{MemoryRows, RowSource, Rows, SheetRow};
pub use shared_strings::{SharedString, SharedStringTable};
pub use style::{classify, NumberFormat, StyleRecord, StyleSheet, ValueKind};
pub use table::{DataTable, TableColumn, TableOptions, TableRow, TableRowIter};
pub use workbook::{DefinedName, DefinedNameValue, Workbook};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
