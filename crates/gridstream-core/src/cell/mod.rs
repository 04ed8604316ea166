//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellRef`], [`CellRange`], [`ColumnRange`] - Addressing (e.g., "A1", "A1:B10", "B:D")
//! - [`Cell`] - A stored cell with its raw content and data-type tag
//! - [`CellValue`] - A decoded, typed cell value
//! - [`CellStore`] - Sparse storage for a worksheet's cells

pub mod address;
mod storage;
mod value;

pub use address::{
    decode_column, encode_column, is_valid_cellname, is_valid_cellrange, is_valid_column_range,
    CellRange, CellRef, ColumnRange, Reference, SheetCellRange, SheetCellRef, SheetColumnRange,
};
pub use storage::CellStore;
pub use value::{Cell, CellValue, DataType};
