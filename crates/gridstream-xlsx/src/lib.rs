//! # gridstream-xlsx
//!
//! XLSX (Office Open XML) package binding for gridstream.
//!
//! Worksheets are read row by row with a [`RowStream`] over the sheet part
//! and optionally kept in memory by the worksheet cache. Writable documents
//! regenerate the parts they changed on [`Document::close`].
//!
//! ## Example
//!
//! ```rust
//! use gridstream_xlsx::{Document, OpenOptions};
//! use gridstream_core::CellValue;
//!
//! let mut doc = Document::create(OpenOptions::write_new()).unwrap();
//! doc.set_value("Sheet1", "A1", &CellValue::from("Hello")).unwrap();
//! let package = doc.close().unwrap().unwrap();
//!
//! let mut doc = Document::open(package, OpenOptions::read()).unwrap();
//! assert_eq!(doc.cell_value("Sheet1", "A1").unwrap(), CellValue::from("Hello"));
//! ```

pub mod document;
pub mod error;
pub mod options;
pub mod package;
pub mod parts;
pub mod relationships;
pub mod stream;
pub mod template;
pub mod writer;

pub use document::{Data, Document, SheetRows};
pub use error::{XlsxError, XlsxResult};
pub use options::{Mode, OpenOptions};
pub use package::{MemoryPackage, PackageSource, PartReader, ZipPackage};
pub use stream::{RowStream, StreamState};
