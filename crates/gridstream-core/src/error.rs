//! Error types for gridstream-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gridstream-core
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed cell, range or column-range string, or a row/column outside sheet bounds
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Shared string or style index outside its table
    #[error("Index {index} out of range for {table} (len: {len})")]
    IndexOutOfRange {
        table: &'static str,
        index: i64,
        len: usize,
    },

    /// Style or number format id that cannot be resolved
    #[error("Unknown style: {0}")]
    UnknownStyle(String),

    /// A non-caching stream was asked for a row it already passed
    #[error("Row {requested} is no longer available (stream is positioned after row {position})")]
    NotAvailable { requested: u32, position: u32 },

    /// A whole-sheet read that needs the cache, on a sheet read without it
    #[error("Caching is disabled: {0}")]
    CacheDisabled(String),

    /// Mutation attempted on a read-only or closed document
    #[error("Document is not writable: {0}")]
    NotWritable(String),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Table extraction options that cannot be satisfied
    #[error("Invalid table configuration: {0}")]
    InvalidTableConfig(String),

    /// No table data found where one was expected
    #[error("No table data found: {0}")]
    TableNotFound(String),

    /// Raw content that does not match its data-type tag, or unreadable source XML
    #[error("Malformed content: {0}")]
    Malformed(String),

    /// IO error from an underlying row source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an [`Error::InvalidAddress`] from a message
    pub fn invalid_address<S: Into<String>>(msg: S) -> Self {
        Error::InvalidAddress(msg.into())
    }

    /// Create an [`Error::Malformed`] from a message
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::Malformed(msg.into())
    }
}
