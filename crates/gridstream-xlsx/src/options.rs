//! Options for opening a document

use crate::error::{XlsxError, XlsxResult};

/// How a document is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Read an existing package; nothing is ever written back
    #[default]
    ReadOnly,
    /// Start from a blank workbook
    WriteNew,
    /// Read an existing package and write modified parts back on close
    ReadWrite,
}

impl Mode {
    /// Parse the short mode strings `"r"`, `"w"` and `"rw"`
    pub fn parse(s: &str) -> XlsxResult<Self> {
        match s {
            "r" => Ok(Mode::ReadOnly),
            "w" => Ok(Mode::WriteNew),
            "rw" | "wr" => Ok(Mode::ReadWrite),
            other => Err(XlsxError::Parse(format!("unknown open mode '{}'", other))),
        }
    }

    /// Whether documents in this mode accept mutations
    pub fn is_writable(&self) -> bool {
        !matches!(self, Mode::ReadOnly)
    }
}

/// Options for [`crate::Document::open`] and [`crate::Document::create`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Open mode
    pub mode: Mode,
    /// Keep rows in memory once they were read; writable modes always cache
    pub enable_cache: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            mode: Mode::ReadOnly,
            enable_cache: true,
        }
    }
}

impl OpenOptions {
    /// Read-only options
    pub fn read() -> Self {
        Self::default()
    }

    /// Options for editing an existing package
    pub fn read_write() -> Self {
        Self {
            mode: Mode::ReadWrite,
            ..Self::default()
        }
    }

    /// Options for a new document
    pub fn write_new() -> Self {
        Self {
            mode: Mode::WriteNew,
            ..Self::default()
        }
    }

    /// Set the mode
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the cache flag
    pub fn enable_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Cache flag in effect, forced on for writable modes
    pub fn effective_cache(&self) -> bool {
        self.enable_cache || self.mode.is_writable()
    }
}
