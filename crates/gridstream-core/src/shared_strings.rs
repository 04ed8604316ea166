//! Shared string table
//!
//! Text cells refer to strings by index into a per-workbook table. Each entry
//! keeps the plain text and, when the source had rich runs, the original
//! `<si>` inner XML so it can be written back unchanged.

use ahash::AHashMap;

use crate::error::{Error, Result};

/// One entry of the shared string table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedString {
    /// Concatenated text of all runs
    pub unformatted: String,
    /// Inner XML of the `<si>` element, when it carried formatting
    pub formatted: Option<String>,
}

impl SharedString {
    /// Plain text entry
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            unformatted: text.into(),
            formatted: None,
        }
    }

    /// Inner `<si>` XML for this entry
    pub fn to_xml(&self) -> String {
        match &self.formatted {
            Some(xml) => xml.clone(),
            None => text_run(&self.unformatted),
        }
    }
}

/// A `<t>` element holding `text`, preserving edge whitespace
pub fn text_run(text: &str) -> String {
    let escaped = escape_xml(text);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        format!("<t xml:space=\"preserve\">{}</t>", escaped)
    } else {
        format!("<t>{}</t>", escaped)
    }
}

/// Escape text for use in XML content or attribute values
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Deduplicating, append-only string table
///
/// Indices handed out stay valid for the life of the table. Reverse lookup
/// maps text to the first index holding it.
#[derive(Debug, Clone, Default)]
pub struct SharedStringTable {
    entries: Vec<SharedString>,
    index: AHashMap<String, usize>,
    dirty: bool,
}

impl SharedStringTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first entry whose text equals `text`
    pub fn lookup(&self, text: &str) -> Option<usize> {
        self.index.get(text).copied()
    }

    /// Index of `unformatted`, adding it if it is not present yet
    ///
    /// `formatted` is only stored when a new entry is created.
    pub fn intern(&mut self, unformatted: &str, formatted: Option<String>) -> usize {
        if let Some(i) = self.lookup(unformatted) {
            return i;
        }
        self.dirty = true;
        self.append(SharedString {
            unformatted: unformatted.to_string(),
            formatted,
        })
    }

    /// Append an entry read from an existing table, keeping duplicates so
    /// stored indices stay valid
    pub fn push_loaded(&mut self, entry: SharedString) -> usize {
        self.append(entry)
    }

    fn append(&mut self, entry: SharedString) -> usize {
        let i = self.entries.len();
        self.index.entry(entry.unformatted.clone()).or_insert(i);
        self.entries.push(entry);
        i
    }

    /// Entry at `index`
    pub fn resolve(&self, index: usize) -> Result<&SharedString> {
        self.entries.get(index).ok_or(Error::IndexOutOfRange {
            table: "shared strings",
            index: index as i64,
            len: self.entries.len(),
        })
    }

    /// Resolve raw cell content (a decimal index) to an entry
    pub fn resolve_raw(&self, raw: &str) -> Result<&SharedString> {
        let index: i64 = raw.trim().parse().map_err(|_| Error::IndexOutOfRange {
            table: "shared strings",
            index: -1,
            len: self.entries.len(),
        })?;
        if index < 0 {
            return Err(Error::IndexOutOfRange {
                table: "shared strings",
                index,
                len: self.entries.len(),
            });
        }
        self.resolve(index as usize)
    }

    /// Plain text at `index`
    pub fn unformatted(&self, index: usize) -> Result<&str> {
        self.resolve(index).map(|s| s.unformatted.as_str())
    }

    /// Inner `<si>` XML at `index`
    pub fn formatted(&self, index: usize) -> Result<String> {
        self.resolve(index).map(SharedString::to_xml)
    }

    /// Iterate over entries in index order
    pub fn iter(&self) -> std::slice::Iter<'_, SharedString> {
        self.entries.iter()
    }

    /// True when entries were added since loading
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forget pending modifications (after they were written out)
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
