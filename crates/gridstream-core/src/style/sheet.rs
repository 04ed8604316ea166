//! Style records and the per-document number format table

use std::collections::BTreeMap;

use super::number_format::{builtin_format_code, builtin_format_id, classify, NumberFormat, ValueKind};
use crate::error::{Error, Result};

/// One entry of the `cellXfs` table
///
/// Only `num_fmt_id` matters for value typing; the other ids are kept so the
/// record can be written back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StyleRecord {
    pub num_fmt_id: u32,
    pub font_id: u32,
    pub fill_id: u32,
    pub border_id: u32,
    pub xf_id: Option<u32>,
    pub apply_number_format: bool,
}

impl StyleRecord {
    /// Record that only sets a number format
    pub fn with_num_fmt(num_fmt_id: u32) -> Self {
        Self {
            num_fmt_id,
            xf_id: Some(0),
            apply_number_format: num_fmt_id != NumberFormat::ID_GENERAL,
            ..Self::default()
        }
    }
}

/// Cell style records plus custom number formats of a workbook
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    cell_xfs: Vec<StyleRecord>,
    num_formats: BTreeMap<u32, String>,
    dirty: bool,
}

impl StyleSheet {
    /// Style sheet with the single default record every workbook has
    pub fn new() -> Self {
        Self {
            cell_xfs: vec![StyleRecord::with_num_fmt(NumberFormat::ID_GENERAL)],
            num_formats: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Append a record read from a styles part
    pub fn push_record(&mut self, record: StyleRecord) -> u32 {
        self.cell_xfs.push(record);
        (self.cell_xfs.len() - 1) as u32
    }

    /// Register a custom format read from a styles part
    pub fn add_number_format<S: Into<String>>(&mut self, id: u32, code: S) {
        self.num_formats.insert(id, code.into());
    }

    /// All cell style records in index order
    pub fn records(&self) -> &[StyleRecord] {
        &self.cell_xfs
    }

    /// Record at a style index
    pub fn record(&self, style_index: u32) -> Result<&StyleRecord> {
        self.cell_xfs
            .get(style_index as usize)
            .ok_or(Error::IndexOutOfRange {
                table: "cellXfs",
                index: i64::from(style_index),
                len: self.cell_xfs.len(),
            })
    }

    /// Custom number formats keyed by id
    pub fn number_formats(&self) -> &BTreeMap<u32, String> {
        &self.num_formats
    }

    /// Code for a numFmtId: built-in table first, then the custom table
    pub fn format_code(&self, num_fmt_id: u32) -> Option<&str> {
        builtin_format_code(num_fmt_id).or_else(|| self.num_formats.get(&num_fmt_id).map(String::as_str))
    }

    /// Number format a cell style index resolves to
    pub fn format_code_for(&self, style_index: u32) -> Result<NumberFormat> {
        let record = self.record(style_index)?;
        self.format_code(record.num_fmt_id)
            .map(|code| NumberFormat::new(record.num_fmt_id, code))
            .ok_or_else(|| {
                Error::UnknownStyle(format!(
                    "style {} uses numFmtId {} which is not defined",
                    style_index, record.num_fmt_id
                ))
            })
    }

    /// Value kind for a cell style; no style means `GeneralNumber`
    pub fn classify_style(&self, style_index: Option<u32>) -> Result<ValueKind> {
        match style_index {
            None => Ok(ValueKind::GeneralNumber),
            Some(index) => Ok(classify(&self.format_code_for(index)?.code)),
        }
    }

    /// Id of a format with this code, adding a custom one when needed
    pub fn ensure_number_format(&mut self, code: &str) -> u32 {
        if let Some(id) = builtin_format_id(code) {
            return id;
        }
        if let Some((&id, _)) = self.num_formats.iter().find(|(_, c)| c.as_str() == code) {
            return id;
        }
        let id = self
            .num_formats
            .keys()
            .next_back()
            .map(|&last| last + 1)
            .unwrap_or(NumberFormat::FIRST_CUSTOM_ID)
            .max(NumberFormat::FIRST_CUSTOM_ID);
        self.num_formats.insert(id, code.to_string());
        self.dirty = true;
        id
    }

    /// Index of the first record using `num_fmt_id`
    pub fn cell_xf_with_num_fmt(&self, num_fmt_id: u32) -> Option<u32> {
        self.cell_xfs
            .iter()
            .position(|r| r.num_fmt_id == num_fmt_id)
            .map(|i| i as u32)
    }

    /// Index of a record using `num_fmt_id`, adding one when needed
    pub fn ensure_cell_xf(&mut self, num_fmt_id: u32) -> u32 {
        if let Some(index) = self.cell_xf_with_num_fmt(num_fmt_id) {
            return index;
        }
        self.dirty = true;
        self.push_record(StyleRecord::with_num_fmt(num_fmt_id))
    }

    /// Style index for a format code, creating the format and record as needed
    pub fn ensure_style_for_code(&mut self, code: &str) -> u32 {
        let id = self.ensure_number_format(code);
        self.ensure_cell_xf(id)
    }

    /// True when records or formats were added since loading
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forget pending modifications
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
