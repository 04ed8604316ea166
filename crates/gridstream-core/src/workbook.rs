//! Workbook type - worksheets plus the tables they share

use crate::cell::{SheetCellRange, SheetCellRef};
use crate::codec::{Codec, Encoder};
use crate::date::DateSystem;
use crate::error::{Error, Result};
use crate::shared_strings::SharedStringTable;
use crate::style::StyleSheet;
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// What a defined name refers to
#[derive(Debug, Clone, PartialEq)]
pub enum DefinedNameValue {
    /// A single cell, e.g. `Sheet1!$B$4`
    Cell(SheetCellRef),
    /// A range, e.g. `Sheet1!$A$2:$B$4`
    Range(SheetCellRange),
    /// A constant or formula, kept as text
    Formula(String),
}

impl DefinedNameValue {
    /// Classify the text of a `<definedName>` element
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Ok(cell) = SheetCellRef::parse(text) {
            return DefinedNameValue::Cell(cell);
        }
        if let Ok(range) = SheetCellRange::parse(text) {
            return DefinedNameValue::Range(range);
        }
        DefinedNameValue::Formula(text.to_string())
    }
}

impl std::fmt::Display for DefinedNameValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinedNameValue::Cell(c) => write!(f, "{}", c),
            DefinedNameValue::Range(r) => write!(f, "{}", r),
            DefinedNameValue::Formula(s) => write!(f, "{}", s),
        }
    }
}

/// A defined name (`<definedName>`)
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedName {
    /// The name; lookups ignore case
    pub name: String,
    /// Index of the sheet the name is local to, `None` for workbook scope
    pub local_sheet: Option<usize>,
    /// What the name refers to
    pub value: DefinedNameValue,
}

/// A workbook: ordered worksheets and the tables their cells share
#[derive(Debug)]
pub struct Workbook {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet>,
    /// Shared string table
    shared_strings: SharedStringTable,
    /// Cell styles and number formats
    styles: StyleSheet,
    /// Epoch for serial dates
    date_system: DateSystem,
    /// Defined names
    defined_names: Vec<DefinedName>,
}

impl Workbook {
    /// Create a new workbook with one empty worksheet
    pub fn new() -> Self {
        let mut wb = Self::empty();
        wb.worksheets.push(Worksheet::new("Sheet1"));
        wb.styles = StyleSheet::new();
        wb
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            shared_strings: SharedStringTable::new(),
            styles: StyleSheet::default(),
            date_system: DateSystem::V1900,
            defined_names: Vec::new(),
        }
    }

    /// Assemble a workbook from tables read out of a package
    pub fn from_parts(
        shared_strings: SharedStringTable,
        styles: StyleSheet,
        date_system: DateSystem,
    ) -> Self {
        Self {
            worksheets: Vec::new(),
            shared_strings,
            styles,
            date_system,
            defined_names: Vec::new(),
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Names of all worksheets in order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(Worksheet::name).collect()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get the index of a worksheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    /// Index of a worksheet by name, or [`Error::SheetNotFound`]
    pub fn require_sheet(&self, name: &str) -> Result<usize> {
        self.sheet_index(name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Append a worksheet, checking its name
    pub fn push_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        self.worksheets.push(worksheet);
        Ok(self.worksheets.len() - 1)
    }

    /// Add a new, empty worksheet; a unique `SheetN` name is used when none is given
    pub fn add_sheet(&mut self, name: Option<&str>) -> Result<usize> {
        let name = match name {
            Some(n) => n.to_string(),
            None => self.generate_sheet_name(),
        };
        self.push_worksheet(Worksheet::new(name))
    }

    /// Rename a worksheet
    pub fn rename_sheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetNotFound(format!("#{}", index)));
        }

        self.validate_sheet_name_excluding(new_name, Some(index))?;

        let old = self.worksheets[index].name().to_string();
        self.worksheets[index].set_name(new_name);
        self.rename_in_defined_names(&old, new_name);
        Ok(())
    }

    fn rename_in_defined_names(&mut self, old: &str, new: &str) {
        for dn in &mut self.defined_names {
            match &mut dn.value {
                DefinedNameValue::Cell(c) if c.sheet == old => c.sheet = new.to_string(),
                DefinedNameValue::Range(r) if r.sheet == old => r.sheet = new.to_string(),
                _ => {}
            }
        }
    }

    /// Shared string table
    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.shared_strings
    }

    /// Mutable shared string table
    pub fn shared_strings_mut(&mut self) -> &mut SharedStringTable {
        &mut self.shared_strings
    }

    /// Styles and number formats
    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Mutable styles and number formats
    pub fn styles_mut(&mut self) -> &mut StyleSheet {
        &mut self.styles
    }

    /// Date system for serial dates
    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    /// Change the date system
    pub fn set_date_system(&mut self, date_system: DateSystem) {
        self.date_system = date_system;
    }

    /// Decoder over this workbook's tables
    pub fn codec(&self) -> Codec<'_> {
        Codec::new(&self.shared_strings, &self.styles, self.date_system)
    }

    /// A worksheet together with a decoder, borrowed at the same time
    pub fn sheet_with_codec(&mut self, index: usize) -> Result<(&mut Worksheet, Codec<'_>)> {
        let sheet = self
            .worksheets
            .get_mut(index)
            .ok_or_else(|| Error::SheetNotFound(format!("#{}", index)))?;
        let codec = Codec::new(&self.shared_strings, &self.styles, self.date_system);
        Ok((sheet, codec))
    }

    /// A worksheet together with an encoder, borrowed at the same time
    pub fn sheet_with_encoder(&mut self, index: usize) -> Result<(&mut Worksheet, Encoder<'_>)> {
        let sheet = self
            .worksheets
            .get_mut(index)
            .ok_or_else(|| Error::SheetNotFound(format!("#{}", index)))?;
        let encoder = Encoder::new(&mut self.shared_strings, &mut self.styles, self.date_system);
        Ok((sheet, encoder))
    }

    // ==================== Defined Names ====================

    /// Add a defined name read from a package or created by the caller
    ///
    /// A name already defined in the same scope is replaced.
    pub fn define_name(&mut self, name: DefinedName) {
        let lower = name.name.to_lowercase();
        self.defined_names
            .retain(|dn| !(dn.local_sheet == name.local_sheet && dn.name.to_lowercase() == lower));
        self.defined_names.push(name);
    }

    /// All defined names
    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    /// Look a name up, preferring one local to `sheet` over a workbook-wide one
    pub fn defined_name(&self, name: &str, sheet: Option<usize>) -> Option<&DefinedName> {
        let lower = name.to_lowercase();
        let matches = |dn: &&DefinedName| dn.name.to_lowercase() == lower;
        sheet
            .and_then(|s| {
                self.defined_names
                    .iter()
                    .filter(matches)
                    .find(|dn| dn.local_sheet == Some(s))
            })
            .or_else(|| {
                self.defined_names
                    .iter()
                    .filter(matches)
                    .find(|dn| dn.local_sheet.is_none())
            })
    }

    /// Validate a sheet name
    pub fn validate_sheet_name(&self, name: &str) -> Result<()> {
        self.validate_sheet_name_excluding(name, None)
    }

    /// Validate a sheet name, optionally excluding a sheet from duplicate check
    fn validate_sheet_name_excluding(
        &self,
        name: &str,
        exclude_index: Option<usize>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return Err(Error::InvalidSheetName(
                "Sheet name cannot start or end with an apostrophe".into(),
            ));
        }

        // case-insensitive
        let name_lower = name.to_lowercase();
        for (i, ws) in self.worksheets.iter().enumerate() {
            if Some(i) != exclude_index && ws.name().to_lowercase() == name_lower {
                return Err(Error::DuplicateSheetName(name.into()));
            }
        }

        Ok(())
    }

    /// Generate a unique sheet name
    fn generate_sheet_name(&self) -> String {
        let mut n = self.worksheets.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.validate_sheet_name(&name).is_ok() {
                return name;
            }
            n += 1;
        }
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}
