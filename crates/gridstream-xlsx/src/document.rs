//! Document handle
//!
//! A [`Document`] owns the package it was opened from and the workbook
//! model read out of its workbook-level parts. Worksheet parts are not read
//! at open time; each read goes through a fresh [`RowStream`], wrapped in the
//! sheet's [`WorksheetCache`].
//!
//! Writable documents keep every change in memory. [`Document::close`]
//! regenerates the parts that changed and hands back the whole package.

use std::path::Path;

use log::{debug, warn};

use crate::error::{XlsxError, XlsxResult};
use crate::options::{Mode, OpenOptions};
use crate::package::{MemoryPackage, PackageSource, PartReader, ZipPackage, CONTENT_TYPES};
use crate::parts::content_types::{self, ContentTypes};
use crate::parts::workbook::read_workbook;
use crate::parts::{read_shared_strings, read_styles, DefinedNameEntry, SheetEntry, StylesPart};
use crate::relationships::{
    rel_type, relative_target, rels_path_for, resolve_target, Relationships,
};
use crate::stream::RowStream;
use crate::template;
use crate::writer::{shared_strings_xml, styles_xml, workbook_xml, worksheet_xml};
use gridstream_core::{
    Cell, CellRange, CellRef, CellValue, ColumnRange, DataTable, DateSystem, DefinedName,
    DefinedNameValue, Error, Reference, RowSource, SharedStringTable, StyleSheet, TableOptions,
    TableRowIter, Workbook, Worksheet, WorksheetCache, MAX_COLS, MAX_ROWS,
};

/// Rows of one sheet: the sheet's cache over a fresh stream of its part
pub type SheetRows<'a> = WorksheetCache<'a, RowStream<'a, PartReader<'a>>>;

/// Result of [`Document::get_data`]
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// A single cell or constant
    Value(CellValue),
    /// Values of a range, row by row
    Matrix(Vec<Vec<CellValue>>),
}

/// Where a worksheet lives in the package
#[derive(Debug, Clone)]
struct SheetMeta {
    sheet_id: u32,
    r_id: String,
    /// Part path, `None` for sheets that have no part yet
    path: Option<String>,
    state: Option<String>,
}

/// An open spreadsheet document
pub struct Document {
    workbook: Workbook,
    mode: Mode,
    /// `None` once closed
    package: Option<Box<dyn PackageSource>>,
    workbook_path: String,
    workbook_rels: Relationships,
    sheets: Vec<SheetMeta>,
    shared_strings_path: Option<String>,
    styles_path: Option<String>,
    raw_xfs: Vec<String>,
    content_types: Option<ContentTypes>,
    /// Defined names as read, to write untouched ones back as they were
    name_entries: Vec<DefinedNameEntry>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("mode", &self.mode)
            .field("workbook_path", &self.workbook_path)
            .field("sheets", &self.workbook.sheet_names())
            .field("closed", &self.package.is_none())
            .finish()
    }
}

impl Document {
    /// Open an existing package for reading, or for reading and writing
    pub fn open<P: PackageSource + 'static>(package: P, options: OpenOptions) -> XlsxResult<Self> {
        if options.mode == Mode::WriteNew {
            return Err(XlsxError::Parse(
                "write-new mode starts from a blank workbook, use Document::create".into(),
            ));
        }
        Self::load(Box::new(package), options)
    }

    /// Open an `.xlsx` file
    pub fn open_path<P: AsRef<Path>>(path: P, options: OpenOptions) -> XlsxResult<Self> {
        debug!("opening {}", path.as_ref().display());
        Self::open(ZipPackage::open(path)?, options)
    }

    /// Start a new document from a blank one-sheet workbook
    pub fn create(options: OpenOptions) -> XlsxResult<Self> {
        Self::load(
            Box::new(template::blank_package()),
            options.mode(Mode::WriteNew),
        )
    }

    fn load(mut package: Box<dyn PackageSource>, options: OpenOptions) -> XlsxResult<Self> {
        let workbook_path = if package.has_part("_rels/.rels") {
            let root_rels = Relationships::parse(&package.read_part("_rels/.rels")?)?;
            root_rels
                .find_type(rel_type::OFFICE_DOCUMENT)
                .map(|r| resolve_target("", &r.target))
                .unwrap_or_else(|| "xl/workbook.xml".to_string())
        } else {
            "xl/workbook.xml".to_string()
        };
        if !package.has_part(&workbook_path) {
            return Err(XlsxError::MissingPart(workbook_path));
        }
        let workbook_part = read_workbook(&package.read_part(&workbook_path)?)?;

        let (dir, rels_path) = rels_path_for(&workbook_path);
        let workbook_rels = if package.has_part(&rels_path) {
            Relationships::parse(&package.read_part(&rels_path)?)?
        } else {
            warn!("{} has no relationships part", workbook_path);
            Relationships::new()
        };

        let part_of = |rel: &str, package: &dyn PackageSource| {
            workbook_rels
                .find_type(rel)
                .map(|r| resolve_target(&dir, &r.target))
                .filter(|path| package.has_part(path))
        };

        let shared_strings_path = part_of(rel_type::SHARED_STRINGS, package.as_ref());
        let sst = match &shared_strings_path {
            Some(path) => read_shared_strings(&package.read_part(path)?)?,
            None => SharedStringTable::new(),
        };

        let styles_path = part_of(rel_type::STYLES, package.as_ref());
        let styles = match &styles_path {
            Some(path) => read_styles(&package.read_part(path)?)?,
            None => StylesPart {
                sheet: StyleSheet::new(),
                raw_xfs: Vec::new(),
            },
        };

        let content_types = if package.has_part(CONTENT_TYPES) {
            Some(ContentTypes::parse(&package.read_part(CONTENT_TYPES)?)?)
        } else {
            None
        };

        let mut workbook = Workbook::from_parts(
            sst,
            styles.sheet,
            DateSystem::from_date1904(workbook_part.date1904),
        );

        let cache = options.effective_cache();
        let mut sheets = Vec::with_capacity(workbook_part.sheets.len());
        for entry in &workbook_part.sheets {
            let path = workbook_rels
                .get(&entry.r_id)
                .map(|r| resolve_target(&dir, &r.target))
                .filter(|path| package.has_part(path));
            if path.is_none() {
                warn!(
                    "worksheet '{}' ({}) has no part, reading it as empty",
                    entry.name, entry.r_id
                );
            }
            workbook.push_worksheet(Worksheet::from_part(entry.name.as_str(), cache))?;
            sheets.push(SheetMeta {
                sheet_id: entry.sheet_id,
                r_id: entry.r_id.clone(),
                path,
                state: entry.state.clone(),
            });
        }

        for entry in &workbook_part.defined_names {
            workbook.define_name(DefinedName {
                name: entry.name.clone(),
                local_sheet: entry.local_sheet_id,
                value: DefinedNameValue::parse(&entry.value),
            });
        }

        debug!(
            "opened document ({:?}, cache: {}): {} sheets, {} shared strings, {} defined names",
            options.mode,
            cache,
            workbook.sheet_count(),
            workbook.shared_strings().len(),
            workbook.defined_names().len()
        );

        Ok(Self {
            workbook,
            mode: options.mode,
            package: Some(package),
            workbook_path,
            workbook_rels,
            sheets,
            shared_strings_path,
            styles_path,
            raw_xfs: styles.raw_xfs,
            content_types,
            name_entries: workbook_part.defined_names,
        })
    }

    fn check_open(&self) -> XlsxResult<()> {
        match self.package {
            Some(_) => Ok(()),
            None => Err(XlsxError::Closed),
        }
    }

    fn ensure_writable(&self) -> XlsxResult<()> {
        if self.package.is_none() {
            return Err(Error::NotWritable("document is closed".into()).into());
        }
        if !self.mode.is_writable() {
            return Err(Error::NotWritable("document was opened read-only".into()).into());
        }
        Ok(())
    }

    fn sheet_position(&self, sheet: &str) -> XlsxResult<usize> {
        self.check_open()?;
        Ok(self.workbook.require_sheet(sheet)?)
    }

    // ==================== Metadata ====================

    /// Open mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether mutations are accepted (never after close)
    pub fn is_writable(&self) -> bool {
        self.package.is_some() && self.mode.is_writable()
    }

    /// True once [`Document::close`] was called
    pub fn is_closed(&self) -> bool {
        self.package.is_none()
    }

    /// The workbook model
    pub fn workbook(&self) -> XlsxResult<&Workbook> {
        self.check_open()?;
        Ok(&self.workbook)
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> XlsxResult<Vec<String>> {
        self.check_open()?;
        Ok(self
            .workbook
            .sheet_names()
            .into_iter()
            .map(String::from)
            .collect())
    }

    /// Number of sheets
    pub fn sheet_count(&self) -> XlsxResult<usize> {
        self.check_open()?;
        Ok(self.workbook.sheet_count())
    }

    /// Whether serial dates count from 1904
    pub fn is_date1904(&self) -> XlsxResult<bool> {
        self.check_open()?;
        Ok(self.workbook.date_system().is_1904())
    }

    /// Defined names of the workbook
    pub fn defined_names(&self) -> XlsxResult<&[DefinedName]> {
        self.check_open()?;
        Ok(self.workbook.defined_names())
    }

    /// Shared string table
    pub fn shared_strings(&self) -> XlsxResult<&SharedStringTable> {
        self.check_open()?;
        Ok(self.workbook.shared_strings())
    }

    /// Style records and number formats
    pub fn styles(&self) -> XlsxResult<&StyleSheet> {
        self.check_open()?;
        Ok(self.workbook.styles())
    }

    /// Names of all parts in the package
    pub fn part_names(&self) -> XlsxResult<Vec<String>> {
        let package = self.package.as_ref().ok_or(XlsxError::Closed)?;
        Ok(package.part_names())
    }

    /// Whether the document has a shared string table
    pub fn has_shared_strings(&self) -> XlsxResult<bool> {
        self.check_open()?;
        Ok(self.shared_strings_path.is_some() || !self.workbook.shared_strings().is_empty())
    }

    /// Declared dimension of a sheet, or its used range once cached
    pub fn sheet_dimension(&mut self, sheet: &str) -> XlsxResult<Option<CellRange>> {
        let index = self.sheet_position(sheet)?;
        if let Some(dimension) = self.workbook.worksheet(index).and_then(Worksheet::dimension) {
            return Ok(Some(dimension));
        }
        // opening a stream reads up to <sheetData>, past any <dimension>
        let rows = self.sheet_rows(index)?;
        Ok(rows.worksheet().dimension())
    }

    // ==================== Reading ====================

    fn sheet_rows(&mut self, index: usize) -> XlsxResult<SheetRows<'_>> {
        let package = self.package.as_mut().ok_or(XlsxError::Closed)?;
        let path = self.sheets.get(index).and_then(|m| m.path.as_deref());
        let (worksheet, codec) = self.workbook.sheet_with_codec(index)?;

        let stream = match path {
            Some(path) if !worksheet.is_fully_cached() => {
                debug!("streaming '{}' from {}", worksheet.name(), path);
                let stream = RowStream::open(package.open_part(path)?, codec)?;
                if worksheet.dimension().is_none() {
                    worksheet.set_dimension(stream.dimension());
                }
                Some(stream)
            }
            _ => None,
        };
        Ok(WorksheetCache::new(worksheet, codec, stream))
    }

    /// Rows of a sheet
    pub fn rows(&mut self, sheet: &str) -> XlsxResult<SheetRows<'_>> {
        let index = self.sheet_position(sheet)?;
        self.sheet_rows(index)
    }

    /// Table rows of a sheet
    pub fn table_rows(
        &mut self,
        sheet: &str,
        options: TableOptions,
    ) -> XlsxResult<TableRowIter<SheetRows<'_>>> {
        Ok(TableRowIter::new(self.rows(sheet)?, options))
    }

    /// A whole table of a sheet, column by column
    pub fn read_table(&mut self, sheet: &str, options: TableOptions) -> XlsxResult<DataTable> {
        Ok(self.table_rows(sheet, options)?.into_data_table()?)
    }

    /// Stored cell at a reference (`"B2"`)
    pub fn cell(&mut self, sheet: &str, reference: &str) -> XlsxResult<Option<Cell>> {
        let reference = CellRef::parse(reference)?;
        let mut rows = self.rows(sheet)?;
        Ok(rows
            .row(reference.row())?
            .and_then(|row| row.cell(reference.column()).cloned()))
    }

    /// Decoded value at a reference (`"B2"`)
    pub fn cell_value(&mut self, sheet: &str, reference: &str) -> XlsxResult<CellValue> {
        let reference = CellRef::parse(reference)?;
        self.value_at(sheet, &reference)
    }

    fn value_at(&mut self, sheet: &str, reference: &CellRef) -> XlsxResult<CellValue> {
        Ok(self.rows(sheet)?.cell(reference)?)
    }

    /// Decoded values of a range (`"A1:C3"`), row by row
    pub fn range_values(&mut self, sheet: &str, range: &str) -> XlsxResult<Vec<Vec<CellValue>>> {
        let range = CellRange::parse(range)?;
        self.values_in(sheet, &range)
    }

    fn values_in(&mut self, sheet: &str, range: &CellRange) -> XlsxResult<Vec<Vec<CellValue>>> {
        Ok(self.rows(sheet)?.range(range)?)
    }

    /// Decoded values of whole columns (`"A:B"`), row by row
    ///
    /// Rows run from the first to the last row with a value in the columns.
    pub fn column_values(&mut self, sheet: &str, columns: &str) -> XlsxResult<Vec<Vec<CellValue>>> {
        let columns = ColumnRange::parse(columns)?;
        self.values_in_columns(sheet, columns)
    }

    fn values_in_columns(
        &mut self,
        sheet: &str,
        columns: ColumnRange,
    ) -> XlsxResult<Vec<Vec<CellValue>>> {
        let mut rows = self.rows(sheet)?;
        let mut found: Vec<(u32, Vec<CellValue>)> = Vec::new();
        while let Some(row) = rows.next_row()? {
            let values: Vec<CellValue> = columns.iter().map(|c| row.value(c).clone()).collect();
            if values.iter().any(|v| !v.is_empty()) {
                found.push((row.row_number(), values));
            }
        }

        let Some(&(first, _)) = found.first() else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        let mut next = first;
        for (row, values) in found {
            while next < row {
                out.push(vec![CellValue::Empty; columns.len() as usize]);
                next += 1;
            }
            out.push(values);
            next = row + 1;
        }
        Ok(out)
    }

    /// Resolve a sheet-qualified reference (`Sheet1!A1`, `Sheet1!A1:B2`,
    /// `Sheet1!A:B`) or a defined name (`Total`, `Sheet1!LocalName`)
    pub fn get_data(&mut self, reference: &str) -> XlsxResult<Data> {
        self.check_open()?;
        let parsed = Reference::parse(reference);

        match &parsed {
            Ok(Reference::SheetCell(r)) => {
                return Ok(Data::Value(self.value_at(&r.sheet, &r.cell)?))
            }
            Ok(Reference::SheetRange(r)) => {
                return Ok(Data::Matrix(self.values_in(&r.sheet, &r.range)?))
            }
            Ok(Reference::SheetColumns(r)) => {
                return Ok(Data::Matrix(self.values_in_columns(&r.sheet, r.columns)?))
            }
            _ => {}
        }

        if let Some(value) = self.lookup_name(reference)? {
            return match value {
                DefinedNameValue::Cell(r) => Ok(Data::Value(self.value_at(&r.sheet, &r.cell)?)),
                DefinedNameValue::Range(r) => {
                    Ok(Data::Matrix(self.values_in(&r.sheet, &r.range)?))
                }
                DefinedNameValue::Formula(text) => Ok(Data::Value(constant_value(&text))),
            };
        }

        match parsed {
            Ok(_) => Err(Error::invalid_address(format!(
                "'{}' needs a sheet name, e.g. Sheet1!{}",
                reference, reference
            ))
            .into()),
            Err(_) => Err(Error::invalid_address(format!(
                "'{}' is neither a reference nor a defined name",
                reference
            ))
            .into()),
        }
    }

    fn lookup_name(&self, reference: &str) -> XlsxResult<Option<DefinedNameValue>> {
        let (sheet, name) = match reference.rsplit_once('!') {
            Some((sheet, name)) => {
                let sheet = sheet
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                    .map(|s| s.replace("''", "'"))
                    .unwrap_or_else(|| sheet.to_string());
                (Some(self.workbook.require_sheet(&sheet)?), name)
            }
            None => (None, reference),
        };

        let found = match sheet {
            Some(index) => self
                .workbook
                .defined_names()
                .iter()
                .find(|dn| dn.local_sheet == Some(index) && dn.name.eq_ignore_ascii_case(name)),
            None => self.workbook.defined_name(name, None),
        };
        Ok(found.map(|dn| dn.value.clone()))
    }

    // ==================== Writing ====================

    /// Read the rest of a sheet into memory before it is changed
    fn fill_sheet(&mut self, index: usize) -> XlsxResult<()> {
        let mut rows = self.sheet_rows(index)?;
        rows.fill()?;
        Ok(())
    }

    /// Set the value of a cell
    pub fn set_value(&mut self, sheet: &str, reference: &str, value: &CellValue) -> XlsxResult<()> {
        self.ensure_writable()?;
        let reference = CellRef::parse(reference)?;
        let index = self.workbook.require_sheet(sheet)?;
        self.fill_sheet(index)?;

        let (worksheet, mut encoder) = self.workbook.sheet_with_encoder(index)?;
        let cell = encoder.encode(reference, value)?;
        worksheet.set_cell(cell);
        Ok(())
    }

    /// Add an empty sheet; a unique `SheetN` name is used when none is given
    pub fn add_sheet(&mut self, name: Option<&str>) -> XlsxResult<usize> {
        self.ensure_writable()?;
        let index = self.workbook.add_sheet(name)?;
        let sheet_id = self.sheets.iter().map(|m| m.sheet_id).max().unwrap_or(0) + 1;
        self.sheets.push(SheetMeta {
            sheet_id,
            r_id: String::new(),
            path: None,
            state: None,
        });
        debug!("added sheet #{} (sheetId {})", index, sheet_id);
        Ok(index)
    }

    /// Rename a sheet; defined names pointing at it follow
    pub fn rename_sheet(&mut self, sheet: &str, new_name: &str) -> XlsxResult<()> {
        self.ensure_writable()?;
        let index = self.workbook.require_sheet(sheet)?;
        self.workbook.rename_sheet(index, new_name)?;
        Ok(())
    }

    /// Write a table with a header row of `labels` and one vector of values
    /// per column, its top-left corner at `anchor`
    pub fn write_table<S: AsRef<str>>(
        &mut self,
        sheet: &str,
        labels: &[S],
        columns: &[Vec<CellValue>],
        anchor: &str,
    ) -> XlsxResult<()> {
        self.ensure_writable()?;
        let anchor = CellRef::parse(anchor)?;
        let index = self.workbook.require_sheet(sheet)?;

        if labels.len() != columns.len() {
            return Err(Error::InvalidTableConfig(format!(
                "{} labels for {} columns",
                labels.len(),
                columns.len()
            ))
            .into());
        }
        let height = columns.first().map_or(0, Vec::len);
        if columns.iter().any(|c| c.len() != height) {
            return Err(
                Error::InvalidTableConfig("columns must all have the same length".into()).into(),
            );
        }
        let last_row = u64::from(anchor.row()) + height as u64;
        let last_col = u64::from(anchor.column()) + columns.len() as u64 - 1;
        if last_row > u64::from(MAX_ROWS) || (!columns.is_empty() && last_col > u64::from(MAX_COLS))
        {
            return Err(Error::invalid_address(format!(
                "a {}x{} table at {} does not fit in the sheet",
                height + 1,
                columns.len(),
                anchor
            ))
            .into());
        }

        self.fill_sheet(index)?;
        let (worksheet, mut encoder) = self.workbook.sheet_with_encoder(index)?;
        // nothing is interned or stored unless every value can be
        for (c, values) in columns.iter().enumerate() {
            let col = anchor.column() + c as u16;
            for (r, value) in values.iter().enumerate() {
                encoder.check(CellRef::new(anchor.row() + 1 + r as u32, col)?, value)?;
            }
        }
        let mut cells = Vec::with_capacity(columns.len() * (height + 1));
        for (c, (label, values)) in labels.iter().zip(columns).enumerate() {
            let col = anchor.column() + c as u16;
            let header = CellRef::new(anchor.row(), col)?;
            cells.push(encoder.encode(header, &CellValue::text(label.as_ref()))?);
            for (r, value) in values.iter().enumerate() {
                let reference = CellRef::new(anchor.row() + 1 + r as u32, col)?;
                cells.push(encoder.encode(reference, value)?);
            }
        }
        for cell in cells {
            worksheet.set_cell(cell);
        }
        debug!(
            "wrote {} columns x {} rows to '{}' at {}",
            columns.len(),
            height,
            worksheet.name(),
            anchor
        );
        Ok(())
    }

    // ==================== Lifecycle ====================

    /// Close the document
    ///
    /// Read-only documents give `None`. Writable documents give the package
    /// with every changed part regenerated; the other parts are copied as
    /// they were.
    ///
    /// A failed write-back leaves the document open with its edits, so the
    /// caller can still read them or try again.
    pub fn close(&mut self) -> XlsxResult<Option<MemoryPackage>> {
        self.check_open()?;
        if !self.mode.is_writable() {
            self.package = None;
            debug!("closed read-only document");
            return Ok(None);
        }

        let out = self.write_back()?;
        self.package = None;
        Ok(Some(out))
    }

    /// Build the output package; `self` is left as it was
    fn write_back(&mut self) -> XlsxResult<MemoryPackage> {
        let package = self.package.as_mut().ok_or(XlsxError::Closed)?;
        let mut out = MemoryPackage::new();
        for name in package.part_names() {
            if name.ends_with('/') {
                continue;
            }
            let bytes = package.read_part(&name)?;
            out.insert(name, bytes);
        }

        let (dir, rels_path) = rels_path_for(&self.workbook_path);
        let mut rels = self.workbook_rels.clone();
        let mut rels_changed = false;
        let mut types = self.content_types.clone().unwrap_or_default();
        let mut types_changed = false;
        let mut sheets = self.sheets.clone();
        let mut written = 0usize;

        for (index, meta) in sheets.iter_mut().enumerate() {
            let worksheet = self
                .workbook
                .worksheet(index)
                .ok_or_else(|| Error::SheetNotFound(format!("#{}", index)))?;
            if meta.path.is_some() && !worksheet.is_dirty() {
                continue;
            }
            let path = match &meta.path {
                Some(path) => path.clone(),
                None => {
                    let path = next_sheet_path(&out, &dir);
                    meta.r_id =
                        rels.add_relationship(rel_type::WORKSHEET, &relative_target(&dir, &path));
                    rels_changed = true;
                    types_changed |= types.add_override(&path, content_types::WORKSHEET);
                    meta.path = Some(path.clone());
                    path
                }
            };
            let xml = worksheet_xml(out.get(&path), worksheet)?;
            out.insert(path, xml);
            written += 1;
        }

        let sst = self.workbook.shared_strings();
        if sst.is_dirty() {
            let path = match &self.shared_strings_path {
                Some(path) => path.clone(),
                None => {
                    let path = join_part(&dir, "sharedStrings.xml");
                    rels.add_relationship(rel_type::SHARED_STRINGS, &relative_target(&dir, &path));
                    rels_changed = true;
                    types_changed |= types.add_override(&path, content_types::SHARED_STRINGS);
                    path
                }
            };
            out.insert(path, shared_strings_xml(sst));
            written += 1;
        }

        let styles = self.workbook.styles();
        if styles.is_dirty() {
            let path = match &self.styles_path {
                Some(path) => path.clone(),
                None => {
                    let path = join_part(&dir, "styles.xml");
                    rels.add_relationship(rel_type::STYLES, &relative_target(&dir, &path));
                    rels_changed = true;
                    types_changed |= types.add_override(&path, content_types::STYLES);
                    path
                }
            };
            let part = StylesPart {
                sheet: styles.clone(),
                raw_xfs: self.raw_xfs.clone(),
            };
            let original = out
                .get(&path)
                .unwrap_or(template::STYLES.as_bytes())
                .to_vec();
            out.insert(path, styles_xml(&original, &part)?);
            written += 1;
        }

        let sheet_entries: Vec<SheetEntry> = sheets
            .iter()
            .zip(self.workbook.worksheets())
            .map(|(meta, ws)| SheetEntry {
                name: ws.name().to_string(),
                sheet_id: meta.sheet_id,
                r_id: meta.r_id.clone(),
                state: meta.state.clone(),
            })
            .collect();
        let name_entries = self.defined_name_entries();
        let workbook = workbook_xml(
            out.get(&self.workbook_path)
                .unwrap_or(template::WORKBOOK.as_bytes()),
            &sheet_entries,
            &name_entries,
        )?;
        out.insert(self.workbook_path.clone(), workbook);

        if rels_changed {
            out.insert(rels_path, rels.to_xml());
        }
        if types_changed {
            out.insert(CONTENT_TYPES, types.to_xml());
        }

        debug!(
            "closed document: {} parts regenerated, {} parts in package",
            written + 1,
            out.len()
        );
        Ok(out)
    }

    /// Defined names as `<definedName>` entries, untouched ones keeping
    /// their original text
    fn defined_name_entries(&self) -> Vec<DefinedNameEntry> {
        self.workbook
            .defined_names()
            .iter()
            .map(|dn| {
                let original = self.name_entries.iter().find(|e| {
                    e.local_sheet_id == dn.local_sheet && e.name.eq_ignore_ascii_case(&dn.name)
                });
                let value = match original {
                    Some(e) if DefinedNameValue::parse(&e.value) == dn.value => e.value.clone(),
                    _ => dn.value.to_string(),
                };
                DefinedNameEntry {
                    name: dn.name.clone(),
                    local_sheet_id: dn.local_sheet,
                    hidden: original.map_or(false, |e| e.hidden),
                    value,
                }
            })
            .collect()
    }
}

fn join_part(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

/// First free `worksheets/sheetN.xml` path
fn next_sheet_path(package: &MemoryPackage, dir: &str) -> String {
    (1..)
        .map(|n| join_part(dir, &format!("worksheets/sheet{}.xml", n)))
        .find(|path| package.get(path).is_none())
        .unwrap_or_default()
}

/// Value of a defined name that is a constant rather than a reference
fn constant_value(text: &str) -> CellValue {
    let text = text.trim();
    if let Ok(n) = text.parse::<f64>() {
        return CellValue::Float(n);
    }
    match text {
        "TRUE" => return CellValue::Bool(true),
        "FALSE" => return CellValue::Bool(false),
        _ => {}
    }
    match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(quoted) => CellValue::text(quoted.replace("\"\"", "\"")),
        None => CellValue::text(text),
    }
}
