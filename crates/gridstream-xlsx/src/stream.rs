//! Row stream over a worksheet part
//!
//! [`RowStream`] reads `<row>` elements one at a time with quick-xml and
//! decodes their cells as it goes; the part is never held in memory as a
//! whole. The closing `</sheetData>` ends the scan, so whatever follows it
//! in the part is never read.

use std::io::BufRead;

use log::{debug, trace, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::parts::decode_excel_escapes;
use gridstream_core::{
    Cell, CellRange, CellRef, Codec, DataType, Error, Result, RowSource, SheetRow, MAX_ROWS,
};

/// Where the stream stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// `<sheetData>` was not reached yet
    NotStarted,
    /// A row is read ahead and will be handed out next
    Positioned,
    /// No rows are left; the reader was released
    Exhausted,
}

fn xml_error(e: quick_xml::Error) -> Error {
    Error::malformed(format!("worksheet XML: {}", e))
}

fn attr_string(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(xml_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// `<dimension ref>` may name a single cell or a range
fn parse_dimension(text: &str) -> Option<CellRange> {
    let parsed = if text.contains(':') {
        CellRange::parse(text)
    } else {
        CellRef::parse(text).map(CellRange::single)
    };
    match parsed {
        Ok(range) => Some(range),
        Err(e) => {
            warn!("ignoring dimension '{}': {}", text, e);
            None
        }
    }
}

/// A `<c>` element as read, before typing
#[derive(Default)]
struct RawCell {
    reference: Option<String>,
    data_type: Option<String>,
    style: Option<u32>,
    value: Option<String>,
    inline: Option<String>,
    formula: Option<String>,
}

impl RawCell {
    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let mut cell = RawCell::default();
        for attr in e.attributes().flatten() {
            let value = attr.unescape_value().map_err(xml_error)?;
            match attr.key.as_ref() {
                b"r" => cell.reference = Some(value.into_owned()),
                b"t" => cell.data_type = Some(value.into_owned()),
                b"s" => {
                    cell.style = Some(value.parse().map_err(|_| {
                        Error::malformed(format!("style index '{}' is not a number", value))
                    })?)
                }
                _ => {}
            }
        }
        Ok(cell)
    }

    /// Read `<v>`, `<f>` and `<is>` up to the closing `</c>`
    fn read_body<R: BufRead>(&mut self, reader: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<()> {
        #[derive(PartialEq)]
        enum In {
            Nothing,
            Value,
            Formula,
            InlineText,
        }
        let mut inside = In::Nothing;
        let mut in_phonetic = false;

        loop {
            buf.clear();
            match reader.read_event_into(buf).map_err(xml_error)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"v" => inside = In::Value,
                    b"f" => inside = In::Formula,
                    b"rPh" => in_phonetic = true,
                    b"t" if !in_phonetic => {
                        inside = In::InlineText;
                        self.inline.get_or_insert_with(String::new);
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    let text = e.unescape().map_err(xml_error)?;
                    match inside {
                        In::Value => self.value.get_or_insert_with(String::new).push_str(&text),
                        In::Formula => self.formula.get_or_insert_with(String::new).push_str(&text),
                        In::InlineText => {
                            self.inline.get_or_insert_with(String::new).push_str(&text)
                        }
                        In::Nothing => {}
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"c" => return Ok(()),
                    b"rPh" => in_phonetic = false,
                    b"v" | b"f" | b"t" => inside = In::Nothing,
                    _ => {}
                },
                Event::Eof => return Err(Error::malformed("worksheet ends inside a cell")),
                _ => {}
            }
        }
    }

    /// Type the cell; `column` is used when the element has no `r`
    fn into_cell(self, row: u32, column: u16) -> Result<Cell> {
        let reference = match &self.reference {
            Some(r) => CellRef::parse(r)?,
            None => CellRef::new(row, column)?,
        };

        let mut data_type = match DataType::from_attr(self.data_type.as_deref()) {
            Some(t) => t,
            None => {
                warn!(
                    "unknown cell type '{}' at {}, reading it as text",
                    self.data_type.as_deref().unwrap_or_default(),
                    reference
                );
                DataType::InlineString
            }
        };

        let raw = match (data_type, self.inline, self.value) {
            (DataType::InlineString, Some(text), _) => Some(decode_excel_escapes(&text)),
            (DataType::InlineString, None, Some(v)) => Some(decode_excel_escapes(&v)),
            (_, _, value) => value,
        };
        let raw = match raw {
            Some(raw) => raw,
            None => {
                data_type = DataType::Empty;
                String::new()
            }
        };

        let mut cell = Cell::new(reference, data_type, self.style, raw);
        cell.formula = self.formula;
        Ok(cell)
    }
}

/// Forward-only reader over the rows of one worksheet part
pub struct RowStream<'a, R> {
    reader: Option<Reader<R>>,
    codec: Codec<'a>,
    buf: Vec<u8>,
    state: StreamState,
    dimension: Option<CellRange>,
    /// Row read ahead
    current: Option<SheetRow>,
    /// Last row number handed out
    position: Option<u32>,
    /// Number of the last `<row>` element read, for rows without `r`
    last_seen: u32,
}

impl<'a, R: BufRead> RowStream<'a, R> {
    /// Wrap a reader over a worksheet part; nothing is read yet
    pub fn new(reader: R, codec: Codec<'a>) -> Self {
        Self {
            reader: Some(Reader::from_reader(reader)),
            codec,
            buf: Vec::new(),
            state: StreamState::NotStarted,
            dimension: None,
            current: None,
            position: None,
            last_seen: 0,
        }
    }

    /// Wrap a reader and position on the first row
    pub fn open(reader: R, codec: Codec<'a>) -> Result<Self> {
        let mut stream = Self::new(reader, codec);
        stream.start()?;
        Ok(stream)
    }

    /// Current state
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// `<dimension ref>`, when the part declares one before `<sheetData>`
    pub fn dimension(&self) -> Option<CellRange> {
        self.dimension
    }

    /// Stop reading and release the reader
    pub fn close(&mut self) {
        self.current = None;
        self.finish();
    }

    fn finish(&mut self) {
        if self.reader.take().is_some() {
            trace!("row stream released its reader");
        }
        if self.current.is_none() {
            self.state = StreamState::Exhausted;
        }
    }

    /// Scan to `<sheetData>` and read the first row
    fn start(&mut self) -> Result<()> {
        let Some(reader) = self.reader.as_mut() else {
            self.state = StreamState::Exhausted;
            return Ok(());
        };

        let mut in_sheet_data = false;
        loop {
            self.buf.clear();
            match reader.read_event_into(&mut self.buf).map_err(xml_error)? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"dimension" => {
                    if let Some(r) = attr_string(&e, b"ref")? {
                        self.dimension = parse_dimension(&r);
                    }
                }
                Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                    in_sheet_data = true;
                    break;
                }
                Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => break,
                Event::Eof => {
                    warn!("worksheet part has no <sheetData>");
                    break;
                }
                _ => {}
            }
        }
        debug!("row stream opened (dimension: {:?})", self.dimension);

        if !in_sheet_data {
            self.finish();
            return Ok(());
        }
        self.current = self.read_row()?;
        if self.current.is_some() {
            self.state = StreamState::Positioned;
        } else {
            self.finish();
        }
        Ok(())
    }

    /// Read and decode the next `<row>`, `None` at `</sheetData>`
    fn read_row(&mut self) -> Result<Option<SheetRow>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        loop {
            self.buf.clear();
            match reader.read_event_into(&mut self.buf).map_err(xml_error)? {
                Event::Start(e) if e.local_name().as_ref() == b"row" => {
                    let number = row_number(&e, self.last_seen)?;
                    self.last_seen = number;
                    let cells = read_cells(reader, &mut self.buf, number)?;
                    let mut row = SheetRow::new(number);
                    for cell in cells {
                        let value = self.codec.decode(&cell)?;
                        row.insert(cell, value);
                    }
                    trace!("row {} with {} cells", number, row.len());
                    return Ok(Some(row));
                }
                Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                    let number = row_number(&e, self.last_seen)?;
                    self.last_seen = number;
                    trace!("row {} is empty", number);
                    return Ok(Some(SheetRow::new(number)));
                }
                Event::End(e) if e.local_name().as_ref() == b"sheetData" => break,
                Event::Eof => {
                    warn!("worksheet part ends inside <sheetData>");
                    break;
                }
                _ => {}
            }
        }

        self.reader = None;
        Ok(None)
    }
}

fn row_number(e: &BytesStart<'_>, last_seen: u32) -> Result<u32> {
    let number = match attr_string(e, b"r")? {
        Some(r) => r
            .parse()
            .map_err(|_| Error::malformed(format!("row number '{}' is not a number", r)))?,
        None => last_seen.checked_add(1).unwrap_or(u32::MAX),
    };
    if number == 0 || number > MAX_ROWS {
        return Err(Error::invalid_address(format!(
            "row {} is outside 1..={}",
            number, MAX_ROWS
        )));
    }
    Ok(number)
}

/// Read the cells of a `<row>` up to its closing tag
fn read_cells<R: BufRead>(reader: &mut Reader<R>, buf: &mut Vec<u8>, row: u32) -> Result<Vec<Cell>> {
    let mut cells = Vec::new();
    let mut next_column: u16 = 1;

    loop {
        buf.clear();
        let (raw, has_body) = match reader.read_event_into(buf).map_err(xml_error)? {
            Event::Start(e) if e.local_name().as_ref() == b"c" => (RawCell::from_start(&e)?, true),
            Event::Empty(e) if e.local_name().as_ref() == b"c" => (RawCell::from_start(&e)?, false),
            Event::End(e) if e.local_name().as_ref() == b"row" => return Ok(cells),
            Event::Eof => return Err(Error::malformed("worksheet ends inside a row")),
            _ => continue,
        };
        let mut raw = raw;
        if has_body {
            raw.read_body(reader, buf)?;
        }
        let cell = raw.into_cell(row, next_column)?;
        next_column = cell.column().saturating_add(1);
        cells.push(cell);
    }
}

impl<R: BufRead> RowSource for RowStream<'_, R> {
    fn next_row(&mut self) -> Result<Option<SheetRow>> {
        if self.state == StreamState::NotStarted {
            self.start()?;
        }
        if self.current.is_none() {
            return Ok(None);
        }

        let next = self.read_row()?;
        let row = std::mem::replace(&mut self.current, next);
        if self.current.is_none() {
            self.finish();
        }
        if let Some(r) = &row {
            self.position = Some(r.row_number());
        }
        Ok(row)
    }

    fn is_exhausted(&self) -> bool {
        self.state == StreamState::Exhausted
    }

    fn row(&mut self, n: u32) -> Result<Option<SheetRow>> {
        if let Some(position) = self.position {
            if n <= position {
                return Err(Error::NotAvailable {
                    requested: n,
                    position,
                });
            }
        }
        if self.state == StreamState::NotStarted {
            self.start()?;
        }

        loop {
            match self.current.as_ref().map(SheetRow::row_number) {
                None => return Ok(None),
                Some(r) if r > n => return Ok(None),
                Some(r) if r == n => return self.next_row(),
                Some(_) => {
                    self.next_row()?;
                }
            }
        }
    }
}
