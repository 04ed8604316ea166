//! Typing stored cells into values, and back
//!
//! [`Codec`] reads: it combines the shared string table, the style sheet and
//! the date system to turn a [`Cell`] into a [`CellValue`]. [`Encoder`] writes:
//! it produces the raw content, tag and style index for a value, adding
//! shared strings and number formats as needed.

use log::warn;

use crate::cell::{Cell, CellRef, CellValue, DataType};
use crate::date::{
    date_to_serial, datetime_to_serial, is_phantom_leap_day, serial_to_date, serial_to_datetime,
    serial_to_time, time_to_serial, DateSystem,
};
use crate::error::{Error, Result};
use crate::shared_strings::SharedStringTable;
use crate::style::{NumberFormat, StyleSheet, ValueKind};

/// Format code written for date values
pub const DATE_FORMAT: &str = "yyyy-mm-dd";
/// Format code written for time values
pub const TIME_FORMAT: &str = "hh:mm:ss";
/// Format code written for datetime values
pub const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Read-side view of the workbook tables needed to type cells
#[derive(Debug, Clone, Copy)]
pub struct Codec<'a> {
    sst: &'a SharedStringTable,
    styles: &'a StyleSheet,
    date_system: DateSystem,
}

impl<'a> Codec<'a> {
    /// Create a codec over a workbook's tables
    pub fn new(sst: &'a SharedStringTable, styles: &'a StyleSheet, date_system: DateSystem) -> Self {
        Self {
            sst,
            styles,
            date_system,
        }
    }

    /// Shared string table in use
    pub fn shared_strings(&self) -> &'a SharedStringTable {
        self.sst
    }

    /// Style sheet in use
    pub fn styles(&self) -> &'a StyleSheet {
        self.styles
    }

    /// Date system in use
    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    /// Decode a stored cell into a typed value
    pub fn decode(&self, cell: &Cell) -> Result<CellValue> {
        if cell.is_empty() {
            return Ok(CellValue::Empty);
        }

        match cell.data_type {
            DataType::Empty => Ok(CellValue::Empty),
            DataType::SharedString => Ok(CellValue::Text(
                self.sst.resolve_raw(&cell.raw)?.unformatted.clone(),
            )),
            DataType::InlineString | DataType::Error => Ok(CellValue::Text(cell.raw.clone())),
            DataType::Boolean => parse_bool(&cell.raw)
                .map(CellValue::Bool)
                .ok_or_else(|| {
                    Error::Malformed(format!(
                        "boolean cell {} holds '{}'",
                        cell.reference, cell.raw
                    ))
                }),
            DataType::Number => self.decode_number(cell),
        }
    }

    /// Like [`Codec::decode`], but shared strings come back as their `<si>` XML
    pub fn decode_formatted(&self, cell: &Cell) -> Result<CellValue> {
        if cell.data_type == DataType::SharedString && !cell.is_empty() {
            return Ok(CellValue::Text(self.sst.resolve_raw(&cell.raw)?.to_xml()));
        }
        self.decode(cell)
    }

    fn decode_number(&self, cell: &Cell) -> Result<CellValue> {
        let n: f64 = cell.raw.trim().parse().map_err(|_| {
            Error::Malformed(format!(
                "numeric cell {} holds '{}'",
                cell.reference, cell.raw
            ))
        })?;

        let kind = self.styles.classify_style(cell.style)?;
        let value = match kind {
            ValueKind::Date => serial_to_date(n, self.date_system).map(CellValue::Date),
            ValueKind::Time => serial_to_time(n).map(CellValue::Time),
            ValueKind::DateTime => {
                serial_to_datetime(n, self.date_system).map(CellValue::DateTime)
            }
            ValueKind::IntegerDisplay if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Some(CellValue::Int(n as i64))
            }
            _ => Some(CellValue::Float(n)),
        };

        Ok(value.unwrap_or_else(|| {
            if is_phantom_leap_day(n, self.date_system) {
                warn!(
                    "cell {} holds serial {} (1900-02-29 does not exist), keeping the number",
                    cell.reference, n
                );
            } else {
                warn!(
                    "cell {} holds serial {} outside the calendar, keeping the number",
                    cell.reference, n
                );
            }
            CellValue::Float(n)
        }))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" => Some(true),
        "0" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Largest integer magnitude a cell can hold exactly (2^53)
pub const MAX_EXACT_INT: u64 = 1 << 53;

/// Write-side access to the workbook tables
#[derive(Debug)]
pub struct Encoder<'a> {
    sst: &'a mut SharedStringTable,
    styles: &'a mut StyleSheet,
    date_system: DateSystem,
}

impl<'a> Encoder<'a> {
    /// Create an encoder over a workbook's tables
    pub fn new(
        sst: &'a mut SharedStringTable,
        styles: &'a mut StyleSheet,
        date_system: DateSystem,
    ) -> Self {
        Self {
            sst,
            styles,
            date_system,
        }
    }

    /// Build the stored cell for `value` at `reference`
    ///
    /// Text is interned in the shared string table; dates and times get a
    /// style whose number format reads back as the same kind of value.
    ///
    /// Fails with [`Error::Malformed`] for values [`Encoder::check`] rejects.
    pub fn encode(&mut self, reference: CellRef, value: &CellValue) -> Result<Cell> {
        self.check(reference, value)?;
        let cell = match value {
            CellValue::Empty => Cell::empty(reference, None),
            CellValue::Bool(b) => {
                Cell::new(reference, DataType::Boolean, None, if *b { "1" } else { "0" })
            }
            CellValue::Int(n) => {
                let style = self.styles.ensure_cell_xf(NumberFormat::ID_NUMBER_INT);
                Cell::new(reference, DataType::Number, Some(style), n.to_string())
            }
            CellValue::Float(n) => {
                let style = self.styles.ensure_cell_xf(NumberFormat::ID_GENERAL);
                Cell::new(reference, DataType::Number, Some(style), n.to_string())
            }
            CellValue::Text(s) => {
                let index = self.sst.intern(s, None);
                Cell::new(reference, DataType::SharedString, None, index.to_string())
            }
            CellValue::Date(d) => self.temporal(reference, DATE_FORMAT, date_to_serial(*d, self.date_system)),
            CellValue::Time(t) => self.temporal(reference, TIME_FORMAT, time_to_serial(*t)),
            CellValue::DateTime(dt) => self.temporal(
                reference,
                DATETIME_FORMAT,
                datetime_to_serial(*dt, self.date_system),
            ),
        };
        Ok(cell)
    }

    /// Check that `value` can be stored and read back as the same value
    ///
    /// Cell numbers are doubles, so integers beyond ±2^53 and non-finite
    /// floats are rejected, as are dates before the epoch of the date
    /// system (they would need a negative serial).
    pub fn check(&self, reference: CellRef, value: &CellValue) -> Result<()> {
        let serial = match value {
            CellValue::Float(n) if !n.is_finite() => {
                return Err(Error::Malformed(format!(
                    "cannot store non-finite number {} in {}",
                    n, reference
                )));
            }
            CellValue::Int(n) if n.unsigned_abs() > MAX_EXACT_INT => {
                return Err(Error::Malformed(format!(
                    "integer {} in {} is too large to be stored exactly",
                    n, reference
                )));
            }
            CellValue::Date(d) => date_to_serial(*d, self.date_system),
            CellValue::DateTime(dt) => datetime_to_serial(*dt, self.date_system),
            _ => return Ok(()),
        };
        if serial < 0.0 {
            return Err(Error::Malformed(format!(
                "{} in {} is before the {} date system starts",
                value,
                reference,
                if self.date_system.is_1904() { "1904" } else { "1900" }
            )));
        }
        Ok(())
    }

    fn temporal(&mut self, reference: CellRef, code: &str, serial: f64) -> Cell {
        let style = self.styles.ensure_style_for_code(code);
        Cell::new(reference, DataType::Number, Some(style), serial.to_string())
    }
}
