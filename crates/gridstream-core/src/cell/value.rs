//! Stored cells and decoded cell values

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::CellRef;

/// How the raw content of a stored cell is to be read
///
/// This is the `t` attribute of a `<c>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// No content
    Empty,
    /// Raw content is an index into the shared string table (`t="s"`)
    SharedString,
    /// Raw content is the text itself (`t="inlineStr"` or `t="str"`)
    InlineString,
    /// `0` or `1` (`t="b"`)
    Boolean,
    /// A number, possibly a date serial depending on the style (`t="n"` or absent)
    #[default]
    Number,
    /// An error literal such as `#N/A` (`t="e"`)
    Error,
}

impl DataType {
    /// Map a `t` attribute to a data type; `None` means the attribute was absent.
    ///
    /// Returns `None` for tags this crate does not know.
    pub fn from_attr(tag: Option<&str>) -> Option<Self> {
        match tag {
            None | Some("n") => Some(DataType::Number),
            Some("s") => Some(DataType::SharedString),
            Some("inlineStr") | Some("str") => Some(DataType::InlineString),
            Some("b") => Some(DataType::Boolean),
            Some("e") => Some(DataType::Error),
            _ => None,
        }
    }

    /// The `t` attribute written for this type, if any
    pub fn as_attr(&self) -> Option<&'static str> {
        match self {
            DataType::Empty | DataType::Number => None,
            DataType::SharedString => Some("s"),
            DataType::InlineString => Some("inlineStr"),
            DataType::Boolean => Some("b"),
            DataType::Error => Some("e"),
        }
    }
}

/// A cell as stored in a worksheet part, before value typing
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Location of the cell
    pub reference: CellRef,
    /// Data-type tag
    pub data_type: DataType,
    /// Index into the style table (`s` attribute)
    pub style: Option<u32>,
    /// Raw content: the `<v>` text, or the `<is>` text for inline strings
    pub raw: String,
    /// Formula text, carried through unevaluated
    pub formula: Option<String>,
}

impl Cell {
    /// Create a cell with raw content and no formula
    pub fn new<S: Into<String>>(
        reference: CellRef,
        data_type: DataType,
        style: Option<u32>,
        raw: S,
    ) -> Self {
        Self {
            reference,
            data_type,
            style,
            raw: raw.into(),
            formula: None,
        }
    }

    /// Create an empty cell, optionally keeping a style
    pub fn empty(reference: CellRef, style: Option<u32>) -> Self {
        Self::new(reference, DataType::Empty, style, String::new())
    }

    /// True when the cell carries no value
    pub fn is_empty(&self) -> bool {
        self.data_type == DataType::Empty || self.raw.is_empty()
    }

    /// Row number (1-based)
    pub fn row(&self) -> u32 {
        self.reference.row()
    }

    /// Column number (1-based)
    pub fn column(&self) -> u16 {
        self.reference.column()
    }
}

/// A decoded cell value
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Absent or blank cell
    #[default]
    Empty,
    /// Boolean value
    Bool(bool),
    /// Whole number shown with an integer format
    Int(i64),
    /// Any other number
    Float(f64),
    /// Text, from the shared string table or inline
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Date and time of day
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric view of the value (integers widen, booleans are 0/1)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(n) => Some(*n),
            CellValue::Int(n) => Some(*n as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Integer view of the value; floats only when they are whole
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(n) => Some(*n),
            CellValue::Float(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Date part of a date or datetime value
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Bool(_) => "bool",
            CellValue::Int(_) => "int",
            CellValue::Float(_) => "float",
            CellValue::Text(_) => "text",
            CellValue::Date(_) => "date",
            CellValue::Time(_) => "time",
            CellValue::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Int(n) => write!(f, "{}", n),
            CellValue::Float(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Int(i64::from(n))
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Float(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveTime> for CellValue {
    fn from(t: NaiveTime) -> Self {
        CellValue::Time(t)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Empty)
    }
}
