//! Style resolution
//!
//! A cell's style index selects a [`StyleRecord`]; the record's numFmtId
//! selects a [`NumberFormat`]; [`classify`] turns the format code into the
//! [`ValueKind`] used to type stored numbers.

mod number_format;
mod sheet;

pub use number_format::{
    builtin_format_code, builtin_format_id, classify, NumberFormat, ValueKind,
};
pub use sheet::{StyleRecord, StyleSheet};
