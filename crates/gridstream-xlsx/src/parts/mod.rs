//! Readers for the workbook-level parts
//!
//! These parts are small compared to worksheets and are parsed eagerly when
//! a document is opened.

pub mod content_types;
pub mod shared_strings;
pub mod styles;
pub mod workbook;

pub use content_types::ContentTypes;
pub use shared_strings::read_shared_strings;
pub use styles::{read_styles, StylesPart};
pub use workbook::{DefinedNameEntry, SheetEntry, WorkbookPart};

/// Decode the `_xHHHH_` escapes Office uses for control characters in text
///
/// `_x000D_` is a carriage return, `_x005F_` an escaped underscore. Anything
/// that is not exactly four hex digits between `_x` and `_` is kept as is.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        if bytes[i] == b'_' && i + 7 <= s.len() && bytes[i + 1] == b'x' && bytes[i + 6] == b'_' {
            if bytes[i + 2..i + 6].iter().all(u8::is_ascii_hexdigit) {
                let hex = &s[i + 2..i + 6];
                if let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                    out.push(c);
                    i += 7;
                    continue;
                }
            }
        }
        // advance by one whole character
        let ch = s[i..].chars().next().unwrap_or('\u{fffd}');
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Parse a boolean attribute value (`1`, `true`, `on`)
pub(crate) fn parse_bool_attr(value: &str) -> bool {
    matches!(value, "1" | "true" | "on")
}
