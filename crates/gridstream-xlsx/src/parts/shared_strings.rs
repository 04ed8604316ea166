//! `xl/sharedStrings.xml`

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::decode_excel_escapes;
use crate::error::{XlsxError, XlsxResult};
use gridstream_core::{SharedString, SharedStringTable};

/// Read the shared string table
///
/// Duplicates present in the part are kept so cell indices stay valid.
/// Entries made of formatted runs keep their inner `<si>` XML.
pub fn read_shared_strings(xml: &[u8]) -> XlsxResult<SharedStringTable> {
    let mut table = SharedStringTable::new();
    let mut xml_reader = Reader::from_reader(xml);

    let mut text = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;
    let mut rich = false;
    let mut inner_start = 0;

    loop {
        let before = xml_reader.buffer_position();
        match xml_reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    rich = false;
                    text.clear();
                    inner_start = xml_reader.buffer_position();
                }
                b"r" if in_si => rich = true,
                b"rPh" if in_si => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                table.push_loaded(SharedString::plain(""));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => {
                    let formatted = if rich {
                        Some(String::from_utf8_lossy(&xml[inner_start..before]).into_owned())
                    } else {
                        None
                    };
                    table.push_loaded(SharedString {
                        unformatted: decode_excel_escapes(&text),
                        formatted,
                    });
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_t => {
                text.push_str(&e.unescape()?);
            }
            Ok(Event::CData(e)) if in_t => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    Ok(table)
}

/// Serialize the table as `xl/sharedStrings.xml`
pub fn shared_strings_xml(table: &SharedStringTable) -> String {
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
        table.len(),
        table.len()
    );
    for entry in table.iter() {
        content.push_str("<si>");
        content.push_str(&entry.to_xml());
        content.push_str("</si>");
    }
    content.push_str("</sst>");
    content
}
