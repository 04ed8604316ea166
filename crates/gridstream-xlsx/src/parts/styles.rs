//! `xl/styles.xml`
//!
//! Only number formats and the `cellXfs` records take part in value typing.
//! Every `<xf>` of `cellXfs` is also kept as raw XML, and the other sections
//! (fonts, fills, borders, cell styles, dxfs...) are never touched, so the
//! part can be written back without losing formatting.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::parse_bool_attr;
use crate::error::{XlsxError, XlsxResult};
use crate::writer::splice::{splice, Section};
use gridstream_core::shared_strings::escape_xml;
use gridstream_core::{StyleRecord, StyleSheet};

/// Styles read from a package
#[derive(Debug, Clone, Default)]
pub struct StylesPart {
    /// Number formats and style records
    pub sheet: StyleSheet,
    /// Original XML of each loaded `cellXfs` record, by index
    pub raw_xfs: Vec<String>,
}

fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> Option<u32> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().and_then(|v| v.parse().ok()))
}

fn style_record(e: &BytesStart<'_>) -> StyleRecord {
    let mut record = StyleRecord::default();
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"numFmtId" => record.num_fmt_id = value.parse().unwrap_or(0),
            b"fontId" => record.font_id = value.parse().unwrap_or(0),
            b"fillId" => record.fill_id = value.parse().unwrap_or(0),
            b"borderId" => record.border_id = value.parse().unwrap_or(0),
            b"xfId" => record.xf_id = value.parse().ok(),
            b"applyNumberFormat" => record.apply_number_format = parse_bool_attr(&value),
            _ => {}
        }
    }
    record
}

/// Read number formats and cell style records
pub fn read_styles(xml: &[u8]) -> XlsxResult<StylesPart> {
    let mut part = StylesPart::default();
    let mut xml_reader = Reader::from_reader(xml);
    let mut in_cell_xfs = false;

    loop {
        let before = xml_reader.buffer_position();
        match xml_reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"numFmt" =>
            {
                let id = attr_u32(&e, b"numFmtId");
                let code = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"formatCode")
                    .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
                if let (Some(id), Some(code)) = (id, code) {
                    part.sheet.add_number_format(id, code);
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Ok(Event::Empty(e)) if in_cell_xfs && e.local_name().as_ref() == b"xf" => {
                part.sheet.push_record(style_record(&e));
                part.raw_xfs.push(raw(xml, before, xml_reader.buffer_position()));
            }
            Ok(Event::Start(e)) if in_cell_xfs && e.local_name().as_ref() == b"xf" => {
                part.sheet.push_record(style_record(&e));
                xml_reader.read_to_end(e.name())?;
                part.raw_xfs.push(raw(xml, before, xml_reader.buffer_position()));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    if part.sheet.records().is_empty() {
        part.sheet.push_record(StyleRecord::with_num_fmt(0));
    }
    Ok(part)
}

fn raw(xml: &[u8], start: usize, end: usize) -> String {
    String::from_utf8_lossy(&xml[start..end]).trim().to_string()
}

fn num_fmts_xml(sheet: &StyleSheet) -> String {
    if sheet.number_formats().is_empty() {
        return String::new();
    }
    let mut content = format!(r#"<numFmts count="{}">"#, sheet.number_formats().len());
    for (id, code) in sheet.number_formats() {
        content.push_str(&format!(
            r#"<numFmt numFmtId="{}" formatCode="{}"/>"#,
            id,
            escape_xml(code)
        ));
    }
    content.push_str("</numFmts>");
    content
}

fn xf_xml(record: &StyleRecord) -> String {
    let mut xf = format!(
        r#"<xf numFmtId="{}" fontId="{}" fillId="{}" borderId="{}""#,
        record.num_fmt_id, record.font_id, record.fill_id, record.border_id
    );
    if let Some(xf_id) = record.xf_id {
        xf.push_str(&format!(r#" xfId="{}""#, xf_id));
    }
    if record.apply_number_format {
        xf.push_str(r#" applyNumberFormat="1""#);
    }
    xf.push_str("/>");
    xf
}

fn cell_xfs_xml(part: &StylesPart) -> String {
    let records = part.sheet.records();
    let mut content = format!(r#"<cellXfs count="{}">"#, records.len());
    for (i, record) in records.iter().enumerate() {
        match part.raw_xfs.get(i) {
            Some(raw) => content.push_str(raw),
            None => content.push_str(&xf_xml(record)),
        }
    }
    content.push_str("</cellXfs>");
    content
}

/// Rewrite `numFmts` and `cellXfs` of an existing styles part
pub fn styles_xml(original: &[u8], part: &StylesPart) -> XlsxResult<Vec<u8>> {
    splice(
        original,
        &[
            Section {
                tag: b"numFmts",
                xml: num_fmts_xml(&part.sheet),
                before: &[
                    b"fonts",
                    b"fills",
                    b"borders",
                    b"cellStyleXfs",
                    b"cellXfs",
                    b"cellStyles",
                    b"dxfs",
                    b"tableStyles",
                    b"colors",
                    b"extLst",
                ],
            },
            Section {
                tag: b"cellXfs",
                xml: cell_xfs_xml(part),
                before: &[b"cellStyles", b"dxfs", b"tableStyles", b"colors", b"extLst"],
            },
        ],
    )
}
