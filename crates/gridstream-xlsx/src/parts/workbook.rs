//! `xl/workbook.xml`

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::parse_bool_attr;
use crate::error::{XlsxError, XlsxResult};
use crate::writer::splice::{splice, Section};
use gridstream_core::shared_strings::escape_xml;

/// A `<sheet>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    /// Relationship id pointing at the worksheet part
    pub r_id: String,
    /// `hidden` or `veryHidden`
    pub state: Option<String>,
}

/// A `<definedName>` entry, value kept as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedNameEntry {
    pub name: String,
    pub local_sheet_id: Option<usize>,
    pub hidden: bool,
    pub value: String,
}

/// What the workbook part says about the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookPart {
    pub date1904: bool,
    pub sheets: Vec<SheetEntry>,
    pub defined_names: Vec<DefinedNameEntry>,
}

fn sheet_entry(e: &BytesStart<'_>) -> Option<SheetEntry> {
    let mut name = None;
    let mut sheet_id = None;
    let mut r_id = None;
    let mut state = None;

    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().ok().map(|s| s.to_string());
        match attr.key.as_ref() {
            b"name" => name = value,
            b"sheetId" => sheet_id = value.and_then(|s| s.parse().ok()),
            b"state" => state = value,
            // relationship namespace prefix varies between producers
            key if key.ends_with(b":id") => r_id = value,
            _ => {}
        }
    }

    Some(SheetEntry {
        name: name?,
        sheet_id: sheet_id.unwrap_or(0),
        r_id: r_id?,
        state,
    })
}

/// Read sheets, the date system and defined names
pub fn read_workbook(xml: &[u8]) -> XlsxResult<WorkbookPart> {
    let mut part = WorkbookPart::default();
    let mut xml_reader = Reader::from_reader(xml);
    let mut current_name: Option<DefinedNameEntry> = None;

    loop {
        match xml_reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"workbookPr" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"date1904" {
                        part.date1904 = attr.unescape_value().map_or(false, |v| parse_bool_attr(&v));
                    }
                }
            }
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                match sheet_entry(&e) {
                    Some(entry) => part.sheets.push(entry),
                    None => log::warn!("skipping <sheet> without name or relationship id"),
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"definedName" => {
                let mut entry = DefinedNameEntry {
                    name: String::new(),
                    local_sheet_id: None,
                    hidden: false,
                    value: String::new(),
                };
                for attr in e.attributes().flatten() {
                    let Ok(value) = attr.unescape_value() else {
                        continue;
                    };
                    match attr.key.as_ref() {
                        b"name" => entry.name = value.into_owned(),
                        b"localSheetId" => entry.local_sheet_id = value.parse().ok(),
                        b"hidden" => entry.hidden = parse_bool_attr(&value),
                        _ => {}
                    }
                }
                current_name = Some(entry);
            }
            Ok(Event::Text(e)) => {
                if let Some(entry) = current_name.as_mut() {
                    entry.value.push_str(&e.unescape()?);
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"definedName" => {
                if let Some(entry) = current_name.take() {
                    part.defined_names.push(entry);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }

    Ok(part)
}

/// Rewrite `<sheets>` and `<definedNames>`, keeping everything else
pub fn workbook_xml(
    original: &[u8],
    sheets: &[SheetEntry],
    defined_names: &[DefinedNameEntry],
) -> XlsxResult<Vec<u8>> {
    let mut sheets_xml = String::from("<sheets>");
    for sheet in sheets {
        sheets_xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}""#,
            escape_xml(&sheet.name),
            sheet.sheet_id
        ));
        if let Some(state) = &sheet.state {
            sheets_xml.push_str(&format!(r#" state="{}""#, escape_xml(state)));
        }
        sheets_xml.push_str(&format!(r#" r:id="{}"/>"#, escape_xml(&sheet.r_id)));
    }
    sheets_xml.push_str("</sheets>");

    let mut names_xml = String::new();
    if !defined_names.is_empty() {
        names_xml.push_str("<definedNames>");
        for name in defined_names {
            names_xml.push_str(&format!(r#"<definedName name="{}""#, escape_xml(&name.name)));
            if let Some(local) = name.local_sheet_id {
                names_xml.push_str(&format!(r#" localSheetId="{}""#, local));
            }
            if name.hidden {
                names_xml.push_str(r#" hidden="1""#);
            }
            names_xml.push_str(&format!(">{}</definedName>", escape_xml(&name.value)));
        }
        names_xml.push_str("</definedNames>");
    }

    splice(
        original,
        &[
            Section {
                tag: b"sheets",
                xml: sheets_xml,
                before: &[
                    b"functionGroups",
                    b"externalReferences",
                    b"definedNames",
                    b"calcPr",
                    b"oleSize",
                    b"customWorkbookViews",
                    b"pivotCaches",
                    b"extLst",
                ],
            },
            Section {
                tag: b"definedNames",
                xml: names_xml,
                before: &[
                    b"calcPr",
                    b"oleSize",
                    b"customWorkbookViews",
                    b"pivotCaches",
                    b"smartTagPr",
                    b"smartTagTypes",
                    b"webPublishing",
                    b"fileRecoveryPr",
                    b"webPublishObjects",
                    b"extLst",
                ],
            },
        ],
    )
}
