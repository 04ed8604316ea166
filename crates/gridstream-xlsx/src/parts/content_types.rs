//! `[Content_Types].xml`

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use gridstream_core::shared_strings::escape_xml;

pub const WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
pub const SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
pub const STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";

/// Default (by extension) and override (by part) content types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Parse the content types part
    pub fn parse(xml: &[u8]) -> XlsxResult<Self> {
        let mut types = Self::default();
        let mut xml_reader = Reader::from_reader(xml);

        loop {
            match xml_reader.read_event() {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                    let is_default = match e.local_name().as_ref() {
                        b"Default" => true,
                        b"Override" => false,
                        _ => continue,
                    };
                    let mut key = None;
                    let mut content_type = None;
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().ok().map(|v| v.into_owned());
                        match attr.key.as_ref() {
                            b"Extension" | b"PartName" => key = value,
                            b"ContentType" => content_type = value,
                            _ => {}
                        }
                    }
                    if let (Some(key), Some(content_type)) = (key, content_type) {
                        if is_default {
                            types.defaults.push((key, content_type));
                        } else {
                            types.overrides.push((key, content_type));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
        }

        Ok(types)
    }

    /// Content type registered for a part (`xl/workbook.xml`, no leading slash)
    pub fn content_type(&self, part: &str) -> Option<&str> {
        let part_name = format!("/{}", part.trim_start_matches('/'));
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&part_name))
        {
            return Some(ct.as_str());
        }
        let ext = part.rsplit_once('.').map(|(_, ext)| ext)?;
        self.defaults
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, ct)| ct.as_str())
    }

    /// Register an override for a part; returns false if it was already present
    pub fn add_override(&mut self, part: &str, content_type: &str) -> bool {
        let part_name = format!("/{}", part.trim_start_matches('/'));
        if self
            .overrides
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(&part_name))
        {
            return false;
        }
        self.overrides.push((part_name, content_type.to_string()));
        true
    }

    /// Serialize as `[Content_Types].xml`
    pub fn to_xml(&self) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, ct) in &self.defaults {
            content.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            content.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(part),
                escape_xml(ct)
            ));
        }
        content.push_str("</Types>");
        content
    }
}
