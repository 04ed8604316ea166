//! Relationship parts (`*.rels`)

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use gridstream_core::shared_strings::escape_xml;

/// Relationship type URIs used by this crate
pub mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const SHARED_STRINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
}

/// One `<Relationship>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"`
    pub external: bool,
}

/// The relationships of one source part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part
    pub fn parse(xml: &[u8]) -> XlsxResult<Self> {
        let mut xml_reader = Reader::from_reader(xml);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut items = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = attr.unescape_value().ok().map(|s| s.to_string()),
                            b"Target" => {
                                target = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            b"Type" => {
                                rel_type = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            b"TargetMode" => {
                                external = attr
                                    .unescape_value()
                                    .map_or(false, |s| s.eq_ignore_ascii_case("External"))
                            }
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        items.push(Relationship {
                            id,
                            rel_type,
                            target,
                            external,
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { items })
    }

    /// Relationship by id
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First relationship of a type
    pub fn find_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    /// All relationships
    pub fn iter(&self) -> std::slice::Iter<'_, Relationship> {
        self.items.iter()
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are no relationships
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a relationship under a fresh `rIdN` id and return the id
    pub fn add_relationship(&mut self, rel_type: &str, target: &str) -> String {
        let next = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let mut id = format!("rId{}", next);
        let mut n = next;
        while self.get(&id).is_some() {
            n += 1;
            id = format!("rId{}", n);
        }
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    /// Serialize as a `.rels` part
    pub fn to_xml(&self) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in &self.items {
            content.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_xml(&rel.id),
                escape_xml(&rel.rel_type),
                escape_xml(&rel.target),
                if rel.external {
                    r#" TargetMode="External""#
                } else {
                    ""
                }
            ));
        }
        content.push_str("</Relationships>");
        content
    }
}

/// Package path of a relationship target, relative to the source part's folder
///
/// `base` is the folder of the source part (`"xl"` for `xl/workbook.xml`).
pub fn resolve_target(base: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Relationship target for a part, relative to the source part's folder
pub fn relative_target(base: &str, part: &str) -> String {
    let prefix = format!("{}/", base.trim_end_matches('/'));
    match part.strip_prefix(&prefix) {
        Some(rest) if !base.is_empty() => rest.to_string(),
        _ => format!("/{}", part),
    }
}

/// Folder and `.rels` path for a part (`xl/workbook.xml` → `xl`, `xl/_rels/workbook.xml.rels`)
pub fn rels_path_for(part: &str) -> (String, String) {
    match part.rsplit_once('/') {
        Some((dir, file)) => (dir.to_string(), format!("{}/_rels/{}.rels", dir, file)),
        None => (String::new(), format!("_rels/{}.rels", part)),
    }
}
