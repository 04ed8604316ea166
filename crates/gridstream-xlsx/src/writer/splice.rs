//! Byte-level replacement of top-level sections in an XML part
//!
//! Write-back only regenerates the sections it owns (`<sheetData>`,
//! `<cellXfs>`, `<sheets>`...). Everything around them is copied from the
//! original bytes untouched.

use std::ops::Range;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

/// A child of the root element to replace or insert
pub struct Section<'a> {
    /// Local name of the element
    pub tag: &'a [u8],
    /// Replacement XML; empty removes the element
    pub xml: String,
    /// Elements that must follow this one, used to place it when it is missing
    pub before: &'a [&'a [u8]],
}

struct Layout {
    /// Local name and byte span of each child of the root element
    children: Vec<(Vec<u8>, Range<usize>)>,
    /// Offset of the root's closing tag
    root_close: usize,
}

fn layout(xml: &[u8]) -> XlsxResult<Layout> {
    let mut xml_reader = Reader::from_reader(xml);
    let mut depth = 0usize;
    let mut children = Vec::new();

    loop {
        let before = xml_reader.buffer_position();
        match xml_reader.read_event() {
            Ok(Event::Start(e)) if depth == 1 => {
                let name = e.local_name().as_ref().to_vec();
                xml_reader.read_to_end(e.name())?;
                children.push((name, before..xml_reader.buffer_position()));
            }
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::Empty(e)) if depth == 1 => {
                children.push((
                    e.local_name().as_ref().to_vec(),
                    before..xml_reader.buffer_position(),
                ));
            }
            Ok(Event::Empty(_)) if depth == 0 => {
                return Err(XlsxError::InvalidFormat(
                    "root element has no closing tag".into(),
                ));
            }
            Ok(Event::End(_)) if depth == 1 => {
                return Ok(Layout {
                    children,
                    root_close: before,
                });
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => {
                return Err(XlsxError::InvalidFormat(
                    "unexpected end of part".into(),
                ))
            }
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
    }
}

/// Replace each section's element, or insert it before the first element
/// of its `before` list (or the root's closing tag) when it is missing
pub fn splice(xml: &[u8], sections: &[Section<'_>]) -> XlsxResult<Vec<u8>> {
    let layout = layout(xml)?;

    let mut edits: Vec<(Range<usize>, &str)> = Vec::with_capacity(sections.len());
    for section in sections {
        let existing = layout
            .children
            .iter()
            .find(|(name, _)| name.as_slice() == section.tag);
        let span = match existing {
            Some((_, span)) => span.clone(),
            None if section.xml.is_empty() => continue,
            None => {
                let at = layout
                    .children
                    .iter()
                    .find(|(name, _)| section.before.contains(&name.as_slice()))
                    .map_or(layout.root_close, |(_, span)| span.start);
                at..at
            }
        };
        edits.push((span, section.xml.as_str()));
    }
    // stable: insertions at the same offset keep section order
    edits.sort_by_key(|(span, _)| span.start);

    let mut out = Vec::with_capacity(xml.len() + edits.iter().map(|(_, s)| s.len()).sum::<usize>());
    let mut pos = 0;
    for (span, replacement) in edits {
        if span.start < pos {
            continue;
        }
        out.extend_from_slice(&xml[pos..span.start]);
        out.extend_from_slice(replacement.as_bytes());
        pos = span.end;
    }
    out.extend_from_slice(&xml[pos..]);
    Ok(out)
}
