//! Serializers for the parts write-back regenerates

pub(crate) mod splice;

use gridstream_core::shared_strings::{escape_xml, text_run};
use gridstream_core::{Cell, CellStore, DataType, Worksheet};

use crate::error::XlsxResult;
use crate::template;
use splice::{splice, Section};

pub use crate::parts::shared_strings::shared_strings_xml;
pub use crate::parts::styles::styles_xml;
pub use crate::parts::workbook::workbook_xml;

/// XML of one `<c>` element
fn cell_xml(cell: &Cell) -> String {
    let mut xml = format!(r#"<c r="{}""#, cell.reference);
    if let Some(style) = cell.style {
        xml.push_str(&format!(r#" s="{}""#, style));
    }

    let has_value = !cell.raw.is_empty() && cell.data_type != DataType::Empty;
    let inline = cell.data_type == DataType::InlineString;
    let type_attr = match (inline, cell.formula.is_some()) {
        // a formula's cached text result
        (true, true) => Some("str"),
        _ if has_value => cell.data_type.as_attr(),
        _ => None,
    };
    if let Some(t) = type_attr {
        xml.push_str(&format!(r#" t="{}""#, t));
    }

    if cell.formula.is_none() && !has_value {
        xml.push_str("/>");
        return xml;
    }
    xml.push('>');
    if let Some(formula) = &cell.formula {
        xml.push_str(&format!("<f>{}</f>", escape_xml(formula)));
    }
    if has_value {
        if inline && cell.formula.is_none() {
            xml.push_str(&format!("<is>{}</is>", text_run(&cell.raw)));
        } else {
            xml.push_str(&format!("<v>{}</v>", escape_xml(&cell.raw)));
        }
    }
    xml.push_str("</c>");
    xml
}

/// `<sheetData>` for every stored row
pub fn sheet_data_xml(cells: &CellStore) -> String {
    let mut xml = String::from("<sheetData>");
    for row in cells.row_numbers() {
        let Some(row_cells) = cells.row(row) else {
            continue;
        };
        if row_cells.is_empty() {
            xml.push_str(&format!(r#"<row r="{}"/>"#, row));
            continue;
        }
        xml.push_str(&format!(r#"<row r="{}">"#, row));
        for cell in row_cells.values() {
            xml.push_str(&cell_xml(cell));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");
    xml
}

/// Worksheet part with `<dimension>` and `<sheetData>` regenerated
///
/// `original` is the existing part, `None` for a sheet that has none yet.
pub fn worksheet_xml(original: Option<&[u8]>, sheet: &Worksheet) -> XlsxResult<Vec<u8>> {
    let original = original.unwrap_or(template::BLANK_WORKSHEET.as_bytes());
    let dimension = match sheet.cells().used_range() {
        Some(r) if r.start() == r.end() => format!(r#"<dimension ref="{}"/>"#, r.start()),
        Some(r) => format!(r#"<dimension ref="{}"/>"#, r),
        None => r#"<dimension ref="A1"/>"#.to_string(),
    };

    splice(
        original,
        &[
            Section {
                tag: b"dimension",
                xml: dimension,
                before: &[b"sheetViews", b"sheetFormatPr", b"cols", b"sheetData"],
            },
            Section {
                tag: b"sheetData",
                xml: sheet_data_xml(sheet.cells()),
                before: &[
                    b"sheetCalcPr",
                    b"sheetProtection",
                    b"protectedRanges",
                    b"scenarios",
                    b"autoFilter",
                    b"sortState",
                    b"dataConsolidate",
                    b"customSheetViews",
                    b"mergeCells",
                    b"phoneticPr",
                    b"conditionalFormatting",
                    b"dataValidations",
                    b"hyperlinks",
                    b"printOptions",
                    b"pageMargins",
                    b"pageSetup",
                    b"headerFooter",
                    b"rowBreaks",
                    b"colBreaks",
                    b"customProperties",
                    b"cellWatches",
                    b"ignoredErrors",
                    b"smartTags",
                    b"drawing",
                    b"legacyDrawing",
                    b"legacyDrawingHF",
                    b"picture",
                    b"oleObjects",
                    b"controls",
                    b"webPublishItems",
                    b"tableParts",
                    b"extLst",
                ],
            },
        ],
    )
}
