//! Tests for row streaming with and without the worksheet cache.

use crate::{worksheet, PackageBuilder, STYLE_DATE, STYLE_DATETIME, STYLE_INT};
use gridstream_core::{CellValue, Error, RowSource, SheetRow};
use gridstream_xlsx::{Document, MemoryPackage, OpenOptions, XlsxError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn numbered_rows(n: u32) -> String {
    (1..=n)
        .map(|r| format!(r#"<row r="{r}"><c r="A{r}"><v>{r}</v></c><c r="B{r}"><v>{}</v></c></row>"#, r * 10))
        .collect()
}

fn row_numbers(doc: &mut Document, sheet: &str) -> Vec<u32> {
    doc.rows(sheet)
        .unwrap()
        .into_rows()
        .map(|r| r.unwrap().row_number())
        .collect()
}

#[test]
fn test_rows_in_order_with_gaps() {
    let package = PackageBuilder::new()
        .sheet(
            "S",
            r#"<row r="2"><c r="B2"><v>1</v></c></row><row r="5"><c r="A5"><v>2</v></c></row><row r="6"/>"#,
        )
        .build();
    let mut doc = Document::open(package, OpenOptions::read()).unwrap();
    assert_eq!(row_numbers(&mut doc, "S"), vec![2, 5, 6]);
}

#[test]
fn test_cached_rows_are_read_again_from_memory() {
    let package = PackageBuilder::new().sheet("S", &numbered_rows(5)).build();
    let mut doc = Document::open(package, OpenOptions::read()).unwrap();

    // random access first, then two full passes
    assert_eq!(doc.cell_value("S", "B4").unwrap(), CellValue::Float(40.0));
    assert_eq!(doc.cell_value("S", "A1").unwrap(), CellValue::Float(1.0));
    assert_eq!(row_numbers(&mut doc, "S"), vec![1, 2, 3, 4, 5]);
    assert_eq!(row_numbers(&mut doc, "S"), vec![1, 2, 3, 4, 5]);

    let sheet = doc.workbook().unwrap().worksheet(0).unwrap();
    assert!(sheet.is_fully_cached());
    assert_eq!(sheet.cells().cell_count(), 10);
}

#[test]
fn test_without_cache_rows_are_single_pass() {
    let package = PackageBuilder::new().sheet("S", &numbered_rows(5)).build();
    let mut doc = Document::open(package, OpenOptions::read().enable_cache(false)).unwrap();

    {
        let mut rows = doc.rows("S").unwrap();
        assert_eq!(rows.row(3).unwrap().unwrap().value(2), &CellValue::Float(30.0));
        assert!(matches!(
            rows.row(2),
            Err(Error::NotAvailable {
                requested: 2,
                position: 3
            })
        ));
        assert_eq!(rows.next_row().unwrap().unwrap().row_number(), 4);
    }

    // every read starts a fresh stream and nothing is kept
    assert_eq!(doc.cell_value("S", "A1").unwrap(), CellValue::Float(1.0));
    assert_eq!(row_numbers(&mut doc, "S"), vec![1, 2, 3, 4, 5]);
    assert!(doc.workbook().unwrap().worksheet(0).unwrap().cells().is_empty());
}

#[test]
fn test_early_termination_keeps_what_was_read() {
    let package = PackageBuilder::new().sheet("S", &numbered_rows(100)).build();
    let mut doc = Document::open(package, OpenOptions::read()).unwrap();

    let first: Vec<u32> = doc
        .rows("S")
        .unwrap()
        .into_rows()
        .take(3)
        .map(|r| r.unwrap().row_number())
        .collect();
    assert_eq!(first, vec![1, 2, 3]);

    let sheet = doc.workbook().unwrap().worksheet(0).unwrap();
    assert!(!sheet.is_fully_cached());
    assert_eq!(sheet.last_cached_row(), Some(3));

    // a later read continues from a fresh stream
    assert_eq!(doc.cell_value("S", "B100").unwrap(), CellValue::Float(1000.0));
    assert_eq!(row_numbers(&mut doc, "S").len(), 100);
}

#[test]
fn test_markup_after_sheet_data_is_not_read() {
    // the element after </sheetData> is never closed
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData><mergeCells count="1"><mergeCell ref="A1:B1"/>"#;
    let package = PackageBuilder::new().sheet_part("S", xml).build();
    let mut doc = Document::open(package, OpenOptions::read()).unwrap();
    assert_eq!(row_numbers(&mut doc, "S"), vec![1]);
}

#[test]
fn test_dimension_is_reported() {
    let package = PackageBuilder::new()
        .sheet_part(
            "Declared",
            &worksheet(Some("B2:D9"), r#"<row r="2"><c r="B2"><v>1</v></c></row>"#),
        )
        .sheet("Undeclared", r#"<row r="3"><c r="C3"><v>1</v></c></row>"#)
        .build();
    let mut doc = Document::open(package, OpenOptions::read()).unwrap();

    assert_eq!(
        doc.sheet_dimension("Declared").unwrap().unwrap().to_string(),
        "B2:D9"
    );
    // no <dimension>: known once the rows were read
    assert_eq!(doc.sheet_dimension("Undeclared").unwrap(), None);
    doc.cell_value("Undeclared", "A1").unwrap();
    assert_eq!(
        doc.sheet_dimension("Undeclared").unwrap().unwrap().to_string(),
        "C3:C3"
    );
}

#[test]
fn test_unknown_sheet() {
    let package = PackageBuilder::new().sheet("S", "").build();
    let mut doc = Document::open(package, OpenOptions::read()).unwrap();
    assert!(matches!(
        doc.rows("Missing"),
        Err(XlsxError::Core(Error::SheetNotFound(_)))
    ));
}

fn all_rows(package: MemoryPackage, enable_cache: bool) -> (Vec<SheetRow>, Vec<SheetRow>) {
    let mut doc =
        Document::open(package, OpenOptions::read().enable_cache(enable_cache)).unwrap();
    let mut pass = || -> Vec<SheetRow> {
        doc.rows("S")
            .unwrap()
            .into_rows()
            .collect::<Result<_, _>>()
            .unwrap()
    };
    let first = pass();
    let second = pass();
    (first, second)
}

#[test]
fn test_cache_does_not_change_what_is_read() {
    let package = PackageBuilder::new()
        .shared_strings(&["name", "when", "fig"])
        .sheet(
            "S",
            &format!(
                r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="s"><v>1</v></c></row><row r="3"><c r="A3" t="s"><v>2</v></c><c r="B3" s="{int}"><v>12</v></c><c r="C3" s="{date}"><v>45306</v></c><c r="D3" t="b"><v>0</v></c></row><row r="4"/><row r="7"><c r="B7" t="inlineStr"><is><t>note</t></is></c><c r="C7" s="{datetime}"><v>45306.75</v></c><c r="E7" t="e"><v>#N/A</v></c><c r="F7" s="{date}"/></row>"#,
                int = STYLE_INT,
                date = STYLE_DATE,
                datetime = STYLE_DATETIME
            ),
        )
        .build();

    let (cached, cached_again) = all_rows(package.clone(), true);
    let (streamed, streamed_again) = all_rows(package, false);

    assert_eq!(
        cached.iter().map(SheetRow::row_number).collect::<Vec<_>>(),
        vec![1, 3, 4, 7]
    );
    assert_eq!(
        cached[1].value(3),
        &CellValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    );
    assert_eq!(cached, streamed);
    assert_eq!(cached, cached_again);
    assert_eq!(streamed, streamed_again);
}

/// A cell as written into a generated sheet
#[derive(Debug, Clone)]
enum RawCell {
    Number(f64),
    Styled(u32, u32),
    Bool(bool),
    Shared(usize),
    Inline(String),
}

impl RawCell {
    fn xml(&self, reference: &str) -> String {
        match self {
            RawCell::Number(n) => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n),
            RawCell::Styled(s, v) => format!(r#"<c r="{}" s="{}"><v>{}</v></c>"#, reference, s, v),
            RawCell::Bool(b) => format!(r#"<c r="{}" t="b"><v>{}</v></c>"#, reference, u8::from(*b)),
            RawCell::Shared(i) => format!(r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, i),
            RawCell::Inline(t) => {
                format!(r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#, reference, t)
            }
        }
    }
}

fn raw_cell() -> impl Strategy<Value = RawCell> {
    prop_oneof![
        (-1.0e6f64..1.0e6).prop_map(RawCell::Number),
        (1u32..60_000).prop_map(|v| RawCell::Styled(STYLE_DATE, v)),
        (0u32..10_000).prop_map(|v| RawCell::Styled(STYLE_INT, v)),
        any::<bool>().prop_map(RawCell::Bool),
        (0usize..3).prop_map(RawCell::Shared),
        "[a-z]{1,8}".prop_map(RawCell::Inline),
    ]
}

/// Rows as (gap to the previous row, cells as (gap to the previous column, cell))
fn sheet_rows() -> impl Strategy<Value = Vec<(u32, Vec<(u16, RawCell)>)>> {
    prop::collection::vec(
        (1u32..4, prop::collection::vec((1u16..4, raw_cell()), 0..5)),
        0..12,
    )
}

fn sheet_data(rows: &[(u32, Vec<(u16, RawCell)>)]) -> String {
    let mut xml = String::new();
    let mut row = 0;
    for (row_gap, cells) in rows {
        row += row_gap;
        xml.push_str(&format!(r#"<row r="{}">"#, row));
        let mut col = 0;
        for (col_gap, cell) in cells {
            col += col_gap;
            xml.push_str(&cell.xml(&format!("{}{}", gridstream_core::encode_column(col), row)));
        }
        xml.push_str("</row>");
    }
    xml
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn cached_and_streamed_reads_agree(rows in sheet_rows()) {
        let package = PackageBuilder::new()
            .shared_strings(&["alpha", "beta", "gamma"])
            .sheet("S", &sheet_data(&rows))
            .build();

        let (cached, cached_again) = all_rows(package.clone(), true);
        let (streamed, _) = all_rows(package, false);
        prop_assert_eq!(cached.len(), rows.len());
        prop_assert_eq!(&cached, &streamed);
        prop_assert_eq!(&cached, &cached_again);
    }
}
