//! Tests that write, close and reopen packages.

use crate::{inventory, open_read, open_rw, part_text, PackageBuilder, STYLE_DATE};
use chrono::{NaiveDate, NaiveTime};
use gridstream_core::{CellValue, DefinedNameValue};
use gridstream_xlsx::{Data, Document, OpenOptions};
use pretty_assertions::assert_eq;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_new_document_through_zip_file() {
    let mut doc = Document::create(OpenOptions::write_new()).unwrap();
    doc.set_value("Sheet1", "A1", &CellValue::from("label")).unwrap();
    doc.set_value("Sheet1", "B1", &CellValue::Float(2.5)).unwrap();
    doc.set_value("Sheet1", "C1", &CellValue::Int(7)).unwrap();
    doc.set_value("Sheet1", "D1", &CellValue::Bool(true)).unwrap();
    doc.set_value("Sheet1", "A2", &CellValue::Date(date(2024, 2, 29))).unwrap();
    doc.set_value(
        "Sheet1",
        "B2",
        &CellValue::DateTime(date(2023, 12, 31).and_hms_opt(23, 30, 0).unwrap()),
    )
    .unwrap();
    doc.set_value(
        "Sheet1",
        "C2",
        &CellValue::Time(NaiveTime::from_hms_opt(6, 15, 0).unwrap()),
    )
    .unwrap();
    doc.set_value("Sheet1", "D2", &CellValue::from("label")).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.xlsx");
    doc.close().unwrap().unwrap().save(&path).unwrap();

    let mut doc = Document::open_path(&path, OpenOptions::read()).unwrap();
    assert_eq!(doc.sheet_dimension("Sheet1").unwrap().unwrap().to_string(), "A1:D2");
    assert_eq!(
        doc.range_values("Sheet1", "A1:D2").unwrap(),
        vec![
            vec![
                CellValue::from("label"),
                CellValue::Float(2.5),
                CellValue::Int(7),
                CellValue::Bool(true),
            ],
            vec![
                CellValue::Date(date(2024, 2, 29)),
                CellValue::DateTime(date(2023, 12, 31).and_hms_opt(23, 30, 0).unwrap()),
                CellValue::Time(NaiveTime::from_hms_opt(6, 15, 0).unwrap()),
                CellValue::from("label"),
            ],
        ]
    );
    // the repeated text is stored once
    assert_eq!(doc.shared_strings().unwrap().len(), 1);
}

#[test]
fn test_edit_keeps_everything_else() {
    let package = inventory()
        .sheet("Notes", r#"<row r="1"><c r="A1"><v>1</v></c></row>"#)
        .part("docProps/custom.xml", "<Properties>keep me</Properties>")
        .build();
    let mut doc = open_rw(package);
    doc.set_value("Inventory", "B4", &CellValue::Int(11)).unwrap();
    doc.set_value("Inventory", "A6", &CellValue::from("fig")).unwrap();
    let out = doc.close().unwrap().unwrap();

    // untouched parts byte for byte
    assert_eq!(
        part_text(&out, "docProps/custom.xml"),
        "<Properties>keep me</Properties>"
    );
    let original = inventory()
        .sheet("Notes", r#"<row r="1"><c r="A1"><v>1</v></c></row>"#)
        .build();
    assert_eq!(
        out.get("xl/worksheets/sheet2.xml"),
        original.get("xl/worksheets/sheet2.xml")
    );

    // the edited sheet keeps the markup around its cells
    let sheet = part_text(&out, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"<dimension ref="A2:C6"/>"#));
    assert!(sheet.contains(r#"<col min="1" max="1" width="18" customWidth="1"/>"#));
    assert!(sheet.contains(r#"<mergeCell ref="F1:G1"/>"#));
    assert!(sheet.find("<sheetData>") < sheet.find("<mergeCells"));

    // existing styles survive, fonts included
    let styles = part_text(&out, "xl/styles.xml");
    assert!(styles.contains("<b/>"));
    assert!(styles.contains(r#"formatCode="yyyy\-mm\-dd\ hh:mm""#));

    let mut doc = open_read(out);
    assert_eq!(doc.cell_value("Inventory", "B4").unwrap(), CellValue::Int(11));
    assert_eq!(doc.cell_value("Inventory", "A6").unwrap(), CellValue::from("fig"));
    assert_eq!(
        doc.cell_value("Inventory", "C5").unwrap(),
        CellValue::Date(date(2024, 3, 10))
    );
    assert_eq!(doc.shared_strings().unwrap().len(), 7);
}

#[test]
fn test_add_and_rename_sheets() {
    let package = inventory()
        .defined_name(r#"<definedName name="Fruit">Inventory!$A$3:$A$5</definedName>"#)
        .defined_name(r#"<definedName name="Print_Area" localSheetId="0" hidden="1">Inventory!$A$1:$C$5</definedName>"#)
        .build();
    let mut doc = open_rw(package);

    assert_eq!(doc.add_sheet(None).unwrap(), 1);
    assert_eq!(doc.add_sheet(Some("Summary")).unwrap(), 2);
    doc.set_value("Summary", "A1", &CellValue::from("total")).unwrap();
    doc.rename_sheet("Inventory", "Stock").unwrap();
    assert_eq!(doc.sheet_names().unwrap(), vec!["Stock", "Sheet2", "Summary"]);

    let out = doc.close().unwrap().unwrap();
    let workbook = part_text(&out, "xl/workbook.xml");
    assert!(workbook.contains(r#"<sheet name="Stock" sheetId="1" r:id="rId1"/>"#));
    assert!(workbook.contains(r#"<sheet name="Summary" sheetId="3""#));
    // a renamed reference is written out again
    assert!(workbook.contains(r#"<definedName name="Fruit">Stock!A3:A5</definedName>"#));
    assert!(workbook.contains(r#"localSheetId="0" hidden="1""#));
    assert!(part_text(&out, "[Content_Types].xml").contains("/xl/worksheets/sheet3.xml"));

    let mut doc = open_read(out);
    assert_eq!(doc.sheet_names().unwrap(), vec!["Stock", "Sheet2", "Summary"]);
    assert_eq!(doc.cell_value("Summary", "A1").unwrap(), CellValue::from("total"));
    assert_eq!(doc.cell_value("Sheet2", "A1").unwrap(), CellValue::Empty);
    assert_eq!(
        doc.get_data("Fruit").unwrap(),
        Data::Matrix(vec![
            vec![CellValue::from("apple")],
            vec![CellValue::from("pear")],
            vec![CellValue::from("plum")],
        ])
    );
    let fruit = doc
        .defined_names()
        .unwrap()
        .iter()
        .find(|n| n.name == "Fruit")
        .unwrap()
        .value
        .clone();
    assert!(matches!(fruit, DefinedNameValue::Range(r) if r.sheet == "Stock"));
}

#[test]
fn test_1904_dates_are_written_in_the_same_system() {
    let package = PackageBuilder::new()
        .date1904()
        .sheet(
            "S",
            &format!(r#"<row r="1"><c r="A1" s="{}"><v>43844</v></c></row>"#, STYLE_DATE),
        )
        .build();
    let mut doc = open_rw(package);
    doc.set_value("S", "A2", &CellValue::Date(date(2024, 1, 15))).unwrap();
    let out = doc.close().unwrap().unwrap();

    assert!(part_text(&out, "xl/worksheets/sheet1.xml").contains("<v>43844</v></c></row><row r=\"2\">"));
    let mut doc = open_read(out);
    assert!(doc.is_date1904().unwrap());
    assert_eq!(
        doc.column_values("S", "A:A").unwrap(),
        vec![
            vec![CellValue::Date(date(2024, 1, 15))],
            vec![CellValue::Date(date(2024, 1, 15))],
        ]
    );
}
