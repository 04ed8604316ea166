//! Tests for write permissions and the close lifecycle.

use crate::{inventory, open_read, open_rw, part_text, worksheet, PackageBuilder};
use chrono::NaiveDate;
use gridstream_core::{CellValue, Error};
use gridstream_xlsx::{Document, OpenOptions, XlsxError};
use pretty_assertions::assert_eq;

fn not_writable<T: std::fmt::Debug>(result: Result<T, XlsxError>) {
    assert!(
        matches!(result, Err(XlsxError::Core(Error::NotWritable(_)))),
        "expected NotWritable, got {:?}",
        result
    );
}

#[test]
fn test_read_only_rejects_every_mutation() {
    let mut doc = open_read(inventory().build());

    not_writable(doc.set_value("Inventory", "A3", &CellValue::from("banana")));
    not_writable(doc.add_sheet(Some("New")));
    not_writable(doc.rename_sheet("Inventory", "Stock"));
    not_writable(doc.write_table("Inventory", &["x"], &[vec![CellValue::Int(1)]], "E1"));

    // nothing changed
    assert_eq!(doc.cell_value("Inventory", "A3").unwrap(), CellValue::from("apple"));
    assert_eq!(doc.sheet_names().unwrap(), vec!["Inventory"]);
    let workbook = doc.workbook().unwrap();
    assert!(!workbook.worksheet(0).unwrap().is_dirty());
    assert!(!workbook.shared_strings().is_dirty());
    assert!(doc.close().unwrap().is_none());
}

#[test]
fn test_rejected_write_does_not_touch_the_sheet() {
    let mut doc = open_rw(inventory().build());

    // bad anchor, bad shapes: checked before anything is written
    assert!(matches!(
        doc.set_value("Inventory", "ZZZZ1", &CellValue::Int(1)),
        Err(XlsxError::Core(Error::InvalidAddress(_)))
    ));
    assert!(matches!(
        doc.write_table("Inventory", &["a", "b"], &[vec![CellValue::Int(1)]], "E1"),
        Err(XlsxError::Core(Error::InvalidTableConfig(_)))
    ));
    assert!(matches!(
        doc.write_table(
            "Inventory",
            &["a"],
            &[vec![CellValue::Int(1); 3]],
            "A1048575"
        ),
        Err(XlsxError::Core(Error::InvalidAddress(_)))
    ));
    // a value that cannot be stored fails the whole table
    let err = doc
        .write_table(
            "Inventory",
            &["a", "b"],
            &[vec![CellValue::Int(1)], vec![CellValue::Float(f64::NAN)]],
            "E1",
        )
        .unwrap_err();
    assert!(matches!(err, XlsxError::Core(Error::Malformed(_))));
    assert_eq!(doc.cell_value("Inventory", "E1").unwrap(), CellValue::Empty);
    assert_eq!(doc.cell_value("Inventory", "E2").unwrap(), CellValue::Empty);
    // dates before the epoch would read back as plain numbers
    let before_epoch = NaiveDate::from_ymd_opt(1899, 6, 1).unwrap();
    assert!(matches!(
        doc.set_value("Inventory", "E1", &CellValue::Date(before_epoch)),
        Err(XlsxError::Core(Error::Malformed(_)))
    ));
    let workbook = doc.workbook().unwrap();
    assert!(!workbook.worksheet(0).unwrap().is_dirty());
    assert!(!workbook.shared_strings().is_dirty());
    assert!(!workbook.styles().is_dirty());

    // untouched sheets are copied as they were
    let original = inventory().build();
    let package = doc.close().unwrap().unwrap();
    assert_eq!(
        package.get("xl/worksheets/sheet1.xml"),
        original.get("xl/worksheets/sheet1.xml")
    );
    assert_eq!(package.get("xl/styles.xml"), original.get("xl/styles.xml"));
    assert_eq!(
        package.get("xl/sharedStrings.xml"),
        original.get("xl/sharedStrings.xml")
    );
}

#[test]
fn test_close_twice_and_use_after_close() {
    let mut doc = Document::create(OpenOptions::write_new()).unwrap();
    doc.set_value("Sheet1", "A1", &CellValue::Int(1)).unwrap();
    let package = doc.close().unwrap().unwrap();
    assert!(part_text(&package, "xl/worksheets/sheet1.xml").contains(r#"<c r="A1" s="1"><v>1</v></c>"#));

    assert!(!doc.is_writable());
    assert!(matches!(doc.close(), Err(XlsxError::Closed)));
    assert!(matches!(doc.cell_value("Sheet1", "A1"), Err(XlsxError::Closed)));
    not_writable(doc.set_value("Sheet1", "A2", &CellValue::Int(2)));
}

#[test]
fn test_failed_close_keeps_the_edits() {
    // a worksheet part cut off after its cells
    let xml = worksheet(None, r#"<row r="1"><c r="A1"><v>1</v></c></row>"#)
        .replace("</worksheet>", "");
    let mut doc = open_rw(PackageBuilder::new().sheet_part("S", &xml).build());
    doc.set_value("S", "B1", &CellValue::Int(2)).unwrap();

    assert!(matches!(doc.close(), Err(XlsxError::InvalidFormat(_))));
    assert!(!doc.is_closed());
    assert!(doc.is_writable());
    assert_eq!(doc.cell_value("S", "A1").unwrap(), CellValue::Float(1.0));
    assert_eq!(doc.cell_value("S", "B1").unwrap(), CellValue::Int(2));

    // the same failure again, not a closed document
    assert!(matches!(doc.close(), Err(XlsxError::InvalidFormat(_))));
    doc.set_value("S", "C1", &CellValue::Int(3)).unwrap();
    assert_eq!(doc.sheet_names().unwrap(), vec!["S"]);
}
