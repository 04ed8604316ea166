//! Tests for workbook metadata and opening packages.

use crate::{inventory, open_read, PackageBuilder};
use gridstream_core::{CellValue, Error};
use gridstream_xlsx::{Document, MemoryPackage, Mode, OpenOptions, XlsxError, ZipPackage};
use pretty_assertions::assert_eq;

#[test]
fn test_sheet_names_and_parts() {
    let package = inventory().sheet("Second", "").build();
    let doc = open_read(package);

    assert_eq!(doc.sheet_names().unwrap(), vec!["Inventory", "Second"]);
    assert_eq!(doc.sheet_count().unwrap(), 2);
    assert!(!doc.is_date1904().unwrap());
    assert!(!doc.is_writable());
    assert_eq!(doc.mode(), Mode::ReadOnly);
    assert!(doc.has_shared_strings().unwrap());
    assert_eq!(doc.shared_strings().unwrap().len(), 6);
    // five records in cellXfs, one custom format
    assert_eq!(doc.styles().unwrap().records().len(), 5);
    assert_eq!(doc.styles().unwrap().format_code(164), Some("yyyy\\-mm\\-dd\\ hh:mm"));

    let parts = doc.part_names().unwrap();
    assert!(parts.contains(&"xl/workbook.xml".to_string()));
    assert!(parts.contains(&"xl/worksheets/sheet2.xml".to_string()));
}

#[test]
fn test_open_zip_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.xlsx");
    inventory().build().save(&path).unwrap();

    let mut doc = Document::open_path(&path, OpenOptions::read()).unwrap();
    assert_eq!(doc.cell_value("Inventory", "A4").unwrap(), CellValue::from("pear"));

    let mut doc = Document::open(ZipPackage::open(&path).unwrap(), OpenOptions::read()).unwrap();
    assert_eq!(doc.cell_value("Inventory", "B5").unwrap(), CellValue::Int(7));

    let bytes = std::fs::read(&path).unwrap();
    let package = MemoryPackage::from_zip(std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(package, inventory().build());
}

#[test]
fn test_missing_workbook_part() {
    let mut package = inventory().build();
    package.remove("xl/workbook.xml");
    assert!(matches!(
        Document::open(package, OpenOptions::read()),
        Err(XlsxError::MissingPart(_))
    ));
}

#[test]
fn test_sheet_without_part_reads_as_empty() {
    let mut package = inventory().sheet("Ghost", "").build();
    package.remove("xl/worksheets/sheet2.xml");
    let mut doc = open_read(package);

    assert_eq!(doc.sheet_names().unwrap(), vec!["Inventory", "Ghost"]);
    assert_eq!(doc.cell_value("Ghost", "A1").unwrap(), CellValue::Empty);
}

#[test]
fn test_closed_document() {
    let mut doc = open_read(inventory().build());
    assert!(doc.close().unwrap().is_none());
    assert!(doc.is_closed());

    assert!(matches!(doc.sheet_names(), Err(XlsxError::Closed)));
    assert!(matches!(doc.rows("Inventory"), Err(XlsxError::Closed)));
    assert!(matches!(doc.get_data("Inventory!A1"), Err(XlsxError::Closed)));
    assert!(matches!(doc.close(), Err(XlsxError::Closed)));
    assert!(matches!(
        doc.set_value("Inventory", "A1", &CellValue::Int(1)),
        Err(XlsxError::Core(Error::NotWritable(_)))
    ));
}

#[test]
fn test_mode_strings() {
    assert_eq!(Mode::parse("r").unwrap(), Mode::ReadOnly);
    assert_eq!(Mode::parse("rw").unwrap(), Mode::ReadWrite);
    assert_eq!(Mode::parse("w").unwrap(), Mode::WriteNew);
    assert!(Mode::parse("x").is_err());

    let options = OpenOptions::read().mode(Mode::parse("rw").unwrap()).enable_cache(false);
    // writable documents always cache
    assert!(options.effective_cache());
    let doc = Document::open(PackageBuilder::new().sheet("S", "").build(), options).unwrap();
    assert!(doc.is_writable());
}
