//! Tests for resolving references and defined names.

use crate::{inventory, open_read};
use gridstream_core::{CellValue, DefinedNameValue, Error};
use gridstream_xlsx::{Data, XlsxError};
use pretty_assertions::assert_eq;

fn with_names() -> gridstream_xlsx::Document {
    let package = inventory()
        .sheet(
            "My Sheet",
            r#"<row r="1"><c r="A1"><v>1.5</v></c><c r="B1"><v>2.5</v></c></row>"#,
        )
        .defined_name(r#"<definedName name="Fruit">Inventory!$A$3:$A$5</definedName>"#)
        .defined_name(r#"<definedName name="FirstQty">Inventory!$B$3</definedName>"#)
        .defined_name(r#"<definedName name="Rate">0.25</definedName>"#)
        .defined_name(r#"<definedName name="Greeting">"hello"</definedName>"#)
        .defined_name(r#"<definedName name="Local" localSheetId="1">'My Sheet'!$B$1</definedName>"#)
        .defined_name(r#"<definedName name="_xlnm._FilterDatabase" localSheetId="0" hidden="1">Inventory!$A$2:$C$5</definedName>"#)
        .build();
    open_read(package)
}

#[test]
fn test_sheet_qualified_references() {
    let mut doc = with_names();

    assert_eq!(
        doc.get_data("Inventory!A3").unwrap(),
        Data::Value(CellValue::from("apple"))
    );
    assert_eq!(
        doc.get_data("Inventory!$B$4").unwrap(),
        Data::Value(CellValue::Int(10))
    );
    assert_eq!(
        doc.get_data("'My Sheet'!A1:B1").unwrap(),
        Data::Matrix(vec![vec![CellValue::Float(1.5), CellValue::Float(2.5)]])
    );
    assert_eq!(
        doc.get_data("Inventory!A:B").unwrap(),
        Data::Matrix(vec![
            vec![CellValue::from("name"), CellValue::from("qty")],
            vec![CellValue::from("apple"), CellValue::Int(3)],
            vec![CellValue::from("pear"), CellValue::Int(10)],
            vec![CellValue::from("plum"), CellValue::Int(7)],
        ])
    );
}

#[test]
fn test_defined_names() {
    let mut doc = with_names();

    let names = doc.defined_names().unwrap();
    assert_eq!(names.len(), 6);
    assert!(matches!(
        names.iter().find(|n| n.name == "Rate").unwrap().value,
        DefinedNameValue::Formula(_)
    ));

    assert_eq!(
        doc.get_data("Fruit").unwrap(),
        Data::Matrix(vec![
            vec![CellValue::from("apple")],
            vec![CellValue::from("pear")],
            vec![CellValue::from("plum")],
        ])
    );
    // names ignore case
    assert_eq!(
        doc.get_data("firstqty").unwrap(),
        Data::Value(CellValue::Int(3))
    );
    assert_eq!(doc.get_data("Rate").unwrap(), Data::Value(CellValue::Float(0.25)));
    assert_eq!(
        doc.get_data("Greeting").unwrap(),
        Data::Value(CellValue::from("hello"))
    );
    assert_eq!(
        doc.get_data("'My Sheet'!Local").unwrap(),
        Data::Value(CellValue::Float(2.5))
    );
}

#[test]
fn test_lookup_errors() {
    let mut doc = with_names();

    // a sheet-local name is not visible workbook-wide
    assert!(matches!(
        doc.get_data("Local"),
        Err(XlsxError::Core(Error::InvalidAddress(_)))
    ));
    // plain references need a sheet
    assert!(matches!(
        doc.get_data("A1"),
        Err(XlsxError::Core(Error::InvalidAddress(_)))
    ));
    assert!(matches!(
        doc.get_data("Nowhere!A1"),
        Err(XlsxError::Core(Error::SheetNotFound(_)))
    ));
    assert!(matches!(
        doc.cell_value("Inventory", "A0"),
        Err(XlsxError::Core(Error::InvalidAddress(_)))
    ));
    assert!(matches!(
        doc.range_values("Inventory", "B2:A1"),
        Err(XlsxError::Core(Error::InvalidAddress(_)))
    ));
}

#[test]
fn test_range_and_column_values() {
    let mut doc = with_names();

    assert_eq!(
        doc.range_values("Inventory", "B3:C3").unwrap(),
        vec![vec![
            CellValue::Int(3),
            CellValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        ]]
    );
    // rows run from the first to the last row with values
    let columns = doc.column_values("Inventory", "B:B").unwrap();
    assert_eq!(columns.len(), 4);
    assert_eq!(columns[0], vec![CellValue::from("qty")]);
    assert!(doc.column_values("Inventory", "X:Z").unwrap().is_empty());
}
