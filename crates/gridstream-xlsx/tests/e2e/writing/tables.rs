//! Tests for writing tables.

use crate::{inventory, open_read, open_rw};
use chrono::NaiveDate;
use gridstream_core::{CellValue, ColumnRange, TableOptions};
use gridstream_xlsx::{Document, OpenOptions};
use pretty_assertions::assert_eq;

#[test]
fn test_write_table_next_to_existing_data() {
    let mut doc = open_rw(inventory().build());
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    doc.write_table(
        "Inventory",
        &["city", "sold", "on"],
        &[
            vec![CellValue::from("Oslo"), CellValue::from("Lima")],
            vec![CellValue::Int(4), CellValue::Float(0.5)],
            vec![CellValue::Date(day), CellValue::Empty],
        ],
        "E7",
    )
    .unwrap();
    let mut doc = open_read(doc.close().unwrap().unwrap());

    let table = doc
        .read_table(
            "Inventory",
            TableOptions::default().columns(ColumnRange::parse("E:G").unwrap()),
        )
        .unwrap();
    assert_eq!(table.labels, vec!["city", "sold", "on"]);
    assert_eq!(
        table.columns,
        vec![
            vec![CellValue::from("Oslo"), CellValue::from("Lima")],
            vec![CellValue::Int(4), CellValue::Float(0.5)],
            vec![CellValue::Date(day), CellValue::Empty],
        ]
    );

    // the table that was already there is untouched
    let table = doc
        .read_table(
            "Inventory",
            TableOptions::default().columns(ColumnRange::parse("A:C").unwrap()),
        )
        .unwrap();
    assert_eq!(table.row_count(), 3);
    assert_eq!(doc.sheet_dimension("Inventory").unwrap().unwrap().to_string(), "A2:G9");
}

#[test]
fn test_write_header_only_table() {
    let mut doc = Document::create(OpenOptions::write_new()).unwrap();
    let columns: Vec<Vec<CellValue>> = vec![Vec::new(), Vec::new()];
    doc.write_table("Sheet1", &["a", "b"], &columns, "B2").unwrap();
    let mut doc = open_read(doc.close().unwrap().unwrap());

    assert_eq!(
        doc.range_values("Sheet1", "B2:C2").unwrap(),
        vec![vec![CellValue::from("a"), CellValue::from("b")]]
    );
    assert_eq!(doc.cell_value("Sheet1", "B3").unwrap(), CellValue::Empty);
}
