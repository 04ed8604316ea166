//! Tests for table extraction from worksheets.

use crate::{inventory, open_read, PackageBuilder};
use chrono::NaiveDate;
use gridstream_core::{CellValue, ColumnRange, Error, TableColumn, TableOptions, TableRow};
use gridstream_xlsx::XlsxError;
use pretty_assertions::assert_eq;

#[test]
fn test_table_with_header() {
    let mut doc = open_read(inventory().build());
    let rows: Vec<TableRow> = doc
        .table_rows("Inventory", TableOptions::default())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].labels(), &["name", "qty", "when"]);
    assert_eq!(rows[0].row_number(), 3);
    assert_eq!(rows[0]["name"], CellValue::from("apple"));
    assert_eq!(rows[1][2], CellValue::Int(10));
    assert_eq!(
        rows[2]["when"],
        CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    );
    assert_eq!(rows[2].index(), 3);
}

#[test]
fn test_read_table_by_column() {
    let mut doc = open_read(inventory().build());
    let table = doc.read_table("Inventory", TableOptions::default()).unwrap();

    assert_eq!(table.labels, vec!["name", "qty", "when"]);
    assert_eq!(table.row_count(), 3);
    assert_eq!(
        table.column("qty").unwrap(),
        &[CellValue::Int(3), CellValue::Int(10), CellValue::Int(7)]
    );
}

#[test]
fn test_read_table_with_inferred_types() {
    let package = inventory()
        .sheet(
            "Mixed",
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>n</t></is></c><c r="B1" t="inlineStr"><is><t>gap</t></is></c></row><row r="2"><c r="A2"><v>1.5</v></c></row><row r="3"><c r="A3" t="inlineStr"><is><t>x</t></is></c><c r="B3"><v>2.5</v></c></row>"#,
        )
        .build();
    let mut doc = open_read(package);

    let table = doc
        .read_table("Inventory", TableOptions::default().infer_types(true))
        .unwrap();
    let day = |m, d| Some(NaiveDate::from_ymd_opt(2024, m, d).unwrap());
    assert_eq!(
        table.typed_columns,
        Some(vec![
            TableColumn::Text(vec![
                Some("apple".to_string()),
                Some("pear".to_string()),
                Some("plum".to_string()),
            ]),
            TableColumn::Int(vec![Some(3), Some(10), Some(7)]),
            TableColumn::Date(vec![day(1, 15), day(2, 1), day(3, 10)]),
        ])
    );
    // the untyped columns are still there
    assert_eq!(table.column("qty").unwrap()[0], CellValue::Int(3));

    let table = doc
        .read_table("Mixed", TableOptions::default().infer_types(true))
        .unwrap();
    assert_eq!(
        table.typed_column("n"),
        Some(&TableColumn::Mixed(vec![CellValue::Float(1.5), CellValue::from("x")]))
    );
    assert_eq!(
        table.typed_column("gap"),
        Some(&TableColumn::Float(vec![None, Some(2.5)]))
    );

    let table = doc.read_table("Inventory", TableOptions::default()).unwrap();
    assert!(table.typed_columns.is_none());
}

#[test]
fn test_table_options() {
    let mut doc = open_read(inventory().build());

    // no header: the label row is data, labels are column letters
    let table = doc
        .read_table(
            "Inventory",
            TableOptions::default()
                .header(false)
                .columns(ColumnRange::parse("A:B").unwrap()),
        )
        .unwrap();
    assert_eq!(table.labels, vec!["A", "B"]);
    assert_eq!(table.row_count(), 4);
    assert_eq!(table.columns[0][0], CellValue::from("name"));

    // explicit labels replace the header cells
    let table = doc
        .read_table(
            "Inventory",
            TableOptions::default().column_labels(["fruit", "count", "date"]),
        )
        .unwrap();
    assert_eq!(table.labels, vec!["fruit", "count", "date"]);
    assert_eq!(table.row_count(), 3);

    // stop before the row the predicate matches
    let table = doc
        .read_table(
            "Inventory",
            TableOptions::default().stop_in_row(|row| row["name"] == CellValue::from("plum")),
        )
        .unwrap();
    assert_eq!(table.row_count(), 2);
}

#[test]
fn test_table_stops_at_empty_row() {
    let package = PackageBuilder::new()
        .shared_strings(&["id", "", "note"])
        .sheet(
            "S",
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>0</v></c></row><row r="2"><c r="A2"><v>1</v></c></row><row r="3"><c r="A3"><v>2</v></c></row><row r="5"><c r="A5"><v>3</v></c></row>"#,
        )
        .build();
    let mut doc = open_read(package);

    // empty and duplicate header cells get generated labels
    let table = doc.read_table("S", TableOptions::default()).unwrap();
    assert_eq!(table.labels, vec!["id", "Column2", "id_2"]);
    assert_eq!(table.row_count(), 2);

    let table = doc
        .read_table("S", TableOptions::default().stop_in_empty_row(false))
        .unwrap();
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.columns[0][2], CellValue::Float(3.0));
}

#[test]
fn test_table_config_errors() {
    let mut doc = open_read(inventory().build());

    assert!(matches!(
        doc.read_table("Inventory", TableOptions::default().column_labels(["only one"])),
        Err(XlsxError::Core(Error::InvalidTableConfig(_)))
    ));

    let mut empty = open_read(PackageBuilder::new().sheet("Empty", "").build());
    assert!(matches!(
        empty.read_table("Empty", TableOptions::default()),
        Err(XlsxError::Core(Error::TableNotFound(_)))
    ));
}
