//! Common utilities for E2E tests.
//!
//! Fixtures are built in memory from hand-written part XML, the way a
//! spreadsheet application lays a package out.

use gridstream_xlsx::{Document, MemoryPackage, OpenOptions};

pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="5"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="1" fontId="1" fillId="0" borderId="0" xfId="0" applyNumberFormat="1" applyFont="1"/><xf numFmtId="20" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Style index of a short date (`m/d/yyyy`)
pub const STYLE_DATE: u32 = 1;
/// Style index of a custom date-time format
pub const STYLE_DATETIME: u32 = 2;
/// Style index of a bold integer (`0`)
pub const STYLE_INT: u32 = 3;
/// Style index of a time of day (`h:mm`)
pub const STYLE_TIME: u32 = 4;

/// Builder for an in-memory package
#[derive(Default)]
pub struct PackageBuilder {
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
    defined_names: Vec<String>,
    date1904: bool,
    extra_parts: Vec<(String, String)>,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet with the given `<sheetData>` content
    pub fn sheet(mut self, name: &str, sheet_data: &str) -> Self {
        self.sheets.push((name.to_string(), worksheet(None, sheet_data)));
        self
    }

    /// Add a sheet with a whole worksheet part
    pub fn sheet_part(mut self, name: &str, xml: &str) -> Self {
        self.sheets.push((name.to_string(), xml.to_string()));
        self
    }

    /// Shared strings, in index order
    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    /// A `<definedName>` element, given as XML
    pub fn defined_name(mut self, xml: &str) -> Self {
        self.defined_names.push(xml.to_string());
        self
    }

    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// A part the engine does not know about
    pub fn part(mut self, name: &str, xml: &str) -> Self {
        self.extra_parts.push((name.to_string(), xml.to_string()));
        self
    }

    pub fn build(self) -> MemoryPackage {
        let mut types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );
        let mut sheets = String::new();
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        );
        let mut package = MemoryPackage::new();

        for (i, (name, xml)) in self.sheets.iter().enumerate() {
            let n = i + 1;
            types.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                n
            ));
            sheets.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                name, n, n
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                n, n
            ));
            package.insert(format!("xl/worksheets/sheet{}.xml", n), xml.as_str());
        }

        if !self.shared_strings.is_empty() {
            types.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
            rels.push_str(r#"<Relationship Id="rIdStrings" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#);
            let mut sst = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
                self.shared_strings.len()
            );
            for s in &self.shared_strings {
                sst.push_str(&format!("<si><t>{}</t></si>", s));
            }
            sst.push_str("</sst>");
            package.insert("xl/sharedStrings.xml", sst);
        }

        types.push_str("</Types>");
        rels.push_str("</Relationships>");

        let names = if self.defined_names.is_empty() {
            String::new()
        } else {
            format!("<definedNames>{}</definedNames>", self.defined_names.concat())
        };
        let workbook = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr{}/><bookViews><workbookView activeTab="0"/></bookViews><sheets>{}</sheets>{}<calcPr calcId="191029"/></workbook>"#,
            if self.date1904 { r#" date1904="1""# } else { "" },
            sheets,
            names
        );

        package.insert("[Content_Types].xml", types);
        package.insert(
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        );
        package.insert("xl/workbook.xml", workbook);
        package.insert("xl/_rels/workbook.xml.rels", rels);
        package.insert("xl/styles.xml", STYLES);
        for (name, xml) in self.extra_parts {
            package.insert(name, xml);
        }
        package
    }
}

/// A worksheet part around `sheet_data` (the inside of `<sheetData>`)
pub fn worksheet(dimension: Option<&str>, sheet_data: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{}<sheetViews><sheetView workbookViewId="0"/></sheetViews><sheetFormatPr defaultRowHeight="15"/><cols><col min="1" max="1" width="18" customWidth="1"/></cols><sheetData>{}</sheetData><mergeCells count="1"><mergeCell ref="F1:G1"/></mergeCells><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#,
        dimension.map_or_else(String::new, |d| format!(r#"<dimension ref="{}"/>"#, d)),
        sheet_data
    )
}

/// A sheet holding a small table: a header row and three data rows
///
/// |   | A     | B     | C          |
/// |---|-------|-------|------------|
/// | 2 | name  | qty   | when       |
/// | 3 | apple | 3     | 2024-01-15 |
/// | 4 | pear  | 10    | 2024-02-01 |
/// | 5 | plum  | 7     | 2024-03-10 |
pub fn inventory() -> PackageBuilder {
    PackageBuilder::new()
        .shared_strings(&["name", "qty", "when", "apple", "pear", "plum"])
        .sheet_part(
            "Inventory",
            &worksheet(
                Some("A2:C5"),
                r#"<row r="2"><c r="A2" t="s"><v>0</v></c><c r="B2" t="s"><v>1</v></c><c r="C2" t="s"><v>2</v></c></row><row r="3"><c r="A3" t="s"><v>3</v></c><c r="B3" s="3"><v>3</v></c><c r="C3" s="1"><v>45306</v></c></row><row r="4"><c r="A4" t="s"><v>4</v></c><c r="B4" s="3"><v>10</v></c><c r="C4" s="1"><v>45323</v></c></row><row r="5"><c r="A5" t="s"><v>5</v></c><c r="B5" s="3"><v>7</v></c><c r="C5" s="1"><v>45361</v></c></row>"#,
            ),
        )
}

pub fn open_read(package: MemoryPackage) -> Document {
    Document::open(package, OpenOptions::read()).expect("package should open")
}

pub fn open_rw(package: MemoryPackage) -> Document {
    Document::open(package, OpenOptions::read_write()).expect("package should open")
}

pub fn part_text(package: &MemoryPackage, name: &str) -> String {
    let bytes = package
        .get(name)
        .unwrap_or_else(|| panic!("package should have {}", name));
    String::from_utf8(bytes.to_vec()).expect("part should be UTF-8")
}
