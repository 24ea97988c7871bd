//! Minimal single-sheet OpenXML workbook writer.
//!
//! The package holds content types, relationships, the workbook, one worksheet
//! and a shared strings table. Missing cells are omitted from the sheet.

use crate::domain::model::{Table, Value};
use crate::utils::error::Result;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

pub const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

pub fn write_workbook(table: &Table) -> Result<Vec<u8>> {
    let mut strings = SharedStrings::default();
    let sheet = worksheet_xml(table, &mut strings);
    write_package(&sheet, &strings.to_xml())
}

/// Zips a finished worksheet and shared strings table into a workbook package.
pub(crate) fn write_package(sheet: &str, shared: &str) -> Result<Vec<u8>> {
    let workbook = workbook_xml();

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    let parts: [(&str, &str); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", &workbook),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", sheet),
        ("xl/sharedStrings.xml", shared),
    ];

    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SHEET_NAME
    )
}

fn worksheet_xml(table: &Table, strings: &mut SharedStrings) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    if table.column_count() > 0 {
        xml.push_str(r#"<row r="1">"#);
        for (col, name) in table.column_names().into_iter().enumerate() {
            let index = strings.intern(name);
            let _ = write!(xml, r#"<c r="{}1" t="s"><v>{}</v></c>"#, column_letter(col), index);
        }
        xml.push_str("</row>");
    }

    for row in 0..table.row_count() {
        let row_number = row + 2;
        let _ = write!(xml, r#"<row r="{}">"#, row_number);
        for (col, column) in table.columns().iter().enumerate() {
            let reference = format!("{}{}", column_letter(col), row_number);
            match &column.values[row] {
                Value::Numeric(n) => {
                    let _ = write!(xml, r#"<c r="{}"><v>{}</v></c>"#, reference, n);
                }
                Value::Text(s) => {
                    let index = strings.intern(s);
                    let _ = write!(xml, r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, index);
                }
                Value::Boolean(b) => {
                    let _ = write!(xml, r#"<c r="{}" t="b"><v>{}</v></c>"#, reference, u8::from(*b));
                }
                Value::Missing => {}
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

#[derive(Debug, Default)]
struct SharedStrings {
    order: Vec<String>,
    index: HashMap<String, usize>,
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, text: &str) -> usize {
        self.references += 1;
        if let Some(&existing) = self.index.get(text) {
            return existing;
        }
        let position = self.order.len();
        self.order.push(text.to_string());
        self.index.insert(text.to_string(), position);
        position
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.references,
            self.order.len()
        );
        for text in &self.order {
            // 保留前後空白
            let _ = write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(text));
        }
        xml.push_str("</sst>");
        xml
    }
}

/// Zero-based column index to spreadsheet letters: 0 → A, 25 → Z, 26 → AA.
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // XML 1.0 不允許的控制字元直接略過
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Column;
    use std::io::Read;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(51), "AZ");
        assert_eq!(column_letter(52), "BA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(escape_xml("bell\u{7}"), "bell");
    }

    #[test]
    fn test_workbook_package_parts() {
        let table = Table::new(vec![
            Column::new("name", vec![Value::Text("Ada".into()), Value::Missing]),
            Column::new("score", vec![Value::Numeric(1.5), Value::Numeric(2.0)]),
        ])
        .unwrap();

        let bytes = write_workbook(&table).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        assert!(names.contains(&"xl/worksheets/sheet1.xml".to_string()));

        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains(r#"<c r="B2"><v>1.5</v></c>"#));
        // 缺值不輸出儲存格
        assert!(!sheet.contains(r#"r="A3""#));

        let mut shared = String::new();
        archive
            .by_name("xl/sharedStrings.xml")
            .unwrap()
            .read_to_string(&mut shared)
            .unwrap();
        assert!(shared.contains("uniqueCount=\"3\""));
    }

    #[test]
    fn test_zero_column_workbook_has_empty_sheet() {
        let bytes = write_workbook(&Table::empty()).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();

        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains("<sheetData></sheetData>"));
    }
}
