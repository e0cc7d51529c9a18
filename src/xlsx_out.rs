//! Minimal single-sheet `.xlsx` writer.
//!
//! Strings are written inline (`t="inlineStr"`) so the package needs no
//! shared-strings or styles part.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::MergeError;
use crate::export::{EXPORT_HEADERS, join_values};
use crate::model::AggregateRow;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const MAX_SHEET_NAME_CHARS: usize = 31;

const CONTENT_TYPES: &str = concat!(
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"</Types>"#,
);

const ROOT_RELS: &str = concat!(
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#,
);

const WORKBOOK_RELS: &str = concat!(
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"</Relationships>"#,
);

/// Applies Excel's sheet-name rules: at most 31 characters, none of
/// `[]:*?/\`, no leading or trailing apostrophe.
pub(crate) fn sanitize_sheet_name(name: &str) -> String {
    let cleaned = name
        .chars()
        .map(|ch| {
            if matches!(ch, '[' | ']' | ':' | '*' | '?' | '/' | '\\') || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect::<String>();
    let trimmed = cleaned.trim().trim_matches('\'');
    let truncated = trimmed
        .chars()
        .take(MAX_SHEET_NAME_CHARS)
        .collect::<String>();

    if truncated.trim().is_empty() {
        "Picklist".to_string()
    } else {
        truncated
    }
}

fn push_text_cell(xml: &mut String, reference: &str, value: &str) {
    xml.push_str(&format!(
        r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
        escape(value)
    ));
}

fn push_number_cell(xml: &mut String, reference: &str, value: u64) {
    xml.push_str(&format!(r#"<c r="{reference}"><v>{value}</v></c>"#));
}

fn sheet_xml(rows: &[AggregateRow]) -> String {
    const COLUMNS: [char; 4] = ['A', 'B', 'C', 'D'];

    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    xml.push_str(r#"<row r="1">"#);
    for (column, header) in COLUMNS.iter().zip(EXPORT_HEADERS) {
        push_text_cell(&mut xml, &format!("{column}1"), header);
    }
    xml.push_str("</row>");

    for (index, row) in rows.iter().enumerate() {
        let line = index + 2;
        xml.push_str(&format!(r#"<row r="{line}">"#));
        push_text_cell(&mut xml, &format!("A{line}"), &row.product_id);
        push_number_cell(&mut xml, &format!("B{line}"), row.total_quantity);
        push_text_cell(&mut xml, &format!("C{line}"), &join_values(&row.source_accounts));
        push_text_cell(&mut xml, &format!("D{line}"), &join_values(&row.order_ids));
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{name}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        decl = XML_DECL,
        name = escape(sanitize_sheet_name(sheet_name).as_str()),
    )
}

pub(crate) fn write_xlsx_bytes(
    rows: &[AggregateRow],
    sheet_name: &str,
) -> Result<Vec<u8>, MergeError> {
    let parts = [
        ("[Content_Types].xml", format!("{XML_DECL}{CONTENT_TYPES}")),
        ("_rels/.rels", format!("{XML_DECL}{ROOT_RELS}")),
        ("xl/workbook.xml", workbook_xml(sheet_name)),
        ("xl/_rels/workbook.xml.rels", format!("{XML_DECL}{WORKBOOK_RELS}")),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, body) in parts {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(path, options)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}
