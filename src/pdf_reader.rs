use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use encoding_rs::UTF_16BE;
use lopdf::Document;
use lopdf::Object;
use lopdf::content::Content;
use tracing::{debug, warn};

use crate::error::{MergeError, ReadCause};
use crate::header::assemble_raw_tables;
use crate::model::{FileFormat, PageText, RawTable};
use crate::normalize::HeaderMatcher;
use crate::options::{MergeOptions, PageSelection};
use crate::table_detect::{apply_quality_mode, detect_tables};
use crate::table_parse::{soft_split_line_into_cells, split_line_into_cells};
use crate::warning::MergeWarning;

struct PdfText {
    pages: Vec<PageText>,
    full_text: Option<String>,
}

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    if total == 0 {
        return false;
    }

    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    let utf16_hint = encoding.is_some_and(|name| {
        let lower = name.to_ascii_lowercase();
        lower.contains("utf16") || lower.contains("ucs2") || lower.contains("identity-h")
    });
    let has_bom = bytes.starts_with(&[0xFE, 0xFF]);
    if utf16_hint || has_bom {
        let payload = if has_bom { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(payload);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

/// Higher is better: multi-cell lines dominate, lines with digits (quantities)
/// add a little, mis-decoded text is heavily penalised.
fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut multi_cell_lines = 0_i64;
    let mut numeric_lines = 0_i64;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        non_empty_lines += 1;

        if split_line_into_cells(line).len() >= 2 || soft_split_line_into_cells(line).len() >= 3 {
            multi_cell_lines += 1;
        }
        if line.chars().any(|ch| ch.is_ascii_digit()) {
            numeric_lines += 1;
        }
    }

    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };
    multi_cell_lines * 50 + numeric_lines * 15 + non_empty_lines - broken_penalty
}

fn extract_text_from_page_content(document: &Document, page_id: lopdf::ObjectId) -> Option<String> {
    fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    text.push_str(&decode_pdf_bytes(encoding, bytes));
                }
                Object::Array(items) => {
                    collect_text(text, encoding, items);
                    text.push(' ');
                }
                Object::Integer(value) => {
                    if *value < -100 {
                        text.push(' ');
                    }
                }
                _ => {}
            }
        }
    }

    let raw_content = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&raw_content).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_encoding = None;
    for operation in content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                if let Some(font_name) = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                {
                    current_encoding = encodings.get(font_name).copied();
                }
            }
            "Tj" | "TJ" | "'" | "\"" => {
                collect_text(&mut current, current_encoding, &operation.operands);
            }
            "T*" | "Td" | "TD" | "ET" => {
                if !current.trim().is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
    }

    if !current.trim().is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Whole-document text from `pdf-extract`, or `None` when it errors or
/// panics. It panics on some fonts lopdf reads fine, such as a Type0 font
/// without `DescendantFonts`.
fn extract_document_text(input_pdf: &[u8]) -> Option<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(input_pdf)
    })) {
        Ok(result) => result.ok(),
        Err(_) => {
            warn!("pdf-extract panicked; falling back to per-page lopdf text");
            None
        }
    }
}

fn read_pdf_text(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<PdfText, ReadCause> {
    let document = Document::load_mem(input_pdf)?;
    let pages_map = document.get_pages();

    let full_text = extract_document_text(input_pdf);
    let extracted_pages = full_text
        .as_deref()
        .map(split_text_into_pages)
        .filter(|pages| pages.len() == pages_map.len());

    let mut pages = Vec::new();
    for (index, (page_no, page_id)) in pages_map.iter().enumerate() {
        if page_selection.is_some_and(|selection| !selection.contains(*page_no)) {
            continue;
        }

        let mut candidates = Vec::new();
        if let Some(text) = extracted_pages
            .as_ref()
            .and_then(|pages| pages.get(index).cloned())
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }
        if let Some(text) = extract_text_from_page_content(&document, *page_id) {
            candidates.push(text);
        }
        if let Some(text) = document
            .extract_text(&[*page_no])
            .ok()
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }

        let text = candidates
            .into_iter()
            .max_by_key(|text| extraction_quality_score(text))
            .unwrap_or_default();
        pages.push(PageText {
            page_number: *page_no,
            text,
        });
    }

    if pages.is_empty() {
        return Err(ReadCause::NoPagesSelected);
    }

    // The whole-document text only helps when it could not be split per page.
    let full_text = if extracted_pages.is_some() {
        None
    } else {
        full_text
    };
    Ok(PdfText { pages, full_text })
}

/// Extracts every picklist table from a PDF.
///
/// A document without any detectable table is `NoTables`, which callers
/// treat as a skip rather than a read failure.
pub(crate) fn read_pdf(
    file_name: &str,
    bytes: &[u8],
    options: &MergeOptions,
    warnings: &mut Vec<MergeWarning>,
) -> Result<Vec<RawTable>, MergeError> {
    let fail = |cause: ReadCause| MergeError::read(file_name, FileFormat::Pdf, cause);

    if bytes.is_empty() {
        return Err(fail(ReadCause::Empty));
    }

    let text = read_pdf_text(bytes, options.pages.as_ref()).map_err(fail)?;
    let detected = detect_tables(
        &text.pages,
        text.full_text.as_deref(),
        options.min_cols,
        warnings,
    );
    debug!(
        file = file_name,
        pages = text.pages.len(),
        tables = detected.len(),
        "detected PDF tables"
    );

    let kept = apply_quality_mode(detected, options.quality_mode, warnings).map_err(fail)?;
    let matcher = HeaderMatcher::new(&options.synonyms, options.case_insensitive_headers);
    let tables = assemble_raw_tables(kept, &matcher, warnings);
    if tables.is_empty() {
        return Err(MergeError::NoTables {
            file: file_name.to_string(),
        });
    }

    Ok(tables)
}
