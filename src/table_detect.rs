use crate::error::ReadCause;
use crate::model::{DetectedTable, PageText};
use crate::options::QualityMode;
use crate::table_parse::{modal_width, soft_split_line_into_cells, split_line_into_cells};
use crate::warning::{MergeWarning, WarningCode};

pub(crate) const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

#[allow(clippy::cast_precision_loss)]
fn table_confidence(rows: &[Vec<String>]) -> f32 {
    if rows.len() < 2 {
        return 0.0;
    }

    let modal = modal_width(rows);
    if modal == 0 {
        return 0.0;
    }

    let consistent =
        rows.iter().filter(|row| row.len() == modal).count() as f32 / rows.len() as f32;
    let max_width = rows.iter().map(Vec::len).max().unwrap_or(modal);
    let min_width = rows.iter().map(Vec::len).min().unwrap_or(modal);
    let uniformity = if max_width == 0 {
        0.0
    } else {
        1.0 - ((max_width - min_width) as f32 / max_width as f32)
    };

    (consistent * 0.75 + uniformity * 0.25).clamp(0.0, 1.0)
}

const FOOTER_LABELS: [&str; 7] = [
    "total",
    "totals",
    "subtotal",
    "sub total",
    "grand total",
    "total items",
    "total units",
];

/// `Page 3`, `Page 3 of 7`, `Page 3/7`.
fn is_page_marker(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    let starts_with_page = tokens
        .next()
        .is_some_and(|token| token.eq_ignore_ascii_case("page"));
    let rest = tokens.collect::<Vec<_>>();

    starts_with_page
        && !rest.is_empty()
        && rest.iter().all(|token| {
            token.eq_ignore_ascii_case("of")
                || token.chars().all(|ch| ch.is_ascii_digit() || ch == '/')
        })
}

fn is_footer_line(line: &str) -> bool {
    if is_page_marker(line) {
        return true;
    }

    split_line_into_cells(line).first().is_some_and(|first| {
        let label = first.trim_end_matches(':').trim().to_ascii_lowercase();
        FOOTER_LABELS.contains(&label.as_str())
    })
}

struct LineCells {
    cells: Vec<String>,
    soft: bool,
}

fn line_cells(line: &str, min_cols: usize) -> LineCells {
    let cells = split_line_into_cells(line);
    if cells.len() >= min_cols {
        return LineCells { cells, soft: false };
    }

    let soft_cells = soft_split_line_into_cells(line);
    let has_numeric = soft_cells
        .iter()
        .any(|cell| cell.chars().any(|ch| ch.is_ascii_digit()));
    let looks_like_sentence = ['.', '!', '?']
        .iter()
        .any(|punctuation| line.trim_end().ends_with(*punctuation));
    if soft_cells.len() >= min_cols && !looks_like_sentence && (has_numeric || soft_cells.len() <= 6)
    {
        LineCells {
            cells: soft_cells,
            soft: true,
        }
    } else {
        LineCells { cells, soft: false }
    }
}

/// A table is a run of at least two consecutive lines with `min_cols` cells.
///
/// Footer lines (totals, page markers) end a run. So does a line that only
/// splits on single spaces when its width differs from the run's first row.
fn detect_tables_in_page(page: &PageText, min_cols: usize) -> Vec<DetectedTable> {
    let mut tables = Vec::new();
    let mut current_rows: Vec<Vec<String>> = Vec::new();

    let flush_current = |rows: &mut Vec<Vec<String>>, tables: &mut Vec<DetectedTable>| {
        if rows.len() >= 2 {
            let confidence = table_confidence(rows);
            tables.push(DetectedTable {
                page: page.page_number,
                rows: std::mem::take(rows),
                confidence,
            });
        } else {
            rows.clear();
        }
    };

    for line in page.text.lines() {
        if is_footer_line(line) {
            flush_current(&mut current_rows, &mut tables);
            continue;
        }

        let LineCells { cells, soft } = line_cells(line, min_cols);
        if cells.len() < min_cols {
            flush_current(&mut current_rows, &mut tables);
            continue;
        }

        let breaks_width = soft
            && current_rows
                .first()
                .is_some_and(|first| first.len() != cells.len());
        if breaks_width {
            flush_current(&mut current_rows, &mut tables);
        }
        current_rows.push(cells);
    }

    flush_current(&mut current_rows, &mut tables);
    tables
}

pub(crate) fn detect_tables(
    pages: &[PageText],
    full_text: Option<&str>,
    min_cols: usize,
    warnings: &mut Vec<MergeWarning>,
) -> Vec<DetectedTable> {
    let min_cols = min_cols.max(2);
    let tables = pages
        .iter()
        .flat_map(|page| detect_tables_in_page(page, min_cols))
        .collect::<Vec<_>>();
    if !tables.is_empty() {
        return tables;
    }

    let Some(text) = full_text.filter(|text| !text.trim().is_empty()) else {
        return tables;
    };
    let whole_document = PageText {
        page_number: 1,
        text: text.to_string(),
    };
    let fallback = detect_tables_in_page(&whole_document, min_cols);
    if !fallback.is_empty() {
        warnings.push(MergeWarning::new(
            WarningCode::DocumentTextFallback,
            "no page-level tables detected; retried with document-level text extraction",
        ));
    }
    fallback
}

pub(crate) fn apply_quality_mode(
    tables: Vec<DetectedTable>,
    mode: QualityMode,
    warnings: &mut Vec<MergeWarning>,
) -> Result<Vec<DetectedTable>, ReadCause> {
    let mut out = Vec::new();

    for table in tables {
        if table.confidence >= LOW_CONFIDENCE_THRESHOLD {
            out.push(table);
            continue;
        }

        match mode {
            QualityMode::BestEffort => {
                warnings.push(
                    MergeWarning::new(
                        WarningCode::LowConfidence,
                        "table confidence is low; kept in best-effort mode",
                    )
                    .with_page(table.page)
                    .with_confidence(table.confidence),
                );
                out.push(table);
            }
            QualityMode::Strict => {
                return Err(ReadCause::AmbiguousTable {
                    page: table.page,
                    confidence: table.confidence,
                });
            }
            QualityMode::SkipAmbiguous => {
                warnings.push(
                    MergeWarning::new(WarningCode::LowConfidence, "skipping low-confidence table")
                        .with_page(table.page)
                        .with_confidence(table.confidence),
                );
            }
        }
    }

    Ok(out)
}
