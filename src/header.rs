use crate::model::{DetectedTable, RawTable};
use crate::normalize::HeaderMatcher;
use crate::table_parse::{fit_rows_to_width, modal_width};
use crate::warning::{MergeWarning, WarningCode};

fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim().replace(',', "");
    trimmed.parse::<f64>().is_ok()
}

#[allow(clippy::cast_precision_loss)]
fn non_numeric_ratio(cells: &[String]) -> f32 {
    if cells.is_empty() {
        return 0.0;
    }

    let non_numeric = cells.iter().filter(|cell| !is_numeric(cell)).count();
    non_numeric as f32 / cells.len() as f32
}

pub(crate) fn infer_has_header(rows: &[Vec<String>]) -> (bool, f32) {
    if rows.is_empty() {
        return (false, 0.0);
    }

    let first = non_numeric_ratio(&rows[0]);
    let second = rows.get(1).map_or(0.0, |row| non_numeric_ratio(row));

    let confidence = (first * 0.6 + (1.0 - second) * 0.4).clamp(0.0, 1.0);
    let has_header = first >= 0.6 && second <= 0.7;
    (has_header, confidence)
}

/// Turns detected PDF tables into raw tables keyed by their first row.
///
/// A table whose first row carries no recognised header and whose width
/// matches the previous table is treated as that table continuing past a
/// page break: its rows are appended under the earlier header.
pub(crate) fn assemble_raw_tables(
    tables: Vec<DetectedTable>,
    matcher: &HeaderMatcher<'_>,
    warnings: &mut Vec<MergeWarning>,
) -> Vec<RawTable> {
    let mut out: Vec<RawTable> = Vec::new();

    for (index, table) in tables.into_iter().enumerate() {
        let table_id = index + 1;
        let Some(first_row) = table.rows.first() else {
            continue;
        };

        let names_known_header = first_row.iter().any(|cell| matcher.is_known_header(cell));
        if !names_known_header {
            let width = modal_width(&table.rows);
            if let Some(previous) = out.last_mut().filter(|prev| prev.headers.len() == width) {
                warnings.push(
                    MergeWarning::new(
                        WarningCode::ContinuationTable,
                        "table has no header row; appended to the previous table",
                    )
                    .with_page(table.page)
                    .with_table_id(table_id),
                );
                previous.rows.extend(fit_rows_to_width(table.rows, width));
                continue;
            }

            let (has_header, confidence) = infer_has_header(&table.rows);
            if !has_header {
                warnings.push(
                    MergeWarning::new(
                        WarningCode::HeaderInferenceLowConfidence,
                        "first row does not look like a header; using it as one",
                    )
                    .with_page(table.page)
                    .with_table_id(table_id)
                    .with_confidence(confidence),
                );
            }
        }

        let mut rows = table.rows.into_iter();
        let headers = rows.next().unwrap_or_default();
        let width = headers.len();
        out.push(RawTable {
            headers,
            rows: fit_rows_to_width(rows.collect(), width),
            page: Some(table.page),
            table_id,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{assemble_raw_tables, infer_has_header};
    use crate::model::DetectedTable;
    use crate::normalize::HeaderMatcher;
    use crate::synonyms::SynonymTable;
    use crate::warning::WarningCode;

    fn rows(lines: &[&[&str]]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|line| line.iter().map(|cell| (*cell).to_string()).collect())
            .collect()
    }

    fn detected(page: u32, lines: &[&[&str]]) -> DetectedTable {
        DetectedTable {
            page,
            rows: rows(lines),
            confidence: 1.0,
        }
    }

    #[test]
    fn infers_headers_for_text_then_numeric_rows() {
        let (has_header, confidence) = infer_has_header(&rows(&[&["SKU", "Qty"], &["100", "3"]]));
        assert!(has_header);
        assert!(confidence > 0.5);
    }

    #[test]
    fn first_row_becomes_header() {
        let synonyms = SynonymTable::default();
        let matcher = HeaderMatcher::new(&synonyms, false);
        let mut warnings = Vec::new();
        let tables = assemble_raw_tables(
            vec![detected(1, &[&["SKU", "Qty"], &["A", "2"], &["B"]])],
            &matcher,
            &mut warnings,
        );

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["SKU", "Qty"]);
        assert_eq!(tables[0].rows, rows(&[&["A", "2"], &["B", ""]]));
        assert_eq!(tables[0].page, Some(1));
        assert!(warnings.is_empty());
    }

    #[test]
    fn headerless_table_continues_previous_one() {
        let synonyms = SynonymTable::default();
        let matcher = HeaderMatcher::new(&synonyms, false);
        let mut warnings = Vec::new();
        let tables = assemble_raw_tables(
            vec![
                detected(1, &[&["SKU", "Qty"], &["A", "2"]]),
                detected(2, &[&["B", "5"], &["C", "1"]]),
            ],
            &matcher,
            &mut warnings,
        );

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(warnings[0].code, WarningCode::ContinuationTable);
        assert_eq!(warnings[0].page, Some(2));
    }

    #[test]
    fn new_header_starts_new_table() {
        let synonyms = SynonymTable::default();
        let matcher = HeaderMatcher::new(&synonyms, false);
        let mut warnings = Vec::new();
        let tables = assemble_raw_tables(
            vec![
                detected(1, &[&["SKU", "Qty"], &["A", "2"]]),
                detected(2, &[&["Product ID", "Quantity"], &["C", "1"]]),
            ],
            &matcher,
            &mut warnings,
        );

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].table_id, 2);
    }
}
