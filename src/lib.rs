mod aggregate;
mod clean;
mod config;
mod csv_out;
mod csv_reader;
mod error;
mod export;
mod header;
mod model;
mod normalize;
mod options;
mod pdf_reader;
mod reader;
mod registry;
mod sheet_reader;
mod synonyms;
mod table_detect;
mod table_parse;
mod warning;
mod xlsx_out;

use serde::Serialize;
use tracing::{debug, info, warn};

pub use aggregate::aggregate;
pub use clean::{CleanStats, clean_rows, parse_quantity};
pub use config::MergeConfig;
pub use error::{MergeError, ReadCause};
pub use export::{EXPORT_HEADERS, ExportBuffer, ExportFormat, export};
pub use model::{
    AccountOutcome, AccountUpload, AggregateRow, CanonicalField, CanonicalRow, FileFormat,
    OutcomeStatus, RawTable, UploadedFile,
};
pub use normalize::{ColumnMapping, HeaderMatcher, NormalizedRow, NormalizedTable, normalize_table};
pub use options::{MergeOptions, PageSelection, QualityMode};
pub use reader::read_tables;
pub use registry::AccountRegistry;
pub use synonyms::SynonymTable;
pub use warning::{MergeWarning, WarningCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub product_count: usize,
    pub account_count: usize,
    pub total_quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub outcomes: Vec<AccountOutcome>,
    pub rows: Vec<AggregateRow>,
    pub warnings: Vec<MergeWarning>,
}

impl MergeReport {
    #[must_use]
    pub fn summary(&self) -> MergeSummary {
        MergeSummary {
            product_count: self.rows.len(),
            account_count: self
                .outcomes
                .iter()
                .filter(|outcome| outcome.status == OutcomeStatus::Success)
                .count(),
            total_quantity: self
                .rows
                .iter()
                .fold(0_u64, |sum, row| sum.saturating_add(row.total_quantity)),
        }
    }
}

struct AccountRows {
    rows: Vec<CanonicalRow>,
    tables_used: usize,
}

fn located(warning: MergeWarning, page: Option<u32>, table_id: usize) -> MergeWarning {
    let warning = warning.with_table_id(table_id);
    match page {
        Some(page) => warning.with_page(page),
        None => warning,
    }
}

fn clean_warnings(
    stats: CleanStats,
    page: Option<u32>,
    table_id: usize,
    warnings: &mut Vec<MergeWarning>,
) {
    if stats.coerced > 0 {
        warnings.push(located(
            MergeWarning::new(
                WarningCode::QuantityCoerced,
                format!("{} row(s) had an unreadable quantity and count as 0", stats.coerced),
            ),
            page,
            table_id,
        ));
    }
    if stats.dropped > 0 {
        warnings.push(located(
            MergeWarning::new(
                WarningCode::RowsDropped,
                format!("{} row(s) without a product id were dropped", stats.dropped),
            ),
            page,
            table_id,
        ));
    }
}

fn process_account(
    upload: &AccountUpload,
    options: &MergeOptions,
    matcher: &HeaderMatcher<'_>,
    warnings: &mut Vec<MergeWarning>,
) -> Result<AccountRows, MergeError> {
    let file = upload
        .file
        .as_ref()
        .ok_or_else(|| MergeError::MissingUpload {
            account: upload.account.clone(),
        })?;

    let mut rows = Vec::new();
    let mut tables_used = 0;
    let mut rejections = Vec::new();
    for table in read_tables(file, options, warnings)? {
        let (page, table_id) = (table.page, table.table_id);
        match normalize_table(table, &upload.account, matcher) {
            Ok(normalized) => {
                let (page, table_id) = (normalized.page, normalized.table_id);
                let input_rows = normalized.rows.len();
                let (cleaned, stats) = clean_rows(normalized);
                clean_warnings(stats, page, table_id, warnings);
                rows.extend(cleaned);
                debug!(
                    account = %upload.account,
                    ?page,
                    table_id,
                    input_rows,
                    coerced = stats.coerced,
                    dropped = stats.dropped,
                    "cleaned picklist table"
                );
                tables_used += 1;
            }
            Err(error) => rejections.push((page, table_id, error)),
        }
    }

    if tables_used == 0 {
        // Every table was rejected: the first rejection is the account's reason.
        return Err(rejections.into_iter().next().map_or_else(
            || MergeError::NoRows {
                file: file.file_name.clone(),
            },
            |(_, _, error)| error,
        ));
    }

    for (page, table_id, error) in rejections {
        warnings.push(located(
            MergeWarning::new(WarningCode::TableRejected, error.to_string()),
            page,
            table_id,
        ));
    }

    if rows.is_empty() {
        return Err(MergeError::NoRows {
            file: file.file_name.clone(),
        });
    }

    Ok(AccountRows { rows, tables_used })
}

fn failed_outcome(account: &str, error: &MergeError) -> AccountOutcome {
    AccountOutcome {
        account: account.to_string(),
        status: if error.is_skip() {
            OutcomeStatus::Skipped
        } else {
            OutcomeStatus::Failed
        },
        code: Some(error.code().to_string()),
        reason: Some(error.to_string()),
        tables_used: 0,
        rows_used: 0,
    }
}

/// Runs every account through read → normalize → clean, then aggregates
/// the surviving rows.
///
/// Per-account problems never abort the run; they are recorded in the
/// report's outcomes. Only when no account contributes a single row does
/// this return [`MergeError::EmptyInput`], carrying every outcome.
pub fn merge_picklists(
    uploads: &[AccountUpload],
    options: &MergeOptions,
) -> Result<MergeReport, MergeError> {
    options.validate()?;
    let matcher = HeaderMatcher::new(&options.synonyms, options.case_insensitive_headers);

    let mut outcomes = Vec::with_capacity(uploads.len());
    let mut canonical_rows = Vec::new();
    let mut warnings = Vec::new();

    for upload in uploads {
        let mut account_warnings = Vec::new();
        let result = process_account(upload, options, &matcher, &mut account_warnings);
        warnings.extend(
            account_warnings
                .into_iter()
                .map(|warning| warning.with_account(&upload.account)),
        );

        match result {
            Ok(account_rows) => {
                info!(
                    account = %upload.account,
                    tables = account_rows.tables_used,
                    rows = account_rows.rows.len(),
                    "account merged"
                );
                outcomes.push(AccountOutcome {
                    account: upload.account.clone(),
                    status: OutcomeStatus::Success,
                    code: None,
                    reason: None,
                    tables_used: account_rows.tables_used,
                    rows_used: account_rows.rows.len(),
                });
                canonical_rows.extend(account_rows.rows);
            }
            Err(error) => {
                warn!(account = %upload.account, code = error.code(), "{error}");
                outcomes.push(failed_outcome(&upload.account, &error));
            }
        }
    }

    if canonical_rows.is_empty() {
        return Err(MergeError::EmptyInput { outcomes });
    }

    let report = MergeReport {
        rows: aggregate(&canonical_rows),
        outcomes,
        warnings,
    };
    let summary = report.summary();
    info!(
        products = summary.product_count,
        accounts = summary.account_count,
        total_quantity = summary.total_quantity,
        "picklists merged"
    );

    Ok(report)
}
