use tracing::debug;

use crate::error::MergeError;
use crate::model::{CanonicalField, RawTable};
use crate::synonyms::SynonymTable;

/// Compares source header labels against the configured spellings.
#[derive(Debug, Clone, Copy)]
pub struct HeaderMatcher<'a> {
    synonyms: &'a SynonymTable,
    case_insensitive: bool,
}

impl<'a> HeaderMatcher<'a> {
    #[must_use]
    pub fn new(synonyms: &'a SynonymTable, case_insensitive: bool) -> Self {
        Self {
            synonyms,
            case_insensitive,
        }
    }

    fn matches(&self, header: &str, spelling: &str) -> bool {
        let header = header.trim();
        if self.case_insensitive {
            header.eq_ignore_ascii_case(spelling)
        } else {
            header == spelling
        }
    }

    #[must_use]
    pub fn is_known_header(&self, label: &str) -> bool {
        CanonicalField::ALL.into_iter().any(|field| {
            self.synonyms
                .synonyms(field)
                .iter()
                .any(|spelling| self.matches(label, spelling))
        })
    }

    /// Column index for `field`. Synonyms are tried in configured order and
    /// the leftmost header matching the first successful synonym wins.
    #[must_use]
    pub fn resolve(&self, field: CanonicalField, headers: &[String]) -> Option<usize> {
        self.synonyms.synonyms(field).iter().find_map(|spelling| {
            headers
                .iter()
                .position(|header| self.matches(header, spelling))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub product_id: usize,
    pub quantity: usize,
    pub order_id: Option<usize>,
}

impl ColumnMapping {
    pub fn resolve(headers: &[String], matcher: &HeaderMatcher<'_>) -> Result<Self, MergeError> {
        let required = |field| {
            matcher
                .resolve(field, headers)
                .ok_or_else(|| MergeError::Schema {
                    field,
                    headers: headers.to_vec(),
                })
        };

        Ok(Self {
            product_id: required(CanonicalField::ProductId)?,
            quantity: required(CanonicalField::Quantity)?,
            order_id: matcher.resolve(CanonicalField::OrderId, headers),
        })
    }
}

/// A row projected onto the canonical fields, values still uncleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub product_id: String,
    pub quantity: String,
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTable {
    pub account: String,
    pub page: Option<u32>,
    pub table_id: usize,
    pub rows: Vec<NormalizedRow>,
}

/// Projects `table` onto the canonical schema, or rejects it whole when a
/// required field has no matching header.
pub fn normalize_table(
    table: RawTable,
    account: &str,
    matcher: &HeaderMatcher<'_>,
) -> Result<NormalizedTable, MergeError> {
    let mapping = ColumnMapping::resolve(&table.headers, matcher)?;
    debug!(
        account,
        table_id = table.table_id,
        product_id = %table.headers[mapping.product_id],
        quantity = %table.headers[mapping.quantity],
        order_id = mapping.order_id.map(|index| table.headers[index].as_str()),
        "resolved picklist columns"
    );

    fn cell(row: &[String], index: usize) -> String {
        row.get(index).cloned().unwrap_or_default()
    }

    let rows = table
        .rows
        .iter()
        .map(|row| NormalizedRow {
            product_id: cell(row, mapping.product_id),
            quantity: cell(row, mapping.quantity),
            order_id: mapping.order_id.map(|index| cell(row, index)),
        })
        .collect();

    Ok(NormalizedTable {
        account: account.to_string(),
        page: table.page,
        table_id: table.table_id,
        rows,
    })
}
