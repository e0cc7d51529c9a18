use crate::model::CanonicalRow;
use crate::normalize::NormalizedTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    /// Rows whose quantity was blank or unparsable and became 0.
    pub coerced: usize,
    /// Rows dropped for lacking a product id.
    pub dropped: usize,
}

/// Parses a picklist quantity as a non-negative integer.
///
/// Accepts surrounding whitespace, a leading `+`, thousands separators and
/// integral decimals such as `3.0`. Returns `None` for anything else,
/// including negatives and fractional amounts.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn parse_quantity(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits = unsigned.replace(',', "");
    if digits.is_empty() {
        return None;
    }

    if let Ok(value) = digits.parse::<u64>() {
        return Some(value);
    }

    let value = digits.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

/// Converts normalized rows into canonical rows, preserving order.
///
/// Unparsable quantities are zero-filled rather than dropped; rows without a
/// product id are dropped.
#[must_use]
pub fn clean_rows(table: NormalizedTable) -> (Vec<CanonicalRow>, CleanStats) {
    let mut stats = CleanStats::default();
    let mut out = Vec::with_capacity(table.rows.len());

    for row in table.rows {
        if row.product_id.trim().is_empty() {
            stats.dropped += 1;
            continue;
        }

        let quantity = parse_quantity(&row.quantity).unwrap_or_else(|| {
            stats.coerced += 1;
            0
        });
        let order_id = row
            .order_id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        out.push(CanonicalRow {
            product_id: row.product_id,
            quantity,
            order_id,
            account: table.account.clone(),
        });
    }

    (out, stats)
}
