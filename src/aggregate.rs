use std::collections::{BTreeMap, HashSet};

use crate::model::{AggregateRow, CanonicalRow};

#[derive(Debug, Default)]
struct Group {
    total: u64,
    accounts: Vec<String>,
    seen_accounts: HashSet<String>,
    orders: Vec<String>,
    seen_orders: HashSet<String>,
}

impl Group {
    fn ingest(&mut self, row: &CanonicalRow) {
        self.total = self.total.saturating_add(row.quantity);
        if self.seen_accounts.insert(row.account.clone()) {
            self.accounts.push(row.account.clone());
        }
        if let Some(order) = row.order_id.as_ref().filter(|order| !order.is_empty()) {
            if self.seen_orders.insert(order.clone()) {
                self.orders.push(order.clone());
            }
        }
    }
}

/// Groups canonical rows by exact product id.
///
/// Output is sorted by ascending product id. Totals and the account/order
/// sets do not depend on input order; only the display order of accounts and
/// orders follows first appearance.
#[must_use]
pub fn aggregate<'a, I>(rows: I) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a CanonicalRow>,
{
    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();
    for row in rows {
        groups.entry(row.product_id.as_str()).or_default().ingest(row);
    }

    groups
        .into_iter()
        .map(|(product_id, group)| AggregateRow {
            product_id: product_id.to_string(),
            total_quantity: group.total,
            source_accounts: group.accounts,
            order_ids: group.orders,
        })
        .collect()
}
