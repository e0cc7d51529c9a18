use csv::WriterBuilder;

use crate::error::MergeError;
use crate::export::{EXPORT_HEADERS, join_values};
use crate::model::AggregateRow;

pub(crate) fn write_csv_bytes(rows: &[AggregateRow]) -> Result<Vec<u8>, MergeError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    writer.write_record(EXPORT_HEADERS)?;
    for row in rows {
        let total = row.total_quantity.to_string();
        let accounts = join_values(&row.source_accounts);
        let orders = join_values(&row.order_ids);
        writer.write_record([
            row.product_id.as_str(),
            total.as_str(),
            accounts.as_str(),
            orders.as_str(),
        ])?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|error| MergeError::Io(error.into_error()))
}
