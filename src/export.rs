use std::str::FromStr;

use crate::csv_out::write_csv_bytes;
use crate::error::MergeError;
use crate::model::AggregateRow;
use crate::xlsx_out::write_xlsx_bytes;

pub const EXPORT_HEADERS: [&str; 4] = [
    "ProductID",
    "Total_Quantity",
    "Source_Accounts",
    "Orders_Involved",
];

const MULTI_VALUE_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(format!("unknown export format '{other}', expected csv or xlsx")),
        }
    }
}

/// An export ready for delivery; nothing has been written anywhere yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBuffer {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: &'static str,
}

pub(crate) fn join_values(values: &[String]) -> String {
    values.join(MULTI_VALUE_SEPARATOR)
}

fn file_stem(merge_name: &str) -> String {
    let stem = merge_name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.' | ' ') {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>();
    let stem = stem.trim_matches(|ch: char| ch == '.' || ch.is_whitespace());

    if stem.is_empty() {
        "merged_picklist".to_string()
    } else {
        stem.to_string()
    }
}

/// Renders aggregate rows to an in-memory CSV or workbook buffer.
pub fn export(
    rows: &[AggregateRow],
    format: ExportFormat,
    merge_name: &str,
) -> Result<ExportBuffer, MergeError> {
    let bytes = match format {
        ExportFormat::Csv => write_csv_bytes(rows)?,
        ExportFormat::Xlsx => write_xlsx_bytes(rows, merge_name)?,
    };

    Ok(ExportBuffer {
        bytes,
        file_name: format!("{}.{}", file_stem(merge_name), format.extension()),
        content_type: format.content_type(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ExportFormat, export};
    use crate::model::AggregateRow;

    fn rows() -> Vec<AggregateRow> {
        vec![
            AggregateRow {
                product_id: "SKU1".to_string(),
                total_quantity: 7,
                source_accounts: vec!["A".to_string(), "B".to_string()],
                order_ids: vec!["O1".to_string(), "O2".to_string()],
            },
            AggregateRow {
                product_id: "SKU2".to_string(),
                total_quantity: 3,
                source_accounts: vec!["A".to_string()],
                order_ids: Vec::new(),
            },
        ]
    }

    #[test]
    fn csv_export_joins_multi_value_fields() {
        let buffer = export(&rows(), ExportFormat::Csv, "merged_picklist").expect("csv export");
        let text = String::from_utf8(buffer.bytes).expect("utf-8");

        assert_eq!(
            text,
            "ProductID,Total_Quantity,Source_Accounts,Orders_Involved\n\
             SKU1,7,\"A, B\",\"O1, O2\"\n\
             SKU2,3,A,\n"
        );
        assert_eq!(buffer.file_name, "merged_picklist.csv");
        assert_eq!(buffer.content_type, "text/csv; charset=utf-8");
    }

    #[test]
    fn empty_export_still_has_header() {
        let buffer = export(&[], ExportFormat::Csv, "x").expect("csv export");
        assert_eq!(
            String::from_utf8(buffer.bytes).expect("utf-8"),
            "ProductID,Total_Quantity,Source_Accounts,Orders_Involved\n"
        );
    }

    #[test]
    fn xlsx_export_is_a_zip_package() {
        let buffer = export(&rows(), ExportFormat::Xlsx, "October merge").expect("xlsx export");
        assert!(buffer.bytes.starts_with(b"PK"));
        assert_eq!(buffer.file_name, "October merge.xlsx");
        assert!(buffer.content_type.contains("spreadsheetml"));
    }

    #[test]
    fn file_names_are_made_safe() {
        let buffer = export(&[], ExportFormat::Csv, "../../etc/passwd").expect("csv export");
        assert_eq!(buffer.file_name, "_.._etc_passwd.csv");
        let buffer = export(&[], ExportFormat::Csv, "  ").expect("csv export");
        assert_eq!(buffer.file_name, "merged_picklist.csv");
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("xlsx".parse::<ExportFormat>(), Ok(ExportFormat::Xlsx));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
