use std::fmt::{Display, Formatter};
use std::path::Path;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
    pub confidence: f32,
}

/// Header labels and data rows exactly as found in one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub page: Option<u32>,
    pub table_id: usize,
}

impl RawTable {
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            page: None,
            table_id: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CanonicalField {
    ProductId,
    Quantity,
    OrderId,
}

impl CanonicalField {
    pub const ALL: [Self; 3] = [Self::ProductId, Self::Quantity, Self::OrderId];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductId => "ProductID",
            Self::Quantity => "Quantity",
            Self::OrderId => "OrderID",
        }
    }

    #[must_use]
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::OrderId)
    }
}

impl Display for CanonicalField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRow {
    pub product_id: String,
    pub quantity: u64,
    pub order_id: Option<String>,
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub product_id: String,
    pub total_quantity: u64,
    pub source_accounts: Vec<String>,
    pub order_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Spreadsheet,
    Pdf,
}

impl FileFormat {
    /// Infers the format from a file name's extension, ignoring case.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl Display for FileFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Csv => "CSV",
            Self::Spreadsheet => "spreadsheet",
            Self::Pdf => "PDF",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub format: Option<FileFormat>,
}

impl UploadedFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let format = FileFormat::from_file_name(&file_name);
        Self {
            file_name,
            bytes,
            format,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpload {
    pub account: String,
    pub file: Option<UploadedFile>,
}

impl AccountUpload {
    #[must_use]
    pub fn new(account: impl Into<String>, file: UploadedFile) -> Self {
        Self {
            account: account.into(),
            file: Some(file),
        }
    }

    #[must_use]
    pub fn missing(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountOutcome {
    pub account: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub tables_used: usize,
    pub rows_used: usize,
}
