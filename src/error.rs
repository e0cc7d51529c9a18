use std::io;

use thiserror::Error;

use crate::model::{AccountOutcome, CanonicalField, FileFormat};

/// Why a single file could not be turned into tables.
#[derive(Debug, Error)]
pub enum ReadCause {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet parse error: {0}")]
    Sheet(#[from] calamine::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("file is empty")]
    Empty,

    #[error("file has no header row")]
    MissingHeader,

    #[error("workbook has no sheet at index {index} ({available} available)")]
    MissingSheet { index: usize, available: usize },

    #[error("no pages available after applying selection")]
    NoPagesSelected,

    #[error("table on page {page} is too ambiguous (confidence={confidence:.2})")]
    AmbiguousTable { page: u32, confidence: f32 },
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to read {format} file '{file}': {cause}")]
    Read {
        file: String,
        format: FileFormat,
        #[source]
        cause: ReadCause,
    },

    #[error("unsupported file type for '{file}' (expected .csv, .xlsx, .xls, .ods or .pdf)")]
    UnsupportedFormat { file: String },

    #[error("no column matches required field {field} (headers: {headers:?})")]
    Schema {
        field: CanonicalField,
        headers: Vec<String>,
    },

    #[error("no tables could be extracted from '{file}'")]
    NoTables { file: String },

    #[error("no file was uploaded for account '{account}'")]
    MissingUpload { account: String },

    #[error("'{file}' contains no rows with a product id")]
    NoRows { file: String },

    #[error("no account produced any usable rows")]
    EmptyInput { outcomes: Vec<AccountOutcome> },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("account name cannot be empty")]
    EmptyAccountName,

    #[error("account '{0}' is already registered")]
    DuplicateAccount(String),

    #[error("account '{0}' is not registered")]
    UnknownAccount(String),

    #[error("CSV write error: {0}")]
    Export(#[from] csv::Error),

    #[error("workbook write error: {0}")]
    Workbook(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MergeError {
    pub(crate) fn read(file: &str, format: FileFormat, cause: impl Into<ReadCause>) -> Self {
        Self::Read {
            file: file.to_string(),
            format,
            cause: cause.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read_error",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::Schema { .. } => "schema_error",
            Self::NoTables { .. } => "no_tables",
            Self::MissingUpload { .. } => "missing_upload",
            Self::NoRows { .. } => "no_rows",
            Self::EmptyInput { .. } => "empty_input",
            Self::InvalidConfig(_) => "invalid_config",
            Self::InvalidOption(_) => "invalid_option",
            Self::EmptyAccountName => "empty_account_name",
            Self::DuplicateAccount(_) => "duplicate_account",
            Self::UnknownAccount(_) => "unknown_account",
            Self::Export(_) | Self::Workbook(_) => "export_error",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }

    /// Per-account failures that are reported as skips rather than hard failures.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::Schema { .. }
                | Self::NoTables { .. }
                | Self::MissingUpload { .. }
                | Self::NoRows { .. }
        )
    }
}
