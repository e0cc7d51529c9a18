use std::vec::IntoIter;

use crate::csv_reader::read_csv;
use crate::error::MergeError;
use crate::model::{FileFormat, RawTable, UploadedFile};
use crate::options::MergeOptions;
use crate::pdf_reader::read_pdf;
use crate::sheet_reader::read_sheet;
use crate::warning::MergeWarning;

/// Reads every raw table out of one uploaded file.
///
/// The file is read once; the returned iterator yields the tables of that
/// single pass. CSV and spreadsheet uploads yield exactly one table, PDFs
/// one per detected table.
pub fn read_tables(
    file: &UploadedFile,
    options: &MergeOptions,
    warnings: &mut Vec<MergeWarning>,
) -> Result<IntoIter<RawTable>, MergeError> {
    let format = file.format.ok_or_else(|| MergeError::UnsupportedFormat {
        file: file.file_name.clone(),
    })?;

    let tables = match format {
        FileFormat::Csv => vec![read_csv(&file.file_name, &file.bytes, options.delimiter)?],
        FileFormat::Spreadsheet => vec![read_sheet(
            &file.file_name,
            &file.bytes,
            options.sheet_index,
        )?],
        FileFormat::Pdf => read_pdf(&file.file_name, &file.bytes, options, warnings)?,
    };

    Ok(tables.into_iter())
}
