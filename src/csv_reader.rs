use std::borrow::Cow;

use csv::ReaderBuilder;
use encoding_rs::{Encoding, WINDOWS_1252};

use crate::error::{MergeError, ReadCause};
use crate::model::{FileFormat, RawTable};
use crate::table_parse::{fit_rows_to_width, is_blank_row};

/// Decodes uploaded text honouring a UTF-8/UTF-16 BOM. Bytes that are not
/// valid UTF-8 are taken as Windows-1252, the usual spreadsheet export.
pub(crate) fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text;
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(bytes).0,
    }
}

pub(crate) fn read_csv(file_name: &str, bytes: &[u8], delimiter: u8) -> Result<RawTable, MergeError> {
    let fail = |cause: ReadCause| MergeError::read(file_name, FileFormat::Csv, cause);

    let text = decode_text(bytes);
    if text.trim().is_empty() {
        return Err(fail(ReadCause::Empty));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| fail(error.into()))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if is_blank_row(&headers) {
        return Err(fail(ReadCause::MissingHeader));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| fail(error.into()))?;
        let row = record.iter().map(str::to_string).collect::<Vec<_>>();
        if !is_blank_row(&row) {
            rows.push(row);
        }
    }

    let width = headers.len();
    Ok(RawTable::new(headers, fit_rows_to_width(rows, width)))
}
