use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::error::{MergeError, ReadCause};
use crate::model::{FileFormat, RawTable};
use crate::table_parse::{fit_rows_to_width, is_blank_row};

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        other => other.to_string(),
    }
}

/// Reads one worksheet; the first row of its used range is the header.
pub(crate) fn read_sheet(
    file_name: &str,
    bytes: &[u8],
    sheet_index: usize,
) -> Result<RawTable, MergeError> {
    let fail = |cause: ReadCause| MergeError::read(file_name, FileFormat::Spreadsheet, cause);

    if bytes.is_empty() {
        return Err(fail(ReadCause::Empty));
    }

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|error| fail(error.into()))?;
    let available = workbook.sheet_names().len();
    let range = workbook
        .worksheet_range_at(sheet_index)
        .ok_or_else(|| {
            fail(ReadCause::MissingSheet {
                index: sheet_index,
                available,
            })
        })?
        .map_err(|error| fail(error.into()))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows
        .next()
        .filter(|headers| !is_blank_row(headers))
        .ok_or_else(|| fail(ReadCause::MissingHeader))?;
    let data = rows.filter(|row| !is_blank_row(row)).collect::<Vec<_>>();

    let width = headers.len();
    Ok(RawTable::new(headers, fit_rows_to_width(data, width)))
}
