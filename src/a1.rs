//! A1-notation arithmetic for Google Sheets.
//!
//! Columns are addressed by 0-based index (`0` is column `A`) and rows by logical
//! data-row index: `0` is the first row of data below the header row and any
//! `row_offset` rows that follow it (for example a description row).

use crate::error::{GoogleError, Result};

/// Rows occupied above the first data row when no extra offset is used:
/// one for 1-based numbering and one for the header.
const HEADER_ROWS: u32 = 2;

/// Convert a 0-based column index into its letter name (`0 -> A`, `26 -> AA`).
///
/// ```
/// use gdrive_sheets::a1::column_index_to_letter;
///
/// assert_eq!(column_index_to_letter(0), "A");
/// assert_eq!(column_index_to_letter(27), "AB");
/// ```
pub fn column_index_to_letter(index: u32) -> String {
    let mut letters = Vec::new();
    let mut n = i64::from(index);

    while n >= 0 {
        letters.push(b'A' + (n % 26) as u8);
        n = n / 26 - 1;
    }

    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

/// Convert a column letter name back into its 0-based index.
///
/// Case-insensitive and whitespace-trimmed. Anything other than `A`-`Z`
/// after trimming, including an empty string, is rejected.
pub fn column_letter_to_index(letter: &str) -> Result<u32> {
    let name = letter.trim().to_ascii_uppercase();

    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(GoogleError::InvalidColumnName(letter.to_string()));
    }

    let mut result: u64 = 0;
    for b in name.bytes() {
        result = result * 26 + u64::from(b - b'A' + 1);
        if result > u64::from(u32::MAX) + 1 {
            return Err(GoogleError::InvalidColumnName(letter.to_string()));
        }
    }

    u32::try_from(result - 1).map_err(|_| GoogleError::InvalidColumnName(letter.to_string()))
}

/// 1-based sheet row for a logical data row. Saturates instead of overflowing;
/// out-of-range rows are left for the Sheets API to reject.
pub fn data_row_to_sheet_row(data_row: u32, row_offset: u32) -> u32 {
    data_row
        .saturating_add(HEADER_ROWS)
        .saturating_add(row_offset)
}

/// Quote a sheet name for use in a range when it contains anything besides
/// ASCII letters, digits and underscores.
pub fn quote_sheet_name(sheet: &str) -> String {
    let bare = !sheet.is_empty()
        && sheet
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if bare {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

/// A cell address: 0-based column index and 1-based sheet row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub column: u32,
    pub row: u32,
}

impl CellRef {
    /// Address of a logical data cell.
    pub fn data(data_row: u32, column: u32, row_offset: u32) -> Self {
        Self {
            column,
            row: data_row_to_sheet_row(data_row, row_offset),
        }
    }

    pub fn to_a1(self) -> String {
        format!("{}{}", column_index_to_letter(self.column), self.row)
    }
}

/// `Sheet!B3` for a single data cell.
pub fn cell_range(sheet: &str, data_row: u32, column: u32, row_offset: u32) -> String {
    format!(
        "{}!{}",
        quote_sheet_name(sheet),
        CellRef::data(data_row, column, row_offset).to_a1()
    )
}

/// `Sheet!B3:B3`-style rectangle between two corners (inclusive).
pub fn span_range(sheet: &str, start: CellRef, end: CellRef) -> String {
    format!(
        "{}!{}:{}",
        quote_sheet_name(sheet),
        start.to_a1(),
        end.to_a1()
    )
}

/// Horizontal run of `len` cells in one data row, starting at `start_column`.
pub fn row_range(
    sheet: &str,
    data_row: u32,
    start_column: u32,
    len: u32,
    row_offset: u32,
) -> Result<String> {
    let last = last_index(start_column, len)?;
    Ok(span_range(
        sheet,
        CellRef::data(data_row, start_column, row_offset),
        CellRef::data(data_row, last, row_offset),
    ))
}

/// Vertical run of `len` cells in one column, starting at `start_data_row`.
pub fn column_range(
    sheet: &str,
    column: u32,
    start_data_row: u32,
    len: u32,
    row_offset: u32,
) -> Result<String> {
    let last = last_index(start_data_row, len)?;
    Ok(span_range(
        sheet,
        CellRef::data(start_data_row, column, row_offset),
        CellRef::data(last, column, row_offset),
    ))
}

/// Rectangle of `rows` x `columns` cells anchored at a data cell.
pub fn rect_range(
    sheet: &str,
    start_data_row: u32,
    start_column: u32,
    rows: u32,
    columns: u32,
    row_offset: u32,
) -> Result<String> {
    let last_row = last_index(start_data_row, rows)?;
    let last_column = last_index(start_column, columns)?;
    Ok(span_range(
        sheet,
        CellRef::data(start_data_row, start_column, row_offset),
        CellRef::data(last_row, last_column, row_offset),
    ))
}

/// Everything from the header row down, across all columns.
pub fn sheet_range(sheet: &str) -> String {
    quote_sheet_name(sheet)
}

fn last_index(start: u32, len: u32) -> Result<u32> {
    if len == 0 {
        return Err(GoogleError::InvalidArgument(
            "range must span at least one cell".to_string(),
        ));
    }
    start.checked_add(len - 1).ok_or_else(|| {
        GoogleError::InvalidArgument(format!("range end overflows: {start} + {len}"))
    })
}

/// 0-based, end-exclusive row indices as used by `deleteDimension`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub start_index: u32,
    pub end_index: u32,
}

impl RowSpan {
    /// Span covering `count` data rows starting at `start_data_row`.
    pub fn data_rows(start_data_row: u32, count: u32, row_offset: u32) -> Result<Self> {
        let last = last_index(start_data_row, count)?;
        Ok(Self {
            start_index: data_row_to_sheet_row(start_data_row, row_offset) - 1,
            end_index: data_row_to_sheet_row(last, row_offset),
        })
    }

    /// Number of sheet rows covered.
    pub fn row_count(&self) -> u32 {
        self.end_index - self.start_index
    }
}
