//! A1 notation helpers
//!
//! Columns are zero-based internally (`A` = 0) and rows are one-based, the way
//! spreadsheet users read them. Ranges may be open-ended downwards (`H1:W`),
//! which is how the rigid approach-log layout is read.

use std::fmt;
use std::str::FromStr;

use crate::error::InspectionError;

/// Convert column letters to a zero-based index (`A` -> 0, `AC` -> 28).
///
/// Non-letter characters are ignored; returns None when no letters remain.
pub fn column_index(letters: &str) -> Option<u32> {
    let mut result: u32 = 0;
    let mut seen = false;
    for ch in letters.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            continue;
        }
        seen = true;
        result = result * 26 + (upper as u32 - 'A' as u32 + 1);
    }
    if seen { Some(result - 1) } else { None }
}

/// Convert a zero-based column index back to letters (0 -> `A`, 28 -> `AC`)
pub fn column_letters(index: u32) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Quote a sheet name for use in a qualified range (`'My Sheet'!A1`)
pub fn quote_sheet_name(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// A rectangular (possibly open-ended) block of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct A1Range {
    pub start_col: u32,
    pub start_row: u32,
    /// Last column, inclusive. None means "to the last used column".
    pub end_col: Option<u32>,
    /// Last row, inclusive. None means "to the last used row".
    pub end_row: Option<u32>,
}

impl A1Range {
    /// A single cell
    pub fn cell(col: u32, row: u32) -> Self {
        Self {
            start_col: col,
            start_row: row,
            end_col: Some(col),
            end_row: Some(row),
        }
    }

    /// A horizontal span of one row
    pub fn row_span(start_col: u32, end_col: u32, row: u32) -> Self {
        Self {
            start_col,
            start_row: row,
            end_col: Some(end_col),
            end_row: Some(row),
        }
    }

    /// A column block from `start_row` down to the last used row
    pub fn columns_from(start_col: u32, end_col: u32, start_row: u32) -> Self {
        Self {
            start_col,
            start_row,
            end_col: Some(end_col),
            end_row: None,
        }
    }

    /// The whole sheet
    pub fn whole_sheet() -> Self {
        Self {
            start_col: 0,
            start_row: 1,
            end_col: None,
            end_row: None,
        }
    }

    /// Number of columns, when bounded
    pub fn width(&self) -> Option<usize> {
        self.end_col
            .map(|end| (end.saturating_sub(self.start_col) + 1) as usize)
    }

    /// Range text prefixed with a quoted sheet name.
    ///
    /// A range without an end column addresses the whole sheet, which the
    /// Sheets API expresses as the bare sheet name.
    pub fn qualified(&self, sheet: &str) -> String {
        if self.end_col.is_none() {
            return quote_sheet_name(sheet);
        }
        format!("{}!{}", quote_sheet_name(sheet), self)
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.start_col), self.start_row)?;
        match (self.end_col, self.end_row) {
            (Some(col), Some(row)) if col == self.start_col && row == self.start_row => Ok(()),
            (Some(col), Some(row)) => write!(f, ":{}{}", column_letters(col), row),
            (Some(col), None) => write!(f, ":{}", column_letters(col)),
            // Unbounded columns are only expressible through the sheet itself
            (None, _) => Ok(()),
        }
    }
}

fn split_cell(text: &str) -> Option<(u32, Option<u32>)> {
    let text = text.trim();
    let digits_at = text.find(|c: char| c.is_ascii_digit()).unwrap_or(text.len());
    let (letters, digits) = text.split_at(digits_at);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let col = column_index(letters)?;
    let row = if digits.is_empty() {
        None
    } else {
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(row)
    };
    Some((col, row))
}

impl FromStr for A1Range {
    type Err = InspectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InspectionError::InvalidRange(s.to_string());
        let (start, end) = match s.split_once(':') {
            Some((start, end)) => (start, Some(end)),
            None => (s, None),
        };

        let (start_col, start_row) = split_cell(start).ok_or_else(invalid)?;
        let start_row_value = start_row.unwrap_or(1);

        match end {
            None => {
                // "H5" is one cell, "H" is the whole column
                Ok(Self {
                    start_col,
                    start_row: start_row_value,
                    end_col: Some(start_col),
                    end_row: start_row,
                })
            }
            Some(end) => {
                let (end_col, end_row) = split_cell(end).ok_or_else(invalid)?;
                if end_col < start_col || end_row.is_some_and(|r| r < start_row_value) {
                    return Err(invalid());
                }
                Ok(Self {
                    start_col,
                    start_row: start_row_value,
                    end_col: Some(end_col),
                    end_row,
                })
            }
        }
    }
}
