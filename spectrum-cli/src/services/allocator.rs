//! Advisory insertion positions
//!
//! Both answers are computed from a fresh read and are only valid until the
//! next concurrent writer appends; nothing here reserves a row or an id.

use log::debug;

use crate::api::{A1Range, column_index};
use crate::error::{InspectionError, Result};
use crate::session::Session;

fn column(letters: &str) -> Result<u32> {
    column_index(letters).ok_or_else(|| InspectionError::InvalidRange(letters.to_string()))
}

/// One past the deepest populated row across `start_col..=end_col`.
///
/// Gaps inside a column are not reused: a block whose columns are filled to
/// different depths yields the row below the deepest one. Never less than 2.
pub async fn first_empty_row(
    session: &Session,
    sheet: &str,
    start_col: &str,
    end_col: &str,
) -> Result<u32> {
    let range = A1Range::columns_from(column(start_col)?, column(end_col)?, 1);
    let rows = session.get_range(sheet, &range).await?;
    let populated = rows
        .iter()
        .rposition(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|idx| idx as u32 + 1)
        .unwrap_or(0);

    let row = populated.max(1) + 1;
    debug!("First empty row in {}!{}: {}", sheet, range, row);
    Ok(row)
}

/// Largest integer in `col` from `start_row` down, plus one; 1 when none.
///
/// Blank, non-numeric and out-of-range cells are ignored.
pub async fn next_sequential_id(
    session: &Session,
    sheet: &str,
    col: &str,
    start_row: u32,
) -> Result<u64> {
    let values = session.get_column(sheet, column(col)?).await?;
    let next = values
        .iter()
        .skip(start_row.saturating_sub(1) as usize)
        .filter_map(|cell| cell.trim().parse::<u64>().ok()?.checked_add(1))
        .max();
    Ok(next.unwrap_or(1))
}
