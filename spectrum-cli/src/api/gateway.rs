//! Sheet access gateway
//!
//! The uniform way the reconciliation services read and write workbook
//! cells. Everything crossing this boundary is text: numeric and date
//! interpretation belongs to the callers.

use async_trait::async_trait;
use serde::Serialize;

use super::a1::A1Range;
use crate::error::Result;

/// Rows of cell text. Rows are ragged: trailing empty cells and trailing
/// empty rows are not returned, matching what the Sheets API hands back.
pub type Grid = Vec<Vec<String>>;

/// How written text should be interpreted by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInput {
    /// Stored verbatim
    Raw,
    /// Parsed as if typed into the UI (numbers, dates, formulas)
    UserEntered,
}

impl ValueInput {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            ValueInput::Raw => "RAW",
            ValueInput::UserEntered => "USER_ENTERED",
        }
    }
}

/// A workbook visible to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkbookFile {
    pub id: String,
    pub name: String,
}

/// Location of a single cell: one-based row, zero-based column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

/// Remote (or local) tabular store holding the event workbooks.
///
/// Implementations return `InspectionError::SheetNotFound` for unknown sheet
/// names and `InspectionError::Gateway` for every other backend failure.
/// No call is retried.
#[async_trait]
pub trait SheetGateway: Send + Sync {
    /// Workbooks the current credentials can see
    async fn list_workbooks(&self) -> Result<Vec<WorkbookFile>>;

    /// Sheet names in workbook order
    async fn list_sheet_names(&self, workbook: &str) -> Result<Vec<String>>;

    /// Read a rectangular block; row 0 of the result is `range.start_row`
    async fn get_range(&self, workbook: &str, sheet: &str, range: &A1Range) -> Result<Grid>;

    /// Every populated cell of a sheet, starting at A1
    async fn get_all_values(&self, workbook: &str, sheet: &str) -> Result<Grid> {
        self.get_range(workbook, sheet, &A1Range::whole_sheet())
            .await
    }

    /// One column from row 1 down to its last populated cell
    async fn get_column(&self, workbook: &str, sheet: &str, col: u32) -> Result<Vec<String>>;

    /// First cell in `col` whose text equals `value` exactly
    async fn find_cell_by_value(
        &self,
        workbook: &str,
        sheet: &str,
        value: &str,
        col: u32,
    ) -> Result<Option<CellRef>> {
        let column = self.get_column(workbook, sheet, col).await?;
        Ok(column
            .iter()
            .position(|cell| cell == value)
            .map(|idx| CellRef {
                row: idx as u32 + 1,
                col,
            }))
    }

    /// Write a block of cells; cells outside `values` are left untouched
    async fn write_range(
        &self,
        workbook: &str,
        sheet: &str,
        range: &A1Range,
        values: &[Vec<String>],
        input: ValueInput,
    ) -> Result<()>;
}

/// Cell text at (row, col) of a ragged grid, empty when out of bounds
pub fn cell_at(grid: &[Vec<String>], row: usize, col: usize) -> &str {
    grid.get(row)
        .and_then(|r| r.get(col))
        .map(String::as_str)
        .unwrap_or("")
}

/// Cell text at `col` of a ragged row, empty when out of bounds
pub fn row_cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

/// Drop trailing empty cells from each row and trailing empty rows
pub fn trim_grid(mut grid: Grid) -> Grid {
    for row in grid.iter_mut() {
        while row.last().is_some_and(|c| c.is_empty()) {
            row.pop();
        }
    }
    while grid.last().is_some_and(|r| r.is_empty()) {
        grid.pop();
    }
    grid
}
