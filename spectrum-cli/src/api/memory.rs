//! In-memory grid store
//!
//! Holds whole workbooks as ragged string grids. It backs the local xlsx
//! gateway (which loads a file into it and flushes after every write) and
//! the service tests.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::a1::A1Range;
use super::gateway::{Grid, SheetGateway, ValueInput, WorkbookFile, trim_grid};
use crate::error::{InspectionError, Result};

#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    pub name: String,
    /// Sheets in workbook order
    pub sheets: Vec<(String, Grid)>,
}

impl MemoryWorkbook {
    fn sheet(&self, name: &str) -> Result<&Grid> {
        self.sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, grid)| grid)
            .ok_or_else(|| InspectionError::SheetNotFound(name.to_string()))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut Grid> {
        self.sheets
            .iter_mut()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, grid)| grid)
            .ok_or_else(|| InspectionError::SheetNotFound(name.to_string()))
    }
}

/// Thread-safe map of workbook id -> workbook
#[derive(Debug, Default)]
pub struct MemoryStore {
    workbooks: RwLock<BTreeMap<String, MemoryWorkbook>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (or create) a whole workbook
    pub fn insert_workbook(&self, id: &str, workbook: MemoryWorkbook) {
        let mut guard = self.workbooks.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(id.to_string(), workbook);
    }

    /// Add or replace one sheet, creating the workbook if needed
    pub fn insert_sheet(&self, workbook: &str, sheet: &str, rows: Grid) {
        let mut guard = self.workbooks.write().unwrap_or_else(|e| e.into_inner());
        let entry = guard
            .entry(workbook.to_string())
            .or_insert_with(|| MemoryWorkbook {
                name: workbook.to_string(),
                sheets: Vec::new(),
            });
        match entry.sheets.iter_mut().find(|(name, _)| name == sheet) {
            Some((_, grid)) => *grid = rows,
            None => entry.sheets.push((sheet.to_string(), rows)),
        }
    }

    /// Copy of a workbook's contents
    pub fn snapshot(&self, workbook: &str) -> Option<MemoryWorkbook> {
        let guard = self.workbooks.read().unwrap_or_else(|e| e.into_inner());
        guard.get(workbook).cloned()
    }

    /// Copy of one sheet's raw grid (not trimmed)
    pub fn sheet_snapshot(&self, workbook: &str, sheet: &str) -> Result<Grid> {
        self.with_workbook(workbook, |wb| wb.sheet(sheet).cloned())
    }

    fn with_workbook<T>(&self, id: &str, f: impl FnOnce(&MemoryWorkbook) -> Result<T>) -> Result<T> {
        let guard = self.workbooks.read().unwrap_or_else(|e| e.into_inner());
        let workbook = guard
            .get(id)
            .ok_or_else(|| InspectionError::gateway(format!("workbook '{}' is not loaded", id)))?;
        f(workbook)
    }

    pub fn read_range(&self, workbook: &str, sheet: &str, range: &A1Range) -> Result<Grid> {
        self.with_workbook(workbook, |wb| {
            let grid = wb.sheet(sheet)?;
            let first_row = range.start_row.saturating_sub(1) as usize;
            let last_row = range
                .end_row
                .map(|r| r as usize)
                .unwrap_or(grid.len())
                .min(grid.len());
            let start_col = range.start_col as usize;

            let rows = grid
                .iter()
                .take(last_row)
                .skip(first_row)
                .map(|row| {
                    let end_col = range
                        .end_col
                        .map(|c| c as usize + 1)
                        .unwrap_or(row.len())
                        .min(row.len());
                    if start_col >= end_col {
                        Vec::new()
                    } else {
                        row[start_col..end_col].to_vec()
                    }
                })
                .collect();
            Ok(trim_grid(rows))
        })
    }

    pub fn read_column(&self, workbook: &str, sheet: &str, col: u32) -> Result<Vec<String>> {
        self.with_workbook(workbook, |wb| {
            let grid = wb.sheet(sheet)?;
            let mut column: Vec<String> = grid
                .iter()
                .map(|row| row.get(col as usize).cloned().unwrap_or_default())
                .collect();
            while column.last().is_some_and(|c| c.is_empty()) {
                column.pop();
            }
            Ok(column)
        })
    }

    pub fn write_cells(
        &self,
        workbook: &str,
        sheet: &str,
        range: &A1Range,
        values: &[Vec<String>],
    ) -> Result<()> {
        let mut guard = self.workbooks.write().unwrap_or_else(|e| e.into_inner());
        let wb = guard
            .get_mut(workbook)
            .ok_or_else(|| InspectionError::gateway(format!("workbook '{}' is not loaded", workbook)))?;
        let grid = wb.sheet_mut(sheet)?;

        for (r, row_values) in values.iter().enumerate() {
            let row_idx = range.start_row as usize - 1 + r;
            if range.end_row.is_some_and(|end| row_idx as u32 + 1 > end) {
                break;
            }
            if grid.len() <= row_idx {
                grid.resize_with(row_idx + 1, Vec::new);
            }
            let row = &mut grid[row_idx];
            for (c, value) in row_values.iter().enumerate() {
                let col_idx = range.start_col as usize + c;
                if range.end_col.is_some_and(|end| col_idx as u32 > end) {
                    break;
                }
                if row.len() <= col_idx {
                    row.resize(col_idx + 1, String::new());
                }
                row[col_idx] = value.clone();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SheetGateway for MemoryStore {
    async fn list_workbooks(&self) -> Result<Vec<WorkbookFile>> {
        let guard = self.workbooks.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard
            .iter()
            .map(|(id, wb)| WorkbookFile {
                id: id.clone(),
                name: wb.name.clone(),
            })
            .collect())
    }

    async fn list_sheet_names(&self, workbook: &str) -> Result<Vec<String>> {
        self.with_workbook(workbook, |wb| {
            Ok(wb.sheets.iter().map(|(name, _)| name.clone()).collect())
        })
    }

    async fn get_range(&self, workbook: &str, sheet: &str, range: &A1Range) -> Result<Grid> {
        self.read_range(workbook, sheet, range)
    }

    async fn get_column(&self, workbook: &str, sheet: &str, col: u32) -> Result<Vec<String>> {
        self.read_column(workbook, sheet, col)
    }

    async fn write_range(
        &self,
        workbook: &str,
        sheet: &str,
        range: &A1Range,
        values: &[Vec<String>],
        _input: ValueInput,
    ) -> Result<()> {
        self.write_cells(workbook, sheet, range, values)
    }
}

/// Build a grid from string literals (test fixtures)
#[cfg(test)]
pub fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_sheet(
            "wb",
            "PAINEL",
            grid(&[
                &["ID", "Estação", "Situação", ""],
                &["1", "Posto A", "Pendente"],
                &[],
                &["3", "Posto B", "Concluído", "x"],
            ]),
        );
        store
    }

    #[tokio::test]
    async fn test_get_range_offsets_and_trims() {
        let store = store();
        let range: A1Range = "B2:C".parse().unwrap();
        let rows = store.get_range("wb", "PAINEL", &range).await.unwrap();
        assert_eq!(rows, grid(&[&["Posto A", "Pendente"], &[], &["Posto B", "Concluído"]]));
    }

    #[tokio::test]
    async fn test_unknown_sheet_is_sheet_not_found() {
        let store = store();
        let err = store.get_column("wb", "Posto Z", 0).await.unwrap_err();
        assert!(matches!(err, InspectionError::SheetNotFound(name) if name == "Posto Z"));
    }

    #[tokio::test]
    async fn test_write_range_grows_grid_and_keeps_neighbours() {
        let store = store();
        let range: A1Range = "C6:D6".parse().unwrap();
        store
            .write_range("wb", "PAINEL", &range, &grid(&[&["Pendente", "obs"]]), ValueInput::Raw)
            .await
            .unwrap();

        let sheet = store.sheet_snapshot("wb", "PAINEL").unwrap();
        assert_eq!(sheet.len(), 6);
        assert_eq!(sheet[5], vec!["", "", "Pendente", "obs"]);
        assert_eq!(sheet[1], vec!["1", "Posto A", "Pendente"]);
    }

    #[tokio::test]
    async fn test_find_cell_by_value_is_exact() {
        let store = store();
        let found = store.find_cell_by_value("wb", "PAINEL", "3", 0).await.unwrap();
        assert_eq!(found, Some(super::super::gateway::CellRef { row: 4, col: 0 }));
        let missing = store.find_cell_by_value("wb", "PAINEL", "3 ", 0).await.unwrap();
        assert_eq!(missing, None);
    }
}
