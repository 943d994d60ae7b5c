//! Local `.xlsx` backend
//!
//! Workbook ids are file paths. A workbook is read with calamine into the
//! in-memory store on first use and rewritten with rust_xlsxwriter after
//! every write. Only cell text survives a rewrite; styles, formulas and data
//! validation of the original file are not preserved.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{Data, Reader, Xlsx, open_workbook};
use log::{debug, info};
use rust_xlsxwriter::Workbook;

use super::a1::A1Range;
use super::gateway::{Grid, SheetGateway, ValueInput, WorkbookFile, trim_grid};
use super::memory::{MemoryStore, MemoryWorkbook};
use crate::error::{InspectionError, Result};

/// Gateway over `.xlsx` files in one directory
#[derive(Debug)]
pub struct XlsxGateway {
    directory: PathBuf,
    store: MemoryStore,
}

impl XlsxGateway {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            store: MemoryStore::new(),
        }
    }

    fn ensure_loaded(&self, workbook: &str) -> Result<()> {
        if self.store.snapshot(workbook).is_some() {
            return Ok(());
        }
        let path = Path::new(workbook);
        let loaded = load_workbook(path)?;
        info!(
            "Loaded workbook {} ({} sheets)",
            path.display(),
            loaded.sheets.len()
        );
        self.store.insert_workbook(workbook, loaded);
        Ok(())
    }

    fn flush(&self, workbook: &str) -> Result<()> {
        let snapshot = self
            .store
            .snapshot(workbook)
            .ok_or_else(|| InspectionError::gateway(format!("workbook '{}' is not loaded", workbook)))?;
        save_workbook(&snapshot, Path::new(workbook))
    }
}

/// Cell text the way the sheet shows it: integral floats lose the ".0"
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Read every sheet of an xlsx file into ragged grids anchored at A1
pub fn load_workbook(path: &Path) -> Result<MemoryWorkbook> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        InspectionError::gateway(format!("Failed to open Excel file {}: {}", path.display(), e))
    })?;

    let names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());

    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| InspectionError::gateway(format!("Failed to read sheet {}: {}", name, e)))?;

        // The used range may start below/right of A1
        let (first_row, first_col) = range.start().unwrap_or((0, 0));
        let mut grid: Grid = vec![Vec::new(); first_row as usize];
        for row in range.rows() {
            let mut cells = vec![String::new(); first_col as usize];
            cells.extend(row.iter().map(cell_to_string));
            grid.push(cells);
        }
        sheets.push((name, trim_grid(grid)));
    }

    let display_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(MemoryWorkbook {
        name: display_name,
        sheets,
    })
}

/// Write every sheet as plain strings
pub fn save_workbook(workbook: &MemoryWorkbook, path: &Path) -> Result<()> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| InspectionError::gateway(e.to_string());
    let mut book = Workbook::new();

    for (name, grid) in &workbook.sheets {
        let worksheet = book.add_worksheet();
        worksheet.set_name(name).map_err(xlsx_err)?;
        for (r, row) in grid.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                worksheet
                    .write_string(r as u32, c as u16, value)
                    .map_err(xlsx_err)?;
            }
        }
    }

    book.save(path).map_err(|e| {
        InspectionError::gateway(format!("Failed to save Excel file {}: {}", path.display(), e))
    })?;
    debug!("Saved workbook {}", path.display());
    Ok(())
}

#[async_trait]
impl SheetGateway for XlsxGateway {
    async fn list_workbooks(&self) -> Result<Vec<WorkbookFile>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            let is_xlsx = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
            // Skip Excel lock files (~$name.xlsx)
            let is_lock = path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("~$"));
            if !is_xlsx || is_lock {
                continue;
            }
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            files.push(WorkbookFile {
                id: path.display().to_string(),
                name,
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn list_sheet_names(&self, workbook: &str) -> Result<Vec<String>> {
        self.ensure_loaded(workbook)?;
        self.store.list_sheet_names(workbook).await
    }

    async fn get_range(&self, workbook: &str, sheet: &str, range: &A1Range) -> Result<Grid> {
        self.ensure_loaded(workbook)?;
        self.store.read_range(workbook, sheet, range)
    }

    async fn get_column(&self, workbook: &str, sheet: &str, col: u32) -> Result<Vec<String>> {
        self.ensure_loaded(workbook)?;
        self.store.read_column(workbook, sheet, col)
    }

    async fn write_range(
        &self,
        workbook: &str,
        sheet: &str,
        range: &A1Range,
        values: &[Vec<String>],
        _input: ValueInput,
    ) -> Result<()> {
        self.ensure_loaded(workbook)?;
        self.store.write_cells(workbook, sheet, range, values)?;
        self.flush(workbook)
    }
}
