//! Workbook access layer
//!
//! A single `SheetGateway` trait with interchangeable backends: the Google
//! Sheets API for shared event workbooks, local `.xlsx` files for offline
//! work, and an in-memory store used by both the xlsx backend and tests.

pub mod a1;
pub mod gateway;
pub mod google;
pub mod memory;
pub mod xlsx;

use std::sync::Arc;
use std::time::Duration;

pub use a1::{A1Range, column_index, column_letters};
pub use gateway::{CellRef, Grid, SheetGateway, ValueInput, WorkbookFile, cell_at, row_cell};
pub use google::GoogleSheetsGateway;
pub use memory::{MemoryStore, MemoryWorkbook};
pub use xlsx::XlsxGateway;

use crate::config::{Backend, GatewayConfig};
use crate::error::{InspectionError, Result};

/// Build the gateway selected in configuration
pub fn build_gateway(config: &GatewayConfig) -> Result<Arc<dyn SheetGateway>> {
    match config.backend {
        Backend::Google => {
            let token = config.access_token.clone().ok_or_else(|| {
                InspectionError::gateway(
                    "no access token configured (set SPECTRUM_ACCESS_TOKEN or gateway.access_token)",
                )
            })?;
            let gateway =
                GoogleSheetsGateway::new(token, Duration::from_secs(config.timeout_secs))?;
            Ok(Arc::new(gateway))
        }
        Backend::Xlsx => Ok(Arc::new(XlsxGateway::new(config.workbook_dir.clone()))),
    }
}
