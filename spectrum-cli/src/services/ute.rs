//! Reference table of temporary-use (UTE) authorizations

use log::debug;
use serde::Serialize;

use crate::api::Grid;
use crate::error::Result;
use crate::session::Session;

/// Fixed positions in the UTE sheet
mod cols {
    pub const COUNTRY: usize = 0;
    pub const FREQUENCY: usize = 4;
    pub const BANDWIDTH: usize = 5;
    pub const SEI_PROCESS: usize = 7;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UteEntry {
    pub country: String,
    pub frequency_mhz: String,
    pub bandwidth_khz: String,
    pub sei_process: String,
}

/// Data rows that reach the SEI column and carry a process number
pub fn parse_ute_rows(rows: &Grid) -> Vec<UteEntry> {
    rows.iter()
        .skip(1)
        .filter(|row| row.len() > cols::SEI_PROCESS)
        .filter(|row| !row[cols::SEI_PROCESS].trim().is_empty())
        .map(|row| UteEntry {
            country: row[cols::COUNTRY].trim().to_string(),
            frequency_mhz: row[cols::FREQUENCY].trim().to_string(),
            bandwidth_khz: row[cols::BANDWIDTH].trim().to_string(),
            sei_process: row[cols::SEI_PROCESS].trim().to_string(),
        })
        .collect()
}

pub async fn load_ute_table(session: &Session) -> Result<Vec<UteEntry>> {
    let rows = session.get_all_values(&session.layout().ute_sheet).await?;
    let entries = parse_ute_rows(&rows);
    debug!("UTE table: {} entries", entries.len());
    Ok(entries)
}
