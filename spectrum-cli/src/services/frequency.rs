//! Registered-frequency lookup for duplicate warnings
//!
//! The index only ever produces a soft warning; two stations may
//! legitimately log the same carrier.

use std::collections::HashMap;

use log::{debug, warn};

use crate::api::{A1Range, Grid, column_index, row_cell};
use crate::error::Result;
use crate::session::Session;

/// Panel block B2:G (station in B, frequency in G)
const PANEL_FIRST_COL: &str = "B";
const PANEL_LAST_COL: &str = "G";
const PANEL_STATION: usize = 0;
const PANEL_FREQUENCY: usize = 5;

/// Approach block I2:M (region in I, frequency in M)
const APPROACH_FIRST_COL: &str = "I";
const APPROACH_LAST_COL: &str = "M";
const APPROACH_REGION: usize = 0;
const APPROACH_FREQUENCY: usize = 4;

/// Parse a MHz value, accepting a decimal comma
pub fn parse_frequency(text: &str) -> Option<f64> {
    let value: f64 = text.trim().replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}

/// Frequencies compare at kHz resolution (3 decimals of MHz)
fn frequency_key(mhz: f64) -> i64 {
    (mhz * 1000.0).round() as i64
}

#[derive(Debug, Clone, Default)]
pub struct FrequencyIndex {
    entries: HashMap<i64, String>,
}

impl FrequencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mhz` for `station` unless already taken; first wins
    pub fn register(&mut self, mhz: f64, station: &str) {
        self.entries
            .entry(frequency_key(mhz))
            .or_insert_with(|| station.to_string());
    }

    /// Add every (station, frequency) pair of a block.
    ///
    /// Rows without a station or with an unparseable frequency are skipped.
    pub fn extend_from_rows(&mut self, rows: &Grid, station_col: usize, frequency_col: usize) {
        for row in rows {
            let station = row_cell(row, station_col).trim();
            if station.is_empty() {
                continue;
            }
            if let Some(mhz) = parse_frequency(row_cell(row, frequency_col)) {
                self.register(mhz, station);
            }
        }
    }

    /// Station that first registered this frequency, if any
    pub fn check(&self, mhz: f64) -> Option<&str> {
        self.entries.get(&frequency_key(mhz)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

async fn read_block(session: &Session, sheet: &str, first: &str, last: &str) -> Option<Grid> {
    let range = A1Range::columns_from(column_index(first)?, column_index(last)?, 2);
    match session.get_range(sheet, &range).await {
        Ok(rows) => Some(rows),
        Err(e) => {
            warn!("Frequency index: skipping {}!{}: {}", sheet, range, e);
            None
        }
    }
}

/// Build the index from the panel, then the approach log.
///
/// A sheet that cannot be read contributes nothing.
pub async fn build_frequency_index(session: &Session) -> Result<FrequencyIndex> {
    if let Some(cached) = session.cache().frequencies.get() {
        return Ok(cached);
    }

    let layout = session.layout();
    let mut index = FrequencyIndex::new();
    if let Some(rows) = read_block(session, &layout.panel_sheet, PANEL_FIRST_COL, PANEL_LAST_COL).await {
        index.extend_from_rows(&rows, PANEL_STATION, PANEL_FREQUENCY);
    }
    if let Some(rows) =
        read_block(session, &layout.approach_sheet, APPROACH_FIRST_COL, APPROACH_LAST_COL).await
    {
        index.extend_from_rows(&rows, APPROACH_REGION, APPROACH_FREQUENCY);
    }

    debug!("Frequency index holds {} frequencies", index.len());
    session.cache().frequencies.put(index.clone());
    Ok(index)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::MemoryStore;
    use crate::api::memory::grid;
    use crate::session::test_support::{WORKBOOK, session};

    #[test]
    fn test_parse_frequency_accepts_comma() {
        assert_eq!(parse_frequency("100,125"), Some(100.125));
        assert_eq!(parse_frequency(" 99.9 "), Some(99.9));
        assert_eq!(parse_frequency("n/d"), None);
        assert_eq!(parse_frequency(""), None);
    }

    #[test]
    fn test_first_registration_wins() {
        let mut index = FrequencyIndex::new();
        index.register(100.125, "Station A");
        index.register(100.125, "Station B");
        assert_eq!(index.check(100.125), Some("Station A"));
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_index_from_panel_and_approach() {
        let store = Arc::new(MemoryStore::new());
        store.insert_sheet(
            WORKBOOK,
            "PAINEL",
            grid(&[
                &["ID", "Estação", "", "", "", "", "Frequência"],
                &["1", "Station A", "", "", "", "", "100,125"],
                &["2", "Station B", "", "", "", "", "sem leitura"],
            ]),
        );
        store.insert_sheet(
            WORKBOOK,
            "Abordagem",
            grid(&[
                &["", "", "", "", "", "", "", "ID", "Local", "", "", "", "Frequência"],
                &["", "", "", "", "", "", "", "1", "Maracanã", "", "", "", "450.5"],
                &["", "", "", "", "", "", "", "2", "Sambódromo", "", "", "", "100.125"],
            ]),
        );
        let session = session(store);
        let index = build_frequency_index(&session).await.unwrap();

        assert_eq!(index.check(100.125), Some("Station A"));
        assert_eq!(index.check(450.5), Some("Maracanã"));
        // 100.1251 rounds onto the same kHz slot
        assert_eq!(index.check(100.1251), Some("Station A"));
        assert_eq!(index.check(100.126), None);
    }

    #[tokio::test]
    async fn test_rows_without_station_do_not_claim_frequency() {
        let store = Arc::new(MemoryStore::new());
        store.insert_sheet(
            WORKBOOK,
            "PAINEL",
            grid(&[
                &["ID", "Estação", "", "", "", "", "Frequência"],
                &["1", "", "", "", "", "", "100.125"],
                &["2", "  ", "", "", "", "", "433.92"],
            ]),
        );
        store.insert_sheet(
            WORKBOOK,
            "Abordagem",
            grid(&[
                &["", "", "", "", "", "", "", "ID", "Local", "", "", "", "Frequência"],
                &["", "", "", "", "", "", "", "1", "Sambódromo", "", "", "", "100.125"],
            ]),
        );
        let index = build_frequency_index(&session(store)).await.unwrap();

        assert_eq!(index.check(100.125), Some("Sambódromo"));
        assert_eq!(index.check(433.92), None);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_sheets_give_empty_index() {
        let store = Arc::new(MemoryStore::new());
        store.insert_sheet(WORKBOOK, "Posto", grid(&[&["x"]]));
        let index = build_frequency_index(&session(store)).await.unwrap();
        assert!(index.is_empty());
    }
}
