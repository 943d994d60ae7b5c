//! Per-event session context
//!
//! Everything a core operation needs (gateway, target workbook, sheet layout,
//! timezone, read cache) travels in one explicit value instead of ambient
//! global state.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono_tz::Tz;
use log::debug;
use serde::Serialize;

use crate::api::{A1Range, CellRef, Grid, SheetGateway, ValueInput};
use crate::config::{Config, LayoutConfig};
use crate::error::Result;
use crate::services::frequency::FrequencyIndex;
use crate::services::pending::PendingRecord;

/// Event workbook the session operates on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventWorkbook {
    pub id: String,
    pub name: String,
}

/// Single cached value with a time-to-live.
///
/// Purely a read optimisation: the workbook can change underneath at any
/// time, and every write through the session clears it.
#[derive(Debug)]
pub struct Cached<T> {
    ttl: Duration,
    slot: Mutex<Option<(Instant, T)>>,
}

impl<T: Clone> Cached<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<T> {
        if self.ttl.is_zero() {
            return None;
        }
        let guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, value)| value.clone())
    }

    pub fn put(&self, value: T) {
        if self.ttl.is_zero() {
            return;
        }
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some((Instant::now(), value));
    }

    pub fn clear(&self) {
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

#[derive(Debug)]
pub struct ReadCache {
    pub pending: Cached<Vec<PendingRecord>>,
    pub frequencies: Cached<FrequencyIndex>,
}

impl ReadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: Cached::new(ttl),
            frequencies: Cached::new(ttl),
        }
    }

    pub fn invalidate(&self) {
        self.pending.clear();
        self.frequencies.clear();
    }
}

pub struct Session {
    gateway: Arc<dyn SheetGateway>,
    workbook: EventWorkbook,
    layout: LayoutConfig,
    tz: Tz,
    cache: ReadCache,
}

impl Session {
    pub fn new(gateway: Arc<dyn SheetGateway>, workbook: EventWorkbook, config: &Config) -> Self {
        Self {
            gateway,
            workbook,
            layout: config.layout.clone(),
            tz: config.locale.tz(),
            cache: ReadCache::new(Duration::from_secs(config.cache.ttl_secs)),
        }
    }

    pub fn workbook(&self) -> &EventWorkbook {
        &self.workbook
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    pub async fn sheet_names(&self) -> Result<Vec<String>> {
        self.gateway.list_sheet_names(&self.workbook.id).await
    }

    /// Per-station sheets, in workbook order
    pub async fn station_sheets(&self) -> Result<Vec<String>> {
        let all = self.sheet_names().await?;
        Ok(self.layout.station_sheets(&all))
    }

    pub async fn get_range(&self, sheet: &str, range: &A1Range) -> Result<Grid> {
        self.gateway
            .get_range(&self.workbook.id, sheet, range)
            .await
    }

    pub async fn get_all_values(&self, sheet: &str) -> Result<Grid> {
        self.gateway
            .get_all_values(&self.workbook.id, sheet)
            .await
    }

    pub async fn get_column(&self, sheet: &str, col: u32) -> Result<Vec<String>> {
        self.gateway
            .get_column(&self.workbook.id, sheet, col)
            .await
    }

    pub async fn find_cell_by_value(
        &self,
        sheet: &str,
        value: &str,
        col: u32,
    ) -> Result<Option<CellRef>> {
        self.gateway
            .find_cell_by_value(&self.workbook.id, sheet, value, col)
            .await
    }

    pub async fn write_range(
        &self,
        sheet: &str,
        range: &A1Range,
        values: &[Vec<String>],
        input: ValueInput,
    ) -> Result<()> {
        debug!("Writing {}!{} ({} rows)", sheet, range, values.len());
        // Clear first: even a failed write may have landed partially
        self.cache.invalidate();
        self.gateway
            .write_range(&self.workbook.id, sheet, range, values, input)
            .await
    }

    pub async fn write_cell(&self, sheet: &str, row: u32, col: u32, value: &str) -> Result<()> {
        self.write_range(
            sheet,
            &A1Range::cell(col, row),
            &[vec![value.to_string()]],
            ValueInput::Raw,
        )
        .await
    }
}
