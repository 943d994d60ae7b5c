//! Aggregated pending queue across panel, approach log and station sheets

use std::collections::HashSet;

use log::{debug, info, warn};

use super::models::PendingRecord;
use super::normalizer::{normalize_approach, normalize_panel, normalize_station, sort_records};
use crate::api::{A1Range, column_index};
use crate::error::Result;
use crate::services::approach;
use crate::session::Session;

/// Pending records from the panel sheet, sorted.
///
/// A missing or malformed panel reads as "no data" rather than an error.
pub async fn load_panel_pending(session: &Session) -> Result<Vec<PendingRecord>> {
    let sheet = &session.layout().panel_sheet;
    let last_col = column_index("AF").unwrap_or(31);
    let rows = match session.get_range(sheet, &A1Range::columns_from(0, last_col, 1)).await {
        Ok(rows) => rows,
        Err(e) if e.is_sheet_local() => {
            warn!("Skipping panel sheet: {}", e);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    match normalize_panel(sheet, &rows) {
        Ok(records) => Ok(records),
        Err(e) => {
            warn!("Skipping panel sheet: {}", e);
            Ok(Vec::new())
        }
    }
}

/// Pending records from the approach log, sorted
pub async fn load_approach_pending(session: &Session) -> Result<Vec<PendingRecord>> {
    let sheet = &session.layout().approach_sheet;
    let rows = match session.get_range(sheet, &approach::emission_block()).await {
        Ok(rows) => rows,
        Err(e) if e.is_sheet_local() => {
            warn!("Skipping approach sheet: {}", e);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    Ok(normalize_approach(sheet, &rows))
}

/// Pending records from every station sheet, sorted across sheets.
///
/// One unreadable or malformed station sheet never hides the others.
pub async fn load_station_pending(session: &Session) -> Result<Vec<PendingRecord>> {
    let sheets = session.station_sheets().await?;
    let mut records = Vec::new();

    for sheet in &sheets {
        let rows = match session.get_all_values(sheet).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Skipping station sheet '{}': {}", sheet, e);
                continue;
            }
        };
        match normalize_station(sheet, &rows) {
            Ok(found) => {
                debug!("{} pending in '{}'", found.len(), sheet);
                records.extend(found);
            }
            Err(e) => warn!("Skipping station sheet '{}': {}", sheet, e),
        }
    }

    sort_records(&mut records);
    Ok(records)
}

/// Drop records whose (source sheet, id) was already seen
fn dedupe(records: Vec<PendingRecord>) -> Vec<PendingRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert((r.source_sheet.clone(), r.id.clone())))
        .collect()
}

/// Panel, approach and station pending records, in that order.
///
/// The panel mirrors station rows, so a station record already listed via
/// the panel is dropped.
pub async fn get_pending_queue(session: &Session) -> Result<Vec<PendingRecord>> {
    if let Some(cached) = session.cache().pending.get() {
        debug!("Pending queue served from cache ({} records)", cached.len());
        return Ok(cached);
    }

    let mut all = load_panel_pending(session).await?;
    all.extend(load_approach_pending(session).await?);
    all.extend(load_station_pending(session).await?);

    let total = all.len();
    let queue = dedupe(all);
    info!(
        "Loaded {} pending records ({} duplicates dropped)",
        queue.len(),
        total - queue.len()
    );

    session.cache().pending.put(queue.clone());
    Ok(queue)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::MemoryStore;
    use crate::api::memory::grid;
    use crate::services::pending::RecordSource;
    use crate::session::test_support::{WORKBOOK, session};

    fn approach_row(id: &str, local: &str, date: &str, status: &str) -> Vec<String> {
        let mut row = vec![String::new(); 7];
        row.extend(
            [id, local, "Ana", date, "10:00", "450.5", "", "UHF", "", "", "", "", "", "", "", status]
                .iter()
                .map(|s| s.to_string()),
        );
        row
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_sheet(
            WORKBOOK,
            "PAINEL",
            grid(&[
                &["ID", "Estação", "Data", "Situação"],
                &["1", "Posto Norte", "10/11/2025", "Pendente"],
            ]),
        );
        let mut approach = vec![approach_row("ID", "Local", "Data", "Situação")];
        approach.push(approach_row("1", "Maracanã", "11/11/2025", "Pendente"));
        approach.push(approach_row("2", "Maracanã", "12/11/2025", "Concluído"));
        store.insert_sheet(WORKBOOK, "Abordagem", approach);
        store.insert_sheet(
            WORKBOOK,
            "Posto Norte",
            grid(&[
                &["ID", "Data", "Situação"],
                &["1", "10/11/2025", "Pendente"],
                &["2", "11/11/2025", "Pendente"],
            ]),
        );
        store.insert_sheet(WORKBOOK, "Posto Quebrado", grid(&[&["Observações"], &["sem cabeçalho"]]));
        store.insert_sheet(WORKBOOK, "Tabela UTE", grid(&[&["País"]]));
        store
    }

    #[tokio::test]
    async fn test_queue_merges_sources_in_order_and_dedupes() {
        let session = session(seeded_store());
        let queue = get_pending_queue(&session).await.unwrap();

        let keys: Vec<(RecordSource, &str, &str)> = queue
            .iter()
            .map(|r| (r.source, r.source_sheet.as_str(), r.id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (RecordSource::Panel, "Posto Norte", "1"),
                (RecordSource::Approach, "Abordagem", "1"),
                (RecordSource::Station, "Posto Norte", "2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_panel_and_approach_read_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.insert_sheet(
            WORKBOOK,
            "Posto Sul",
            grid(&[&["ID", "Situação"], &["9", "Pendente"]]),
        );
        let session = session(store);

        assert!(load_panel_pending(&session).await.unwrap().is_empty());
        assert!(load_approach_pending(&session).await.unwrap().is_empty());
        let queue = get_pending_queue(&session).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].station, "Posto Sul");
    }

    #[tokio::test]
    async fn test_panel_without_status_column_reads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.insert_sheet(
            WORKBOOK,
            "PAINEL",
            grid(&[
                &["ID", "Estação", "Data", "Observações"],
                &["1", "Posto Sul", "10/11/2025", "Pendente"],
            ]),
        );
        store.insert_sheet(
            WORKBOOK,
            "Posto Sul",
            grid(&[&["ID", "Situação"], &["9", "Pendente"]]),
        );
        let session = session(store);

        assert!(load_panel_pending(&session).await.unwrap().is_empty());
        let queue = get_pending_queue(&session).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].source, RecordSource::Station);
        assert_eq!(queue[0].id, "9");
    }

    #[tokio::test]
    async fn test_queue_is_identical_across_reloads() {
        let session = session(seeded_store());
        let first = get_pending_queue(&session).await.unwrap();
        let second = get_pending_queue(&session).await.unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_all_done_yields_empty_queue() {
        let store = Arc::new(MemoryStore::new());
        store.insert_sheet(
            WORKBOOK,
            "Posto Sul",
            grid(&[&["ID", "Situação"], &["9", "Concluído"]]),
        );
        let queue = get_pending_queue(&session(store)).await.unwrap();
        assert!(queue.is_empty());
    }
}
