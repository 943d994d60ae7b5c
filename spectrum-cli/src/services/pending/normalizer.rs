//! Per-layout normalization into `PendingRecord`
//!
//! Pure functions over grids already read from the workbook; the async
//! loading lives in `queue`.

use chrono::NaiveDate;
use log::debug;

use super::models::{PendingRecord, RecordSource, RecordStatus};
use crate::api::Grid;
use crate::error::{InspectionError, Result};
use crate::services::approach::{self, cols};
use crate::services::columns::{ColumnMapping, RecordField, locate_header, record_field_specs, resolve};

const PANEL_REQUIRED: [RecordField; 3] = [RecordField::Status, RecordField::Station, RecordField::Id];
const STATION_REQUIRED: [RecordField; 2] = [RecordField::Status, RecordField::Id];

fn required_or_malformed(
    sheet: &str,
    mapping: &ColumnMapping<RecordField>,
    required: &[RecordField],
) -> Result<()> {
    let missing = mapping.missing(required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(InspectionError::MalformedSheet {
            sheet: sheet.to_string(),
            missing: missing.iter().map(|f| f.key().to_string()).collect(),
        })
    }
}

/// Build a record from a resolved row; None unless the row is pending with an id
fn resolved_record(
    mapping: &ColumnMapping<RecordField>,
    row: &[String],
    source: RecordSource,
    sheet_name: &str,
) -> Option<PendingRecord> {
    let status = RecordStatus::parse(mapping.value(row, RecordField::Status))?;
    if status != RecordStatus::Pending {
        return None;
    }
    // Kept verbatim: updates match the id cell exactly
    let id = mapping.value(row, RecordField::Id);
    if id.trim().is_empty() {
        debug!("Skipping pending row without id in '{}'", sheet_name);
        return None;
    }

    let field = |f: RecordField| mapping.value(row, f).trim().to_string();
    let mut station = field(RecordField::Station);
    let source_sheet = match source {
        // Panel rows are written back to the station sheet they mirror
        RecordSource::Panel => station.clone(),
        _ => {
            if station.is_empty() {
                station = sheet_name.to_string();
            }
            sheet_name.to_string()
        }
    };

    Some(PendingRecord {
        id: id.to_string(),
        source,
        source_sheet,
        station,
        fiscal: field(RecordField::Fiscal),
        date: field(RecordField::Date),
        time: field(RecordField::Time),
        frequency_mhz: field(RecordField::Frequency),
        bandwidth_khz: field(RecordField::Bandwidth),
        band: field(RecordField::Band),
        identification: field(RecordField::Identification),
        authorized: field(RecordField::Authorized),
        is_ute: field(RecordField::Ute),
        sei_process: field(RecordField::SeiProcess),
        observations: field(RecordField::Observations),
        other_aware: field(RecordField::OtherAware),
        interferent: field(RecordField::Interferent),
        status,
    })
}

/// Pending panel rows (header on the first row), sorted by station and date.
///
/// `MalformedSheet` when status, station or id cannot be resolved.
pub fn normalize_panel(sheet_name: &str, rows: &Grid) -> Result<Vec<PendingRecord>> {
    let Some(header) = rows.first() else {
        return Ok(Vec::new());
    };
    let mapping = resolve(header, &record_field_specs());
    required_or_malformed(sheet_name, &mapping, &PANEL_REQUIRED)?;

    let mut records: Vec<PendingRecord> = rows
        .iter()
        .skip(1)
        .filter_map(|row| resolved_record(&mapping, row, RecordSource::Panel, sheet_name))
        .collect();
    sort_records(&mut records);
    Ok(records)
}

/// Pending approach-log rows read from the H1:W block, sorted
pub fn normalize_approach(sheet_name: &str, rows: &Grid) -> Vec<PendingRecord> {
    let mut records: Vec<PendingRecord> = rows
        .iter()
        .skip(1)
        .filter_map(|row| {
            let cell = |col: u32| approach::block_cell(row, col).trim().to_string();
            let status = RecordStatus::parse(&cell(cols::STATUS))?;
            let id = approach::block_cell(row, cols::ID).to_string();
            if status != RecordStatus::Pending || id.trim().is_empty() {
                return None;
            }
            Some(PendingRecord {
                id,
                source: RecordSource::Approach,
                source_sheet: sheet_name.to_string(),
                station: cell(cols::LOCAL),
                fiscal: cell(cols::FISCAL),
                date: cell(cols::DATE),
                time: cell(cols::TIME),
                frequency_mhz: cell(cols::FREQUENCY),
                bandwidth_khz: cell(cols::BANDWIDTH),
                band: cell(cols::BAND),
                identification: cell(cols::IDENTIFICATION),
                authorized: cell(cols::AUTHORIZED),
                is_ute: cell(cols::UTE),
                sei_process: cell(cols::SEI_PROCESS),
                observations: cell(cols::OBSERVATIONS),
                other_aware: cell(cols::OTHER_AWARE),
                interferent: cell(cols::INTERFERENT),
                status,
            })
        })
        .collect();
    sort_records(&mut records);
    records
}

/// Pending station sheet rows below the located header, sorted
pub fn normalize_station(sheet_name: &str, rows: &Grid) -> Result<Vec<PendingRecord>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let header_idx = locate_header(rows);
    let mapping = resolve(&rows[header_idx], &record_field_specs());
    required_or_malformed(sheet_name, &mapping, &STATION_REQUIRED)?;

    let mut records: Vec<PendingRecord> = rows
        .iter()
        .skip(header_idx + 1)
        .filter_map(|row| resolved_record(&mapping, row, RecordSource::Station, sheet_name))
        .collect();
    sort_records(&mut records);
    Ok(records)
}

/// Parse the day-first dates used across the workbook
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// (station, date) ordering key; missing values sort last and unparseable
/// dates sort after real ones, falling back to raw text
fn sort_key(record: &PendingRecord) -> (bool, String, u8, Option<NaiveDate>, String) {
    let station = record.station.trim();
    let date = record.date.trim();
    let parsed = parse_record_date(date);
    let rank = match (parsed, date.is_empty()) {
        (Some(_), _) => 0,
        (None, false) => 1,
        (None, true) => 2,
    };
    (
        station.is_empty(),
        station.to_string(),
        rank,
        parsed,
        date.to_string(),
    )
}

/// Stable sort by station then date
pub fn sort_records(records: &mut [PendingRecord]) {
    records.sort_by_cached_key(sort_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::grid;

    #[test]
    fn test_panel_filters_pending_and_maps_station_sheet() {
        let rows = grid(&[
            &["ID", "Estação", "Data", "Frequência (MHz)", "Situação"],
            &["1", "Posto Norte", "10/11/2025", "100.125", "Pendente"],
            &["2", "Posto Sul", "10/11/2025", "99.9", "Concluído"],
            &["3", "Posto Sul", "11/11/2025", "101.5", "PENDENTE"],
        ]);
        let records = normalize_panel("PAINEL", &rows).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[0].source, RecordSource::Panel);
        assert_eq!(records[0].source_sheet, "Posto Norte");
        assert_eq!(records[0].frequency_mhz, "100.125");
        assert_eq!(records[1].id, "3");
    }

    #[test]
    fn test_panel_output_is_sorted_and_repeatable() {
        let rows = grid(&[
            &["ID", "Estação", "Data", "Situação"],
            &["1", "Posto Sul", "12/11/2025", "Pendente"],
            &["2", "Posto Norte", "11/11/2025", "Pendente"],
            &["3", "Posto Sul", "02/11/2025", "Pendente"],
            &["4", "", "01/11/2025", "Pendente"],
        ]);
        let first = normalize_panel("PAINEL", &rows).unwrap();
        let ids: Vec<&str> = first.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1", "4"]);
        assert_eq!(normalize_panel("PAINEL", &rows).unwrap(), first);
    }

    #[test]
    fn test_panel_without_station_column_is_malformed() {
        let rows = grid(&[&["ID", "Situação"], &["1", "Pendente"]]);
        match normalize_panel("PAINEL", &rows) {
            Err(InspectionError::MalformedSheet { sheet, missing }) => {
                assert_eq!(sheet, "PAINEL");
                assert_eq!(missing, vec!["estacao".to_string()]);
            }
            other => panic!("expected MalformedSheet, got {:?}", other),
        }
    }

    #[test]
    fn test_approach_uses_fixed_positions() {
        // H..W: id, local, fiscal, date, time, freq, bw, band, ident,
        // authorized, ute, sei, obs, other aware, interferent, status
        let rows = grid(&[
            &["ID", "Local", "Fiscal"],
            &[
                "7", "Maracanã", "Ana", "12/11/2025", "14:30", "450.5", "12.5", "UHF", "Rádio",
                "Sim", "Não", "", "portão 3 - Ana", "", "Indefinido", "Pendente",
            ],
            &["8", "Maracanã", "Ana", "", "", "", "", "", "", "", "", "", "", "", "", "Concluído"],
        ]);
        let records = normalize_approach("Abordagem", &rows);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "7");
        assert_eq!(record.station, "Maracanã");
        assert_eq!(record.source_sheet, "Abordagem");
        assert_eq!(record.frequency_mhz, "450.5");
        assert_eq!(record.observations, "portão 3 - Ana");
        assert_eq!(record.interferent, "Indefinido");
    }

    #[test]
    fn test_station_header_below_title_and_station_fallback() {
        let rows = grid(&[
            &["MONITORAÇÃO - POSTO NORTE"],
            &["ID", "DIA", "Frequência", "Situação"],
            &["4", "09/11/2025", "88.1", "pendente"],
            &["", "09/11/2025", "88.3", "Pendente"],
        ]);
        let records = normalize_station("Posto Norte", &rows).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].station, "Posto Norte");
        assert_eq!(records[0].source_sheet, "Posto Norte");
        assert_eq!(records[0].date, "09/11/2025");
    }

    #[test]
    fn test_ids_are_kept_verbatim() {
        let rows = grid(&[&["ID", "Situação"], &[" 12 ", "Pendente"]]);
        let records = normalize_station("Posto Sul", &rows).unwrap();
        assert_eq!(records[0].id, " 12 ");
    }

    #[test]
    fn test_station_without_id_is_malformed() {
        let rows = grid(&[&["Data", "Situação"], &["09/11/2025", "Pendente"]]);
        assert!(matches!(
            normalize_station("Posto Sul", &rows),
            Err(InspectionError::MalformedSheet { .. })
        ));
    }

    fn record(id: &str, station: &str, date: &str) -> PendingRecord {
        PendingRecord {
            id: id.to_string(),
            source: RecordSource::Station,
            source_sheet: station.to_string(),
            station: station.to_string(),
            fiscal: String::new(),
            date: date.to_string(),
            time: String::new(),
            frequency_mhz: String::new(),
            bandwidth_khz: String::new(),
            band: String::new(),
            identification: String::new(),
            authorized: String::new(),
            is_ute: String::new(),
            sei_process: String::new(),
            observations: String::new(),
            other_aware: String::new(),
            interferent: String::new(),
            status: RecordStatus::Pending,
        }
    }

    #[test]
    fn test_sort_by_station_then_chronological_date() {
        let mut records = vec![
            record("1", "B", "02/01/2026"),
            record("2", "", "01/01/2026"),
            record("3", "A", ""),
            record("4", "A", "15/12/2025"),
            record("5", "A", "amanhã"),
            record("6", "A", "01/01/2026"),
        ];
        sort_records(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "6", "5", "3", "1", "2"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let mut records = vec![
            record("b", "A", "01/01/2026"),
            record("a", "A", "01/01/2026"),
        ];
        sort_records(&mut records);
        assert_eq!(records[0].id, "b");
        assert_eq!(records[1].id, "a");
    }
}
