//! Partial write-back of edited record fields
//!
//! The target row is always re-located by id at write time; row numbers seen
//! during an earlier read are never trusted. Each field is its own single-cell
//! write, so a failure part-way leaves earlier fields written.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::Serialize;

use super::approach;
use super::columns::{RecordField, locate_header, normalize_text, resolve};
use super::pending::{RecordLocator, RecordSource, parse_flag};
use crate::error::{InspectionError, Result};
use crate::session::Session;

/// Fields an inspector may change on a pending record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EditableField {
    Status,
    Identification,
    Authorized,
    Ute,
    SeiProcess,
    Observations,
    OtherAware,
    Interferent,
}

impl EditableField {
    pub const ALL: [EditableField; 8] = [
        EditableField::Status,
        EditableField::Identification,
        EditableField::Authorized,
        EditableField::Ute,
        EditableField::SeiProcess,
        EditableField::Observations,
        EditableField::OtherAware,
        EditableField::Interferent,
    ];

    /// Label as it appears on the sheets and in the edit form
    pub fn label(&self) -> &'static str {
        match self {
            EditableField::Status => "Situação",
            EditableField::Identification => "Identificação",
            EditableField::Authorized => "Autorizado?",
            EditableField::Ute => "UTE?",
            EditableField::SeiProcess => "Processo SEI UTE",
            EditableField::Observations => "Ocorrência (observações)",
            EditableField::OtherAware => "Alguém mais ciente?",
            EditableField::Interferent => "Interferente?",
        }
    }

    /// Parse a label, ignoring case and accents
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = normalize_text(label);
        Self::ALL
            .into_iter()
            .find(|f| normalize_text(f.label()) == wanted)
    }

    pub fn record_field(&self) -> RecordField {
        match self {
            EditableField::Status => RecordField::Status,
            EditableField::Identification => RecordField::Identification,
            EditableField::Authorized => RecordField::Authorized,
            EditableField::Ute => RecordField::Ute,
            EditableField::SeiProcess => RecordField::SeiProcess,
            EditableField::Observations => RecordField::Observations,
            EditableField::OtherAware => RecordField::OtherAware,
            EditableField::Interferent => RecordField::Interferent,
        }
    }
}

/// Field -> new cell text, applied in field order
pub type FieldUpdates = BTreeMap<EditableField, String>;

/// Reject edits that would leave a record inconsistent.
///
/// Only fields present in `updates` are checked.
pub fn validate_edits(updates: &FieldUpdates) -> Result<()> {
    let mut problems = Vec::new();
    if updates.is_empty() {
        problems.push("no fields to update".to_string());
    }
    if updates
        .get(&EditableField::Identification)
        .is_some_and(|v| v.trim().is_empty())
    {
        problems.push(EditableField::Identification.label().to_string());
    }
    let ute = updates.get(&EditableField::Ute).is_some_and(|v| parse_flag(v));
    let sei_blank = updates
        .get(&EditableField::SeiProcess)
        .is_none_or(|v| v.trim().is_empty());
    if ute && sei_blank {
        problems.push(EditableField::SeiProcess.label().to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(InspectionError::Validation(problems))
    }
}

/// Update a record in a name-resolved sheet (a station sheet).
///
/// Fields whose column cannot be resolved are skipped with a warning.
/// Returns the number of cells written.
pub async fn update_by_station_and_id(
    session: &Session,
    sheet: &str,
    id: &str,
    updates: &FieldUpdates,
) -> Result<usize> {
    let sheets = session.sheet_names().await?;
    if !sheets.iter().any(|s| s == sheet) {
        return Err(InspectionError::SheetNotFound(sheet.to_string()));
    }

    let rows = session.get_all_values(sheet).await?;
    let header_idx = locate_header(&rows);
    let header = rows.get(header_idx).map(Vec::as_slice).unwrap_or_default();
    let specs: Vec<_> = std::iter::once(RecordField::Id)
        .chain(updates.keys().map(|f| f.record_field()))
        .map(|f| (f, f.pattern()))
        .collect();
    let mapping = resolve(header, &specs);

    let id_col = mapping.get(RecordField::Id).ok_or_else(|| InspectionError::MalformedSheet {
        sheet: sheet.to_string(),
        missing: vec![RecordField::Id.key().to_string()],
    })?;
    let row_idx = rows
        .iter()
        .enumerate()
        .skip(header_idx + 1)
        .find(|(_, row)| row.get(id_col).is_some_and(|cell| cell == id))
        .map(|(idx, _)| idx)
        .ok_or_else(|| InspectionError::RecordNotFound {
            sheet: sheet.to_string(),
            id: id.to_string(),
        })?;
    let sheet_row = row_idx as u32 + 1;
    debug!("Record {} found at {}!row {}", id, sheet, sheet_row);

    let mut written = 0;
    for (field, value) in updates {
        let Some(col) = mapping.get(field.record_field()) else {
            warn!("'{}' has no column for {}; skipped", sheet, field.label());
            continue;
        };
        session.write_cell(sheet, sheet_row, col as u32, value).await?;
        written += 1;
    }
    Ok(written)
}

/// Update a record in the approach log through its fixed columns
pub async fn update_approach_by_id(
    session: &Session,
    id: &str,
    updates: &FieldUpdates,
) -> Result<usize> {
    let sheet = session.layout().approach_sheet.clone();
    let cell = session
        .find_cell_by_value(&sheet, id, approach::cols::ID)
        .await?
        .filter(|cell| cell.row >= approach::FIRST_DATA_ROW)
        .ok_or_else(|| InspectionError::RecordNotFound {
            sheet: sheet.clone(),
            id: id.to_string(),
        })?;

    for (field, value) in updates {
        let col = approach::editable_column(*field);
        session.write_cell(&sheet, cell.row, col, value).await?;
    }
    Ok(updates.len())
}

/// Validate and write edits to wherever the record lives.
///
/// Panel records are written to the station sheet they mirror. Returns a
/// human-readable confirmation.
pub async fn apply_edits(
    session: &Session,
    locator: &RecordLocator,
    updates: &FieldUpdates,
) -> Result<String> {
    validate_edits(updates)?;

    let written = match locator.source {
        RecordSource::Approach => update_approach_by_id(session, &locator.id, updates).await?,
        RecordSource::Panel | RecordSource::Station => {
            update_by_station_and_id(session, &locator.sheet, &locator.id, updates).await?
        }
    };

    info!(
        "Updated record {} in '{}' ({} of {} fields written)",
        locator.id,
        locator.sheet,
        written,
        updates.len()
    );
    Ok(format!(
        "Record {} updated in '{}' ({} field(s) written)",
        locator.id, locator.sheet, written
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::MemoryStore;
    use crate::api::memory::grid;
    use crate::services::pending::RecordStatus;
    use crate::session::test_support::{WORKBOOK, session};

    fn updates(pairs: &[(EditableField, &str)]) -> FieldUpdates {
        pairs.iter().map(|(f, v)| (*f, v.to_string())).collect()
    }

    fn station_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_sheet(
            WORKBOOK,
            "Posto Norte",
            grid(&[
                &["Monitoração - Posto Norte"],
                &["ID", "Data", "Frequência", "Identificação", "Situação"],
                &["4", "09/11/2025", "88.1", "", "Pendente"],
                &["5", "09/11/2025", "88.3", "", "Pendente"],
            ]),
        );
        store
    }

    #[test]
    fn test_labels_parse_without_accents() {
        assert_eq!(EditableField::from_label("situacao"), Some(EditableField::Status));
        assert_eq!(
            EditableField::from_label("ALGUEM MAIS CIENTE?"),
            Some(EditableField::OtherAware)
        );
        assert_eq!(EditableField::from_label("frequência"), None);
        for field in EditableField::ALL {
            assert_eq!(EditableField::from_label(field.label()), Some(field));
        }
    }

    #[test]
    fn test_validate_edits() {
        assert!(validate_edits(&updates(&[(EditableField::Status, "Concluído")])).is_ok());
        assert!(validate_edits(&FieldUpdates::new()).is_err());

        match validate_edits(&updates(&[
            (EditableField::Identification, " "),
            (EditableField::Ute, "Sim"),
        ])) {
            Err(InspectionError::Validation(fields)) => {
                assert_eq!(fields, vec!["Identificação", "Processo SEI UTE"]);
            }
            other => panic!("expected Validation, got {:?}", other),
        }

        assert!(validate_edits(&updates(&[
            (EditableField::Ute, "Sim"),
            (EditableField::SeiProcess, "53500.000123/2025-11"),
        ]))
        .is_ok());
    }

    #[tokio::test]
    async fn test_status_only_update_touches_one_cell() {
        let store = station_store();
        let before = store.sheet_snapshot(WORKBOOK, "Posto Norte").unwrap();
        let session = session(store.clone());

        let written = update_by_station_and_id(
            &session,
            "Posto Norte",
            "5",
            &updates(&[(EditableField::Status, RecordStatus::Done.label())]),
        )
        .await
        .unwrap();
        assert_eq!(written, 1);

        let after = store.sheet_snapshot(WORKBOOK, "Posto Norte").unwrap();
        let mut expected = before.clone();
        expected[3][4] = "Concluído".to_string();
        assert_eq!(after, expected);
    }

    #[tokio::test]
    async fn test_unresolved_field_is_skipped() {
        let store = station_store();
        let session = session(store.clone());
        let written = update_by_station_and_id(
            &session,
            "Posto Norte",
            "4",
            &updates(&[
                (EditableField::Identification, "Rádio táxi"),
                (EditableField::Interferent, "Não"),
            ]),
        )
        .await
        .unwrap();
        assert_eq!(written, 1);
        let after = store.sheet_snapshot(WORKBOOK, "Posto Norte").unwrap();
        assert_eq!(after[2][3], "Rádio táxi");
    }

    #[tokio::test]
    async fn test_missing_sheet_and_record() {
        let session = session(station_store());
        let edit = updates(&[(EditableField::Status, "Concluído")]);

        assert!(matches!(
            update_by_station_and_id(&session, "Posto Leste", "4", &edit).await,
            Err(InspectionError::SheetNotFound(_))
        ));
        assert!(matches!(
            update_by_station_and_id(&session, "Posto Norte", "99", &edit).await,
            Err(InspectionError::RecordNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_id_match_is_exact_in_both_layouts() {
        let store = station_store();
        store.insert_sheet(
            WORKBOOK,
            "Posto Norte",
            grid(&[
                &["ID", "Data", "Frequência", "Identificação", "Situação"],
                &[" 7", "09/11/2025", "88.1", "", "Pendente"],
            ]),
        );
        let mut header = vec![String::new(); 7];
        header.push("ID".to_string());
        let mut row = vec![String::new(); 7];
        row.push("7 ".to_string());
        store.insert_sheet(WORKBOOK, "Abordagem", vec![header, row]);
        let session = session(store);
        let edit = updates(&[(EditableField::Status, "Concluído")]);

        assert!(matches!(
            update_by_station_and_id(&session, "Posto Norte", "7", &edit).await,
            Err(InspectionError::RecordNotFound { .. })
        ));
        assert!(matches!(
            update_approach_by_id(&session, "7", &edit).await,
            Err(InspectionError::RecordNotFound { .. })
        ));
        assert_eq!(
            update_by_station_and_id(&session, "Posto Norte", " 7", &edit).await.unwrap(),
            1
        );
        assert_eq!(update_approach_by_id(&session, "7 ", &edit).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_approach_update_writes_fixed_columns() {
        let store = Arc::new(MemoryStore::new());
        let mut header = vec![String::new(); 7];
        header.push("ID".to_string());
        let mut row = vec![String::new(); 7];
        row.push("12".to_string());
        store.insert_sheet(WORKBOOK, "Abordagem", vec![header, row]);
        let session = session(store.clone());

        let locator = RecordLocator {
            source: RecordSource::Approach,
            sheet: "Abordagem".to_string(),
            id: "12".to_string(),
        };
        apply_edits(
            &session,
            &locator,
            &updates(&[
                (EditableField::Identification, "Rádio amador"),
                (EditableField::Status, "Concluído"),
            ]),
        )
        .await
        .unwrap();

        let sheet = store.sheet_snapshot(WORKBOOK, "Abordagem").unwrap();
        assert_eq!(sheet[1][approach::cols::IDENTIFICATION as usize], "Rádio amador");
        assert_eq!(sheet[1][approach::cols::STATUS as usize], "Concluído");
        assert_eq!(sheet[0].len(), 8);
    }

    #[tokio::test]
    async fn test_panel_record_writes_to_station_sheet() {
        let store = station_store();
        let session = session(store.clone());
        let locator = RecordLocator {
            source: RecordSource::Panel,
            sheet: "Posto Norte".to_string(),
            id: "4".to_string(),
        };
        let message = apply_edits(
            &session,
            &locator,
            &updates(&[(EditableField::Status, "Concluído")]),
        )
        .await
        .unwrap();
        assert!(message.contains("Posto Norte"));
        let after = store.sheet_snapshot(WORKBOOK, "Posto Norte").unwrap();
        assert_eq!(after[2][4], "Concluído");
    }
}
