use serde::Serialize;

use crate::services::columns::normalize_text;

/// Which physical layout a pending record was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordSource {
    Panel,
    Approach,
    Station,
}

impl RecordSource {
    pub fn label(&self) -> &'static str {
        match self {
            RecordSource::Panel => "PAINEL",
            RecordSource::Approach => "ABORDAGEM",
            RecordSource::Station => "ESTACAO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordStatus {
    Pending,
    Done,
}

impl RecordStatus {
    /// Interpret a status cell; unknown wording yields None
    pub fn parse(cell: &str) -> Option<Self> {
        match normalize_text(cell).as_str() {
            "pendente" => Some(RecordStatus::Pending),
            "concluido" => Some(RecordStatus::Done),
            _ => None,
        }
    }

    /// Text written back to the sheet
    pub fn label(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "Pendente",
            RecordStatus::Done => "Concluído",
        }
    }
}

/// Where a record must be written back to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordLocator {
    pub source: RecordSource,
    pub sheet: String,
    pub id: String,
}

/// One pending emission, normalized from any of the three sheet layouts.
///
/// Descriptive fields are kept as the sheet's text; an empty string means the
/// column was absent or blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRecord {
    pub id: String,
    pub source: RecordSource,
    /// Physical sheet the row lives in (the station sheet for panel rows)
    pub source_sheet: String,
    pub station: String,
    pub fiscal: String,
    pub date: String,
    pub time: String,
    pub frequency_mhz: String,
    pub bandwidth_khz: String,
    pub band: String,
    pub identification: String,
    pub authorized: String,
    pub is_ute: String,
    pub sei_process: String,
    pub observations: String,
    pub other_aware: String,
    pub interferent: String,
    pub status: RecordStatus,
}

impl PendingRecord {
    pub fn locator(&self) -> RecordLocator {
        RecordLocator {
            source: self.source,
            sheet: self.source_sheet.clone(),
            id: self.id.clone(),
        }
    }

    pub fn ute_flag(&self) -> bool {
        parse_flag(&self.is_ute)
    }
}

/// Checkbox-like cell text ("Sim", "TRUE", "1", "ok")
pub fn parse_flag(cell: &str) -> bool {
    matches!(normalize_text(cell).as_str(), "sim" | "true" | "1" | "ok")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_accent_and_case_insensitive() {
        assert_eq!(RecordStatus::parse(" PENDENTE "), Some(RecordStatus::Pending));
        assert_eq!(RecordStatus::parse("Concluído"), Some(RecordStatus::Done));
        assert_eq!(RecordStatus::parse("concluido"), Some(RecordStatus::Done));
        assert_eq!(RecordStatus::parse("Em análise"), None);
        assert_eq!(RecordStatus::parse(""), None);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("Sim"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("Não"));
        assert!(!parse_flag(""));
    }
}
