//! New approach-log entries: emissions and BSR/ERB sightings
//!
//! Both kinds go to the approach log. Inserts are two or more range writes
//! with no transaction around them; a failure between writes can leave a row
//! with an id but no data.

use chrono::{NaiveDate, NaiveTime, Utc};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::allocator::{first_empty_row, next_sequential_id};
use super::approach::{self, cols};
use super::frequency::build_frequency_index;
use super::pending::RecordStatus;
use crate::api::{A1Range, ValueInput, column_letters};
use crate::error::{InspectionError, Result};
use crate::session::Session;

/// Categories offered when the workbook carries no list of its own
pub const DEFAULT_IDENTIFICATIONS: [&str; 7] = [
    "Sinal de dados",
    "Comunicação (voz) relacionada ao evento",
    "Comunicação (voz) não relacionada ao evento",
    "Sinal não relacionado ao evento",
    "Espúrio ou Produto de Intermodulação",
    "Ruído",
    "Não identificado",
];

/// Service bands an emission can be filed under
pub const BAND_OPTIONS: [&str; 9] = [
    "FM",
    "SMA",
    "SMM",
    "SLP",
    "TV",
    "SMP",
    "GNSS",
    "Satélite",
    "Radiação Restrita",
];

const DEFAULT_LOCAL: &str = "Abordagem";
const UNDEFINED: &str = "Indefinido";

/// Negative decimal degrees with exactly six decimals (southern/western)
static COORDINATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\d+\.\d{6}$").expect("valid regex"));

/// Empty coordinates are allowed; anything else must match the pattern
pub fn is_valid_coordinate(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || COORDINATE.is_match(value)
}

/// A newly observed emission as entered by the inspector
#[derive(Debug, Clone, Default)]
pub struct EmissionForm {
    /// Defaults to "Abordagem" when blank
    pub local: String,
    pub fiscal: String,
    /// Defaults to today in the configured timezone
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub frequency_mhz: f64,
    pub bandwidth_khz: f64,
    pub band: String,
    pub identification: String,
    pub is_ute: bool,
    pub sei_process: String,
    pub observations: String,
    pub responsible: String,
}

impl EmissionForm {
    /// Labels of missing or invalid fields
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.fiscal.trim().is_empty() {
            problems.push("Fiscal".to_string());
        }
        if self.frequency_mhz.is_nan() || self.frequency_mhz <= 0.0 {
            problems.push("Frequência".to_string());
        }
        if self.band.trim().is_empty() {
            problems.push("Faixa".to_string());
        }
        if self.identification.trim().is_empty() {
            problems.push("Identificação".to_string());
        }
        if self.observations.trim().is_empty() {
            problems.push("Observações".to_string());
        }
        if self.is_ute && self.sei_process.trim().is_empty() {
            problems.push("Processo SEI".to_string());
        }
        problems
    }

    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(InspectionError::Validation(problems))
        }
    }

    /// Cells I..W of the new row
    fn row_values(&self, date: NaiveDate, time: NaiveTime) -> Vec<String> {
        let local = match self.local.trim() {
            "" => DEFAULT_LOCAL,
            local => local,
        };
        vec![
            local.to_string(),
            self.fiscal.trim().to_string(),
            date.format("%d/%m/%Y").to_string(),
            time.format("%H:%M").to_string(),
            self.frequency_mhz.to_string(),
            self.bandwidth_khz.to_string(),
            self.band.trim().to_string(),
            self.identification.trim().to_string(),
            UNDEFINED.to_string(),
            if self.is_ute { "Sim" } else { "Não" }.to_string(),
            self.sei_process.trim().to_string(),
            format!("{} - {}", self.observations.trim(), self.responsible.trim()),
            String::new(),
            UNDEFINED.to_string(),
            RecordStatus::Pending.label().to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InsertOutcome {
    Inserted { id: u64, row: u32 },
    /// Nothing was written; the frequency is already registered
    DuplicateFrequency { frequency_mhz: f64, existing: String },
}

/// Append an emission to the approach log.
///
/// A frequency already present in the index is reported back instead of
/// written unless `confirm_duplicate` is set.
pub async fn insert_emission(
    session: &Session,
    form: &EmissionForm,
    confirm_duplicate: bool,
) -> Result<InsertOutcome> {
    form.validate()?;

    let index = build_frequency_index(session).await?;
    if let Some(existing) = index.check(form.frequency_mhz) {
        if !confirm_duplicate {
            return Ok(InsertOutcome::DuplicateFrequency {
                frequency_mhz: form.frequency_mhz,
                existing: existing.to_string(),
            });
        }
        warn!(
            "Inserting {} MHz although already registered by '{}'",
            form.frequency_mhz, existing
        );
    }

    let sheet = session.layout().approach_sheet.clone();
    let id_col = column_letters(cols::ID);
    let row = first_empty_row(session, &sheet, &id_col, &column_letters(cols::STATUS)).await?;
    let id = next_sequential_id(session, &sheet, &id_col, approach::FIRST_DATA_ROW).await?;

    let now = Utc::now().with_timezone(&session.timezone());
    let date = form.date.unwrap_or_else(|| now.date_naive());
    let time = form.time.unwrap_or_else(|| now.time());

    session
        .write_range(&sheet, &A1Range::cell(cols::ID, row), &[vec![id.to_string()]], ValueInput::Raw)
        .await?;
    session
        .write_range(
            &sheet,
            &A1Range::row_span(cols::LOCAL, cols::STATUS, row),
            &[form.row_values(date, time)],
            ValueInput::Raw,
        )
        .await?;

    info!("Inserted emission {} at {}!{}", id, sheet, row);
    Ok(InsertOutcome::Inserted { id, row })
}

/// Kind of rogue transmitter sighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BsrKind {
    Jammer,
    ErbFake,
}

impl BsrKind {
    pub fn label(&self) -> &'static str {
        match self {
            BsrKind::Jammer => "BSR/Jammer",
            BsrKind::ErbFake => "ERB Fake",
        }
    }

    /// (count, region) column pair
    fn columns(&self) -> (u32, u32) {
        match self {
            BsrKind::Jammer => (cols::BSR_COUNT, cols::BSR_REGION),
            BsrKind::ErbFake => (cols::ERB_COUNT, cols::ERB_REGION),
        }
    }
}

/// Register a BSR/jammer or fake base-station sighting in the X..AC block.
/// Returns the row written.
pub async fn insert_bsr_erb(
    session: &Session,
    kind: BsrKind,
    region: &str,
    latitude: &str,
    longitude: &str,
) -> Result<u32> {
    let mut problems = Vec::new();
    if region.trim().is_empty() {
        problems.push("Local".to_string());
    }
    if !is_valid_coordinate(latitude) {
        problems.push("Latitude".to_string());
    }
    if !is_valid_coordinate(longitude) {
        problems.push("Longitude".to_string());
    }
    if !problems.is_empty() {
        return Err(InspectionError::Validation(problems));
    }

    let sheet = session.layout().approach_sheet.clone();
    let row = first_empty_row(
        session,
        &sheet,
        &column_letters(cols::BSR_COUNT),
        &column_letters(cols::LONGITUDE),
    )
    .await?;

    let (count_col, region_col) = kind.columns();
    session
        .write_range(
            &sheet,
            &A1Range::row_span(count_col, region_col, row),
            &[vec!["1".to_string(), region.trim().to_string()]],
            ValueInput::UserEntered,
        )
        .await?;
    session
        .write_range(
            &sheet,
            &A1Range::row_span(cols::LATITUDE, cols::LONGITUDE, row),
            &[vec![latitude.trim().to_string(), longitude.trim().to_string()]],
            ValueInput::UserEntered,
        )
        .await?;

    info!("Registered {} at {}!{}", kind.label(), sheet, row);
    Ok(row)
}

/// Identification categories from AC3:AC9 of the first station sheet,
/// falling back to the built-in list
pub async fn identification_options(session: &Session) -> Result<Vec<String>> {
    let defaults = || -> Vec<String> { DEFAULT_IDENTIFICATIONS.iter().map(|s| s.to_string()).collect() };

    let stations = session.station_sheets().await?;
    let Some(first) = stations.first() else {
        return Ok(defaults());
    };
    let range = A1Range {
        start_col: cols::LONGITUDE,
        start_row: 3,
        end_col: Some(cols::LONGITUDE),
        end_row: Some(9),
    };
    let options: Vec<String> = match session.get_range(first, &range).await {
        Ok(rows) => rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect(),
        Err(e) => {
            warn!("Could not read identification options from '{}': {}", first, e);
            Vec::new()
        }
    };

    if options.is_empty() {
        Ok(defaults())
    } else {
        Ok(options)
    }
}
