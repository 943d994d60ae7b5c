//! Error taxonomy for workbook access and record reconciliation

use thiserror::Error;

/// Failures surfaced by the gateway and the reconciliation services.
///
/// Multi-sheet aggregation (pending queue, frequency index, search) logs and
/// skips per-sheet failures; single-target operations (updates, inserts)
/// return the first error to the caller unchanged.
#[derive(Debug, Error)]
pub enum InspectionError {
    /// Target sheet does not exist in the workbook
    #[error("sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    /// Identifier absent from the target sheet at write time
    #[error("record {id} not found in sheet '{sheet}'")]
    RecordNotFound { sheet: String, id: String },

    /// Required marker columns could not be resolved
    #[error("sheet '{sheet}' is missing required columns: {}", .missing.join(", "))]
    MalformedSheet { sheet: String, missing: Vec<String> },

    /// User input rejected before anything was written
    #[error("missing or invalid fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// A1 range text that could not be parsed
    #[error("invalid range '{0}'")]
    InvalidRange(String),

    /// Transport, auth or storage failure from the sheet backend
    #[error("gateway error: {0}")]
    Gateway(String),
}

impl InspectionError {
    pub fn gateway(message: impl std::fmt::Display) -> Self {
        InspectionError::Gateway(message.to_string())
    }

    /// Errors that only concern the sheet being read, not the whole workbook
    pub fn is_sheet_local(&self) -> bool {
        matches!(
            self,
            InspectionError::SheetNotFound(_) | InspectionError::MalformedSheet { .. }
        )
    }
}

impl From<reqwest::Error> for InspectionError {
    fn from(err: reqwest::Error) -> Self {
        InspectionError::Gateway(err.to_string())
    }
}

impl From<std::io::Error> for InspectionError {
    fn from(err: std::io::Error) -> Self {
        InspectionError::Gateway(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InspectionError>;
