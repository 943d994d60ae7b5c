//! Free-text search across sheets

use std::collections::HashSet;

use log::{debug, warn};
use serde::Serialize;

use super::columns::normalize_text;
use crate::api::{Grid, row_cell};
use crate::error::{InspectionError, Result};
use crate::session::Session;

pub const MIN_TERM_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchField {
    pub name: String,
    pub value: String,
}

/// One matching row, with its header names in sheet order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub sheet: String,
    /// One-based sheet row
    pub row: u32,
    pub fields: Vec<SearchField>,
}

impl SearchHit {
    /// Value of the first field whose normalized name contains `needle`
    pub fn field(&self, needle: &str) -> Option<&str> {
        let needle = normalize_text(needle);
        self.fields
            .iter()
            .find(|f| normalize_text(&f.name).contains(&needle))
            .map(|f| f.value.as_str())
    }
}

/// Rows of one sheet whose text contains the normalized term.
///
/// Row 0 is the header; a repeated header name keeps only its first column.
pub fn search_rows(sheet: &str, rows: &Grid, normalized_term: &str) -> Vec<SearchHit> {
    let Some(header) = rows.first() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let columns: Vec<(usize, &str)> = header
        .iter()
        .enumerate()
        .filter(|(_, name)| seen.insert(name.as_str()))
        .map(|(idx, name)| (idx, name.as_str()))
        .collect();

    rows.iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, row)| {
            let text = columns
                .iter()
                .map(|(col, _)| row_cell(row, *col))
                .collect::<Vec<_>>()
                .join(" ");
            if !normalize_text(&text).contains(normalized_term) {
                return None;
            }
            Some(SearchHit {
                sheet: sheet.to_string(),
                row: idx as u32 + 1,
                fields: columns
                    .iter()
                    .map(|(col, name)| SearchField {
                        name: name.to_string(),
                        value: row_cell(row, *col).to_string(),
                    })
                    .collect(),
            })
        })
        .collect()
}

/// Panel, approach log and every station sheet
pub async fn default_search_sheets(session: &Session) -> Result<Vec<String>> {
    let layout = session.layout();
    let mut sheets = vec![layout.panel_sheet.clone(), layout.approach_sheet.clone()];
    sheets.extend(session.station_sheets().await?);
    Ok(sheets)
}

/// Case- and accent-insensitive search over whole rows of `sheets`.
///
/// Unreadable sheets are skipped.
pub async fn search(session: &Session, term: &str, sheets: &[String]) -> Result<Vec<SearchHit>> {
    let term = term.trim();
    if term.chars().count() < MIN_TERM_CHARS {
        return Err(InspectionError::Validation(vec![format!(
            "search term needs at least {} characters",
            MIN_TERM_CHARS
        )]));
    }
    let normalized = normalize_text(term);

    let mut hits = Vec::new();
    for sheet in sheets {
        match session.get_all_values(sheet).await {
            Ok(rows) => {
                let found = search_rows(sheet, &rows, &normalized);
                debug!("'{}': {} hit(s) in '{}'", term, found.len(), sheet);
                hits.extend(found);
            }
            Err(e) => warn!("Search: skipping '{}': {}", sheet, e),
        }
    }
    Ok(hits)
}
