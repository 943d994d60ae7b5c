//! Read-only lookups: free-text search, UTE table, identification options

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::cli::output::{emit, print_csv, print_json, print_table};
use crate::services::insert::identification_options;
use crate::services::search::{SearchHit, default_search_sheets, search};
use crate::services::ute::load_ute_table;
use crate::session::Session;

const SNIPPET_CHARS: usize = 80;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to look for (at least 3 characters)
    pub term: String,

    /// Sheets to search (repeatable; default: panel, approach and every station)
    #[arg(long = "sheet")]
    pub sheets: Vec<String>,
}

/// One (hit, field) pair per CSV line
#[derive(Serialize)]
struct SearchCsvRow<'a> {
    sheet: &'a str,
    row: u32,
    field: &'a str,
    value: &'a str,
}

fn snippet(hit: &SearchHit) -> String {
    let text = hit
        .fields
        .iter()
        .filter(|f| !f.value.trim().is_empty())
        .map(|f| f.value.trim())
        .collect::<Vec<_>>()
        .join(" | ");
    if text.chars().count() > SNIPPET_CHARS {
        let cut: String = text.chars().take(SNIPPET_CHARS).collect();
        format!("{}…", cut)
    } else {
        text
    }
}

pub async fn handle_search(session: &Session, args: SearchArgs, format: OutputFormat) -> Result<()> {
    let sheets = if args.sheets.is_empty() {
        default_search_sheets(session)
            .await
            .context("Failed to list sheets")?
    } else {
        args.sheets
    };
    let hits = search(session, &args.term, &sheets)
        .await
        .with_context(|| format!("Search for '{}' failed", args.term.trim()))?;

    match format {
        OutputFormat::Json => print_json(&hits),
        OutputFormat::Csv => {
            let rows: Vec<SearchCsvRow> = hits
                .iter()
                .flat_map(|hit| {
                    hit.fields.iter().map(move |f| SearchCsvRow {
                        sheet: &hit.sheet,
                        row: hit.row,
                        field: &f.name,
                        value: &f.value,
                    })
                })
                .collect();
            print_csv(&rows)
        }
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = hits
                .iter()
                .map(|hit| {
                    vec![
                        hit.sheet.clone(),
                        hit.row.to_string(),
                        hit.field("frequencia").unwrap_or_default().to_string(),
                        hit.field("data").unwrap_or_default().to_string(),
                        snippet(hit),
                    ]
                })
                .collect();
            print_table(&["Aba", "Linha", "Freq (MHz)", "Data", "Conteúdo"], &rows);
            Ok(())
        }
    }
}

pub async fn handle_ute(session: &Session, format: OutputFormat) -> Result<()> {
    let entries = load_ute_table(session)
        .await
        .context("Failed to load the UTE table")?;
    emit(format, &entries, |entries| {
        let rows = entries
            .iter()
            .map(|e| {
                vec![
                    e.country.clone(),
                    e.frequency_mhz.clone(),
                    e.bandwidth_khz.clone(),
                    e.sei_process.clone(),
                ]
            })
            .collect();
        (vec!["País", "Freq (MHz)", "BW (kHz)", "Processo SEI"], rows)
    })
}

pub async fn handle_identifications(session: &Session, format: OutputFormat) -> Result<()> {
    let options = identification_options(session)
        .await
        .context("Failed to load identification options")?;

    #[derive(Serialize)]
    struct OptionRow<'a> {
        identification: &'a str,
    }
    let rows: Vec<OptionRow> = options
        .iter()
        .map(|o| OptionRow { identification: o })
        .collect();
    emit(format, &rows, |rows| {
        let body = rows.iter().map(|r| vec![r.identification.to_string()]).collect();
        (vec!["Identificação"], body)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::search::SearchField;

    #[test]
    fn test_snippet_skips_blanks_and_truncates() {
        let hit = SearchHit {
            sheet: "PAINEL".to_string(),
            row: 2,
            fields: vec![
                SearchField {
                    name: "ID".to_string(),
                    value: "7".to_string(),
                },
                SearchField {
                    name: "Obs".to_string(),
                    value: String::new(),
                },
                SearchField {
                    name: "Identificação".to_string(),
                    value: "Ruído".to_string(),
                },
            ],
        };
        assert_eq!(snippet(&hit), "7 | Ruído");

        let long = SearchHit {
            fields: vec![SearchField {
                name: "Obs".to_string(),
                value: "x".repeat(100),
            }],
            ..hit
        };
        assert_eq!(snippet(&long).chars().count(), SNIPPET_CHARS + 1);
    }
}
