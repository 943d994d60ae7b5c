//! Pending queue listing and record edits

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use colored::*;
use log::debug;

use crate::cli::OutputFormat;
use crate::cli::output::emit;
use crate::services::columns::normalize_text;
use crate::services::pending::{
    PendingRecord, RecordLocator, RecordSource, RecordStatus, get_pending_queue, parse_flag,
};
use crate::services::updater::{EditableField, FieldUpdates, apply_edits};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceFilter {
    Panel,
    Approach,
    Station,
}

impl SourceFilter {
    fn matches(&self, source: RecordSource) -> bool {
        matches!(
            (self, source),
            (SourceFilter::Panel, RecordSource::Panel)
                | (SourceFilter::Approach, RecordSource::Approach)
                | (SourceFilter::Station, RecordSource::Station)
        )
    }
}

#[derive(Args, Debug)]
pub struct PendingArgs {
    /// Only records whose station contains this text
    #[arg(long)]
    pub station: Option<String>,

    /// Only records from one source
    #[arg(long, value_enum)]
    pub source: Option<SourceFilter>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Sheet the record lives in (the station sheet for panel records)
    #[arg(long)]
    pub sheet: String,

    /// Record id
    #[arg(long)]
    pub id: String,

    /// Field update as LABEL=VALUE, e.g. "Identificação=Ruído" (repeatable)
    #[arg(long = "set", value_name = "LABEL=VALUE")]
    pub set: Vec<String>,

    /// Mark the record as done
    #[arg(long)]
    pub done: bool,
}

pub async fn handle_pending(session: &Session, args: PendingArgs, format: OutputFormat) -> Result<()> {
    let queue = get_pending_queue(session)
        .await
        .context("Failed to load the pending queue")?;

    let station = args.station.as_deref().map(normalize_text);
    let records: Vec<PendingRecord> = queue
        .into_iter()
        .filter(|r| args.source.is_none_or(|s| s.matches(r.source)))
        .filter(|r| {
            station
                .as_deref()
                .is_none_or(|s| normalize_text(&r.station).contains(s))
        })
        .collect();

    emit(format, &records, |records| {
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.source.label().to_string(),
                    r.source_sheet.clone(),
                    r.id.clone(),
                    r.station.clone(),
                    r.date.clone(),
                    r.time.clone(),
                    r.frequency_mhz.clone(),
                    r.identification.clone(),
                ]
            })
            .collect();
        (
            vec!["Origem", "Aba", "ID", "Estação", "Data", "Hora", "Freq (MHz)", "Identificação"],
            rows,
        )
    })
}

/// Parse repeated LABEL=VALUE arguments
fn parse_updates(set: &[String], done: bool) -> Result<FieldUpdates> {
    let mut updates = FieldUpdates::new();
    for entry in set {
        let Some((label, value)) = entry.split_once('=') else {
            bail!("Expected LABEL=VALUE, got '{}'", entry);
        };
        let field = EditableField::from_label(label).with_context(|| {
            let labels: Vec<&str> = EditableField::ALL.iter().map(|f| f.label()).collect();
            format!("Unknown field '{}'. Editable fields: {}", label.trim(), labels.join(", "))
        })?;
        updates.insert(field, value.trim().to_string());
    }
    if done {
        updates.insert(EditableField::Status, RecordStatus::Done.label().to_string());
    }
    Ok(updates)
}

pub async fn handle_edit(session: &Session, args: EditArgs) -> Result<()> {
    let mut updates = parse_updates(&args.set, args.done)?;

    let queue = get_pending_queue(session)
        .await
        .context("Failed to load the pending queue")?;
    let record = queue
        .iter()
        .find(|r| r.source_sheet == args.sheet && r.id.trim() == args.id.trim());

    let locator = match record {
        Some(record) => record.locator(),
        None => {
            debug!("Record {} not in the pending queue; addressing '{}' directly", args.id, args.sheet);
            let source = if args.sheet == session.layout().approach_sheet {
                RecordSource::Approach
            } else {
                RecordSource::Station
            };
            RecordLocator {
                source,
                sheet: args.sheet.clone(),
                id: args.id.clone(),
            }
        }
    };

    // Switching UTE on keeps the process number already on the record
    if let Some(record) = record {
        let ute_on = updates.get(&EditableField::Ute).is_some_and(|v| parse_flag(v));
        if ute_on
            && !updates.contains_key(&EditableField::SeiProcess)
            && !record.sei_process.is_empty()
        {
            updates.insert(EditableField::SeiProcess, record.sei_process.clone());
        }
    }

    let message = apply_edits(session, &locator, &updates)
        .await
        .with_context(|| format!("Failed to update record {} in '{}'", args.id, args.sheet))?;
    println!("{}", message.green());
    Ok(())
}
