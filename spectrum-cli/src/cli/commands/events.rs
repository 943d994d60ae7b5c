use anyhow::{Context, Result};

use crate::api::SheetGateway;
use crate::cli::OutputFormat;
use crate::cli::output::emit;
use crate::config::Config;
use crate::services::events::discover_events;

pub async fn handle_events(
    gateway: &dyn SheetGateway,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let events = discover_events(gateway, &config.events)
        .await
        .context("Failed to list event workbooks")?;

    emit(format, &events, |events| {
        let rows = events
            .iter()
            .map(|e| vec![e.name.clone(), e.id.clone()])
            .collect();
        (vec!["Evento", "Planilha"], rows)
    })
}
