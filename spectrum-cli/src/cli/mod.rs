//! Command-line surface
//!
//! Every subcommand except `events` works against one event workbook, chosen
//! with `--event` (or `SPECTRUM_EVENT`). When only one event is visible it is
//! used without asking.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use crate::api::{SheetGateway, build_gateway};
use crate::config::Config;
use crate::services::events::{discover_events, select_event};
use crate::session::Session;
use commands::insert::{BsrArgs, InsertArgs};
use commands::lookup::SearchArgs;
use commands::pending::{EditArgs, PendingArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Parser)]
#[command(name = "spectrum-cli", version)]
#[command(about = "Record and reconcile RF emissions observed during monitored events")]
pub struct Cli {
    /// Event workbook (id or name)
    #[arg(long, short, global = true)]
    pub event: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List event workbooks
    Events,

    /// List records pending identification
    Pending(PendingArgs),

    /// Update fields of a pending record
    Edit(EditArgs),

    /// Register a newly observed emission
    Insert(InsertArgs),

    /// Register a BSR/jammer or fake base-station sighting
    Bsr(BsrArgs),

    /// Free-text search across sheets
    Search(SearchArgs),

    /// Show the UTE authorization table
    Ute,

    /// List identification categories
    Identifications,
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let gateway = build_gateway(&config.gateway).context("Failed to set up the workbook backend")?;

    if let Commands::Events = cli.command {
        return commands::events::handle_events(gateway.as_ref(), &config, cli.format).await;
    }

    let session = open_session(gateway, &config, cli.event.as_deref()).await?;
    match cli.command {
        Commands::Events => unreachable!("handled above"),
        Commands::Pending(args) => commands::pending::handle_pending(&session, args, cli.format).await,
        Commands::Edit(args) => commands::pending::handle_edit(&session, args).await,
        Commands::Insert(args) => commands::insert::handle_insert(&session, args, cli.format).await,
        Commands::Bsr(args) => commands::insert::handle_bsr(&session, args).await,
        Commands::Search(args) => commands::lookup::handle_search(&session, args, cli.format).await,
        Commands::Ute => commands::lookup::handle_ute(&session, cli.format).await,
        Commands::Identifications => {
            commands::lookup::handle_identifications(&session, cli.format).await
        }
    }
}

async fn open_session(
    gateway: Arc<dyn SheetGateway>,
    config: &Config,
    query: Option<&str>,
) -> Result<Session> {
    let events = discover_events(gateway.as_ref(), &config.events)
        .await
        .context("Failed to list event workbooks")?;

    let event = match query {
        Some(query) => select_event(&events, query).cloned().with_context(|| {
            format!("No single event matches '{}'; run `spectrum-cli events`", query)
        })?,
        None => match events.as_slice() {
            [only] => only.clone(),
            [] => bail!("No event workbooks found"),
            _ => bail!("Several events found; choose one with --event"),
        },
    };

    info!("Using event '{}' ({})", event.name, event.id);
    Ok(Session::new(gateway, event, config))
}
