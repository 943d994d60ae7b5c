mod api;
mod cli;
mod config;
mod error;
mod services;
mod session;

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let mut cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config
        }
        None => Config::load()?,
    };
    debug!("Backend: {:?}", config.gateway.backend);

    if cli.event.is_none() {
        cli.event = std::env::var("SPECTRUM_EVENT").ok().filter(|e| !e.trim().is_empty());
    }

    cli::run(cli, config).await
}
