//! New emission and BSR/ERB registration

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, ValueEnum};
use colored::*;
use dialoguer::Confirm;
use is_terminal::IsTerminal;
use log::warn;

use crate::cli::OutputFormat;
use crate::cli::output::print_json;
use crate::services::columns::normalize_text;
use crate::services::insert::{
    BAND_OPTIONS, BsrKind, EmissionForm, InsertOutcome, identification_options, insert_bsr_erb,
    insert_emission,
};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct InsertArgs {
    /// Inspector on duty
    #[arg(long)]
    pub fiscal: String,

    /// Where the emission was observed (default "Abordagem")
    #[arg(long, default_value = "")]
    pub local: String,

    /// Observation date, DD/MM/YYYY (default today)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Observation time, HH:MM (default now)
    #[arg(long, value_parser = parse_time)]
    pub time: Option<NaiveTime>,

    /// Center frequency in MHz
    #[arg(long)]
    pub frequency: f64,

    /// Occupied bandwidth in kHz
    #[arg(long, default_value_t = 0.0)]
    pub bandwidth: f64,

    /// Service band (FM, SMA, SMM, SLP, TV, SMP, GNSS, Satélite, Radiação Restrita)
    #[arg(long)]
    pub band: String,

    /// Identification category (see `identifications`)
    #[arg(long)]
    pub identification: String,

    /// Emission is covered by a temporary-use authorization
    #[arg(long)]
    pub ute: bool,

    /// SEI process of the UTE authorization
    #[arg(long, default_value = "")]
    pub sei: String,

    /// Details and contacts
    #[arg(long)]
    pub observations: String,

    /// Who is responsible for the emission (default: the fiscal)
    #[arg(long)]
    pub responsible: Option<String>,

    /// Insert even if the frequency is already registered
    #[arg(long, short)]
    pub yes: bool,
}

fn parse_date(text: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y").map_err(|e| format!("expected DD/MM/YYYY: {}", e))
}

fn parse_time(text: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").map_err(|e| format!("expected HH:MM: {}", e))
}

impl InsertArgs {
    fn to_form(&self) -> EmissionForm {
        EmissionForm {
            local: self.local.clone(),
            fiscal: self.fiscal.clone(),
            date: self.date,
            time: self.time,
            frequency_mhz: self.frequency,
            bandwidth_khz: self.bandwidth,
            band: self.band.clone(),
            identification: self.identification.clone(),
            is_ute: self.ute,
            sei_process: self.sei.clone(),
            observations: self.observations.clone(),
            responsible: self.responsible.clone().unwrap_or_else(|| self.fiscal.clone()),
        }
    }
}

fn is_known(options: &[String], value: &str) -> bool {
    let value = normalize_text(value);
    options.iter().any(|o| normalize_text(o) == value)
}

pub async fn handle_insert(session: &Session, args: InsertArgs, format: OutputFormat) -> Result<()> {
    let form = args.to_form();

    let bands: Vec<String> = BAND_OPTIONS.iter().map(|b| b.to_string()).collect();
    if !is_known(&bands, &form.band) {
        warn!("Band '{}' is not one of: {}", form.band, BAND_OPTIONS.join(", "));
    }
    let identifications = identification_options(session)
        .await
        .context("Failed to load identification options")?;
    if !is_known(&identifications, &form.identification) {
        warn!("Identification '{}' is not in the workbook's list", form.identification);
    }

    let mut outcome = insert_emission(session, &form, args.yes)
        .await
        .context("Failed to insert emission")?;

    if let InsertOutcome::DuplicateFrequency { frequency_mhz, existing } = &outcome {
        if !std::io::stdin().is_terminal() {
            bail!(
                "{} MHz is already registered by '{}'; re-run with --yes to insert anyway",
                frequency_mhz,
                existing
            );
        }
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "{} MHz is already registered by '{}'. Insert anyway?",
                frequency_mhz, existing
            ))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("{}", "Insertion cancelled".yellow());
            return Ok(());
        }
        outcome = insert_emission(session, &form, true)
            .await
            .context("Failed to insert emission")?;
    }

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        _ => {
            if let InsertOutcome::Inserted { id, row } = outcome {
                println!(
                    "{} {} (row {})",
                    "Emission registered with id".green(),
                    id.to_string().bold(),
                    row
                );
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BsrKindArg {
    Jammer,
    ErbFake,
}

impl From<BsrKindArg> for BsrKind {
    fn from(kind: BsrKindArg) -> Self {
        match kind {
            BsrKindArg::Jammer => BsrKind::Jammer,
            BsrKindArg::ErbFake => BsrKind::ErbFake,
        }
    }
}

#[derive(Args, Debug)]
pub struct BsrArgs {
    /// Sighting type
    #[arg(long, value_enum)]
    pub kind: BsrKindArg,

    /// Region or place of the sighting
    #[arg(long)]
    pub region: String,

    /// Latitude, e.g. -22.912345
    #[arg(long, default_value = "", allow_negative_numbers = true)]
    pub lat: String,

    /// Longitude, e.g. -43.230123
    #[arg(long, default_value = "", allow_negative_numbers = true)]
    pub lon: String,
}

pub async fn handle_bsr(session: &Session, args: BsrArgs) -> Result<()> {
    let kind = BsrKind::from(args.kind);
    let row = insert_bsr_erb(session, kind, &args.region, &args.lat, &args.lon)
        .await
        .with_context(|| format!("Failed to register {}", kind.label()))?;
    println!("{} (row {})", format!("'{}' registered", kind.label()).green(), row);
    Ok(())
}
