//! Table, JSON and CSV rendering of command results

use std::io;

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;

use super::OutputFormat;

/// Render serializable rows in the requested format; `table` builds the
/// (header, rows) pair used for the human-readable view
pub fn emit<T: Serialize>(
    format: OutputFormat,
    rows: &[T],
    table: impl FnOnce(&[T]) -> (Vec<&'static str>, Vec<Vec<String>>),
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(rows),
        OutputFormat::Csv => print_csv(rows),
        OutputFormat::Table => {
            let (header, body) = table(rows);
            print_table(&header, &body);
            Ok(())
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to format JSON output")?;
    println!("{}", text);
    Ok(())
}

pub fn print_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    for row in rows {
        writer.serialize(row).context("Failed to format CSV output")?;
    }
    writer.flush().context("Failed to write CSV output")?;
    Ok(())
}

/// Column-aligned table with a bold header
pub fn print_table(header: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("{}", "No results".dimmed());
        return;
    }

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(idx) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(cell, *width))
            .collect::<Vec<_>>()
            .join("  ")
    };
    println!(
        "{}",
        line(header.iter().map(|h| h.to_string()).collect()).bold()
    );
    for row in rows {
        println!("{}", line(row.clone()));
    }
    println!("{}", format!("{} row(s)", rows.len()).dimmed());
}

/// Left-align to a width counted in chars (accented text is common here)
fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{}{}", cell, " ".repeat(width.saturating_sub(len)))
}
