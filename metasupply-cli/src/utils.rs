//! Common rendering helpers shared across CLI commands.

use anyhow::{Context, Result};
use colored::Colorize;
use metasupply_core::display::{format_timestamp, previous_or_na, short_hash, short_principal};
use metasupply_core::{ChainStatus, History, Record};
use serde_json::Value;

/// Pretty-print a JSON document on stdout.
pub fn print_json(value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}

/// Header and version rows of one history.
pub fn print_history(history: &History, verified: bool) {
    let title = format!(
        "{} ({} version{})",
        history.key.filename,
        history.len(),
        if history.len() == 1 { "" } else { "s" }
    );
    match (&history.status, verified) {
        (_, false) => println!("{}", title.bold()),
        (ChainStatus::Intact, true) => println!("{} {}", title.bold(), "intact".green()),
        (status, true) => println!("{} {}", title.bold(), describe_status(status).red()),
    }
    for (index, record) in history.versions.iter().enumerate() {
        let marker = if index == 0 { "*" } else { " " };
        print_record_row(marker, record);
    }
    println!();
}

pub fn print_record_row(marker: &str, record: &Record) {
    println!(
        "  {} {}  {}  {}  {}  {}",
        marker.green(),
        short_hash(&record.id).cyan(),
        record.model,
        record.dataset.dimmed(),
        format!("prev {}", previous_or_na(record.previous_hash.as_ref())).dimmed(),
        format_timestamp(record.timestamp).dimmed()
    );
}

/// All fields of one record, one per line.
pub fn print_record_detail(record: &Record) {
    println!();
    println!("   {} {}", "Id:".dimmed(), record.id);
    println!("   {} {}", "Filename:".dimmed(), record.filename);
    println!("   {} {}", "Model:".dimmed(), record.model);
    println!("   {} {}", "Dataset:".dimmed(), record.dataset);
    println!("   {} {}", "Prompt:".dimmed(), record.prompt);
    println!(
        "   {} {}",
        "Previous:".dimmed(),
        record
            .previous_hash
            .as_ref()
            .map_or_else(|| "N/A".to_string(), ToString::to_string)
    );
    println!(
        "   {} {}",
        "Creator:".dimmed(),
        short_principal(&record.creator)
    );
    println!(
        "   {} {}",
        "Created:".dimmed(),
        format_timestamp(record.timestamp)
    );
}

pub fn describe_status(status: &ChainStatus) -> String {
    match status {
        ChainStatus::Unverified => "unverified".to_string(),
        ChainStatus::Intact => "intact".to_string(),
        ChainStatus::Broken { missing } => format!("broken: {} missing", short_hash(missing)),
        ChainStatus::Cycle { at } => format!("cycle at {}", short_hash(at)),
    }
}
