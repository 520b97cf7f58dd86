//! Search command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::debug;

use crate::backend;
use crate::utils::{print_json, print_record_row};
use crate::GlobalArgs;

/// Execute the search command. An unknown field matches nothing.
pub async fn execute(global: &GlobalArgs, term: String, by: String) -> Result<()> {
    let session = backend::start(global).await?;
    let matches = session.search(&term, &by);
    debug!(term = %term, field = %by, matches = matches.len(), "Search complete");

    if global.json {
        let value = serde_json::to_value(&matches).context("Failed to serialize records")?;
        return print_json(&value);
    }

    if matches.is_empty() {
        println!("{}", "No matching records.".dimmed());
        return Ok(());
    }
    for record in matches {
        println!("{}", record.filename.bold());
        print_record_row(" ", record);
    }
    Ok(())
}
