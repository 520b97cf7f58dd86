//! Upload command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use metasupply_core::display::short_hash;
use metasupply_core::RecordDraft;
use serde_json::json;
use tracing::info;

use crate::backend;
use crate::utils::print_json;
use crate::GlobalArgs;

/// Execute the upload command.
pub async fn execute(
    global: &GlobalArgs,
    filename: String,
    model: String,
    dataset: String,
    prompt: String,
) -> Result<()> {
    // Validate before logging in so blank fields never reach the registry
    let draft = RecordDraft::new(filename, model, dataset, prompt)?;

    let mut session = backend::login(global).await?;
    let receipt = session
        .submit(draft)
        .await
        .context("Failed to upload record")?;

    info!(id = %receipt.id, "Upload complete");

    if global.json {
        print_json(&json!({ "id": receipt.id, "message": receipt.message }))?;
    } else {
        println!("{} {}", "✓".green().bold(), receipt.message);
        println!("   {} {}", "Id:".dimmed(), short_hash(&receipt.id));
    }
    Ok(())
}
