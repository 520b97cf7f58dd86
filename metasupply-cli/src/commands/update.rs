//! Update command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use metasupply_core::display::short_hash;
use metasupply_core::{RecordId, Revision};
use serde_json::json;
use tracing::info;

use crate::backend;
use crate::utils::print_json;
use crate::GlobalArgs;

/// Execute the update command: create the next version of `id`.
pub async fn execute(
    global: &GlobalArgs,
    id: String,
    model: Option<String>,
    dataset: Option<String>,
    prompt: Option<String>,
) -> Result<()> {
    let id = RecordId::new(id);
    let changes = Revision {
        model,
        dataset,
        prompt,
    };

    let mut session = backend::start(global).await?;
    let receipt = session
        .revise(&id, changes)
        .await
        .with_context(|| format!("Failed to update {}", short_hash(&id)))?;

    info!(id = %receipt.id, previous = %id, "Update complete");

    if global.json {
        print_json(&json!({
            "id": receipt.id,
            "previous_hash": id,
            "message": receipt.message,
        }))?;
    } else {
        println!("{} {}", "✓".green().bold(), receipt.message);
        println!(
            "   {} {} {} {}",
            "Version:".dimmed(),
            short_hash(&id),
            "→".dimmed(),
            short_hash(&receipt.id)
        );
    }
    Ok(())
}
