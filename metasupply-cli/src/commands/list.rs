//! List command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use metasupply_core::GroupingStrategy;

use crate::backend;
use crate::utils::{print_history, print_json};
use crate::GlobalArgs;

/// Execute the list command.
pub async fn execute(global: &GlobalArgs, verified: bool) -> Result<()> {
    let session = backend::start(global).await?;
    let strategy = if verified {
        GroupingStrategy::ByVerifiedChain
    } else {
        GroupingStrategy::ByOwnerAndName
    };
    let histories = session.histories(strategy);

    if global.json {
        let value = serde_json::to_value(&histories).context("Failed to serialize histories")?;
        return print_json(&value);
    }

    if histories.is_empty() {
        println!("{}", "No files found.".dimmed());
        return Ok(());
    }
    for history in &histories {
        print_history(history, verified);
    }
    Ok(())
}
