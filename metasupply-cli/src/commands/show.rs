//! Show command implementation.

use anyhow::{Context, Result};
use metasupply_core::{RecordId, SessionError};

use crate::backend;
use crate::utils::{print_json, print_record_detail};
use crate::GlobalArgs;

/// Execute the show command.
pub async fn execute(global: &GlobalArgs, id: String) -> Result<()> {
    let id = RecordId::new(id);
    let session = backend::start(global).await?;
    let record = session
        .find(&id)
        .await
        .context("Failed to look up record")?
        .ok_or_else(|| SessionError::NotFound(id.clone()))?;

    if global.json {
        let value = serde_json::to_value(&record).context("Failed to serialize record")?;
        return print_json(&value);
    }
    print_record_detail(&record);
    Ok(())
}
