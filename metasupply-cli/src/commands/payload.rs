//! Payload command implementation.

use anyhow::{Context, Result};
use metasupply_core::{RecordId, SessionError};

use crate::backend;
use crate::GlobalArgs;

/// Print the record as the JSON document a QR encoder would carry.
pub async fn execute(global: &GlobalArgs, id: String) -> Result<()> {
    let id = RecordId::new(id);
    let session = backend::start(global).await?;
    let record = session
        .find(&id)
        .await
        .context("Failed to look up record")?
        .ok_or_else(|| SessionError::NotFound(id.clone()))?;

    let payload = record
        .scan_payload()
        .context("Failed to encode payload")?;
    println!("{payload}");
    Ok(())
}
