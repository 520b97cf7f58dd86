//! In-process registry with the same semantics as the remote service.
//!
//! Used for offline operation (optionally persisted to a JSON file) and as the
//! registry behind tests. Each caller talks to it through a [`LocalSession`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::RegistryService;
use crate::error::TransportError;
use crate::record::{Principal, Record, RecordId};
use crate::wire::{encode_listing, encode_lookup, UploadArgs, UploadReply, UploadRequest};

/// On-disk layout of a persisted local registry.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    records: Vec<Record>,
}

struct LocalState {
    /// Records per owner, in upload order
    records: DashMap<Principal, Vec<Record>>,
    /// Global id index (id -> owner)
    owners: DashMap<RecordId, Principal>,
    /// Last timestamp handed out, nanoseconds
    last_timestamp: AtomicU64,
    /// Persistence target, if any
    path: Option<PathBuf>,
}

/// Shared in-process registry. Cloning yields another handle to the same
/// store.
#[derive(Clone)]
pub struct LocalRegistry {
    state: Arc<LocalState>,
}

impl Default for LocalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRegistry {
    /// Create an empty, memory-only registry.
    pub fn new() -> Self {
        Self::with_path(None)
    }

    fn with_path(path: Option<PathBuf>) -> Self {
        Self {
            state: Arc::new(LocalState {
                records: DashMap::new(),
                owners: DashMap::new(),
                last_timestamp: AtomicU64::new(0),
                path,
            }),
        }
    }

    /// Open a registry persisted at `path`, creating it on first upload if
    /// the file does not exist yet.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref().to_path_buf();
        let registry = Self::with_path(Some(path.clone()));

        if !path.exists() {
            debug!("Local store does not exist yet, starting empty");
            return Ok(registry);
        }

        let bytes = std::fs::read(&path).map_err(|e| {
            TransportError::Unreachable(format!(
                "Failed to read local store {}: {e}",
                path.display()
            ))
        })?;
        let store: StoreFile = serde_json::from_slice(&bytes).map_err(|e| {
            TransportError::InvalidBody(format!(
                "Failed to parse local store {}: {e}",
                path.display()
            ))
        })?;

        for record in store.records {
            registry.restore(record);
        }
        info!(records = registry.len(), "Local store loaded");
        Ok(registry)
    }

    fn restore(&self, record: Record) {
        self.state
            .last_timestamp
            .fetch_max(record.timestamp, Ordering::SeqCst);
        self.state
            .owners
            .insert(record.id.clone(), record.creator.clone());
        self.state
            .records
            .entry(record.creator.clone())
            .or_default()
            .push(record);
    }

    /// Handle bound to `caller`, as an authenticated agent would be.
    pub fn session(&self, caller: Principal) -> LocalSession {
        LocalSession {
            registry: self.clone(),
            caller,
        }
    }

    /// Total number of records across all owners.
    pub fn len(&self) -> usize {
        self.state.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.owners.is_empty()
    }

    /// Write the store to its backing file. No-op for memory-only registries.
    pub fn persist(&self) -> Result<(), TransportError> {
        let Some(path) = &self.state.path else {
            return Ok(());
        };

        let mut records: Vec<Record> = self
            .state
            .records
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let json = serde_json::to_vec_pretty(&StoreFile { records }).map_err(|e| {
            TransportError::InvalidBody(format!("Failed to serialize local store: {e}"))
        })?;
        std::fs::write(path, json).map_err(|e| {
            TransportError::Unreachable(format!(
                "Failed to write local store {}: {e}",
                path.display()
            ))
        })?;
        debug!(path = %path.display(), "Local store persisted");
        Ok(())
    }

    /// Strictly increasing nanosecond clock. Saturates at `u64::MAX`.
    fn next_timestamp(&self) -> u64 {
        let now = Utc::now()
            .timestamp_nanos_opt()
            .and_then(|ns| u64::try_from(ns).ok())
            .unwrap_or(0);
        let previous = self
            .state
            .last_timestamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or(now);
        now.max(previous.saturating_add(1))
    }

    fn insert(&self, caller: &Principal, request: UploadRequest) -> UploadReply {
        if let Some(previous) = &request.previous_hash {
            if !self.state.owners.contains_key(previous) {
                warn!(id = %request.id, previous = %previous, "Upload rejected: unknown previous version");
                return UploadReply::Err(format!("Previous version {previous} not found."));
            }
        }

        match self.state.owners.entry(request.id.clone()) {
            Entry::Occupied(_) => {
                warn!(id = %request.id, "Upload rejected: duplicate id");
                return UploadReply::Err(format!("File with ID {} already exists.", request.id));
            }
            Entry::Vacant(slot) => {
                slot.insert(caller.clone());
            }
        }

        let record = Record {
            id: request.id,
            filename: request.filename,
            model: request.model,
            dataset: request.dataset,
            prompt: request.prompt,
            previous_hash: request.previous_hash,
            creator: caller.clone(),
            timestamp: self.next_timestamp(),
        };
        let id = record.id.clone();
        info!(id = %id, filename = %record.filename, creator = %caller, "File uploaded");

        self.state
            .records
            .entry(caller.clone())
            .or_default()
            .push(record);

        UploadReply::Ok(format!("File {id} uploaded successfully!"))
    }

    fn owned_by(&self, caller: &Principal) -> Vec<Record> {
        self.state
            .records
            .get(caller)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn lookup(&self, id: &RecordId) -> Option<Record> {
        let owner = self.state.owners.get(id)?.value().clone();
        let records = self.state.records.get(&owner)?;
        records.iter().find(|r| &r.id == id).cloned()
    }
}

impl std::fmt::Debug for LocalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRegistry")
            .field("owners", &self.state.records.len())
            .field("records", &self.len())
            .field("path", &self.state.path)
            .finish()
    }
}

/// A [`LocalRegistry`] handle bound to one caller.
#[derive(Debug, Clone)]
pub struct LocalSession {
    registry: LocalRegistry,
    caller: Principal,
}

impl LocalSession {
    pub fn caller(&self) -> &Principal {
        &self.caller
    }

    pub fn registry(&self) -> &LocalRegistry {
        &self.registry
    }
}

#[async_trait]
impl RegistryService for LocalSession {
    async fn upload(&self, args: UploadArgs) -> Result<Value, TransportError> {
        let reply = match args.decode() {
            Ok(request) => self.registry.insert(&self.caller, request),
            Err(e) => UploadReply::Err(format!("Invalid upload arguments: {e}")),
        };
        if matches!(reply, UploadReply::Ok(_)) {
            self.registry.persist()?;
        }
        Ok(reply.to_value())
    }

    async fn list_by_owner(&self) -> Result<Value, TransportError> {
        Ok(encode_listing(&self.registry.owned_by(&self.caller)))
    }

    async fn find_by_hash(&self, id: &RecordId) -> Result<Value, TransportError> {
        Ok(encode_lookup(self.registry.lookup(id).as_ref()))
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
