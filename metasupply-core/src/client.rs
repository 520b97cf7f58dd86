//! Registry client facade.
//!
//! Translates between [`Record`]s and the registry wire format and classifies
//! failures into [`RegistryError`]s. No request is ever retried here.

use std::str::FromStr;

use tracing::{debug, info, instrument, warn};

use crate::error::{RegistryError, Result};
use crate::history::successors_of;
use crate::ident::Nonce;
use crate::record::{NewRecord, Principal, Record, RecordDraft, RecordId};
use crate::registry::RegistryService;
use crate::wire::{decode_listing, decode_lookup, decode_reply, UploadArgs, UploadReply};

/// What to do when a revision names a version that already has a successor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForkPolicy {
    /// Submit anyway; the chain forks.
    #[default]
    Allow,
    /// Refuse with [`RegistryError::Superseded`]. The check lists the
    /// caller's records first, so it is not atomic with the upload.
    RejectSuperseded,
}

impl FromStr for ForkPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject-superseded" => Ok(Self::RejectSuperseded),
            other => Err(format!(
                "Unknown fork policy '{other}' (expected allow or reject-superseded)"
            )),
        }
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub id: RecordId,
    pub message: String,
}

/// Client for one caller of the registry.
pub struct RegistryClient<S> {
    service: S,
    caller: Principal,
    fork_policy: ForkPolicy,
}

impl<S: RegistryService> RegistryClient<S> {
    /// Wrap a registry handle that is already bound to `caller`.
    pub fn new(service: S, caller: Principal) -> Self {
        Self {
            service,
            caller,
            fork_policy: ForkPolicy::default(),
        }
    }

    pub fn with_fork_policy(mut self, fork_policy: ForkPolicy) -> Self {
        self.fork_policy = fork_policy;
        self
    }

    pub fn caller(&self) -> &Principal {
        &self.caller
    }

    pub fn fork_policy(&self) -> ForkPolicy {
        self.fork_policy
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Upload a prepared record and return the registry's success message.
    #[instrument(level = "info", skip_all, fields(
        id = %record.id,
        backend = self.service.backend()
    ))]
    pub async fn submit(&self, record: &NewRecord) -> Result<String> {
        if let (ForkPolicy::RejectSuperseded, Some(previous)) =
            (self.fork_policy, record.draft.previous_hash())
        {
            let existing = self.fetch_all_for_caller().await?;
            if !successors_of(&existing, previous).is_empty() {
                warn!(previous = %previous, "Refusing to fork an already superseded version");
                return Err(RegistryError::Superseded {
                    previous: previous.clone(),
                });
            }
        }

        let reply = self.service.upload(UploadArgs::encode(record)).await?;
        match decode_reply(reply)? {
            UploadReply::Ok(message) => {
                info!(message = %message, "Record submitted");
                Ok(message)
            }
            UploadReply::Err(message) => {
                warn!(message = %message, "Registry rejected record");
                Err(RegistryError::ServiceRejected(message))
            }
        }
    }

    /// Derive an id for `draft` with a clock nonce, then submit it.
    pub async fn submit_draft(&self, draft: RecordDraft) -> Result<Receipt> {
        let record = draft.prepare(&self.caller, &Nonce::from_clock());
        let message = self.submit(&record).await?;
        Ok(Receipt {
            id: record.id,
            message,
        })
    }

    /// Every record owned by the caller, in registry order. Elements that
    /// fail to decode are logged and left out.
    #[instrument(level = "debug", skip_all, fields(backend = self.service.backend()))]
    pub async fn fetch_all_for_caller(&self) -> Result<Vec<Record>> {
        let value = self.service.list_by_owner().await?;
        let listing = decode_listing(value)?;
        if !listing.skipped.is_empty() {
            warn!(
                skipped = listing.skipped.len(),
                decoded = listing.records.len(),
                "Listing contained undecodable records"
            );
        }
        debug!(records = listing.records.len(), "Fetched records");
        Ok(listing.records)
    }

    /// Look a record up by id. A missing record is `Ok(None)`.
    #[instrument(level = "debug", skip_all, fields(id = %id))]
    pub async fn find_by_id(&self, id: &RecordId) -> Result<Option<Record>> {
        let value = self.service.find_by_hash(id).await?;
        Ok(decode_lookup(value)?)
    }
}

impl<S> std::fmt::Debug for RegistryClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("caller", &self.caller)
            .field("fork_policy", &self.fork_policy)
            .finish()
    }
}
