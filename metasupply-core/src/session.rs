//! Application context: who is logged in, which registry they talk to and
//! the last listing they saw.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::client::{ForkPolicy, Receipt, RegistryClient};
use crate::error::{RegistryError, TransportError};
use crate::history::{GroupingStrategy, History};
use crate::identity::{IdentityError, IdentityProvider};
use crate::query;
use crate::record::{Principal, Record, RecordDraft, RecordId};
use crate::registry::RegistryService;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Record not found: {0}")]
    NotFound(RecordId),
}

/// Field changes applied when revising a record. `None` keeps the
/// predecessor's value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Revision {
    pub model: Option<String>,
    pub dataset: Option<String>,
    pub prompt: Option<String>,
}

impl Revision {
    /// The common case: only the model changes.
    pub fn model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::default()
        }
    }

    fn apply(self, draft: RecordDraft) -> Result<RecordDraft, RegistryError> {
        let mut draft = draft;
        if let Some(model) = self.model {
            draft = draft.with_model(model)?;
        }
        if let Some(dataset) = self.dataset {
            draft = draft.with_dataset(dataset)?;
        }
        if let Some(prompt) = self.prompt {
            draft = draft.with_prompt(prompt);
        }
        Ok(draft)
    }
}

/// A logged-in caller with a registry client and a snapshot of their records.
///
/// The snapshot is replaced wholesale on every refresh; readers holding an
/// earlier [`Session::records`] keep a consistent view.
pub struct Session<S> {
    client: RegistryClient<S>,
    records: Arc<[Record]>,
}

impl<S: RegistryService> Session<S> {
    /// Log in through `identity`, bind a registry handle to the resulting
    /// principal and load the first snapshot.
    ///
    /// Nothing is contacted when the login fails or is cancelled.
    #[instrument(level = "info", skip_all)]
    pub async fn start<P, F>(
        identity: &P,
        connect: F,
        fork_policy: ForkPolicy,
    ) -> Result<Self, SessionError>
    where
        P: IdentityProvider + ?Sized,
        F: FnOnce(Principal) -> Result<S, TransportError>,
    {
        let mut session = Self::login(identity, connect, fork_policy).await?;
        session.refresh().await?;
        info!(
            caller = %session.caller(),
            records = session.records.len(),
            "Session started"
        );
        Ok(session)
    }

    /// Like [`Session::start`] but leaves the snapshot empty, so a caller
    /// that only submits does not depend on the listing call.
    pub async fn login<P, F>(
        identity: &P,
        connect: F,
        fork_policy: ForkPolicy,
    ) -> Result<Self, SessionError>
    where
        P: IdentityProvider + ?Sized,
        F: FnOnce(Principal) -> Result<S, TransportError>,
    {
        let principal = identity.login().await.map_err(|e| {
            warn!(error = %e, "Login did not complete");
            e
        })?;
        let service = connect(principal.clone()).map_err(RegistryError::from)?;
        let client = RegistryClient::new(service, principal).with_fork_policy(fork_policy);
        debug!(caller = %client.caller(), backend = client.service().backend(), "Logged in");
        Ok(Self::new(client))
    }

    /// Wrap an existing client with an empty snapshot.
    pub fn new(client: RegistryClient<S>) -> Self {
        Self {
            client,
            records: Arc::from(Vec::new()),
        }
    }

    pub fn caller(&self) -> &Principal {
        self.client.caller()
    }

    pub fn client(&self) -> &RegistryClient<S> {
        &self.client
    }

    /// Current snapshot, in registry order.
    pub fn records(&self) -> Arc<[Record]> {
        Arc::clone(&self.records)
    }

    /// Replace the snapshot with a fresh listing.
    pub async fn refresh(&mut self) -> Result<Arc<[Record]>, SessionError> {
        let records = self.client.fetch_all_for_caller().await?;
        self.records = Arc::from(records);
        debug!(records = self.records.len(), "Snapshot refreshed");
        Ok(self.records())
    }

    /// Submit a new record, then refresh. A failed refresh after a
    /// successful upload is logged and the old snapshot kept.
    pub async fn submit(&mut self, draft: RecordDraft) -> Result<Receipt, SessionError> {
        let receipt = self.client.submit_draft(draft).await?;
        if let Err(e) = self.refresh().await {
            warn!(error = %e, id = %receipt.id, "Refresh after submit failed");
        }
        Ok(receipt)
    }

    /// Create the next version of record `id` with `changes` applied.
    #[instrument(level = "info", skip_all, fields(id = %id))]
    pub async fn revise(&mut self, id: &RecordId, changes: Revision) -> Result<Receipt, SessionError> {
        let base = self.find(id).await?.ok_or_else(|| SessionError::NotFound(id.clone()))?;
        let draft = changes.apply(base.revise())?;
        self.submit(draft).await
    }

    pub fn histories(&self, strategy: GroupingStrategy) -> Vec<History> {
        strategy.histories(&self.records)
    }

    /// Filter the snapshot. `field` is matched by exact name; an unknown
    /// field matches nothing.
    pub fn search(&self, term: &str, field: &str) -> Vec<&Record> {
        query::filter(&self.records, term, field)
    }

    /// Look a record up in the snapshot, falling back to the registry.
    pub async fn find(&self, id: &RecordId) -> Result<Option<Record>, SessionError> {
        if let Some(record) = query::find(&self.records, id) {
            return Ok(Some(record.clone()));
        }
        Ok(self.client.find_by_id(id).await?)
    }
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("records", &self.records.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::identity::StaticIdentity;
    use crate::registry::{LocalRegistry, LocalSession};
    use crate::wire::UploadArgs;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Local registry whose listing call always returns garbage.
    struct BrokenListing(LocalSession);

    #[async_trait]
    impl RegistryService for BrokenListing {
        async fn upload(&self, args: UploadArgs) -> Result<Value, TransportError> {
            self.0.upload(args).await
        }

        async fn list_by_owner(&self) -> Result<Value, TransportError> {
            Ok(json!({"unexpected": true}))
        }

        async fn find_by_hash(&self, id: &RecordId) -> Result<Value, TransportError> {
            self.0.find_by_hash(id).await
        }

        fn backend(&self) -> &'static str {
            "broken-listing"
        }
    }

    async fn start(registry: &LocalRegistry, who: &str) -> Session<LocalSession> {
        let identity = StaticIdentity::new(Principal::new(who));
        Session::start(&identity, |p| Ok(registry.session(p)), ForkPolicy::Allow)
            .await
            .unwrap()
    }

    fn draft(filename: &str, model: &str) -> RecordDraft {
        RecordDraft::new(filename, model, "COCO", "").unwrap()
    }

    #[tokio::test]
    async fn test_start_refuses_failed_login() {
        let registry = LocalRegistry::new();
        let identity = StaticIdentity::failing("no wallet");
        let result = Session::start(
            &identity,
            |p| Ok(registry.session(p)),
            ForkPolicy::Allow,
        )
        .await;
        assert!(matches!(
            result,
            Err(SessionError::Identity(IdentityError::Failed(_)))
        ));

        let identity = StaticIdentity::cancelled();
        let result = Session::start(
            &identity,
            |p| Ok(registry.session(p)),
            ForkPolicy::Allow,
        )
        .await;
        assert!(matches!(
            result,
            Err(SessionError::Identity(IdentityError::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_connect_failure_is_registry_error() {
        let identity = StaticIdentity::new(Principal::new("alice"));
        let result: Result<Session<LocalSession>, _> = Session::start(
            &identity,
            |_| Err(TransportError::Unreachable("offline".into())),
            ForkPolicy::Allow,
        )
        .await;
        match result {
            Err(SessionError::Registry(e)) => assert_eq!(e.kind(), ErrorKind::Unreachable),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_submits_without_listing() {
        let registry = LocalRegistry::new();
        let identity = StaticIdentity::new(Principal::new("alice"));
        let connect = |p: Principal| -> Result<BrokenListing, TransportError> {
            Ok(BrokenListing(registry.session(p)))
        };

        let err = Session::start(&identity, connect, ForkPolicy::Allow)
            .await
            .unwrap_err();
        match err {
            SessionError::Registry(e) => assert_eq!(e.kind(), ErrorKind::MalformedResponse),
            other => panic!("unexpected: {other:?}"),
        }

        let mut session = Session::login(&identity, connect, ForkPolicy::Allow)
            .await
            .unwrap();
        assert!(session.records().is_empty());
        let receipt = session.submit(draft("x.txt", "GPT-4")).await.unwrap();
        assert_eq!(registry.len(), 1);
        assert!(session.records().is_empty());
        assert!(session.find(&receipt.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_submit_refreshes_snapshot() {
        let registry = LocalRegistry::new();
        let mut session = start(&registry, "alice").await;
        assert!(session.records().is_empty());

        let before = session.records();
        let receipt = session.submit(draft("x.txt", "GPT-4")).await.unwrap();
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.records()[0].id, receipt.id);
        // Earlier snapshots are unaffected.
        assert!(before.is_empty());
    }

    #[tokio::test]
    async fn test_revise_links_to_predecessor() {
        let registry = LocalRegistry::new();
        let mut session = start(&registry, "alice").await;
        let root = session.submit(draft("x.txt", "GPT-4")).await.unwrap();

        let next = session
            .revise(&root.id, Revision::model("GPT-4o"))
            .await
            .unwrap();

        let histories = session.histories(GroupingStrategy::ByOwnerAndName);
        assert_eq!(histories.len(), 1);
        let current = histories[0].current().unwrap();
        assert_eq!(current.id, next.id);
        assert_eq!(current.model, "GPT-4o");
        assert_eq!(current.dataset, "COCO");
        assert_eq!(current.previous_hash.as_ref(), Some(&root.id));
        assert_eq!(histories[0].predecessors()[0].id, root.id);
    }

    #[tokio::test]
    async fn test_revise_rejects_blank_model() {
        let registry = LocalRegistry::new();
        let mut session = start(&registry, "alice").await;
        let root = session.submit(draft("x.txt", "GPT-4")).await.unwrap();

        let err = session
            .revise(&root.id, Revision::model("  "))
            .await
            .unwrap_err();
        match err {
            SessionError::Registry(e) => assert_eq!(e.kind(), ErrorKind::Validation),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_revise_unknown_id() {
        let registry = LocalRegistry::new();
        let mut session = start(&registry, "alice").await;
        let err = session
            .revise(&RecordId::new("missing"), Revision::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_falls_back_to_registry() {
        let registry = LocalRegistry::new();
        let mut alice = start(&registry, "alice").await;
        let receipt = alice.submit(draft("x.txt", "GPT-4")).await.unwrap();

        let bob = start(&registry, "bob").await;
        assert!(bob.records().is_empty());
        let found = bob.find(&receipt.id).await.unwrap().unwrap();
        assert_eq!(found.creator, Principal::new("alice"));
    }

    #[tokio::test]
    async fn test_search_snapshot() {
        let registry = LocalRegistry::new();
        let mut session = start(&registry, "alice").await;
        session.submit(draft("x.txt", "GPT-4")).await.unwrap();
        session
            .submit(draft("y.txt", "Stable Diffusion"))
            .await
            .unwrap();

        assert_eq!(session.search("gpt", "model").len(), 1);
        assert_eq!(session.search("", "model").len(), 2);
        assert!(session.search("gpt", "creator").is_empty());
    }
}
