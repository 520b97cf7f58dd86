//! MetaSupply Core - versioned, content-addressed file-metadata registry client
//!
//! Callers submit metadata records describing files (name, producing model,
//! dataset, prompt). Records are never edited in place: a revision is a new
//! record whose `previous_hash` names the record it supersedes, so each
//! logical file accumulates a hash-chain of versions. Storage lives in a
//! remote registry; this crate derives identifiers, talks to the registry,
//! groups records into histories and filters them.
//!
//! # Features
//!
//! - SHA3-256 content-derived record identifiers
//! - Grouping by `(filename, creator)` or by verified `previous_hash` chains
//! - Case-insensitive search on filename, dataset or model
//! - JSON-over-HTTP registry binding (feature `network`) and an in-process
//!   registry with the same semantics
//!
//! # Example
//!
//! ```
//! use metasupply_core::{
//!     ForkPolicy, GroupingStrategy, LocalRegistry, RecordDraft, Revision, Session,
//!     StaticIdentity, Principal,
//! };
//!
//! # async fn example() -> Result<(), metasupply_core::SessionError> {
//! let registry = LocalRegistry::new();
//! let identity = StaticIdentity::new(Principal::new("alice"));
//! let mut session =
//!     Session::start(&identity, |p| Ok(registry.session(p)), ForkPolicy::Allow).await?;
//!
//! let draft = RecordDraft::new("x.txt", "GPT-4", "COCO", "").map_err(|e| {
//!     metasupply_core::RegistryError::from(e)
//! })?;
//! let root = session.submit(draft).await?;
//! session.revise(&root.id, Revision::model("GPT-4o")).await?;
//!
//! let histories = session.histories(GroupingStrategy::ByOwnerAndName);
//! assert_eq!(histories[0].current().map(|r| r.model.as_str()), Some("GPT-4o"));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod history;
pub mod ident;
pub mod identity;
pub mod query;
pub mod record;
pub mod registry;
pub mod session;
pub mod wire;

// Re-export main types for convenience
pub use client::{ForkPolicy, Receipt, RegistryClient};
pub use config::ClientConfig;
pub use error::{
    ErrorKind, RegistryError, RequiredField, Result, TransportError, ValidationError, WireError,
};
pub use history::{group, successors_of, ChainStatus, GroupingStrategy, History, HistoryKey};
pub use ident::{derive_id, Nonce};
pub use identity::{IdentityError, IdentityProvider, StaticIdentity};
pub use query::{filter, filter_by, find, SearchField};
pub use record::{NewRecord, Principal, Record, RecordDraft, RecordId};
pub use registry::{LocalRegistry, LocalSession, RegistryService};
pub use session::{Revision, Session, SessionError};

// Network-dependent exports (not available in Wasm)
#[cfg(feature = "network")]
pub use registry::{HttpRegistry, HttpRegistryConfig};
