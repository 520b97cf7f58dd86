//! Remote registry service bindings.
//!
//! A [`RegistryService`] is a handle to the registry already bound to an
//! authenticated caller. It exchanges raw wire values; decoding and error
//! classification happen in [`crate::client::RegistryClient`].
//!
//! - [`LocalRegistry`] - in-process registry with the remote's semantics
//! - [`HttpRegistry`] - JSON-over-HTTP binding (feature `network`)

mod local;
#[cfg(feature = "network")]
mod http;

pub use local::{LocalRegistry, LocalSession};
#[cfg(feature = "network")]
pub use http::{HttpRegistry, HttpRegistryConfig};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::record::RecordId;
use crate::wire::UploadArgs;

/// Transport-level contract of the remote registry.
///
/// Implementations must be thread-safe (`Send + Sync`) and must not retry on
/// their own.
#[async_trait]
pub trait RegistryService: Send + Sync {
    /// Upload one record. Replies with an `{"Ok": ..}` / `{"Err": ..}`
    /// variant.
    async fn upload(&self, args: UploadArgs) -> Result<Value, TransportError>;

    /// All records owned by the bound caller, as a sequence.
    async fn list_by_owner(&self) -> Result<Value, TransportError>;

    /// Zero-or-one element sequence holding the record with this id.
    async fn find_by_hash(&self, id: &RecordId) -> Result<Value, TransportError>;

    /// Human-readable name of the backend, for logs.
    fn backend(&self) -> &'static str;
}

/// Lets front ends pick a backend at runtime behind `Box<dyn RegistryService>`.
#[async_trait]
impl<T: RegistryService + ?Sized> RegistryService for Box<T> {
    async fn upload(&self, args: UploadArgs) -> Result<Value, TransportError> {
        (**self).upload(args).await
    }

    async fn list_by_owner(&self) -> Result<Value, TransportError> {
        (**self).list_by_owner().await
    }

    async fn find_by_hash(&self, id: &RecordId) -> Result<Value, TransportError> {
        (**self).find_by_hash(id).await
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}
