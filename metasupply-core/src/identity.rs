//! Caller identity.
//!
//! The interactive login flow belongs to an external identity provider; this
//! module only defines the seam and a provider backed by a fixed principal.

use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::record::Principal;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Login cancelled")]
    Cancelled,

    #[error("Login failed: {0}")]
    Failed(String),
}

/// Source of the caller principal.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the login flow and return the authenticated principal.
    async fn login(&self) -> Result<Principal, IdentityError>;

    /// Forget the current identity.
    async fn logout(&self);

    /// Principal of the current login, if any.
    fn principal(&self) -> Option<Principal>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Succeed(Principal),
    Fail(String),
    Cancel,
}

/// Provider that "logs in" as a configured principal without interaction.
#[derive(Debug)]
pub struct StaticIdentity {
    outcome: Outcome,
    current: RwLock<Option<Principal>>,
}

impl StaticIdentity {
    pub fn new(principal: Principal) -> Self {
        Self::with_outcome(Outcome::Succeed(principal))
    }

    /// A provider whose login always fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::with_outcome(Outcome::Fail(reason.into()))
    }

    /// A provider whose login is always cancelled.
    pub fn cancelled() -> Self {
        Self::with_outcome(Outcome::Cancel)
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            current: RwLock::new(None),
        }
    }

    fn set_current(&self, principal: Option<Principal>) {
        if let Ok(mut current) = self.current.write() {
            *current = principal;
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn login(&self) -> Result<Principal, IdentityError> {
        match &self.outcome {
            Outcome::Succeed(principal) => {
                info!(principal = %principal, "Logged in");
                self.set_current(Some(principal.clone()));
                Ok(principal.clone())
            }
            Outcome::Fail(reason) => Err(IdentityError::Failed(reason.clone())),
            Outcome::Cancel => Err(IdentityError::Cancelled),
        }
    }

    async fn logout(&self) {
        debug!("Logged out");
        self.set_current(None);
    }

    fn principal(&self) -> Option<Principal> {
        self.current.read().ok().and_then(|p| p.clone())
    }
}
