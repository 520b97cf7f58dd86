//! Client configuration
//!
//! Loaded from environment variables with sensible defaults. Front ends
//! override individual fields from their own flags.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::client::ForkPolicy;
use crate::identity::StaticIdentity;
use crate::record::Principal;

pub const DEFAULT_REGISTRY_URL: &str = "http://127.0.0.1:4943/api/registry";

/// Client configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Registry base URL (default: local replica)
    pub registry_url: String,
    /// Caller principal (default: anonymous)
    pub principal: Principal,
    /// Bearer token forwarded to the registry
    pub auth_token: Option<String>,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Fork handling for revisions (default: allow)
    pub fork_policy: ForkPolicy,
    /// Use a local registry file instead of the remote service
    pub local_store: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            principal: Principal::anonymous(),
            auth_token: None,
            timeout_secs: 30,
            fork_policy: ForkPolicy::Allow,
            local_store: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Unparseable values
    /// fall back to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let registry_url = lookup("METASUPPLY_REGISTRY_URL")
            .filter(|url| match Url::parse(url) {
                Ok(_) => true,
                Err(e) => {
                    warn!(url = %url, error = %e, "Ignoring invalid METASUPPLY_REGISTRY_URL");
                    false
                }
            })
            .unwrap_or(defaults.registry_url);

        let principal = lookup("METASUPPLY_PRINCIPAL")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(Principal::new)
            .unwrap_or(defaults.principal);

        let auth_token = lookup("METASUPPLY_AUTH_TOKEN").filter(|t| !t.is_empty());

        let timeout_secs = lookup("METASUPPLY_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.timeout_secs);

        let fork_policy = lookup("METASUPPLY_FORK_POLICY")
            .and_then(|v| {
                v.parse::<ForkPolicy>()
                    .map_err(|e: String| warn!(error = %e, "Ignoring METASUPPLY_FORK_POLICY"))
                    .ok()
            })
            .unwrap_or(defaults.fork_policy);

        let local_store = lookup("METASUPPLY_LOCAL_STORE")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Self {
            registry_url,
            principal,
            auth_token,
            timeout_secs,
            fork_policy,
            local_store,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Identity provider logging in as the configured principal.
    pub fn identity(&self) -> StaticIdentity {
        StaticIdentity::new(self.principal.clone())
    }

    /// HTTP binding settings for the configured registry.
    #[cfg(feature = "network")]
    pub fn http_config(&self) -> Result<crate::registry::HttpRegistryConfig, url::ParseError> {
        let mut config = crate::registry::HttpRegistryConfig::new(Url::parse(&self.registry_url)?);
        config.timeout = self.timeout();
        config.auth_token = self.auth_token.clone();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ClientConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.registry_url, DEFAULT_REGISTRY_URL);
        assert_eq!(config.principal, Principal::anonymous());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.fork_policy, ForkPolicy::Allow);
        assert!(config.local_store.is_none());
    }

    #[test]
    fn test_empty_environment_is_default() {
        assert_eq!(from_pairs(&[]), ClientConfig::default());
    }

    #[test]
    fn test_values_from_environment() {
        let config = from_pairs(&[
            ("METASUPPLY_REGISTRY_URL", "https://registry.example.org/api"),
            ("METASUPPLY_PRINCIPAL", " alice "),
            ("METASUPPLY_AUTH_TOKEN", "secret"),
            ("METASUPPLY_TIMEOUT_SECS", "5"),
            ("METASUPPLY_FORK_POLICY", "reject-superseded"),
            ("METASUPPLY_LOCAL_STORE", "/tmp/registry.json"),
        ]);
        assert_eq!(config.registry_url, "https://registry.example.org/api");
        assert_eq!(config.principal, Principal::new("alice"));
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.fork_policy, ForkPolicy::RejectSuperseded);
        assert_eq!(config.local_store, Some(PathBuf::from("/tmp/registry.json")));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("METASUPPLY_REGISTRY_URL", "not a url"),
            ("METASUPPLY_PRINCIPAL", "   "),
            ("METASUPPLY_TIMEOUT_SECS", "0"),
            ("METASUPPLY_FORK_POLICY", "strict"),
        ]);
        assert_eq!(config, ClientConfig::default());
    }

    #[cfg(feature = "network")]
    #[test]
    fn test_http_config() {
        let config = from_pairs(&[("METASUPPLY_AUTH_TOKEN", "secret")]);
        let http = config.http_config().unwrap();
        assert_eq!(http.base_url.as_str(), DEFAULT_REGISTRY_URL);
        assert_eq!(http.auth_token.as_deref(), Some("secret"));
    }
}
