//! Session setup: configuration, login and registry selection.

use anyhow::{Context, Result};
use metasupply_core::{
    ClientConfig, HttpRegistry, LocalRegistry, Principal, RegistryService, Session,
    TransportError,
};
use tracing::debug;

use crate::GlobalArgs;

pub type CliSession = Session<Box<dyn RegistryService>>;

/// Merge command-line overrides into the environment configuration.
pub fn resolve_config(global: &GlobalArgs) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(path) = &global.local {
        config.local_store = Some(path.clone());
    }
    if let Some(url) = &global.registry {
        config.registry_url = url.clone();
    }
    if let Some(principal) = global.principal.as_deref().map(str::trim) {
        if !principal.is_empty() {
            config.principal = Principal::new(principal);
        }
    }
    if let Some(policy) = global.fork_policy {
        config.fork_policy = policy;
    }
    config
}

fn connect(
    config: &ClientConfig,
    principal: Principal,
) -> Result<Box<dyn RegistryService>, TransportError> {
    match &config.local_store {
        Some(path) => {
            debug!(path = %path.display(), "Using local registry");
            Ok(Box::new(LocalRegistry::open(path)?.session(principal)))
        }
        None => {
            debug!(url = %config.registry_url, "Using HTTP registry");
            let http = config.http_config().map_err(|e| {
                TransportError::Unreachable(format!(
                    "Invalid registry URL {}: {e}",
                    config.registry_url
                ))
            })?;
            Ok(Box::new(HttpRegistry::new(http, principal)?))
        }
    }
}

/// Log in and load the caller's records.
pub async fn start(global: &GlobalArgs) -> Result<CliSession> {
    let config = resolve_config(global);
    let identity = config.identity();
    Session::start(
        &identity,
        |principal| connect(&config, principal),
        config.fork_policy,
    )
    .await
    .context("Failed to start session")
}

/// Log in without loading the caller's records.
pub async fn login(global: &GlobalArgs) -> Result<CliSession> {
    let config = resolve_config(global);
    let identity = config.identity();
    Session::login(
        &identity,
        |principal| connect(&config, principal),
        config.fork_policy,
    )
    .await
    .context("Failed to start session")
}
