//! JSON-over-HTTP binding of the remote registry.
//!
//! Endpoints, relative to the configured base URL:
//! - `POST upload_file` with the positional upload arguments
//! - `GET get_all_files`
//! - `GET search_file/{id}`
//!
//! Requests are sent once; retrying is left to the user.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::RegistryService;
use crate::error::TransportError;
use crate::record::{Principal, RecordId};
use crate::wire::UploadArgs;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the caller principal.
pub const PRINCIPAL_HEADER: &str = "x-principal";

/// Configuration for the HTTP registry binding.
#[derive(Debug, Clone)]
pub struct HttpRegistryConfig {
    /// Base URL of the registry API.
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Optional bearer token from the identity provider.
    pub auth_token: Option<String>,
}

impl HttpRegistryConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            auth_token: None,
        }
    }
}

/// Registry reached over HTTP, bound to one caller.
pub struct HttpRegistry {
    client: Client,
    config: HttpRegistryConfig,
    caller: Principal,
}

impl HttpRegistry {
    #[instrument(level = "debug", skip_all, fields(
        base_url = %config.base_url,
        timeout_ms = config.timeout.as_millis() as u64,
        caller = %caller
    ))]
    pub fn new(config: HttpRegistryConfig, caller: Principal) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to create HTTP client");
                TransportError::Unreachable(format!("Failed to create HTTP client: {e}"))
            })?;

        info!("HTTP registry client created");
        Ok(Self {
            client,
            config,
            caller,
        })
    }

    /// Resolve an endpoint relative to the base URL, keeping any base path.
    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        let mut base = self.config.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path)
            .map_err(|e| TransportError::Unreachable(format!("Invalid endpoint {path}: {e}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(PRINCIPAL_HEADER, self.caller.as_str());
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Value, TransportError> {
        let start = Instant::now();

        let response = self.authorize(request).send().await.map_err(|e| {
            warn!(
                error = %e,
                endpoint,
                latency_ms = start.elapsed().as_millis() as u64,
                "Registry request failed"
            );
            TransportError::Unreachable(format!("{endpoint} request failed: {e}"))
        })?;

        let value = Self::read_json(response, endpoint).await?;
        debug!(
            endpoint,
            latency_ms = start.elapsed().as_millis() as u64,
            "Registry request completed"
        );
        Ok(value)
    }

    async fn read_json(response: Response, endpoint: &str) -> Result<Value, TransportError> {
        let status = response.status();
        debug!(status = %status, endpoint, "Received HTTP response");

        if !status.is_success() {
            warn!(status = %status, endpoint, "Registry returned error status");
            return Err(TransportError::Unreachable(format!(
                "{endpoint} returned status: {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Unreachable(format!("Failed to read {endpoint} body: {e}")))?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, endpoint, "Registry body is not JSON");
            TransportError::InvalidBody(format!("{endpoint} body is not JSON: {e}"))
        })
    }
}

#[async_trait]
impl RegistryService for HttpRegistry {
    #[instrument(level = "debug", skip_all, fields(id = %args.0))]
    async fn upload(&self, args: UploadArgs) -> Result<Value, TransportError> {
        let url = self.endpoint("upload_file")?;
        self.send(self.client.post(url).json(&args), "upload_file")
            .await
    }

    #[instrument(level = "debug", skip_all)]
    async fn list_by_owner(&self) -> Result<Value, TransportError> {
        let url = self.endpoint("get_all_files")?;
        self.send(self.client.get(url), "get_all_files").await
    }

    #[instrument(level = "debug", skip_all, fields(id = %id))]
    async fn find_by_hash(&self, id: &RecordId) -> Result<Value, TransportError> {
        let mut url = self.endpoint("search_file/")?;
        url.path_segments_mut()
            .map_err(|_| TransportError::Unreachable("Base URL cannot carry a path".into()))?
            .pop_if_empty()
            .push(id.as_str());
        self.send(self.client.get(url), "search_file").await
    }

    fn backend(&self) -> &'static str {
        "http"
    }
}

impl std::fmt::Debug for HttpRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRegistry")
            .field("base_url", &self.config.base_url.as_str())
            .field("caller", &self.caller)
            .finish()
    }
}
