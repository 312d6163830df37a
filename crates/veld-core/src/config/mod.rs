//! Runtime configuration for remote endpoints
//!
//! Resolved from the environment by clients; a config with no endpoints
//! means the app runs local-only until one is provided.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::remote::{DocumentApiClient, FallbackRemoteStore, RemoteStore, RestApiClient};
use crate::util::normalize_text_option;

pub const ENV_API_URL: &str = "VELD_API_URL";
pub const ENV_DOCUMENTS_URL: &str = "VELD_DOCUMENTS_URL";
pub const ENV_API_TOKEN: &str = "VELD_API_TOKEN";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "VELD_HTTP_TIMEOUT_SECS";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Where the authoritative store lives and how to reach it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteConfig {
    /// REST service base URL (preferred transport)
    pub api_base_url: Option<String>,
    /// Document API base URL (fallback transport)
    pub documents_base_url: Option<String>,
    /// Bearer token attached to every request
    pub auth_token: Option<String>,
    /// Per-request deadline; defaults to 30 seconds
    pub http_timeout: Option<Duration>,
}

impl RemoteConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            api_base_url: normalize_text_option(env::var(ENV_API_URL).ok()),
            documents_base_url: normalize_text_option(env::var(ENV_DOCUMENTS_URL).ok()),
            auth_token: normalize_text_option(env::var(ENV_API_TOKEN).ok()),
            http_timeout: env::var(ENV_HTTP_TIMEOUT_SECS)
                .ok()
                .and_then(|raw| raw.trim().parse().ok())
                .map(Duration::from_secs),
        }
    }

    /// Whether any remote endpoint is configured.
    pub const fn is_configured(&self) -> bool {
        self.api_base_url.is_some() || self.documents_base_url.is_some()
    }

    /// Per-request deadline with the default applied.
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Build the remote store this config describes: REST preferred with
    /// document-API fallback when both endpoints are present.
    pub fn build_store(&self) -> Result<Arc<dyn RemoteStore>> {
        let timeout = self.http_timeout();
        match (&self.api_base_url, &self.documents_base_url) {
            (Some(api), Some(documents)) => {
                let rest = RestApiClient::new(api.as_str(), self.auth_token.clone(), timeout)?;
                let docs =
                    DocumentApiClient::new(documents.as_str(), self.auth_token.clone(), timeout)?;
                Ok(Arc::new(FallbackRemoteStore::new(rest, docs)))
            }
            (Some(api), None) => Ok(Arc::new(RestApiClient::new(
                api.as_str(),
                self.auth_token.clone(),
                timeout,
            )?)),
            (None, Some(documents)) => Ok(Arc::new(DocumentApiClient::new(
                documents.as_str(),
                self.auth_token.clone(),
                timeout,
            )?)),
            (None, None) => Err(Error::InvalidInput(
                "no remote endpoints configured".to_string(),
            )),
        }
    }

    /// REST client alone, for the server-side quote-calculation endpoint.
    pub fn build_rest_client(&self) -> Result<Option<RestApiClient>> {
        self.api_base_url
            .as_ref()
            .map(|api| {
                RestApiClient::new(api.as_str(), self.auth_token.clone(), self.http_timeout())
                    .map_err(Error::from)
            })
            .transpose()
    }
}
