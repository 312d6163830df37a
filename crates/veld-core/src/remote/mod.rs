//! Remote store abstraction
//!
//! The authoritative cloud store is reachable over two transports: a REST
//! service layer and a document API. Both implement [`RemoteStore`]; the
//! [`FallbackRemoteStore`] combinator prefers REST and falls back to the
//! document API for network-class failures. Every operation returns an
//! explicit outcome; nothing panics across this boundary.

mod documents;
mod dto;
mod fallback;
mod rest;

pub use documents::DocumentApiClient;
pub use dto::{LeadDto, QuoteCalculation, QuoteCalculationRequest, QuoteDto};
pub use fallback::FallbackRemoteStore;
pub use rest::RestApiClient;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Lead, LeadId, Quote, QuoteId};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Failures crossing the remote boundary
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("No active owner identity")]
    AuthRequired,
    #[error("Access denied for the requested record")]
    AccessDenied,
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Remote unreachable: {0}")]
    Network(String),
    #[error("Remote API error: {0}")]
    Api(String),
    #[error("Invalid remote payload: {0}")]
    Decode(String),
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
}

impl RemoteError {
    /// Network-class failures degrade to "saved locally, will sync later";
    /// everything else surfaces immediately.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Owner-scoped operations the sync engine and repository facade need.
///
/// The caller attaches `user_id` before calling; the server enforces it.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn create_quote(&self, quote: &Quote) -> RemoteResult<QuoteId>;
    async fn update_quote(&self, quote: &Quote) -> RemoteResult<()>;
    async fn get_quote(&self, id: &QuoteId, user_id: &str) -> RemoteResult<Option<Quote>>;
    async fn list_quotes(&self, user_id: &str) -> RemoteResult<Vec<Quote>>;
    async fn delete_quote(&self, id: &QuoteId, user_id: &str) -> RemoteResult<()>;

    async fn create_lead(&self, lead: &Lead) -> RemoteResult<LeadId>;
    async fn update_lead(&self, lead: &Lead) -> RemoteResult<()>;
    async fn get_lead(&self, id: &LeadId, user_id: &str) -> RemoteResult<Option<Lead>>;
    async fn list_leads(&self, user_id: &str) -> RemoteResult<Vec<Lead>>;
    async fn delete_lead(&self, id: &LeadId, user_id: &str) -> RemoteResult<()>;
}

/// Map a transport failure (connect, timeout, body) to `Network`.
pub(crate) fn transport_error(error: &reqwest::Error) -> RemoteError {
    RemoteError::Network(error.to_string())
}

/// Map a non-success HTTP status to the error taxonomy.
pub(crate) fn status_error(status: StatusCode, body: &str, id: Option<&str>) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED => RemoteError::AuthRequired,
        StatusCode::FORBIDDEN => RemoteError::AccessDenied,
        StatusCode::NOT_FOUND => RemoteError::NotFound(id.unwrap_or("unknown").to_string()),
        _ => RemoteError::Api(parse_api_error(status, body)),
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

/// Validate and normalize an API base URL.
pub(crate) fn normalize_base_url(raw: &str) -> RemoteResult<String> {
    let url = normalize_text_option(Some(raw.to_string())).ok_or_else(|| {
        RemoteError::InvalidConfiguration("base URL must not be empty".to_string())
    })?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory remote store double with failure injection.

    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Records every write and serves reads from in-memory tables.
    #[derive(Default)]
    pub struct RecordingRemoteStore {
        pub quotes: Mutex<HashMap<String, Quote>>,
        pub leads: Mutex<HashMap<String, Lead>>,
        offline: AtomicBool,
        reject_ids: Mutex<HashSet<String>>,
        mint_quote_ids: AtomicBool,
        write_calls: AtomicUsize,
        delay: Mutex<Option<Duration>>,
    }

    impl RecordingRemoteStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail every operation with a network error.
        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        /// Reject writes for one id with an API error.
        pub fn reject_id(&self, id: &str) {
            self.reject_ids.lock().unwrap().insert(id.to_string());
        }

        /// Mint fresh server-side ids on quote create.
        pub fn mint_quote_ids(&self) {
            self.mint_quote_ids.store(true, Ordering::SeqCst);
        }

        /// Hold every call for the given duration (single-flight tests).
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = Some(delay);
        }

        /// Number of remote mutations attempted past the failure gates.
        pub fn write_count(&self) -> usize {
            self.write_calls.load(Ordering::SeqCst)
        }

        pub fn quote_by_reference(&self, reference: &str) -> Option<Quote> {
            self.quotes
                .lock()
                .unwrap()
                .values()
                .find(|quote| quote.reference == reference)
                .cloned()
        }

        async fn pause(&self) {
            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }

        fn gate(&self, id: &str) -> RemoteResult<()> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(RemoteError::Network("remote unreachable".to_string()));
            }
            if self.reject_ids.lock().unwrap().contains(id) {
                return Err(RemoteError::Api(format!("record {id} rejected (422)")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteStore for RecordingRemoteStore {
        async fn create_quote(&self, quote: &Quote) -> RemoteResult<QuoteId> {
            self.pause().await;
            self.gate(&quote.id.as_str())?;
            self.write_calls.fetch_add(1, Ordering::SeqCst);

            let id = if self.mint_quote_ids.load(Ordering::SeqCst) {
                QuoteId::new()
            } else {
                quote.id
            };
            let mut stored = quote.clone();
            stored.id = id;
            self.quotes.lock().unwrap().insert(id.as_str(), stored);
            Ok(id)
        }

        async fn update_quote(&self, quote: &Quote) -> RemoteResult<()> {
            self.pause().await;
            self.gate(&quote.id.as_str())?;
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            self.quotes
                .lock()
                .unwrap()
                .insert(quote.id.as_str(), quote.clone());
            Ok(())
        }

        async fn get_quote(&self, id: &QuoteId, user_id: &str) -> RemoteResult<Option<Quote>> {
            self.pause().await;
            self.gate(&id.as_str())?;
            Ok(self
                .quotes
                .lock()
                .unwrap()
                .get(&id.as_str())
                .filter(|quote| quote.user_id == user_id)
                .cloned())
        }

        async fn list_quotes(&self, user_id: &str) -> RemoteResult<Vec<Quote>> {
            self.pause().await;
            self.gate("")?;
            let mut quotes: Vec<Quote> = self
                .quotes
                .lock()
                .unwrap()
                .values()
                .filter(|quote| quote.user_id == user_id)
                .cloned()
                .collect();
            quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(quotes)
        }

        async fn delete_quote(&self, id: &QuoteId, _user_id: &str) -> RemoteResult<()> {
            self.pause().await;
            self.gate(&id.as_str())?;
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            self.quotes.lock().unwrap().remove(&id.as_str());
            Ok(())
        }

        async fn create_lead(&self, lead: &Lead) -> RemoteResult<LeadId> {
            self.pause().await;
            self.gate(&lead.id.as_str())?;
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            self.leads
                .lock()
                .unwrap()
                .insert(lead.id.as_str(), lead.clone());
            Ok(lead.id)
        }

        async fn update_lead(&self, lead: &Lead) -> RemoteResult<()> {
            self.pause().await;
            self.gate(&lead.id.as_str())?;
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            self.leads
                .lock()
                .unwrap()
                .insert(lead.id.as_str(), lead.clone());
            Ok(())
        }

        async fn get_lead(&self, id: &LeadId, user_id: &str) -> RemoteResult<Option<Lead>> {
            self.pause().await;
            self.gate(&id.as_str())?;
            Ok(self
                .leads
                .lock()
                .unwrap()
                .get(&id.as_str())
                .filter(|lead| lead.user_id == user_id)
                .cloned())
        }

        async fn list_leads(&self, user_id: &str) -> RemoteResult<Vec<Lead>> {
            self.pause().await;
            self.gate("")?;
            let mut leads: Vec<Lead> = self
                .leads
                .lock()
                .unwrap()
                .values()
                .filter(|lead| lead.user_id == user_id)
                .cloned()
                .collect();
            leads.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(leads)
        }

        async fn delete_lead(&self, id: &LeadId, _user_id: &str) -> RemoteResult<()> {
            self.pause().await;
            self.gate(&id.as_str())?;
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            self.leads.lock().unwrap().remove(&id.as_str());
            Ok(())
        }
    }
}
