//! Shared command helpers

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use veld_core::config::RemoteConfig;
use veld_core::db::Database;
use veld_core::models::{Lead, LeadId, Quote, QuoteId};
use veld_core::remote::{RemoteError, RemoteResult, RemoteStore, RestApiClient};
use veld_core::{SalesRepository, Session};

use crate::error::CliError;

pub const ENV_DB_PATH: &str = "VELD_DB_PATH";
pub const ENV_USER_ID: &str = "VELD_USER_ID";

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os(ENV_DB_PATH).map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("veld")
        .join("veld.db")
}

pub fn resolve_session() -> Result<Session, CliError> {
    let user_id = env::var(ENV_USER_ID).map_err(|_| CliError::MissingUser)?;
    Session::new(user_id).map_err(|_| CliError::MissingUser)
}

pub async fn open_database(path: &Path) -> Result<Database, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(path).await?)
}

/// Stand-in remote used when no endpoints are configured.
///
/// Every call fails as a network error, so writes stay durable in the local
/// cache and sync picks them up once a real remote is configured.
pub struct UnconfiguredRemote;

impl UnconfiguredRemote {
    fn unavailable<T>() -> RemoteResult<T> {
        Err(RemoteError::Network("remote API not configured".to_string()))
    }
}

#[async_trait]
impl RemoteStore for UnconfiguredRemote {
    async fn create_quote(&self, _quote: &Quote) -> RemoteResult<QuoteId> {
        Self::unavailable()
    }

    async fn update_quote(&self, _quote: &Quote) -> RemoteResult<()> {
        Self::unavailable()
    }

    async fn get_quote(&self, _id: &QuoteId, _user_id: &str) -> RemoteResult<Option<Quote>> {
        Self::unavailable()
    }

    async fn list_quotes(&self, _user_id: &str) -> RemoteResult<Vec<Quote>> {
        Self::unavailable()
    }

    async fn delete_quote(&self, _id: &QuoteId, _user_id: &str) -> RemoteResult<()> {
        Self::unavailable()
    }

    async fn create_lead(&self, _lead: &Lead) -> RemoteResult<LeadId> {
        Self::unavailable()
    }

    async fn update_lead(&self, _lead: &Lead) -> RemoteResult<()> {
        Self::unavailable()
    }

    async fn get_lead(&self, _id: &LeadId, _user_id: &str) -> RemoteResult<Option<Lead>> {
        Self::unavailable()
    }

    async fn list_leads(&self, _user_id: &str) -> RemoteResult<Vec<Lead>> {
        Self::unavailable()
    }

    async fn delete_lead(&self, _id: &LeadId, _user_id: &str) -> RemoteResult<()> {
        Self::unavailable()
    }
}

pub fn build_remote(config: &RemoteConfig) -> Result<Arc<dyn RemoteStore>, CliError> {
    if config.is_configured() {
        Ok(config.build_store()?)
    } else {
        tracing::info!("Running local-only (no remote endpoints configured)");
        Ok(Arc::new(UnconfiguredRemote))
    }
}

pub async fn build_repository(db_path: &Path) -> Result<SalesRepository, CliError> {
    let session = resolve_session()?;
    let config = RemoteConfig::from_env();
    let remote = build_remote(&config)?;
    let db = Arc::new(Mutex::new(open_database(db_path).await?));
    Ok(SalesRepository::new(db, remote, session))
}

pub fn build_rest_client() -> Result<Option<RestApiClient>, CliError> {
    Ok(RemoteConfig::from_env().build_rest_client()?)
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub const fn sync_marker(synced: bool) -> &'static str {
    if synced {
        "synced"
    } else {
        "pending"
    }
}
