//! Repository facade
//!
//! The single entry point the rest of the app calls. Writes go to the remote
//! store first and degrade to the local cache on network failure; reads
//! prefer the remote and fall back to cache. The facade owns the sync engine
//! and exposes the explicit `trigger_sync` entry point the network observer
//! invokes.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::db::{Database, LeadStore, LibSqlLeadStore, LibSqlQuoteStore, QuoteStore};
use crate::error::{Error, Result};
use crate::models::{Lead, LeadId, Quote, QuoteId};
use crate::net::SyncTrigger;
use crate::remote::RemoteStore;
use crate::session::Session;
use crate::sync::{SyncEngine, SyncOutcome};

/// Dirty-row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub dirty_quotes: usize,
    pub dirty_leads: usize,
}

impl SyncStatus {
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.dirty_quotes == 0 && self.dirty_leads == 0
    }
}

/// Facade over the local store, remote store, and sync engine.
///
/// Constructed once at process start with explicit handles; no hidden
/// globals. Every operation is scoped to the session's owner.
pub struct SalesRepository {
    db: Arc<Mutex<Database>>,
    remote: Arc<dyn RemoteStore>,
    engine: SyncEngine,
    session: Session,
}

impl SalesRepository {
    pub fn new(db: Arc<Mutex<Database>>, remote: Arc<dyn RemoteStore>, session: Session) -> Self {
        let engine = SyncEngine::new(Arc::clone(&db), Arc::clone(&remote), session.user_id());
        Self {
            db,
            remote,
            engine,
            session,
        }
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Save a quote: remote-first, durable locally either way.
    ///
    /// A network failure is not an error to the caller; the quote lands in
    /// the local cache dirty and the next sync pass pushes it. Auth and
    /// validation failures surface immediately.
    pub async fn save_quote(&self, mut quote: Quote) -> Result<Quote> {
        quote.user_id = self.session.user_id().to_string();
        let previous_id = quote.id;

        let push = if quote.remote_confirmed {
            self.remote.update_quote(&quote).await.map(|()| quote.id)
        } else {
            self.remote.create_quote(&quote).await
        };

        match push {
            Ok(remote_id) => {
                quote.id = remote_id;
                quote.synced = true;
                quote.remote_confirmed = true;
            }
            Err(error) if error.is_network() => {
                tracing::warn!("Remote quote write failed ({error}); saved locally for later sync");
                quote.synced = false;
            }
            Err(error) => return Err(error.into()),
        }

        let db = self.db.lock().await;
        let store = LibSqlQuoteStore::new(db.connection());
        store.upsert(&quote).await?;
        // Adopting a remote-assigned id must not strand the row cached
        // under the local one
        if quote.id != previous_id {
            match store.delete(&previous_id).await {
                Ok(()) | Err(Error::NotFound(_)) => {}
                Err(error) => return Err(error),
            }
        }
        Ok(quote)
    }

    /// List the owner's quotes, remote-preferred with cache fallback.
    ///
    /// Remote rows are re-cached on the way through, so the local store
    /// converges toward the authoritative state whenever we are online.
    pub async fn list_quotes(&self) -> Result<Vec<Quote>> {
        match self.remote.list_quotes(self.session.user_id()).await {
            Ok(quotes) => self.cache_quotes(&quotes).await?,
            Err(error) if error.is_network() => {
                tracing::debug!("Remote list unavailable ({error}); serving quotes from cache");
            }
            Err(error) => return Err(error.into()),
        }

        let db = self.db.lock().await;
        LibSqlQuoteStore::new(db.connection())
            .list(self.session.user_id())
            .await
    }

    /// Fetch one quote, remote-preferred with cache fallback.
    pub async fn get_quote(&self, id: &QuoteId) -> Result<Option<Quote>> {
        match self.remote.get_quote(id, self.session.user_id()).await {
            Ok(Some(quote)) => self.cache_quotes(std::slice::from_ref(&quote)).await?,
            Ok(None) => {}
            Err(error) if error.is_network() => {
                tracing::debug!("Remote fetch unavailable ({error}); serving quote from cache");
            }
            Err(error) => return Err(error.into()),
        }

        let db = self.db.lock().await;
        LibSqlQuoteStore::new(db.connection()).get(id).await
    }

    /// Delete a quote: remote-first, tombstoned locally when offline.
    pub async fn delete_quote(&self, id: &QuoteId) -> Result<()> {
        match self.remote.delete_quote(id, self.session.user_id()).await {
            Ok(()) => {
                let db = self.db.lock().await;
                match LibSqlQuoteStore::new(db.connection()).delete(id).await {
                    Ok(()) | Err(Error::NotFound(_)) => Ok(()),
                    Err(error) => Err(error),
                }
            }
            Err(error) if error.is_network() => {
                tracing::warn!("Remote quote delete failed ({error}); tombstoned for later sync");
                let message = error.to_string();
                let db = self.db.lock().await;
                match LibSqlQuoteStore::new(db.connection()).mark_deleted(id).await {
                    // Nothing cached to tombstone: the delete cannot be
                    // deferred, so the network failure stands
                    Err(Error::NotFound(_)) => Err(Error::Network(message)),
                    other => other,
                }
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Save a lead: remote-first, durable locally either way.
    pub async fn save_lead(&self, mut lead: Lead) -> Result<Lead> {
        lead.user_id = self.session.user_id().to_string();
        let previous_id = lead.id;

        let push = if lead.remote_confirmed {
            self.remote.update_lead(&lead).await.map(|()| lead.id)
        } else {
            self.remote.create_lead(&lead).await
        };

        match push {
            Ok(remote_id) => {
                lead.id = remote_id;
                lead.synced = true;
                lead.remote_confirmed = true;
            }
            Err(error) if error.is_network() => {
                tracing::warn!("Remote lead write failed ({error}); saved locally for later sync");
                lead.synced = false;
            }
            Err(error) => return Err(error.into()),
        }

        let db = self.db.lock().await;
        let store = LibSqlLeadStore::new(db.connection());
        store.upsert(&lead).await?;
        if lead.id != previous_id {
            match store.delete(&previous_id).await {
                Ok(()) | Err(Error::NotFound(_)) => {}
                Err(error) => return Err(error),
            }
        }
        Ok(lead)
    }

    /// List the owner's leads, remote-preferred with cache fallback.
    pub async fn list_leads(&self) -> Result<Vec<Lead>> {
        match self.remote.list_leads(self.session.user_id()).await {
            Ok(leads) => self.cache_leads(&leads).await?,
            Err(error) if error.is_network() => {
                tracing::debug!("Remote list unavailable ({error}); serving leads from cache");
            }
            Err(error) => return Err(error.into()),
        }

        let db = self.db.lock().await;
        LibSqlLeadStore::new(db.connection())
            .list(self.session.user_id())
            .await
    }

    /// Fetch one lead, remote-preferred with cache fallback.
    pub async fn get_lead(&self, id: &LeadId) -> Result<Option<Lead>> {
        match self.remote.get_lead(id, self.session.user_id()).await {
            Ok(Some(lead)) => self.cache_leads(std::slice::from_ref(&lead)).await?,
            Ok(None) => {}
            Err(error) if error.is_network() => {
                tracing::debug!("Remote fetch unavailable ({error}); serving lead from cache");
            }
            Err(error) => return Err(error.into()),
        }

        let db = self.db.lock().await;
        LibSqlLeadStore::new(db.connection()).get(id).await
    }

    /// Delete a lead: remote-first, tombstoned locally when offline.
    pub async fn delete_lead(&self, id: &LeadId) -> Result<()> {
        match self.remote.delete_lead(id, self.session.user_id()).await {
            Ok(()) => {
                let db = self.db.lock().await;
                match LibSqlLeadStore::new(db.connection()).delete(id).await {
                    Ok(()) | Err(Error::NotFound(_)) => Ok(()),
                    Err(error) => Err(error),
                }
            }
            Err(error) if error.is_network() => {
                tracing::warn!("Remote lead delete failed ({error}); tombstoned for later sync");
                let message = error.to_string();
                let db = self.db.lock().await;
                match LibSqlLeadStore::new(db.connection()).mark_deleted(id).await {
                    Err(Error::NotFound(_)) => Err(Error::Network(message)),
                    other => other,
                }
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Run one sync pass now, unless one is already in flight.
    ///
    /// This is the entry point the network observer calls; the facade owns
    /// the engine but never starts passes on its own.
    pub async fn trigger_sync(&self) -> Result<SyncOutcome> {
        self.engine.run_pass().await
    }

    /// Dirty-row counts, for status surfaces.
    pub async fn status(&self) -> Result<SyncStatus> {
        let db = self.db.lock().await;
        let dirty_quotes = LibSqlQuoteStore::new(db.connection())
            .list_unsynced(self.session.user_id())
            .await?
            .len();
        let dirty_leads = LibSqlLeadStore::new(db.connection())
            .list_unsynced(self.session.user_id())
            .await?
            .len();
        Ok(SyncStatus {
            dirty_quotes,
            dirty_leads,
        })
    }

    async fn cache_quotes(&self, quotes: &[Quote]) -> Result<()> {
        let db = self.db.lock().await;
        let store = LibSqlQuoteStore::new(db.connection());

        // Last-write-wins for clean rows; rows awaiting push (including
        // tombstones) are never clobbered by a remote refresh
        let dirty: HashSet<String> = store
            .list_unsynced(self.session.user_id())
            .await?
            .iter()
            .map(|quote| quote.id.as_str())
            .collect();

        for quote in quotes {
            if dirty.contains(&quote.id.as_str()) {
                continue;
            }
            store.upsert(quote).await?;
        }
        Ok(())
    }

    async fn cache_leads(&self, leads: &[Lead]) -> Result<()> {
        let db = self.db.lock().await;
        let store = LibSqlLeadStore::new(db.connection());

        let dirty: HashSet<String> = store
            .list_unsynced(self.session.user_id())
            .await?
            .iter()
            .map(|lead| lead.id.as_str())
            .collect();

        for lead in leads {
            if dirty.contains(&lead.id.as_str()) {
                continue;
            }
            store.upsert(lead).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SyncTrigger for SalesRepository {
    async fn trigger_sync(&self) -> Result<SyncOutcome> {
        self.engine.run_pass().await
    }
}
