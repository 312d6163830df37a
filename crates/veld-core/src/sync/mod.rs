//! Sync engine
//!
//! Drains dirty local rows into the remote store. One pass pushes every
//! currently-unsynced quote, then every unsynced lead; a single-flight gate
//! keeps passes from overlapping, and a failing record never aborts the rest
//! of the pass.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::{Database, LeadStore, LibSqlLeadStore, LibSqlQuoteStore, QuoteStore};
use crate::error::Result;
use crate::models::{Lead, Quote};
use crate::remote::RemoteStore;

/// Counts for one completed pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub pushed_quotes: usize,
    pub pushed_leads: usize,
    pub deleted: usize,
    pub failed: usize,
    pub duration_ms: i64,
}

/// Result of a sync trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The pass ran to completion
    Completed(SyncReport),
    /// Another pass was already in flight; the trigger was a no-op
    Skipped,
}

impl SyncOutcome {
    #[must_use]
    pub const fn did_run(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

enum PushKind {
    Upserted,
    Deleted,
}

/// Pushes unsynced local rows to the remote store and marks them synced.
///
/// Constructed once with explicit handles; does not start anything on its
/// own. Triggers arrive through [`SyncEngine::run_pass`].
pub struct SyncEngine {
    db: Arc<Mutex<Database>>,
    remote: Arc<dyn RemoteStore>,
    user_id: String,
    gate: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        db: Arc<Mutex<Database>>,
        remote: Arc<dyn RemoteStore>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            db,
            remote,
            user_id: user_id.into(),
            gate: Mutex::new(()),
        }
    }

    /// Run one sync pass, unless one is already in flight.
    ///
    /// Per row: tombstones replay as remote deletes, remote-confirmed rows
    /// update, everything else creates (adopting the returned id when the
    /// remote assigns its own). Rows are only marked synced while their
    /// content is unchanged since it was read, so an edit racing the push
    /// stays dirty for the next pass. There is no retry inside a pass; the
    /// next trigger re-attempts whatever is still dirty.
    pub async fn run_pass(&self) -> Result<SyncOutcome> {
        let Ok(_guard) = self.gate.try_lock() else {
            tracing::debug!("Sync pass already in flight; trigger ignored");
            return Ok(SyncOutcome::Skipped);
        };

        let started = Instant::now();
        let mut report = SyncReport::default();

        // Fixed order: quotes first, then leads
        let quotes = {
            let db = self.db.lock().await;
            LibSqlQuoteStore::new(db.connection())
                .list_unsynced(&self.user_id)
                .await?
        };
        for quote in &quotes {
            match self.push_quote(quote).await {
                Ok(PushKind::Upserted) => report.pushed_quotes += 1,
                Ok(PushKind::Deleted) => report.deleted += 1,
                Err(error) => {
                    report.failed += 1;
                    tracing::warn!("Failed to push quote {}: {error}", quote.id);
                }
            }
        }

        let leads = {
            let db = self.db.lock().await;
            LibSqlLeadStore::new(db.connection())
                .list_unsynced(&self.user_id)
                .await?
        };
        for lead in &leads {
            match self.push_lead(lead).await {
                Ok(PushKind::Upserted) => report.pushed_leads += 1,
                Ok(PushKind::Deleted) => report.deleted += 1,
                Err(error) => {
                    report.failed += 1;
                    tracing::warn!("Failed to push lead {}: {error}", lead.id);
                }
            }
        }

        report.duration_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
        tracing::info!(
            "Sync pass complete: {} quotes and {} leads pushed, {} deletes, {} failures in {} ms",
            report.pushed_quotes,
            report.pushed_leads,
            report.deleted,
            report.failed,
            report.duration_ms
        );
        Ok(SyncOutcome::Completed(report))
    }

    async fn push_quote(&self, quote: &Quote) -> Result<PushKind> {
        if quote.deleted {
            self.remote.delete_quote(&quote.id, &self.user_id).await?;
            let db = self.db.lock().await;
            LibSqlQuoteStore::new(db.connection()).delete(&quote.id).await?;
            return Ok(PushKind::Deleted);
        }

        let pushed_id = if quote.remote_confirmed {
            self.remote.update_quote(quote).await?;
            quote.id
        } else {
            let remote_id = self.remote.create_quote(quote).await?;
            if remote_id != quote.id {
                let db = self.db.lock().await;
                LibSqlQuoteStore::new(db.connection())
                    .rekey(&quote.id, &remote_id)
                    .await?;
            }
            remote_id
        };

        let db = self.db.lock().await;
        let confirmed = LibSqlQuoteStore::new(db.connection())
            .confirm_synced(&pushed_id, quote.updated_at)
            .await?;
        if !confirmed {
            tracing::debug!("Quote {pushed_id} changed during push; left dirty for the next pass");
        }
        Ok(PushKind::Upserted)
    }

    async fn push_lead(&self, lead: &Lead) -> Result<PushKind> {
        if lead.deleted {
            self.remote.delete_lead(&lead.id, &self.user_id).await?;
            let db = self.db.lock().await;
            LibSqlLeadStore::new(db.connection()).delete(&lead.id).await?;
            return Ok(PushKind::Deleted);
        }

        let pushed_id = if lead.remote_confirmed {
            self.remote.update_lead(lead).await?;
            lead.id
        } else {
            let remote_id = self.remote.create_lead(lead).await?;
            if remote_id != lead.id {
                let db = self.db.lock().await;
                LibSqlLeadStore::new(db.connection())
                    .rekey(&lead.id, &remote_id)
                    .await?;
            }
            remote_id
        };

        let db = self.db.lock().await;
        let confirmed = LibSqlLeadStore::new(db.connection())
            .confirm_synced(&pushed_id, lead.updated_at)
            .await?;
        if !confirmed {
            tracing::debug!("Lead {pushed_id} changed during push; left dirty for the next pass");
        }
        Ok(PushKind::Upserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::testing::RecordingRemoteStore;
    use std::time::Duration;

    async fn setup() -> (Arc<Mutex<Database>>, Arc<RecordingRemoteStore>, SyncEngine) {
        let db = Arc::new(Mutex::new(Database::open_in_memory().await.unwrap()));
        let remote = Arc::new(RecordingRemoteStore::new());
        let engine = SyncEngine::new(
            Arc::clone(&db),
            Arc::clone(&remote) as Arc<dyn RemoteStore>,
            "agent-1",
        );
        (db, remote, engine)
    }

    async fn insert_quote(db: &Arc<Mutex<Database>>, reference: &str) -> Quote {
        let quote = Quote::new(reference, "A. Botha", "agent-1");
        let guard = db.lock().await;
        LibSqlQuoteStore::new(guard.connection())
            .upsert(&quote)
            .await
            .unwrap();
        quote
    }

    async fn insert_lead(db: &Arc<Mutex<Database>>, name: &str) -> Lead {
        let lead = Lead::new(name, "agent-1");
        let guard = db.lock().await;
        LibSqlLeadStore::new(guard.connection())
            .upsert(&lead)
            .await
            .unwrap();
        lead
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pass_marks_quote_synced_and_pushes_to_remote() {
        let (db, remote, engine) = setup().await;
        let quote = insert_quote(&db, "QUOTE-1").await;

        let outcome = engine.run_pass().await.unwrap();
        assert!(outcome.did_run());

        let guard = db.lock().await;
        let local = LibSqlQuoteStore::new(guard.connection())
            .get(&quote.id)
            .await
            .unwrap()
            .unwrap();
        assert!(local.synced);
        assert!(local.remote_confirmed);

        let pushed = remote.quote_by_reference("QUOTE-1").unwrap();
        assert_eq!(pushed.id, quote.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pass_drains_all_dirty_rows() {
        let (db, _remote, engine) = setup().await;
        for n in 1..=3 {
            insert_quote(&db, &format!("QUOTE-{n}")).await;
        }
        insert_lead(&db, "S. Dlamini").await;
        insert_lead(&db, "T. van Wyk").await;

        let outcome = engine.run_pass().await.unwrap();
        let SyncOutcome::Completed(report) = outcome else {
            panic!("expected a completed pass");
        };
        assert_eq!(report.pushed_quotes, 3);
        assert_eq!(report.pushed_leads, 2);
        assert_eq!(report.failed, 0);

        let guard = db.lock().await;
        assert!(LibSqlQuoteStore::new(guard.connection())
            .list_unsynced("agent-1")
            .await
            .unwrap()
            .is_empty());
        assert!(LibSqlLeadStore::new(guard.connection())
            .list_unsynced("agent-1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn one_rejected_row_does_not_abort_the_pass() {
        let (db, remote, engine) = setup().await;
        let mut quotes = Vec::new();
        for n in 1..=3 {
            quotes.push(insert_quote(&db, &format!("QUOTE-{n}")).await);
        }
        insert_lead(&db, "S. Dlamini").await;
        insert_lead(&db, "T. van Wyk").await;
        remote.reject_id(&quotes[1].id.as_str());

        let SyncOutcome::Completed(report) = engine.run_pass().await.unwrap() else {
            panic!("expected a completed pass");
        };
        assert_eq!(report.pushed_quotes, 2);
        assert_eq!(report.pushed_leads, 2);
        assert_eq!(report.failed, 1);

        let guard = db.lock().await;
        let still_dirty = LibSqlQuoteStore::new(guard.connection())
            .list_unsynced("agent-1")
            .await
            .unwrap();
        assert_eq!(still_dirty.len(), 1);
        assert_eq!(still_dirty[0].id, quotes[1].id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_pass_is_idempotent() {
        let (db, remote, engine) = setup().await;
        insert_quote(&db, "QUOTE-1").await;
        insert_lead(&db, "S. Dlamini").await;

        engine.run_pass().await.unwrap();
        let writes_after_first = remote.write_count();

        let SyncOutcome::Completed(report) = engine.run_pass().await.unwrap() else {
            panic!("expected a completed pass");
        };
        assert_eq!(report.pushed_quotes, 0);
        assert_eq!(report.pushed_leads, 0);
        assert_eq!(remote.write_count(), writes_after_first);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_triggers_run_exactly_one_pass() {
        let (db, remote, engine) = setup().await;
        insert_quote(&db, "QUOTE-1").await;
        remote.set_delay(Duration::from_millis(150));

        let (first, second) = tokio::join!(engine.run_pass(), engine.run_pass());
        let outcomes = [first.unwrap(), second.unwrap()];
        assert_eq!(outcomes.iter().filter(|o| o.did_run()).count(), 1);
        assert_eq!(remote.write_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_adopts_remote_assigned_id() {
        let (db, remote, engine) = setup().await;
        let quote = insert_quote(&db, "QUOTE-1").await;
        remote.mint_quote_ids();

        engine.run_pass().await.unwrap();

        let guard = db.lock().await;
        let store = LibSqlQuoteStore::new(guard.connection());
        assert!(store.get(&quote.id).await.unwrap().is_none());

        let adopted = remote.quote_by_reference("QUOTE-1").unwrap();
        let local = store.get(&adopted.id).await.unwrap().unwrap();
        assert!(local.synced);
        assert!(local.remote_confirmed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn confirmed_rows_update_instead_of_creating_again() {
        let (db, remote, engine) = setup().await;
        // mint_quote_ids would rewrite the id on a create; an update keeps it
        remote.mint_quote_ids();

        let mut quote = Quote::new("QUOTE-1", "A. Botha", "agent-1");
        quote.remote_confirmed = true;
        {
            let guard = db.lock().await;
            LibSqlQuoteStore::new(guard.connection())
                .upsert(&quote)
                .await
                .unwrap();
        }

        engine.run_pass().await.unwrap();

        let guard = db.lock().await;
        let local = LibSqlQuoteStore::new(guard.connection())
            .get(&quote.id)
            .await
            .unwrap()
            .unwrap();
        assert!(local.synced);
        assert!(remote.quotes.lock().unwrap().contains_key(&quote.id.as_str()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tombstones_replay_as_remote_deletes() {
        let (db, remote, engine) = setup().await;
        let quote = insert_quote(&db, "QUOTE-1").await;

        engine.run_pass().await.unwrap();
        assert!(remote.quote_by_reference("QUOTE-1").is_some());

        {
            let guard = db.lock().await;
            LibSqlQuoteStore::new(guard.connection())
                .mark_deleted(&quote.id)
                .await
                .unwrap();
        }

        let SyncOutcome::Completed(report) = engine.run_pass().await.unwrap() else {
            panic!("expected a completed pass");
        };
        assert_eq!(report.deleted, 1);
        assert!(remote.quote_by_reference("QUOTE-1").is_none());

        let guard = db.lock().await;
        assert!(LibSqlQuoteStore::new(guard.connection())
            .list_unsynced("agent-1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pass_with_nothing_dirty_reports_zero_work() {
        let (_db, remote, engine) = setup().await;

        let SyncOutcome::Completed(report) = engine.run_pass().await.unwrap() else {
            panic!("expected a completed pass");
        };
        assert_eq!(report.pushed_quotes, 0);
        assert_eq!(report.pushed_leads, 0);
        assert_eq!(report.deleted, 0);
        assert_eq!(remote.write_count(), 0);
    }
}
