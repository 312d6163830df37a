//! Quote store implementation

use crate::error::{Error, Result};
use crate::models::{Quote, QuoteId};
use libsql::{params, Connection};

const QUOTE_COLUMNS: &str = "id, reference, client_name, address, usage_kwh, bill_rands, tariff, \
     panel_watt, latitude, longitude, irradiance, sun_hours, system_kwp, estimated_generation, \
     monthly_savings, payback_months, company_name, company_phone, company_email, \
     consultant_name, consultant_phone, consultant_email, user_id, created_at, updated_at, \
     synced, deleted, remote_confirmed";

/// Trait for quote storage operations (async)
#[allow(async_fn_in_trait)]
pub trait QuoteStore {
    /// Atomic insert-or-replace keyed by id
    async fn upsert(&self, quote: &Quote) -> Result<()>;

    /// Get a quote by ID (tombstones excluded)
    async fn get(&self, id: &QuoteId) -> Result<Option<Quote>>;

    /// List an owner's quotes, newest id first (tombstones excluded)
    async fn list(&self, user_id: &str) -> Result<Vec<Quote>>;

    /// List an owner's rows with `synced = false`, tombstones included
    async fn list_unsynced(&self, user_id: &str) -> Result<Vec<Quote>>;

    /// Targeted single-column update of the synced flag
    async fn set_synced(&self, id: &QuoteId, synced: bool) -> Result<()>;

    /// Mark a row synced only if its content is unchanged since it was read.
    ///
    /// Returns false when the row was edited (or tombstoned) in the meantime,
    /// leaving it dirty for the next pass.
    async fn confirm_synced(&self, id: &QuoteId, updated_at: i64) -> Result<bool>;

    /// Rewrite a row in place under a remote-assigned id
    async fn rekey(&self, old_id: &QuoteId, new_id: &QuoteId) -> Result<()>;

    /// Tombstone a row: `deleted = true`, `synced = false`
    async fn mark_deleted(&self, id: &QuoteId) -> Result<()>;

    /// Physically remove a row; no tombstone recorded
    async fn delete(&self, id: &QuoteId) -> Result<()>;
}

/// libSQL implementation of `QuoteStore`
pub struct LibSqlQuoteStore<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlQuoteStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_quote(row: &libsql::Row) -> Result<Quote> {
        let id: String = row.get(0)?;
        Ok(Quote {
            id: id
                .parse()
                .map_err(|_| Error::InvalidInput(format!("Invalid quote id: {id}")))?,
            reference: row.get(1)?,
            client_name: row.get(2)?,
            address: row.get(3)?,
            usage_kwh: row.get(4)?,
            bill_rands: row.get(5)?,
            tariff: row.get(6)?,
            panel_watt: row.get(7)?,
            latitude: row.get(8)?,
            longitude: row.get(9)?,
            irradiance: row.get(10)?,
            sun_hours: row.get(11)?,
            system_kwp: row.get(12)?,
            estimated_generation: row.get(13)?,
            monthly_savings: row.get(14)?,
            payback_months: row.get(15)?,
            company_name: row.get(16)?,
            company_phone: row.get(17)?,
            company_email: row.get(18)?,
            consultant_name: row.get(19)?,
            consultant_phone: row.get(20)?,
            consultant_email: row.get(21)?,
            user_id: row.get(22)?,
            created_at: row.get(23)?,
            updated_at: row.get(24)?,
            synced: row.get::<i32>(25)? != 0,
            deleted: row.get::<i32>(26)? != 0,
            remote_confirmed: row.get::<i32>(27)? != 0,
        })
    }

    async fn collect(&self, sql: &str, user_id: &str) -> Result<Vec<Quote>> {
        let mut rows = self.conn.query(sql, params![user_id]).await?;
        let mut quotes = Vec::new();
        while let Some(row) = rows.next().await? {
            quotes.push(Self::parse_quote(&row)?);
        }
        Ok(quotes)
    }
}

impl QuoteStore for LibSqlQuoteStore<'_> {
    async fn upsert(&self, quote: &Quote) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO quotes ({QUOTE_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        self.conn
            .execute(
                &sql,
                params![
                    quote.id.as_str(),
                    quote.reference.as_str(),
                    quote.client_name.as_str(),
                    quote.address.as_str(),
                    quote.usage_kwh,
                    quote.bill_rands,
                    quote.tariff,
                    quote.panel_watt,
                    quote.latitude,
                    quote.longitude,
                    quote.irradiance,
                    quote.sun_hours,
                    quote.system_kwp,
                    quote.estimated_generation,
                    quote.monthly_savings,
                    quote.payback_months,
                    quote.company_name.as_str(),
                    quote.company_phone.as_str(),
                    quote.company_email.as_str(),
                    quote.consultant_name.as_str(),
                    quote.consultant_phone.as_str(),
                    quote.consultant_email.as_str(),
                    quote.user_id.as_str(),
                    quote.created_at,
                    quote.updated_at,
                    i32::from(quote.synced),
                    i32::from(quote.deleted),
                    i32::from(quote.remote_confirmed)
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &QuoteId) -> Result<Option<Quote>> {
        let sql = format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ? AND deleted = 0");
        let mut rows = self.conn.query(&sql, params![id.as_str()]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_quote(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Quote>> {
        let sql = format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes
             WHERE user_id = ? AND deleted = 0
             ORDER BY id DESC"
        );
        self.collect(&sql, user_id).await
    }

    async fn list_unsynced(&self, user_id: &str) -> Result<Vec<Quote>> {
        let sql = format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes
             WHERE user_id = ? AND synced = 0
             ORDER BY id ASC"
        );
        self.collect(&sql, user_id).await
    }

    async fn set_synced(&self, id: &QuoteId, synced: bool) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE quotes SET synced = ? WHERE id = ?",
                params![i32::from(synced), id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn confirm_synced(&self, id: &QuoteId, updated_at: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE quotes SET synced = 1, remote_confirmed = 1
                 WHERE id = ? AND updated_at = ? AND deleted = 0",
                params![id.as_str(), updated_at],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn rekey(&self, old_id: &QuoteId, new_id: &QuoteId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE quotes SET id = ?, remote_confirmed = 1 WHERE id = ?",
                params![new_id.as_str(), old_id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(old_id.to_string()));
        }
        Ok(())
    }

    async fn mark_deleted(&self, id: &QuoteId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE quotes SET deleted = 1, synced = 0, updated_at = ? WHERE id = ?",
                params![chrono::Utc::now().timestamp_millis(), id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &QuoteId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM quotes WHERE id = ?", params![id.as_str()])
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn sample_quote(reference: &str, user_id: &str) -> Quote {
        let mut quote = Quote::new(reference, "A. Botha", user_id);
        quote.address = "12 Protea Rd, Stellenbosch".to_string();
        quote.usage_kwh = Some(640.0);
        quote.tariff = 2.85;
        quote.panel_watt = 455;
        quote.latitude = Some(-33.93);
        quote.longitude = Some(18.86);
        quote.system_kwp = 5.46;
        quote.estimated_generation = 820.0;
        quote.monthly_savings = 2337.0;
        quote.payback_months = 38.0;
        quote.company_name = "Helios Energy".to_string();
        quote.consultant_name = "N. Petersen".to_string();
        quote
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_and_get_round_trip() {
        let db = setup().await;
        let store = LibSqlQuoteStore::new(db.connection());

        let quote = sample_quote("QUOTE-1", "agent-1");
        store.upsert(&quote).await.unwrap();

        let fetched = store.get(&quote.id).await.unwrap().unwrap();
        assert_eq!(fetched, quote);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_replaces_existing_row() {
        let db = setup().await;
        let store = LibSqlQuoteStore::new(db.connection());

        let mut quote = sample_quote("QUOTE-1", "agent-1");
        store.upsert(&quote).await.unwrap();

        quote.client_name = "B. Naidoo".to_string();
        quote.touch();
        store.upsert(&quote).await.unwrap();

        let all = store.list("agent-1").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].client_name, "B. Naidoo");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_is_owner_scoped_and_newest_first() {
        let db = setup().await;
        let store = LibSqlQuoteStore::new(db.connection());

        let first = sample_quote("QUOTE-1", "agent-1");
        let second = sample_quote("QUOTE-2", "agent-1");
        let other = sample_quote("QUOTE-3", "agent-2");
        store.upsert(&first).await.unwrap();
        store.upsert(&second).await.unwrap();
        store.upsert(&other).await.unwrap();

        let quotes = store.list("agent-1").await.unwrap();
        assert_eq!(quotes.len(), 2);
        // UUID v7 ids are time-sortable, so id descending is newest first
        assert_eq!(quotes[0].reference, "QUOTE-2");
        assert_eq!(quotes[1].reference, "QUOTE-1");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_unsynced_filters_clean_rows() {
        let db = setup().await;
        let store = LibSqlQuoteStore::new(db.connection());

        let dirty = sample_quote("QUOTE-1", "agent-1");
        let mut clean = sample_quote("QUOTE-2", "agent-1");
        clean.synced = true;
        store.upsert(&dirty).await.unwrap();
        store.upsert(&clean).await.unwrap();

        let unsynced = store.list_unsynced("agent-1").await.unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].reference, "QUOTE-1");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_synced_missing_row_is_not_found() {
        let db = setup().await;
        let store = LibSqlQuoteStore::new(db.connection());

        let error = store.set_synced(&QuoteId::new(), true).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_confirm_synced_skips_rows_edited_since_read() {
        let db = setup().await;
        let store = LibSqlQuoteStore::new(db.connection());

        let quote = sample_quote("QUOTE-1", "agent-1");
        store.upsert(&quote).await.unwrap();

        // Stale updated_at: the row changed after the sync engine read it
        let confirmed = store
            .confirm_synced(&quote.id, quote.updated_at - 1)
            .await
            .unwrap();
        assert!(!confirmed);
        assert!(!store.get(&quote.id).await.unwrap().unwrap().synced);

        let confirmed = store
            .confirm_synced(&quote.id, quote.updated_at)
            .await
            .unwrap();
        assert!(confirmed);
        let fetched = store.get(&quote.id).await.unwrap().unwrap();
        assert!(fetched.synced);
        assert!(fetched.remote_confirmed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rekey_preserves_content() {
        let db = setup().await;
        let store = LibSqlQuoteStore::new(db.connection());

        let quote = sample_quote("QUOTE-1", "agent-1");
        store.upsert(&quote).await.unwrap();

        let remote_id = QuoteId::new();
        store.rekey(&quote.id, &remote_id).await.unwrap();

        assert!(store.get(&quote.id).await.unwrap().is_none());
        let rekeyed = store.get(&remote_id).await.unwrap().unwrap();
        assert_eq!(rekeyed.reference, "QUOTE-1");
        assert!(rekeyed.remote_confirmed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_deleted_tombstones_row() {
        let db = setup().await;
        let store = LibSqlQuoteStore::new(db.connection());

        let mut quote = sample_quote("QUOTE-1", "agent-1");
        quote.synced = true;
        store.upsert(&quote).await.unwrap();
        store.mark_deleted(&quote.id).await.unwrap();

        // Hidden from reads, visible to the sync engine
        assert!(store.get(&quote.id).await.unwrap().is_none());
        assert!(store.list("agent-1").await.unwrap().is_empty());

        let unsynced = store.list_unsynced("agent-1").await.unwrap();
        assert_eq!(unsynced.len(), 1);
        assert!(unsynced[0].deleted);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_removes_row() {
        let db = setup().await;
        let store = LibSqlQuoteStore::new(db.connection());

        let quote = sample_quote("QUOTE-1", "agent-1");
        store.upsert(&quote).await.unwrap();
        store.delete(&quote.id).await.unwrap();

        assert!(store.get(&quote.id).await.unwrap().is_none());
        assert!(store.list_unsynced("agent-1").await.unwrap().is_empty());
    }
}
