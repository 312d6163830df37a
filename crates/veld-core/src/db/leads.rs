//! Lead store implementation

use crate::error::{Error, Result};
use crate::models::{Lead, LeadId, LeadStatus};
use libsql::{params, Connection};

const LEAD_COLUMNS: &str = "id, name, email, phone, status, notes, quote_id, user_id, \
     created_at, updated_at, synced, deleted, remote_confirmed";

/// Trait for lead storage operations (async)
#[allow(async_fn_in_trait)]
pub trait LeadStore {
    /// Atomic insert-or-replace keyed by id
    async fn upsert(&self, lead: &Lead) -> Result<()>;

    /// Get a lead by ID (tombstones excluded)
    async fn get(&self, id: &LeadId) -> Result<Option<Lead>>;

    /// List an owner's leads in insertion order (tombstones excluded)
    async fn list(&self, user_id: &str) -> Result<Vec<Lead>>;

    /// List an owner's rows with `synced = false`, tombstones included
    async fn list_unsynced(&self, user_id: &str) -> Result<Vec<Lead>>;

    /// Targeted single-column update of the synced flag
    async fn set_synced(&self, id: &LeadId, synced: bool) -> Result<()>;

    /// Mark a row synced only if its content is unchanged since it was read
    async fn confirm_synced(&self, id: &LeadId, updated_at: i64) -> Result<bool>;

    /// Rewrite a row in place under a remote-assigned id
    async fn rekey(&self, old_id: &LeadId, new_id: &LeadId) -> Result<()>;

    /// Tombstone a row: `deleted = true`, `synced = false`
    async fn mark_deleted(&self, id: &LeadId) -> Result<()>;

    /// Physically remove a row; no tombstone recorded
    async fn delete(&self, id: &LeadId) -> Result<()>;
}

/// libSQL implementation of `LeadStore`
pub struct LibSqlLeadStore<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlLeadStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_lead(row: &libsql::Row) -> Result<Lead> {
        let id: String = row.get(0)?;
        let status: String = row.get(4)?;
        let quote_id: Option<String> = row.get(6)?;

        Ok(Lead {
            id: id
                .parse()
                .map_err(|_| Error::InvalidInput(format!("Invalid lead id: {id}")))?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            status: LeadStatus::from_wire(&status),
            notes: row.get(5)?,
            quote_id: quote_id
                .map(|raw| {
                    raw.parse()
                        .map_err(|_| Error::InvalidInput(format!("Invalid quote id: {raw}")))
                })
                .transpose()?,
            user_id: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            synced: row.get::<i32>(10)? != 0,
            deleted: row.get::<i32>(11)? != 0,
            remote_confirmed: row.get::<i32>(12)? != 0,
        })
    }

    async fn collect(&self, sql: &str, user_id: &str) -> Result<Vec<Lead>> {
        let mut rows = self.conn.query(sql, params![user_id]).await?;
        let mut leads = Vec::new();
        while let Some(row) = rows.next().await? {
            leads.push(Self::parse_lead(&row)?);
        }
        Ok(leads)
    }
}

impl LeadStore for LibSqlLeadStore<'_> {
    async fn upsert(&self, lead: &Lead) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO leads ({LEAD_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        self.conn
            .execute(
                &sql,
                params![
                    lead.id.as_str(),
                    lead.name.as_str(),
                    lead.email.as_str(),
                    lead.phone.as_str(),
                    lead.status.as_str(),
                    lead.notes.clone(),
                    lead.quote_id.map(|id| id.as_str()),
                    lead.user_id.as_str(),
                    lead.created_at,
                    lead.updated_at,
                    i32::from(lead.synced),
                    i32::from(lead.deleted),
                    i32::from(lead.remote_confirmed)
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &LeadId) -> Result<Option<Lead>> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ? AND deleted = 0");
        let mut rows = self.conn.query(&sql, params![id.as_str()]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_lead(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Lead>> {
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads
             WHERE user_id = ? AND deleted = 0
             ORDER BY created_at ASC, id ASC"
        );
        self.collect(&sql, user_id).await
    }

    async fn list_unsynced(&self, user_id: &str) -> Result<Vec<Lead>> {
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads
             WHERE user_id = ? AND synced = 0
             ORDER BY id ASC"
        );
        self.collect(&sql, user_id).await
    }

    async fn set_synced(&self, id: &LeadId, synced: bool) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE leads SET synced = ? WHERE id = ?",
                params![i32::from(synced), id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn confirm_synced(&self, id: &LeadId, updated_at: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE leads SET synced = 1, remote_confirmed = 1
                 WHERE id = ? AND updated_at = ? AND deleted = 0",
                params![id.as_str(), updated_at],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn rekey(&self, old_id: &LeadId, new_id: &LeadId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE leads SET id = ?, remote_confirmed = 1 WHERE id = ?",
                params![new_id.as_str(), old_id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(old_id.to_string()));
        }
        Ok(())
    }

    async fn mark_deleted(&self, id: &LeadId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE leads SET deleted = 1, synced = 0, updated_at = ? WHERE id = ?",
                params![chrono::Utc::now().timestamp_millis(), id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &LeadId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM leads WHERE id = ?", params![id.as_str()])
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }
}
