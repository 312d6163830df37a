//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: Initial schema
async fn migrate_v1(conn: &Connection) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement separately
    // inside an explicit transaction

    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Quotes table
        "CREATE TABLE IF NOT EXISTS quotes (
            id TEXT PRIMARY KEY,
            reference TEXT NOT NULL,
            client_name TEXT NOT NULL,
            address TEXT NOT NULL DEFAULT '',
            usage_kwh REAL,
            bill_rands REAL,
            tariff REAL NOT NULL DEFAULT 0,
            panel_watt INTEGER NOT NULL DEFAULT 0,
            latitude REAL,
            longitude REAL,
            irradiance REAL,
            sun_hours REAL,
            system_kwp REAL NOT NULL DEFAULT 0,
            estimated_generation REAL NOT NULL DEFAULT 0,
            monthly_savings REAL NOT NULL DEFAULT 0,
            payback_months REAL NOT NULL DEFAULT 0,
            company_name TEXT NOT NULL DEFAULT '',
            company_phone TEXT NOT NULL DEFAULT '',
            company_email TEXT NOT NULL DEFAULT '',
            consultant_name TEXT NOT NULL DEFAULT '',
            consultant_phone TEXT NOT NULL DEFAULT '',
            consultant_email TEXT NOT NULL DEFAULT '',
            user_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            synced INTEGER NOT NULL DEFAULT 0,
            deleted INTEGER NOT NULL DEFAULT 0,
            remote_confirmed INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE INDEX IF NOT EXISTS idx_quotes_user ON quotes(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_quotes_unsynced ON quotes(user_id, synced)",
        "CREATE INDEX IF NOT EXISTS idx_quotes_updated ON quotes(updated_at DESC)",
        // Leads table
        "CREATE TABLE IF NOT EXISTS leads (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'new',
            notes TEXT,
            quote_id TEXT,
            user_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            synced INTEGER NOT NULL DEFAULT 0,
            deleted INTEGER NOT NULL DEFAULT 0,
            remote_confirmed INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE INDEX IF NOT EXISTS idx_leads_user ON leads(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_leads_unsynced ON leads(user_id, synced)",
        "CREATE INDEX IF NOT EXISTS idx_leads_created ON leads(created_at)",
        // Record migration version
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn setup() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_idempotent() {
        let conn = setup().await;
        run(&conn).await.unwrap();
        run(&conn).await.unwrap(); // Should not fail

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migration_v1_creates_sync_columns() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        for table in ["quotes", "leads"] {
            let mut rows = conn
                .query(&format!("SELECT synced, deleted, remote_confirmed FROM {table} LIMIT 0"), ())
                .await
                .unwrap();
            assert!(rows.next().await.unwrap().is_none());
        }
    }
}
