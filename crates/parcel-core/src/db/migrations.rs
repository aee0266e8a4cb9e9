//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
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

/// Execute statements one by one inside a transaction
async fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    // libsql has no execute_batch
    conn.execute("BEGIN TRANSACTION", ()).await?;

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

    Ok(())
}

/// Migration to version 1: trackings, checkpoints and settings
async fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            "CREATE TABLE IF NOT EXISTS trackings (
                id INTEGER PRIMARY KEY,
                tracking_number TEXT NOT NULL,
                title TEXT,
                carrier TEXT,
                archived INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_trackings_archived ON trackings(archived)",
            "CREATE TABLE IF NOT EXISTS checkpoints (
                tracking_id INTEGER NOT NULL REFERENCES trackings(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                time TEXT NOT NULL,
                status_code TEXT NOT NULL,
                status_name TEXT NOT NULL,
                location TEXT,
                delivered INTEGER NOT NULL DEFAULT 0,
                arrived INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (tracking_id, position)
            )",
            // Settings table (local only)
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: cached user profile
async fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL,
                name TEXT,
                updated_at INTEGER NOT NULL
            )",
            "INSERT INTO schema_version (version) VALUES (2)",
        ],
    )
    .await?;

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

    async fn table_exists(conn: &Connection, name: &str) -> bool {
        let mut rows = conn
            .query(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
                [name],
            )
            .await
            .unwrap();

        rows.next()
            .await
            .unwrap()
            .is_some_and(|row| row.get::<i32>(0).unwrap() != 0)
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
        run(&conn).await.unwrap();

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_create_tables() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        for table in ["trackings", "checkpoints", "settings", "profile"] {
            assert!(table_exists(&conn, table).await, "missing table {table}");
        }
    }
}
