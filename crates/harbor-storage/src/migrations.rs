//! Database migrations
//!
//! Schema: history, visits, downloads, permissions, settings

use crate::Result;
use rusqlite::Connection;

const SCHEMA_VERSION: i32 = 1;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<i32, _> =
        conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        });

    match result {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(rusqlite::Error::SqliteFailure(_, _)) => {
            // Table doesn't exist yet
            conn.execute(
                "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
                [],
            )?;
            conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])?;
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration v1: Initial schema");

    // One row per committed navigation; times are epoch milliseconds
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL,
            title TEXT,
            visit_time INTEGER NOT NULL,
            transition TEXT,
            referrer TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_history_visit_time ON history(visit_time);
        CREATE INDEX IF NOT EXISTS idx_history_url ON history(url);
    "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS visits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            history_id INTEGER NOT NULL,
            visit_time INTEGER NOT NULL,
            duration_ms INTEGER,
            FOREIGN KEY (history_id) REFERENCES history(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_visits_history ON visits(history_id);
    "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS downloads (
            id TEXT PRIMARY KEY,
            url TEXT NOT NULL,
            filename TEXT,
            mime TEXT,
            bytes_total INTEGER,
            bytes_received INTEGER NOT NULL DEFAULT 0,
            path TEXT,
            state TEXT NOT NULL DEFAULT 'in_progress',
            started_at INTEGER NOT NULL,
            completed_at INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_downloads_started ON downloads(started_at);
    "#,
    )?;

    // Absence of a row means "ask"; only allow/deny are ever stored
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS permissions (
            origin TEXT NOT NULL,
            permission TEXT NOT NULL,
            setting TEXT NOT NULL CHECK (setting IN ('allow', 'deny')),
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (origin, permission)
        );
    "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
    "#,
    )?;

    Ok(())
}
