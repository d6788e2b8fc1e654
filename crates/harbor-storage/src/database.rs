//! Database connection and shared helpers

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::retention::RetentionPolicy;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
    retention: RetentionPolicy,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, RetentionPolicy::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, retention: RetentionPolicy) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Visits cascade from history
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // WAL journal so a crash mid-write never leaves a torn row
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            retention,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(RetentionPolicy::default())
    }

    pub fn open_in_memory_with(retention: RetentionPolicy) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            retention,
        })
    }

    pub fn retention(&self) -> &RetentionPolicy {
        &self.retention
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            retention: self.retention.clone(),
        }
    }
}

pub(crate) fn to_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            for table in ["history", "visits", "downloads", "permissions", "settings"] {
                let count: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                        row.get(0)
                    })?;
                assert_eq!(count, 0, "{table} should start empty");
            }
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_reopen_file_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harbor.db");

        {
            let db = Database::open(&path).unwrap();
            db.set_setting("homepage", &"https://example.com").unwrap();
        }

        let db = Database::open(&path).unwrap();
        let homepage: Option<String> = db.get_setting("homepage").unwrap();
        assert_eq!(homepage.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_millis_round_trip() {
        let now = Utc::now();
        let back = from_millis(to_millis(now));
        assert_eq!(back.timestamp_millis(), now.timestamp_millis());
    }
}
