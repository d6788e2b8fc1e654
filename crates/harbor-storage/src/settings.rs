//! Key/value settings stored as JSON text

use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::{to_millis, Database};
use crate::Result;

impl Database {
    pub fn set_setting<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;

        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![key, encoded, to_millis(Utc::now())],
            )?;
            Ok(())
        })
    }

    /// Reads a setting. A stored value that no longer parses as `T` reads
    /// as unset rather than failing the caller.
    pub fn get_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self.with_connection(|conn| {
            Ok(conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?)
        })?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Ignoring unreadable setting");
                Ok(None)
            }
        }
    }

    /// Every setting as raw JSON. Corrupt values come back as null.
    pub fn get_all_settings(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(rows
                .into_iter()
                .map(|(key, raw)| {
                    let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);
                    (key, value)
                })
                .collect())
        })
    }

    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
            Ok(changed > 0)
        })
    }
}
