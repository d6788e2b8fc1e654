//! Bounded-growth enforcement for history and downloads
//!
//! Sweeps run inside the same transaction as the write that triggers them,
//! so a read issued right after a write always observes enforced bounds.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::database::to_millis;
use crate::Result;

pub const HISTORY_MAX_ENTRIES: usize = 5000;
pub const DOWNLOAD_MAX_ENTRIES: usize = 500;
pub const RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    pub history_max_entries: usize,
    pub download_max_entries: usize,
    pub max_age_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            history_max_entries: HISTORY_MAX_ENTRIES,
            download_max_entries: DOWNLOAD_MAX_ENTRIES,
            max_age_days: RETENTION_DAYS,
        }
    }
}

impl RetentionPolicy {
    /// Oldest timestamp a row may carry when swept at `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.max_age_days)
    }

    /// Drops aged-out history rows, then everything beyond the newest
    /// `history_max_entries`. Visits go with them through the cascade.
    pub(crate) fn sweep_history(&self, conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
        let aged = conn.execute(
            "DELETE FROM history WHERE visit_time < ?1",
            [to_millis(self.cutoff(now))],
        )?;

        let capped = conn.execute(
            "DELETE FROM history WHERE id NOT IN (
                 SELECT id FROM history ORDER BY visit_time DESC, id DESC LIMIT ?1
             )",
            [self.history_max_entries as i64],
        )?;

        if aged + capped > 0 {
            tracing::debug!(aged, capped, "Swept history");
        }

        Ok(aged + capped)
    }

    /// Same bounds for downloads, by `started_at`. Returns the ids removed so
    /// callers holding the rows in memory can drop them too.
    pub(crate) fn sweep_downloads(&self, conn: &Connection, now: DateTime<Utc>) -> Result<Vec<String>> {
        let swept = {
            let mut stmt = conn.prepare(
                "SELECT id FROM downloads
                 WHERE started_at < ?1
                    OR id NOT IN (
                        SELECT id FROM downloads ORDER BY started_at DESC, rowid DESC LIMIT ?2
                    )",
            )?;
            let ids = stmt
                .query_map(
                    rusqlite::params![to_millis(self.cutoff(now)), self.download_max_entries as i64],
                    |row| row.get::<_, String>(0),
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids
        };

        for id in &swept {
            conn.execute("DELETE FROM downloads WHERE id = ?1", [id])?;
        }

        if !swept.is_empty() {
            tracing::debug!(swept = swept.len(), "Swept downloads");
        }

        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_is_thirty_days_back() {
        let policy = RetentionPolicy::default();
        let now = Utc::now();
        assert_eq!(now - policy.cutoff(now), Duration::days(30));
    }

    #[test]
    fn test_partial_policy_deserializes_with_defaults() {
        let policy: RetentionPolicy =
            serde_json::from_str(r#"{"history_max_entries": 10}"#).unwrap();
        assert_eq!(policy.history_max_entries, 10);
        assert_eq!(policy.download_max_entries, DOWNLOAD_MAX_ENTRIES);
        assert_eq!(policy.max_age_days, RETENTION_DAYS);
    }
}
