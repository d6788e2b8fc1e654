//! Navigation history and visits

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::database::{from_millis, to_millis, Database};
use crate::Result;

/// How a navigation was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Link,
    Typed,
    Reload,
    BackForward,
    Redirect,
    Generated,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Link => "link",
            Transition::Typed => "typed",
            Transition::Reload => "reload",
            Transition::BackForward => "back_forward",
            Transition::Redirect => "redirect",
            Transition::Generated => "generated",
        }
    }
}

impl std::str::FromStr for Transition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "link" => Ok(Transition::Link),
            "typed" => Ok(Transition::Typed),
            "reload" => Ok(Transition::Reload),
            "back_forward" => Ok(Transition::BackForward),
            "redirect" => Ok(Transition::Redirect),
            "generated" => Ok(Transition::Generated),
            _ => Err(format!("Unknown transition: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub visit_time: DateTime<Utc>,
    pub transition: Option<Transition>,
    pub referrer: Option<String>,
    /// Visit row created together with this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: i64,
    pub history_id: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub visit_time: DateTime<Utc>,
    pub duration_ms: Option<i64>,
}

/// A committed navigation about to be recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNavigation {
    pub url: String,
    pub title: Option<String>,
    pub transition: Option<Transition>,
    pub referrer: Option<String>,
}

impl NewNavigation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }
}

const HISTORY_COLUMNS: &str = "h.id, h.url, h.title, h.visit_time, h.transition, h.referrer";

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let transition: Option<String> = row.get(4)?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        visit_time: from_millis(row.get(3)?),
        transition: transition.and_then(|t| t.parse().ok()),
        referrer: row.get(5)?,
        visit_id: None,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Database {
    /// Record a committed navigation
    pub fn record_navigation(&self, nav: &NewNavigation) -> Result<HistoryEntry> {
        self.record_navigation_at(nav, Utc::now())
    }

    /// Record a committed navigation with an explicit visit time.
    ///
    /// The history row, its visit row and the retention sweep commit together.
    pub fn record_navigation_at(
        &self,
        nav: &NewNavigation,
        visit_time: DateTime<Utc>,
    ) -> Result<HistoryEntry> {
        let retention = self.retention().clone();
        let title = non_empty(nav.title.as_deref()).map(str::to_string);

        let entry = self.transaction(|conn| {
            conn.execute(
                "INSERT INTO history (url, title, visit_time, transition, referrer)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    nav.url,
                    title,
                    to_millis(visit_time),
                    nav.transition.map(|t| t.as_str()),
                    nav.referrer,
                ],
            )?;
            let id = conn.last_insert_rowid();

            conn.execute(
                "INSERT INTO visits (history_id, visit_time) VALUES (?1, ?2)",
                rusqlite::params![id, to_millis(visit_time)],
            )?;
            let visit_id = conn.last_insert_rowid();

            retention.sweep_history(conn, Utc::now())?;

            Ok(HistoryEntry {
                id,
                url: nav.url.clone(),
                title,
                visit_time: from_millis(to_millis(visit_time)),
                transition: nav.transition,
                referrer: nav.referrer.clone(),
                visit_id: Some(visit_id),
            })
        })?;

        tracing::debug!(history_id = entry.id, url = %entry.url, "Recorded navigation");

        Ok(entry)
    }

    /// Backfill the title of an entry. Returns false when the entry is gone.
    pub fn update_history_title(&self, id: i64, title: &str) -> Result<bool> {
        let Some(title) = non_empty(Some(title)) else {
            return Ok(false);
        };

        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE history SET title = ?1 WHERE id = ?2",
                rusqlite::params![title, id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_history_entry(&self, id: i64) -> Result<Option<HistoryEntry>> {
        self.with_connection(|conn| {
            let entry = conn
                .query_row(
                    &format!("SELECT {HISTORY_COLUMNS} FROM history h WHERE h.id = ?1"),
                    [id],
                    history_from_row,
                )
                .optional()?;
            Ok(entry)
        })
    }

    /// Most recent entries, newest first
    pub fn get_recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {HISTORY_COLUMNS} FROM history h
                 ORDER BY h.visit_time DESC, h.id DESC
                 LIMIT ?1"
            ))?;

            let entries = stmt
                .query_map([limit as i64], history_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(entries)
        })
    }

    pub fn history_count(&self) -> Result<usize> {
        self.with_connection(|conn| count_rows(conn, "history"))
    }

    pub fn visits_for(&self, history_id: i64) -> Result<Vec<Visit>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, history_id, visit_time, duration_ms FROM visits
                 WHERE history_id = ?1
                 ORDER BY visit_time ASC",
            )?;

            let visits = stmt
                .query_map([history_id], |row| {
                    Ok(Visit {
                        id: row.get(0)?,
                        history_id: row.get(1)?,
                        visit_time: from_millis(row.get(2)?),
                        duration_ms: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(visits)
        })
    }

    /// Record how long a visit lasted. No-op if the visit was swept.
    pub fn set_visit_duration(&self, visit_id: i64, duration_ms: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE visits SET duration_ms = ?1 WHERE id = ?2",
                rusqlite::params![duration_ms.max(0), visit_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Clear all history
    pub fn clear_history(&self) -> Result<()> {
        self.transaction(|conn| {
            conn.execute("DELETE FROM visits", [])?;
            conn.execute("DELETE FROM history", [])?;
            Ok(())
        })?;

        tracing::info!("Cleared history");
        Ok(())
    }
}

pub(crate) fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}
