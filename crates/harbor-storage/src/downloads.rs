//! Download rows
//!
//! Writes are upserts that merge with the stored row: a partial patch never
//! nulls out a field that is already known.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::database::{from_millis, to_millis, Database};
use crate::error::StorageError;
use crate::history::count_rows;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    InProgress,
    Paused,
    Completed,
    Cancelled,
    Interrupted,
}

impl DownloadState {
    /// Valid lifecycle edges. Completed, cancelled and interrupted are terminal.
    pub fn can_transition_to(&self, target: DownloadState) -> bool {
        match (self, target) {
            (DownloadState::InProgress, DownloadState::Paused) => true,
            (DownloadState::InProgress, DownloadState::Completed) => true,
            (DownloadState::InProgress, DownloadState::Cancelled) => true,
            (DownloadState::InProgress, DownloadState::Interrupted) => true,
            (DownloadState::Paused, DownloadState::InProgress) => true,
            (DownloadState::Paused, DownloadState::Cancelled) => true,
            _ => false,
        }
    }

    /// Whether a stored row may be moved to `target`. Besides the direct
    /// edges, a paused transfer may settle by passing back through
    /// in_progress. Rewriting the current state is always allowed.
    pub fn can_settle_to(&self, target: DownloadState) -> bool {
        *self == target
            || self.can_transition_to(target)
            || (self.can_transition_to(DownloadState::InProgress)
                && DownloadState::InProgress.can_transition_to(target))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadState::Completed | DownloadState::Cancelled | DownloadState::Interrupted
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadState::InProgress => "in_progress",
            DownloadState::Paused => "paused",
            DownloadState::Completed => "completed",
            DownloadState::Cancelled => "cancelled",
            DownloadState::Interrupted => "interrupted",
        }
    }
}

impl std::fmt::Display for DownloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DownloadState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_progress" => Ok(DownloadState::InProgress),
            "paused" => Ok(DownloadState::Paused),
            "completed" => Ok(DownloadState::Completed),
            "cancelled" => Ok(DownloadState::Cancelled),
            "interrupted" => Ok(DownloadState::Interrupted),
            _ => Err(format!("Unknown download state: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    pub id: String,
    pub url: String,
    pub filename: Option<String>,
    pub mime: Option<String>,
    pub bytes_total: Option<u64>,
    pub bytes_received: u64,
    pub path: Option<String>,
    pub state: DownloadState,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Download {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            filename: None,
            mime: None,
            bytes_total: None,
            bytes_received: 0,
            path: None,
            state: DownloadState::InProgress,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Fold `patch` into this row, keeping known fields the patch leaves out.
    pub fn apply(&mut self, patch: &DownloadPatch) {
        if let Some(url) = patch.url.as_ref().filter(|u| !u.is_empty()) {
            self.url = url.clone();
        }
        if patch.filename.is_some() {
            self.filename = patch.filename.clone();
        }
        if patch.mime.is_some() {
            self.mime = patch.mime.clone();
        }
        if patch.bytes_total.is_some() {
            self.bytes_total = patch.bytes_total;
        }
        if patch.path.is_some() {
            self.path = patch.path.clone();
        }

        let next_state = patch.state.unwrap_or(self.state);
        if let Some(received) = patch.bytes_received {
            // Received bytes only grow while the transfer is running
            self.bytes_received =
                if self.state == DownloadState::InProgress && next_state == DownloadState::InProgress {
                    self.bytes_received.max(received)
                } else {
                    received
                };
        }
        self.state = next_state;

        // started_at is fixed once the row exists
        if patch.completed_at.is_some() {
            self.completed_at = patch.completed_at;
        }
    }
}

/// Result of a download write: the merged row and the ids the retention
/// sweep removed in the same transaction (possibly including this row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadWrite {
    pub download: Download,
    pub swept: Vec<String>,
}

/// Partial update of a download row. `None` means "leave as stored".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadPatch {
    pub url: Option<String>,
    pub filename: Option<String>,
    pub mime: Option<String>,
    pub bytes_total: Option<u64>,
    pub bytes_received: Option<u64>,
    pub path: Option<String>,
    pub state: Option<DownloadState>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DownloadPatch {
    pub fn progress(bytes_received: u64) -> Self {
        Self {
            bytes_received: Some(bytes_received),
            ..Self::default()
        }
    }

    pub fn state(state: DownloadState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }
}

impl From<&Download> for DownloadPatch {
    fn from(download: &Download) -> Self {
        Self {
            url: Some(download.url.clone()),
            filename: download.filename.clone(),
            mime: download.mime.clone(),
            bytes_total: download.bytes_total,
            bytes_received: Some(download.bytes_received),
            path: download.path.clone(),
            state: Some(download.state),
            started_at: Some(download.started_at),
            completed_at: download.completed_at,
        }
    }
}

const DOWNLOAD_COLUMNS: &str = "id, url, filename, mime, bytes_total, bytes_received, path,
                                state, started_at, completed_at";

fn download_from_row(row: &Row<'_>) -> rusqlite::Result<Download> {
    let state_str: String = row.get(7)?;
    let completed_at: Option<i64> = row.get(9)?;

    Ok(Download {
        id: row.get(0)?,
        url: row.get(1)?,
        filename: row.get(2)?,
        mime: row.get(3)?,
        bytes_total: row.get::<_, Option<i64>>(4)?.map(|v| v.max(0) as u64),
        bytes_received: row.get::<_, i64>(5)?.max(0) as u64,
        path: row.get(6)?,
        state: state_str.parse().unwrap_or(DownloadState::Interrupted),
        started_at: from_millis(row.get(8)?),
        completed_at: completed_at.map(from_millis),
    })
}

fn read_download(conn: &Connection, id: &str) -> Result<Option<Download>> {
    let download = conn
        .query_row(
            &format!("SELECT {DOWNLOAD_COLUMNS} FROM downloads WHERE id = ?1"),
            [id],
            download_from_row,
        )
        .optional()?;
    Ok(download)
}

fn write_download(conn: &Connection, download: &Download) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO downloads
         (id, url, filename, mime, bytes_total, bytes_received, path,
          state, started_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            download.id,
            download.url,
            download.filename,
            download.mime,
            download.bytes_total.map(|v| v as i64),
            download.bytes_received as i64,
            download.path,
            download.state.as_str(),
            to_millis(download.started_at),
            download.completed_at.map(to_millis),
        ],
    )?;
    Ok(())
}

impl Database {
    /// Upsert a full download record, merged with whatever is stored.
    pub fn record_download(&self, entry: &Download) -> Result<Download> {
        Ok(self.record_download_with_sweep(entry)?.download)
    }

    /// Merge a partial patch into a stored download.
    ///
    /// Creating a row through a patch requires the patch to carry a url. A
    /// state change the lifecycle graph does not allow is rejected and the
    /// stored row is left untouched.
    pub fn update_download_progress(&self, id: &str, patch: &DownloadPatch) -> Result<Download> {
        Ok(self.update_download_with_sweep(id, patch)?.download)
    }

    /// `record_download`, also reporting the rows retention removed
    pub fn record_download_with_sweep(&self, entry: &Download) -> Result<DownloadWrite> {
        self.upsert_download(&entry.id, &DownloadPatch::from(entry), Some(entry))
    }

    /// `update_download_progress`, also reporting the rows retention removed
    pub fn update_download_with_sweep(&self, id: &str, patch: &DownloadPatch) -> Result<DownloadWrite> {
        self.upsert_download(id, patch, None)
    }

    fn upsert_download(
        &self,
        id: &str,
        patch: &DownloadPatch,
        fresh: Option<&Download>,
    ) -> Result<DownloadWrite> {
        let retention = self.retention().clone();

        self.transaction(|conn| {
            let merged = match read_download(conn, id)? {
                Some(mut current) => {
                    if let Some(next) = patch.state {
                        if !current.state.can_settle_to(next) {
                            return Err(StorageError::Invalid(format!(
                                "download {id} cannot move from {} to {next}",
                                current.state
                            )));
                        }
                    }
                    current.apply(patch);
                    current
                }
                None => match (fresh, patch.url.as_ref()) {
                    (Some(entry), _) => entry.clone(),
                    (None, Some(url)) if !url.is_empty() => {
                        let mut created = Download::new(id, url.clone());
                        created.apply(patch);
                        created
                    }
                    _ => return Err(StorageError::NotFound(format!("download {id}"))),
                },
            };

            if merged.url.is_empty() {
                return Err(StorageError::Invalid(format!("download {id} has no url")));
            }

            write_download(conn, &merged)?;
            let swept = retention.sweep_downloads(conn, Utc::now())?;

            Ok(DownloadWrite {
                download: merged,
                swept,
            })
        })
    }

    pub fn get_download(&self, id: &str) -> Result<Option<Download>> {
        self.with_connection(|conn| read_download(conn, id))
    }

    /// All downloads, newest first
    pub fn list_downloads(&self) -> Result<Vec<Download>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DOWNLOAD_COLUMNS} FROM downloads ORDER BY started_at DESC, rowid DESC"
            ))?;

            let downloads = stmt
                .query_map([], download_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(downloads)
        })
    }

    pub fn delete_download(&self, id: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute("DELETE FROM downloads WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    pub fn download_count(&self) -> Result<usize> {
        self.with_connection(|conn| count_rows(conn, "downloads"))
    }

    pub fn clear_downloads(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM downloads", [])?;
            Ok(())
        })?;

        tracing::info!("Cleared downloads");
        Ok(())
    }
}
