//! Transfer metrics computed from a download row. Never persisted.

use chrono::{DateTime, Utc};
use harbor_storage::{Download, DownloadState};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadMetrics {
    pub progress: f64,
    /// Bytes per second
    pub throughput: Option<f64>,
    pub eta_seconds: Option<f64>,
}

impl DownloadMetrics {
    pub fn of(download: &Download, now: DateTime<Utc>) -> Self {
        Self {
            progress: progress_percent(download),
            throughput: throughput(download, now),
            eta_seconds: eta_seconds(download, now),
        }
    }
}

/// 0..=100. Without a known total, any received bytes count as done.
pub fn progress_percent(download: &Download) -> f64 {
    match download.bytes_total {
        Some(total) if total > 0 => {
            let ratio = download.bytes_received as f64 / total as f64;
            ratio.clamp(0.0, 1.0) * 100.0
        }
        _ if download.bytes_received > 0 => 100.0,
        _ => 0.0,
    }
}

/// Average bytes per second since the transfer started. Undefined while paused.
pub fn throughput(download: &Download, now: DateTime<Utc>) -> Option<f64> {
    if download.state == DownloadState::Paused {
        return None;
    }

    let end = match (download.state, download.completed_at) {
        (DownloadState::Completed, Some(completed_at)) => completed_at,
        _ => now,
    };

    let elapsed = (end - download.started_at).num_milliseconds() as f64 / 1000.0;
    if elapsed <= 0.0 {
        return None;
    }

    Some(download.bytes_received as f64 / elapsed)
}

pub fn eta_seconds(download: &Download, now: DateTime<Utc>) -> Option<f64> {
    let rate = throughput(download, now).filter(|r| *r > 0.0)?;
    let total = download.bytes_total?;
    if total <= download.bytes_received {
        return None;
    }

    Some((total - download.bytes_received) as f64 / rate)
}
