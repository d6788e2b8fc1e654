//! Stdin line format
//!
//! One JSON object per line, tagged by where it came from:
//! `{"source":"ui","frame":{...RequestFrame}}`,
//! `{"source":"surface","frame":{...SurfaceEvent}}` or
//! `{"source":"download","frame":{"type":"progress",...}}`.

use serde::Deserialize;

use harbor_core::{DownloadEvent, DownloadState, NewDownload, SurfaceEvent};
use harbor_ipc::RequestFrame;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "source", content = "frame", rename_all = "camelCase")]
pub enum ShellLine {
    Ui(RequestFrame),
    Surface(SurfaceEvent),
    Download(DownloadReport),
}

/// Engine download report. Lines carry no control handle, so pause and
/// resume stay unavailable for downloads started this way.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DownloadReport {
    #[serde(rename_all = "camelCase")]
    Started {
        id: String,
        url: String,
        #[serde(default)]
        filename: Option<String>,
        #[serde(default)]
        mime: Option<String>,
        #[serde(default)]
        bytes_total: Option<u64>,
        #[serde(default)]
        path: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Progress {
        id: String,
        bytes_received: u64,
        #[serde(default)]
        bytes_total: Option<u64>,
    },
    Finished {
        id: String,
        state: DownloadState,
        #[serde(default)]
        path: Option<String>,
    },
}

impl From<DownloadReport> for DownloadEvent {
    fn from(report: DownloadReport) -> Self {
        match report {
            DownloadReport::Started {
                id,
                url,
                filename,
                mime,
                bytes_total,
                path,
            } => DownloadEvent::Started {
                download: NewDownload {
                    id: Some(id),
                    url,
                    filename,
                    mime,
                    bytes_total,
                    path,
                },
                control: None,
            },
            DownloadReport::Progress {
                id,
                bytes_received,
                bytes_total,
            } => DownloadEvent::Progress {
                id,
                bytes_received,
                bytes_total,
            },
            DownloadReport::Finished { id, state, path } => DownloadEvent::Finished { id, state, path },
        }
    }
}

pub fn parse_line(line: &str) -> serde_json::Result<ShellLine> {
    serde_json::from_str(line)
}
