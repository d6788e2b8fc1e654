//! Typed payloads carried on the channels

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use harbor_privacy::{PermissionKind, PermissionState};
use harbor_storage::Download;
use harbor_tabs::{Bounds, TabId};

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabTarget {
    pub tab_id: TabId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateRequest {
    pub tab_id: TabId,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadRequest {
    pub tab_id: TabId,
    #[serde(default)]
    pub ignore_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTabRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub session_partition: Option<String>,
    #[serde(default)]
    pub incognito: bool,
    #[serde(default)]
    pub shadow: bool,
    #[serde(default = "default_true")]
    pub activate: bool,
}

impl Default for CreateTabRequest {
    fn default() -> Self {
        Self {
            url: None,
            session_partition: None,
            incognito: false,
            shadow: false,
            activate: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBoundsRequest {
    pub tab_id: TabId,
    #[serde(flatten)]
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetShadowRequest {
    pub tab_id: TabId,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadTarget {
    pub download_id: String,
}

/// Without an id, every finished download is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadsClear {
    #[serde(default)]
    pub download_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDecision {
    pub request_id: u64,
    pub decision: PermissionState,
    /// Store the decision for the origin instead of answering once
    #[serde(default = "default_true")]
    pub remember: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionQuery {
    #[serde(default)]
    pub origin: Option<String>,
}

/// Without a permission, every decision for the origin is reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionClear {
    pub origin: String,
    #[serde(default)]
    pub permission: Option<PermissionKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    pub origin: String,
    pub permission: PermissionKind,
    pub state: PermissionState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDataClear {
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingSet {
    pub key: String,
    pub value: serde_json::Value,
}

/// `downloads:update`. A `deleted` row should be removed from view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUpdate {
    #[serde(flatten)]
    pub download: Download,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
}

impl DownloadUpdate {
    pub fn changed(download: Download) -> Self {
        Self {
            download,
            deleted: false,
        }
    }

    pub fn deleted(download: Download) -> Self {
        Self {
            download,
            deleted: true,
        }
    }
}

pub type SettingsSnapshot = BTreeMap<String, serde_json::Value>;
