//! Permission management
//!
//! | Capability     | Default | Persistence |
//! | Camera         | Ask     | Per-site    |
//! | Microphone     | Ask     | Per-site    |
//! | Geolocation    | Ask     | Per-site    |
//! | Notifications  | Ask     | Per-site    |
//! | Clipboard read | Ask     | Per-site    |
//! | MIDI           | Ask     | Per-site    |

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harbor_storage::{Database, PermissionSetting};

use crate::error::PrivacyError;
use crate::origin::origin_of;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionKind {
    Camera,
    Microphone,
    Geolocation,
    Notifications,
    ClipboardRead,
    Midi,
}

impl PermissionKind {
    pub const ALL: [PermissionKind; 6] = [
        PermissionKind::Camera,
        PermissionKind::Microphone,
        PermissionKind::Geolocation,
        PermissionKind::Notifications,
        PermissionKind::ClipboardRead,
        PermissionKind::Midi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Camera => "camera",
            PermissionKind::Microphone => "microphone",
            PermissionKind::Geolocation => "geolocation",
            PermissionKind::Notifications => "notifications",
            PermissionKind::ClipboardRead => "clipboard-read",
            PermissionKind::Midi => "midi",
        }
    }
}

impl std::fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PermissionKind {
    type Err = PrivacyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PermissionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PrivacyError::UnknownPermission(s.to_string()))
    }
}

/// Effective decision for an origin. `Ask` is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Prompt user when requested
    Ask,
    Allow,
    Deny,
}

impl From<Option<PermissionSetting>> for PermissionState {
    fn from(setting: Option<PermissionSetting>) -> Self {
        match setting {
            Some(PermissionSetting::Allow) => PermissionState::Allow,
            Some(PermissionSetting::Deny) => PermissionState::Deny,
            None => PermissionState::Ask,
        }
    }
}

impl PermissionState {
    fn as_setting(&self) -> Option<PermissionSetting> {
        match self {
            PermissionState::Ask => None,
            PermissionState::Allow => Some(PermissionSetting::Allow),
            PermissionState::Deny => Some(PermissionSetting::Deny),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePermission {
    pub origin: String,
    pub permission: PermissionKind,
    pub state: PermissionState,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Every stored decision, keyed by origin then permission name.
pub type PermissionSnapshot = BTreeMap<String, BTreeMap<String, PermissionState>>;

pub struct PermissionStore {
    db: Database,
}

impl PermissionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn get(&self, origin: &str, kind: PermissionKind) -> Result<PermissionState> {
        let origin = origin_of(origin)?;
        let setting = self.db.get_permission(&origin, kind.as_str())?;
        Ok(setting.into())
    }

    /// Store a decision. Setting `Ask` removes the stored one.
    pub fn set(&self, origin: &str, kind: PermissionKind, state: PermissionState) -> Result<()> {
        let origin = origin_of(origin)?;

        match state.as_setting() {
            Some(setting) => {
                self.db.save_permission(&origin, kind.as_str(), setting)?;
            }
            None => {
                self.db.clear_permission(&origin, kind.as_str())?;
            }
        }

        tracing::info!(origin = %origin, permission = %kind, state = ?state, "Permission updated");
        Ok(())
    }

    /// Stored decisions, optionally for one origin only
    pub fn list(&self, origin: Option<&str>) -> Result<Vec<SitePermission>> {
        let origin = origin.map(origin_of).transpose()?;
        let records = self.db.list_permissions(origin.as_deref())?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let Ok(permission) = record.permission.parse::<PermissionKind>() else {
                    tracing::debug!(permission = %record.permission, "Skipping unknown permission");
                    return None;
                };
                Some(SitePermission {
                    origin: record.origin,
                    permission,
                    state: Some(record.setting).into(),
                    updated_at: record.updated_at,
                })
            })
            .collect())
    }

    /// Reset one decision back to ask. Returns whether one was stored.
    pub fn clear(&self, origin: &str, kind: PermissionKind) -> Result<bool> {
        let origin = origin_of(origin)?;
        Ok(self.db.clear_permission(&origin, kind.as_str())?)
    }

    pub fn clear_origin(&self, origin: &str) -> Result<usize> {
        let origin = origin_of(origin)?;
        Ok(self.db.clear_permissions_for_origin(&origin)?)
    }

    pub fn clear_all(&self) -> Result<usize> {
        Ok(self.db.clear_all_permissions()?)
    }

    pub fn snapshot(&self) -> Result<PermissionSnapshot> {
        let mut snapshot = PermissionSnapshot::new();
        for record in self.db.list_permissions(None)? {
            snapshot
                .entry(record.origin)
                .or_default()
                .insert(record.permission, Some(record.setting).into());
        }
        Ok(snapshot)
    }
}

impl Clone for PermissionStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
