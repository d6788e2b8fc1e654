//! Per-origin permission decisions

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::database::{from_millis, to_millis, Database};
use crate::Result;

/// A stored decision. "Ask" is never persisted; it is the absence of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionSetting {
    Allow,
    Deny,
}

impl PermissionSetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionSetting::Allow => "allow",
            PermissionSetting::Deny => "deny",
        }
    }
}

impl std::str::FromStr for PermissionSetting {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allow" => Ok(PermissionSetting::Allow),
            "deny" => Ok(PermissionSetting::Deny),
            _ => Err(format!("Unknown permission setting: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    pub origin: String,
    pub permission: String,
    pub setting: PermissionSetting,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Option<PermissionRecord>> {
    let setting: String = row.get(2)?;
    let Ok(setting) = setting.parse() else {
        return Ok(None);
    };

    Ok(Some(PermissionRecord {
        origin: row.get(0)?,
        permission: row.get(1)?,
        setting,
        updated_at: from_millis(row.get(3)?),
    }))
}

impl Database {
    pub fn get_permission(&self, origin: &str, permission: &str) -> Result<Option<PermissionSetting>> {
        self.with_connection(|conn| {
            let setting: Option<String> = conn
                .query_row(
                    "SELECT setting FROM permissions WHERE origin = ?1 AND permission = ?2",
                    [origin, permission],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(setting.and_then(|s| s.parse().ok()))
        })
    }

    pub fn save_permission(
        &self,
        origin: &str,
        permission: &str,
        setting: PermissionSetting,
    ) -> Result<PermissionRecord> {
        let record = PermissionRecord {
            origin: origin.to_string(),
            permission: permission.to_string(),
            setting,
            updated_at: Utc::now(),
        };

        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO permissions (origin, permission, setting, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(origin, permission)
                 DO UPDATE SET setting = excluded.setting, updated_at = excluded.updated_at",
                rusqlite::params![
                    record.origin,
                    record.permission,
                    record.setting.as_str(),
                    to_millis(record.updated_at),
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!(
            origin = %record.origin,
            permission = %record.permission,
            setting = record.setting.as_str(),
            "Saved permission"
        );

        Ok(record)
    }

    /// Stored decisions, optionally narrowed to one origin, sorted by origin
    /// then permission.
    pub fn list_permissions(&self, origin: Option<&str>) -> Result<Vec<PermissionRecord>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT origin, permission, setting, updated_at FROM permissions
                 WHERE ?1 IS NULL OR origin = ?1
                 ORDER BY origin, permission",
            )?;

            let records = stmt
                .query_map([origin], record_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(records.into_iter().flatten().collect())
        })
    }

    pub fn clear_permission(&self, origin: &str, permission: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "DELETE FROM permissions WHERE origin = ?1 AND permission = ?2",
                [origin, permission],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn clear_permissions_for_origin(&self, origin: &str) -> Result<usize> {
        let removed = self.with_connection(|conn| {
            Ok(conn.execute("DELETE FROM permissions WHERE origin = ?1", [origin])?)
        })?;

        tracing::info!(origin = %origin, removed, "Cleared permissions for origin");
        Ok(removed)
    }

    pub fn clear_all_permissions(&self) -> Result<usize> {
        self.with_connection(|conn| Ok(conn.execute("DELETE FROM permissions", [])?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "https://example.com";

    #[test]
    fn test_unset_permission_reads_as_none() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_permission(SITE, "camera").unwrap(), None);
    }

    #[test]
    fn test_save_overwrites_previous_decision() {
        let db = Database::open_in_memory().unwrap();

        db.save_permission(SITE, "camera", PermissionSetting::Allow).unwrap();
        db.save_permission(SITE, "camera", PermissionSetting::Deny).unwrap();

        assert_eq!(
            db.get_permission(SITE, "camera").unwrap(),
            Some(PermissionSetting::Deny)
        );
        assert_eq!(db.list_permissions(None).unwrap().len(), 1);
    }

    #[test]
    fn test_list_filters_by_origin() {
        let db = Database::open_in_memory().unwrap();

        db.save_permission(SITE, "camera", PermissionSetting::Allow).unwrap();
        db.save_permission(SITE, "geolocation", PermissionSetting::Deny).unwrap();
        db.save_permission("https://other.test", "camera", PermissionSetting::Deny).unwrap();

        let all = db.list_permissions(None).unwrap();
        assert_eq!(all.len(), 3);

        let scoped = db.list_permissions(Some(SITE)).unwrap();
        let names: Vec<&str> = scoped.iter().map(|r| r.permission.as_str()).collect();
        assert_eq!(names, vec!["camera", "geolocation"]);
    }

    #[test]
    fn test_clear_single_and_origin() {
        let db = Database::open_in_memory().unwrap();

        db.save_permission(SITE, "camera", PermissionSetting::Allow).unwrap();
        db.save_permission(SITE, "microphone", PermissionSetting::Allow).unwrap();
        db.save_permission("https://other.test", "camera", PermissionSetting::Deny).unwrap();

        assert!(db.clear_permission(SITE, "camera").unwrap());
        assert!(!db.clear_permission(SITE, "camera").unwrap());

        assert_eq!(db.clear_permissions_for_origin(SITE).unwrap(), 1);
        assert_eq!(db.list_permissions(None).unwrap().len(), 1);

        assert_eq!(db.clear_all_permissions().unwrap(), 1);
        assert!(db.list_permissions(None).unwrap().is_empty());
    }
}
