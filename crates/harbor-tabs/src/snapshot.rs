//! Display-ready snapshots broadcast to the UI

use serde::{Deserialize, Serialize};

use crate::ids::TabId;
use crate::tab::Tab;

/// Full navigation state of one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavState {
    pub tab_id: TabId,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub session_partition: String,
    pub is_incognito: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSummary {
    pub tab_id: TabId,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabList {
    pub tabs: Vec<TabSummary>,
    pub active_tab_id: Option<TabId>,
}

impl TabList {
    pub fn ids(&self) -> Vec<TabId> {
        self.tabs.iter().map(|t| t.tab_id).collect()
    }
}

impl Tab {
    pub fn nav_state(&self, is_active: bool) -> NavState {
        NavState {
            tab_id: self.id,
            url: self.url.clone(),
            title: self.title.clone(),
            favicon: self.favicon.clone(),
            can_go_back: self.can_go_back,
            can_go_forward: self.can_go_forward,
            is_loading: self.load.is_loading(),
            error: self.error.clone(),
            session_partition: self.session_partition.clone(),
            is_incognito: self.incognito,
            is_active,
        }
    }

    pub fn summary(&self) -> TabSummary {
        TabSummary {
            tab_id: self.id,
            url: self.url.clone(),
            title: self.title.clone(),
            favicon: self.favicon.clone(),
            can_go_back: self.can_go_back,
            can_go_forward: self.can_go_forward,
            is_loading: self.load.is_loading(),
            error: self.error.clone(),
        }
    }
}
