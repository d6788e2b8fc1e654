//! Channel allow-lists
//!
//! Each channel carries traffic in one direction only: events flow from the
//! background to the UI, commands from the UI to the background.

use serde::{Deserialize, Serialize};

/// Background → UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventChannel {
    NavState,
    BrowserTabs,
    HistoryAppend,
    DownloadsUpdate,
    PermissionsPrompt,
    PermissionsState,
    SettingsState,
}

impl EventChannel {
    pub const ALL: [EventChannel; 7] = [
        EventChannel::NavState,
        EventChannel::BrowserTabs,
        EventChannel::HistoryAppend,
        EventChannel::DownloadsUpdate,
        EventChannel::PermissionsPrompt,
        EventChannel::PermissionsState,
        EventChannel::SettingsState,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventChannel::NavState => "nav:state",
            EventChannel::BrowserTabs => "browser:tabs",
            EventChannel::HistoryAppend => "history:append",
            EventChannel::DownloadsUpdate => "downloads:update",
            EventChannel::PermissionsPrompt => "permissions:prompt",
            EventChannel::PermissionsState => "permissions:state",
            EventChannel::SettingsState => "settings:state",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// UI → Background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandChannel {
    Navigate,
    Back,
    Forward,
    Reload,
    CreateTab,
    CloseTab,
    SetActiveTab,
    SetBounds,
    SetShadow,
    RequestTabList,
    RequestHistory,
    ClearHistory,
    RequestDownloads,
    PauseDownload,
    ResumeDownload,
    CancelDownload,
    ClearDownloads,
    ShowDownloadInFolder,
    PermissionDecision,
    ListPermissions,
    ClearPermissions,
    SetPermission,
    ClearSiteData,
    SetSetting,
    RequestSettings,
}

impl CommandChannel {
    pub const ALL: [CommandChannel; 25] = [
        CommandChannel::Navigate,
        CommandChannel::Back,
        CommandChannel::Forward,
        CommandChannel::Reload,
        CommandChannel::CreateTab,
        CommandChannel::CloseTab,
        CommandChannel::SetActiveTab,
        CommandChannel::SetBounds,
        CommandChannel::SetShadow,
        CommandChannel::RequestTabList,
        CommandChannel::RequestHistory,
        CommandChannel::ClearHistory,
        CommandChannel::RequestDownloads,
        CommandChannel::PauseDownload,
        CommandChannel::ResumeDownload,
        CommandChannel::CancelDownload,
        CommandChannel::ClearDownloads,
        CommandChannel::ShowDownloadInFolder,
        CommandChannel::PermissionDecision,
        CommandChannel::ListPermissions,
        CommandChannel::ClearPermissions,
        CommandChannel::SetPermission,
        CommandChannel::ClearSiteData,
        CommandChannel::SetSetting,
        CommandChannel::RequestSettings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CommandChannel::Navigate => "nav:navigate",
            CommandChannel::Back => "nav:back",
            CommandChannel::Forward => "nav:forward",
            CommandChannel::Reload => "nav:reload",
            CommandChannel::CreateTab => "tabs:create",
            CommandChannel::CloseTab => "tabs:close",
            CommandChannel::SetActiveTab => "tabs:set-active",
            CommandChannel::SetBounds => "tabs:set-bounds",
            CommandChannel::SetShadow => "tabs:set-shadow",
            CommandChannel::RequestTabList => "tabs:request-list",
            CommandChannel::RequestHistory => "history:request",
            CommandChannel::ClearHistory => "history:clear",
            CommandChannel::RequestDownloads => "downloads:request",
            CommandChannel::PauseDownload => "downloads:pause",
            CommandChannel::ResumeDownload => "downloads:resume",
            CommandChannel::CancelDownload => "downloads:cancel",
            CommandChannel::ClearDownloads => "downloads:clear",
            CommandChannel::ShowDownloadInFolder => "downloads:show-in-folder",
            CommandChannel::PermissionDecision => "permissions:decision",
            CommandChannel::ListPermissions => "permissions:list",
            CommandChannel::ClearPermissions => "permissions:clear",
            CommandChannel::SetPermission => "permissions:set",
            CommandChannel::ClearSiteData => "site-data:clear",
            CommandChannel::SetSetting => "settings:set",
            CommandChannel::RequestSettings => "settings:request",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl std::fmt::Display for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::fmt::Display for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_round_trip_and_are_unique() {
        let mut seen = HashSet::new();
        for channel in EventChannel::ALL {
            assert_eq!(EventChannel::from_name(channel.name()), Some(channel));
            assert!(seen.insert(channel.name()));
        }
        for channel in CommandChannel::ALL {
            assert_eq!(CommandChannel::from_name(channel.name()), Some(channel));
            assert!(seen.insert(channel.name()));
        }
    }

    #[test]
    fn test_directions_do_not_overlap() {
        assert_eq!(EventChannel::from_name("nav:navigate"), None);
        assert_eq!(CommandChannel::from_name("nav:state"), None);
        assert_eq!(CommandChannel::from_name("shell:exec"), None);
    }
}
