//! Decoded channel messages

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use harbor_privacy::{PermissionPrompt, PermissionSnapshot};
use harbor_storage::HistoryEntry;
use harbor_tabs::{NavState, TabList};

use crate::channel::{CommandChannel, EventChannel};
use crate::error::IpcError;
use crate::payload::*;
use crate::Result;

/// UI → Background
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Navigate(NavigateRequest),
    Back(TabTarget),
    Forward(TabTarget),
    Reload(ReloadRequest),
    CreateTab(CreateTabRequest),
    CloseTab(TabTarget),
    SetActiveTab(TabTarget),
    SetBounds(SetBoundsRequest),
    SetShadow(SetShadowRequest),
    RequestTabList,
    RequestHistory(HistoryQuery),
    ClearHistory,
    RequestDownloads,
    PauseDownload(DownloadTarget),
    ResumeDownload(DownloadTarget),
    CancelDownload(DownloadTarget),
    ClearDownloads(DownloadsClear),
    ShowDownloadInFolder(DownloadTarget),
    PermissionDecision(PermissionDecision),
    ListPermissions(PermissionQuery),
    ClearPermissions(PermissionClear),
    SetPermission(PermissionSet),
    ClearSiteData(SiteDataClear),
    SetSetting(SettingSet),
    RequestSettings,
}

/// Background → UI
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NavState(NavState),
    BrowserTabs(TabList),
    HistoryAppend(HistoryEntry),
    DownloadsUpdate(DownloadUpdate),
    PermissionsPrompt(PermissionPrompt),
    PermissionsState(PermissionSnapshot),
    SettingsState(SettingsSnapshot),
}

fn decode_payload<T: DeserializeOwned>(channel: &str, payload: Value) -> Result<T> {
    // Payload-less sends arrive as null; treat them as an empty object
    let payload = if payload.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        payload
    };

    serde_json::from_value(payload).map_err(|e| IpcError::InvalidPayload {
        channel: channel.to_string(),
        message: e.to_string(),
    })
}

fn encode_payload<T: Serialize>(payload: &T) -> Result<Value> {
    Ok(serde_json::to_value(payload)?)
}

impl Command {
    pub fn decode(channel: CommandChannel, payload: Value) -> Result<Self> {
        let name = channel.name();
        let command = match channel {
            CommandChannel::Navigate => Command::Navigate(decode_payload(name, payload)?),
            CommandChannel::Back => Command::Back(decode_payload(name, payload)?),
            CommandChannel::Forward => Command::Forward(decode_payload(name, payload)?),
            CommandChannel::Reload => Command::Reload(decode_payload(name, payload)?),
            CommandChannel::CreateTab => Command::CreateTab(decode_payload(name, payload)?),
            CommandChannel::CloseTab => Command::CloseTab(decode_payload(name, payload)?),
            CommandChannel::SetActiveTab => Command::SetActiveTab(decode_payload(name, payload)?),
            CommandChannel::SetBounds => Command::SetBounds(decode_payload(name, payload)?),
            CommandChannel::SetShadow => Command::SetShadow(decode_payload(name, payload)?),
            CommandChannel::RequestTabList => Command::RequestTabList,
            CommandChannel::RequestHistory => Command::RequestHistory(decode_payload(name, payload)?),
            CommandChannel::ClearHistory => Command::ClearHistory,
            CommandChannel::RequestDownloads => Command::RequestDownloads,
            CommandChannel::PauseDownload => Command::PauseDownload(decode_payload(name, payload)?),
            CommandChannel::ResumeDownload => Command::ResumeDownload(decode_payload(name, payload)?),
            CommandChannel::CancelDownload => Command::CancelDownload(decode_payload(name, payload)?),
            CommandChannel::ClearDownloads => Command::ClearDownloads(decode_payload(name, payload)?),
            CommandChannel::ShowDownloadInFolder => {
                Command::ShowDownloadInFolder(decode_payload(name, payload)?)
            }
            CommandChannel::PermissionDecision => {
                Command::PermissionDecision(decode_payload(name, payload)?)
            }
            CommandChannel::ListPermissions => Command::ListPermissions(decode_payload(name, payload)?),
            CommandChannel::ClearPermissions => Command::ClearPermissions(decode_payload(name, payload)?),
            CommandChannel::SetPermission => Command::SetPermission(decode_payload(name, payload)?),
            CommandChannel::ClearSiteData => Command::ClearSiteData(decode_payload(name, payload)?),
            CommandChannel::SetSetting => Command::SetSetting(decode_payload(name, payload)?),
            CommandChannel::RequestSettings => Command::RequestSettings,
        };
        Ok(command)
    }

    pub fn channel(&self) -> CommandChannel {
        match self {
            Command::Navigate(_) => CommandChannel::Navigate,
            Command::Back(_) => CommandChannel::Back,
            Command::Forward(_) => CommandChannel::Forward,
            Command::Reload(_) => CommandChannel::Reload,
            Command::CreateTab(_) => CommandChannel::CreateTab,
            Command::CloseTab(_) => CommandChannel::CloseTab,
            Command::SetActiveTab(_) => CommandChannel::SetActiveTab,
            Command::SetBounds(_) => CommandChannel::SetBounds,
            Command::SetShadow(_) => CommandChannel::SetShadow,
            Command::RequestTabList => CommandChannel::RequestTabList,
            Command::RequestHistory(_) => CommandChannel::RequestHistory,
            Command::ClearHistory => CommandChannel::ClearHistory,
            Command::RequestDownloads => CommandChannel::RequestDownloads,
            Command::PauseDownload(_) => CommandChannel::PauseDownload,
            Command::ResumeDownload(_) => CommandChannel::ResumeDownload,
            Command::CancelDownload(_) => CommandChannel::CancelDownload,
            Command::ClearDownloads(_) => CommandChannel::ClearDownloads,
            Command::ShowDownloadInFolder(_) => CommandChannel::ShowDownloadInFolder,
            Command::PermissionDecision(_) => CommandChannel::PermissionDecision,
            Command::ListPermissions(_) => CommandChannel::ListPermissions,
            Command::ClearPermissions(_) => CommandChannel::ClearPermissions,
            Command::SetPermission(_) => CommandChannel::SetPermission,
            Command::ClearSiteData(_) => CommandChannel::ClearSiteData,
            Command::SetSetting(_) => CommandChannel::SetSetting,
            Command::RequestSettings => CommandChannel::RequestSettings,
        }
    }

    pub fn payload(&self) -> Result<Value> {
        match self {
            Command::Navigate(p) => encode_payload(p),
            Command::Back(p) | Command::Forward(p) | Command::CloseTab(p) | Command::SetActiveTab(p) => {
                encode_payload(p)
            }
            Command::Reload(p) => encode_payload(p),
            Command::CreateTab(p) => encode_payload(p),
            Command::SetBounds(p) => encode_payload(p),
            Command::SetShadow(p) => encode_payload(p),
            Command::RequestHistory(p) => encode_payload(p),
            Command::PauseDownload(p)
            | Command::ResumeDownload(p)
            | Command::CancelDownload(p)
            | Command::ShowDownloadInFolder(p) => encode_payload(p),
            Command::ClearDownloads(p) => encode_payload(p),
            Command::PermissionDecision(p) => encode_payload(p),
            Command::ListPermissions(p) => encode_payload(p),
            Command::ClearPermissions(p) => encode_payload(p),
            Command::SetPermission(p) => encode_payload(p),
            Command::ClearSiteData(p) => encode_payload(p),
            Command::SetSetting(p) => encode_payload(p),
            Command::RequestTabList
            | Command::ClearHistory
            | Command::RequestDownloads
            | Command::RequestSettings => Ok(Value::Null),
        }
    }
}

impl Event {
    pub fn decode(channel: EventChannel, payload: Value) -> Result<Self> {
        let name = channel.name();
        let event = match channel {
            EventChannel::NavState => Event::NavState(decode_payload(name, payload)?),
            EventChannel::BrowserTabs => Event::BrowserTabs(decode_payload(name, payload)?),
            EventChannel::HistoryAppend => Event::HistoryAppend(decode_payload(name, payload)?),
            EventChannel::DownloadsUpdate => Event::DownloadsUpdate(decode_payload(name, payload)?),
            EventChannel::PermissionsPrompt => Event::PermissionsPrompt(decode_payload(name, payload)?),
            EventChannel::PermissionsState => Event::PermissionsState(decode_payload(name, payload)?),
            EventChannel::SettingsState => Event::SettingsState(decode_payload(name, payload)?),
        };
        Ok(event)
    }

    pub fn channel(&self) -> EventChannel {
        match self {
            Event::NavState(_) => EventChannel::NavState,
            Event::BrowserTabs(_) => EventChannel::BrowserTabs,
            Event::HistoryAppend(_) => EventChannel::HistoryAppend,
            Event::DownloadsUpdate(_) => EventChannel::DownloadsUpdate,
            Event::PermissionsPrompt(_) => EventChannel::PermissionsPrompt,
            Event::PermissionsState(_) => EventChannel::PermissionsState,
            Event::SettingsState(_) => EventChannel::SettingsState,
        }
    }

    pub fn payload(&self) -> Result<Value> {
        match self {
            Event::NavState(p) => encode_payload(p),
            Event::BrowserTabs(p) => encode_payload(p),
            Event::HistoryAppend(p) => encode_payload(p),
            Event::DownloadsUpdate(p) => encode_payload(p),
            Event::PermissionsPrompt(p) => encode_payload(p),
            Event::PermissionsState(p) => encode_payload(p),
            Event::SettingsState(p) => encode_payload(p),
        }
    }
}
