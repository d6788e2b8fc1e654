//! Harbor Message Channels
//!
//! The only transport between the background process and UI processes.
//! Channel names are checked against a fixed allow-list in each direction
//! before any payload is decoded; names outside it are dropped without
//! error so that mismatched versions degrade instead of failing.

mod channel;
mod client;
mod error;
mod frame;
mod hub;
mod message;
mod payload;
mod result;

pub use channel::{CommandChannel, EventChannel};
pub use client::{Subscription, UiClient};
pub use error::IpcError;
pub use frame::{EventFrame, RequestFrame, ResponseFrame, UiFrame};
pub use hub::{ClientConnection, ClientId, Hub, Request, RequestReceiver, RequestSender};
pub use message::{Command, Event};
pub use payload::{
    CreateTabRequest, DownloadTarget, DownloadUpdate, DownloadsClear, HistoryQuery, NavigateRequest,
    PermissionClear, PermissionDecision, PermissionQuery, PermissionSet, ReloadRequest, SetBoundsRequest,
    SetShadowRequest, SettingSet, SettingsSnapshot, SiteDataClear, TabTarget,
};
pub use result::CommandResult;

pub type Result<T> = std::result::Result<T, IpcError>;
