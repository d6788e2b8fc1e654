//! Harbor Core
//!
//! Background/control process for the browser shell. Owns tabs, downloads,
//! permissions and the store; UIs only ever see it through the channel hub.

mod background;
mod config;
mod crawler;
mod error;
mod revealer;

pub use background::{Background, BackgroundHandle, Input, DOWNLOAD_DIR_SETTING};
pub use config::{Config, CRAWL_ENDPOINT_ENV, DATA_DIR_ENV};
pub use crawler::{Crawler, HttpCrawler};
pub use error::CoreError;
pub use revealer::{FileRevealer, SystemRevealer};

// Re-export core components
pub use harbor_download::{DownloadControl, DownloadEvent, DownloadManager, NewDownload};
pub use harbor_ipc::{Command, Event, Hub, UiClient};
pub use harbor_privacy::{PermissionKind, PermissionState, PermissionStore};
pub use harbor_storage::{Database, Download, DownloadState, HistoryEntry, RetentionPolicy, StorageError};
pub use harbor_tabs::{HeadlessFactory, SurfaceEvent, SurfaceEventKind, SurfaceFactory, TabId, TabRegistry};

pub type Result<T> = std::result::Result<T, CoreError>;

pub const LOG_FORMAT_ENV: &str = "HARBOR_LOG_FORMAT";

/// Initialize logging
///
/// Logs go to stderr; stdout may be carrying frames. Calling this again is
/// a no-op.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let is_json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if is_json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
