//! Content surface seam
//!
//! Rendering is done by an external engine. The registry drives it through
//! these traits and consumes the events it reports, which are tagged with
//! the surface's own id rather than the tab's.

use harbor_storage::Transition;
use serde::{Deserialize, Serialize};

use crate::ids::{SurfaceId, TabId};
use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceOptions {
    pub session_partition: String,
    pub incognito: bool,
    pub bounds: Bounds,
}

pub trait ContentSurface: Send {
    fn id(&self) -> SurfaceId;
    fn load(&mut self, url: &str) -> Result<()>;
    fn back(&mut self) -> Result<()>;
    fn forward(&mut self) -> Result<()>;
    fn reload(&mut self, ignore_cache: bool) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn set_bounds(&mut self, bounds: Bounds) -> Result<()>;
    fn close(&mut self);
}

pub trait SurfaceFactory: Send {
    fn create(&mut self, tab: TabId, options: &SurfaceOptions) -> Result<Box<dyn ContentSurface>>;

    /// Drops cookies, storage and cache for one origin across partitions.
    fn clear_site_data(&mut self, origin: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceEvent {
    pub surface: SurfaceId,
    pub kind: SurfaceEventKind,
}

impl SurfaceEvent {
    pub fn new(surface: SurfaceId, kind: SurfaceEventKind) -> Self {
        Self { surface, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SurfaceEventKind {
    LoadStarted {
        url: String,
    },
    #[serde(rename_all = "camelCase")]
    Committed {
        url: String,
        #[serde(default)]
        transition: Option<Transition>,
    },
    TitleChanged {
        title: String,
    },
    FaviconChanged {
        favicon: Option<String>,
    },
    LoadFinished,
    #[serde(rename_all = "camelCase")]
    LoadFailed {
        url: String,
        error: String,
        main_frame: bool,
    },
    #[serde(rename_all = "camelCase")]
    HistoryChanged {
        can_go_back: bool,
        can_go_forward: bool,
    },
}
