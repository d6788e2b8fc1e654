//! Surfaces with no renderer behind them
//!
//! Used when the background runs without an embedded engine attached, and by
//! tests that need to see which commands reached a surface.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::ids::{SurfaceId, TabId};
use crate::surface::{Bounds, ContentSurface, SurfaceFactory, SurfaceOptions};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Created { tab: TabId, options: SurfaceOptions },
    Load(String),
    Back,
    Forward,
    Reload { ignore_cache: bool },
    Stop,
    SetBounds(Bounds),
    Close,
    ClearSiteData(String),
}

type CallLog = Arc<Mutex<Vec<(SurfaceId, SurfaceCall)>>>;

#[derive(Clone, Default)]
pub struct HeadlessFactory {
    next_id: u64,
    calls: CallLog,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made on this factory and the surfaces it created, in order.
    pub fn calls(&self) -> Vec<(SurfaceId, SurfaceCall)> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, surface: SurfaceId) -> Vec<SurfaceCall> {
        self.calls
            .lock()
            .iter()
            .filter(|(id, _)| *id == surface)
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Id of the most recently created surface
    pub fn last_surface(&self) -> Option<SurfaceId> {
        self.calls.lock().iter().rev().find_map(|(id, call)| match call {
            SurfaceCall::Created { .. } => Some(*id),
            _ => None,
        })
    }
}

impl SurfaceFactory for HeadlessFactory {
    fn create(&mut self, tab: TabId, options: &SurfaceOptions) -> Result<Box<dyn ContentSurface>> {
        self.next_id += 1;
        let id = SurfaceId(self.next_id);

        self.calls.lock().push((
            id,
            SurfaceCall::Created {
                tab,
                options: options.clone(),
            },
        ));

        Ok(Box::new(HeadlessSurface {
            id,
            calls: Arc::clone(&self.calls),
        }))
    }

    fn clear_site_data(&mut self, origin: &str) -> Result<()> {
        self.calls
            .lock()
            .push((SurfaceId(0), SurfaceCall::ClearSiteData(origin.to_string())));
        Ok(())
    }
}

struct HeadlessSurface {
    id: SurfaceId,
    calls: CallLog,
}

impl HeadlessSurface {
    fn record(&self, call: SurfaceCall) {
        tracing::trace!(surface = %self.id, ?call, "Headless surface call");
        self.calls.lock().push((self.id, call));
    }
}

impl ContentSurface for HeadlessSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn load(&mut self, url: &str) -> Result<()> {
        self.record(SurfaceCall::Load(url.to_string()));
        Ok(())
    }

    fn back(&mut self) -> Result<()> {
        self.record(SurfaceCall::Back);
        Ok(())
    }

    fn forward(&mut self) -> Result<()> {
        self.record(SurfaceCall::Forward);
        Ok(())
    }

    fn reload(&mut self, ignore_cache: bool) -> Result<()> {
        self.record(SurfaceCall::Reload { ignore_cache });
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.record(SurfaceCall::Stop);
        Ok(())
    }

    fn set_bounds(&mut self, bounds: Bounds) -> Result<()> {
        self.record(SurfaceCall::SetBounds(bounds));
        Ok(())
    }

    fn close(&mut self) {
        self.record(SurfaceCall::Close);
    }
}
