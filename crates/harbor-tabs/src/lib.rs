//! Harbor Tab Registry
//!
//! The background process is the single authority over open tabs. The
//! registry owns every tab's content surface, its load state and the
//! active-tab pointer, and persists committed navigations.

mod error;
mod headless;
mod ids;
mod registry;
mod retry;
mod snapshot;
mod state;
mod surface;
mod tab;

pub use error::TabError;
pub use headless::{HeadlessFactory, SurfaceCall};
pub use ids::{SurfaceId, TabId};
pub use registry::{CreateTab, TabChange, TabRegistry};
pub use retry::{RetryPolicy, RetryTicket};
pub use snapshot::{NavState, TabList, TabSummary};
pub use state::LoadState;
pub use surface::{Bounds, ContentSurface, SurfaceEvent, SurfaceEventKind, SurfaceFactory, SurfaceOptions};
pub use tab::Tab;

pub type Result<T> = std::result::Result<T, TabError>;
