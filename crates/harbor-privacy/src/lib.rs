//! Harbor Permission Store
//!
//! Permissions Model:
//! - Every capability is decided per origin
//! - Stored decisions are allow or deny; no stored row means ask
//! - Reset clears a single decision or everything for an origin

mod error;
mod origin;
mod permissions;
mod prompts;

pub use error::PrivacyError;
pub use origin::origin_of;
pub use permissions::{PermissionKind, PermissionSnapshot, PermissionState, PermissionStore, SitePermission};
pub use prompts::{PendingPrompts, PermissionPrompt};

pub type Result<T> = std::result::Result<T, PrivacyError>;
