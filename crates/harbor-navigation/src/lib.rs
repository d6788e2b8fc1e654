//! Harbor Navigation History
//!
//! Client-side back/forward stacks, one per tab, rebuilt from the url
//! stream the background broadcasts. Never persisted.

mod stack;
mod tabs;

pub use stack::{NavHistory, NavMove};
pub use tabs::TabHistories;
