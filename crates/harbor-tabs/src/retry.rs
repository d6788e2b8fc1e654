//! Bounded retry of failed main-frame loads

use std::time::Duration;

use crate::ids::TabId;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Retries allowed per failed navigation before the error sticks
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
            max_attempts: 1,
        }
    }
}

impl RetryPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    pub fn allows(&self, attempts_so_far: u32) -> bool {
        attempts_so_far < self.max_attempts
    }
}

/// A scheduled reload. `generation` pins it to the navigation that failed;
/// if the tab has navigated since, the ticket is stale and gets dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryTicket {
    pub tab_id: TabId,
    pub url: String,
    pub generation: u64,
    pub delay: Duration,
}
