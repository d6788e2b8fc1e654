//! Address bar / router synchronization
//!
//! Two sources hold the current URL: the store (what the background says the
//! active tab shows) and the router (what the address bar or route says).
//! Each change is forwarded to the other side, one direction at a time. After
//! forwarding, the reverse direction stays closed for a cooldown window so
//! the echo of our own write is not bounced back.

use std::time::{Duration, Instant};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    StoreToRouter,
    RouterToStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Cooling { direction: SyncDirection, until: Instant },
}

#[derive(Debug, Clone)]
pub struct UrlSync {
    phase: Phase,
    cooldown: Duration,
    /// Last URL both sides agreed on
    current: Option<String>,
}

impl UrlSync {
    pub fn new() -> Self {
        Self::with_cooldown(DEFAULT_COOLDOWN)
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            cooldown,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Direction currently holding the lock, if the cooldown has not expired
    pub fn cooling(&self, now: Instant) -> Option<SyncDirection> {
        match self.phase {
            Phase::Cooling { direction, until } if now < until => Some(direction),
            _ => None,
        }
    }

    /// Store moved. Returns the URL the router should navigate to.
    pub fn store_changed(&mut self, url: &str, now: Instant) -> Option<String> {
        self.forward(SyncDirection::StoreToRouter, url, now)
    }

    /// Router moved. Returns the URL the store should be asked to load.
    pub fn router_changed(&mut self, url: &str, now: Instant) -> Option<String> {
        self.forward(SyncDirection::RouterToStore, url, now)
    }

    fn forward(&mut self, direction: SyncDirection, url: &str, now: Instant) -> Option<String> {
        if let Some(holding) = self.cooling(now) {
            if holding != direction {
                tracing::trace!(?direction, url, "Echo suppressed during cooldown");
                return None;
            }
        } else {
            self.phase = Phase::Idle;
        }

        if self.current.as_deref() == Some(url) {
            return None;
        }

        self.current = Some(url.to_string());
        self.phase = Phase::Cooling {
            direction,
            until: now + self.cooldown,
        };
        Some(url.to_string())
    }
}

impl Default for UrlSync {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_echo_is_not_bounced_back() {
        let start = Instant::now();
        let mut sync = UrlSync::new();

        assert_eq!(
            sync.store_changed("https://a.test/", start).as_deref(),
            Some("https://a.test/")
        );
        // Router reports a stale URL while our write lands
        assert_eq!(sync.router_changed("https://old.test/", start + 10 * MS), None);
        assert_eq!(sync.cooling(start + 10 * MS), Some(SyncDirection::StoreToRouter));

        // Same direction keeps flowing
        assert_eq!(
            sync.store_changed("https://a.test/next", start + 20 * MS).as_deref(),
            Some("https://a.test/next")
        );
    }

    #[test]
    fn test_reverse_direction_reopens_after_cooldown() {
        let start = Instant::now();
        let mut sync = UrlSync::with_cooldown(100 * MS);

        sync.store_changed("https://a.test/", start);
        assert_eq!(sync.router_changed("https://b.test/", start + 50 * MS), None);

        let later = start + 150 * MS;
        assert_eq!(sync.cooling(later), None);
        assert_eq!(
            sync.router_changed("https://b.test/", later).as_deref(),
            Some("https://b.test/")
        );
        assert_eq!(sync.cooling(later), Some(SyncDirection::RouterToStore));
        assert_eq!(sync.store_changed("https://a.test/", later + 10 * MS), None);
    }

    #[test]
    fn test_same_url_is_suppressed() {
        let start = Instant::now();
        let mut sync = UrlSync::with_cooldown(Duration::ZERO);

        assert!(sync.router_changed("https://a.test/", start).is_some());
        assert!(sync.store_changed("https://a.test/", start + MS).is_none());
        assert!(sync.router_changed("https://a.test/", start + 2 * MS).is_none());
        assert_eq!(sync.current(), Some("https://a.test/"));
    }

    proptest! {
        #[test]
        fn prop_one_direction_per_window(
            steps in proptest::collection::vec((any::<bool>(), 0u64..50, 0u8..4), 1..60)
        ) {
            let cooldown = 100 * MS;
            let mut sync = UrlSync::with_cooldown(cooldown);
            let mut now = Instant::now();
            let mut last: Option<(SyncDirection, Instant)> = None;

            for (from_store, gap, page) in steps {
                now += Duration::from_millis(gap);
                let url = format!("https://site.test/{page}");
                let (direction, out) = if from_store {
                    (SyncDirection::StoreToRouter, sync.store_changed(&url, now))
                } else {
                    (SyncDirection::RouterToStore, sync.router_changed(&url, now))
                };

                if out.is_some() {
                    if let Some((previous, at)) = last {
                        prop_assert!(previous == direction || now >= at + cooldown);
                    }
                    prop_assert_eq!(sync.current(), Some(url.as_str()));
                    last = Some((direction, now));
                }
            }
        }
    }
}
