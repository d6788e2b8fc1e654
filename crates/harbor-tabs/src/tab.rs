//! Tab data structure
//!
//! Tabs are session-only: they live as long as the background process and
//! are never written to the store. Only their committed navigations are.

use chrono::{DateTime, Utc};
use harbor_storage::Transition;

use crate::error::TabError;
use crate::ids::{SurfaceId, TabId};
use crate::state::LoadState;
use crate::surface::Bounds;
use crate::Result;

pub const DEFAULT_PARTITION: &str = "persist:default";

#[derive(Debug, Clone)]
pub struct Tab {
    pub id: TabId,
    pub surface_id: SurfaceId,
    /// Last committed URL, or the requested one before the first commit
    pub url: String,
    pub title: Option<String>,
    pub favicon: Option<String>,
    /// Mirrors the content surface's own session history
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub load: LoadState,
    pub error: Option<String>,
    pub session_partition: String,
    pub incognito: bool,
    /// Forward committed URLs to the crawl service
    pub shadow_crawl: bool,
    pub bounds: Bounds,

    /// Last URL that was requested or committed outside an error page.
    /// Failed loads are retried against it.
    pub last_good_url: Option<String>,
    pub retry_attempts: u32,
    /// Bumped by every user-initiated navigation; stale retries compare against it
    pub generation: u64,
    pub(crate) pending_transition: Option<Transition>,

    /// History row of the current page, for title backfill
    pub history_id: Option<i64>,
    pub visit_id: Option<i64>,
    pub committed_at: Option<DateTime<Utc>>,
}

impl Tab {
    pub fn new(id: TabId, surface_id: SurfaceId, session_partition: String, incognito: bool) -> Self {
        Self {
            id,
            surface_id,
            url: String::new(),
            title: None,
            favicon: None,
            can_go_back: false,
            can_go_forward: false,
            load: LoadState::Idle,
            error: None,
            session_partition,
            incognito,
            shadow_crawl: false,
            bounds: Bounds::default(),
            last_good_url: None,
            retry_attempts: 0,
            generation: 0,
            pending_transition: None,
            history_id: None,
            visit_id: None,
            committed_at: None,
        }
    }

    /// Attempt to move the load state machine
    pub fn transition_to(&mut self, next: LoadState) -> Result<()> {
        if !self.load.can_transition_to(next) {
            return Err(TabError::InvalidTransition {
                from: self.load.to_string(),
                to: next.to_string(),
            });
        }

        tracing::debug!(
            tab_id = %self.id,
            from = %self.load,
            to = %next,
            "Tab load transition"
        );

        self.load = next;
        Ok(())
    }

    /// A user-initiated navigation: resets retry bookkeeping and
    /// invalidates any retry still in flight.
    pub(crate) fn begin_navigation(&mut self, url: Option<&str>, transition: Transition) -> Result<()> {
        self.generation += 1;
        self.retry_attempts = 0;
        self.pending_transition = Some(transition);
        self.error = None;

        if let Some(url) = url {
            self.url = url.to_string();
            self.last_good_url = Some(url.to_string());
        }

        self.transition_to(LoadState::Loading)
    }

    pub(crate) fn finish_load(&mut self) -> Result<()> {
        self.transition_to(LoadState::Loaded)?;
        self.retry_attempts = 0;
        self.error = None;
        if is_navigable(&self.url) {
            self.last_good_url = Some(self.url.clone());
        }
        Ok(())
    }

    pub(crate) fn fail_load(&mut self, error: String) -> Result<()> {
        self.transition_to(LoadState::Error)?;
        self.error = Some(error);
        Ok(())
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.url,
        }
    }
}

/// Accepts absolute URLs, and bare hosts which get an https scheme.
pub fn normalize_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TabError::InvalidUrl("URL cannot be empty".to_string()));
    }

    if let Ok(parsed) = url::Url::parse(trimmed) {
        return Ok(parsed.to_string());
    }

    if !trimmed.contains(char::is_whitespace) && trimmed.contains('.') {
        if let Ok(parsed) = url::Url::parse(&format!("https://{trimmed}")) {
            return Ok(parsed.to_string());
        }
    }

    Err(TabError::InvalidUrl(trimmed.to_string()))
}

/// URLs a retry may target; engine error pages are not among them.
pub(crate) fn is_navigable(url: &str) -> bool {
    url::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https" | "file" | "about"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab() -> Tab {
        Tab::new(TabId(1), SurfaceId(1), DEFAULT_PARTITION.to_string(), false)
    }

    #[test]
    fn test_new_tab_is_idle() {
        let tab = tab();
        assert_eq!(tab.load, LoadState::Idle);
        assert!(!tab.can_go_back);
        assert_eq!(tab.display_title(), "");
    }

    #[test]
    fn test_navigation_resets_retry_and_bumps_generation() {
        let mut tab = tab();
        tab.retry_attempts = 1;
        tab.error = Some("net::ERR_FAILED".to_string());

        tab.begin_navigation(Some("https://example.com/"), Transition::Typed)
            .unwrap();

        assert_eq!(tab.load, LoadState::Loading);
        assert_eq!(tab.retry_attempts, 0);
        assert_eq!(tab.generation, 1);
        assert!(tab.error.is_none());
        assert_eq!(tab.last_good_url.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn test_finish_after_failure_is_rejected() {
        let mut tab = tab();
        tab.begin_navigation(Some("https://example.com/"), Transition::Typed)
            .unwrap();
        tab.fail_load("timeout".to_string()).unwrap();

        assert!(tab.finish_load().is_err());
        assert_eq!(tab.load, LoadState::Error);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("https://example.com").unwrap(), "https://example.com/");
        assert_eq!(normalize_url("example.com").unwrap(), "https://example.com/");
        assert_eq!(normalize_url("about:blank").unwrap(), "about:blank");
        assert!(normalize_url("   ").is_err());
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_error_pages_are_not_navigable() {
        assert!(is_navigable("https://example.com/"));
        assert!(!is_navigable("chrome-error://chromewebdata/"));
        assert!(!is_navigable(""));
    }
}
