//! Tab Registry
//!
//! Arena of open tabs keyed by `TabId`, with a separate index from content
//! surface ids back to their owning tab. The background event loop owns the
//! registry exclusively, so commands and surface events for a tab are
//! applied in the order they arrive.

use std::collections::HashMap;

use chrono::Utc;
use harbor_storage::{Database, HistoryEntry, NewNavigation, Transition};

use crate::error::TabError;
use crate::ids::{SurfaceId, TabId};
use crate::retry::{RetryPolicy, RetryTicket};
use crate::snapshot::{NavState, TabList};
use crate::state::LoadState;
use crate::surface::{Bounds, ContentSurface, SurfaceEvent, SurfaceEventKind, SurfaceFactory, SurfaceOptions};
use crate::tab::{is_navigable, normalize_url, Tab, DEFAULT_PARTITION};
use crate::Result;

pub const DEFAULT_HOMEPAGE: &str = "about:blank";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTab {
    pub url: Option<String>,
    pub session_partition: Option<String>,
    pub incognito: bool,
    pub shadow_crawl: bool,
    /// Make the new tab active. The first tab is always activated.
    pub activate: bool,
}

impl CreateTab {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            activate: true,
            ..Self::default()
        }
    }
}

/// Side effects of a surface event that the caller must carry out.
#[derive(Debug, Clone, PartialEq)]
pub struct TabChange {
    pub tab_id: TabId,
    /// Newly recorded history row, to broadcast
    pub history: Option<HistoryEntry>,
    /// Committed URL to hand to the crawl service
    pub crawl: Option<String>,
    /// Reload to schedule after the policy delay
    pub retry: Option<RetryTicket>,
}

impl TabChange {
    fn new(tab_id: TabId) -> Self {
        Self {
            tab_id,
            history: None,
            crawl: None,
            retry: None,
        }
    }
}

struct TabSlot {
    tab: Tab,
    surface: Box<dyn ContentSurface>,
}

pub struct TabRegistry {
    db: Database,
    factory: Box<dyn SurfaceFactory>,
    retry_policy: RetryPolicy,
    homepage: String,
    order: Vec<TabId>,
    slots: HashMap<TabId, TabSlot>,
    surfaces: HashMap<SurfaceId, TabId>,
    active: Option<TabId>,
    next_id: u64,
}

impl TabRegistry {
    pub fn new(db: Database, factory: Box<dyn SurfaceFactory>) -> Self {
        Self {
            db,
            factory,
            retry_policy: RetryPolicy::default(),
            homepage: DEFAULT_HOMEPAGE.to_string(),
            order: Vec::new(),
            slots: HashMap::new(),
            surfaces: HashMap::new(),
            active: None,
            next_id: 0,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = homepage.into();
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Create a new tab and start loading its first page
    pub fn create(&mut self, request: CreateTab) -> Result<Tab> {
        let url = match request.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => normalize_url(url)?,
            _ => self.homepage.clone(),
        };

        self.next_id += 1;
        let id = TabId(self.next_id);

        let partition = request
            .session_partition
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PARTITION.to_string());
        let options = SurfaceOptions {
            session_partition: partition.clone(),
            incognito: request.incognito,
            bounds: Bounds::default(),
        };

        let mut surface = self.factory.create(id, &options)?;
        let mut tab = Tab::new(id, surface.id(), partition, request.incognito);
        tab.shadow_crawl = request.shadow_crawl;

        surface.load(&url)?;
        tab.begin_navigation(Some(&url), Transition::Typed)?;

        self.surfaces.insert(tab.surface_id, id);
        self.order.push(id);
        self.slots.insert(id, TabSlot { tab: tab.clone(), surface });

        if request.activate || self.active.is_none() {
            self.active = Some(id);
        }

        tracing::info!(
            tab_id = %id,
            surface = %tab.surface_id,
            url = %url,
            incognito = tab.incognito,
            "Created new tab"
        );

        Ok(tab)
    }

    /// Close a tab. Returns the tab that is active afterwards.
    pub fn close(&mut self, tab_id: TabId) -> Result<Option<TabId>> {
        let mut slot = self.slots.remove(&tab_id).ok_or(TabError::NotFound(tab_id))?;
        slot.surface.close();
        self.surfaces.remove(&slot.tab.surface_id);

        let index = self.order.iter().position(|id| *id == tab_id);
        self.order.retain(|id| *id != tab_id);

        if self.active == Some(tab_id) {
            // Neighbour that slid into the closed tab's position, else the last tab
            self.active = index
                .and_then(|i| self.order.get(i).copied())
                .or_else(|| self.order.last().copied());
        }

        if !slot.tab.incognito {
            self.close_visit(&slot.tab);
        }

        tracing::info!(tab_id = %tab_id, active = ?self.active, "Closed tab");

        Ok(self.active)
    }

    pub fn set_active(&mut self, tab_id: TabId) -> Result<()> {
        if !self.slots.contains_key(&tab_id) {
            return Err(TabError::NotFound(tab_id));
        }
        if self.active != Some(tab_id) {
            tracing::debug!(tab_id = %tab_id, "Activated tab");
            self.active = Some(tab_id);
        }
        Ok(())
    }

    pub fn navigate(&mut self, tab_id: TabId, url: &str) -> Result<Tab> {
        let url = normalize_url(url)?;
        let slot = self.slot_mut(tab_id)?;

        slot.surface.load(&url)?;
        slot.tab.begin_navigation(Some(&url), Transition::Typed)?;

        tracing::info!(tab_id = %tab_id, url = %url, "Navigating tab");
        Ok(slot.tab.clone())
    }

    /// Returns false without touching the surface when there is nothing to go back to.
    pub fn back(&mut self, tab_id: TabId) -> Result<bool> {
        let slot = self.slot_mut(tab_id)?;
        if !slot.tab.can_go_back {
            return Ok(false);
        }

        slot.surface.back()?;
        slot.tab.begin_navigation(None, Transition::BackForward)?;
        Ok(true)
    }

    pub fn forward(&mut self, tab_id: TabId) -> Result<bool> {
        let slot = self.slot_mut(tab_id)?;
        if !slot.tab.can_go_forward {
            return Ok(false);
        }

        slot.surface.forward()?;
        slot.tab.begin_navigation(None, Transition::BackForward)?;
        Ok(true)
    }

    pub fn reload(&mut self, tab_id: TabId, ignore_cache: bool) -> Result<()> {
        let slot = self.slot_mut(tab_id)?;

        slot.surface.reload(ignore_cache)?;
        slot.tab.begin_navigation(None, Transition::Reload)?;
        Ok(())
    }

    pub fn stop(&mut self, tab_id: TabId) -> Result<()> {
        let slot = self.slot_mut(tab_id)?;
        slot.surface.stop()
    }

    pub fn set_bounds(&mut self, tab_id: TabId, bounds: Bounds) -> Result<()> {
        let slot = self.slot_mut(tab_id)?;
        if slot.tab.bounds == bounds {
            return Ok(());
        }

        slot.surface.set_bounds(bounds)?;
        slot.tab.bounds = bounds;
        Ok(())
    }

    pub fn set_shadow(&mut self, tab_id: TabId, enabled: bool) -> Result<()> {
        let slot = self.slot_mut(tab_id)?;
        slot.tab.shadow_crawl = enabled;

        tracing::info!(tab_id = %tab_id, enabled, "Shadow crawl toggled");
        Ok(())
    }

    pub fn clear_site_data(&mut self, origin: &str) -> Result<()> {
        self.factory.clear_site_data(origin)?;
        tracing::info!(origin = %origin, "Cleared site data");
        Ok(())
    }

    pub fn get(&self, tab_id: TabId) -> Result<&Tab> {
        self.slots
            .get(&tab_id)
            .map(|slot| &slot.tab)
            .ok_or(TabError::NotFound(tab_id))
    }

    /// Open tabs in strip order
    pub fn tabs(&self) -> Vec<&Tab> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(id).map(|slot| &slot.tab))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn active(&self) -> Option<TabId> {
        self.active
    }

    pub fn tab_for_surface(&self, surface: SurfaceId) -> Option<TabId> {
        self.surfaces.get(&surface).copied()
    }

    pub fn snapshot(&self) -> TabList {
        TabList {
            tabs: self.tabs().into_iter().map(Tab::summary).collect(),
            active_tab_id: self.active,
        }
    }

    pub fn nav_state(&self, tab_id: TabId) -> Result<NavState> {
        let tab = self.get(tab_id)?;
        Ok(tab.nav_state(self.active == Some(tab_id)))
    }

    /// Apply an event reported by a content surface.
    ///
    /// Events from surfaces that no longer belong to a tab are dropped and
    /// yield `None`, as do out-of-order load events the state machine rejects.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) -> Result<Option<TabChange>> {
        let Some(tab_id) = self.tab_for_surface(event.surface) else {
            tracing::debug!(surface = %event.surface, "Event for unknown surface");
            return Ok(None);
        };

        let mut change = TabChange::new(tab_id);

        match event.kind {
            SurfaceEventKind::LoadStarted { url } => {
                let slot = self.slot_mut(tab_id)?;
                if slot.tab.load.is_loading() {
                    return Ok(Some(change));
                }
                // Navigation started inside the page (link click)
                if is_navigable(&url) {
                    slot.tab.last_good_url = Some(url);
                }
                slot.tab.pending_transition.get_or_insert(Transition::Link);
                slot.tab.error = None;
                slot.tab.transition_to(LoadState::Loading)?;
            }
            SurfaceEventKind::Committed { url, transition } => {
                change.history = self.commit(tab_id, url, transition)?;
                let tab = self.get(tab_id)?;
                if tab.shadow_crawl && !tab.incognito {
                    change.crawl = Some(tab.url.clone());
                }
            }
            SurfaceEventKind::TitleChanged { title } => {
                let slot = self.slot_mut(tab_id)?;
                let title = title.trim().to_string();
                slot.tab.title = (!title.is_empty()).then(|| title.clone());

                if let (Some(history_id), false) = (slot.tab.history_id, title.is_empty()) {
                    self.db.update_history_title(history_id, &title)?;
                }
            }
            SurfaceEventKind::FaviconChanged { favicon } => {
                self.slot_mut(tab_id)?.tab.favicon = favicon;
            }
            SurfaceEventKind::LoadFinished => {
                let slot = self.slot_mut(tab_id)?;
                if let Err(e) = slot.tab.finish_load() {
                    tracing::debug!(tab_id = %tab_id, error = %e, "Ignoring late load completion");
                    return Ok(None);
                }
                slot.tab.pending_transition = None;
            }
            SurfaceEventKind::LoadFailed { url, error, main_frame } => {
                if !main_frame {
                    return Ok(None);
                }
                change.retry = self.fail(tab_id, &url, error)?;
            }
            SurfaceEventKind::HistoryChanged {
                can_go_back,
                can_go_forward,
            } => {
                let slot = self.slot_mut(tab_id)?;
                slot.tab.can_go_back = can_go_back;
                slot.tab.can_go_forward = can_go_forward;
            }
        }

        Ok(Some(change))
    }

    /// Carry out a scheduled retry. Returns false when the ticket went stale.
    pub fn retry(&mut self, ticket: &RetryTicket) -> Result<bool> {
        let Ok(slot) = self.slot_mut(ticket.tab_id) else {
            tracing::debug!(tab_id = %ticket.tab_id, "Dropping retry for closed tab");
            return Ok(false);
        };

        if slot.tab.generation != ticket.generation || slot.tab.load != LoadState::Error {
            tracing::debug!(tab_id = %ticket.tab_id, "Dropping stale retry");
            return Ok(false);
        }

        slot.surface.load(&ticket.url)?;
        slot.tab.error = None;
        slot.tab.url = ticket.url.clone();
        slot.tab.transition_to(LoadState::Loading)?;

        tracing::info!(
            tab_id = %ticket.tab_id,
            url = %ticket.url,
            attempt = slot.tab.retry_attempts,
            "Retrying failed load"
        );
        Ok(true)
    }

    fn commit(
        &mut self,
        tab_id: TabId,
        url: String,
        transition: Option<Transition>,
    ) -> Result<Option<HistoryEntry>> {
        let previous = self.get(tab_id)?.clone();
        let transition = transition
            .or(previous.pending_transition)
            .unwrap_or(Transition::Link);

        {
            let slot = self.slot_mut(tab_id)?;
            slot.tab.url = url.clone();
            slot.tab.title = None;
            slot.tab.favicon = None;
            slot.tab.pending_transition = None;
            slot.tab.committed_at = Some(Utc::now());
            if is_navigable(&url) {
                slot.tab.last_good_url = Some(url.clone());
            }
        }

        if previous.incognito {
            return Ok(None);
        }

        self.close_visit(&previous);

        let mut nav = NewNavigation::new(url).transition(transition);
        if transition == Transition::Link && !previous.url.is_empty() {
            nav = nav.referrer(previous.url.clone());
        }

        let entry = self.db.record_navigation(&nav)?;

        let slot = self.slot_mut(tab_id)?;
        slot.tab.history_id = Some(entry.id);
        slot.tab.visit_id = entry.visit_id;

        tracing::debug!(tab_id = %tab_id, history_id = entry.id, "Recorded navigation");
        Ok(Some(entry))
    }

    fn fail(&mut self, tab_id: TabId, url: &str, error: String) -> Result<Option<RetryTicket>> {
        let policy = self.retry_policy.clone();
        let slot = self.slot_mut(tab_id)?;

        if let Err(e) = slot.tab.fail_load(error.clone()) {
            tracing::debug!(tab_id = %tab_id, error = %e, "Ignoring late load failure");
            return Ok(None);
        }

        tracing::warn!(tab_id = %tab_id, url = %url, error = %error, "Main-frame load failed");

        if !policy.allows(slot.tab.retry_attempts) {
            return Ok(None);
        }

        let target = slot
            .tab
            .last_good_url
            .clone()
            .or_else(|| is_navigable(url).then(|| url.to_string()));
        let Some(target) = target else {
            return Ok(None);
        };

        slot.tab.retry_attempts += 1;
        Ok(Some(RetryTicket {
            tab_id,
            url: target,
            generation: slot.tab.generation,
            delay: policy.delay,
        }))
    }

    /// Backfill how long the tab's current visit lasted.
    fn close_visit(&self, tab: &Tab) {
        let (Some(visit_id), Some(committed_at)) = (tab.visit_id, tab.committed_at) else {
            return;
        };

        let duration = (Utc::now() - committed_at).num_milliseconds().max(0);
        if let Err(e) = self.db.set_visit_duration(visit_id, duration) {
            tracing::warn!(tab_id = %tab.id, error = %e, "Failed to store visit duration");
        }
    }

    fn slot_mut(&mut self, tab_id: TabId) -> Result<&mut TabSlot> {
        self.slots.get_mut(&tab_id).ok_or(TabError::NotFound(tab_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessFactory, SurfaceCall};

    fn registry() -> (TabRegistry, HeadlessFactory, Database) {
        let db = Database::open_in_memory().unwrap();
        let factory = HeadlessFactory::new();
        let registry = TabRegistry::new(db.clone(), Box::new(factory.clone()));
        (registry, factory, db)
    }

    fn event(registry: &TabRegistry, tab: TabId, kind: SurfaceEventKind) -> SurfaceEvent {
        SurfaceEvent::new(registry.get(tab).unwrap().surface_id, kind)
    }

    fn load(registry: &mut TabRegistry, tab: TabId, url: &str) {
        let commit = event(
            registry,
            tab,
            SurfaceEventKind::Committed {
                url: url.to_string(),
                transition: None,
            },
        );
        registry.handle_surface_event(commit).unwrap();
        let finish = event(registry, tab, SurfaceEventKind::LoadFinished);
        registry.handle_surface_event(finish).unwrap();
    }

    #[test]
    fn test_create_loads_and_activates() {
        let (mut registry, factory, _db) = registry();

        let tab = registry.create(CreateTab::url("https://example.com")).unwrap();
        assert_eq!(tab.load, LoadState::Loading);
        assert_eq!(registry.active(), Some(tab.id));
        assert_eq!(
            factory.calls_for(tab.surface_id).last(),
            Some(&SurfaceCall::Load("https://example.com/".to_string()))
        );

        let background = registry
            .create(CreateTab {
                url: Some("https://rust-lang.org".to_string()),
                ..CreateTab::default()
            })
            .unwrap();
        assert_eq!(registry.active(), Some(tab.id));
        assert_ne!(background.id, tab.id);
    }

    #[test]
    fn test_create_without_url_opens_homepage() {
        let (registry, _factory, _db) = registry();
        let mut registry = registry.with_homepage("https://start.test/");

        let tab = registry.create(CreateTab::default()).unwrap();
        assert_eq!(tab.url, "https://start.test/");
        assert_eq!(registry.active(), Some(tab.id));
    }

    #[test]
    fn test_close_activates_neighbour() {
        let (mut registry, factory, _db) = registry();
        let a = registry.create(CreateTab::url("https://a.test")).unwrap().id;
        let b = registry.create(CreateTab::url("https://b.test")).unwrap().id;
        let c = registry.create(CreateTab::url("https://c.test")).unwrap().id;

        registry.set_active(b).unwrap();
        assert_eq!(registry.close(b).unwrap(), Some(c));
        assert_eq!(registry.close(c).unwrap(), Some(a));
        assert_eq!(registry.close(a).unwrap(), None);
        assert!(registry.is_empty());

        assert!(matches!(registry.close(a), Err(TabError::NotFound(_))));
        assert!(factory
            .calls()
            .iter()
            .filter(|(_, call)| *call == SurfaceCall::Close)
            .count()
            == 3);
    }

    #[test]
    fn test_commit_records_history_and_backfills_title() {
        let (mut registry, _factory, db) = registry();
        let tab = registry.create(CreateTab::url("https://example.com")).unwrap().id;

        let commit = event(
            &registry,
            tab,
            SurfaceEventKind::Committed {
                url: "https://example.com/".to_string(),
                transition: None,
            },
        );
        let change = registry.handle_surface_event(commit).unwrap().unwrap();
        let entry = change.history.unwrap();
        assert_eq!(entry.transition, Some(Transition::Typed));

        let title = event(
            &registry,
            tab,
            SurfaceEventKind::TitleChanged {
                title: "Example Domain".to_string(),
            },
        );
        registry.handle_surface_event(title).unwrap();

        let stored = db.get_history_entry(entry.id).unwrap().unwrap();
        assert_eq!(stored.title.as_deref(), Some("Example Domain"));
    }

    #[test]
    fn test_incognito_commits_are_not_recorded() {
        let (mut registry, _factory, db) = registry();
        let tab = registry
            .create(CreateTab {
                url: Some("https://private.test".to_string()),
                incognito: true,
                shadow_crawl: true,
                activate: true,
                ..CreateTab::default()
            })
            .unwrap()
            .id;

        let commit = event(
            &registry,
            tab,
            SurfaceEventKind::Committed {
                url: "https://private.test/".to_string(),
                transition: None,
            },
        );
        let change = registry.handle_surface_event(commit).unwrap().unwrap();

        assert!(change.history.is_none());
        assert!(change.crawl.is_none());
        assert_eq!(db.history_count().unwrap(), 0);
    }

    #[test]
    fn test_shadow_flag_requests_crawl() {
        let (mut registry, _factory, _db) = registry();
        let tab = registry.create(CreateTab::url("https://a.test")).unwrap().id;
        registry.set_shadow(tab, true).unwrap();

        let commit = event(
            &registry,
            tab,
            SurfaceEventKind::Committed {
                url: "https://a.test/".to_string(),
                transition: None,
            },
        );
        let change = registry.handle_surface_event(commit).unwrap().unwrap();
        assert_eq!(change.crawl.as_deref(), Some("https://a.test/"));
    }

    #[test]
    fn test_unknown_surface_is_ignored() {
        let (mut registry, _factory, _db) = registry();
        let change = registry
            .handle_surface_event(SurfaceEvent::new(SurfaceId(99), SurfaceEventKind::LoadFinished))
            .unwrap();
        assert!(change.is_none());
    }

    #[test]
    fn test_failed_load_retries_once_with_last_good_url() {
        let (mut registry, factory, _db) = registry();
        let tab = registry.create(CreateTab::url("https://a.test")).unwrap().id;
        load(&mut registry, tab, "https://a.test/");

        registry.navigate(tab, "https://b.test").unwrap();
        let failed = event(
            &registry,
            tab,
            SurfaceEventKind::LoadFailed {
                url: "chrome-error://chromewebdata/".to_string(),
                error: "net::ERR_NAME_NOT_RESOLVED".to_string(),
                main_frame: true,
            },
        );
        let ticket = registry
            .handle_surface_event(failed.clone())
            .unwrap()
            .unwrap()
            .retry
            .unwrap();
        assert_eq!(ticket.url, "https://b.test/");
        assert_eq!(registry.get(tab).unwrap().load, LoadState::Error);

        assert!(registry.retry(&ticket).unwrap());
        let surface = registry.get(tab).unwrap().surface_id;
        assert_eq!(
            factory.calls_for(surface).last(),
            Some(&SurfaceCall::Load("https://b.test/".to_string()))
        );

        // Second failure sticks
        let change = registry.handle_surface_event(failed).unwrap().unwrap();
        assert!(change.retry.is_none());
        let state = registry.nav_state(tab).unwrap();
        assert_eq!(state.error.as_deref(), Some("net::ERR_NAME_NOT_RESOLVED"));
        assert!(!state.is_loading);
    }

    #[test]
    fn test_stale_retry_is_dropped() {
        let (mut registry, _factory, _db) = registry();
        let tab = registry.create(CreateTab::url("https://a.test")).unwrap().id;

        let failed = event(
            &registry,
            tab,
            SurfaceEventKind::LoadFailed {
                url: "https://a.test/".to_string(),
                error: "timeout".to_string(),
                main_frame: true,
            },
        );
        let ticket = registry.handle_surface_event(failed).unwrap().unwrap().retry.unwrap();

        registry.navigate(tab, "https://elsewhere.test").unwrap();
        assert!(!registry.retry(&ticket).unwrap());

        registry.close(tab).unwrap();
        assert!(!registry.retry(&ticket).unwrap());
    }

    #[test]
    fn test_subframe_failure_is_ignored() {
        let (mut registry, _factory, _db) = registry();
        let tab = registry.create(CreateTab::url("https://a.test")).unwrap().id;

        let failed = event(
            &registry,
            tab,
            SurfaceEventKind::LoadFailed {
                url: "https://ads.test/frame".to_string(),
                error: "blocked".to_string(),
                main_frame: false,
            },
        );
        assert!(registry.handle_surface_event(failed).unwrap().is_none());
        assert_eq!(registry.get(tab).unwrap().load, LoadState::Loading);
    }

    #[test]
    fn test_back_follows_surface_history() {
        let (mut registry, factory, _db) = registry();
        let tab = registry.create(CreateTab::url("https://a.test")).unwrap().id;

        assert!(!registry.back(tab).unwrap());

        let changed = event(
            &registry,
            tab,
            SurfaceEventKind::HistoryChanged {
                can_go_back: true,
                can_go_forward: false,
            },
        );
        registry.handle_surface_event(changed).unwrap();

        assert!(registry.back(tab).unwrap());
        let surface = registry.get(tab).unwrap().surface_id;
        assert_eq!(factory.calls_for(surface).last(), Some(&SurfaceCall::Back));
        assert!(!registry.forward(tab).unwrap());
    }

    #[test]
    fn test_snapshot_shape() {
        let (mut registry, _factory, _db) = registry();
        let tab = registry.create(CreateTab::url("https://a.test")).unwrap().id;
        load(&mut registry, tab, "https://a.test/");

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.active_tab_id, Some(tab));
        assert_eq!(snapshot.tabs.len(), 1);
        assert!(!snapshot.tabs[0].is_loading);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["activeTabId"], serde_json::json!(tab.0));
        assert_eq!(json["tabs"][0]["url"], "https://a.test/");
        assert!(json["tabs"][0].get("title").is_none());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let (mut registry, _factory, _db) = registry();
        let tab = registry.create(CreateTab::url("https://a.test")).unwrap().id;
        assert!(matches!(
            registry.navigate(tab, "   "),
            Err(TabError::InvalidUrl(_))
        ));
    }
}
