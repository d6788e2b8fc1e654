//! Background service
//!
//! One task owns the tab registry, the download manager and the permission
//! store. UI commands and collaborator reports are pulled from two queues
//! and applied one at a time, so nothing for a given tab is ever reordered.
//! Every state change is persisted first, then broadcast.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use harbor_download::{DownloadEvent, DownloadManager};
use harbor_ipc::{
    ClientConnection, Command, CommandResult, DownloadUpdate, Event, Hub, PermissionClear,
    PermissionDecision, Request, RequestReceiver,
};
use harbor_privacy::{origin_of, PendingPrompts, PermissionKind, PermissionState, PermissionStore};
use harbor_storage::{Database, Download};
use harbor_tabs::{CreateTab, RetryPolicy, RetryTicket, SurfaceEvent, SurfaceFactory, TabChange, TabId, TabRegistry};

use crate::config::Config;
use crate::crawler::{Crawler, HttpCrawler};
use crate::error::CoreError;
use crate::revealer::{FileRevealer, SystemRevealer};
use crate::Result;

pub const DOWNLOAD_DIR_SETTING: &str = "downloads.directory";

/// Reports from collaborators outside the UI
#[derive(Debug)]
pub enum Input {
    Surface(SurfaceEvent),
    Download(DownloadEvent),
    /// A page asked for a capability; the reply carries the verdict
    Permission {
        origin: String,
        permission: PermissionKind,
        reply: oneshot::Sender<bool>,
    },
    Retry(RetryTicket),
    Shutdown,
}

/// Cloneable entry point into a running background service
#[derive(Clone)]
pub struct BackgroundHandle {
    hub: Hub,
    inputs: mpsc::UnboundedSender<Input>,
}

impl BackgroundHandle {
    pub fn connect(&self) -> ClientConnection {
        self.hub.connect()
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn surface_event(&self, event: SurfaceEvent) -> Result<()> {
        self.send(Input::Surface(event))
    }

    pub fn download_event(&self, event: DownloadEvent) -> Result<()> {
        self.send(Input::Download(event))
    }

    /// Resolves once a stored decision applies or the user answers a prompt.
    pub async fn request_permission(&self, origin: &str, permission: PermissionKind) -> Result<bool> {
        let (reply, verdict) = oneshot::channel();
        self.send(Input::Permission {
            origin: origin.to_string(),
            permission,
            reply,
        })?;
        verdict.await.map_err(|_| CoreError::Stopped)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Input::Shutdown)
    }

    fn send(&self, input: Input) -> Result<()> {
        self.inputs.send(input).map_err(|_| CoreError::Stopped)
    }
}

pub struct Background {
    db: Database,
    registry: TabRegistry,
    downloads: DownloadManager,
    permissions: PermissionStore,
    prompts: PendingPrompts<oneshot::Sender<bool>>,
    hub: Hub,
    requests: RequestReceiver,
    inputs: mpsc::UnboundedReceiver<Input>,
    inputs_tx: mpsc::UnboundedSender<Input>,
    crawler: Option<Arc<dyn Crawler>>,
    revealer: Arc<dyn FileRevealer>,
}

impl Background {
    pub fn new(db: Database, factory: Box<dyn SurfaceFactory>) -> Result<(Self, BackgroundHandle)> {
        let downloads = DownloadManager::new(db.clone());
        downloads.load()?;

        let (hub, requests) = Hub::new();
        let (inputs_tx, inputs) = mpsc::unbounded_channel();

        let handle = BackgroundHandle {
            hub: hub.clone(),
            inputs: inputs_tx.clone(),
        };

        let background = Self {
            registry: TabRegistry::new(db.clone(), factory),
            permissions: PermissionStore::new(db.clone()),
            prompts: PendingPrompts::new(),
            db,
            downloads,
            hub,
            requests,
            inputs,
            inputs_tx,
            crawler: None,
            revealer: Arc::new(SystemRevealer),
        };

        Ok((background, handle))
    }

    /// Open the store described by `config` and wire every collaborator it names
    pub fn from_config(config: &Config, factory: Box<dyn SurfaceFactory>) -> Result<(Self, BackgroundHandle)> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open_with(&config.database_path, config.retention.clone())?;
        if db.get_setting::<Value>(DOWNLOAD_DIR_SETTING)?.is_none() {
            db.set_setting(DOWNLOAD_DIR_SETTING, &config.download_dir)?;
        }

        let (mut background, handle) = Self::new(db, factory)?;
        background = background
            .with_retry_policy(config.retry_policy())
            .with_homepage(config.homepage.clone());

        if let Some(endpoint) = &config.crawl_endpoint {
            background = background.with_crawler(Arc::new(HttpCrawler::new(endpoint.clone())?));
            tracing::info!(endpoint = %endpoint, "Shadow crawl enabled");
        }

        tracing::info!(database = %config.database_path.display(), "Background initialized");
        Ok((background, handle))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.registry = self.registry.with_retry_policy(policy);
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.registry = self.registry.with_homepage(homepage);
        self
    }

    pub fn with_crawler(mut self, crawler: Arc<dyn Crawler>) -> Self {
        self.crawler = Some(crawler);
        self
    }

    pub fn with_revealer(mut self, revealer: Arc<dyn FileRevealer>) -> Self {
        self.revealer = revealer;
        self
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    pub fn downloads(&self) -> &DownloadManager {
        &self.downloads
    }

    /// Process requests and inputs until shutdown
    pub async fn run(mut self) {
        tracing::info!("Background loop started");

        loop {
            // Reports first: a command then sees every event sent before it
            tokio::select! {
                biased;
                input = self.inputs.recv() => match input {
                    Some(Input::Shutdown) | None => break,
                    Some(input) => self.handle_input(input),
                },
                Some(request) = self.requests.recv() => self.handle_request(request),
            }
        }

        tracing::info!("Background loop stopped");
    }

    pub fn handle_request(&mut self, request: Request) {
        let channel = request.command.channel();

        let result = match self.execute(request.command.clone()) {
            Ok(data) => CommandResult::ok(data),
            Err(e) => {
                tracing::warn!(client = %request.client, channel = %channel, error = %e, "Command failed");
                CommandResult::err(e.to_string())
            }
        };

        self.hub.reply(&request, result);
    }

    pub fn handle_input(&mut self, input: Input) {
        match input {
            Input::Surface(event) => self.on_surface_event(event),
            Input::Download(event) => self.on_download_event(event),
            Input::Permission {
                origin,
                permission,
                reply,
            } => self.on_permission_request(origin, permission, reply),
            Input::Retry(ticket) => match self.registry.retry(&ticket) {
                Ok(true) => self.publish_tab(ticket.tab_id),
                Ok(false) => {}
                Err(e) => tracing::warn!(tab_id = %ticket.tab_id, error = %e, "Retry failed"),
            },
            Input::Shutdown => {}
        }
    }

    fn execute(&mut self, command: Command) -> Result<Value> {
        match command {
            Command::Navigate(request) => {
                let tab = self.registry.navigate(request.tab_id, &request.url)?;
                self.publish_tab(tab.id);
                self.nav_state_value(tab.id)
            }
            Command::Back(target) => {
                let moved = self.registry.back(target.tab_id)?;
                self.publish_tab(target.tab_id);
                Ok(Value::Bool(moved))
            }
            Command::Forward(target) => {
                let moved = self.registry.forward(target.tab_id)?;
                self.publish_tab(target.tab_id);
                Ok(Value::Bool(moved))
            }
            Command::Reload(request) => {
                self.registry.reload(request.tab_id, request.ignore_cache)?;
                self.publish_tab(request.tab_id);
                Ok(Value::Null)
            }
            Command::CreateTab(request) => {
                let tab = self.registry.create(CreateTab {
                    url: request.url,
                    session_partition: request.session_partition,
                    incognito: request.incognito,
                    shadow_crawl: request.shadow,
                    activate: request.activate,
                })?;
                self.publish_tab(tab.id);
                self.nav_state_value(tab.id)
            }
            Command::CloseTab(target) => {
                let next = self.registry.close(target.tab_id)?;
                match next {
                    Some(next) => self.publish_tab(next),
                    None => self.publish_tab_list(),
                }
                Ok(serde_json::to_value(next)?)
            }
            Command::SetActiveTab(target) => {
                self.registry.set_active(target.tab_id)?;
                self.publish_tab(target.tab_id);
                Ok(Value::Null)
            }
            Command::SetBounds(request) => {
                self.registry.set_bounds(request.tab_id, request.bounds)?;
                Ok(Value::Null)
            }
            Command::SetShadow(request) => {
                self.registry.set_shadow(request.tab_id, request.enabled)?;
                Ok(Value::Null)
            }
            Command::RequestTabList => {
                let list = self.registry.snapshot();
                self.emit(Event::BrowserTabs(list.clone()));
                Ok(serde_json::to_value(list)?)
            }
            Command::RequestHistory(query) => {
                let limit = query.limit.unwrap_or(self.db.retention().history_max_entries);
                Ok(serde_json::to_value(self.db.get_recent_history(limit)?)?)
            }
            Command::ClearHistory => {
                self.db.clear_history()?;
                Ok(Value::Null)
            }
            Command::RequestDownloads => Ok(serde_json::to_value(self.downloads.list())?),
            Command::PauseDownload(target) => {
                let download = self.downloads.pause(&target.download_id)?;
                self.publish_download(download.clone(), false);
                Ok(serde_json::to_value(download)?)
            }
            Command::ResumeDownload(target) => {
                let download = self.downloads.resume(&target.download_id)?;
                self.publish_download(download.clone(), false);
                Ok(serde_json::to_value(download)?)
            }
            Command::CancelDownload(target) => {
                let download = self.downloads.cancel(&target.download_id)?;
                self.publish_download(download.clone(), false);
                Ok(serde_json::to_value(download)?)
            }
            Command::ClearDownloads(request) => {
                let cleared = match request.download_id {
                    Some(id) => vec![self.downloads.clear(&id)?],
                    None => self.downloads.clear_finished()?,
                };
                let ids: Vec<String> = cleared.iter().map(|d| d.id.clone()).collect();
                for download in cleared {
                    self.publish_download(download, true);
                }
                Ok(serde_json::to_value(ids)?)
            }
            Command::ShowDownloadInFolder(target) => {
                let path = self.downloads.path_of(&target.download_id)?;
                self.revealer.reveal(&path)?;
                Ok(Value::Null)
            }
            Command::PermissionDecision(decision) => {
                self.decide_permission(decision)?;
                Ok(Value::Null)
            }
            Command::ListPermissions(query) => {
                let list = self.permissions.list(query.origin.as_deref())?;
                Ok(serde_json::to_value(list)?)
            }
            Command::ClearPermissions(PermissionClear { origin, permission }) => {
                let cleared = match permission {
                    Some(permission) => usize::from(self.permissions.clear(&origin, permission)?),
                    None => self.permissions.clear_origin(&origin)?,
                };
                self.publish_permissions();
                Ok(Value::from(cleared))
            }
            Command::SetPermission(request) => {
                self.permissions
                    .set(&request.origin, request.permission, request.state)?;
                self.publish_permissions();
                Ok(Value::Null)
            }
            Command::ClearSiteData(request) => {
                let origin = origin_of(&request.origin)?;
                self.registry.clear_site_data(&origin)?;
                Ok(Value::Null)
            }
            Command::SetSetting(request) => {
                self.db.set_setting(&request.key, &request.value)?;
                self.publish_settings();
                Ok(Value::Null)
            }
            Command::RequestSettings => {
                let settings = self.db.get_all_settings()?;
                self.emit(Event::SettingsState(settings.clone()));
                Ok(serde_json::to_value(settings)?)
            }
        }
    }

    fn on_surface_event(&mut self, event: SurfaceEvent) {
        let surface = event.surface;
        let change = match self.registry.handle_surface_event(event) {
            Ok(Some(change)) => change,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(surface = %surface, error = %e, "Surface event failed");
                return;
            }
        };

        let TabChange {
            tab_id,
            history,
            crawl,
            retry,
        } = change;

        if let Some(entry) = history {
            self.emit(Event::HistoryAppend(entry));
        }
        if let (Some(url), Some(crawler)) = (crawl, &self.crawler) {
            crawler.enqueue(url, tab_id);
        }
        if let Some(ticket) = retry {
            self.schedule_retry(ticket);
        }

        self.publish_tab(tab_id);
    }

    fn on_download_event(&mut self, event: DownloadEvent) {
        let id = event.id().map(str::to_string);
        let outcome = match event {
            DownloadEvent::Started { download, control } => self.downloads.begin(download, control),
            DownloadEvent::Progress {
                id,
                bytes_received,
                bytes_total,
            } => self.downloads.progress(&id, bytes_received, bytes_total),
            DownloadEvent::Finished { id, state, path } => self.downloads.finish(&id, state, path),
        };

        match outcome {
            Ok(Some(download)) => self.publish_download(download, false),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(download_id = ?id, error = %e, "Download event rejected");
            }
        }
        self.publish_evicted();
    }

    fn on_permission_request(&mut self, origin: String, permission: PermissionKind, reply: oneshot::Sender<bool>) {
        let origin = match origin_of(&origin) {
            Ok(origin) => origin,
            Err(e) => {
                tracing::debug!(error = %e, "Denying permission for opaque origin");
                let _ = reply.send(false);
                return;
            }
        };

        match self.permissions.get(&origin, permission) {
            Ok(PermissionState::Allow) => {
                let _ = reply.send(true);
            }
            Ok(PermissionState::Deny) => {
                let _ = reply.send(false);
            }
            Ok(PermissionState::Ask) => {
                let prompt = self.prompts.open(origin, permission, reply);
                self.emit(Event::PermissionsPrompt(prompt));
            }
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Permission lookup failed");
                let _ = reply.send(false);
            }
        }
    }

    fn decide_permission(&mut self, decision: PermissionDecision) -> Result<()> {
        let (prompt, reply) = self.prompts.resolve(decision.request_id)?;
        let allowed = decision.decision == PermissionState::Allow;
        let _ = reply.send(allowed);

        // Dismissing a prompt is a one-off deny and is never stored
        if decision.remember && decision.decision != PermissionState::Ask {
            self.permissions
                .set(&prompt.origin, prompt.permission, decision.decision)?;

            for (_, waiting) in self.prompts.take_matching(&prompt.origin, prompt.permission) {
                let _ = waiting.send(allowed);
            }
            self.publish_permissions();
        }

        tracing::info!(
            request_id = decision.request_id,
            origin = %prompt.origin,
            permission = %prompt.permission,
            allowed,
            "Permission prompt answered"
        );
        Ok(())
    }

    fn schedule_retry(&self, ticket: RetryTicket) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(tab_id = %ticket.tab_id, "No runtime to schedule retry");
            return;
        };

        let inputs = self.inputs_tx.clone();
        tracing::debug!(tab_id = %ticket.tab_id, delay_ms = ticket.delay.as_millis() as u64, "Scheduling retry");
        runtime.spawn(async move {
            tokio::time::sleep(ticket.delay).await;
            let _ = inputs.send(Input::Retry(ticket));
        });
    }

    fn nav_state_value(&self, tab_id: TabId) -> Result<Value> {
        Ok(serde_json::to_value(self.registry.nav_state(tab_id)?)?)
    }

    fn publish_tab(&self, tab_id: TabId) {
        if let Ok(state) = self.registry.nav_state(tab_id) {
            self.emit(Event::NavState(state));
        }
        self.publish_tab_list();
    }

    fn publish_tab_list(&self) {
        self.emit(Event::BrowserTabs(self.registry.snapshot()));
    }

    fn publish_download(&self, download: Download, deleted: bool) {
        let update = if deleted {
            DownloadUpdate::deleted(download)
        } else {
            DownloadUpdate::changed(download)
        };
        self.emit(Event::DownloadsUpdate(update));
        self.publish_evicted();
    }

    /// Rows the retention sweep dropped leave every UI too
    fn publish_evicted(&self) {
        for download in self.downloads.take_evicted() {
            self.emit(Event::DownloadsUpdate(DownloadUpdate::deleted(download)));
        }
    }

    fn publish_permissions(&self) {
        match self.permissions.snapshot() {
            Ok(snapshot) => self.emit(Event::PermissionsState(snapshot)),
            Err(e) => tracing::warn!(error = %e, "Could not read permissions"),
        }
    }

    fn publish_settings(&self) {
        match self.db.get_all_settings() {
            Ok(settings) => self.emit(Event::SettingsState(settings)),
            Err(e) => tracing::warn!(error = %e, "Could not read settings"),
        }
    }

    fn emit(&self, event: Event) {
        if let Err(e) = self.hub.broadcast(&event) {
            tracing::warn!(channel = %event.channel(), error = %e, "Broadcast failed");
        }
    }
}
