//! Shared harness: a running background loop with one connected UI.

#![allow(dead_code)]

use std::time::Duration;

use harbor_core::{Background, BackgroundHandle, Database, Event, HeadlessFactory, UiClient};
use harbor_ipc::EventChannel;
use harbor_tabs::RetryPolicy;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const WAIT: Duration = Duration::from_secs(2);

pub struct Harness {
    pub handle: BackgroundHandle,
    pub client: UiClient,
    pub factory: HeadlessFactory,
    pub events: mpsc::UnboundedReceiver<Event>,
    pub db: Database,
    runner: JoinHandle<()>,
}

impl Harness {
    pub fn start() -> Self {
        Self::start_with(|background| background)
    }

    pub fn start_with(configure: impl FnOnce(Background) -> Background) -> Self {
        Self::start_on(Database::open_in_memory().unwrap(), configure)
    }

    pub fn start_on(db: Database, configure: impl FnOnce(Background) -> Background) -> Self {
        let factory = HeadlessFactory::new();
        let (background, handle) = Background::new(db.clone(), Box::new(factory.clone())).unwrap();
        let background = configure(background.with_retry_policy(RetryPolicy::new(Duration::from_millis(20), 1)));
        let runner = tokio::spawn(background.run());

        let (client, _dispatch) = UiClient::connect(handle.connect());
        let (tx, events) = mpsc::unbounded_channel();
        for channel in EventChannel::ALL {
            let tx = tx.clone();
            client.subscribe(channel, move |event| {
                tx.send(event.clone())?;
                Ok(())
            });
        }

        Self {
            handle,
            client,
            factory,
            events,
            db,
            runner,
        }
    }

    /// Next event matching `pick`, skipping everything else.
    pub async fn next_event<T>(&mut self, mut pick: impl FnMut(Event) -> Option<T>) -> T {
        tokio::time::timeout(WAIT, async {
            loop {
                let event = self.events.recv().await.expect("event stream closed");
                if let Some(found) = pick(event) {
                    return found;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    pub async fn stop(self) {
        self.handle.shutdown().unwrap();
        self.runner.await.unwrap();
    }
}
