//! Shadow-crawl enqueue
//!
//! Committed URLs of shadow tabs are forwarded to an external crawl
//! service. Delivery is best effort: every failure is logged and dropped.

use std::time::Duration;

use serde::Serialize;

use harbor_tabs::TabId;

use crate::Result;

const ENQUEUE_TIMEOUT: Duration = Duration::from_secs(5);

pub trait Crawler: Send + Sync {
    /// Must return immediately; delivery happens in the background.
    fn enqueue(&self, url: String, tab_id: TabId);
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueRequest {
    url: String,
    tab_id: TabId,
}

pub struct HttpCrawler {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCrawler {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(ENQUEUE_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Crawler for HttpCrawler {
    fn enqueue(&self, url: String, tab_id: TabId) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(tab_id = %tab_id, "No runtime for crawl enqueue");
            return;
        };

        let request = self.client.post(&self.endpoint).json(&EnqueueRequest { url, tab_id });
        runtime.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::trace!(tab_id = %tab_id, "Crawl enqueued");
                }
                Ok(response) => {
                    tracing::debug!(tab_id = %tab_id, status = %response.status(), "Crawl service refused");
                }
                Err(e) => {
                    tracing::debug!(tab_id = %tab_id, error = %e, "Crawl enqueue failed");
                }
            }
        });
    }
}
