//! Harbor - headless shell
//!
//! Runs the background process with headless surfaces. Stdin carries UI
//! request frames and engine reports as JSON lines; every UI frame the
//! background emits goes to stdout, one per line. Logs go to stderr.

mod wire;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use harbor_core::{Background, BackgroundHandle, Config, HeadlessFactory};
use harbor_ipc::{ClientConnection, RequestSender, UiFrame};
use tokio::sync::mpsc::UnboundedReceiver;

use wire::{parse_line, ShellLine};

#[derive(Debug, Parser)]
#[command(name = "harbor")]
#[command(about = "Harbor browser shell background process")]
struct Cli {
    /// JSON config file; missing keys fall back to defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory holding harbor.db
    #[arg(long, env = "HARBOR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Shadow crawl endpoint
    #[arg(long, env = "HARBOR_CRAWL_ENDPOINT")]
    crawl_endpoint: Option<String>,
}

impl Cli {
    fn to_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };
        config.apply_env();

        if let Some(dir) = &self.data_dir {
            let retention = config.retention.clone();
            let crawl_endpoint = config.crawl_endpoint.take();
            config = Config {
                retention,
                crawl_endpoint,
                ..Config::new(dir.clone())
            };
        }
        if let Some(endpoint) = &self.crawl_endpoint {
            config.crawl_endpoint = Some(endpoint.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    harbor_core::init_logging();

    let cli = Cli::parse();
    let config = cli.to_config()?;

    let (background, handle) = Background::from_config(&config, Box::new(HeadlessFactory::new()))
        .context("starting background")?;
    let runner = tokio::spawn(background.run());

    let ClientConnection { id, requests, frames } = handle.connect();
    let writer = tokio::spawn(write_frames(frames));
    tracing::info!(client = %id, "Harbor shell started");

    read_lines(&handle, &requests).await?;

    if handle.shutdown().is_err() {
        tracing::debug!("Background already stopped");
    }
    runner.await.context("background task")?;

    // Writer ends once every sender for this client is gone
    drop(requests);
    handle.hub().disconnect(id);
    writer.await.context("writer task")??;

    tracing::info!("Harbor shell stopped");
    Ok(())
}

async fn read_lines(handle: &BackgroundHandle, requests: &RequestSender) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = match parse_line(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable line");
                continue;
            }
        };

        let sent = match parsed {
            ShellLine::Ui(frame) => requests.send_frame(frame).map_err(anyhow::Error::from),
            ShellLine::Surface(event) => handle.surface_event(event).map_err(anyhow::Error::from),
            ShellLine::Download(report) => handle.download_event(report.into()).map_err(anyhow::Error::from),
        };
        if let Err(e) = sent {
            tracing::error!(error = %e, "Background stopped accepting input");
            break;
        }
    }

    Ok(())
}

async fn write_frames(mut frames: UnboundedReceiver<UiFrame>) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();

    while let Some(frame) = frames.recv().await {
        let mut line = serde_json::to_vec(&frame)?;
        line.push(b'\n');
        stdout.write_all(&line).await?;
        stdout.flush().await?;
    }

    Ok(())
}
