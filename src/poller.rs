use crate::events::AppEvent;
use crate::report::{self, Report};
use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::time;

pub async fn load_report(path: &Path) -> Result<Report> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| eyre!("Failed to read {}: {e}", path.display()))?;
    report::parse_report(&text)
}

/// Re-reads the report file on a fixed interval and feeds the results into
/// the event loop. The initial load is done by the caller before the UI
/// starts, so the first poll only happens after one interval.
pub struct Poller {
    path: PathBuf,
    interval: u64,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl Poller {
    pub fn new(path: PathBuf, interval: u64, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { path, interval, tx }
    }

    pub async fn run(self) {
        loop {
            time::sleep(time::Duration::from_secs(self.interval)).await;
            self.poll_once().await;
        }
    }

    async fn poll_once(&self) {
        tracing::debug!("reloading report from {}", self.path.display());
        match load_report(&self.path).await {
            Ok(report) => {
                let _ = self.tx.send(AppEvent::PollResult(Box::new(report)));
            }
            Err(e) => {
                let _ = self.tx.send(AppEvent::Error(format!("{e}")));
            }
        }
    }
}

/// One-shot reload used by the manual refresh action.
pub fn reload_in_background(path: PathBuf, tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        match load_report(&path).await {
            Ok(report) => {
                let _ = tx.send(AppEvent::PollResult(Box::new(report)));
            }
            Err(e) => {
                let _ = tx.send(AppEvent::Error(format!("{e}")));
            }
        }
    });
}
