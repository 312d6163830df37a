//! Connectivity observation and sync triggering
//!
//! The observer consumes raw boolean connectivity samples, collapses
//! consecutive duplicates, and invokes the repository's sync entry point
//! exactly once per offline-to-online transition. Overlapping triggers are
//! collapsed downstream by the sync engine's single-flight gate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::sync::SyncOutcome;
use crate::util::is_http_url;

const DEFAULT_PROBE_INTERVAL_SECS: u64 = 15;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 4;

/// The entry point the observer calls on reconnect.
#[async_trait]
pub trait SyncTrigger: Send + Sync {
    async fn trigger_sync(&self) -> Result<SyncOutcome>;
}

/// Watches connectivity samples and fires sync triggers on reconnect.
pub struct NetworkObserver {
    online: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl NetworkObserver {
    /// Spawn the observer over a stream of raw connectivity samples.
    ///
    /// Samples are deduplicated before anything else happens, so a platform
    /// that re-reports the same state never causes redundant triggers. The
    /// first `true` sample counts as a transition: a launch with
    /// connectivity drains whatever is dirty.
    pub fn spawn(mut samples: mpsc::Receiver<bool>, trigger: Arc<dyn SyncTrigger>) -> Self {
        let (state_tx, state_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut last: Option<bool> = None;
            while let Some(online) = samples.recv().await {
                if last == Some(online) {
                    continue;
                }
                last = Some(online);
                let _ = state_tx.send(online);

                if online {
                    tracing::info!("Connectivity restored; triggering sync pass");
                    let trigger = Arc::clone(&trigger);
                    // Fire-and-forget so a burst of flaps lands on the
                    // engine's single-flight gate instead of queueing here
                    tokio::spawn(async move {
                        match trigger.trigger_sync().await {
                            Ok(SyncOutcome::Completed(report)) => {
                                tracing::debug!(
                                    "Reconnect sync pushed {} quotes and {} leads",
                                    report.pushed_quotes,
                                    report.pushed_leads
                                );
                            }
                            Ok(SyncOutcome::Skipped) => {
                                tracing::debug!("Reconnect sync skipped; pass already running");
                            }
                            Err(error) => {
                                tracing::warn!("Reconnect sync failed: {error}");
                            }
                        }
                    });
                } else {
                    tracing::info!("Connectivity lost; operating offline");
                }
            }
        });

        Self {
            online: state_rx,
            task,
        }
    }

    /// Deduplicated connectivity state for anyone who wants to display it.
    pub fn online_state(&self) -> watch::Receiver<bool> {
        self.online.clone()
    }
}

impl Drop for NetworkObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Settings for the HTTP reachability probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
}

impl ProbeConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            interval: Duration::from_secs(DEFAULT_PROBE_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Feeds the observer by polling a small HTTP endpoint.
///
/// "Online" means a successful response, not mere interface presence;
/// captive portals and dead uplinks read as offline.
#[derive(Debug)]
pub struct HttpConnectivityProbe {
    config: ProbeConfig,
    client: reqwest::Client,
}

impl HttpConnectivityProbe {
    pub fn new(config: ProbeConfig) -> Result<Self> {
        if !is_http_url(&config.url) {
            return Err(Error::InvalidInput(
                "probe URL must include http:// or https://".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| Error::Network(error.to_string()))?;

        Ok(Self { config, client })
    }

    /// Start sampling; the receiver plugs straight into
    /// [`NetworkObserver::spawn`].
    pub fn spawn(self) -> (mpsc::Receiver<bool>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(16);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            loop {
                ticker.tick().await;
                let online = self.check().await;
                if tx.send(online).await.is_err() {
                    break;
                }
            }
        });

        (rx, task)
    }

    async fn check(&self) -> bool {
        match self.client.get(&self.config.url).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::debug!("Connectivity probe failed: {error}");
                false
            }
        }
    }
}
