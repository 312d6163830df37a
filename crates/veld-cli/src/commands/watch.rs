//! Connectivity watch command

use std::sync::Arc;
use std::time::Duration;

use veld_core::config::RemoteConfig;
use veld_core::net::{HttpConnectivityProbe, NetworkObserver, ProbeConfig, SyncTrigger};
use veld_core::SalesRepository;

use crate::error::CliError;

pub async fn run_watch(
    repository: Arc<SalesRepository>,
    probe_url: Option<String>,
    interval_secs: u64,
) -> Result<(), CliError> {
    let probe_url = resolve_probe_url(probe_url, &RemoteConfig::from_env())?;

    let probe = HttpConnectivityProbe::new(
        ProbeConfig::new(probe_url).with_interval(Duration::from_secs(interval_secs.max(1))),
    )?;
    let (samples, probe_task) = probe.spawn();
    let observer = NetworkObserver::spawn(samples, repository as Arc<dyn SyncTrigger>);
    let mut online = observer.online_state();

    println!("Watching connectivity; dirty rows sync on every reconnect (ctrl-c to stop)");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = online.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = if *online.borrow() { "online" } else { "offline" };
                println!("{state}");
            }
        }
    }

    probe_task.abort();
    Ok(())
}

fn resolve_probe_url(explicit: Option<String>, config: &RemoteConfig) -> Result<String, CliError> {
    if let Some(url) = explicit {
        return Ok(url);
    }
    config
        .api_base_url
        .as_ref()
        .map(|base| format!("{base}/v1/health"))
        .ok_or(CliError::MissingProbeUrl)
}
