// src/service.rs
//! Wires config into running workers: one per enabled (platform, method),
//! launched in ascending priority order with a short stagger, sharing one
//! state store, arbiter, and publisher.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinSet;
use tracing::info;

use crate::arbiter::Arbiter;
use crate::bus::HttpBus;
use crate::config::Config;
use crate::detector::ProbeEndpoint;
use crate::hooks::ExtensionHooks;
use crate::publisher::EventPublisher;
use crate::scheduler::Worker;
use crate::state::StateStore;

const LAUNCH_STAGGER: Duration = Duration::from_secs(1);

/// Run the notifier until a worker hits an unrecoverable error. Workers have
/// no graceful-shutdown contract; process exit tears them down.
pub async fn run(cfg: Config, hooks: Arc<dyn ExtensionHooks>) -> Result<()> {
    crate::metrics::ensure_described();

    let state = Arc::new(StateStore::load(&cfg.state.path));
    let arbiter = Arc::new(Arbiter::new(cfg.priorities()));
    let bus = Arc::new(HttpBus::new(&cfg.bus.url, cfg.bus.headers.clone()));
    let publisher = Arc::new(EventPublisher::new(bus, hooks, &cfg.bus.topic));

    let mut platforms = cfg.enabled_platforms();
    platforms.sort_by_key(|(_, platform)| platform.priority);

    let mut workers = JoinSet::new();
    let mut first = true;
    for (id, platform) in platforms {
        for detector_cfg in &platform.detectors {
            if !first {
                tokio::time::sleep(LAUNCH_STAGGER).await;
            }
            first = false;

            info!(
                platform = %id,
                method = %detector_cfg.method,
                refresh_minutes = detector_cfg.refresh_minutes,
                "running platform loop"
            );

            let worker = Worker::new(
                id,
                detector_cfg.method,
                Box::new(ProbeEndpoint::new(id, detector_cfg.method, &detector_cfg.url)),
                Duration::from_secs(detector_cfg.refresh_minutes * 60),
                platform.downloader.clone(),
                platform.healthcheck.clone(),
                Arc::clone(&state),
                Arc::clone(&arbiter),
                Arc::clone(&publisher),
            );
            workers.spawn(worker.run());
        }
    }

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => return Err(e.into()),
            Err(join_err) => return Err(join_err.into()),
        }
    }
    Ok(())
}
