//! Livestream notifier — binary entrypoint.
//! Loads the config, restores the dedup ledger, and runs one poll loop per
//! enabled (platform, method) until an unrecoverable error stops the service.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stream_notifier::config::Config;
use stream_notifier::hooks::NoopHooks;
use stream_notifier::{metrics, service};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stream_notifier=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = Config::load()?;

    if let Some(listen) = cfg.metrics.listen.clone() {
        metrics::install_exporter(&listen)?;
    }

    info!("running the notifier service");

    // Extension hooks are operator-supplied; the stock binary runs without
    // them.
    service::run(cfg, Arc::new(NoopHooks)).await
}
