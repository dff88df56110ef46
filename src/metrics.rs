// src/metrics.rs
use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("notifier_cycles_total", "Completed poll cycles.");
        describe_counter!(
            "notifier_detector_errors_total",
            "Detector check failures (transient, retried under backoff)."
        );
        describe_counter!(
            "notifier_publish_errors_total",
            "Bus publish failures (job retried next cycle)."
        );
        describe_counter!(
            "notifier_jobs_published_total",
            "Jobs published to the bus."
        );
        describe_counter!(
            "notifier_deferred_total",
            "Live signals deferred to a higher-priority platform."
        );
        describe_gauge!(
            "notifier_backoff_seconds",
            "Current retry backoff per worker."
        );
    });
}

/// Install the Prometheus recorder with its own exposition listener.
pub fn install_exporter(listen: &str) -> Result<()> {
    let addr: std::net::SocketAddr = listen
        .parse()
        .with_context(|| format!("parsing metrics listen address {listen}"))?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("prometheus: install recorder")?;
    ensure_described();
    Ok(())
}
