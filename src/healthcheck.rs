// src/healthcheck.rs
use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;
use tracing::warn;

static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
});

/// Fire-and-forget liveness ping after a completed cycle. Failures are
/// logged and nothing else; a dead health-check sink must never slow a
/// worker down, so the request runs on its own task.
pub fn ping(url: &str) {
    let url = url.to_string();
    tokio::spawn(async move {
        if let Err(e) = CLIENT.head(&url).send().await {
            warn!(url = %url, error = %e, "health check ping failed");
        }
    });
}
