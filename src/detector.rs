// src/detector.rs
//! Bundled detector implementation. Vendor page scraping and API parsing
//! live in collaborator sidecars; this adapter polls such a sidecar's probe
//! endpoint over HTTP. Cursor-capable endpoints use standard HTTP caching
//! tokens (`ETag` / `If-None-Match`), so an unchanged answer costs one 304.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::platform::{DetectMethod, PlatformId};
use crate::types::{Detector, LivestreamProbe, Poll, Survey};

/// Response schema of a probe endpoint: `live` is the probe when a stream is
/// up, `null` or absent otherwise.
#[derive(Debug, Deserialize)]
struct ProbeResponse {
    #[serde(default)]
    live: Option<LivestreamProbe>,
}

pub struct ProbeEndpoint {
    platform: PlatformId,
    method: DetectMethod,
    url: String,
    client: Client,
}

impl ProbeEndpoint {
    pub fn new(platform: PlatformId, method: DetectMethod, url: impl Into<String>) -> Self {
        Self {
            platform,
            method,
            url: url.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl Detector for ProbeEndpoint {
    async fn check(&self, cursor: &str) -> Result<Survey> {
        let mut request = self.client.get(&self.url);
        // Only api-method detectors carry a change cursor.
        if self.method == DetectMethod::Api && !cursor.is_empty() {
            request = request.header("If-None-Match", cursor);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("probe request to {}", self.url))?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(Survey {
                poll: Poll::Unchanged,
                cursor: cursor.to_string(),
            });
        }

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("probe endpoint {} returned status {status}", self.url);
        }

        let new_cursor = response
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| cursor.to_string());

        let body = response.text().await.context("reading probe body")?;
        let parsed: ProbeResponse = serde_json::from_str(body.trim())
            .with_context(|| format!("parsing probe body from {}", self.url))?;

        let poll = match parsed.live {
            Some(mut probe) => {
                // The worker owns the platform identity; endpoints cannot
                // publish under another platform's name.
                probe.platform = self.platform;
                Poll::Live(probe)
            }
            None => Poll::Offline,
        };

        Ok(Survey {
            poll,
            cursor: new_cursor,
        })
    }
}
