// src/bus.rs
//! Message-bus seam. The wire protocol is a collaborator concern; the core
//! only needs `publish(subject, payload)` with at-most-once semantics and an
//! error return. The bundled transport POSTs payloads over HTTP.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;

use crate::errors::BusError;

#[async_trait::async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), BusError>;
}

/// HTTP transport: POST `<base>/<subject>` with a JSON body and optional
/// custom headers. No internal retry; a failed publish is the scheduler's
/// problem on its next cycle.
#[derive(Clone)]
pub struct HttpBus {
    base_url: String,
    headers: HashMap<String, String>,
    client: Client,
}

impl HttpBus {
    pub fn new(base_url: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers,
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl MessageBus for HttpBus {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), BusError> {
        let url = format!("{}/{subject}", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        let response = request.body(payload.to_vec()).send().await?;
        if !response.status().is_success() {
            return Err(BusError::Http {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
