// src/hooks.rs
//! Call-out points for operator-supplied extension code. The runtime that
//! hosts the extensions is a collaborator; the core only defines the two
//! hooks and guarantees their failures never reach the publish pipeline.

use anyhow::Result;
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::Job;

/// What a hook reported back. Side-channel only: the pipeline never branches
/// on it beyond logging.
#[derive(Debug, Clone, Default)]
pub struct HookOutcome {
    /// Whether the extension filled the response at all.
    pub filled: bool,
    pub error: bool,
    pub message: String,
    pub data: Map<String, Value>,
}

#[async_trait::async_trait]
pub trait ExtensionHooks: Send + Sync {
    /// Called with the external id before a job is published.
    async fn on_receive(&self, external_id: &str) -> Result<HookOutcome>;

    /// Called with the job after a successful publish.
    async fn on_send(&self, job: &Job) -> Result<HookOutcome>;
}

/// Default when extensions are disabled.
pub struct NoopHooks;

#[async_trait::async_trait]
impl ExtensionHooks for NoopHooks {
    async fn on_receive(&self, _external_id: &str) -> Result<HookOutcome> {
        Ok(HookOutcome::default())
    }

    async fn on_send(&self, _job: &Job) -> Result<HookOutcome> {
        Ok(HookOutcome::default())
    }
}

/// Run one hook call, logging and swallowing every failure mode.
pub(crate) async fn call_logged<F>(name: &str, call: F)
where
    F: std::future::Future<Output = Result<HookOutcome>>,
{
    match call.await {
        Ok(outcome) => {
            if outcome.filled && outcome.error {
                debug!(hook = name, message = %outcome.message, "extension hook reported an error");
            }
        }
        Err(e) => {
            debug!(hook = name, error = %e, "extension hook failed");
        }
    }
}
