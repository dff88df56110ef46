// src/scheduler.rs
//! One long-lived worker per enabled (platform, method) pair: sleep any
//! retry backoff, run one check-publish cycle, then sleep the poll interval.
//! Transient failures are retried forever; fatal ones end the worker.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tracing::{debug, error, info, warn};

use crate::arbiter::Arbiter;
use crate::errors::CycleError;
use crate::healthcheck;
use crate::platform::{DetectMethod, PlatformId};
use crate::publisher::EventPublisher;
use crate::state::StateStore;
use crate::types::{Detector, Job, Poll};

/// Retry backoff: 1, 2, 4, 8, 16, then pinned at 32 seconds. A success
/// resets to zero, which means "no delay, sleep the full poll interval".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Backoff {
    seconds: u64,
}

const BACKOFF_CAP_SECS: u64 = 32;

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&mut self) {
        self.seconds = match self.seconds {
            0 => 1,
            n => (n * 2).min(BACKOFF_CAP_SECS),
        };
    }

    pub fn reset(&mut self) {
        self.seconds = 0;
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn delay(&self) -> Option<Duration> {
        (self.seconds > 0).then(|| Duration::from_secs(self.seconds))
    }
}

pub struct Worker {
    platform: PlatformId,
    method: DetectMethod,
    detector: Box<dyn Detector>,
    interval: Duration,
    downloader: String,
    healthcheck: Option<String>,
    state: Arc<StateStore>,
    arbiter: Arc<Arbiter>,
    publisher: Arc<EventPublisher>,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        platform: PlatformId,
        method: DetectMethod,
        detector: Box<dyn Detector>,
        interval: Duration,
        downloader: String,
        healthcheck: Option<String>,
        state: Arc<StateStore>,
        arbiter: Arc<Arbiter>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            platform,
            method,
            detector,
            interval,
            downloader,
            healthcheck,
            state,
            arbiter,
            publisher,
        }
    }

    /// Poll forever. Returns only when a fatal error makes continuing
    /// unsafe (the ledger could no longer be trusted).
    pub async fn run(self) -> Result<(), CycleError> {
        let mut backoff = Backoff::new();
        loop {
            if let Some(delay) = backoff.delay() {
                info!(
                    platform = %self.platform,
                    method = %self.method,
                    seconds = backoff.seconds(),
                    "sleeping before retry"
                );
                tokio::time::sleep(delay).await;
            }

            match self.cycle().await {
                Ok(()) => {
                    backoff.reset();
                    gauge!(
                        "notifier_backoff_seconds",
                        "platform" => self.platform.as_str(),
                        "method" => self.method.as_str()
                    )
                    .set(0.0);
                    debug!(
                        platform = %self.platform,
                        method = %self.method,
                        seconds = self.interval.as_secs(),
                        "sleeping"
                    );
                    tokio::time::sleep(self.interval).await;
                }
                Err(e) if e.is_fatal() => {
                    error!(
                        platform = %self.platform,
                        method = %self.method,
                        error = %e,
                        "unrecoverable error, stopping"
                    );
                    return Err(e);
                }
                Err(e) => {
                    match &e {
                        CycleError::Bus(_) => {
                            counter!("notifier_publish_errors_total").increment(1)
                        }
                        _ => counter!("notifier_detector_errors_total").increment(1),
                    }
                    backoff.bump();
                    gauge!(
                        "notifier_backoff_seconds",
                        "platform" => self.platform.as_str(),
                        "method" => self.method.as_str()
                    )
                    .set(backoff.seconds() as f64);
                    warn!(
                        platform = %self.platform,
                        method = %self.method,
                        error = %e,
                        "check failed, restarting the loop"
                    );
                }
            }
        }
    }

    /// One check-publish cycle. The detector call runs outside the state
    /// lock; the dedup check, arbitration, publish, and mark happen inside
    /// one session so concurrent workers cannot interleave.
    pub async fn cycle(&self) -> Result<(), CycleError> {
        counter!("notifier_cycles_total", "platform" => self.platform.as_str()).increment(1);

        let cursor = self.state.lock().await.cursor(self.platform);
        let survey = self
            .detector
            .check(&cursor)
            .await
            .map_err(CycleError::Detector)?;

        match survey.poll {
            Poll::Unchanged => {
                info!(
                    platform = %self.platform,
                    method = %self.method,
                    "change cursor matched, skipping"
                );
                return Ok(());
            }
            Poll::Offline => {
                let mut session = self.state.lock().await;
                session.set_cursor(self.platform, survey.cursor);
                session.set_current_live(self.platform, None);
                session.persist()?;
                info!(platform = %self.platform, method = %self.method, "not live");
            }
            Poll::Live(probe) => {
                let mut session = self.state.lock().await;

                if session.is_published(self.platform, &probe.external_id) {
                    session.set_cursor(self.platform, survey.cursor);
                    session.persist()?;
                    info!(
                        platform = %self.platform,
                        method = %self.method,
                        id = %probe.external_id,
                        "already sent"
                    );
                } else if !self.arbiter.allowed(self.platform, session.current_live()) {
                    // The cursor stays put: advancing it would turn the next
                    // poll into Unchanged and bury the live signal before
                    // this platform ever gets its turn.
                    counter!("notifier_deferred_total").increment(1);
                    info!(
                        platform = %self.platform,
                        method = %self.method,
                        id = %probe.external_id,
                        "streaming on a different platform"
                    );
                } else {
                    let job = Job::from_probe(&probe, &self.downloader);
                    info!(
                        platform = %self.platform,
                        method = %self.method,
                        id = %job.id,
                        "stream found"
                    );
                    // The platform is live whether or not the publish below
                    // succeeds; record it so other workers defer.
                    session.set_current_live(self.platform, Some(job.clone()));

                    // Publishing inside the session serializes the
                    // arbitration decision with the publish itself. On a
                    // publish failure the cursor is left untouched, so the
                    // next cycle re-fetches and sees the stream again.
                    self.publisher.publish(&job).await?;

                    session.set_cursor(self.platform, survey.cursor);
                    session.mark_published(self.platform, &job.id);
                    session.persist()?;
                }
            }
        }

        if let Some(url) = &self.healthcheck {
            healthcheck::ping(url);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_sequence_doubles_to_cap() {
        let mut backoff = Backoff::new();
        assert_eq!(backoff.delay(), None);
        let mut observed = Vec::new();
        for _ in 0..8 {
            backoff.bump();
            observed.push(backoff.seconds());
        }
        assert_eq!(observed, vec![1, 2, 4, 8, 16, 32, 32, 32]);
    }

    #[test]
    fn backoff_resets_on_success() {
        let mut backoff = Backoff::new();
        for _ in 0..5 {
            backoff.bump();
        }
        assert_eq!(backoff.seconds(), 16);
        backoff.reset();
        assert_eq!(backoff.delay(), None);
        backoff.bump();
        assert_eq!(backoff.seconds(), 1);
    }
}
