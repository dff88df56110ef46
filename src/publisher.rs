// src/publisher.rs
//! Turns a confirmed livestream into a job record on the bus, with the
//! extension call-outs around it. No retry here: a bus failure goes back to
//! the scheduler, and the job stays unmarked so the next cycle tries again.

use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use crate::bus::MessageBus;
use crate::errors::CycleError;
use crate::hooks::{call_logged, ExtensionHooks};
use crate::types::Job;

pub struct EventPublisher {
    bus: Arc<dyn MessageBus>,
    hooks: Arc<dyn ExtensionHooks>,
    subject: String,
}

impl EventPublisher {
    pub fn new(bus: Arc<dyn MessageBus>, hooks: Arc<dyn ExtensionHooks>, topic: &str) -> Self {
        Self {
            bus,
            hooks,
            subject: format!("{topic}.job"),
        }
    }

    /// Publish one job. Hook failures are logged and swallowed; a
    /// serialization failure is fatal (programmer-error class); a bus
    /// failure is transient and the job is NOT considered published.
    pub async fn publish(&self, job: &Job) -> Result<(), CycleError> {
        call_logged("on_receive", self.hooks.on_receive(&job.id)).await;

        let payload = serde_json::to_vec(job).map_err(CycleError::Serialize)?;

        self.bus.publish(&self.subject, &payload).await?;
        counter!("notifier_jobs_published_total").increment(1);
        debug!(subject = %self.subject, id = %job.id, "job published");

        call_logged("on_send", self.hooks.on_send(job)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BusError;
    use crate::hooks::{HookOutcome, NoopHooks};
    use crate::platform::PlatformId;
    use crate::types::LivestreamProbe;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn job() -> Job {
        Job::from_probe(
            &LivestreamProbe {
                platform: PlatformId::Kick,
                external_id: "k1".into(),
                title: "live".into(),
                playback_url: "https://kick.com/chan".into(),
                thumbnail_url: String::new(),
                published_at: None,
                started_at: None,
                ended_at: None,
            },
            "yt-dlp",
        )
    }

    struct RecordingBus {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl MessageBus for RecordingBus {
        async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), BusError> {
            assert_eq!(subject, "archiver.job");
            let decoded: Job = serde_json::from_slice(payload).unwrap();
            assert_eq!(decoded.id, "k1");
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(BusError::Http { status: 502 })
            } else {
                Ok(())
            }
        }
    }

    struct FailingHooks;

    #[async_trait::async_trait]
    impl ExtensionHooks for FailingHooks {
        async fn on_receive(&self, _id: &str) -> anyhow::Result<HookOutcome> {
            Err(anyhow!("script blew up"))
        }
        async fn on_send(&self, _job: &Job) -> anyhow::Result<HookOutcome> {
            Ok(HookOutcome {
                filled: true,
                error: true,
                message: "bad state".into(),
                data: Default::default(),
            })
        }
    }

    #[tokio::test]
    async fn publishes_serialized_job_on_topic_subject() {
        let bus = Arc::new(RecordingBus {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let publisher = EventPublisher::new(bus.clone(), Arc::new(NoopHooks), "archiver");
        publisher.publish(&job()).await.unwrap();
        assert_eq!(bus.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bus_failure_is_transient() {
        let bus = Arc::new(RecordingBus {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let publisher = EventPublisher::new(bus, Arc::new(NoopHooks), "archiver");
        let err = publisher.publish(&job()).await.unwrap_err();
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn hook_failures_never_block_publish() {
        let bus = Arc::new(RecordingBus {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let publisher = EventPublisher::new(bus.clone(), Arc::new(FailingHooks), "archiver");
        publisher.publish(&job()).await.unwrap();
        assert_eq!(bus.calls.load(Ordering::SeqCst), 1);
    }
}
