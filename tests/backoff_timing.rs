// tests/backoff_timing.rs
// Observes the actual sleep pattern of a running worker under a paused
// clock: consecutive detector failures back off 1, 2, 4, ... seconds, a
// success sleeps the full poll interval and resets the backoff.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use stream_notifier::arbiter::Arbiter;
use stream_notifier::bus::MessageBus;
use stream_notifier::errors::BusError;
use stream_notifier::hooks::NoopHooks;
use stream_notifier::platform::{DetectMethod, PlatformId};
use stream_notifier::publisher::EventPublisher;
use stream_notifier::scheduler::Worker;
use stream_notifier::state::StateStore;
use stream_notifier::types::{Detector, Poll, Survey};

const INTERVAL: Duration = Duration::from_secs(600);

/// Fails every check except the fourth, and records when each check ran.
struct FlakyDetector {
    calls: AtomicUsize,
    seen_at: Arc<Mutex<Vec<tokio::time::Instant>>>,
}

#[async_trait::async_trait]
impl Detector for FlakyDetector {
    async fn check(&self, cursor: &str) -> anyhow::Result<Survey> {
        self.seen_at.lock().unwrap().push(tokio::time::Instant::now());
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 3 {
            Ok(Survey {
                poll: Poll::Offline,
                cursor: cursor.to_string(),
            })
        } else {
            Err(anyhow!("fetch failed"))
        }
    }
}

struct NullBus;

#[async_trait::async_trait]
impl MessageBus for NullBus {
    async fn publish(&self, _subject: &str, _payload: &[u8]) -> Result<(), BusError> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn failures_back_off_and_success_resets() {
    let dir = tempfile::tempdir().unwrap();
    let seen_at = Arc::new(Mutex::new(Vec::new()));

    let worker = Worker::new(
        PlatformId::Rumble,
        DetectMethod::Scraper,
        Box::new(FlakyDetector {
            calls: AtomicUsize::new(0),
            seen_at: Arc::clone(&seen_at),
        }),
        INTERVAL,
        String::new(),
        None,
        Arc::new(StateStore::load(dir.path().join("state.json"))),
        Arc::new(Arbiter::new(vec![(PlatformId::Rumble, 1)])),
        Arc::new(EventPublisher::new(
            Arc::new(NullBus),
            Arc::new(NoopHooks),
            "archiver",
        )),
    );

    let handle = tokio::spawn(worker.run());
    // Paused clock: sleeps auto-advance, so this covers well past the
    // success at +7s and the following interval sleep.
    tokio::time::sleep(INTERVAL + Duration::from_secs(20)).await;
    handle.abort();

    let instants = seen_at.lock().unwrap();
    let gaps: Vec<u64> = instants
        .windows(2)
        .map(|w| (w[1] - w[0]).as_secs())
        .collect();

    // err(+1) err(+2) err(+4) ok(+interval) err(+1) err(+2) ...
    assert!(gaps.len() >= 6, "worker made too few checks: {gaps:?}");
    assert_eq!(&gaps[..6], &[1, 2, 4, INTERVAL.as_secs(), 1, 2]);
}
