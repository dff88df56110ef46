// src/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::platform::PlatformId;

/// What one detector run found. Transient; lives only within a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivestreamProbe {
    pub platform: PlatformId,
    pub external_id: String,
    pub title: String,
    pub playback_url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
}

/// The durable record handed to the archiver over the bus. Immutable once
/// built; identified by `(platform, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub platform: PlatformId,
    pub downloader: String,
    pub id: String,
    pub playback_url: String,
    pub title: String,
    pub pub_time: String,
    pub start_time: String,
    pub end_time: String,
    pub thumbnail: String,
}

impl Job {
    pub fn from_probe(probe: &LivestreamProbe, downloader: &str) -> Self {
        Self {
            platform: probe.platform,
            downloader: downloader.to_string(),
            id: probe.external_id.clone(),
            playback_url: probe.playback_url.clone(),
            title: probe.title.clone(),
            pub_time: probe.published_at.clone().unwrap_or_default(),
            // Scraper-style probes carry no start time; stamp the moment of
            // detection instead.
            start_time: probe
                .started_at
                .clone()
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
            end_time: probe.ended_at.clone().unwrap_or_default(),
            thumbnail: probe.thumbnail_url.clone(),
        }
    }

    /// Dedup-ledger key, `"<platform>:<external_id>"`.
    pub fn ledger_key(&self) -> String {
        ledger_key(self.platform, &self.id)
    }
}

pub fn ledger_key(platform: PlatformId, external_id: &str) -> String {
    format!("{platform}:{external_id}")
}

/// One poll verdict. `Unchanged` means the change cursor matched and the
/// platform reported nothing new; the cycle skips state updates entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    Live(LivestreamProbe),
    Offline,
    Unchanged,
}

/// A poll verdict plus the cursor to carry into the next check. Detectors
/// without cursor support echo the input cursor back.
#[derive(Debug, Clone)]
pub struct Survey {
    pub poll: Poll,
    pub cursor: String,
}

/// Detector capability: asks one platform whether the channel is live.
/// Implementations own their transport and parsing; the scheduler only sees
/// this seam.
#[async_trait::async_trait]
pub trait Detector: Send + Sync {
    async fn check(&self, cursor: &str) -> Result<Survey>;
}
