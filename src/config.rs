// src/config.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::{DetectMethod, PlatformId};

const ENV_CONFIG_PATH: &str = "NOTIFIER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub state: StateConfig,
    pub bus: BusConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub platforms: PlatformsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// Path of the single serialized state blob.
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

fn default_state_path() -> PathBuf {
    PathBuf::from("data/state.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    /// Base URL of the bus endpoint; the subject is appended as a path
    /// segment.
    pub url: String,
    /// Jobs go out on `<topic>.job`.
    pub topic: String,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// `host:port` for the Prometheus exposition listener; absent means no
    /// exporter.
    #[serde(default)]
    pub listen: Option<String>,
}

/// Explicit, closed list of platform tables. Adding a platform here (plus a
/// `PlatformId` variant) is the whole registration story.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformsConfig {
    #[serde(default)]
    pub youtube: Option<PlatformConfig>,
    #[serde(default)]
    pub rumble: Option<PlatformConfig>,
    #[serde(default)]
    pub kick: Option<PlatformConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub channel: String,
    /// 0 and 1 publish unconditionally; higher numbers defer to any live
    /// platform with a lower number.
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub downloader: String,
    /// Optional fire-and-forget ping after each completed cycle.
    #[serde(default)]
    pub healthcheck: Option<String>,
    #[serde(default)]
    pub detectors: Vec<DetectorConfig>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    pub method: DetectMethod,
    /// Probe endpoint that speaks the `LivestreamProbe` schema.
    pub url: String,
    pub refresh_minutes: u64,
}

impl Config {
    /// Load using `$NOTIFIER_CONFIG`, falling back to `config.toml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(content).context("parsing config TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Enabled platforms in declaration order.
    pub fn enabled_platforms(&self) -> Vec<(PlatformId, &PlatformConfig)> {
        let tables = [
            (PlatformId::Youtube, &self.platforms.youtube),
            (PlatformId::Rumble, &self.platforms.rumble),
            (PlatformId::Kick, &self.platforms.kick),
        ];
        tables
            .into_iter()
            .filter_map(|(id, t)| t.as_ref().filter(|c| c.enabled).map(|c| (id, c)))
            .collect()
    }

    /// `(platform, priority)` pairs for the arbiter.
    pub fn priorities(&self) -> Vec<(PlatformId, u32)> {
        self.enabled_platforms()
            .into_iter()
            .map(|(id, c)| (id, c.priority))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        let enabled = self.enabled_platforms();
        if enabled.is_empty() {
            bail!("enable at least one platform");
        }
        for (id, platform) in &enabled {
            if platform.channel.is_empty() {
                bail!("platforms.{id}: channel must be set");
            }
            if platform.detectors.is_empty() {
                bail!("platforms.{id}: configure at least one detector");
            }
            for detector in &platform.detectors {
                if detector.url.is_empty() {
                    bail!("platforms.{id}: detector url must be set");
                }
                if detector.refresh_minutes == 0 {
                    bail!("platforms.{id}: detector refresh_minutes must be non-zero");
                }
            }
        }
        if self.bus.url.is_empty() {
            bail!("bus.url must be set");
        }
        if self.bus.topic.is_empty() {
            bail!("bus.topic must be set");
        }
        Ok(())
    }
}
