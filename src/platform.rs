// src/platform.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of detection targets. Adding a platform means adding a variant
/// here plus a table in the config, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Youtube,
    Rumble,
    Kick,
}

impl PlatformId {
    pub const ALL: [PlatformId; 3] = [PlatformId::Youtube, PlatformId::Rumble, PlatformId::Kick];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Youtube => "youtube",
            PlatformId::Rumble => "rumble",
            PlatformId::Kick => "kick",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a detector arrives at its verdict. `Api` detectors are cursor-capable
/// (conditional requests against a change cursor); `Scraper` detectors are
/// plain polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectMethod {
    Scraper,
    Api,
}

impl DetectMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectMethod::Scraper => "scraper",
            DetectMethod::Api => "api",
        }
    }
}

impl fmt::Display for DetectMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&PlatformId::Youtube).unwrap(),
            "\"youtube\""
        );
        let p: PlatformId = serde_json::from_str("\"kick\"").unwrap();
        assert_eq!(p, PlatformId::Kick);
    }

    #[test]
    fn display_matches_as_str() {
        for p in PlatformId::ALL {
            assert_eq!(p.to_string(), p.as_str());
        }
    }
}
