// src/arbiter.rs
//! Simulcast arbitration. When the creator is live on several platforms at
//! once, only the platform with the lowest priority number may publish a
//! job; priorities 0 and 1 publish unconditionally.

use std::collections::HashMap;

use crate::platform::PlatformId;
use crate::types::Job;

#[derive(Debug, Clone)]
pub struct Arbiter {
    priorities: Vec<(PlatformId, u32)>,
}

impl Arbiter {
    /// `priorities` holds every enabled platform with its configured
    /// priority number.
    pub fn new(priorities: Vec<(PlatformId, u32)>) -> Self {
        Self { priorities }
    }

    fn priority_of(&self, platform: PlatformId) -> u32 {
        self.priorities
            .iter()
            .find(|(p, _)| *p == platform)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Whether `platform` may publish, given the current advisory live map.
    /// Must be called under the same state lock as the publish decision it
    /// gates, so no two platforms can race past each other.
    pub fn allowed(&self, platform: PlatformId, current_live: &HashMap<PlatformId, Job>) -> bool {
        let priority = self.priority_of(platform);
        if priority <= 1 {
            return true;
        }
        for (other, other_priority) in &self.priorities {
            if *other == platform {
                continue;
            }
            if *other_priority < priority && current_live.contains_key(other) {
                return false;
            }
        }
        // No lower-numbered platform is live: lowest live platform wins.
        true
    }
}
