// src/state.rs
//! Durable shared state: the dedup ledger, per-platform change cursors, and
//! the advisory `current_live` map the arbiter reads. All workers mutate it
//! through one mutex; a `StateSession` guard keeps each read-modify-write
//! (dedup check → arbitration → publish → mark → persist) a single critical
//! section.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

use crate::errors::StateError;
use crate::platform::PlatformId;
use crate::types::{ledger_key, Job};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    /// Opaque per-platform change cursor (e.g. an HTTP caching token);
    /// missing entry means "no prior cursor".
    #[serde(default)]
    pub change_cursor: HashMap<PlatformId, String>,
    /// Dedup ledger of `"<platform>:<id>"` keys. Append-only.
    #[serde(default)]
    pub published: BTreeSet<String>,
    /// Last known live job per platform. Advisory only, never persisted;
    /// resets to "unknown" on restart.
    #[serde(skip)]
    pub current_live: HashMap<PlatformId, Job>,
}

#[derive(Debug)]
pub struct StateStore {
    inner: Mutex<State>,
    path: PathBuf,
}

impl StateStore {
    /// Restore persisted state, or start fresh if the blob is missing or
    /// unreadable. Never an error: a lost ledger is logged and degraded,
    /// not a crash.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<State>(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt state blob, starting fresh");
                    State::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "no persisted state, starting fresh");
                State::default()
            }
        };
        Self {
            inner: Mutex::new(state),
            path,
        }
    }

    /// Take the state lock. Everything done through the returned session is
    /// atomic with respect to other workers.
    pub async fn lock(&self) -> StateSession<'_> {
        StateSession {
            state: self.inner.lock().await,
            path: &self.path,
        }
    }
}

pub struct StateSession<'a> {
    state: MutexGuard<'a, State>,
    path: &'a Path,
}

impl StateSession<'_> {
    pub fn is_published(&self, platform: PlatformId, external_id: &str) -> bool {
        self.state
            .published
            .contains(&ledger_key(platform, external_id))
    }

    pub fn mark_published(&mut self, platform: PlatformId, external_id: &str) {
        self.state
            .published
            .insert(ledger_key(platform, external_id));
    }

    pub fn set_current_live(&mut self, platform: PlatformId, job: Option<Job>) {
        match job {
            Some(job) => {
                self.state.current_live.insert(platform, job);
            }
            None => {
                self.state.current_live.remove(&platform);
            }
        }
    }

    pub fn current_live(&self) -> &HashMap<PlatformId, Job> {
        &self.state.current_live
    }

    pub fn cursor(&self, platform: PlatformId) -> String {
        self.state
            .change_cursor
            .get(&platform)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_cursor(&mut self, platform: PlatformId, cursor: String) {
        self.state.change_cursor.insert(platform, cursor);
    }

    pub fn published_count(&self) -> usize {
        self.state.published.len()
    }

    /// Flush the full state synchronously. Atomic per call: the blob is
    /// written to a temp file and renamed into place, so a crash mid-write
    /// can never leave a torn ledger.
    pub fn persist(&self) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let blob = serde_json::to_vec_pretty(&*self.state)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, self.path)?;
        Ok(())
    }
}
