// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod arbiter;
pub mod bus;
pub mod config;
pub mod detector;
pub mod errors;
pub mod healthcheck;
pub mod hooks;
pub mod metrics;
pub mod platform;
pub mod publisher;
pub mod scheduler;
pub mod service;
pub mod state;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::arbiter::Arbiter;
pub use crate::bus::{HttpBus, MessageBus};
pub use crate::config::Config;
pub use crate::errors::{BusError, CycleError, StateError};
pub use crate::hooks::{ExtensionHooks, HookOutcome, NoopHooks};
pub use crate::platform::{DetectMethod, PlatformId};
pub use crate::publisher::EventPublisher;
pub use crate::scheduler::{Backoff, Worker};
pub use crate::state::StateStore;
pub use crate::types::{Detector, Job, LivestreamProbe, Poll, Survey};
