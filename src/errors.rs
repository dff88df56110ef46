// src/errors.rs
//! Error taxonomy. Transient failures feed the scheduler's backoff and are
//! retried forever; fatal failures (a job that cannot be encoded, a state
//! ledger that cannot be persisted) take the worker down, and with it the
//! process, because running without a ledger risks duplicate publishes.

use thiserror::Error;

/// Errors from persisting or restoring the durable state blob.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state serialization failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("state write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the message-bus transport.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("bus returned status {status}")]
    Http { status: u16 },
}

/// Everything that can end one poll cycle early.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("detector error: {0}")]
    Detector(#[source] anyhow::Error),

    #[error("publish error: {0}")]
    Bus(#[from] BusError),

    #[error("job serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("state persistence failed: {0}")]
    Persist(#[from] StateError),
}

impl CycleError {
    /// Fatal errors terminate the worker (and the service); transient ones
    /// are retried on the next cycle under backoff.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CycleError::Serialize(_) | CycleError::Persist(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality_split() {
        let detector = CycleError::Detector(anyhow::anyhow!("timeout"));
        assert!(!detector.is_fatal());

        let bus = CycleError::Bus(BusError::Http { status: 503 });
        assert!(!bus.is_fatal());

        let bad_json = serde_json::from_str::<String>("{").unwrap_err();
        assert!(CycleError::Serialize(bad_json).is_fatal());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "ro fs");
        assert!(CycleError::Persist(StateError::Io(io)).is_fatal());
    }
}
