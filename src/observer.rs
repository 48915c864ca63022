//! Session-observer trait for request lifecycle events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::config::ClientConfigBuilder::observer`] to receive events as a
//! submission moves through its phases.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a Tokio channel, a GUI event loop, or a log sink
//! without the library knowing how the host application communicates.
//! Errors arrive here as events rather than blocking dialogs, so error
//! handling is testable without any alert primitive.
//!
//! # Example
//!
//! ```rust
//! use shipmerge::{ClientConfig, Phase, RequestMode, SessionObserver};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct TransitionCounter {
//!     transitions: Arc<AtomicUsize>,
//! }
//!
//! impl SessionObserver for TransitionCounter {
//!     fn on_phase_change(&self, mode: RequestMode, phase: Phase) {
//!         self.transitions.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{mode}: now {phase}");
//!     }
//! }
//!
//! let counter = Arc::new(TransitionCounter {
//!     transitions: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ClientConfig::builder()
//!     .observer(counter as Arc<dyn SessionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::state::{Phase, RequestMode};
use std::sync::Arc;

/// Called by the session as a submission moves through its lifecycle.
///
/// Implementations must be `Send + Sync`. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait SessionObserver: Send + Sync {
    /// Called on every phase transition of the state machine.
    fn on_phase_change(&self, mode: RequestMode, phase: Phase) {
        let _ = (mode, phase);
    }

    /// Called when a response was materialized into an artifact.
    ///
    /// # Arguments
    /// * `mode`     — which session slot now holds the artifact
    /// * `byte_len` — size of the artifact in bytes
    fn on_artifact_ready(&self, mode: RequestMode, byte_len: u64) {
        let _ = (mode, byte_len);
    }

    /// Called when an attempt dies, with a human-readable description.
    fn on_error(&self, mode: RequestMode, error: String) {
        let _ = (mode, error);
    }
}

/// A no-op implementation for callers that don't need lifecycle events.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type Observer = Arc<dyn SessionObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TrackingObserver {
        phases: Mutex<Vec<Phase>>,
        artifacts: AtomicUsize,
        errors: Mutex<Vec<String>>,
    }

    impl SessionObserver for TrackingObserver {
        fn on_phase_change(&self, _mode: RequestMode, phase: Phase) {
            self.phases.lock().unwrap().push(phase);
        }

        fn on_artifact_ready(&self, _mode: RequestMode, _byte_len: u64) {
            self.artifacts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _mode: RequestMode, error: String) {
            self.errors.lock().unwrap().push(error);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_phase_change(RequestMode::Preview, Phase::Validating);
        obs.on_artifact_ready(RequestMode::Finalize, 1024);
        obs.on_error(RequestMode::Finalize, "boom".to_string());
    }

    #[test]
    fn tracking_observer_receives_events() {
        let obs = TrackingObserver {
            phases: Mutex::new(vec![]),
            artifacts: AtomicUsize::new(0),
            errors: Mutex::new(vec![]),
        };

        obs.on_phase_change(RequestMode::Finalize, Phase::Validating);
        obs.on_phase_change(RequestMode::Finalize, Phase::Submitting);
        obs.on_artifact_ready(RequestMode::Finalize, 2048);
        obs.on_error(RequestMode::Finalize, "HTTP 500".to_string());

        assert_eq!(
            *obs.phases.lock().unwrap(),
            vec![Phase::Validating, Phase::Submitting]
        );
        assert_eq!(obs.artifacts.load(Ordering::SeqCst), 1);
        assert_eq!(*obs.errors.lock().unwrap(), vec!["HTTP 500"]);
    }

    #[test]
    fn arc_dyn_observer_is_send_in_spawn() {
        let obs: Observer = Arc::new(NoopObserver);
        let handle = std::thread::spawn(move || {
            obs.on_error(RequestMode::Preview, "late error".to_string());
        });
        handle.join().unwrap();
    }
}
