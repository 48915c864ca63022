//! The submission state machine: request modes, phases, and the reducer.
//!
//! The session's lifecycle is modelled as an explicit phase value driven
//! through a pure transition function rather than ad-hoc flags scattered
//! across the orchestrator. [`advance`] takes the current [`Phase`] and a
//! [`PhaseEvent`] and returns the next phase; it touches nothing else, so
//! the whole transition table is testable without a network or a UI harness.
//!
//! ```text
//!         SubmitRequested          InputsVerified
//! Idle ───────────────▶ Validating ─────────────▶ Submitting
//!  ▲                        │                     │        │
//!  │     InputsMissing      │      ResponseReceived        │ RequestErrored
//!  ├────────────────────────┘                     │        │
//!  │              Settled                         ▼        ▼
//!  ├───────────────────────────────────────── Succeeded  Failed
//!  │              Settled / Cancelled                        │
//!  └─────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two composition requests is being made.
///
/// The two modes are symmetric on the wire (identical payload shape) and
/// differ only in endpoint and in how the response artifact is consumed:
/// `Preview` renders inline, `Finalize` is downloaded under a fixed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// Live preview of the combined document (`POST /preview`).
    Preview,
    /// Final merged document for download (`POST /upload`).
    Finalize,
}

impl RequestMode {
    /// Path of the service endpoint this mode targets, relative to the
    /// configured base URL.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            RequestMode::Preview => "/preview",
            RequestMode::Finalize => "/upload",
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // "merge" is the user-facing name of the finalize action.
        match self {
            RequestMode::Preview => write!(f, "preview"),
            RequestMode::Finalize => write!(f, "merge"),
        }
    }
}

/// Where the session currently is in its request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No request in flight; submissions accepted.
    Idle,
    /// A submission was requested; inputs are being checked.
    Validating,
    /// The request is on the wire; awaiting the service's response.
    Submitting,
    /// The response was materialized into an artifact.
    Succeeded,
    /// The request died (network error or non-success response).
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Validating => "validating",
            Phase::Submitting => "submitting",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Everything that can happen to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// The user triggered a preview or merge action.
    SubmitRequested,
    /// All three slots were filled; the request can be built.
    InputsVerified,
    /// At least one slot was empty; the attempt ends before the network.
    InputsMissing,
    /// The service answered with a success response.
    ResponseReceived,
    /// The request failed on the wire or the service answered non-success.
    RequestErrored,
    /// The in-flight request was cancelled by the user.
    Cancelled,
    /// A terminal phase (succeeded/failed) was observed; return to idle.
    Settled,
}

/// Pure reducer over the submission lifecycle.
///
/// Events that are not legal in the current phase leave the phase unchanged,
/// which keeps the function total: callers never need to handle an
/// "impossible transition" error.
pub fn advance(phase: Phase, event: PhaseEvent) -> Phase {
    use Phase::*;
    use PhaseEvent::*;

    match (phase, event) {
        (Idle, SubmitRequested) => Validating,
        (Validating, InputsVerified) => Submitting,
        (Validating, InputsMissing) => Idle,
        (Submitting, ResponseReceived) => Succeeded,
        (Submitting, RequestErrored) => Failed,
        (Submitting, Cancelled) => Idle,
        (Succeeded, Settled) | (Failed, Settled) => Idle,
        (p, _) => p,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths() {
        assert_eq!(RequestMode::Preview.endpoint_path(), "/preview");
        assert_eq!(RequestMode::Finalize.endpoint_path(), "/upload");
    }

    #[test]
    fn happy_path_reaches_idle_again() {
        let mut p = Phase::Idle;
        for ev in [
            PhaseEvent::SubmitRequested,
            PhaseEvent::InputsVerified,
            PhaseEvent::ResponseReceived,
            PhaseEvent::Settled,
        ] {
            p = advance(p, ev);
        }
        assert_eq!(p, Phase::Idle);
    }

    #[test]
    fn missing_inputs_short_circuit_to_idle() {
        let p = advance(Phase::Idle, PhaseEvent::SubmitRequested);
        assert_eq!(p, Phase::Validating);
        assert_eq!(advance(p, PhaseEvent::InputsMissing), Phase::Idle);
    }

    #[test]
    fn failure_path_settles_to_idle() {
        let p = advance(Phase::Submitting, PhaseEvent::RequestErrored);
        assert_eq!(p, Phase::Failed);
        assert_eq!(advance(p, PhaseEvent::Settled), Phase::Idle);
    }

    #[test]
    fn cancellation_returns_straight_to_idle() {
        assert_eq!(
            advance(Phase::Submitting, PhaseEvent::Cancelled),
            Phase::Idle
        );
    }

    #[test]
    fn illegal_events_leave_phase_unchanged() {
        assert_eq!(
            advance(Phase::Idle, PhaseEvent::ResponseReceived),
            Phase::Idle
        );
        assert_eq!(
            advance(Phase::Submitting, PhaseEvent::SubmitRequested),
            Phase::Submitting
        );
        assert_eq!(
            advance(Phase::Validating, PhaseEvent::Settled),
            Phase::Validating
        );
    }

    #[test]
    fn reducer_is_total() {
        // Every (phase, event) pair must map to some phase without panicking.
        let phases = [
            Phase::Idle,
            Phase::Validating,
            Phase::Submitting,
            Phase::Succeeded,
            Phase::Failed,
        ];
        let events = [
            PhaseEvent::SubmitRequested,
            PhaseEvent::InputsVerified,
            PhaseEvent::InputsMissing,
            PhaseEvent::ResponseReceived,
            PhaseEvent::RequestErrored,
            PhaseEvent::Cancelled,
            PhaseEvent::Settled,
        ];
        for p in phases {
            for e in events {
                let _ = advance(p, e);
            }
        }
    }

    #[test]
    fn mode_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RequestMode::Finalize).unwrap(),
            "\"finalize\""
        );
        assert_eq!(
            serde_json::to_string(&RequestMode::Preview).unwrap(),
            "\"preview\""
        );
    }
}
