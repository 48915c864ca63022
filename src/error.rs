//! Error types for the shipmerge library.
//!
//! One enum, [`ShipMergeError`], covers every failure the client can hit.
//! The variants map onto the three points where a submission can die:
//!
//! * **Assignment time** — `InvalidFileType`, `FileNotFound`,
//!   `PermissionDenied`: a candidate document never enters its slot.
//! * **Submission time** — `MissingInput`, `Busy`: caught synchronously,
//!   before any network traffic.
//! * **In flight** — `RequestFailed`, `Cancelled`: the request was issued
//!   and did not yield an artifact.
//!
//! Every kind is terminal for the current attempt; nothing is retried
//! automatically. The session returns to idle after each failure so the
//! caller can correct the inputs and try again.

use crate::slots::SlotName;
use crate::state::RequestMode;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the shipmerge library.
#[derive(Debug, Error)]
pub enum ShipMergeError {
    // ── Document loading ──────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("document not found: '{}'\nCheck the path exists and is readable.", .path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("permission denied reading '{}'", .path.display())]
    PermissionDenied { path: PathBuf },

    // ── Slot validation ───────────────────────────────────────────────────
    /// Candidate document's declared type is not `application/pdf`.
    ///
    /// The slot keeps whatever it held before the rejected assignment.
    #[error("the {slot} document must be a PDF (got '{mime_type}')")]
    InvalidFileType { slot: SlotName, mime_type: String },

    // ── Submission ────────────────────────────────────────────────────────
    /// One or more required slots were empty at submission time.
    ///
    /// Caught before any network call is made.
    #[error("missing required documents: {}", join_slots(.missing))]
    MissingInput { missing: Vec<SlotName> },

    /// A preview or merge request is already in flight.
    ///
    /// Submissions are refused, not queued, while a request is outstanding.
    #[error("a request is already in flight; wait for it to settle")]
    Busy,

    /// Network failure or non-success response from the composition service.
    #[error("{mode} request failed: {reason}")]
    RequestFailed { mode: RequestMode, reason: String },

    /// The in-flight request was cancelled via `cancel()` or `reset()`.
    #[error("{mode} request cancelled")]
    Cancelled { mode: RequestMode },

    // ── Artifacts ─────────────────────────────────────────────────────────
    /// No artifact of the requested mode has been produced yet.
    #[error("no {mode} artifact is available; run a {mode} request first")]
    NoArtifact { mode: RequestMode },

    /// Could not persist an artifact to the destination path.
    #[error("failed to write artifact to '{}': {source}", .path.display())]
    ArtifactWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config / catch-all ────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

fn join_slots(slots: &[SlotName]) -> String {
    slots
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_lists_every_slot() {
        let e = ShipMergeError::MissingInput {
            missing: vec![SlotName::Invoice, SlotName::ShippingLabel],
        };
        let msg = e.to_string();
        assert!(msg.contains("invoice"), "got: {msg}");
        assert!(msg.contains("shipping label"), "got: {msg}");
        assert!(!msg.contains("packing slip"), "got: {msg}");
    }

    #[test]
    fn invalid_file_type_names_slot_and_mime() {
        let e = ShipMergeError::InvalidFileType {
            slot: SlotName::PackingSlip,
            mime_type: "image/png".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("packing slip"));
        assert!(msg.contains("image/png"));
    }

    #[test]
    fn request_failed_display_carries_mode() {
        let e = ShipMergeError::RequestFailed {
            mode: RequestMode::Finalize,
            reason: "HTTP 502 Bad Gateway".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("merge"));
        assert!(msg.contains("502"));
    }

    #[test]
    fn cancelled_display() {
        let e = ShipMergeError::Cancelled {
            mode: RequestMode::Preview,
        };
        assert!(e.to_string().contains("preview"));
    }
}
