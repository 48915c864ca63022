//! The merge session: request orchestration and the in-flight invariant.
//!
//! [`MergeSession`] owns everything the client tracks: the three document
//! slots, the transformation options, the phase of the state machine, and
//! the artifacts produced by past requests. A submission:
//!
//! 1. acquires the in-flight flag (refusing with [`ShipMergeError::Busy`]
//!    if another request holds it; submissions are rejected, not queued);
//! 2. snapshots the slots and options, so later mutation only affects the
//!    *next* request;
//! 3. posts one multipart request to the endpoint selected by
//!    [`RequestMode`], racing it against the session's cancellation token;
//! 4. materializes the response into an [`Artifact`] stored under the
//!    mode's slot, releasing whatever that slot held before.
//!
//! Both request modes run through the same code path; they differ only in
//! endpoint and result slot.
//!
//! If the future returned by [`MergeSession::submit`] is dropped before it
//! resolves, the request is abandoned and the session returns to idle.

use crate::artifact::{self, Artifact, ArtifactHandle};
use crate::config::{ClientConfig, TransformConfig};
use crate::error::ShipMergeError;
use crate::slots::{Document, SlotName, SlotRegistry, PDF_MIME};
use crate::state::{advance, Phase, PhaseEvent, RequestMode};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Client-side orchestrator for the ShipMerge composition service.
///
/// All methods take `&self`; the session is safe to share behind an `Arc`
/// so a UI thread can mutate slots while a request is outstanding.
pub struct MergeSession {
    config: ClientConfig,
    client: reqwest::Client,
    slots: Mutex<SlotRegistry>,
    transform: Mutex<TransformConfig>,
    phase: Mutex<Phase>,
    in_flight: AtomicBool,
    cancel_tx: watch::Sender<bool>,
    preview: Mutex<Option<Artifact>>,
    merged: Mutex<Option<Artifact>>,
}

/// Clears the in-flight flag (and parks the phase back at idle) no matter
/// how `submit` exits, including when its future is dropped mid-await.
struct FlightGuard<'a> {
    session: &'a MergeSession,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        *self.session.phase.lock().unwrap() = Phase::Idle;
        self.session.in_flight.store(false, Ordering::SeqCst);
    }
}

impl MergeSession {
    /// Create a session with empty slots and default transform options.
    pub fn new(config: ClientConfig) -> Result<Self, ShipMergeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ShipMergeError::Internal(format!("building HTTP client: {e}")))?;
        let (cancel_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            client,
            slots: Mutex::new(SlotRegistry::new()),
            transform: Mutex::new(TransformConfig::default()),
            phase: Mutex::new(Phase::Idle),
            in_flight: AtomicBool::new(false),
            cancel_tx,
            preview: Mutex::new(None),
            merged: Mutex::new(None),
        })
    }

    // ── Input mutation ────────────────────────────────────────────────────

    /// Assign a candidate document to a slot.
    ///
    /// Non-PDF candidates are rejected and the slot keeps its previous
    /// contents. Assignments are accepted while a request is in flight;
    /// they affect the next request only.
    pub fn assign(&self, slot: SlotName, document: Document) -> Result<(), ShipMergeError> {
        self.slots.lock().unwrap().assign(slot, document)
    }

    /// Read a document from disk and assign it to a slot.
    pub fn assign_path(
        &self,
        slot: SlotName,
        path: impl AsRef<Path>,
    ) -> Result<(), ShipMergeError> {
        let document = Document::from_path(path)?;
        self.assign(slot, document)
    }

    /// Rotate the shipping label into landscape orientation.
    pub fn set_rotate(&self, rotate: bool) {
        self.transform.lock().unwrap().set_rotate(rotate);
    }

    /// Set the trim percentage (clamped into the valid range).
    pub fn set_trim_percentage(&self, value: u8) {
        self.transform.lock().unwrap().set_trim_percentage(value);
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Current transform options (a copy).
    pub fn transform(&self) -> TransformConfig {
        *self.transform.lock().unwrap()
    }

    /// Current phase of the state machine.
    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap()
    }

    /// True while a request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Precondition gate: true when every slot holds a document.
    pub fn all_slots_filled(&self) -> bool {
        self.slots.lock().unwrap().all_filled()
    }

    /// The slots still waiting for a document.
    pub fn missing_slots(&self) -> Vec<SlotName> {
        self.slots.lock().unwrap().missing()
    }

    /// Handle of the artifact currently held for `mode`, if any.
    pub fn artifact_handle(&self, mode: RequestMode) -> Option<ArtifactHandle> {
        match mode {
            RequestMode::Preview => self.preview.lock().unwrap().as_ref().map(Artifact::handle),
            RequestMode::Finalize => self.merged.lock().unwrap().as_ref().map(Artifact::handle),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Signal the cancellation token.
    ///
    /// An in-flight [`submit`](Self::submit) resolves to
    /// [`ShipMergeError::Cancelled`] and the machine returns to idle
    /// immediately, regardless of the pending response. A no-op when
    /// nothing is in flight.
    pub fn cancel(&self) {
        if self.is_in_flight() {
            info!("cancelling in-flight request");
        }
        self.cancel_tx.send_replace(true);
    }

    /// Start the session over: cancel any in-flight request, empty every
    /// slot, restore default transform options, and release both artifacts.
    pub fn reset(&self) {
        self.cancel();
        self.slots.lock().unwrap().clear();
        *self.transform.lock().unwrap() = TransformConfig::default();
        *self.preview.lock().unwrap() = None;
        *self.merged.lock().unwrap() = None;
        info!("session reset");
    }

    // ── Submission ────────────────────────────────────────────────────────

    /// Submit a preview or merge request.
    ///
    /// Refused synchronously with [`ShipMergeError::Busy`] while another
    /// request is in flight, and with [`ShipMergeError::MissingInput`]
    /// before any network call when a slot is empty. On success the
    /// artifact is stored under the mode's session slot (releasing the
    /// previous one) and its handle returned.
    pub async fn submit(&self, mode: RequestMode) -> Result<ArtifactHandle, ShipMergeError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!(mode = %mode, "submission refused, another request is in flight");
            return Err(ShipMergeError::Busy);
        }
        let _guard = FlightGuard { session: self };
        let started = Instant::now();

        self.advance_phase(mode, PhaseEvent::SubmitRequested);

        let docs = match self.slots.lock().unwrap().snapshot() {
            Ok(docs) => docs,
            Err(missing) => {
                let err = ShipMergeError::MissingInput { missing };
                self.advance_phase(mode, PhaseEvent::InputsMissing);
                self.notify_error(mode, &err);
                return Err(err);
            }
        };
        let transform = *self.transform.lock().unwrap();

        self.advance_phase(mode, PhaseEvent::InputsVerified);

        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            mode.endpoint_path()
        );
        info!(mode = %mode, url = %url, rotate_label = transform.rotate_label(),
              trim = transform.trim_percentage(), "submitting composition request");

        // Open a fresh cancellation window: a cancel() issued before this
        // submission must not kill it.
        self.cancel_tx.send_replace(false);
        let mut cancelled = self.cancel_tx.subscribe();

        let outcome = tokio::select! {
            res = self.perform_request(mode, &url, docs, transform) => res,
            _ = cancelled.wait_for(|&c| c) => {
                self.advance_phase(mode, PhaseEvent::Cancelled);
                let err = ShipMergeError::Cancelled { mode };
                self.notify_error(mode, &err);
                warn!(mode = %mode, "request cancelled");
                return Err(err);
            }
        };

        let bytes = match outcome {
            Ok(bytes) => bytes,
            Err(err) => return Err(self.fail(mode, err)),
        };

        if !bytes.starts_with(b"%PDF") {
            warn!(mode = %mode, "response body is missing the PDF magic bytes");
        }

        let artifact = match artifact::materialize(&bytes, mode) {
            Ok(a) => a,
            Err(err) => return Err(self.fail(mode, err)),
        };
        let handle = artifact.handle();

        // Storing releases whatever this mode's slot held before.
        match mode {
            RequestMode::Preview => *self.preview.lock().unwrap() = Some(artifact),
            RequestMode::Finalize => *self.merged.lock().unwrap() = Some(artifact),
        }

        self.advance_phase(mode, PhaseEvent::ResponseReceived);
        if let Some(cb) = &self.config.observer {
            cb.on_artifact_ready(mode, handle.byte_len);
        }
        self.advance_phase(mode, PhaseEvent::Settled);

        info!(
            mode = %mode,
            bytes = handle.byte_len,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request complete"
        );
        Ok(handle)
    }

    /// Persist the current artifact for `mode` to `dest`.
    ///
    /// A directory destination resolves to the artifact's suggested
    /// filename (`merged_shipmerge.pdf` for a merge). Uses an atomic write
    /// (temp file + rename) to avoid partial files.
    pub async fn save_artifact(
        &self,
        mode: RequestMode,
        dest: impl AsRef<Path>,
    ) -> Result<PathBuf, ShipMergeError> {
        let (src, suggested) = {
            let slot = match mode {
                RequestMode::Preview => self.preview.lock().unwrap(),
                RequestMode::Finalize => self.merged.lock().unwrap(),
            };
            let artifact = slot.as_ref().ok_or(ShipMergeError::NoArtifact { mode })?;
            (artifact.path().to_path_buf(), artifact.suggested_filename())
        };

        let dest = dest.as_ref();
        let dest = if dest.is_dir() {
            dest.join(suggested)
        } else {
            dest.to_path_buf()
        };

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ShipMergeError::ArtifactWriteFailed {
                    path: dest.clone(),
                    source: e,
                }
            })?;
        }

        let tmp = dest.with_extension("pdf.tmp");
        tokio::fs::copy(&src, &tmp)
            .await
            .map_err(|e| ShipMergeError::ArtifactWriteFailed {
                path: dest.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp, &dest)
            .await
            .map_err(|e| ShipMergeError::ArtifactWriteFailed {
                path: dest.clone(),
                source: e,
            })?;

        info!(mode = %mode, dest = %dest.display(), "artifact saved");
        Ok(dest)
    }

    // ── Internal helpers ──────────────────────────────────────────────────

    /// Build the multipart payload and run the HTTP exchange.
    ///
    /// The only suspension point of the whole state machine lives here.
    async fn perform_request(
        &self,
        mode: RequestMode,
        url: &str,
        docs: Vec<(SlotName, Document)>,
        transform: TransformConfig,
    ) -> Result<Vec<u8>, ShipMergeError> {
        let mut form = Form::new();
        for (slot, doc) in docs {
            let file_name = doc.file_name().to_string();
            let part = Part::bytes(doc.into_bytes())
                .file_name(file_name)
                .mime_str(PDF_MIME)
                .map_err(|e| ShipMergeError::Internal(format!("multipart part: {e}")))?;
            form = form.part(slot.field_name(), part);
        }
        form = form
            .text("rotate_label", transform.rotate_label())
            .text("trim_percentage", transform.trim_percentage().to_string());

        let response = self
            .client
            .post(url)
            .header(ACCEPT, PDF_MIME)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ShipMergeError::RequestFailed {
                mode,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShipMergeError::RequestFailed {
                mode,
                reason: format!("HTTP {status}"),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ShipMergeError::RequestFailed {
                mode,
                reason: format!("reading response body: {e}"),
            })?;

        debug!(mode = %mode, bytes = bytes.len(), "received response body");
        Ok(bytes.to_vec())
    }

    /// Route a request-path error through Failed and back to Idle.
    fn fail(&self, mode: RequestMode, err: ShipMergeError) -> ShipMergeError {
        self.advance_phase(mode, PhaseEvent::RequestErrored);
        self.notify_error(mode, &err);
        self.advance_phase(mode, PhaseEvent::Settled);
        err
    }

    fn advance_phase(&self, mode: RequestMode, event: PhaseEvent) {
        let next = {
            let mut phase = self.phase.lock().unwrap();
            let next = advance(*phase, event);
            if next == *phase {
                return;
            }
            *phase = next;
            next
        };
        debug!(mode = %mode, phase = %next, "phase transition");
        if let Some(cb) = &self.config.observer {
            cb.on_phase_change(mode, next);
        }
    }

    fn notify_error(&self, mode: RequestMode, err: &ShipMergeError) {
        if let Some(cb) = &self.config.observer {
            cb.on_error(mode, err.to_string());
        }
    }
}
