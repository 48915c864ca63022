//! # shipmerge
//!
//! Client for the ShipMerge document composition service: combine an
//! invoice, a packing slip, and a shipping label into one printable PDF
//! produced by a remote composer.
//!
//! ## Why this crate?
//!
//! The composition itself (merge, rotate, trim) happens server-side; what a
//! client has to get right is the orchestration around it: three validated
//! document inputs, two transformation options, a preview/finalize choice,
//! and the guarantee that at most one request is ever in flight. This crate
//! packages that orchestration as an explicit, observable state machine
//! instead of flags scattered across a UI.
//!
//! ## Request Lifecycle
//!
//! ```text
//! assign ×3 ──▶ submit(mode)
//!                 │
//!                 ├─ 1. Validate   all three slots filled? (no network yet)
//!                 ├─ 2. Build      multipart payload + rotate/trim fields
//!                 ├─ 3. Submit     POST /preview or /upload, Accept: application/pdf
//!                 └─ 4. Materialize response bytes → Artifact (temp file, RAII)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shipmerge::{ClientConfig, MergeSession, RequestMode, SlotName};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base URL from SHIPMERGE_BASE_URL, default http://127.0.0.1:5000
//!     let session = MergeSession::new(ClientConfig::default())?;
//!
//!     session.assign_path(SlotName::Invoice, "invoice.pdf")?;
//!     session.assign_path(SlotName::PackingSlip, "packing_slip.pdf")?;
//!     session.assign_path(SlotName::ShippingLabel, "shipping_label.pdf")?;
//!     session.set_rotate(true);
//!
//!     let handle = session.submit(RequestMode::Finalize).await?;
//!     eprintln!("merged document: {} bytes", handle.byte_len);
//!     session
//!         .save_artifact(RequestMode::Finalize, "merged_shipmerge.pdf")
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `shipmerge` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! shipmerge = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod config;
pub mod error;
pub mod observer;
pub mod session;
pub mod slots;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{materialize, Artifact, ArtifactHandle, MERGED_FILENAME, PREVIEW_FILENAME};
pub use config::{
    ClientConfig, ClientConfigBuilder, TransformConfig, DEFAULT_BASE_URL, TRIM_MAX, TRIM_MIN,
};
pub use error::ShipMergeError;
pub use observer::{NoopObserver, Observer, SessionObserver};
pub use session::MergeSession;
pub use slots::{Document, SlotName, SlotRegistry, PDF_MIME};
pub use state::{advance, Phase, PhaseEvent, RequestMode};
