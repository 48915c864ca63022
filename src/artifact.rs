//! Response artifacts: materialized preview/merge results.
//!
//! ## Why a named temp file?
//!
//! An artifact must be addressable: a preview is handed to a viewer, and a
//! merged document is copied to the user's chosen destination. The raw
//! response bytes are written to a [`tempfile::NamedTempFile`] and addressed
//! by path. The temp file is the artifact's resource handle: dropping the
//! [`Artifact`] deletes the file, so replacing the artifact held by a
//! session slot releases the previous handle on the same path. Repeated
//! preview/merge cycles therefore never accumulate stale files.

use crate::error::ShipMergeError;
use crate::slots::PDF_MIME;
use crate::state::RequestMode;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Fixed filename suggested for a downloaded merge result.
pub const MERGED_FILENAME: &str = "merged_shipmerge.pdf";

/// Default filename for a preview saved to disk.
pub const PREVIEW_FILENAME: &str = "preview.pdf";

/// The materialized result of a preview or finalize request.
///
/// Owned exclusively by the session slot matching its mode. The backing
/// file lives exactly as long as the artifact does.
#[derive(Debug)]
pub struct Artifact {
    mode: RequestMode,
    byte_len: u64,
    file: NamedTempFile,
}

impl Artifact {
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Path of the backing file. Dangles once the artifact is replaced.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    pub fn mime_type(&self) -> &'static str {
        PDF_MIME
    }

    /// Filename to suggest when the artifact is saved for the user.
    pub fn suggested_filename(&self) -> &'static str {
        match self.mode {
            RequestMode::Preview => PREVIEW_FILENAME,
            RequestMode::Finalize => MERGED_FILENAME,
        }
    }

    /// A lightweight, cloneable reference to this artifact.
    pub fn handle(&self) -> ArtifactHandle {
        ArtifactHandle {
            mode: self.mode,
            path: self.file.path().to_path_buf(),
            byte_len: self.byte_len,
        }
    }
}

/// Cloneable address of an [`Artifact`].
///
/// The handle does not own the backing file; the path stops resolving when
/// the session replaces or drops the artifact it points at, the same way a
/// revoked object URL stops resolving in a browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactHandle {
    pub mode: RequestMode,
    pub path: PathBuf,
    pub byte_len: u64,
}

/// Write raw response bytes into a fresh artifact tagged with `mode`.
pub fn materialize(bytes: &[u8], mode: RequestMode) -> Result<Artifact, ShipMergeError> {
    let mut file = tempfile::Builder::new()
        .prefix("shipmerge-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ShipMergeError::Internal(format!("artifact tempfile: {e}")))?;

    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| ShipMergeError::Internal(format!("artifact write: {e}")))?;

    debug!(
        mode = %mode,
        bytes = bytes.len(),
        path = %file.path().display(),
        "materialized artifact"
    );

    Ok(Artifact {
        mode,
        byte_len: bytes.len() as u64,
        file,
    })
}
