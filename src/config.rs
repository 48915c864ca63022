//! Configuration types: transformation options and client settings.
//!
//! [`TransformConfig`] is the user-tweakable pair of knobs sent with every
//! request; its fields are private so the trim-percentage bound holds by
//! construction. [`ClientConfig`] is the per-session plumbing (base URL,
//! timeout, observer), built through [`ClientConfigBuilder`] with a
//! validating `build()`.

use crate::error::ShipMergeError;
use crate::observer::Observer;
use serde::Serialize;
use std::fmt;

/// Default composition-service base URL, used when `SHIPMERGE_BASE_URL` is
/// unset.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Lowest trim percentage the service accepts.
pub const TRIM_MIN: u8 = 10;
/// Highest trim percentage (no trimming).
pub const TRIM_MAX: u8 = 100;

/// The two transformation parameters applied by the composition service.
///
/// Mutable at any time; a request in flight is unaffected because the
/// session snapshots this value when the request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransformConfig {
    rotate: bool,
    trim_percentage: u8,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            rotate: false,
            trim_percentage: TRIM_MAX,
        }
    }
}

impl TransformConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate the shipping label into landscape orientation.
    pub fn set_rotate(&mut self, rotate: bool) {
        self.rotate = rotate;
    }

    /// Set the trim percentage, clamped into `[TRIM_MIN, TRIM_MAX]`.
    pub fn set_trim_percentage(&mut self, value: u8) {
        self.trim_percentage = value.clamp(TRIM_MIN, TRIM_MAX);
    }

    pub fn rotate(&self) -> bool {
        self.rotate
    }

    pub fn trim_percentage(&self) -> u8 {
        self.trim_percentage
    }

    /// Wire representation of the rotation flag.
    ///
    /// The service expects a page-orientation token, not a boolean.
    pub fn rotate_label(&self) -> &'static str {
        if self.rotate {
            "landscape"
        } else {
            "portrait"
        }
    }
}

/// Per-session client settings.
///
/// Built via [`ClientConfig::builder()`] or [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use shipmerge::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://composer.internal:5000")
///     .request_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the composition service. Default: `SHIPMERGE_BASE_URL`
    /// from the environment, falling back to [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Whole-request timeout in seconds. Default: 120.
    ///
    /// The service rasterises three documents per request; generous by
    /// default so large label sheets don't time out on slow links.
    pub request_timeout_secs: u64,

    /// Observer notified of phase changes, artifacts, and errors.
    pub observer: Option<Observer>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let base_url = std::env::var("SHIPMERGE_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            request_timeout_secs: 120,
            observer: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn SessionObserver>"))
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating the base URL.
    pub fn build(self) -> Result<ClientConfig, ShipMergeError> {
        let url = reqwest::Url::parse(&self.config.base_url).map_err(|e| {
            ShipMergeError::InvalidConfig(format!(
                "base URL '{}' is not a valid URL: {e}",
                self.config.base_url
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ShipMergeError::InvalidConfig(format!(
                "base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(self.config)
    }
}
