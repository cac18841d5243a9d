//! Error types for the presence tracker and the pipeline around it.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by external collaborators (detector, renderer, persistence).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the presence tracker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    /// The caller skipped or repeated a frame index.
    #[error("invalid frame order: expected frame {expected}, got {got}")]
    InvalidFrameOrder { expected: u64, got: u64 },
}

/// Errors raised while resolving model weights to a local file.
#[derive(Debug, Error)]
pub enum ModelStoreError {
    /// No local copy exists and the remote fetch failed.
    #[error("model {remote_path} is unavailable")]
    ModelUnavailable {
        remote_path: String,
        #[source]
        source: BoxError,
    },

    /// Local filesystem failure while preparing the cache.
    #[error("model cache I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote store rejected a request.
    #[error("remote store error: {0}")]
    Remote(String),

    /// The pipeline config has no `model` section.
    #[error("no model source configured")]
    NotConfigured,
}

/// Fatal pipeline errors. Per-frame render and persist failures never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    ModelUnavailable(#[from] ModelStoreError),

    /// The detector failed on too many frames in a row.
    #[error("detector failed on {consecutive} consecutive frames")]
    DetectorFailure {
        consecutive: u32,
        #[source]
        source: BoxError,
    },

    /// Loading the detector from local weights failed.
    #[error("failed to load detector from {path}")]
    DetectorLoad {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Tracker(#[from] PresenceError),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
