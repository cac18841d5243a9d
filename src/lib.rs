//! Presence tracking for tracked video detections.
//!
//! [`PresenceTracker`] counts how long each track identifier has been
//! continuously present, raises an [`AlertEvent`] once an entity overstays
//! the configured threshold and forgets entities after a configured absence.
//! [`PipelineController`] drives it frame by frame from any [`Detector`].

pub mod config;
pub mod error;
pub mod integration;
pub mod tracker;

pub use config::{ModelSource, PERSON_CLASS, PipelineConfig};
pub use error::{BoxError, ConfigError, ModelStoreError, PipelineError, PresenceError};
pub use integration::{
    CachedModelStore, CancelToken, Detection, Detector, DirectoryRemote, EventSink, Frame,
    FrameReport, FrameSource, IterFrameSource, JsonLinesEventLog, ModelStore, Overlay,
    PersistRequest, Persistence, PipelineBuilder, PipelineController, PipelineState, RawDetection,
    RawDetectionBuilder, RemoteEntry, RemoteStore, RenderRequest, Renderer, RunSummary,
    StepOutcome,
};
pub use tracker::{
    AlertEvent, AlertPolicy, ClassId, ForgottenEvent, PresenceConfig, PresenceEvent,
    PresenceTracker, Rect, TrackId, TrackedEntity,
};
