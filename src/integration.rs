//! Integration layer: collaborator traits and the pipeline that drives the
//! presence tracker.
//!
//! Detection, video capture, drawing and storage live behind the traits in
//! this module ([`Detector`], [`FrameSource`], [`Renderer`], [`Persistence`],
//! [`EventSink`], [`ModelStore`]); [`PipelineController`] wires them together.

mod builder;
mod detector;
mod event_log;
mod frame;
mod model_store;
mod overlay;
mod persist;
mod pipeline;

pub use builder::RawDetectionBuilder;
pub use detector::{Detection, Detector, RawDetection};
pub use event_log::{EventSink, JsonLinesEventLog};
pub use frame::{Frame, FrameSource, IterFrameSource};
pub use model_store::{CachedModelStore, DirectoryRemote, ModelStore, RemoteEntry, RemoteStore};
pub use overlay::{
    Color, Overlay, RenderRequest, Renderer, SUSPECT_COLOR, build_overlays, class_color,
};
pub use persist::{DetectionSummary, NoPersistence, PersistPacer, PersistRequest, Persistence};
pub use pipeline::{
    CancelToken, FrameReport, PipelineBuilder, PipelineController, PipelineState, RunSummary,
    StepOutcome,
};
