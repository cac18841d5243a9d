//! Detector trait and the per-frame detection values it produces.

use serde::Serialize;

use crate::integration::Frame;
use crate::tracker::{ClassId, Rect, TrackId};

/// One detector output before the pipeline decides whether it is tracked.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Identifier from the detector's built-in tracker, if it assigned one
    pub track_id: Option<TrackId>,
    pub class_id: ClassId,
    /// Confidence score in [0, 1]
    pub confidence: f32,
    pub bbox: Rect,
}

/// A detection after partitioning by monitored class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detection {
    /// Monitored class with a track identifier; fed to the presence tracker.
    Tracked {
        track_id: TrackId,
        class_id: ClassId,
        confidence: f32,
        bbox: Rect,
    },
    /// Reported by class and confidence only, never tracked.
    PassThrough {
        class_id: ClassId,
        confidence: f32,
        bbox: Rect,
    },
}

impl Detection {
    /// Tag a raw detection. It is tracked only when its class is monitored
    /// and the detector gave it a track id.
    pub fn classify(raw: RawDetection, monitored_classes: &[ClassId]) -> Self {
        match raw.track_id {
            Some(track_id) if monitored_classes.contains(&raw.class_id) => Detection::Tracked {
                track_id,
                class_id: raw.class_id,
                confidence: raw.confidence,
                bbox: raw.bbox,
            },
            _ => Detection::PassThrough {
                class_id: raw.class_id,
                confidence: raw.confidence,
                bbox: raw.bbox,
            },
        }
    }

    /// Track id of a tracked detection; pass-through detections have none.
    pub fn track_id(&self) -> Option<TrackId> {
        match self {
            Detection::Tracked { track_id, .. } => Some(*track_id),
            Detection::PassThrough { .. } => None,
        }
    }

    /// Detected class.
    pub fn class_id(&self) -> ClassId {
        match self {
            Detection::Tracked { class_id, .. } | Detection::PassThrough { class_id, .. } => {
                *class_id
            }
        }
    }

    /// Detector confidence in [0, 1].
    pub fn confidence(&self) -> f32 {
        match self {
            Detection::Tracked { confidence, .. } | Detection::PassThrough { confidence, .. } => {
                *confidence
            }
        }
    }

    /// Bounding box in frame coordinates.
    pub fn bbox(&self) -> Rect {
        match self {
            Detection::Tracked { bbox, .. } | Detection::PassThrough { bbox, .. } => *bbox,
        }
    }
}

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model (with or without a
/// built-in multi-object tracker) to the presence pipeline.
///
/// # Example
///
/// ```ignore
/// use presence_watch::{Detector, Frame, RawDetection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl Detector for MyDetector {
///     type Error = std::io::Error;
///
///     fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, Self::Error> {
///         // Run inference and tracking, return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Detector {
    /// Error type for detection failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run inference on one frame. May block for as long as the model needs.
    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, Self::Error>;
}
