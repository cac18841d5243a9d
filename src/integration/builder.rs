//! Builder for creating RawDetection objects from various box formats.

use crate::integration::RawDetection;
use crate::tracker::{ClassId, Rect, TrackId};

/// Builder for creating [`RawDetection`] values from model outputs.
#[derive(Debug, Clone, Default)]
pub struct RawDetectionBuilder {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    confidence: f32,
    class_id: ClassId,
    track_id: Option<TrackId>,
}

impl RawDetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, l: f32, t: f32, w: f32, h: f32) -> Self {
        self.x1 = l;
        self.y1 = t;
        self.x2 = l + w;
        self.y2 = t + h;
        self
    }

    /// Set the confidence score, clamped into [0, 1].
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set the detected class.
    pub fn class(mut self, class_id: ClassId) -> Self {
        self.class_id = class_id;
        self
    }

    /// Set the id assigned by the detector's tracker.
    pub fn track_id(mut self, track_id: TrackId) -> Self {
        self.track_id = Some(track_id);
        self
    }

    /// Build the final [`RawDetection`].
    pub fn build(self) -> RawDetection {
        RawDetection {
            track_id: self.track_id,
            class_id: self.class_id,
            confidence: self.confidence,
            bbox: Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2),
        }
    }
}
