//! Per-identifier presence record.

use serde::Serialize;

/// Identifier assigned by the external tracker and kept stable while visible.
pub type TrackId = u64;

/// Detector class index (COCO numbering by default).
pub type ClassId = u32;

/// Presence bookkeeping for one track identifier during one streak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedEntity {
    /// Track identifier from the external tracker
    pub track_id: TrackId,
    /// Class the entity was first detected as
    pub class_id: ClassId,
    /// Frame index of the first sighting in this streak
    pub first_seen_frame: u64,
    /// Frame index of the latest sighting
    pub last_seen_frame: u64,
    /// Frames in this streak where the entity was detected
    pub total_present_frames: u64,
    /// Frames since the latest sighting
    pub consecutive_absent_frames: u64,
    /// Whether the presence alert has fired in this streak
    pub alert_fired: bool,
}

impl TrackedEntity {
    /// Start a new streak at `frame_index`.
    pub fn new(track_id: TrackId, class_id: ClassId, frame_index: u64) -> Self {
        Self {
            track_id,
            class_id,
            first_seen_frame: frame_index,
            last_seen_frame: frame_index,
            total_present_frames: 1,
            consecutive_absent_frames: 0,
            alert_fired: false,
        }
    }

    /// Record a sighting at `frame_index` and reset the absence count.
    pub fn mark_present(&mut self, frame_index: u64) {
        self.last_seen_frame = frame_index;
        self.total_present_frames += 1;
        self.consecutive_absent_frames = 0;
    }

    /// Count one more frame without a sighting.
    pub fn mark_absent(&mut self) {
        self.consecutive_absent_frames += 1;
    }

    /// Whether the entity was sighted at `frame_index`.
    pub fn is_present_at(&self, frame_index: u64) -> bool {
        self.last_seen_frame == frame_index
    }
}
