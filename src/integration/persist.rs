//! Snapshot persistence requests and the pacing timer that throttles them.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::BoxError;
use crate::integration::{Detection, Frame};
use crate::tracker::{ClassId, TrackId};

/// Serializable summary of one detection in a persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub class_id: ClassId,
    pub confidence: f32,
    /// Center x, center y, width, height
    pub bbox_xywh: [f32; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<TrackId>,
}

impl From<&Detection> for DetectionSummary {
    fn from(det: &Detection) -> Self {
        Self {
            class_id: det.class_id(),
            confidence: det.confidence(),
            bbox_xywh: det.bbox().to_xywh(),
            track_id: det.track_id(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PersistRequest<'a> {
    pub frame: &'a Frame,
    pub detection_summary: Vec<DetectionSummary>,
    pub timestamp: DateTime<Local>,
    pub frame_index: u64,
}

/// Writes snapshots (annotated image, detection JSON, ...). The format is up
/// to the implementation; one writer per output destination.
pub trait Persistence {
    fn persist(&mut self, request: PersistRequest<'_>) -> Result<(), BoxError>;
}

/// Persistence that drops every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersistence;

impl Persistence for NoPersistence {
    fn persist(&mut self, _request: PersistRequest<'_>) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Allows at most one snapshot per interval, and only for frames that have
/// detections.
#[derive(Debug, Clone)]
pub struct PersistPacer {
    interval: Duration,
    last_persist: Instant,
}

impl PersistPacer {
    /// The timer starts now, so the first snapshot waits a full interval.
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    /// Pacer whose interval is measured from `start`.
    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_persist: start,
        }
    }

    /// A snapshot is due when the frame has detections and the interval has elapsed.
    pub fn is_due(&self, detection_count: usize, now: Instant) -> bool {
        detection_count > 0 && now.saturating_duration_since(self.last_persist) >= self.interval
    }

    /// Restart the interval at `now`, whether or not the persist succeeded.
    pub fn mark_persisted(&mut self, now: Instant) {
        self.last_persist = now;
    }

    /// Minimum gap between snapshots.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Rect;

    #[test]
    fn test_pacer_requires_detections_and_elapsed_interval() {
        let start = Instant::now();
        let mut pacer = PersistPacer::starting_at(Duration::from_secs(1), start);

        assert!(!pacer.is_due(3, start + Duration::from_millis(999)));
        assert!(!pacer.is_due(0, start + Duration::from_secs(5)));
        assert!(pacer.is_due(1, start + Duration::from_secs(1)));

        pacer.mark_persisted(start + Duration::from_secs(1));
        assert!(!pacer.is_due(1, start + Duration::from_millis(1500)));
        assert!(pacer.is_due(1, start + Duration::from_secs(2)));
    }

    #[test]
    fn test_summary_serializes_xywh() {
        let det = Detection::PassThrough {
            class_id: 3,
            confidence: 0.5,
            bbox: Rect::new(0.0, 0.0, 10.0, 20.0),
        };
        let json = serde_json::to_value(DetectionSummary::from(&det)).unwrap();
        assert_eq!(json["class_id"], 3);
        assert_eq!(json["bbox_xywh"], serde_json::json!([5.0, 10.0, 10.0, 20.0]));
        assert!(json.get("track_id").is_none());
    }
}
