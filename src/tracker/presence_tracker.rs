//! Presence tracking state machine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PresenceError;
use crate::tracker::entity::{ClassId, TrackId, TrackedEntity};
use crate::tracker::event::{AlertEvent, ForgottenEvent, PresenceEvent};

/// When to emit an [`AlertEvent`] for an entity above the presence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// Once per streak, at the frame the threshold is first exceeded.
    #[default]
    OncePerStreak,
    /// On every frame the entity is present above the threshold.
    EveryFrame,
}

/// Configuration for the [`PresenceTracker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Absent frames tolerated before an entity is forgotten.
    pub absence_forget_threshold: u64,
    /// Present frames tolerated before an alert fires.
    pub presence_alert_threshold: u64,
    /// When alerts fire for entities above the presence threshold.
    pub alert_policy: AlertPolicy,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            absence_forget_threshold: 30,
            presence_alert_threshold: 60,
            alert_policy: AlertPolicy::OncePerStreak,
        }
    }
}

impl PresenceConfig {
    /// Derive the absence threshold from an upstream tracker's track buffer,
    /// scaled to the video frame rate the same way the tracker scales its
    /// own lost-track window. A stream that reports no usable frame rate
    /// (zero, negative or NaN) is treated as 30 fps.
    pub fn from_track_buffer(
        track_buffer: u32,
        frame_rate: f32,
        presence_alert_threshold: u64,
    ) -> Self {
        let frame_rate = if frame_rate.is_finite() && frame_rate > 0.0 {
            frame_rate
        } else {
            30.0
        };
        let max_time_lost = (frame_rate / 30.0 * track_buffer as f32) as u64;
        Self {
            absence_forget_threshold: max_time_lost,
            presence_alert_threshold,
            ..Self::default()
        }
    }
}

/// Tracks how long each identifier has been continuously present.
///
/// One instance owns one session: the entity map and the frame counter are
/// never shared, so independent pipelines each hold their own tracker.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    entities: BTreeMap<TrackId, TrackedEntity>,
    frame_id: u64,
    config: PresenceConfig,
}

impl PresenceTracker {
    /// Start an empty session; the first [`update`](Self::update) is frame 1.
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            entities: BTreeMap::new(),
            frame_id: 0,
            config,
        }
    }

    /// Advance the session by one frame.
    ///
    /// `present` holds the `(track id, class)` sightings of monitored classes
    /// in this frame; repeated ids count once. `frame_index` must be exactly
    /// one past the previous call, starting at 1.
    ///
    /// Returns the alerts (ascending track id) followed by the forgotten
    /// entities (ascending track id) produced by this frame.
    pub fn update<I>(
        &mut self,
        frame_index: u64,
        present: I,
    ) -> Result<Vec<PresenceEvent>, PresenceError>
    where
        I: IntoIterator<Item = (TrackId, ClassId)>,
    {
        let expected = self.next_frame_index();
        if frame_index != expected {
            return Err(PresenceError::InvalidFrameOrder {
                expected,
                got: frame_index,
            });
        }
        self.frame_id = frame_index;

        let mut sightings = BTreeMap::new();
        for (track_id, class_id) in present {
            sightings.entry(track_id).or_insert(class_id);
        }

        let mut events = Vec::new();

        // Step 1: refresh or create every sighted entity, then check its alert
        for (track_id, class_id) in sightings {
            let entity = self
                .entities
                .entry(track_id)
                .and_modify(|e| e.mark_present(frame_index))
                .or_insert_with(|| TrackedEntity::new(track_id, class_id, frame_index));

            if entity.total_present_frames > self.config.presence_alert_threshold {
                let first = !entity.alert_fired;
                entity.alert_fired = true;
                if first || self.config.alert_policy == AlertPolicy::EveryFrame {
                    events.push(PresenceEvent::Alert(AlertEvent {
                        track_id,
                        frames_present: entity.total_present_frames,
                        frame_index,
                    }));
                }
            }
        }

        // Step 2: age the rest and forget whoever exceeded the absence threshold
        let forget_after = self.config.absence_forget_threshold;
        self.entities.retain(|&track_id, entity| {
            if entity.is_present_at(frame_index) {
                return true;
            }
            entity.mark_absent();
            if entity.consecutive_absent_frames > forget_after {
                events.push(PresenceEvent::Forgotten(ForgottenEvent {
                    track_id,
                    frames_absent: entity.consecutive_absent_frames,
                    frame_index,
                }));
                return false;
            }
            true
        });

        Ok(events)
    }

    /// The entity currently tracked under `track_id`, if any.
    pub fn entity(&self, track_id: TrackId) -> Option<&TrackedEntity> {
        self.entities.get(&track_id)
    }

    /// Entities in ascending track id order.
    pub fn entities(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.entities.values()
    }

    /// Number of entities in the session.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the session tracks no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Last processed frame index (0 before the first update).
    pub fn frame_index(&self) -> u64 {
        self.frame_id
    }

    /// The only frame index the next update accepts.
    pub fn next_frame_index(&self) -> u64 {
        self.frame_id + 1
    }

    /// Thresholds and alert policy of this session.
    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }
}
