//! Lifecycle events emitted by the presence tracker.

use serde::{Deserialize, Serialize};

use crate::tracker::entity::TrackId;

/// An entity stayed longer than the presence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub track_id: TrackId,
    pub frames_present: u64,
    pub frame_index: u64,
}

/// An entity was absent longer than the forget threshold and was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgottenEvent {
    pub track_id: TrackId,
    pub frames_absent: u64,
    pub frame_index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresenceEvent {
    Alert(AlertEvent),
    Forgotten(ForgottenEvent),
}

impl PresenceEvent {
    /// Track id the event is about.
    pub fn track_id(&self) -> TrackId {
        match self {
            PresenceEvent::Alert(e) => e.track_id,
            PresenceEvent::Forgotten(e) => e.track_id,
        }
    }

    /// Frame that produced the event.
    pub fn frame_index(&self) -> u64 {
        match self {
            PresenceEvent::Alert(e) => e.frame_index,
            PresenceEvent::Forgotten(e) => e.frame_index,
        }
    }

    /// The alert, if this is one.
    pub fn as_alert(&self) -> Option<&AlertEvent> {
        match self {
            PresenceEvent::Alert(e) => Some(e),
            PresenceEvent::Forgotten(_) => None,
        }
    }

    /// The forgotten notice, if this is one.
    pub fn as_forgotten(&self) -> Option<&ForgottenEvent> {
        match self {
            PresenceEvent::Forgotten(e) => Some(e),
            PresenceEvent::Alert(_) => None,
        }
    }
}
