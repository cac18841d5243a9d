mod entity;
mod event;
mod presence_tracker;
mod rect;

pub use entity::{ClassId, TrackId, TrackedEntity};
pub use event::{AlertEvent, ForgottenEvent, PresenceEvent};
pub use presence_tracker::{AlertPolicy, PresenceConfig, PresenceTracker};
pub use rect::Rect;
