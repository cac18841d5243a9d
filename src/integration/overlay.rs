//! Render instructions: overlay labels, colors and the renderer trait.

use std::collections::BTreeMap;

use crate::error::BoxError;
use crate::integration::{Detection, Frame};
use crate::tracker::{ClassId, PresenceTracker, Rect};

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Color from 8-bit channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Color reserved for entities that exceeded the presence threshold.
pub const SUSPECT_COLOR: Color = Color::rgb(255, 0, 0);

/// Muted palette without red tones, so nothing is confused with a suspect.
const PALETTE: [Color; 6] = [
    Color::rgb(100, 100, 0),
    Color::rgb(0, 100, 100),
    Color::rgb(0, 100, 0),
    Color::rgb(100, 0, 100),
    Color::rgb(100, 50, 0),
    Color::rgb(100, 0, 50),
];

/// Palette color for a class.
pub fn class_color(class_id: ClassId) -> Color {
    PALETTE[class_id as usize % PALETTE.len()]
}

/// One box to draw, with its label and color.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub bbox: Rect,
    pub label: String,
    pub color: Color,
}

/// A frame together with the overlays to draw on it.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub frame: &'a Frame,
    pub overlays: &'a [Overlay],
}

/// Draws overlays and shows or records the result.
pub trait Renderer {
    /// Draw one frame with its overlays.
    fn render(&mut self, request: RenderRequest<'_>) -> Result<(), BoxError>;

    /// Close windows or writers. Called once when the pipeline reaches a
    /// terminal state.
    fn release(&mut self) {}
}

/// Build overlays for this frame's detections against the tracker state
/// after its update.
pub fn build_overlays(
    detections: &[Detection],
    tracker: &PresenceTracker,
    class_names: &BTreeMap<ClassId, String>,
) -> Vec<Overlay> {
    detections
        .iter()
        .map(|det| match det {
            Detection::Tracked {
                track_id,
                class_id,
                bbox,
                ..
            } => {
                let (frames, suspect) = tracker
                    .entity(*track_id)
                    .map(|e| (e.total_present_frames, e.alert_fired))
                    .unwrap_or((0, false));
                if suspect {
                    Overlay {
                        bbox: *bbox,
                        label: format!("{track_id}: {frames}f (suspect)"),
                        color: SUSPECT_COLOR,
                    }
                } else {
                    Overlay {
                        bbox: *bbox,
                        label: format!("{track_id}: {frames}f"),
                        color: class_color(*class_id),
                    }
                }
            }
            Detection::PassThrough {
                class_id,
                confidence,
                bbox,
            } => {
                let name = class_names
                    .get(class_id)
                    .cloned()
                    .unwrap_or_else(|| format!("class {class_id}"));
                Overlay {
                    bbox: *bbox,
                    label: format!("{name}: {confidence:.2}"),
                    color: class_color(*class_id),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::PresenceConfig;

    fn names() -> BTreeMap<ClassId, String> {
        BTreeMap::from([(2, "car".to_string())])
    }

    fn tracked(track_id: u64) -> Detection {
        Detection::Tracked {
            track_id,
            class_id: 0,
            confidence: 0.9,
            bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
        }
    }

    #[test]
    fn test_palette_avoids_suspect_color() {
        for class_id in 0..12 {
            assert_ne!(class_color(class_id), SUSPECT_COLOR);
        }
        assert_eq!(class_color(1), class_color(7));
    }

    #[test]
    fn test_labels() {
        let mut tracker = PresenceTracker::new(PresenceConfig {
            absence_forget_threshold: 5,
            presence_alert_threshold: 1,
            ..Default::default()
        });
        tracker.update(1, [(1, 0), (2, 0)]).unwrap();
        tracker.update(2, [(1, 0)]).unwrap();

        let detections = vec![
            tracked(1),
            tracked(2),
            Detection::PassThrough {
                class_id: 2,
                confidence: 0.876,
                bbox: Rect::default(),
            },
            Detection::PassThrough {
                class_id: 9,
                confidence: 0.5,
                bbox: Rect::default(),
            },
        ];
        let overlays = build_overlays(&detections, &tracker, &names());

        assert_eq!(overlays[0].label, "1: 2f (suspect)");
        assert_eq!(overlays[0].color, SUSPECT_COLOR);
        assert_eq!(overlays[1].label, "2: 1f");
        assert_eq!(overlays[1].color, class_color(0));
        assert_eq!(overlays[2].label, "car: 0.88");
        assert_eq!(overlays[3].label, "class 9: 0.50");
    }
}
