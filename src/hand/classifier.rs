//! Gesture classification from hand landmark observations.
//!
//! Maps one `HandObservation` per frame to a labeled, confidence-scored
//! `GestureEvent`.  Detection is priority-ordered: pinch, finger-count hold,
//! rotation, then the static poses (peace, point, thumbs-up, fist, open
//! palm), then swipe from a short rolling history, and finally `Unknown`.
//! The classifier keeps only that rolling history plus the finger-count hold
//! clock; it never touches circuit state.

use std::collections::VecDeque;

use tracing::debug;

use super::landmarks::{
    count_extended_fingers, distance_2d, hand_angle_deg, is_finger_extended, palm_center,
    ExtensionRule, Finger, HandObservation, Handedness, Landmark, INDEX_TIP, MIDDLE_TIP,
    THUMB_IP, THUMB_TIP, WRIST,
};
use crate::circuit::model::Vec2;

// ── Gesture kinds ──────────────────────────────────────────

/// The closed set of recognized gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// Thumb and index fingertips close together (right hand only).
    Pinch,
    /// All non-thumb fingers curled (fist).
    Grab,
    /// Index finger extended, others curled.
    Point,
    /// All non-thumb fingers extended.
    OpenPalm,
    /// Index and middle extended, ring and pinky curled.
    Peace,
    /// Thumb up, all other fingers curled.
    ThumbsUp,
    /// Stable extended-finger count on the left hand (1–5).
    FingerCount,
    /// Hand orientation changing frame to frame.
    Rotate,
    SwipeLeft,
    SwipeRight,
    Unknown,
}

impl GestureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pinch => "pinch",
            Self::Grab => "grab",
            Self::Point => "point",
            Self::OpenPalm => "open_palm",
            Self::Peace => "peace",
            Self::ThumbsUp => "thumbs_up",
            Self::FingerCount => "finger_count",
            Self::Rotate => "rotate",
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
            Self::Unknown => "unknown",
        }
    }
}

// ── Payloads ───────────────────────────────────────────────

/// Gesture-specific payload.  One variant per gesture family so the valid
/// field combinations are explicit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePayload {
    None,
    FingerCount {
        count: u8,
        /// True only once the count has been held for the full duration.
        is_add_action: bool,
        /// Hold progress in [0, 1], for feedback rendering.
        hold_progress: f32,
    },
    Rotation {
        /// Frame-to-frame delta in degrees, normalized to (-180, 180].
        delta_deg: f32,
        /// Absolute hand orientation in [0, 360).
        absolute_deg: f32,
    },
    OpenPalm {
        /// Extended-finger count including the thumb (4 or 5), so
        /// consumers can distinguish a full open hand from one with the
        /// thumb tucked.
        extended: u8,
    },
}

/// One classified gesture for one hand on one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub confidence: f32,
    /// Corrected for mirrored capture.
    pub handedness: Handedness,
    /// Reference point in normalized image coordinates.
    pub position: Vec2,
    pub timestamp_ms: f64,
    pub payload: GesturePayload,
}

// ── Config ─────────────────────────────────────────────────

/// Classification thresholds.  All empirically tuned; treat as knobs, not
/// derived quantities.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Maximum normalized thumb-to-index distance for a pinch.
    pub pinch_threshold: f32,
    /// Per-finger extension thresholds.
    pub extension: ExtensionRule,
    /// Maximum wrist displacement per frame for the hand to count as stable.
    pub stability_threshold: f32,
    /// Milliseconds a finger count must be held before it becomes an add.
    pub finger_hold_ms: f64,
    /// Minimum frame-to-frame angle delta (degrees) to report rotation.
    pub rotation_min_delta_deg: f32,
    /// Minimum horizontal wrist travel (normalized) for a swipe.
    pub swipe_min_dx: f32,
    /// Maximum time window (ms) for that travel.
    pub swipe_window_ms: f64,
    /// Frames of history kept for motion-based gestures.
    pub history_size: usize,
    /// Same-gesture repeats within this window get a confidence boost.
    pub smoothing_window_ms: f64,
    pub smoothing_boost: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.05,
            extension: ExtensionRule::default(),
            stability_threshold: 0.03,
            finger_hold_ms: 3000.0,
            rotation_min_delta_deg: 10.0,
            swipe_min_dx: 0.2,
            swipe_window_ms: 500.0,
            history_size: 5,
            smoothing_window_ms: 1000.0,
            smoothing_boost: 0.05,
        }
    }
}

// ── Classifier ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct HistoryFrame {
    wrist: Landmark,
    t_ms: f64,
}

#[derive(Debug, Clone, Copy)]
struct FingerHold {
    count: u8,
    start_ms: f64,
}

/// Per-hand gesture classifier.  Construct one per tracked hand and feed it
/// every frame; `reset()` when the hand is lost.
pub struct GestureClassifier {
    pub config: ClassifierConfig,
    history: VecDeque<HistoryFrame>,
    finger_hold: Option<FingerHold>,
    previous_angle: Option<f32>,
    /// Anchor for the confidence-smoothing window.
    previous: Option<(GestureKind, f64)>,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::with_config(ClassifierConfig::default())
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
            finger_hold: None,
            previous_angle: None,
            previous: None,
        }
    }

    /// Classify one observation.  `mirrored` marks front-facing capture,
    /// which flips the reported handedness before any further logic.
    pub fn classify(
        &mut self,
        obs: &HandObservation,
        mirrored: bool,
        now_ms: f64,
    ) -> GestureEvent {
        let handedness = if mirrored {
            obs.handedness.mirrored()
        } else {
            obs.handedness
        };

        // Stability against the previous frame, before this one enters the
        // history.
        let stable = self
            .history
            .back()
            .map(|prev| distance_2d(obs.wrist(), prev.wrist) < self.config.stability_threshold)
            .unwrap_or(false);

        self.history.push_back(HistoryFrame {
            wrist: obs.wrist(),
            t_ms: now_ms,
        });
        while self.history.len() > self.config.history_size {
            self.history.pop_front();
        }

        let event = self.decide(obs, handedness, stable, now_ms);
        self.smooth(event, now_ms)
    }

    /// Clear all rolling state.
    pub fn reset(&mut self) {
        self.history.clear();
        self.finger_hold = None;
        self.previous_angle = None;
        self.previous = None;
    }

    // ── Decision ladder ────────────────────────────────────

    fn decide(
        &mut self,
        obs: &HandObservation,
        handedness: Handedness,
        stable: bool,
        now_ms: f64,
    ) -> GestureEvent {
        let lm = &obs.landmarks;
        let rule = self.config.extension.clone();

        // The angle anchor refreshes every frame, before any early return,
        // so a rotation delta always spans exactly one frame even after
        // frames consumed by higher-priority gestures.
        let angle = hand_angle_deg(lm);
        let previous_angle = self.previous_angle.replace(angle);

        let index_ext = is_finger_extended(lm, Finger::Index, &rule);
        let middle_ext = is_finger_extended(lm, Finger::Middle, &rule);
        let ring_ext = is_finger_extended(lm, Finger::Ring, &rule);
        let pinky_ext = is_finger_extended(lm, Finger::Pinky, &rule);
        let all_four_ext = index_ext && middle_ext && ring_ext && pinky_ext;

        // 1. Pinch: right hand only, and not an open palm brushing the
        // threshold.
        if handedness == Handedness::Right {
            let dist = distance_2d(lm[THUMB_TIP], lm[INDEX_TIP]);
            if dist < self.config.pinch_threshold && !all_four_ext {
                let mid = Vec2 {
                    x: (lm[THUMB_TIP].x + lm[INDEX_TIP].x) / 2.0,
                    y: (lm[THUMB_TIP].y + lm[INDEX_TIP].y) / 2.0,
                };
                return self.event(GestureKind::Pinch, 0.95, handedness, mid, now_ms);
            }
        }

        // 2. Finger-count hold: left hand only, requires a stable wrist.
        if handedness == Handedness::Left {
            let count = count_extended_fingers(lm, &rule);
            if (1..=5).contains(&count) && stable {
                return self.finger_count_event(obs, handedness, count, now_ms);
            }
        }
        if self.finger_hold.take().is_some() {
            debug!("finger-count hold cancelled (moved, changed, or wrong hand)");
        }

        // 3. Rotation: needs a few frames of history to be meaningful.
        if self.history.len() >= 3 {
            if let Some(prev) = previous_angle {
                let mut delta = angle - prev;
                if delta > 180.0 {
                    delta -= 360.0;
                }
                if delta <= -180.0 {
                    delta += 360.0;
                }
                if delta.abs() > self.config.rotation_min_delta_deg {
                    let pos = to_vec2(palm_center(lm));
                    let mut event =
                        self.event(GestureKind::Rotate, 0.85, handedness, pos, now_ms);
                    event.payload = GesturePayload::Rotation {
                        delta_deg: delta,
                        absolute_deg: angle,
                    };
                    return event;
                }
            }
        }

        // 4. Static poses.
        if index_ext && middle_ext && !ring_ext && !pinky_ext {
            let pos = to_vec2(lm[MIDDLE_TIP]);
            return self.event(GestureKind::Peace, 0.9, handedness, pos, now_ms);
        }
        if index_ext && !middle_ext && !ring_ext && !pinky_ext {
            let pos = to_vec2(lm[INDEX_TIP]);
            return self.event(GestureKind::Point, 0.9, handedness, pos, now_ms);
        }
        let thumb_up = lm[THUMB_TIP].y < lm[THUMB_IP].y && lm[THUMB_TIP].y < lm[WRIST].y;
        if thumb_up && !index_ext && !middle_ext && !ring_ext && !pinky_ext {
            let pos = to_vec2(lm[THUMB_TIP]);
            return self.event(GestureKind::ThumbsUp, 0.85, handedness, pos, now_ms);
        }
        if !index_ext && !middle_ext && !ring_ext && !pinky_ext {
            let pos = to_vec2(palm_center(lm));
            return self.event(GestureKind::Grab, 0.9, handedness, pos, now_ms);
        }
        if all_four_ext {
            let pos = to_vec2(palm_center(lm));
            let mut event = self.event(GestureKind::OpenPalm, 0.92, handedness, pos, now_ms);
            event.payload = GesturePayload::OpenPalm {
                extended: count_extended_fingers(lm, &rule),
            };
            return event;
        }

        // 5. Swipe from wrist travel across the history window.
        if let Some(kind) = self.detect_swipe() {
            self.history.clear();
            let pos = to_vec2(palm_center(lm));
            return self.event(kind, 0.85, handedness, pos, now_ms);
        }

        let pos = to_vec2(palm_center(lm));
        self.event(GestureKind::Unknown, 0.5, handedness, pos, now_ms)
    }

    fn finger_count_event(
        &mut self,
        obs: &HandObservation,
        handedness: Handedness,
        count: u8,
        now_ms: f64,
    ) -> GestureEvent {
        let pos = to_vec2(palm_center(&obs.landmarks));
        let mut event = self.event(GestureKind::FingerCount, 0.9, handedness, pos, now_ms);

        match self.finger_hold {
            Some(hold) if hold.count == count => {
                let progress =
                    ((now_ms - hold.start_ms) / self.config.finger_hold_ms).min(1.0) as f32;
                if progress >= 1.0 {
                    // Commit: reset the clock so a continued hold does not
                    // re-fire immediately.
                    self.finger_hold = None;
                    debug!(count, "finger-count hold complete");
                    event.payload = GesturePayload::FingerCount {
                        count,
                        is_add_action: true,
                        hold_progress: 1.0,
                    };
                } else {
                    event.payload = GesturePayload::FingerCount {
                        count,
                        is_add_action: false,
                        hold_progress: progress,
                    };
                }
            }
            _ => {
                // New count (or first frame): restart the clock.
                self.finger_hold = Some(FingerHold {
                    count,
                    start_ms: now_ms,
                });
                event.payload = GesturePayload::FingerCount {
                    count,
                    is_add_action: false,
                    hold_progress: 0.0,
                };
            }
        }
        event
    }

    fn detect_swipe(&self) -> Option<GestureKind> {
        if self.history.len() < 3 {
            return None;
        }
        let first = self.history.front()?;
        let last = self.history.back()?;
        let dx = last.wrist.x - first.wrist.x;
        let dt = last.t_ms - first.t_ms;
        if dx.abs() > self.config.swipe_min_dx && dt < self.config.swipe_window_ms {
            Some(if dx > 0.0 {
                GestureKind::SwipeRight
            } else {
                GestureKind::SwipeLeft
            })
        } else {
            None
        }
    }

    fn event(
        &self,
        kind: GestureKind,
        confidence: f32,
        handedness: Handedness,
        position: Vec2,
        timestamp_ms: f64,
    ) -> GestureEvent {
        GestureEvent {
            kind,
            confidence,
            handedness,
            position,
            timestamp_ms,
            payload: GesturePayload::None,
        }
    }

    /// Boost confidence when the same gesture repeats quickly, to reduce
    /// flicker in downstream consumers.
    fn smooth(&mut self, mut event: GestureEvent, now_ms: f64) -> GestureEvent {
        match self.previous {
            Some((kind, t)) if kind == event.kind && now_ms - t < self.config.smoothing_window_ms => {
                event.confidence = (event.confidence + self.config.smoothing_boost).min(1.0);
            }
            _ => {
                self.previous = Some((event.kind, now_ms));
            }
        }
        event
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn to_vec2(p: Landmark) -> Vec2 {
    Vec2 { x: p.x, y: p.y }
}

// ── Tests ──────────────────────────────────────────────────
