//! Hand landmark scheme and finger geometry.
//!
//! Landmarks arrive in normalized image coordinates (x, y in [0, 1] with y
//! growing downward, z a relative depth) indexed by the fixed 21-point
//! anatomical scheme used by the tracking pipeline: wrist = 0, then four
//! joints per finger from base to tip.  Everything here is pure geometry
//! over a single observation; no per-frame state.

use serde::{Deserialize, Serialize};

// ── Landmark indices ───────────────────────────────────────

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Wrist plus the five MCP knuckles; their centroid approximates the palm.
const PALM_INDICES: [usize; 6] = [WRIST, THUMB_CMC, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

// ── Basic types ────────────────────────────────────────────

/// One landmark point in normalized image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Which physical hand produced an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// The opposite hand.  Front-facing capture mirrors the image, so the
    /// tracking pipeline's label must be flipped before any handedness-based
    /// logic runs.
    pub fn mirrored(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// One frame's landmark set for one detected hand.
#[derive(Debug, Clone)]
pub struct HandObservation {
    /// Handedness as reported by the tracking pipeline (not yet corrected
    /// for mirrored capture).
    pub handedness: Handedness,
    /// 21 landmarks indexed by the anatomical scheme above.
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl HandObservation {
    pub fn new(handedness: Handedness) -> Self {
        Self {
            handedness,
            landmarks: [Landmark::default(); LANDMARK_COUNT],
        }
    }

    pub fn wrist(&self) -> Landmark {
        self.landmarks[WRIST]
    }
}

// ── Fingers ────────────────────────────────────────────────

/// The five fingers, each mapping to its landmark indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

pub const ALL_FINGERS: [Finger; 5] = [
    Finger::Thumb,
    Finger::Index,
    Finger::Middle,
    Finger::Ring,
    Finger::Pinky,
];

impl Finger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumb => "thumb",
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Pinky => "pinky",
        }
    }

    /// Base knuckle index (CMC for the thumb).
    pub fn mcp(&self) -> usize {
        match self {
            Self::Thumb => THUMB_CMC,
            Self::Index => INDEX_MCP,
            Self::Middle => MIDDLE_MCP,
            Self::Ring => RING_MCP,
            Self::Pinky => PINKY_MCP,
        }
    }

    /// Middle joint index (IP for the thumb).
    pub fn pip(&self) -> usize {
        match self {
            Self::Thumb => THUMB_IP,
            Self::Index => INDEX_PIP,
            Self::Middle => MIDDLE_PIP,
            Self::Ring => RING_PIP,
            Self::Pinky => PINKY_PIP,
        }
    }

    pub fn tip(&self) -> usize {
        match self {
            Self::Thumb => THUMB_TIP,
            Self::Index => INDEX_TIP,
            Self::Middle => MIDDLE_TIP,
            Self::Ring => RING_TIP,
            Self::Pinky => PINKY_TIP,
        }
    }
}

// ── Extension rule ─────────────────────────────────────────

/// Thresholds for the per-finger extension tests.
///
/// Index/middle/ring/pinky count as extended when the tip sits above the PIP
/// joint by more than `margin` (image y grows downward, so "above" means a
/// smaller y).  The thumb extends laterally instead: its tip must be farther
/// from the wrist than the base knuckle by `thumb_ratio` and displaced
/// horizontally from it by `thumb_lateral`.
#[derive(Debug, Clone)]
pub struct ExtensionRule {
    pub margin: f32,
    /// A ring finger within this much of `margin` while exactly three
    /// fingers read extended is treated as curled, protecting the
    /// two-finger count.
    pub ring_tolerance: f32,
    pub thumb_ratio: f32,
    pub thumb_lateral: f32,
}

impl Default for ExtensionRule {
    fn default() -> Self {
        Self {
            margin: 0.015,
            ring_tolerance: 0.005,
            thumb_ratio: 1.3,
            thumb_lateral: 0.05,
        }
    }
}

// ── Geometry helpers ───────────────────────────────────────

/// 2D Euclidean distance between two landmarks.  Depth is ignored: z is
/// noisy under varying camera angles and the gestures are planar.
pub fn distance_2d(a: Landmark, b: Landmark) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Centroid of the wrist and knuckle landmarks.
pub fn palm_center(landmarks: &[Landmark; LANDMARK_COUNT]) -> Landmark {
    let mut sum = Landmark::default();
    for &i in &PALM_INDICES {
        sum.x += landmarks[i].x;
        sum.y += landmarks[i].y;
        sum.z += landmarks[i].z;
    }
    let n = PALM_INDICES.len() as f32;
    Landmark::new(sum.x / n, sum.y / n, sum.z / n)
}

/// Orientation of the wrist→middle-MCP vector in degrees, normalized to
/// [0, 360).
pub fn hand_angle_deg(landmarks: &[Landmark; LANDMARK_COUNT]) -> f32 {
    let wrist = landmarks[WRIST];
    let middle = landmarks[MIDDLE_MCP];
    let mut angle = (middle.y - wrist.y).atan2(middle.x - wrist.x).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    angle
}

/// Whether a finger is extended under `rule`.  Pure function of the
/// landmark set.
pub fn is_finger_extended(
    landmarks: &[Landmark; LANDMARK_COUNT],
    finger: Finger,
    rule: &ExtensionRule,
) -> bool {
    let tip = landmarks[finger.tip()];

    if finger == Finger::Thumb {
        let wrist = landmarks[WRIST];
        let mcp = landmarks[THUMB_MCP];
        let tip_to_wrist = distance_2d(tip, wrist);
        let mcp_to_wrist = distance_2d(mcp, wrist);
        if mcp_to_wrist <= f32::EPSILON {
            return false;
        }
        let ratio_ok = tip_to_wrist / mcp_to_wrist > rule.thumb_ratio;
        let lateral_ok = (tip.x - mcp.x).abs() > rule.thumb_lateral;
        return ratio_ok && lateral_ok;
    }

    let pip = landmarks[finger.pip()];
    pip.y - tip.y > rule.margin
}

/// Count extended fingers (0–5), with the borderline-ring correction.
pub fn count_extended_fingers(
    landmarks: &[Landmark; LANDMARK_COUNT],
    rule: &ExtensionRule,
) -> u8 {
    let mut count = 0u8;
    let mut ring_extended = false;
    for finger in ALL_FINGERS {
        if is_finger_extended(landmarks, finger, rule) {
            count += 1;
            if finger == Finger::Ring {
                ring_extended = true;
            }
        }
    }

    // A barely-extended ring finger while reading three fingers usually
    // means the user is showing two; demote it.
    if count == 3 && ring_extended {
        let ring_rise = landmarks[RING_PIP].y - landmarks[RING_TIP].y;
        if ring_rise < rule.margin + rule.ring_tolerance {
            count = 2;
        }
    }

    count
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
pub(crate) fn flat_hand(handedness: Handedness) -> HandObservation {
    // A schematic upright open hand: wrist at the bottom, fingertips well
    // above their PIP joints, thumb swept out to the side.
    let mut obs = HandObservation::new(handedness);
    obs.landmarks[WRIST] = Landmark::new(0.5, 0.9, 0.0);
    obs.landmarks[THUMB_CMC] = Landmark::new(0.44, 0.84, 0.0);
    obs.landmarks[THUMB_MCP] = Landmark::new(0.42, 0.80, 0.0);
    obs.landmarks[THUMB_IP] = Landmark::new(0.38, 0.76, 0.0);
    obs.landmarks[THUMB_TIP] = Landmark::new(0.34, 0.72, 0.0);

    let finger_x = [0.46, 0.50, 0.54, 0.58];
    for (f, &x) in [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky]
        .iter()
        .zip(finger_x.iter())
    {
        obs.landmarks[f.mcp()] = Landmark::new(x, 0.70, 0.0);
        obs.landmarks[f.pip()] = Landmark::new(x, 0.60, 0.0);
        obs.landmarks[f.tip()] = Landmark::new(x, 0.45, 0.0);
    }
    obs
}

#[cfg(test)]
pub(crate) fn curl_finger(obs: &mut HandObservation, finger: Finger) {
    // Fold the tip back below the PIP joint.
    let pip = obs.landmarks[finger.pip()];
    obs.landmarks[finger.tip()] = Landmark::new(pip.x, pip.y + 0.05, 0.0);
    if finger == Finger::Thumb {
        // Tuck the thumb against the palm.
        obs.landmarks[THUMB_TIP] = Landmark::new(0.46, 0.80, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_deterministic() {
        let obs = flat_hand(Handedness::Right);
        let rule = ExtensionRule::default();
        let first = is_finger_extended(&obs.landmarks, Finger::Index, &rule);
        for _ in 0..10 {
            assert_eq!(
                is_finger_extended(&obs.landmarks, Finger::Index, &rule),
                first
            );
        }
        assert!(first);
    }

    #[test]
    fn test_all_fingers_extended_on_flat_hand() {
        let obs = flat_hand(Handedness::Left);
        let rule = ExtensionRule::default();
        for finger in ALL_FINGERS {
            assert!(
                is_finger_extended(&obs.landmarks, finger, &rule),
                "{} should be extended",
                finger.as_str()
            );
        }
        assert_eq!(count_extended_fingers(&obs.landmarks, &rule), 5);
    }

    #[test]
    fn test_curled_finger_not_extended() {
        let mut obs = flat_hand(Handedness::Left);
        curl_finger(&mut obs, Finger::Middle);
        let rule = ExtensionRule::default();
        assert!(!is_finger_extended(&obs.landmarks, Finger::Middle, &rule));
        assert_eq!(count_extended_fingers(&obs.landmarks, &rule), 4);
    }

    #[test]
    fn test_thumb_needs_lateral_displacement() {
        let mut obs = flat_hand(Handedness::Right);
        // Keep the tip far from the wrist but directly above the MCP: the
        // ratio passes, the lateral test must reject it.
        let mcp = obs.landmarks[THUMB_MCP];
        obs.landmarks[THUMB_TIP] = Landmark::new(mcp.x + 0.01, mcp.y - 0.3, 0.0);
        let rule = ExtensionRule::default();
        assert!(!is_finger_extended(&obs.landmarks, Finger::Thumb, &rule));
    }

    #[test]
    fn test_borderline_ring_demotes_three_to_two() {
        let mut obs = flat_hand(Handedness::Left);
        curl_finger(&mut obs, Finger::Thumb);
        curl_finger(&mut obs, Finger::Pinky);
        // Ring barely past the margin: extended in isolation, demoted in
        // the count.
        let pip = obs.landmarks[Finger::Ring.pip()];
        obs.landmarks[Finger::Ring.tip()] =
            Landmark::new(pip.x, pip.y - 0.017, 0.0);
        let rule = ExtensionRule::default();
        assert!(is_finger_extended(&obs.landmarks, Finger::Ring, &rule));
        assert_eq!(count_extended_fingers(&obs.landmarks, &rule), 2);
    }

    #[test]
    fn test_palm_center_between_wrist_and_knuckles() {
        let obs = flat_hand(Handedness::Right);
        let center = palm_center(&obs.landmarks);
        assert!(center.y < obs.landmarks[WRIST].y);
        assert!(center.y > obs.landmarks[MIDDLE_MCP].y);
    }

    #[test]
    fn test_hand_angle_upright() {
        let obs = flat_hand(Handedness::Right);
        // Middle MCP is almost straight above the wrist; with y growing
        // downward that vector points "up", i.e. around 270 degrees.
        let angle = hand_angle_deg(&obs.landmarks);
        assert!((angle - 270.0).abs() < 5.0, "angle was {angle}");
    }

    #[test]
    fn test_mirrored_handedness() {
        assert_eq!(Handedness::Left.mirrored(), Handedness::Right);
        assert_eq!(Handedness::Right.mirrored(), Handedness::Left);
        assert_eq!(Handedness::Left.as_str(), "left");
    }

    #[test]
    fn test_distance_2d_ignores_depth() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.3, 0.4, 9.0);
        assert!((distance_2d(a, b) - 0.5).abs() < 1e-6);
    }
}
