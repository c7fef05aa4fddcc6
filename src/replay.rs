//! Replay of recorded hand-tracking captures.
//!
//! A recording is a JSON document of timestamped frames, each carrying 0–2
//! hands as flat 63-float landmark arrays (x, y, z per landmark in index
//! order).  Replaying one drives a `PracticumSession` exactly as the live
//! tracking pipeline would and collects the resulting action log.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::hand::landmarks::{HandObservation, Handedness, Landmark, LANDMARK_COUNT};
use crate::interaction::controller::CircuitAction;
use crate::session::PracticumSession;

/// A captured tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Whether the capture was front-facing (mirrored).
    #[serde(default)]
    pub mirrored: bool,
    pub frames: Vec<RecordedFrame>,
}

/// One video frame's worth of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub t_ms: f64,
    pub hands: Vec<RecordedHand>,
}

/// One hand in one frame, landmarks flattened to 63 floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedHand {
    pub handedness: Handedness,
    pub landmarks: Vec<f32>,
}

impl RecordedHand {
    /// Rebuild the observation, or `None` when the landmark array has the
    /// wrong length.
    pub fn to_observation(&self) -> Option<HandObservation> {
        if self.landmarks.len() != LANDMARK_COUNT * 3 {
            return None;
        }
        let mut obs = HandObservation::new(self.handedness);
        for (i, chunk) in self.landmarks.chunks_exact(3).enumerate() {
            obs.landmarks[i] = Landmark::new(chunk[0], chunk[1], chunk[2]);
        }
        Some(obs)
    }

    pub fn from_observation(obs: &HandObservation) -> Self {
        let mut landmarks = Vec::with_capacity(LANDMARK_COUNT * 3);
        for lm in &obs.landmarks {
            landmarks.extend([lm.x, lm.y, lm.z]);
        }
        Self {
            handedness: obs.handedness,
            landmarks,
        }
    }
}

/// One emitted action with the frame time it occurred at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub t_ms: f64,
    pub action: CircuitAction,
}

/// Drive `session` through every frame of `recording`.  Malformed hands are
/// skipped with a warning; everything else replays as captured.
pub fn replay(session: &mut PracticumSession, recording: &Recording) -> Vec<ActionRecord> {
    let mut records = Vec::new();
    for frame in &recording.frames {
        let hands: Vec<HandObservation> = frame
            .hands
            .iter()
            .filter_map(|hand| {
                let obs = hand.to_observation();
                if obs.is_none() {
                    warn!(
                        t_ms = frame.t_ms,
                        hand = hand.handedness.as_str(),
                        len = hand.landmarks.len(),
                        "skipping hand with malformed landmark array"
                    );
                }
                obs
            })
            .collect();
        for action in session.process_frame(&hands, frame.t_ms) {
            records.push(ActionRecord {
                t_ms: frame.t_ms,
                action,
            });
        }
    }
    records
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::model::ComponentKind;
    use crate::hand::landmarks::{curl_finger, flat_hand, Finger};

    fn one_finger_left() -> RecordedHand {
        let mut obs = flat_hand(Handedness::Left);
        curl_finger(&mut obs, Finger::Thumb);
        curl_finger(&mut obs, Finger::Middle);
        curl_finger(&mut obs, Finger::Ring);
        curl_finger(&mut obs, Finger::Pinky);
        RecordedHand::from_observation(&obs)
    }

    #[test]
    fn test_recording_round_trips_through_json() {
        let recording = Recording {
            mirrored: true,
            frames: vec![RecordedFrame {
                t_ms: 33.0,
                hands: vec![one_finger_left()],
            }],
        };
        let json = serde_json::to_string(&recording).unwrap();
        let back: Recording = serde_json::from_str(&json).unwrap();
        assert_eq!(back, recording);
        assert_eq!(back.frames[0].hands[0].landmarks.len(), 63);
    }

    #[test]
    fn test_mirrored_defaults_to_false() {
        let recording: Recording = serde_json::from_str(r#"{"frames":[]}"#).unwrap();
        assert!(!recording.mirrored);
    }

    #[test]
    fn test_observation_round_trip() {
        let mut obs = flat_hand(Handedness::Right);
        curl_finger(&mut obs, Finger::Index);
        let back = RecordedHand::from_observation(&obs).to_observation().unwrap();
        assert_eq!(back.handedness, obs.handedness);
        assert_eq!(back.landmarks, obs.landmarks);
    }

    #[test]
    fn test_malformed_hand_is_skipped() {
        let mut session = PracticumSession::new();
        let recording = Recording {
            mirrored: false,
            frames: vec![RecordedFrame {
                t_ms: 0.0,
                hands: vec![RecordedHand {
                    handedness: Handedness::Left,
                    landmarks: vec![0.5; 10],
                }],
            }],
        };
        let records = replay(&mut session, &recording);
        assert!(records.is_empty());
    }

    #[test]
    fn test_replay_drives_session_to_an_add() {
        let mut session = PracticumSession::new();
        let hand = one_finger_left();
        let frames = [0.0, 33.0, 1500.0, 3100.0]
            .into_iter()
            .map(|t_ms| RecordedFrame {
                t_ms,
                hands: vec![hand.clone()],
            })
            .collect();
        let recording = Recording {
            mirrored: false,
            frames,
        };

        let records = replay(&mut session, &recording);
        let adds: Vec<_> = records
            .iter()
            .filter(|r| matches!(r.action, CircuitAction::AddDirect { .. }))
            .collect();
        assert_eq!(adds.len(), 1);
        assert_eq!(adds[0].t_ms, 3100.0);
        assert_eq!(
            session.controller().circuit().components()[0].kind,
            ComponentKind::Battery
        );
    }

    #[test]
    fn test_action_record_serializes_with_tag() {
        let record = ActionRecord {
            t_ms: 100.0,
            action: CircuitAction::StartWire {
                component_id: "battery_1".into(),
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["action"]["type"], "start_wire");
        assert_eq!(value["action"]["component_id"], "battery_1");
    }
}
