//! Frame-synchronous session driver.
//!
//! One `PracticumSession` glues the per-hand classifiers to the interaction
//! controller.  The external tracking pipeline calls `process_frame` once
//! per video frame (~30 Hz) with 0–2 hand observations; everything runs to
//! completion inside that call, so no locking is needed anywhere.

use tracing::debug;

use crate::circuit::analysis::{analyze, CircuitAnalysis};
use crate::circuit::model::Vec2;
use crate::hand::classifier::GestureClassifier;
use crate::hand::landmarks::{HandObservation, Handedness};
use crate::interaction::controller::{CircuitAction, InteractionController};

/// Session-level settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Front-facing capture flips handedness; set this when the camera
    /// mirrors the user.
    pub mirrored: bool,
    /// Canonical canvas size gesture positions are scaled to, in pixels.
    pub canvas_width: f32,
    pub canvas_height: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mirrored: false,
            canvas_width: 1200.0,
            canvas_height: 700.0,
        }
    }
}

/// The whole gesture-to-circuit pipeline for one user session.
pub struct PracticumSession {
    config: SessionConfig,
    left: GestureClassifier,
    right: GestureClassifier,
    controller: InteractionController,
}

impl PracticumSession {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            left: GestureClassifier::new(),
            right: GestureClassifier::new(),
            controller: InteractionController::new(),
        }
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut InteractionController {
        &mut self.controller
    }

    /// Electrical snapshot of the current circuit, for rendering.
    pub fn analysis(&self) -> CircuitAnalysis {
        analyze(self.controller.circuit())
    }

    /// Classify and apply every hand observed this frame, in the order the
    /// observations were received.  Returns at most one action per hand.
    pub fn process_frame(
        &mut self,
        hands: &[HandObservation],
        now_ms: f64,
    ) -> Vec<CircuitAction> {
        let mut actions = Vec::new();
        let mut seen_left = false;
        let mut seen_right = false;

        for obs in hands {
            let corrected = if self.config.mirrored {
                obs.handedness.mirrored()
            } else {
                obs.handedness
            };
            let classifier = match corrected {
                Handedness::Left => {
                    seen_left = true;
                    &mut self.left
                }
                Handedness::Right => {
                    seen_right = true;
                    &mut self.right
                }
            };

            let mut event = classifier.classify(obs, self.config.mirrored, now_ms);
            event.position = Vec2::new(
                event.position.x * self.config.canvas_width,
                event.position.y * self.config.canvas_height,
            );
            debug!(
                hand = event.handedness.as_str(),
                gesture = event.kind.as_str(),
                confidence = event.confidence,
                "frame gesture"
            );
            if let Some(action) = self.controller.apply(&event) {
                actions.push(action);
            }
        }

        // A hand that left the frame loses its rolling state and any hold
        // it was driving; it must re-establish both when it returns.
        if !seen_left {
            self.left.reset();
            self.controller.hand_lost(Handedness::Left);
        }
        if !seen_right {
            self.right.reset();
            self.controller.hand_lost(Handedness::Right);
        }

        actions
    }

    /// Clear classifier and interaction state.  The circuit stays as built.
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.controller.reset();
    }
}

impl Default for PracticumSession {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────
