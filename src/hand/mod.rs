//! Hand subsystem: landmark geometry and gesture classification.
//!
//! Provides:
//! - `landmarks`: the 21-point hand landmark scheme, per-finger extension
//!   tests, and small geometry helpers over normalized image coordinates
//! - `classifier`: `GestureClassifier`, which maps one `HandObservation`
//!   per frame to a labeled, confidence-scored `GestureEvent`

pub mod classifier;
pub mod landmarks;
