//! Interaction subsystem: turns classified gestures into circuit edits.
//!
//! `hold` provides the shared hold-to-commit timer and the debounce gate;
//! `controller` maps gesture events onto the circuit model through them.

pub mod controller;
pub mod hold;
