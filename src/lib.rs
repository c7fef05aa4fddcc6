//! Circuit Practicum - gesture-driven circuit interaction core.
//!
//! Turns per-frame hand-landmark observations into classified gestures, and
//! classified gestures into committed circuit-editing actions (select, move,
//! add, delete, rotate, toggle, wire-connect).  The camera/landmark pipeline,
//! the rendering layer, and the UI around them are external collaborators;
//! this crate is the state-machine core between them.
//!
//! Subsystems:
//! - `hand`: landmark geometry and the `GestureClassifier`
//! - `circuit`: the component/wire data model and electrical analysis
//! - `interaction`: hold-to-commit timers and the `InteractionController`
//! - `session`: the frame-synchronous driver facade
//! - `replay`: recorded-frame format for the replay binary

pub mod circuit;
pub mod hand;
pub mod interaction;
pub mod replay;
pub mod session;

pub use circuit::model::{Circuit, Component, ComponentKind, Terminal, Vec2};
pub use hand::classifier::{GestureClassifier, GestureEvent, GestureKind};
pub use hand::landmarks::{HandObservation, Handedness, Landmark};
pub use interaction::controller::{CircuitAction, InteractionController};
pub use session::PracticumSession;
