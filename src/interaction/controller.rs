//! Gesture-to-action mapping over the circuit model.
//!
//! `InteractionController` owns the `Circuit` and is the only writer to it.
//! Each frame it receives classified `GestureEvent`s (one per hand) and maps
//! them to at most one `CircuitAction` each.  Roles are split by hand: the
//! left hand adds (finger-count hold) and deletes (open-palm hold); the
//! right hand selects, moves, rotates, toggles, and runs the wire handshake.
//!
//! Nothing here can fail fatally: low-confidence events are dropped, holds
//! with no target stay inactive, and stale wire handshakes time out back to
//! idle.

use serde::Serialize;
use tracing::{debug, info};

use super::hold::{DebounceGate, HoldTimer, HoldUpdate};
use crate::circuit::model::{
    Circuit, ComponentKind, SwitchState, Terminal, TerminalRef, Vec2,
};
use crate::hand::classifier::{GestureEvent, GestureKind, GesturePayload};
use crate::hand::landmarks::Handedness;

// ── Actions ────────────────────────────────────────────────

/// One circuit edit or feedback record, emitted per frame per hand.
///
/// The `*_hold_progress` variants are feedback only (progress rings, dashed
/// wire previews); consumers must not mutate state from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CircuitAction {
    /// Selection changed; `None` means the pinch missed and cleared it.
    Select {
        component_id: Option<String>,
    },
    Move {
        component_id: String,
        position: Vec2,
    },
    AddDirect {
        component_id: String,
        component_kind: ComponentKind,
        position: Vec2,
    },
    AddHoldProgress {
        component_kind: ComponentKind,
        hold_progress: f32,
    },
    OpenPalmDelete {
        component_id: String,
    },
    DeleteHoldProgress {
        component_id: String,
        hold_progress: f32,
    },
    Toggle {
        component_id: String,
        state: SwitchState,
    },
    ToggleHoldProgress {
        component_id: String,
        hold_progress: f32,
    },
    Rotate {
        component_id: String,
        rotation_deg: f32,
    },
    RotateHoldProgress {
        component_id: String,
        hold_progress: f32,
    },
    RotateSmooth {
        component_id: String,
        rotation_deg: f32,
    },
    StartWire {
        component_id: String,
    },
    PointHoldProgress {
        component_id: String,
        hold_progress: f32,
    },
    TerminalHoldProgress {
        component_id: String,
        terminal: Terminal,
        hold_progress: f32,
    },
    WireDragging {
        position: Vec2,
    },
    CompleteWire {
        component_id: String,
        target_component_id: String,
    },
    WireCreated {
        wire_id: String,
        from: TerminalRef,
        to: TerminalRef,
    },
}

// ── Config ─────────────────────────────────────────────────

/// Tuning knobs for the controller.  Radii are in canonical canvas pixels;
/// durations in milliseconds.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Confidence gate for pinch and point events.
    pub pinch_point_gate: f32,
    /// Confidence gate for every other gesture.
    pub default_gate: f32,
    pub select_radius: f32,
    pub delete_radius: f32,
    pub rotate_radius: f32,
    pub terminal_radius: f32,
    pub debounce_ms: f64,
    pub delete_hold_ms: f64,
    pub toggle_hold_ms: f64,
    pub rotate_hold_ms: f64,
    pub wire_hold_ms: f64,
    pub terminal_hold_ms: f64,
    /// Post-commit cooldown for toggle and rotate holds.
    pub commit_cooldown_ms: f64,
    /// Inactivity window after which a wire handshake is cancelled.
    pub wire_timeout_ms: f64,
    /// Continuous rotation snaps to multiples of this.
    pub rotate_snap_deg: f32,
    /// Rotation applied by one committed rotate hold.
    pub rotate_step_deg: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            pinch_point_gate: 0.70,
            default_gate: 0.75,
            select_radius: 80.0,
            delete_radius: 100.0,
            rotate_radius: 150.0,
            terminal_radius: 35.0,
            debounce_ms: 100.0,
            delete_hold_ms: 3000.0,
            toggle_hold_ms: 3000.0,
            rotate_hold_ms: 5000.0,
            wire_hold_ms: 3000.0,
            terminal_hold_ms: 2000.0,
            commit_cooldown_ms: 1000.0,
            wire_timeout_ms: 5000.0,
            rotate_snap_deg: 15.0,
            rotate_step_deg: 90.0,
        }
    }
}

/// Component kind picked by a left-hand finger count, if any.
fn kind_for_count(count: u8) -> Option<ComponentKind> {
    match count {
        1 => Some(ComponentKind::Battery),
        2 => Some(ComponentKind::Lamp),
        3 => Some(ComponentKind::Resistor),
        4 => Some(ComponentKind::Switch),
        _ => None,
    }
}

fn snap_angle(angle_deg: f32, snap_deg: f32) -> f32 {
    (angle_deg / snap_deg).round() * snap_deg
}

// ── Wire handshake ─────────────────────────────────────────

/// Phase of the point-hold wire handshake.
#[derive(Debug, Clone, PartialEq)]
enum WirePhase {
    Idle,
    HoldingStart,
    ChoosingStartTerminal { component: String },
    Dragging { from: TerminalRef },
    HoldingTarget { from: TerminalRef },
    ChoosingEndTerminal { from: TerminalRef, target: String },
}

// ── Controller ─────────────────────────────────────────────

/// Per-session interaction state.  Construct once, feed every classified
/// gesture event, `reset()` between exercises.
pub struct InteractionController {
    pub config: ControllerConfig,
    circuit: Circuit,
    selected: Option<String>,
    pinch_active: bool,
    debounce: DebounceGate,
    delete_hold: HoldTimer,
    toggle_hold: HoldTimer,
    rotate_hold: HoldTimer,
    wire_hold: HoldTimer,
    terminal_hold: HoldTimer,
    wire: WirePhase,
    last_point_ms: f64,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        Self {
            debounce: DebounceGate::new(config.debounce_ms),
            delete_hold: HoldTimer::new(config.delete_hold_ms),
            toggle_hold: HoldTimer::with_cooldown(
                config.toggle_hold_ms,
                config.commit_cooldown_ms,
            ),
            rotate_hold: HoldTimer::with_cooldown(
                config.rotate_hold_ms,
                config.commit_cooldown_ms,
            ),
            wire_hold: HoldTimer::new(config.wire_hold_ms),
            terminal_hold: HoldTimer::new(config.terminal_hold_ms),
            config,
            circuit: Circuit::new(),
            selected: None,
            pinch_active: false,
            wire: WirePhase::Idle,
            last_point_ms: 0.0,
        }
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Direct access for loading or seeding a circuit.  All gesture-driven
    /// edits still go through `apply`.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Drop every hold and sub-state owned by a hand that left the frame.
    /// A hold must never accumulate across an absence: the qualifying
    /// gesture has ceased, even though no event says so.
    pub fn hand_lost(&mut self, handedness: Handedness) {
        match handedness {
            Handedness::Left => self.delete_hold.clear(),
            Handedness::Right => {
                if self.pinch_active {
                    self.pinch_active = false;
                    self.selected = None;
                    debug!("pinch released by hand loss");
                }
                self.rotate_hold.clear();
                self.toggle_hold.clear();
                self.wire_hold.clear();
                self.terminal_hold.clear();
            }
        }
    }

    /// Clear all interaction state.  The circuit itself is untouched.
    pub fn reset(&mut self) {
        self.selected = None;
        self.pinch_active = false;
        self.debounce.reset();
        self.delete_hold.clear();
        self.toggle_hold.clear();
        self.rotate_hold.clear();
        self.cancel_wire("reset");
    }

    /// Map one classified gesture event to at most one action.
    pub fn apply(&mut self, event: &GestureEvent) -> Option<CircuitAction> {
        let gate = match event.kind {
            GestureKind::Pinch | GestureKind::Point => self.config.pinch_point_gate,
            _ => self.config.default_gate,
        };
        if event.confidence < gate {
            debug!(
                kind = event.kind.as_str(),
                confidence = event.confidence,
                "event below confidence gate"
            );
            return None;
        }

        if self.wire != WirePhase::Idle
            && event.timestamp_ms - self.last_point_ms > self.config.wire_timeout_ms
        {
            self.cancel_wire("inactivity timeout");
        }

        self.note_gesture(event);

        match (event.handedness, event.kind) {
            (Handedness::Left, GestureKind::FingerCount) => self.on_finger_count(event),
            // Delete requires the full open hand; a tucked thumb does not
            // qualify.
            (Handedness::Left, GestureKind::OpenPalm)
                if matches!(event.payload, GesturePayload::OpenPalm { extended: 5 }) =>
            {
                self.on_delete_hold(event)
            }
            (Handedness::Right, GestureKind::Pinch) => self.on_pinch(event),
            (Handedness::Right, GestureKind::Point) => self.on_point(event),
            (Handedness::Right, GestureKind::Peace) => self.on_rotate_hold(event),
            (Handedness::Right, GestureKind::ThumbsUp) => self.on_toggle_hold(event),
            (Handedness::Right, GestureKind::OpenPalm) => self.on_auto_grab(event),
            (Handedness::Right, GestureKind::Rotate) => self.on_smooth_rotate(event),
            // Fist is deliberately inert so a closing hand never deletes or
            // drops anything.
            (Handedness::Right, GestureKind::Grab) => None,
            _ => None,
        }
    }

    /// Release and reset rules that fire the moment a hand stops showing
    /// the qualifying gesture.
    fn note_gesture(&mut self, event: &GestureEvent) {
        match event.handedness {
            Handedness::Right => {
                if event.kind != GestureKind::Pinch && self.pinch_active {
                    self.pinch_active = false;
                    self.selected = None;
                    debug!("pinch released, selection cleared");
                }
                if event.kind != GestureKind::Point && self.wire != WirePhase::Idle {
                    self.cancel_wire("gesture left point classification");
                }
                if event.kind != GestureKind::Peace {
                    self.rotate_hold.clear();
                }
                if event.kind != GestureKind::ThumbsUp {
                    self.toggle_hold.clear();
                }
            }
            Handedness::Left => {
                let delete_candidate =
                    matches!(event.payload, GesturePayload::OpenPalm { extended: 5 })
                        || matches!(event.payload, GesturePayload::FingerCount { count: 5, .. });
                if !delete_candidate {
                    self.delete_hold.clear();
                }
            }
        }
    }

    fn cancel_wire(&mut self, reason: &str) {
        if self.wire != WirePhase::Idle {
            info!(reason, "wire handshake cancelled");
        }
        self.wire = WirePhase::Idle;
        self.wire_hold.clear();
        self.terminal_hold.clear();
    }

    // ── Left hand ──────────────────────────────────────────

    fn on_finger_count(&mut self, event: &GestureEvent) -> Option<CircuitAction> {
        let GesturePayload::FingerCount {
            count,
            is_add_action,
            hold_progress,
        } = event.payload
        else {
            return None;
        };

        // Five extended fingers is the open-palm delete pose, not an add.
        if count == 5 {
            return self.on_delete_hold(event);
        }
        let kind = kind_for_count(count)?;

        if is_add_action {
            if !self.debounce.try_accept("add_direct", event.timestamp_ms) {
                return None;
            }
            let id = self.circuit.add_component(kind, event.position);
            info!(id = %id, kind = kind.as_str(), "component added by finger count");
            return Some(CircuitAction::AddDirect {
                component_id: id,
                component_kind: kind,
                position: event.position,
            });
        }

        Some(CircuitAction::AddHoldProgress {
            component_kind: kind,
            hold_progress,
        })
    }

    fn on_delete_hold(&mut self, event: &GestureEvent) -> Option<CircuitAction> {
        let target = self
            .circuit
            .component_near(event.position, self.config.delete_radius)
            .map(|c| c.id.clone());
        match self.delete_hold.update(target.as_deref(), event.timestamp_ms) {
            HoldUpdate::Committed => {
                let id = target?;
                if !self.debounce.try_accept("open_palm_delete", event.timestamp_ms) {
                    return None;
                }
                self.circuit.remove_component(&id);
                info!(id = %id, "component deleted by open-palm hold");
                Some(CircuitAction::OpenPalmDelete { component_id: id })
            }
            HoldUpdate::Progress(p) => Some(CircuitAction::DeleteHoldProgress {
                component_id: target?,
                hold_progress: p,
            }),
            HoldUpdate::Inactive => None,
        }
    }

    // ── Right hand ─────────────────────────────────────────

    fn on_pinch(&mut self, event: &GestureEvent) -> Option<CircuitAction> {
        let pos = event.position;
        if self.pinch_active {
            if let Some(id) = self.selected.clone() {
                // Absolute positioning: the component tracks the pinch
                // point exactly, every frame, never debounced.
                self.circuit.set_position(&id, pos);
                return Some(CircuitAction::Move {
                    component_id: id,
                    position: pos,
                });
            }
        }

        self.pinch_active = true;
        let hit = self
            .circuit
            .component_near(pos, self.config.select_radius)
            .map(|c| c.id.clone());
        self.selected = hit.clone();
        if self.debounce.try_accept("select", event.timestamp_ms) {
            debug!(selected = ?hit, "pinch select");
            Some(CircuitAction::Select { component_id: hit })
        } else {
            None
        }
    }

    fn on_auto_grab(&mut self, event: &GestureEvent) -> Option<CircuitAction> {
        let hit = self
            .circuit
            .component_near(event.position, self.config.select_radius)
            .map(|c| c.id.clone())?;
        if self.selected.as_deref() == Some(hit.as_str()) {
            return None;
        }
        self.selected = Some(hit.clone());
        if self.debounce.try_accept("select", event.timestamp_ms) {
            Some(CircuitAction::Select {
                component_id: Some(hit),
            })
        } else {
            None
        }
    }

    fn on_toggle_hold(&mut self, event: &GestureEvent) -> Option<CircuitAction> {
        let target = self
            .circuit
            .component_near(event.position, self.config.select_radius)
            .filter(|c| c.kind == ComponentKind::Switch)
            .map(|c| c.id.clone());
        match self.toggle_hold.update(target.as_deref(), event.timestamp_ms) {
            HoldUpdate::Committed => {
                let id = target?;
                if !self.debounce.try_accept("toggle", event.timestamp_ms) {
                    return None;
                }
                let state = self.circuit.toggle_switch(&id)?;
                Some(CircuitAction::Toggle {
                    component_id: id,
                    state,
                })
            }
            HoldUpdate::Progress(p) => Some(CircuitAction::ToggleHoldProgress {
                component_id: target?,
                hold_progress: p,
            }),
            HoldUpdate::Inactive => None,
        }
    }

    fn on_rotate_hold(&mut self, event: &GestureEvent) -> Option<CircuitAction> {
        let target = self
            .circuit
            .component_near(event.position, self.config.rotate_radius)
            .map(|c| c.id.clone());
        match self.rotate_hold.update(target.as_deref(), event.timestamp_ms) {
            HoldUpdate::Committed => {
                let id = target?;
                if !self.debounce.try_accept("rotate", event.timestamp_ms) {
                    return None;
                }
                let rotation = self.circuit.rotate_by(&id, self.config.rotate_step_deg)?;
                Some(CircuitAction::Rotate {
                    component_id: id,
                    rotation_deg: rotation,
                })
            }
            HoldUpdate::Progress(p) => Some(CircuitAction::RotateHoldProgress {
                component_id: target?,
                hold_progress: p,
            }),
            HoldUpdate::Inactive => None,
        }
    }

    fn on_smooth_rotate(&mut self, event: &GestureEvent) -> Option<CircuitAction> {
        let GesturePayload::Rotation { delta_deg, .. } = event.payload else {
            return None;
        };
        let id = match self.selected.clone() {
            Some(id) => id,
            None => self
                .circuit
                .component_near(event.position, self.config.rotate_radius)
                .map(|c| c.id.clone())?,
        };
        if !self.debounce.try_accept("rotate_smooth", event.timestamp_ms) {
            return None;
        }
        let rotation = self.circuit.rotate_by(&id, delta_deg)?;
        let snapped = self
            .circuit
            .set_rotation(&id, snap_angle(rotation, self.config.rotate_snap_deg))?;
        Some(CircuitAction::RotateSmooth {
            component_id: id,
            rotation_deg: snapped,
        })
    }

    // ── Wire handshake ─────────────────────────────────────

    fn on_point(&mut self, event: &GestureEvent) -> Option<CircuitAction> {
        let now = event.timestamp_ms;
        let pos = event.position;
        self.last_point_ms = now;

        match self.wire.clone() {
            WirePhase::Idle | WirePhase::HoldingStart => {
                let hit = self
                    .circuit
                    .component_near(pos, self.config.select_radius)
                    .map(|c| c.id.clone());
                match self.wire_hold.update(hit.as_deref(), now) {
                    HoldUpdate::Committed => {
                        let id = hit?;
                        self.wire = WirePhase::ChoosingStartTerminal {
                            component: id.clone(),
                        };
                        info!(component = %id, "wire handshake started");
                        // Phase transitions always reach the renderer; the
                        // 3s hold already spaces them far beyond any jitter
                        // window.
                        Some(CircuitAction::StartWire { component_id: id })
                    }
                    HoldUpdate::Progress(p) => {
                        self.wire = WirePhase::HoldingStart;
                        Some(CircuitAction::PointHoldProgress {
                            component_id: hit?,
                            hold_progress: p,
                        })
                    }
                    HoldUpdate::Inactive => {
                        self.wire = WirePhase::Idle;
                        None
                    }
                }
            }
            WirePhase::ChoosingStartTerminal { component } => {
                let terminal =
                    self.circuit
                        .terminal_near(&component, pos, self.config.terminal_radius);
                let key = terminal.map(|t| format!("{component}:{}", t.as_str()));
                match self.terminal_hold.update(key.as_deref(), now) {
                    HoldUpdate::Committed => {
                        let terminal = terminal?;
                        debug!(component = %component, terminal = terminal.as_str(), "start terminal chosen");
                        self.wire = WirePhase::Dragging {
                            from: TerminalRef::new(component, terminal),
                        };
                        Some(CircuitAction::WireDragging { position: pos })
                    }
                    HoldUpdate::Progress(p) => Some(CircuitAction::TerminalHoldProgress {
                        component_id: component,
                        terminal: terminal?,
                        hold_progress: p,
                    }),
                    HoldUpdate::Inactive => None,
                }
            }
            WirePhase::Dragging { from } | WirePhase::HoldingTarget { from } => {
                let hit = self
                    .circuit
                    .component_near(pos, self.config.select_radius)
                    .filter(|c| c.id != from.component)
                    .map(|c| c.id.clone());
                match self.wire_hold.update(hit.as_deref(), now) {
                    HoldUpdate::Committed => {
                        let target = hit?;
                        self.wire = WirePhase::ChoosingEndTerminal {
                            from: from.clone(),
                            target: target.clone(),
                        };
                        Some(CircuitAction::CompleteWire {
                            component_id: from.component,
                            target_component_id: target,
                        })
                    }
                    HoldUpdate::Progress(p) => {
                        let target = hit?;
                        self.wire = WirePhase::HoldingTarget { from };
                        Some(CircuitAction::PointHoldProgress {
                            component_id: target,
                            hold_progress: p,
                        })
                    }
                    HoldUpdate::Inactive => {
                        self.wire = WirePhase::Dragging { from };
                        Some(CircuitAction::WireDragging { position: pos })
                    }
                }
            }
            WirePhase::ChoosingEndTerminal { from, target } => {
                let terminal =
                    self.circuit
                        .terminal_near(&target, pos, self.config.terminal_radius);
                let key = terminal.map(|t| format!("{target}:{}", t.as_str()));
                match self.terminal_hold.update(key.as_deref(), now) {
                    HoldUpdate::Committed => {
                        let terminal = terminal?;
                        let to = TerminalRef::new(target, terminal);
                        self.wire = WirePhase::Idle;
                        match self.circuit.add_wire(from.clone(), to.clone()) {
                            Some(wire_id) => {
                                info!(wire = %wire_id, "wire created");
                                Some(CircuitAction::WireCreated { wire_id, from, to })
                            }
                            // Endpoint vanished mid-handshake: cancel
                            // without creating anything.
                            None => None,
                        }
                    }
                    HoldUpdate::Progress(p) => Some(CircuitAction::TerminalHoldProgress {
                        component_id: target,
                        terminal: terminal?,
                        hold_progress: p,
                    }),
                    HoldUpdate::Inactive => None,
                }
            }
        }
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────
