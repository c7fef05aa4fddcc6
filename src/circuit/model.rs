//! In-memory circuit graph: components, terminals, and wires.
//!
//! Positions are in canonical canvas coordinates (pixels at the fixed
//! reference scale).  Every non-wire component exposes exactly two
//! terminals, `A` on the left and `B` on the right of its local frame,
//! rotated with the component.  Wires are immutable once created and always
//! join terminals on two distinct components.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Local x-offset of each terminal from the component center, before
/// rotation.
pub const TERMINAL_OFFSET: f32 = 50.0;

// ── Geometry ───────────────────────────────────────────────

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ── Component types ────────────────────────────────────────

/// Kinds of circuit component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Battery,
    Resistor,
    Lamp,
    Switch,
    Wire,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Battery => "battery",
            Self::Resistor => "resistor",
            Self::Lamp => "lamp",
            Self::Switch => "switch",
            Self::Wire => "wire",
        }
    }

    /// Default electrical value on creation: volts for a battery, ohms for
    /// resistive elements.
    pub fn default_value(&self) -> f32 {
        match self {
            Self::Battery => 12.0,
            Self::Resistor => 100.0,
            Self::Lamp => 50.0,
            Self::Switch | Self::Wire => 0.0,
        }
    }
}

/// One of a component's two connection points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terminal {
    A,
    B,
}

impl Terminal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }
}

/// Open/closed state of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    Open,
    Closed,
}

impl SwitchState {
    pub fn toggled(&self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }
}

/// A placed circuit component.
#[derive(Debug, Clone, Serialize)]
pub struct Component {
    pub id: String,
    pub kind: ComponentKind,
    pub position: Vec2,
    /// Degrees in [0, 360).
    pub rotation_deg: f32,
    /// Volts for batteries, ohms for resistive elements.
    pub value: f32,
    /// Present only for switches.
    pub switch_state: Option<SwitchState>,
}

impl Component {
    /// World position of a terminal: the local ±offset rotated by the
    /// component's rotation.
    pub fn terminal_position(&self, terminal: Terminal) -> Vec2 {
        let offset = match terminal {
            Terminal::A => -TERMINAL_OFFSET,
            Terminal::B => TERMINAL_OFFSET,
        };
        let rad = self.rotation_deg.to_radians();
        Vec2::new(
            self.position.x + offset * rad.cos(),
            self.position.y + offset * rad.sin(),
        )
    }
}

/// One end of a wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalRef {
    pub component: String,
    pub terminal: Terminal,
}

impl TerminalRef {
    pub fn new(component: impl Into<String>, terminal: Terminal) -> Self {
        Self {
            component: component.into(),
            terminal,
        }
    }
}

/// A committed wire between two terminals.  Immutable once created;
/// delete-and-recreate to change.
#[derive(Debug, Clone, Serialize)]
pub struct WireConnection {
    pub id: String,
    pub from: TerminalRef,
    pub to: TerminalRef,
}

// ── Circuit ────────────────────────────────────────────────

/// The component/wire graph.  Owned exclusively by the interaction
/// controller; collaborators read it through `&Circuit`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Circuit {
    components: Vec<Component>,
    wires: Vec<WireConnection>,
    #[serde(skip)]
    kind_counters: HashMap<ComponentKind, u32>,
    #[serde(skip)]
    wire_counter: u32,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn wires(&self) -> &[WireConnection] {
        &self.wires
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    /// Add a component of `kind` at `position`, returning its id.
    pub fn add_component(&mut self, kind: ComponentKind, position: Vec2) -> String {
        let n = self.kind_counters.entry(kind).or_insert(0);
        *n += 1;
        let id = format!("{}_{}", kind.as_str(), n);
        let switch_state = (kind == ComponentKind::Switch).then_some(SwitchState::Open);
        self.components.push(Component {
            id: id.clone(),
            kind,
            position,
            rotation_deg: 0.0,
            value: kind.default_value(),
            switch_state,
        });
        debug!(id = %id, "component added");
        id
    }

    /// Remove a component and every wire referencing it.  Returns false if
    /// the id is unknown.
    pub fn remove_component(&mut self, id: &str) -> bool {
        let before = self.components.len();
        self.components.retain(|c| c.id != id);
        if self.components.len() == before {
            return false;
        }
        let wires_before = self.wires.len();
        self.wires
            .retain(|w| w.from.component != id && w.to.component != id);
        debug!(
            id = %id,
            cascaded = wires_before - self.wires.len(),
            "component removed"
        );
        true
    }

    /// Create a wire between two terminals.  Returns `None` (and creates
    /// nothing) for self-loops or unknown endpoints.
    pub fn add_wire(&mut self, from: TerminalRef, to: TerminalRef) -> Option<String> {
        if from.component == to.component {
            debug!(component = %from.component, "rejected self-loop wire");
            return None;
        }
        if self.component(&from.component).is_none() || self.component(&to.component).is_none() {
            return None;
        }
        self.wire_counter += 1;
        let id = format!("wire_{}", self.wire_counter);
        self.wires.push(WireConnection {
            id: id.clone(),
            from,
            to,
        });
        debug!(id = %id, "wire added");
        Some(id)
    }

    /// Closest component whose center lies within `radius` of `point`.
    pub fn component_near(&self, point: Vec2, radius: f32) -> Option<&Component> {
        self.components
            .iter()
            .map(|c| (c, c.position.distance_to(point)))
            .filter(|(_, d)| *d < radius)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(c, _)| c)
    }

    /// Closest of a component's two terminal markers within `radius` of
    /// `point`.
    pub fn terminal_near(&self, component_id: &str, point: Vec2, radius: f32) -> Option<Terminal> {
        let component = self.component(component_id)?;
        [Terminal::A, Terminal::B]
            .into_iter()
            .map(|t| (t, component.terminal_position(t).distance_to(point)))
            .filter(|(_, d)| *d < radius)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(t, _)| t)
    }

    /// Move a component to an absolute position.
    pub fn set_position(&mut self, id: &str, position: Vec2) -> bool {
        match self.component_mut(id) {
            Some(c) => {
                c.position = position;
                true
            }
            None => false,
        }
    }

    /// Rotate a component by `delta_deg`, wrapping into [0, 360).  Returns
    /// the new rotation.
    pub fn rotate_by(&mut self, id: &str, delta_deg: f32) -> Option<f32> {
        let c = self.component_mut(id)?;
        c.rotation_deg = (c.rotation_deg + delta_deg).rem_euclid(360.0);
        Some(c.rotation_deg)
    }

    /// Set an absolute rotation, wrapping into [0, 360).
    pub fn set_rotation(&mut self, id: &str, rotation_deg: f32) -> Option<f32> {
        let c = self.component_mut(id)?;
        c.rotation_deg = rotation_deg.rem_euclid(360.0);
        Some(c.rotation_deg)
    }

    /// Flip a switch.  Returns the new state, or `None` if the component is
    /// missing or not a switch.
    pub fn toggle_switch(&mut self, id: &str) -> Option<SwitchState> {
        let c = self.component_mut(id)?;
        let state = c.switch_state?.toggled();
        c.switch_state = Some(state);
        debug!(id = %id, state = ?state, "switch toggled");
        Some(state)
    }

    /// Drop all components and wires.
    pub fn clear(&mut self) {
        self.components.clear();
        self.wires.clear();
    }
}

// ── Tests ──────────────────────────────────────────────────
