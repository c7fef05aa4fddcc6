//! Electrical analysis of a circuit snapshot.
//!
//! Pure function over `&Circuit`: computes voltage, equivalent resistance,
//! current flow, per-lamp power, and a coarse topology classification.  The
//! result is consumed by the rendering layer (lamp brightness, status text)
//! and never feeds back into interaction decisions.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use super::model::{Circuit, ComponentKind, SwitchState};

// ── Result types ───────────────────────────────────────────

/// Coarse shape of the conducting network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// No source or no resistive load placed yet.
    Empty,
    /// Source and loads exist but no current can flow.
    Open,
    Series,
    Parallel,
}

/// Derived electrical quantities for one circuit snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitAnalysis {
    pub current: f32,
    pub power: f32,
    pub total_voltage: f32,
    pub total_resistance: f32,
    pub is_closed: bool,
    pub has_open_switch: bool,
    pub is_connected: bool,
    pub lamp_powers: HashMap<String, f32>,
    pub component_currents: HashMap<String, f32>,
    pub topology: Topology,
}

impl CircuitAnalysis {
    fn inactive(total_voltage: f32, has_open_switch: bool, topology: Topology) -> Self {
        Self {
            current: 0.0,
            power: 0.0,
            total_voltage,
            total_resistance: 0.0,
            is_closed: false,
            has_open_switch,
            is_connected: false,
            lamp_powers: HashMap::new(),
            component_currents: HashMap::new(),
            topology,
        }
    }
}

// ── Analysis ───────────────────────────────────────────────

/// Analyze one snapshot of the component/wire graph.
pub fn analyze(circuit: &Circuit) -> CircuitAnalysis {
    let components = circuit.components();
    let total_voltage: f32 = components
        .iter()
        .filter(|c| c.kind == ComponentKind::Battery)
        .map(|c| c.value)
        .sum();

    let resistive: Vec<_> = components
        .iter()
        .filter(|c| matches!(c.kind, ComponentKind::Resistor | ComponentKind::Lamp))
        .collect();
    let switches: Vec<_> = components
        .iter()
        .filter(|c| c.kind == ComponentKind::Switch)
        .collect();
    let has_open_switch = switches
        .iter()
        .any(|s| s.switch_state == Some(SwitchState::Open));

    if total_voltage == 0.0 || resistive.is_empty() {
        return CircuitAnalysis::inactive(total_voltage, has_open_switch, Topology::Empty);
    }

    // Component-level connectivity: a wire joins two components; every
    // component conducts between its own terminals for reachability
    // purposes.
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for wire in circuit.wires() {
        adjacency
            .entry(wire.from.component.as_str())
            .or_default()
            .push(wire.to.component.as_str());
        adjacency
            .entry(wire.to.component.as_str())
            .or_default()
            .push(wire.from.component.as_str());
    }

    let start = components
        .iter()
        .find(|c| c.kind == ComponentKind::Battery)
        .map(|c| c.id.as_str());
    let mut visited: HashSet<&str> = HashSet::new();
    if let Some(start) = start {
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(current) = queue.pop_front() {
            if let Some(neighbors) = adjacency.get(current) {
                for &n in neighbors {
                    if visited.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }
    }
    let is_connected = components.iter().all(|c| visited.contains(c.id.as_str()));

    if !is_connected {
        debug!("analysis: circuit not fully connected");
        let mut result =
            CircuitAnalysis::inactive(total_voltage, has_open_switch, Topology::Open);
        result.is_connected = false;
        return result;
    }

    // Current may flow only when every switch on the path conducts; with the
    // coarse component-level model this means no open switches remain.
    let is_closed = !has_open_switch;

    // A terminal carrying more than one wire splits the path: parallel.
    let mut wires_per_terminal: HashMap<(&str, super::model::Terminal), u32> = HashMap::new();
    for wire in circuit.wires() {
        *wires_per_terminal
            .entry((wire.from.component.as_str(), wire.from.terminal))
            .or_insert(0) += 1;
        *wires_per_terminal
            .entry((wire.to.component.as_str(), wire.to.terminal))
            .or_insert(0) += 1;
    }
    let has_parallel_branch = wires_per_terminal.values().any(|&n| n > 1);
    let topology = if has_parallel_branch {
        Topology::Parallel
    } else {
        Topology::Series
    };

    if !is_closed {
        debug!("analysis: open switch, no current");
        let mut result = CircuitAnalysis::inactive(total_voltage, has_open_switch, topology);
        result.is_connected = true;
        return result;
    }

    let mut lamp_powers = HashMap::new();
    let mut component_currents = HashMap::new();
    let (total_resistance, total_current);

    if has_parallel_branch {
        // Each resistive element is one branch across the source:
        // 1/R = Σ 1/Rᵢ, per-branch current V/Rᵢ.
        let mut reciprocal = 0.0f32;
        for el in &resistive {
            if el.value > 0.0 {
                reciprocal += 1.0 / el.value;
            }
        }
        total_resistance = if reciprocal > 0.0 { 1.0 / reciprocal } else { 0.0 };
        total_current = if total_resistance > 0.0 {
            total_voltage / total_resistance
        } else {
            0.0
        };
        for el in &resistive {
            let branch_current = if el.value > 0.0 {
                total_voltage / el.value
            } else {
                0.0
            };
            component_currents.insert(el.id.clone(), branch_current);
            if el.kind == ComponentKind::Lamp {
                lamp_powers.insert(el.id.clone(), branch_current * branch_current * el.value);
            }
        }
    } else {
        // Single loop: resistances sum, one current everywhere.
        total_resistance = resistive.iter().map(|el| el.value).sum();
        total_current = if total_resistance > 0.0 {
            total_voltage / total_resistance
        } else {
            0.0
        };
        for el in &resistive {
            component_currents.insert(el.id.clone(), total_current);
            if el.kind == ComponentKind::Lamp {
                lamp_powers.insert(el.id.clone(), total_current * total_current * el.value);
            }
        }
    }

    for c in components {
        if matches!(c.kind, ComponentKind::Battery | ComponentKind::Switch) {
            component_currents.insert(c.id.clone(), total_current);
        }
    }

    debug!(
        voltage = total_voltage,
        resistance = total_resistance,
        current = total_current,
        ?topology,
        "analysis complete"
    );

    CircuitAnalysis {
        current: total_current,
        power: total_voltage * total_current,
        total_voltage,
        total_resistance,
        is_closed: true,
        has_open_switch: false,
        is_connected: true,
        lamp_powers,
        component_currents,
        topology,
    }
}

// ── Tests ──────────────────────────────────────────────────
