//! Force-directed solver for one state machine scope.
//!
//! Every state, nested state machine and pseudostate of the scope is a body.
//! Transitions pull their endpoints together once they are further apart than
//! the minimum distance, while every body pushes every other body away, and
//! edge midpoints push away the bodies they do not connect.

use std::{collections::HashMap, f32::consts::PI};

use log::trace;
use petgraph::{
    graph::{NodeIndex, UnGraph},
    visit::EdgeRef,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

use animalab_core::{
    Controller,
    controller::{StateId, StateMachine, StateMachineId},
    geometry::{Bounds, Vec2},
    transition::Destination,
};

use crate::config::LayoutConfig;

/// Distance below which a repulsion direction is undefined.
const COINCIDENT: f32 = 1e-4;
/// Range of the random nudge applied to coincident bodies.
const JITTER: f32 = 0.01;

/// A node of the layout graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutNode {
    Entry,
    Exit,
    Any,
    State(StateId),
    StateMachine(StateMachineId),
}

impl From<Destination> for LayoutNode {
    fn from(destination: Destination) -> Self {
        match destination {
            Destination::State(id) => Self::State(id),
            Destination::StateMachine(id) => Self::StateMachine(id),
            Destination::Exit => Self::Exit,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    /// In layout units.
    position: Vec2,
    /// Damped force of the last applied step.
    residual: Vec2,
}

/// Where the `index`-th node added to a state machine is placed, in pixels.
///
/// Successive indices wind outwards on a logarithmic spiral.
pub fn spiral_position(index: usize) -> Vec2 {
    let distance = ((index + 1) as f32).ln() / (12.0f32 * 30.0).ln();
    let angle = distance * PI / 12.0;
    Vec2::new(angle.cos(), angle.sin()) * (distance * 30.0)
}

/// Force-directed layout of one state machine.
#[derive(Debug)]
pub struct ForceLayout {
    config: LayoutConfig,
    graph: UnGraph<Body, ()>,
    node_map: HashMap<LayoutNode, NodeIndex>,
    rng: StdRng,
}

impl ForceLayout {
    pub fn new(config: LayoutConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed());
        Self {
            config,
            graph: UnGraph::new_undirected(),
            node_map: HashMap::new(),
            rng,
        }
    }

    /// Builds the layout graph of state machine `id`.
    ///
    /// Placed nodes start where they are; unplaced ones are seeded on
    /// [`spiral_position`].
    pub fn from_state_machine(
        controller: &Controller,
        id: StateMachineId,
        config: LayoutConfig,
    ) -> Self {
        let mut layout = Self::new(config);
        let machine = controller.state_machine(id);

        layout.add_node(LayoutNode::Entry, machine.entry_position);
        layout.add_node(LayoutNode::Exit, machine.exit_position);
        layout.add_node(LayoutNode::Any, machine.any_state_position);
        let mut seed = 0;
        for placed in &machine.states {
            let position = placed.position.unwrap_or_else(|| spiral_position(seed));
            layout.add_node(LayoutNode::State(placed.node), position);
            seed += 1;
        }
        for placed in &machine.state_machines {
            let position = placed.position.unwrap_or_else(|| spiral_position(seed));
            layout.add_node(LayoutNode::StateMachine(placed.node), position);
            seed += 1;
        }

        if let Some(default) = machine.default_state {
            layout.add_edge(LayoutNode::Entry, LayoutNode::State(default));
        }
        for transition in &machine.entry_transitions {
            let destination = controller.transition(*transition).destination;
            layout.add_edge(LayoutNode::Entry, destination.into());
        }
        for transition in &machine.any_state_transitions {
            let destination = controller.transition(*transition).destination;
            layout.add_edge(LayoutNode::Any, destination.into());
        }
        for placed in &machine.states {
            for transition in &controller.state(placed.node).transitions {
                let destination = controller.transition(*transition).destination;
                layout.add_edge(LayoutNode::State(placed.node), destination.into());
            }
        }
        for placed in &machine.state_machines {
            let nested = controller.state_machine(placed.node);
            for transition in &nested.entry_transitions {
                let destination = controller.transition(*transition).destination;
                layout.add_edge(LayoutNode::StateMachine(placed.node), destination.into());
            }
        }
        layout
    }

    /// Adds a body at `position`, in pixels.
    pub fn add_node(&mut self, node: LayoutNode, position: Vec2) {
        let unit = self.config.unit_distance();
        let body = Body {
            position: Vec2::new(position.x() / unit, position.y() / unit),
            residual: Vec2::ZERO,
        };
        match self.node_map.get(&node) {
            Some(index) => self.graph[*index] = body,
            None => {
                let index = self.graph.add_node(body);
                self.node_map.insert(node, index);
            }
        }
    }

    /// Connects two bodies. Returns `false` when either is not part of this
    /// layout. Connecting `b` to `a` after `a` to `b` keeps a single edge.
    pub fn add_edge(&mut self, a: LayoutNode, b: LayoutNode) -> bool {
        match (self.node_map.get(&a), self.node_map.get(&b)) {
            (Some(&a), Some(&b)) => {
                self.graph.update_edge(a, b, ());
                true
            }
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Current position of `node`, in pixels.
    pub fn position(&self, node: LayoutNode) -> Option<Vec2> {
        self.node_map
            .get(&node)
            .map(|index| self.graph[*index].position * self.config.unit_distance())
    }

    /// Damped force left on `node` by the last step, in layout units.
    pub fn residual(&self, node: LayoutNode) -> Option<Vec2> {
        self.node_map
            .get(&node)
            .map(|index| self.graph[*index].residual)
    }

    /// Runs at most `max_iterations` steps, stopping at the first stable
    /// one. Returns the steps run and whether the layout settled.
    pub fn iterate(&mut self, max_iterations: usize) -> (usize, bool) {
        for iteration in 0..max_iterations {
            if self.step() {
                return (iteration + 1, true);
            }
        }
        (max_iterations, false)
    }

    /// Computes and applies one round of forces. Returns `true` when no force
    /// exceeded the convergence threshold.
    pub fn step(&mut self) -> bool {
        let positions: Vec<Vec2> = self.graph.node_weights().map(|body| body.position).collect();
        let Some(bounds) = Bounds::from_points(positions.iter().copied()) else {
            return true;
        };
        let max_force = bounds.diagonal() * 0.5;
        let min_distance = self.config.min_distance();
        let mut forces = vec![Vec2::ZERO; positions.len()];

        let edges: Vec<(usize, usize)> = self
            .graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index()))
            .collect();

        // Attraction
        for &(a, b) in &edges {
            let delta = positions[b] - positions[a];
            let distance = delta.length();
            if distance < min_distance {
                continue;
            }
            let pull = (distance - min_distance) * self.config.attractive_strength();
            let force = delta.normalized() * pull;
            forces[a] += force;
            forces[b] -= force;
        }

        // Repulsion from bodies and from the midpoints of unrelated edges
        for (i, position) in positions.iter().enumerate() {
            for (j, other) in positions.iter().enumerate() {
                if i != j {
                    forces[i] -= self.repulsion(*other - *position);
                }
            }
            for &(a, b) in &edges {
                if a != i && b != i {
                    let midpoint = positions[a].midpoint(positions[b]);
                    forces[i] -= self.repulsion(midpoint - *position);
                }
            }
        }

        let epsilon = self.config.epsilon();
        let damping = self.config.damping();
        let mut stable = true;
        for (body, force) in self.graph.node_weights_mut().zip(forces) {
            if force.length() > epsilon {
                stable = false;
            }
            let force = force.clamp_length(max_force);
            body.position += force;
            body.residual = force * damping;
        }
        trace!(max_force, stable; "Layout step");
        stable
    }

    /// Force pushing a body away from a point `delta` ahead of it.
    fn repulsion(&mut self, mut delta: Vec2) -> Vec2 {
        let mut distance = delta.length();
        while distance < COINCIDENT {
            delta += Vec2::new(
                self.rng.random_range(-JITTER..JITTER),
                self.rng.random_range(-JITTER..JITTER),
            );
            distance = delta.length();
        }
        let min_distance = self.config.min_distance();
        let mut strength = self.config.repulsive_strength() / distance;
        if distance < min_distance {
            strength = strength.max(min_distance - distance);
        }
        delta.normalized() * strength
    }

    /// The pixel position written back for `node`.
    fn stepped_position(&self, node: LayoutNode) -> Option<Vec2> {
        self.position(node).map(Vec2::round)
    }

    /// Writes the solved positions into `machine`.
    ///
    /// States and nested machines are only touched when their rounded
    /// position changed; pseudostate positions are always written. Returns
    /// the number of states and nested machines that moved.
    pub fn apply(&self, machine: &mut StateMachine) -> usize {
        let mut written = 0;
        for placed in &mut machine.states {
            let position = self.stepped_position(LayoutNode::State(placed.node));
            if position.is_some() && placed.position != position {
                placed.position = position;
                written += 1;
            }
        }
        for placed in &mut machine.state_machines {
            let position = self.stepped_position(LayoutNode::StateMachine(placed.node));
            if position.is_some() && placed.position != position {
                placed.position = position;
                written += 1;
            }
        }
        if let Some(position) = self.stepped_position(LayoutNode::Entry) {
            machine.entry_position = position;
        }
        if let Some(position) = self.stepped_position(LayoutNode::Exit) {
            machine.exit_position = position;
        }
        if let Some(position) = self.stepped_position(LayoutNode::Any) {
            machine.any_state_position = position;
        }
        written
    }
}
