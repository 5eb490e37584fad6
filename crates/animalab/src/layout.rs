//! Automatic placement of state machine nodes.
//!
//! Each state machine is laid out on its own with [`ForceLayout`]; nested
//! machines only appear as single nodes of their parent.

mod force;

use log::debug;

use animalab_core::{Controller, controller::StateMachineId};

use crate::config::LayoutConfig;

pub use force::{ForceLayout, LayoutNode, spiral_position};

/// Outcome of laying out one state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutReport {
    iterations: usize,
    stable: bool,
    written: usize,
}

impl LayoutReport {
    /// Solver steps run.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the solver settled before its iteration cap.
    pub fn stable(&self) -> bool {
        self.stable
    }

    /// States and nested machines whose position changed.
    pub fn written(&self) -> usize {
        self.written
    }
}

/// Lays out state machine `id` and writes the positions back.
pub fn layout_state_machine(
    controller: &mut Controller,
    id: StateMachineId,
    config: &LayoutConfig,
) -> LayoutReport {
    let mut solver = ForceLayout::from_state_machine(controller, id, config.clone());
    let (iterations, stable) = solver.iterate(config.iterations());
    let written = solver.apply(controller.state_machine_mut(id));
    debug!(
        state_machine = controller.state_machine(id).name.as_str(),
        iterations,
        stable,
        written;
        "Layout solved"
    );
    LayoutReport {
        iterations,
        stable,
        written,
    }
}

/// Lays out every state machine that has a node without a position.
/// Returns the number of nodes placed.
pub fn layout_unplaced(controller: &mut Controller, config: &LayoutConfig) -> usize {
    let ids: Vec<StateMachineId> = controller
        .state_machines()
        .filter(|(_, machine)| machine.has_unplaced_nodes())
        .map(|(id, _)| id)
        .collect();
    ids.into_iter()
        .map(|id| layout_state_machine(controller, id, config).written())
        .sum()
}

/// Lays out every state machine of `controller`, placed or not.
/// Returns the number of nodes moved.
pub fn layout_all(controller: &mut Controller, config: &LayoutConfig) -> usize {
    let ids: Vec<StateMachineId> = controller.state_machines().map(|(id, _)| id).collect();
    ids.into_iter()
        .map(|id| layout_state_machine(controller, id, config).written())
        .sum()
}
