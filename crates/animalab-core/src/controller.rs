//! The controller graph.
//!
//! A [`Controller`] is the root of everything a document describes. Nodes live
//! in per-kind arenas inside the controller and refer to each other through
//! copyable typed indices, so the graph can be built incrementally while a
//! document is parsed and still be walked freely afterwards.
//!
//! ```text
//! Controller
//!  ├─ parameters
//!  └─ layers ──► StateMachine (root)
//!                 ├─ states ──► State ──► transitions, motion, behaviours
//!                 ├─ state machines (nested)
//!                 └─ entry / any-state transitions
//! ```

use std::collections::HashMap;

use crate::{
    behaviour::BehaviourRecord,
    geometry::Vec2,
    keyword::keyword_enum,
    motion::Motion,
    path::Path,
    resource::AssetRef,
    transition::Transition,
};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            /// Position of the node in its arena.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Index of a [`StateMachine`] in its controller.
    StateMachineId
);
arena_id!(
    /// Index of a [`State`] in its controller.
    StateId
);
arena_id!(
    /// Index of a [`Transition`] in its controller.
    TransitionId
);
arena_id!(
    /// Index of a [`Motion`] in its controller.
    MotionId
);
arena_id!(
    /// Index of a [`BehaviourRecord`] in its controller.
    BehaviourId
);

keyword_enum! {
    /// Declared type of a controller parameter.
    pub enum ParameterKind ("parameter type") {
        Float => "float",
        Int => "int",
        Bool => "bool",
        Trigger => "trigger",
    }
}

/// Default value of a parameter, matching its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Trigger(bool),
}

impl ParameterValue {
    /// The zero value for a parameter kind.
    pub fn zero(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Float => Self::Float(0.0),
            ParameterKind::Int => Self::Int(0),
            ParameterKind::Bool => Self::Bool(false),
            ParameterKind::Trigger => Self::Trigger(false),
        }
    }

    pub fn kind(self) -> ParameterKind {
        match self {
            Self::Float(_) => ParameterKind::Float,
            Self::Int(_) => ParameterKind::Int,
            Self::Bool(_) => ParameterKind::Bool,
            Self::Trigger(_) => ParameterKind::Trigger,
        }
    }

    /// Whether the value equals the zero value of its kind.
    pub fn is_zero(self) -> bool {
        self == Self::zero(self.kind())
    }
}

/// A typed controller parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: ParameterValue,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            default: ParameterValue::zero(kind),
        }
    }

    pub fn kind(&self) -> ParameterKind {
        self.default.kind()
    }
}

keyword_enum! {
    /// How a layer combines with the layers beneath it.
    pub enum BlendingMode ("blending mode") {
        Override => "override",
        Additive => "additive",
    }
}

impl Default for BlendingMode {
    fn default() -> Self {
        Self::Override
    }
}

/// An independently blended layer with its root state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub weight: f32,
    pub blending: BlendingMode,
    pub mask: Option<AssetRef>,
    /// Index of the layer this one is synced to.
    pub synced_layer: Option<usize>,
    pub sync_timing: bool,
    pub ik_pass: bool,
    pub state_machine: StateMachineId,
}

impl Layer {
    pub fn new(name: impl Into<String>, state_machine: StateMachineId) -> Self {
        Self {
            name: name.into(),
            weight: 1.0,
            blending: BlendingMode::Override,
            mask: None,
            synced_layer: None,
            sync_timing: false,
            ik_pass: false,
            state_machine,
        }
    }
}

/// A node placed inside a state machine, with its layout position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placed<T> {
    pub node: T,
    /// `None` until the layout solver places the node.
    pub position: Option<Vec2>,
}

impl<T> Placed<T> {
    pub fn new(node: T) -> Self {
        Self {
            node,
            position: None,
        }
    }
}

pub const DEFAULT_ANY_STATE_POSITION: Vec2 = Vec2::new(50.0, 20.0);
pub const DEFAULT_ENTRY_POSITION: Vec2 = Vec2::new(50.0, 120.0);
pub const DEFAULT_EXIT_POSITION: Vec2 = Vec2::new(800.0, 120.0);

/// A container of states, nested state machines and pseudostates.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMachine {
    pub name: String,
    pub states: Vec<Placed<StateId>>,
    pub state_machines: Vec<Placed<StateMachineId>>,
    pub default_state: Option<StateId>,
    pub entry_position: Vec2,
    pub exit_position: Vec2,
    pub any_state_position: Vec2,
    pub entry_transitions: Vec<TransitionId>,
    pub any_state_transitions: Vec<TransitionId>,
    pub behaviours: Vec<BehaviourId>,
}

impl StateMachine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            state_machines: Vec::new(),
            default_state: None,
            entry_position: DEFAULT_ENTRY_POSITION,
            exit_position: DEFAULT_EXIT_POSITION,
            any_state_position: DEFAULT_ANY_STATE_POSITION,
            entry_transitions: Vec::new(),
            any_state_transitions: Vec::new(),
            behaviours: Vec::new(),
        }
    }

    /// Whether any child state or state machine still lacks a position.
    pub fn has_unplaced_nodes(&self) -> bool {
        self.states.iter().any(|s| s.position.is_none())
            || self.state_machines.iter().any(|m| m.position.is_none())
    }
}

/// A field that is either a literal or bound to a controller parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding<T> {
    Literal(T),
    Parameter(String),
}

impl<T> Binding<T> {
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::Parameter(name) => Some(name),
            Self::Literal(_) => None,
        }
    }
}

/// A state of a state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub name: String,
    pub motion: Option<MotionId>,
    pub speed: Binding<f32>,
    pub cycle_offset: Binding<f32>,
    /// Parameter driving normalized time, if any.
    pub time_parameter: Option<String>,
    pub mirror: Binding<bool>,
    pub ik_on_feet: bool,
    pub write_defaults: bool,
    pub tag: String,
    pub behaviours: Vec<BehaviourId>,
    pub transitions: Vec<TransitionId>,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            motion: None,
            speed: Binding::Literal(1.0),
            cycle_offset: Binding::Literal(0.0),
            time_parameter: None,
            mirror: Binding::Literal(false),
            ik_on_feet: false,
            write_defaults: false,
            tag: String::new(),
            behaviours: Vec::new(),
            transitions: Vec::new(),
        }
    }
}

/// A state or state machine, the two kinds of addressable graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    State(StateId),
    StateMachine(StateMachineId),
}

/// Root graph produced from one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controller {
    name: String,
    parameters: Vec<Parameter>,
    layers: Vec<Layer>,
    state_machines: Vec<StateMachine>,
    states: Vec<State>,
    transitions: Vec<Transition>,
    motions: Vec<Motion>,
    behaviours: Vec<BehaviourRecord>,
}

impl Controller {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Adds a parameter unless one with the same name exists.
    ///
    /// Returns `false` when the name is already taken.
    pub fn add_parameter(&mut self, parameter: Parameter) -> bool {
        if self.parameter(&parameter.name).is_some() {
            return false;
        }
        self.parameters.push(parameter);
        true
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Adds a layer and returns its index.
    pub fn add_layer(&mut self, layer: Layer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    pub fn state_machines(&self) -> impl Iterator<Item = (StateMachineId, &StateMachine)> {
        self.state_machines
            .iter()
            .enumerate()
            .map(|(i, m)| (StateMachineId(i), m))
    }

    pub fn state_machine(&self, id: StateMachineId) -> &StateMachine {
        &self.state_machines[id.0]
    }

    pub fn state_machine_mut(&mut self, id: StateMachineId) -> &mut StateMachine {
        &mut self.state_machines[id.0]
    }

    pub fn add_state_machine(&mut self, state_machine: StateMachine) -> StateMachineId {
        self.state_machines.push(state_machine);
        StateMachineId(self.state_machines.len() - 1)
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.0]
    }

    pub fn add_state(&mut self, state: State) -> StateId {
        self.states.push(state);
        StateId(self.states.len() - 1)
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.0]
    }

    pub fn transition_mut(&mut self, id: TransitionId) -> &mut Transition {
        &mut self.transitions[id.0]
    }

    pub fn add_transition(&mut self, transition: Transition) -> TransitionId {
        self.transitions.push(transition);
        TransitionId(self.transitions.len() - 1)
    }

    pub fn motion(&self, id: MotionId) -> &Motion {
        &self.motions[id.0]
    }

    pub fn motion_mut(&mut self, id: MotionId) -> &mut Motion {
        &mut self.motions[id.0]
    }

    pub fn add_motion(&mut self, motion: Motion) -> MotionId {
        self.motions.push(motion);
        MotionId(self.motions.len() - 1)
    }

    pub fn behaviour(&self, id: BehaviourId) -> &BehaviourRecord {
        &self.behaviours[id.0]
    }

    pub fn behaviour_mut(&mut self, id: BehaviourId) -> &mut BehaviourRecord {
        &mut self.behaviours[id.0]
    }

    pub fn add_behaviour(&mut self, behaviour: BehaviourRecord) -> BehaviourId {
        self.behaviours.push(behaviour);
        BehaviourId(self.behaviours.len() - 1)
    }

    /// Computes the path of every state and state machine reachable from the
    /// layers. A layer's root state machine has the one-segment path of its
    /// name.
    pub fn node_paths(&self) -> HashMap<NodeRef, Path> {
        let mut paths = HashMap::new();
        let mut pending: Vec<(StateMachineId, Path)> = self
            .layers
            .iter()
            .map(|layer| (layer.state_machine, Path::from_segments([layer.name.as_str()])))
            .collect();
        while let Some((id, path)) = pending.pop() {
            let machine = self.state_machine(id);
            for placed in &machine.states {
                let name = &self.state(placed.node).name;
                paths.insert(NodeRef::State(placed.node), path.join(name.as_str()));
            }
            for placed in &machine.state_machines {
                let name = &self.state_machine(placed.node).name;
                pending.push((placed.node, path.join(name.as_str())));
            }
            paths.insert(NodeRef::StateMachine(id), path);
        }
        paths
    }
}
