//! The narrow interface between the parser and the application embedding it.
//!
//! The parser never touches the file system or a type system directly. Asset
//! lookups, persistence of created objects, behaviour type introspection and
//! warning display all go through a [`Host`].

use animalab_core::{
    behaviour::{Schema, TypeHandle},
    controller::{BehaviourId, MotionId, StateId, StateMachineId, TransitionId},
    resource::{AssetRef, ResourceKind},
};

/// A graph object that has just been created and should be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Controller,
    /// Index into the controller's layers.
    Layer(usize),
    StateMachine(StateMachineId),
    State(StateId),
    Transition(TransitionId),
    Motion(MotionId),
    Behaviour(BehaviourId),
}

impl ObjectRef {
    /// A label used when the object has no name of its own.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Controller => "Controller",
            Self::Layer(_) => "Layer",
            Self::StateMachine(_) => "StateMachine",
            Self::State(_) => "State",
            Self::Transition(_) => "Transition",
            Self::Motion(_) => "Motion",
            Self::Behaviour(_) => "Behaviour",
        }
    }
}

/// Services the parser needs from its embedding application.
pub trait Host {
    /// Look up a resource by its reference text.
    ///
    /// References may be plain relative or absolute paths, `{guid}` or
    /// `path#subAsset`. Returning `None` leaves the referring field empty.
    fn resolve_resource(&mut self, reference: &str, kind: ResourceKind) -> Option<AssetRef>;

    /// Persist a newly created object under a name that is unique within
    /// this parse.
    fn persist(&mut self, object: ObjectRef, unique_name: &str);

    /// Resolve a qualified behaviour type name.
    fn resolve_behaviour_type(&self, name: &str) -> Option<TypeHandle>;

    /// The ordered field schema of a resolved behaviour type.
    fn introspect_schema(&self, handle: TypeHandle) -> Option<&Schema>;

    /// Show a non-fatal problem to the user.
    fn warn(&mut self, message: &str);
}
