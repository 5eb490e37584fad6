//! Animalab Core Types and Definitions
//!
//! This crate provides the foundational types for the Animalab animation
//! state-machine language. It includes:
//!
//! - **Graph model**: the [`Controller`](controller::Controller) arena with its
//!   layers, state machines, states, transitions and motions
//! - **Paths**: slash-separated scope identifiers ([`path::Path`])
//! - **Geometry**: node positions for the layout solver ([`geometry`] module)
//! - **Behaviours**: host-described record schemas and their values
//!   ([`behaviour`] module)
//! - **Resources**: references to host-managed assets ([`resource`] module)

pub mod behaviour;
pub mod controller;
pub mod geometry;
pub mod keyword;
pub mod motion;
pub mod path;
pub mod resource;
pub mod transition;

pub use controller::Controller;
pub use path::Path;
