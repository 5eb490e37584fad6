//! Configuration types for the Animalab compiler.
//!
//! Every type implements [`serde::Deserialize`] and fills missing fields
//! with defaults, so a configuration file only needs the settings it
//! changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration.
//! - [`LayoutConfig`] - Constants of the force-directed layout solver.
//! - [`AssetConfig`] - Where resource references are looked up.
//! - [`BehaviourType`] - A behaviour record type made known to the parser.
//!
//! # Example
//!
//! ```
//! # use animalab::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().iterations(), 100);
//! assert!(config.behaviours().is_empty());
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use animalab_core::behaviour::{FieldDescriptor, Schema, SchemaRegistry};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    layout: LayoutConfig,

    #[serde(default)]
    assets: AssetConfig,

    /// Behaviour record types, as `[[behaviours]]` tables.
    #[serde(default)]
    behaviours: Vec<BehaviourType>,
}

impl AppConfig {
    pub fn new(layout: LayoutConfig, assets: AssetConfig, behaviours: Vec<BehaviourType>) -> Self {
        Self {
            layout,
            assets,
            behaviours,
        }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn assets(&self) -> &AssetConfig {
        &self.assets
    }

    pub fn behaviours(&self) -> &[BehaviourType] {
        &self.behaviours
    }

    /// Builds a schema registry holding every configured behaviour type.
    pub fn schema_registry(&self) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        for behaviour in &self.behaviours {
            registry.register(behaviour.name.clone(), behaviour.schema());
        }
        registry
    }
}

/// Constants of the force-directed layout solver.
///
/// Distances are in layout units; graph positions are layout units scaled by
/// `unit_distance`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    unit_distance: f32,
    min_distance: f32,
    epsilon: f32,
    attractive_strength: f32,
    repulsive_strength: f32,
    damping: f32,
    iterations: usize,
    seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            unit_distance: 12.0,
            min_distance: 20.0,
            epsilon: 0.01,
            attractive_strength: 0.1,
            repulsive_strength: 0.5,
            damping: 0.75,
            iterations: 100,
            seed: 0x5EED,
        }
    }
}

impl LayoutConfig {
    /// Pixels per layout unit.
    pub fn unit_distance(&self) -> f32 {
        self.unit_distance
    }

    /// Distance below which edges stop attracting and nodes repel harder.
    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    /// Largest force that still counts as converged.
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn attractive_strength(&self) -> f32 {
        self.attractive_strength
    }

    pub fn repulsive_strength(&self) -> f32 {
        self.repulsive_strength
    }

    /// Factor kept of each applied force as its residual.
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Iteration cap of one solve.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Seed of the jitter applied to coincident nodes.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_repulsive_strength(mut self, strength: f32) -> Self {
        self.repulsive_strength = strength;
        self
    }

    pub fn with_attractive_strength(mut self, strength: f32) -> Self {
        self.attractive_strength = strength;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Resource lookup settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetConfig {
    /// Directory resource paths are resolved against. Without a root every
    /// reference is accepted as written.
    #[serde(default)]
    root: Option<PathBuf>,
}

impl AssetConfig {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

/// A behaviour record type: its qualified name and field layout.
///
/// ```toml
/// [[behaviours]]
/// name = "Game.Footsteps"
/// fields = [
///     { name = "volume", kind = "float" },
///     { name = "surface", kind = { enum = ["grass", "stone"] } },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BehaviourType {
    name: String,
    #[serde(default)]
    fields: Vec<FieldDescriptor>,
}

impl BehaviourType {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.fields.clone())
    }
}
