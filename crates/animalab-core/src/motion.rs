//! Motions: clips and blend trees.

use crate::{
    controller::MotionId, geometry::Vec2, keyword::keyword_enum, resource::AssetRef,
};

keyword_enum! {
    /// How a blend tree mixes its children.
    pub enum BlendType ("blend type") {
        Simple1D => "simple1D",
        SimpleDirectional2D => "simpleDirectional2D",
        FreeformDirectional2D => "freeformDirectional2D",
        FreeformCartesian2D => "freeformCartesian2D",
        Direct => "direct",
    }
}

impl BlendType {
    /// Number of blend parameters the type is driven by.
    pub fn parameter_count(self) -> usize {
        match self {
            Self::Direct => 0,
            Self::Simple1D => 1,
            Self::SimpleDirectional2D | Self::FreeformDirectional2D | Self::FreeformCartesian2D => 2,
        }
    }

    pub fn is_two_dimensional(self) -> bool {
        self.parameter_count() == 2
    }
}

/// A motion node stored in the controller's motion arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    Clip(AssetRef),
    BlendTree(BlendTree),
}

impl Motion {
    pub fn as_blend_tree(&self) -> Option<&BlendTree> {
        match self {
            Self::BlendTree(tree) => Some(tree),
            Self::Clip(_) => None,
        }
    }

    pub fn as_blend_tree_mut(&mut self) -> Option<&mut BlendTree> {
        match self {
            Self::BlendTree(tree) => Some(tree),
            Self::Clip(_) => None,
        }
    }
}

/// An interior motion node blending its children.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendTree {
    pub name: String,
    pub blend_type: BlendType,
    pub parameter: String,
    /// Second parameter, used by the 2D blend types.
    pub parameter_y: String,
    /// Fixed `(min, max)` thresholds; `None` means automatic thresholds.
    pub thresholds: Option<(f32, f32)>,
    pub children: Vec<ChildMotion>,
}

impl BlendTree {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blend_type: BlendType::Simple1D,
            parameter: String::new(),
            parameter_y: String::new(),
            thresholds: None,
            children: Vec::new(),
        }
    }
}

/// One child slot of a blend tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildMotion {
    /// `None` when the slot is empty or its clip could not be resolved.
    pub motion: Option<MotionId>,
    pub threshold: f32,
    pub position: Vec2,
    pub direct_parameter: String,
    pub time_scale: f32,
    pub cycle_offset: f32,
    pub mirror: bool,
}

impl Default for ChildMotion {
    fn default() -> Self {
        Self {
            motion: None,
            threshold: 0.0,
            position: Vec2::ZERO,
            direct_parameter: String::new(),
            time_scale: 1.0,
            cycle_offset: 0.0,
            mirror: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_type_parameter_counts() {
        assert_eq!(BlendType::Direct.parameter_count(), 0);
        assert_eq!(BlendType::Simple1D.parameter_count(), 1);
        assert!(BlendType::FreeformCartesian2D.is_two_dimensional());
        assert_eq!("SIMPLE1d".parse::<BlendType>(), Ok(BlendType::Simple1D));
    }

    #[test]
    fn test_child_motion_defaults() {
        let child = ChildMotion::default();
        assert_eq!(child.time_scale, 1.0);
        assert!(child.motion.is_none());
    }
}
