//! Clips and blend trees.
//!
//! Blend trees nest to any depth, so they are written from an explicit work
//! stack instead of by recursion.

use animalab_core::{
    controller::MotionId,
    motion::{BlendTree, BlendType, ChildMotion, Motion},
};

use super::{
    Writer,
    format::{format_name, format_number, format_offset, format_string},
};

enum Work<'c> {
    /// Write a motion; `child` is its slot in the parent tree, if any.
    Open {
        motion: Option<MotionId>,
        child: Option<(&'c ChildMotion, BlendType)>,
        depth: usize,
    },
    /// Close a blend tree opened at `depth`.
    Close {
        child: Option<&'c ChildMotion>,
        depth: usize,
    },
}

/// The key a child is written under in a tree of `blend_type`.
fn child_key(child: &ChildMotion, blend_type: BlendType) -> String {
    match blend_type {
        BlendType::Direct => format!("{}: ", format_name(&child.direct_parameter)),
        blend_type if blend_type.is_two_dimensional() => format!(
            "({}, {}): ",
            format_number(child.position.x()),
            format_number(child.position.y())
        ),
        _ => format!("{}: ", format_number(child.threshold)),
    }
}

/// Time scale, cycle offset and mirror of a child slot.
fn child_modifiers(child: Option<&ChildMotion>) -> String {
    let Some(child) = child else {
        return String::new();
    };
    let mut text = String::new();
    if child.time_scale != 1.0 {
        text.push_str(&format!(" * {}", format_number(child.time_scale)));
    }
    if let Some(offset) = format_offset(child.cycle_offset) {
        text.push(' ');
        text.push_str(&offset);
    }
    if child.mirror {
        text.push_str(" mirror");
    }
    text
}

fn tree_header(tree: &BlendTree) -> String {
    let parameters = match tree.blend_type.parameter_count() {
        0 => String::new(),
        1 => format!("({})", format_name(&tree.parameter)),
        _ => format!(
            "({}, {})",
            format_name(&tree.parameter),
            format_name(&tree.parameter_y)
        ),
    };
    let thresholds = match tree.thresholds {
        Some((min, max)) => format!(
            " threshold({}, {})",
            format_number(min),
            format_number(max)
        ),
        None => String::new(),
    };
    format!(
        "blendtree {} {}{parameters}{thresholds} {{",
        format_string(&tree.name),
        tree.blend_type.keyword()
    )
}

impl Writer<'_> {
    /// Writes the root motion of a state.
    pub(super) fn motion(&mut self, root: MotionId, depth: usize) {
        let controller = self.controller;
        let mut stack = vec![Work::Open {
            motion: Some(root),
            child: None,
            depth,
        }];
        while let Some(work) = stack.pop() {
            match work {
                Work::Open {
                    motion,
                    child,
                    depth,
                } => {
                    let key = child
                        .map(|(child, blend_type)| child_key(child, blend_type))
                        .unwrap_or_default();
                    let slot = child.map(|(child, _)| child);
                    match motion.map(|id| controller.motion(id)) {
                        None => {
                            let modifiers = child_modifiers(slot);
                            self.line(depth, format!("{key}empty{modifiers};"));
                        }
                        Some(Motion::Clip(clip)) => {
                            let modifiers = child_modifiers(slot);
                            self.line(
                                depth,
                                format!("{key}clip {}{modifiers};", format_string(clip.reference())),
                            );
                        }
                        Some(Motion::BlendTree(tree)) => {
                            self.line(depth, format!("{key}{}", tree_header(tree)));
                            stack.push(Work::Close { child: slot, depth });
                            for child in tree.children.iter().rev() {
                                stack.push(Work::Open {
                                    motion: child.motion,
                                    child: Some((child, tree.blend_type)),
                                    depth: depth + 1,
                                });
                            }
                        }
                    }
                }
                Work::Close { child, depth } => {
                    let modifiers = child_modifiers(child);
                    self.line(depth, format!("}}{modifiers};"));
                }
            }
        }
    }
}
