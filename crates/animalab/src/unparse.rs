//! Canonical document text for a controller graph.
//!
//! The output parses back into an equal graph: every value that differs from
//! its default is written, and everything else is left out.
//!
//! ```text
//! float speed = 0.5;
//!
//! layer Base {
//!   default Idle;
//!
//!   state Idle {
//!     clip "Clips/idle.anim";
//!     if(speed > 0.1) goto Move;
//!   }
//! }
//! ```

mod behaviour;
mod format;
mod motion;
mod transitions;

use std::collections::HashMap;

use log::{debug, trace};

use animalab_core::{
    Controller, Path,
    controller::{
        Binding, BlendingMode, Layer, NodeRef, Parameter, ParameterValue, State, StateMachineId,
    },
};

use format::{format_name, format_number, format_string};

/// Serializes `controller` to canonical document text.
pub fn unparse(controller: &Controller) -> String {
    let mut writer = Writer::new(controller);
    writer.document();
    debug!(controller = controller.name(), bytes = writer.out.len(); "Document written");
    writer.out
}

struct Writer<'c> {
    controller: &'c Controller,
    paths: HashMap<NodeRef, Path>,
    out: String,
}

impl<'c> Writer<'c> {
    fn new(controller: &'c Controller) -> Self {
        Self {
            controller,
            paths: controller.node_paths(),
            out: String::new(),
        }
    }

    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    /// Separates blocks, except right after an opening brace.
    fn blank_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("{\n") && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn document(&mut self) {
        let controller = self.controller;
        for parameter in controller.parameters() {
            let text = parameter_line(parameter);
            self.line(0, text);
        }
        for layer in controller.layers() {
            self.blank_line();
            self.layer(layer);
        }
    }

    fn layer(&mut self, layer: &Layer) {
        trace!(layer = layer.name.as_str(); "Writing layer");
        self.line(0, format!("layer {} {{", format_name(&layer.name)));
        if layer.weight != 1.0 {
            self.line(1, format!("weight {};", format_number(layer.weight)));
        }
        if layer.blending != BlendingMode::Override {
            self.line(1, format!("{};", layer.blending.keyword()));
        }
        if layer.ik_pass {
            self.line(1, "ikPass;");
        }
        if let Some(mask) = &layer.mask {
            self.line(1, format!("mask {};", format_string(mask.reference())));
        }
        let controller = self.controller;
        let synced = layer
            .synced_layer
            .and_then(|index| controller.layers().get(index));
        if let Some(synced) = synced {
            self.line(1, format!("sync {};", format_name(&synced.name)));
        }
        if layer.sync_timing {
            self.line(1, "syncTiming;");
        }
        self.state_machine_body(layer.state_machine, 1);
        self.line(0, "}");
    }

    fn state_machine_body(&mut self, id: StateMachineId, depth: usize) {
        let controller = self.controller;
        let machine = controller.state_machine(id);
        let scope = self.paths.get(&NodeRef::StateMachine(id)).cloned().unwrap_or_default();

        if let Some(default) = machine.default_state {
            let name = &controller.state(default).name;
            self.line(depth, format!("default {};", format_name(name)));
        }
        self.transitions(&machine.entry_transitions, &scope, false, depth);
        self.transitions(&machine.any_state_transitions, &scope, true, depth);

        for placed in &machine.states {
            self.blank_line();
            self.state(controller.state(placed.node), &scope, depth);
        }
        for placed in &machine.state_machines {
            let nested = controller.state_machine(placed.node);
            self.blank_line();
            self.line(depth, format!("stateMachine {} {{", format_name(&nested.name)));
            self.state_machine_body(placed.node, depth + 1);
            self.line(depth, "}");
        }
        for behaviour in &machine.behaviours {
            self.blank_line();
            self.behaviour(controller.behaviour(*behaviour), depth);
        }
    }

    fn state(&mut self, state: &State, scope: &Path, depth: usize) {
        let controller = self.controller;
        self.line(depth, format!("state {} {{", format_name(&state.name)));
        let inner = depth + 1;

        if let Some(parameter) = &state.time_parameter {
            self.line(inner, format!("time {};", format_name(parameter)));
        }
        match &state.speed {
            Binding::Parameter(name) => self.line(inner, format!("speed {};", format_name(name))),
            Binding::Literal(speed) if *speed != 1.0 => {
                self.line(inner, format!("speed {};", format_number(*speed)));
            }
            Binding::Literal(_) => {}
        }
        match &state.cycle_offset {
            Binding::Parameter(name) => {
                self.line(inner, format!("cycleOffset {};", format_name(name)));
            }
            Binding::Literal(offset) if *offset != 0.0 => {
                self.line(inner, format!("cycleOffset {};", format_number(*offset)));
            }
            Binding::Literal(_) => {}
        }
        match &state.mirror {
            Binding::Parameter(name) => self.line(inner, format!("mirror {};", format_name(name))),
            Binding::Literal(true) => self.line(inner, "mirror;"),
            Binding::Literal(false) => {}
        }
        if state.ik_on_feet {
            self.line(inner, "ikOnFeet;");
        }
        if state.write_defaults {
            self.line(inner, "writeDefaults;");
        }
        if !state.tag.is_empty() {
            self.line(inner, format!("tag {};", format_string(&state.tag)));
        }
        if let Some(motion) = state.motion {
            self.motion(motion, inner);
        }
        for behaviour in &state.behaviours {
            self.behaviour(controller.behaviour(*behaviour), inner);
        }
        self.transitions(&state.transitions, scope, false, inner);
        self.line(depth, "}");
    }
}

fn parameter_line(parameter: &Parameter) -> String {
    let kind = parameter.kind().keyword();
    let name = format_name(&parameter.name);
    match parameter.default {
        ParameterValue::Float(value) => format!("{kind} {name} = {};", format_number(value)),
        ParameterValue::Int(value) => format!("{kind} {name} = {value};"),
        ParameterValue::Bool(value) => format!("{kind} {name} = {value};"),
        ParameterValue::Trigger(true) => format!("{kind} {name} = true;"),
        ParameterValue::Trigger(false) => format!("{kind} {name};"),
    }
}
