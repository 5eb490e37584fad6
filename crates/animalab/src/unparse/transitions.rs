//! Transition statements.
//!
//! Consecutive conditional transitions that agree on everything but their
//! conditions fold into one statement, each transition becoming one `||`
//! group:
//!
//! ```text
//! if(x > 0 || y > 0) goto Dest;
//! ```

use log::warn;

use animalab_core::{
    Path,
    controller::{NodeRef, TransitionId},
    transition::{Condition, ConditionMode, Destination, InterruptionSource, Transition},
};

use super::{
    Writer,
    format::{format_name, format_number, format_offset},
};

/// Whether `a` and `b` can be written as one statement.
fn same_statement(a: &Transition, b: &Transition) -> bool {
    !a.conditions.is_empty()
        && !b.conditions.is_empty()
        && a.muted == b.muted
        && a.solo == b.solo
        && a.destination == b.destination
        && a.exit_time == b.exit_time
        && a.fixed_duration == b.fixed_duration
        && a.duration == b.duration
        && a.offset == b.offset
        && a.interruption_source == b.interruption_source
        && a.ordered_interruption == b.ordered_interruption
        && a.can_transition_to_self == b.can_transition_to_self
}

fn condition(condition: &Condition) -> String {
    let name = format_name(&condition.parameter);
    let threshold = format_number(condition.threshold);
    match condition.mode {
        ConditionMode::If => name.into_owned(),
        ConditionMode::IfNot => format!("!{name}"),
        ConditionMode::Greater => format!("{name} > {threshold}"),
        ConditionMode::Less => format!("{name} < {threshold}"),
        ConditionMode::Equals => format!("{name} == {threshold}"),
        ConditionMode::NotEqual => format!("{name} != {threshold}"),
    }
}

impl Writer<'_> {
    /// Writes a transition list owned by a state or, for `any`, by the
    /// any-state of the state machine at `scope`.
    pub(super) fn transitions(
        &mut self,
        ids: &[TransitionId],
        scope: &Path,
        any: bool,
        depth: usize,
    ) {
        let controller = self.controller;
        let mut group: Vec<&Transition> = Vec::new();
        for id in ids {
            let transition = controller.transition(*id);
            if let Some(first) = group.first() {
                if !same_statement(first, transition) {
                    let text = self.statement(&group, scope, any);
                    self.line(depth, text);
                    group.clear();
                }
            }
            group.push(transition);
        }
        if !group.is_empty() {
            let text = self.statement(&group, scope, any);
            self.line(depth, text);
        }
    }

    /// One statement for a non-empty group; modifiers come from its first
    /// transition.
    fn statement(&self, group: &[&Transition], scope: &Path, any: bool) -> String {
        let Some(first) = group.first() else {
            return String::new();
        };
        let mut parts: Vec<String> = Vec::new();
        if first.muted {
            parts.push("muted".into());
        }
        if first.solo {
            parts.push("solo".into());
        }
        if any {
            parts.push("any".into());
        }
        if !first.can_transition_to_self {
            parts.push("noSelf".into());
        }
        if let Some(exit_time) = first.exit_time {
            parts.push(format!("wait({})", format_number(exit_time)));
        }
        if !first.conditions.is_empty() {
            let groups: Vec<String> = group
                .iter()
                .map(|transition| {
                    transition
                        .conditions
                        .iter()
                        .map(condition)
                        .collect::<Vec<_>>()
                        .join(" && ")
                })
                .collect();
            parts.push(format!("if({})", groups.join(" || ")));
        }
        if first.duration != 0.0 || first.fixed_duration {
            let unit = if first.fixed_duration { "s" } else { "" };
            parts.push(format!("fade({}{unit})", format_number(first.duration)));
        }
        parts.extend(format_offset(first.offset));
        if first.interruption_source != InterruptionSource::None {
            parts.push(first.interruption_source.keyword().to_string());
            if first.ordered_interruption {
                parts.push("ordered".into());
            }
        }
        parts.push(self.target(first.destination, scope));
        format!("{};", parts.join(" "))
    }

    /// `end`, or `goto` with the shortest path that resolves from `scope`.
    fn target(&self, destination: Destination, scope: &Path) -> String {
        let node = match destination {
            Destination::Exit => return "end".into(),
            Destination::State(id) => NodeRef::State(id),
            Destination::StateMachine(id) => NodeRef::StateMachine(id),
        };
        let Some(path) = self.paths.get(&node) else {
            let name = match destination {
                Destination::State(id) => &self.controller.state(id).name,
                Destination::StateMachine(id) => &self.controller.state_machine(id).name,
                Destination::Exit => return "end".into(),
            };
            warn!(destination = name.as_str(); "Transition target outside every layer");
            return format!("goto {}", format_name(name));
        };
        if path.parent().as_ref() == Some(scope) {
            if let Some(name) = path.name() {
                return format!("goto {}", format_name(name));
            }
        }
        let below_root: Vec<String> = path
            .segments()
            .iter()
            .skip(1)
            .map(|segment| format_name(segment).into_owned())
            .collect();
        match below_root.as_slice() {
            [] => format!("goto {}", path.name().map(format_name).unwrap_or_default()),
            [single] => format!("goto /{single}"),
            segments => format!("goto {}", segments.join("/")),
        }
    }
}

#[cfg(test)]
mod tests {
    use animalab_core::{
        Controller,
        controller::{Layer, Placed, State, StateId, StateMachine, StateMachineId},
    };

    use super::*;
    use crate::unparse::unparse;

    struct Graph {
        controller: Controller,
        idle: StateId,
        air: StateMachineId,
        rise: StateId,
    }

    fn graph() -> Graph {
        let mut controller = Controller::new("Hero");
        let root = controller.add_state_machine(StateMachine::new("Base"));
        let air = controller.add_state_machine(StateMachine::new("Air"));
        let idle = controller.add_state(State::new("Idle"));
        let rise = controller.add_state(State::new("Rise"));
        controller.state_machine_mut(root).states.push(Placed::new(idle));
        controller
            .state_machine_mut(root)
            .state_machines
            .push(Placed::new(air));
        controller.state_machine_mut(air).states.push(Placed::new(rise));
        controller.add_layer(Layer::new("Base", root));
        Graph {
            controller,
            idle,
            air,
            rise,
        }
    }

    fn add_from(controller: &mut Controller, state: StateId, transition: Transition) {
        let id = controller.add_transition(transition);
        controller.state_mut(state).transitions.push(id);
    }

    fn conditional(destination: Destination, parameter: &str) -> Transition {
        let mut transition = Transition::new(destination);
        transition.conditions = vec![Condition::new(parameter, ConditionMode::Greater, 0.0)];
        transition
    }

    /// The lines of `text` that hold a transition statement.
    fn statements(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| line.contains("goto") || line.ends_with("end;"))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_condition_groups_fold() {
        let Graph {
            mut controller,
            idle,
            ..
        } = graph();
        let destination = Destination::State(idle);
        add_from(&mut controller, idle, conditional(destination, "x"));
        add_from(&mut controller, idle, conditional(destination, "y"));

        assert_eq!(
            statements(&unparse(&controller)),
            ["if(x > 0 || y > 0) goto Idle;"]
        );
    }

    #[test]
    fn test_differing_modifiers_do_not_fold() {
        let Graph {
            mut controller,
            idle,
            ..
        } = graph();
        let destination = Destination::State(idle);
        add_from(&mut controller, idle, conditional(destination, "x"));
        let mut faded = conditional(destination, "y");
        faded.duration = 0.25;
        faded.fixed_duration = true;
        add_from(&mut controller, idle, faded);
        add_from(&mut controller, idle, Transition::new(destination));
        add_from(&mut controller, idle, Transition::new(destination));

        assert_eq!(
            statements(&unparse(&controller)),
            [
                "if(x > 0) goto Idle;",
                "if(y > 0) fade(0.25s) goto Idle;",
                "goto Idle;",
                "goto Idle;",
            ]
        );
    }

    #[test]
    fn test_modifier_order() {
        let Graph {
            mut controller,
            idle,
            ..
        } = graph();
        let mut transition = Transition::new(Destination::Exit);
        transition.muted = true;
        transition.solo = true;
        transition.can_transition_to_self = false;
        transition.exit_time = Some(0.75);
        transition.conditions = vec![
            Condition::new("grounded", ConditionMode::IfNot, 0.0),
            Condition::new("combo", ConditionMode::NotEqual, -1.0),
        ];
        transition.duration = 0.5;
        transition.offset = -0.125;
        transition.interruption_source = InterruptionSource::SourceThenDestination;
        transition.ordered_interruption = true;
        add_from(&mut controller, idle, transition);

        assert_eq!(
            statements(&unparse(&controller)),
            ["muted solo noSelf wait(0.75) if(!grounded && combo != -1) fade(0.5) - 0.125 \
              sourceThenDestination ordered end;"]
        );
    }

    #[test]
    fn test_goto_paths() {
        let Graph {
            mut controller,
            idle,
            air,
            rise,
        } = graph();
        add_from(&mut controller, idle, Transition::new(Destination::State(rise)));
        add_from(&mut controller, idle, Transition::new(Destination::StateMachine(air)));
        add_from(&mut controller, rise, Transition::new(Destination::State(idle)));
        add_from(&mut controller, rise, Transition::new(Destination::State(rise)));

        assert_eq!(
            statements(&unparse(&controller)),
            ["goto Air/Rise;", "goto Air;", "goto /Idle;", "goto Rise;"]
        );
    }

    #[test]
    fn test_any_state_and_entry() {
        let Graph {
            mut controller,
            idle,
            ..
        } = graph();
        let root = controller.layers()[0].state_machine;
        let entry = controller.add_transition(conditional(Destination::State(idle), "speed"));
        let mut from_any = Transition::new(Destination::State(idle));
        from_any.can_transition_to_self = false;
        let any = controller.add_transition(from_any);
        controller.state_machine_mut(root).entry_transitions.push(entry);
        controller.state_machine_mut(root).any_state_transitions.push(any);

        assert_eq!(
            statements(&unparse(&controller)),
            ["if(speed > 0) goto Idle;", "any noSelf goto Idle;"]
        );
    }
}
