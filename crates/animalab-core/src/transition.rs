//! Transitions and their conditions.

use crate::{
    controller::{StateId, StateMachineId},
    keyword::keyword_enum,
};

keyword_enum! {
    /// How a condition compares its parameter against the threshold.
    pub enum ConditionMode ("condition mode") {
        If => "if",
        IfNot => "ifNot",
        Greater => "greater",
        Less => "less",
        Equals => "equals",
        NotEqual => "notEqual",
    }
}

keyword_enum! {
    /// Which transitions may interrupt a running transition.
    pub enum InterruptionSource ("interruption source") {
        None => "none",
        Source => "source",
        Destination => "destination",
        SourceThenDestination => "sourceThenDestination",
        DestinationThenSource => "destinationThenSource",
    }
}

impl Default for InterruptionSource {
    fn default() -> Self {
        Self::None
    }
}

/// A single test against a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub parameter: String,
    pub mode: ConditionMode,
    /// Ignored by the boolean modes.
    pub threshold: f32,
}

impl Condition {
    pub fn new(parameter: impl Into<String>, mode: ConditionMode, threshold: f32) -> Self {
        Self {
            parameter: parameter.into(),
            mode,
            threshold,
        }
    }
}

/// Where a transition leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    State(StateId),
    StateMachine(StateMachineId),
    /// The exit pseudostate of the enclosing state machine.
    Exit,
}

/// A directed, conditionally gated edge.
///
/// The source is implied by the list that owns the transition: a state's
/// outgoing list, or a state machine's entry or any-state list. The
/// conditions form one AND-group; alternative groups are separate
/// transitions with the same destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub destination: Destination,
    pub conditions: Vec<Condition>,
    pub muted: bool,
    pub solo: bool,
    /// Normalized exit time, `None` when the transition has no exit time.
    pub exit_time: Option<f32>,
    pub duration: f32,
    pub fixed_duration: bool,
    pub offset: f32,
    pub interruption_source: InterruptionSource,
    pub ordered_interruption: bool,
    pub can_transition_to_self: bool,
}

impl Transition {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            conditions: Vec::new(),
            muted: false,
            solo: false,
            exit_time: None,
            duration: 0.0,
            fixed_duration: false,
            offset: 0.0,
            interruption_source: InterruptionSource::None,
            ordered_interruption: false,
            can_transition_to_self: true,
        }
    }

    pub fn is_exit(&self) -> bool {
        self.destination == Destination::Exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_parse_case_insensitively() {
        assert_eq!(
            "SOURCETHENDESTINATION".parse::<InterruptionSource>(),
            Ok(InterruptionSource::SourceThenDestination)
        );
        assert_eq!(
            InterruptionSource::DestinationThenSource.to_string(),
            "destinationThenSource"
        );
        let err = "sideways".parse::<InterruptionSource>().unwrap_err();
        assert_eq!(err.to_string(), "unknown interruption source `sideways`");
    }

    #[test]
    fn test_transition_defaults() {
        let transition = Transition::new(Destination::Exit);
        assert!(transition.is_exit());
        assert!(transition.can_transition_to_self);
        assert_eq!(transition.exit_time, None);
        assert_eq!(transition.interruption_source, InterruptionSource::None);
    }
}
