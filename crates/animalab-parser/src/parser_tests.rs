//! Grammar tests for the document language.
//!
//! These drive the full pipeline (lexer, stack parser, rules and linker)
//! against a small in-memory host.

use animalab_core::{
    Controller,
    behaviour::{FieldDescriptor, FieldKind, Schema, SchemaRegistry, TypeHandle, Value},
    controller::{
        BlendingMode, Binding, NodeRef, ParameterKind, ParameterValue, StateId, StateMachineId,
    },
    geometry::Vec2,
    motion::{BlendType, Motion},
    resource::{AssetRef, ResourceKind},
    transition::{ConditionMode, Destination, InterruptionSource},
};

use crate::{
    Host, ObjectRef, ParseOutput,
    error::{ErrorCode, ParseError},
    parse,
};

/// Accepts every resource except those starting with `missing`.
#[derive(Default)]
struct TestHost {
    registry: SchemaRegistry,
    persisted: Vec<String>,
    warnings: Vec<String>,
}

impl Host for TestHost {
    fn resolve_resource(&mut self, reference: &str, kind: ResourceKind) -> Option<AssetRef> {
        (!reference.starts_with("missing")).then(|| AssetRef::new(reference, kind))
    }

    fn persist(&mut self, _object: ObjectRef, unique_name: &str) {
        self.persisted.push(unique_name.to_string());
    }

    fn resolve_behaviour_type(&self, name: &str) -> Option<TypeHandle> {
        self.registry.resolve(name)
    }

    fn introspect_schema(&self, handle: TypeHandle) -> Option<&Schema> {
        self.registry.schema(handle)
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

fn parse_ok(source: &str) -> ParseOutput {
    let mut host = TestHost::default();
    parse(source, "Hero", &mut host).unwrap_or_else(|err| panic!("parse failed: {err}"))
}

fn parse_err(source: &str) -> ParseError {
    let mut host = TestHost::default();
    match parse(source, "Hero", &mut host) {
        Ok(_) => panic!("expected the parse to fail"),
        Err(err) => err,
    }
}

fn warning_codes(output: &ParseOutput) -> Vec<Option<ErrorCode>> {
    output.warnings.iter().map(|w| w.code()).collect()
}

fn find_state(controller: &Controller, path: &str) -> StateId {
    controller
        .node_paths()
        .into_iter()
        .find_map(|(node, p)| match node {
            NodeRef::State(id) if p.to_string() == path => Some(id),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no state at `{path}`"))
}

fn find_machine(controller: &Controller, path: &str) -> StateMachineId {
    controller
        .node_paths()
        .into_iter()
        .find_map(|(node, p)| match node {
            NodeRef::StateMachine(id) if p.to_string() == path => Some(id),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no state machine at `{path}`"))
}

#[test]
fn test_parameter_declarations() {
    let output = parse_ok(
        r#"
        bool grounded = true;
        int jumps = 2;
        float speed = 0.5;
        trigger fire = true;
        int bad = 1.5;
        FLOAT speed = 3;
        bool ;
        "#,
    );
    let parameters = output.controller.parameters();
    assert_eq!(parameters.len(), 5);
    assert_eq!(parameters[0].default, ParameterValue::Bool(true));
    assert_eq!(parameters[1].default, ParameterValue::Int(2));
    assert_eq!(parameters[2].default, ParameterValue::Float(0.5));
    assert_eq!(parameters[3].default, ParameterValue::Trigger(true));
    assert_eq!(parameters[4].name, "bad");
    assert_eq!(parameters[4].default, ParameterValue::Int(0));
    assert_eq!(warning_codes(&output), [Some(ErrorCode::E200)]);
}

#[test]
fn test_parameter_kind_mismatch_is_ignored() {
    let output = parse_ok("trigger t = false; bool b = 1; float f = 16;");
    let controller = &output.controller;
    assert_eq!(controller.parameter("t").map(|p| p.default), Some(ParameterValue::Trigger(false)));
    assert_eq!(controller.parameter("b").map(|p| p.default), Some(ParameterValue::Bool(false)));
    assert_eq!(controller.parameter("f").map(|p| p.default), Some(ParameterValue::Float(16.0)));
    assert_eq!(controller.parameter("f").map(|p| p.kind()), Some(ParameterKind::Float));
}

#[test]
fn test_layer_options() {
    let output = parse_ok(
        r#"
        layer Base {
            weight 0.5;
            additive;
            ikPass;
            mask "Masks/upper.mask";
            syncTiming;
            sync Top;
        }
        layer Top { }
        "#,
    );
    let layers = output.controller.layers();
    assert_eq!(layers.len(), 2);
    let base = &layers[0];
    assert_eq!(base.weight, 0.5);
    assert_eq!(base.blending, BlendingMode::Additive);
    assert!(base.ik_pass);
    assert!(base.sync_timing);
    assert_eq!(
        base.mask.as_ref().map(|mask| mask.reference()),
        Some("Masks/upper.mask")
    );
    assert_eq!(base.synced_layer, Some(1));
    assert_eq!(layers[1].blending, BlendingMode::Override);
    assert!(output.warnings.is_empty());
}

#[test]
fn test_missing_sync_layer_warns() {
    let mut host = TestHost::default();
    let output = parse("layer A { sync Nope; }", "Hero", &mut host).expect("parse");
    assert_eq!(warning_codes(&output), [Some(ErrorCode::E204)]);
    assert_eq!(output.warnings[0].message(), "Sync layer \"Nope\" not found");
    assert_eq!(host.warnings, ["Sync layer \"Nope\" not found"]);
    assert_eq!(output.controller.layers()[0].synced_layer, None);
}

#[test]
fn test_states_and_transitions() {
    let output = parse_ok(
        r#"
        float speed;
        layer Base {
            default Idle;
            state Idle {
                if speed > 0.1 goto Run;
            }
            state Run {
                if(speed < 0.1) fade(0.25s) goto Idle;
            }
        }
        "#,
    );
    let controller = &output.controller;
    let idle = find_state(controller, "Base/Idle");
    let run = find_state(controller, "Base/Run");
    let root = controller.layers()[0].state_machine;
    assert_eq!(controller.state_machine(root).default_state, Some(idle));

    let to_run = controller.transition(controller.state(idle).transitions[0]);
    assert_eq!(to_run.destination, Destination::State(run));
    assert_eq!(to_run.conditions.len(), 1);
    assert_eq!(to_run.conditions[0].parameter, "speed");
    assert_eq!(to_run.conditions[0].mode, ConditionMode::Greater);
    assert_eq!(to_run.conditions[0].threshold, 0.1);

    let to_idle = controller.transition(controller.state(run).transitions[0]);
    assert_eq!(to_idle.destination, Destination::State(idle));
    assert_eq!(to_idle.conditions[0].mode, ConditionMode::Less);
    assert_eq!(to_idle.duration, 0.25);
    assert!(to_idle.fixed_duration);
    assert!(output.warnings.is_empty());
}

#[test]
fn test_condition_groups_split_into_transitions() {
    let output = parse_ok(
        r#"
        layer Base {
            state A {
                if(x > 0 || y > 0) goto B;
                if a && !b goto B;
                if c == 2 if d != 3 goto B;
            }
            state B { }
        }
        "#,
    );
    let controller = &output.controller;
    let a = controller.state(find_state(controller, "Base/A"));
    let transitions: Vec<_> = a
        .transitions
        .iter()
        .map(|id| controller.transition(*id))
        .collect();
    assert_eq!(transitions.len(), 5);

    assert_eq!(transitions[0].conditions[0].parameter, "x");
    assert_eq!(transitions[1].conditions[0].parameter, "y");

    let modes: Vec<_> = transitions[2].conditions.iter().map(|c| c.mode).collect();
    assert_eq!(modes, [ConditionMode::If, ConditionMode::IfNot]);

    assert_eq!(transitions[3].conditions[0].mode, ConditionMode::Equals);
    assert_eq!(transitions[3].conditions[0].threshold, 2.0);
    assert_eq!(transitions[4].conditions[0].mode, ConditionMode::NotEqual);
    assert_eq!(transitions[4].conditions[0].threshold, 3.0);
}

#[test]
fn test_bracketed_alternatives() {
    let output = parse_ok(
        r#"
        bool x; bool y; bool z;
        layer Base {
            state A {
                if(x) || (y) goto A;
                if(x) || (y && !z) || z goto B;
            }
            state B { }
        }
        "#,
    );
    let controller = &output.controller;
    let a = controller.state(find_state(controller, "Base/A"));
    let transitions: Vec<_> = a
        .transitions
        .iter()
        .map(|id| controller.transition(*id))
        .collect();
    assert_eq!(transitions.len(), 5);

    let parameters: Vec<Vec<&str>> = transitions
        .iter()
        .map(|t| t.conditions.iter().map(|c| c.parameter.as_str()).collect())
        .collect();
    assert_eq!(
        parameters,
        [vec!["x"], vec!["y"], vec!["x"], vec!["y", "z"], vec!["z"]]
    );
    assert_eq!(transitions[3].conditions[1].mode, ConditionMode::IfNot);
    assert!(output.warnings.is_empty());
}

#[test]
fn test_unclosed_alternative_bracket_fails() {
    let err = parse_err("bool x; bool y; layer Base { state A { if(x) || (y goto A; } }");
    assert_eq!(err.code(), Some(ErrorCode::E100));
}

#[test]
fn test_transition_modifiers() {
    let output = parse_ok(
        r#"
        layer Base {
            state A {
                muted solo noSelf wait(0.75) fade 0.5 + 0.25 sourceThenDestination ordered goto B;
                wait 0.9 - - 0.5 source goto B;
                -0.125 goto B;
            }
            state B { }
        }
        "#,
    );
    let controller = &output.controller;
    let a = controller.state(find_state(controller, "Base/A"));
    let first = controller.transition(a.transitions[0]);
    assert!(first.muted);
    assert!(first.solo);
    assert!(!first.can_transition_to_self);
    assert_eq!(first.exit_time, Some(0.75));
    assert_eq!(first.duration, 0.5);
    assert!(!first.fixed_duration);
    assert_eq!(first.offset, 0.25);
    assert_eq!(
        first.interruption_source,
        InterruptionSource::SourceThenDestination
    );
    assert!(first.ordered_interruption);
    assert!(first.conditions.is_empty());

    let second = controller.transition(a.transitions[1]);
    assert_eq!(second.exit_time, Some(0.9));
    assert_eq!(second.offset, 0.5);
    assert_eq!(second.interruption_source, InterruptionSource::Source);
    assert!(!second.ordered_interruption);

    let third = controller.transition(a.transitions[2]);
    assert_eq!(third.offset, -0.125);
}

#[test]
fn test_self_and_exit_transitions() {
    let output = parse_ok("layer Base { state A { wait 0.9; end; } }");
    let controller = &output.controller;
    let a = find_state(controller, "Base/A");
    let transitions = &controller.state(a).transitions;
    assert_eq!(controller.transition(transitions[0]).destination, Destination::State(a));
    assert_eq!(controller.transition(transitions[1]).destination, Destination::Exit);
}

#[test]
fn test_entry_and_any_state_transitions() {
    let output = parse_ok(
        r#"
        layer Base {
            goto A;
            any if hit goto B;
            if lost;
            state A { }
            state B { }
        }
        "#,
    );
    let controller = &output.controller;
    let root = controller.state_machine(controller.layers()[0].state_machine);
    assert_eq!(root.entry_transitions.len(), 1);
    assert_eq!(
        controller.transition(root.entry_transitions[0]).destination,
        Destination::State(find_state(controller, "Base/A"))
    );
    assert_eq!(root.any_state_transitions.len(), 1);
    assert_eq!(warning_codes(&output), [Some(ErrorCode::E202)]);
}

#[test]
fn test_nested_machines_and_paths() {
    let output = parse_ok(
        r#"
        layer Base {
            stateMachine Air {
                state Jump { end; }
                state Fall { goto /Ground/Land; }
            }
            stateMachine Ground {
                state Land { goto Air/Jump; }
            }
            state Idle { goto Air; }
        }
        "#,
    );
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    let controller = &output.controller;
    let fall = controller.state(find_state(controller, "Base/Air/Fall"));
    assert_eq!(
        controller.transition(fall.transitions[0]).destination,
        Destination::State(find_state(controller, "Base/Ground/Land"))
    );
    let land = controller.state(find_state(controller, "Base/Ground/Land"));
    assert_eq!(
        controller.transition(land.transitions[0]).destination,
        Destination::State(find_state(controller, "Base/Air/Jump"))
    );
    let idle = controller.state(find_state(controller, "Base/Idle"));
    assert_eq!(
        controller.transition(idle.transitions[0]).destination,
        Destination::StateMachine(find_machine(controller, "Base/Air"))
    );
}

#[test]
fn test_link_failures_are_warnings() {
    let output = parse_ok(
        r#"
        layer Base {
            default Ghost;
            state A { goto Nowhere; goto B; }
            state B { }
            state B { }
        }
        "#,
    );
    let codes = warning_codes(&output);
    assert!(codes.contains(&Some(ErrorCode::E202)));
    assert!(codes.contains(&Some(ErrorCode::E203)));
    assert!(codes.contains(&Some(ErrorCode::E205)));

    let controller = &output.controller;
    let a = controller.state(find_state(controller, "Base/A"));
    assert_eq!(a.transitions.len(), 1);
    let root = controller.layers()[0].state_machine;
    assert_eq!(controller.state_machine(root).default_state, None);
    assert_eq!(controller.state_machine(root).states.len(), 3);
}

#[test]
fn test_clip_motion_sets_state_literals() {
    let output = parse_ok(
        r#"layer Base { state Run { speed 2; clip "Clips/run.anim" * 1.5 + 0.25 mirror; } }"#,
    );
    let controller = &output.controller;
    let run = controller.state(find_state(controller, "Base/Run"));
    let motion = run.motion.map(|id| controller.motion(id));
    match motion {
        Some(Motion::Clip(clip)) => assert_eq!(clip.reference(), "Clips/run.anim"),
        other => panic!("expected a clip, got {other:?}"),
    }
    assert_eq!(run.speed, Binding::Literal(1.5));
    assert_eq!(run.cycle_offset, Binding::Literal(0.25));
    assert_eq!(run.mirror, Binding::Literal(true));
}

#[test]
fn test_state_options() {
    let output = parse_ok(
        r#"
        layer Base {
            state Aim {
                speed aimSpeed;
                cycleOffset 0.5;
                time aimTime;
                mirror flip;
                ikOnFeet;
                writeDefaults;
                tag "combat";
                clip "missing.anim";
            }
        }
        "#,
    );
    let controller = &output.controller;
    let aim = controller.state(find_state(controller, "Base/Aim"));
    assert_eq!(aim.speed, Binding::Parameter("aimSpeed".to_string()));
    assert_eq!(aim.cycle_offset, Binding::Literal(0.5));
    assert_eq!(aim.time_parameter.as_deref(), Some("aimTime"));
    assert_eq!(aim.mirror, Binding::Parameter("flip".to_string()));
    assert!(aim.ik_on_feet);
    assert!(aim.write_defaults);
    assert_eq!(aim.tag, "combat");
    assert_eq!(aim.motion, None);
}

#[test]
fn test_blend_tree() {
    let output = parse_ok(
        r#"
        layer Base {
            state Move {
                blendtree "Locomotion" simple1D(speed) threshold(0, 2) {
                    0: clip "idle";
                    1: blendtree "Inner" freeformCartesian2D(x, y) {
                        (0, 1): clip "fwd" * 2;
                        (-1, 0): clip "left" mirror;
                    }
                    2: empty;
                }
                goto Move;
            }
        }
        "#,
    );
    let controller = &output.controller;
    let move_id = find_state(controller, "Base/Move");
    let state = controller.state(move_id);
    let tree = state
        .motion
        .and_then(|id| controller.motion(id).as_blend_tree())
        .expect("blend tree");
    assert_eq!(tree.name, "Locomotion");
    assert_eq!(tree.blend_type, BlendType::Simple1D);
    assert_eq!(tree.parameter, "speed");
    assert_eq!(tree.thresholds, Some((0.0, 2.0)));
    assert_eq!(tree.children.len(), 3);
    assert_eq!(tree.children[2].threshold, 2.0);
    assert_eq!(tree.children[2].motion, None);

    let inner = tree.children[1]
        .motion
        .and_then(|id| controller.motion(id).as_blend_tree())
        .expect("inner blend tree");
    assert_eq!(inner.blend_type, BlendType::FreeformCartesian2D);
    assert_eq!(inner.parameter_y, "y");
    assert_eq!(inner.children[0].position, Vec2::new(0.0, 1.0));
    assert_eq!(inner.children[0].time_scale, 2.0);
    assert_eq!(inner.children[1].position, Vec2::new(-1.0, 0.0));
    assert!(inner.children[1].mirror);

    assert_eq!(state.transitions.len(), 1);
    assert_eq!(
        controller.transition(state.transitions[0]).destination,
        Destination::State(move_id)
    );
}

#[test]
fn test_direct_blend_tree() {
    let output = parse_ok(
        r#"
        layer Base {
            state Face {
                blendtree "Face" direct {
                    smile: clip "smile";
                    blink: clip "blink";
                };
            }
        }
        "#,
    );
    let controller = &output.controller;
    let face = controller.state(find_state(controller, "Base/Face"));
    let tree = face
        .motion
        .and_then(|id| controller.motion(id).as_blend_tree())
        .expect("blend tree");
    assert_eq!(tree.blend_type, BlendType::Direct);
    let parameters: Vec<_> = tree
        .children
        .iter()
        .map(|c| c.direct_parameter.as_str())
        .collect();
    assert_eq!(parameters, ["smile", "blink"]);
}

fn footstep_host() -> TestHost {
    let mut host = TestHost::default();
    host.registry.register(
        "Game.Footsteps",
        Schema::new(vec![
            FieldDescriptor::new("volume", FieldKind::Float),
            FieldDescriptor::new(
                "surface",
                FieldKind::Enum(vec!["grass".into(), "stone".into()]),
            ),
            FieldDescriptor::new(
                "layers",
                FieldKind::Mask(vec!["a".into(), "b".into(), "c".into()]),
            ),
            FieldDescriptor::new(
                "offset",
                FieldKind::Record(Schema::new(vec![
                    FieldDescriptor::new("x", FieldKind::Float),
                    FieldDescriptor::new("y", FieldKind::Float),
                ])),
            ),
            FieldDescriptor::new("tags", FieldKind::Array(Box::new(FieldKind::String))),
            FieldDescriptor::new("target", FieldKind::Object),
            FieldDescriptor::new("enabled", FieldKind::Bool),
            FieldDescriptor::new("count", FieldKind::Integer),
        ]),
    );
    host
}

#[test]
fn test_behaviour_records() {
    let mut host = footstep_host();
    let output = parse(
        r#"
        layer Base {
            state Walk {
                Game.Footsteps {
                    volume = 0.8;
                    surface = Stone;
                    layers = 1, c;
                    offset = { x = 1; y = 0.5; };
                    tags = [ "left"; "right"; ];
                    target = "Props/ball.prefab";
                    enabled = true;
                    count = 3;
                };
            }
            Game.Footsteps { };
        }
        "#,
        "Hero",
        &mut host,
    )
    .expect("parse");
    let controller = &output.controller;
    let walk = controller.state(find_state(controller, "Base/Walk"));
    assert_eq!(walk.behaviours.len(), 1);
    let record = controller.behaviour(walk.behaviours[0]);
    assert_eq!(record.type_name(), "Game.Footsteps");
    let fields = &record.fields;
    assert_eq!(fields.get("volume"), Some(&Value::Float(0.8)));
    assert_eq!(fields.get("surface"), Some(&Value::Enum(1)));
    assert_eq!(fields.get("layers"), Some(&Value::Mask(0b101)));
    match fields.get("offset") {
        Some(Value::Record(offset)) => {
            assert_eq!(offset.get("x"), Some(&Value::Float(1.0)));
            assert_eq!(offset.get("y"), Some(&Value::Float(0.5)));
        }
        other => panic!("expected a record, got {other:?}"),
    }
    assert_eq!(
        fields.get("tags"),
        Some(&Value::Array(vec![
            Value::String("left".into()),
            Value::String("right".into()),
        ]))
    );
    assert_eq!(
        fields.get("target"),
        Some(&Value::Object(Some(AssetRef::new(
            "Props/ball.prefab",
            ResourceKind::Object
        ))))
    );
    assert_eq!(fields.get("enabled"), Some(&Value::Bool(true)));
    assert_eq!(fields.get("count"), Some(&Value::Integer(3)));

    let root = controller.layers()[0].state_machine;
    assert_eq!(controller.state_machine(root).behaviours.len(), 1);
}

#[test]
fn test_unknown_behaviour_type_and_field() {
    let err = parse_err("layer Base { state A { Game.Missing { }; } }");
    assert_eq!(err.code(), Some(ErrorCode::E101));

    let mut host = footstep_host();
    let err = parse("layer Base { Game.Footsteps { loudness = 1; }; }", "Hero", &mut host)
        .expect_err("unknown field");
    assert_eq!(err.code(), Some(ErrorCode::E102));
    assert_eq!((err.row(), err.col()), (0, 30));
}

#[test]
fn test_invalid_field_value() {
    let mut host = footstep_host();
    let err = parse(
        "layer Base { Game.Footsteps { surface = mud; }; }",
        "Hero",
        &mut host,
    )
    .expect_err("invalid enum");
    assert_eq!(err.code(), Some(ErrorCode::E103));
}

#[test]
fn test_error_positions() {
    let err = parse_err("layer Base {\n  state A {\n    speed ;\n  }\n}");
    assert_eq!(err.code(), Some(ErrorCode::E100));
    assert_eq!((err.row(), err.col()), (2, 10));

    let err = parse_err("state A { }");
    assert_eq!(err.code(), Some(ErrorCode::E100));
    assert_eq!((err.row(), err.col()), (0, 0));

    let err = parse_err("layer Base { state A { if ; } }");
    assert_eq!(err.code(), Some(ErrorCode::E100));
    assert_eq!(err.col(), 26);

    let err = parse_err("layer \"Base");
    assert_eq!(err.code(), Some(ErrorCode::E001));
}

#[test]
fn test_persisted_names_are_unique() {
    let mut host = TestHost::default();
    parse(
        "layer Base { state A { goto B; } state B { } state A { } }",
        "Hero",
        &mut host,
    )
    .expect("parse");
    assert_eq!(host.persisted[0], "Hero");
    assert!(host.persisted.contains(&"Base".to_string()));
    assert!(host.persisted.contains(&"Base/A".to_string()));
    assert!(host.persisted.contains(&"Base/A1".to_string()));
    assert!(host.persisted.contains(&"Base/A/Transition".to_string()));
}

#[test]
fn test_fatal_error_keeps_persisted_objects() {
    let mut host = TestHost::default();
    let result = parse("layer Base { state A { } state B { speed ; } }", "Hero", &mut host);
    assert!(result.is_err());
    assert!(host.persisted.contains(&"Base/A".to_string()));
    assert!(host.persisted.contains(&"Base/B".to_string()));
}
