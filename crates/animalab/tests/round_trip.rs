use float_cmp::approx_eq;

use animalab::{
    Compiler, Controller, MemoryHost, ParseOutput,
    behaviour::{FieldDescriptor, FieldKind, Value},
    config::{AppConfig, BehaviourType, LayoutConfig},
    controller::{Layer, NodeRef, Placed, State, StateMachine},
    layout_state_machine,
    motion::Motion,
};

const LOCOMOTION: &str = r#"float speed = 0.5;
float dirX = 0;
float dirY = 0;
bool grounded = true;
trigger jump;

layer Base {
  default Idle;

  state Idle {
    clip "Clips/idle.anim";
    Game.Footsteps {
      volume = 0.25;
      surface = stone;
      tags = [
        "soft";
      ];
    };
    if(speed > 0.1) fade(0.2) goto Move;
    if(jump) goto Air/Rise;
  }

  state Move {
    speed 1.5;
    blendtree "Move" freeformDirectional2D(dirX, dirY) {
      (0, 1): clip "Clips/forward.anim";
      (0, -1): clip "Clips/back.anim" * 0.8;
      (1, 0): blendtree "Strafe" simple1D(speed) {
        0: clip "Clips/walk_right.anim";
        1: clip "Clips/run_right.anim" mirror;
      };
    };
    if(speed < 0.1) goto Idle;
  }

  stateMachine Air {
    default Rise;

    state Rise {
      clip "Clips/rise.anim";
      wait(1) goto Fall;
    }

    state Fall {
      clip "Clips/fall.anim";
      if(grounded) end;
    }
  }
}

layer Upper {
  weight 0.75;
  additive;

  state Wave {
    mirror;
    clip "Clips/wave.anim";
  }
}
"#;

fn compiler() -> Compiler {
    let footsteps = BehaviourType::new(
        "Game.Footsteps",
        vec![
            FieldDescriptor::new("volume", FieldKind::Float),
            FieldDescriptor::new(
                "surface",
                FieldKind::Enum(vec!["grass".into(), "stone".into()]),
            ),
            FieldDescriptor::new("tags", FieldKind::Array(Box::new(FieldKind::String))),
        ],
    );
    Compiler::new(AppConfig::new(
        LayoutConfig::default(),
        Default::default(),
        vec![footsteps],
    ))
}

fn compile(compiler: &Compiler, source: &str) -> ParseOutput {
    compiler
        .parse(source, "Hero")
        .unwrap_or_else(|err| panic!("parse failed: {err}"))
}

#[test]
fn test_document_round_trips() {
    let compiler = compiler();
    let first = compile(&compiler, LOCOMOTION);
    assert!(first.warnings.is_empty(), "{:?}", first.warnings);

    let text = compiler.unparse(&first.controller);
    let second = compile(&compiler, &text);
    assert_eq!(first.controller, second.controller);
    assert_eq!(compiler.unparse(&second.controller), text);
}

#[test]
fn test_canonical_text_is_stable() {
    let compiler = compiler();
    let loose = r#"
        float speed=0.5; float dirX; float dirY;
        bool grounded = true; trigger jump;
        layer Base {
            default Idle;
            state Idle {
                clip "Clips/idle.anim";
                Game.Footsteps { volume = 0.25; surface = Stone; tags = ["soft";]; };
                if speed > 0.1 fade 0.2 goto Move;
                if jump goto Air/Rise;
            }
            state Move {
                speed 1.5;
                blendtree "Move" freeformDirectional2D(dirX, dirY) {
                    (0, 1): clip "Clips/forward.anim";
                    (0, -1): clip "Clips/back.anim" * 0.8;
                    (1, 0): blendtree "Strafe" simple1D(speed) {
                        0: clip "Clips/walk_right.anim";
                        1: clip "Clips/run_right.anim" mirror;
                    };
                }
                if speed < 0.1 goto Idle;
            }
            stateMachine Air {
                default Rise;
                state Rise { clip "Clips/rise.anim"; wait 1 goto Fall; }
                state Fall { clip "Clips/fall.anim"; if grounded end; }
            }
        }
        layer Upper { weight 0.75; additive; state Wave { clip "Clips/wave.anim" mirror; } }
    "#;
    let output = compile(&compiler, loose);
    assert_eq!(compiler.unparse(&output.controller), LOCOMOTION);
}

#[test]
fn test_blend_tree_children() {
    let compiler = compiler();
    let output = compile(&compiler, LOCOMOTION);
    let controller = &output.controller;

    let root = controller.state_machine(controller.layers()[0].state_machine);
    let moving = controller.state(root.states[1].node);
    let tree = moving
        .motion
        .and_then(|id| controller.motion(id).as_blend_tree())
        .expect("Move has a blend tree");
    assert_eq!(tree.children.len(), 3);
    assert_eq!(tree.parameter, "dirX");
    assert_eq!(tree.parameter_y, "dirY");
    assert!(approx_eq!(f32, tree.children[1].time_scale, 0.8, ulps = 2));

    let strafe = tree.children[2]
        .motion
        .and_then(|id| controller.motion(id).as_blend_tree())
        .expect("nested blend tree");
    assert!(strafe.children[1].mirror);
    match strafe.children[0].motion.map(|id| controller.motion(id)) {
        Some(Motion::Clip(clip)) => assert_eq!(clip.reference(), "Clips/walk_right.anim"),
        other => panic!("expected a clip, got {other:?}"),
    }
}

#[test]
fn test_behaviour_fields_survive() {
    let compiler = compiler();
    let output = compile(&compiler, LOCOMOTION);
    let text = compiler.unparse(&output.controller);
    let again = compile(&compiler, &text);

    let controller = &again.controller;
    let root = controller.state_machine(controller.layers()[0].state_machine);
    let idle = controller.state(root.states[0].node);
    let record = controller.behaviour(idle.behaviours[0]);
    assert_eq!(record.fields.get("surface"), Some(&Value::Enum(1)));
    assert_eq!(
        record.fields.get("tags"),
        Some(&Value::Array(vec![Value::String("soft".into())]))
    );
}

#[test]
fn test_or_conditions_are_grouped() {
    let compiler = Compiler::default();
    let output = compile(
        &compiler,
        "float x; float y; layer Base { state A { if x > 0 goto B; if y > 0 goto B; } state B { } }",
    );
    let text = compiler.unparse(&output.controller);
    assert!(text.contains("    if(x > 0 || y > 0) goto B;\n"), "{text}");

    let regrouped = compile(
        &compiler,
        "float x; float y; layer Base { state A { if(x > 0 || y > 0) goto B; } state B { } }",
    );
    let root = regrouped
        .controller
        .state_machine(regrouped.controller.layers()[0].state_machine);
    assert_eq!(
        regrouped.controller.state(root.states[0].node).transitions.len(),
        2
    );
    assert_eq!(compiler.unparse(&regrouped.controller), text);
}

#[test]
fn test_link_failures_keep_the_rest() {
    let compiler = Compiler::default();
    let output = compile(
        &compiler,
        "layer Base { default Ghost; state A { goto Nowhere; goto B; } state B { } }",
    );
    assert_eq!(output.warnings.len(), 2);

    let text = compiler.unparse(&output.controller);
    assert!(!text.contains("Nowhere"));
    assert!(!text.contains("default"));
    assert!(text.contains("goto B;"));
}

#[test]
fn test_escaped_names_round_trip() {
    let mut controller = Controller::new("Hero");
    let root = controller.add_state_machine(StateMachine::new("Base"));
    for name in ["Say \"hi\"", "two\nlines", "tab\there", "it's", "state"] {
        let state = controller.add_state(State::new(name));
        controller.state_machine_mut(root).states.push(Placed::new(state));
    }
    controller.add_layer(Layer::new("Base", root));

    let compiler = Compiler::default();
    let text = compiler.unparse(&controller);
    let mut host = MemoryHost::default();
    let output = compiler
        .parse_with_host(&text, "Hero", &mut host)
        .unwrap_or_else(|err| panic!("parse failed: {err}\n{text}"));

    let parsed = &output.controller;
    let names: Vec<&str> = parsed
        .state_machine(parsed.layers()[0].state_machine)
        .states
        .iter()
        .map(|placed| parsed.state(placed.node).name.as_str())
        .collect();
    assert_eq!(names, ["Say \"hi\"", "two\nlines", "tab\there", "it's", "state"]);
}

#[test]
fn test_parse_places_every_node() {
    let compiler = compiler();
    let output = compile(&compiler, LOCOMOTION);
    let controller = &output.controller;
    for (_, machine) in controller.state_machines() {
        assert!(!machine.has_unplaced_nodes(), "{} is unplaced", machine.name);
    }

    let states = controller
        .node_paths()
        .into_keys()
        .filter(|node| matches!(node, NodeRef::State(_)))
        .count();
    assert_eq!(states, 5);
}

#[test]
fn test_relayout_spreads_a_chain() {
    let compiler = Compiler::default();
    let mut host = MemoryHost::default();
    let mut controller = compiler
        .parse_with_host(
            "layer Base { state A { goto B; } state B { goto C; } state C { } }",
            "Hero",
            &mut host,
        )
        .expect("parse")
        .controller;
    let mut copy = controller.clone();

    let id = controller.layers()[0].state_machine;
    let config = LayoutConfig::default().with_iterations(20);
    let report = layout_state_machine(&mut controller, id, &config);
    assert!(report.iterations() <= 20);
    layout_state_machine(&mut copy, id, &config);
    assert_eq!(controller, copy);

    let positions: Vec<_> = controller
        .state_machine(id)
        .states
        .iter()
        .filter_map(|placed| placed.position)
        .collect();
    assert_eq!(positions.len(), 3);
    assert_ne!(positions[0], positions[1]);
    assert_ne!(positions[1], positions[2]);
}
