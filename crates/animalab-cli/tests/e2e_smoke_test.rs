use std::{fs, path::Path};

use tempfile::tempdir;

use animalab::AnimalabError;
use animalab_cli::{Args, run};

const VALID: &[(&str, &str)] = &[
    (
        "Locomotion.alab",
        r#"
        float speed;
        trigger jump;
        layer Base {
            default Idle;
            state Idle { if speed > 0.1 fade 0.25 goto Run; if jump goto Air; }
            state Run { speed speed; if speed < 0.1 goto Idle; }
            stateMachine Air {
                state Rise { wait 1 goto Fall; }
                state Fall { end; }
            }
        }
        "#,
    ),
    (
        "Broken links.alab",
        "layer Base { default Ghost; state A { goto Nowhere; } }",
    ),
    ("Empty.alab", ""),
];

const INVALID: &[(&str, &str)] = &[
    ("Unterminated.alab", "layer \"Base"),
    ("Stray.alab", "state A { }"),
    ("MissingSpeed.alab", "layer Base { state A { speed ; } }"),
];

fn args(input: &Path, output: Option<&Path>, config: Option<&Path>) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.map(|path| path.to_string_lossy().to_string()),
        config: config.map(|path| path.to_string_lossy().to_string()),
        log_level: "off".to_string(),
        check: false,
    }
}

#[test]
fn e2e_smoke_test_valid_documents() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let mut failed = Vec::new();
    for (file, source) in VALID {
        let input = temp_dir.path().join(file);
        fs::write(&input, source).expect("write document");
        let output = temp_dir.path().join(format!("{file}.out"));

        if let Err(e) = run(&args(&input, Some(&output), None)) {
            failed.push((*file, e));
            continue;
        }

        // The canonical text compiles to itself.
        let first = fs::read_to_string(&output).expect("read output");
        let again = temp_dir.path().join(format!("{file}.again"));
        run(&args(&output, Some(&again), None)).expect("canonical text parses");
        assert_eq!(fs::read_to_string(&again).expect("read output"), first);
    }

    if !failed.is_empty() {
        for (file, err) in &failed {
            eprintln!("  - {file}: {err}");
        }
        panic!("{} valid document(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_invalid_documents() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    for (file, source) in INVALID {
        let input = temp_dir.path().join(file);
        fs::write(&input, source).expect("write document");
        let output = temp_dir.path().join(format!("{file}.out"));

        match run(&args(&input, Some(&output), None)) {
            Err(AnimalabError::Parse { .. }) => {}
            other => panic!("{file}: expected a parse error, got {other:?}"),
        }
        assert!(!output.exists(), "{file}: output written for a failed parse");
    }
}

#[test]
fn e2e_check_writes_nothing() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("Hero.alab");
    fs::write(&input, VALID[0].1).expect("write document");
    let output = temp_dir.path().join("Hero.out");

    let mut check = args(&input, Some(&output), None);
    check.check = true;
    run(&check).expect("check succeeds");
    assert!(!output.exists());
}

#[test]
fn e2e_config_behaviour_types() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config = temp_dir.path().join("config.toml");
    fs::write(
        &config,
        r#"
        [[behaviours]]
        name = "Game.Footsteps"
        fields = [
            { name = "volume", kind = "float" },
            { name = "surface", kind = { enum = ["grass", "stone"] } },
        ]
        "#,
    )
    .expect("write config");

    let input = temp_dir.path().join("Hero.alab");
    fs::write(
        &input,
        "layer Base { state Walk { Game.Footsteps { surface = stone; }; } }",
    )
    .expect("write document");
    let output = temp_dir.path().join("Hero.out");

    assert!(matches!(
        run(&args(&input, Some(&output), None)),
        Err(AnimalabError::Parse { .. })
    ));

    run(&args(&input, Some(&output), Some(&config))).expect("known behaviour type");
    let text = fs::read_to_string(&output).expect("read output");
    assert!(text.contains("    Game.Footsteps {\n      volume = 0;\n      surface = stone;\n    };\n"));
}

#[test]
fn e2e_missing_input_is_io_error() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("absent.alab");
    assert!(matches!(
        run(&args(&input, None, None)),
        Err(AnimalabError::Io(_))
    ));
}
