//! CLI logic for the Animalab compiler.
//!
//! Reads a document, reports its warnings and writes it back in canonical
//! form with every node placed.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use log::{info, warn};

use animalab::{AnimalabError, Compiler};

use error_adapter::{DiagnosticAdapter, render};

/// Run the Animalab CLI application
///
/// The controller is named after the input file stem.
///
/// # Errors
///
/// Returns `AnimalabError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Fatal document errors
pub fn run(args: &Args) -> Result<(), AnimalabError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing document"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;
    let name = Path::new(&args.input)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let compiler = Compiler::new(app_config);
    let output = compiler.parse(&source, &name)?;
    for warning in &output.warnings {
        warn!("{}", render(&DiagnosticAdapter::new(warning, &source)));
    }

    if args.check {
        info!(warnings = output.warnings.len(); "Document checked");
        return Ok(());
    }

    let text = compiler.unparse(&output.controller);
    match &args.output {
        Some(path) => {
            fs::write(path, text)?;
            info!(output_file = path.as_str(); "Document written");
        }
        None => io::stdout().lock().write_all(text.as_bytes())?,
    }

    Ok(())
}
