//! Command-line argument definitions for the Animalab CLI.

use clap::Parser;

/// Command-line arguments for the Animalab compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input Animalab document
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Where to write the canonical document; standard output when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Only check the document; write nothing
    #[arg(long)]
    pub check: bool,
}
