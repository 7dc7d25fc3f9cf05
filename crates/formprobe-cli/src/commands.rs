//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// formprobe: data-driven form validation testing for third-party web apps
#[derive(Parser, Debug)]
#[command(name = "formprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Probe configuration file (YAML)
    #[arg(long, global = true, env = "FORMPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse CSV data files and print their rows with long fields truncated
    Verify(VerifyArgs),

    /// List the scenarios a CSV data file expands to
    Scenarios(ScenariosArgs),

    /// Run the validation signal detector over recorded control snapshots
    Detect(DetectArgs),

    /// Run scenarios against a live page (requires the `browser` feature)
    Run(RunArgs),

    /// Show the effective probe configuration
    Config,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// CSV files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Maximum characters shown per field
    #[arg(short, long, default_value = "60")]
    pub width: usize,
}

/// Arguments for the scenarios command
#[derive(Parser, Debug)]
pub struct ScenariosArgs {
    /// CSV data file
    pub file: PathBuf,

    /// Group prefix (`nume` selects `nume_valid` / `nume_invalid` rows)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Field name used in case titles (defaults to the prefix or file stem)
    #[arg(long)]
    pub field: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Snapshot file: `{ "<field>": { attributes, class_chain, computed_style } }`
    pub snapshot: PathBuf,

    /// Fields to check (all recorded fields when omitted)
    #[arg(short, long)]
    pub field: Vec<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Page containing the form
    pub url: String,

    /// Control name attribute
    #[arg(short, long)]
    pub field: String,

    /// CSV data file
    #[arg(short, long)]
    pub data: PathBuf,

    /// Group prefix for the data file
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable the browser sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Chromium executable
    #[arg(long, env = "CHROME_PATH")]
    pub chrome: Option<String>,

    /// Save a screenshot after every case
    #[arg(long)]
    pub screenshots: bool,

    /// Project name used in screenshot file names
    #[arg(long, default_value = "chromium")]
    pub project: String,

    /// Stop at the first failing case
    #[arg(long)]
    pub fail_fast: bool,

    /// Write the JSON run report here
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
