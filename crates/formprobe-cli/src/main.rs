//! formprobe CLI: data-driven form validation testing
//!
//! ## Usage
//!
//! ```bash
//! formprobe verify tests/data/numeprenume.csv       # Check CSV parsing
//! formprobe scenarios data.csv --prefix nume        # List generated cases
//! formprobe detect page.json --field nume           # Run the detector offline
//! formprobe run https://site/form -f nume -d data.csv --prefix nume
//! ```

use clap::Parser;
use formprobe_cli::{handlers, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match cli.command {
        Commands::Verify(args) => handlers::execute_verify(&config, &args),
        Commands::Scenarios(args) => handlers::execute_scenarios(&config, &args),
        Commands::Detect(args) => handlers::execute_detect(&config, &args),
        #[cfg(feature = "browser")]
        Commands::Run(args) => handlers::execute_run(&config, &args),
        #[cfg(not(feature = "browser"))]
        Commands::Run(_) => Err(formprobe_cli::CliError::FeatureDisabled { feature: "browser" }),
        Commands::Config => handlers::execute_config(&config),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_probe_config(cli.config.clone())
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.tracing_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
