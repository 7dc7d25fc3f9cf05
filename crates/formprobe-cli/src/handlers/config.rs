//! Config command handler

use formprobe::ProbeConfig;

use crate::config::CliConfig;
use crate::error::CliResult;

/// Effective configuration as YAML, with its source
pub fn render_config(config: &CliConfig, probe: &ProbeConfig) -> CliResult<String> {
    let source = config.probe_config.as_ref().map_or_else(
        || "# defaults (no --config given)".to_string(),
        |path| format!("# from {}", path.display()),
    );
    Ok(format!("{source}\n{}", probe.to_yaml()?))
}

/// Execute the config command
pub fn execute_config(config: &CliConfig) -> CliResult<()> {
    let probe = config.load_probe_config()?;
    print!("{}", render_config(config, &probe)?);
    Ok(())
}
