//! Scenarios command handler

use std::path::Path;

use formprobe::{case_title, Expectation, GroupNames, ScenarioSet};
use serde::Serialize;

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::OutputFormat;
use crate::ScenariosArgs;

/// One generated case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseListing {
    /// Case title
    pub title: String,
    /// Expected bucket
    pub expectation: Expectation,
    /// Scenario label
    pub label: String,
    /// Expanded value
    pub value: String,
}

/// Cases in execution order
#[must_use]
pub fn list_cases(field: &str, set: &ScenarioSet) -> Vec<CaseListing> {
    set.cases()
        .map(|(expectation, scenario)| CaseListing {
            title: case_title(field, expectation, scenario),
            expectation,
            label: scenario.label.clone(),
            value: scenario.value.clone(),
        })
        .collect()
}

/// Render the cases of a field
pub fn render_scenarios(field: &str, set: &ScenarioSet, format: OutputFormat) -> CliResult<String> {
    let cases = list_cases(field, set);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&cases)?),
        OutputFormat::Text => {
            let mut out = format!(
                "{field}: {} valid, {} invalid\n",
                set.valid.len(),
                set.invalid.len()
            );
            for case in &cases {
                let chars = case.value.chars().count();
                out.push_str(&format!("  {} [{chars} chars]\n", case.title));
            }
            Ok(out)
        }
    }
}

fn field_name(args: &ScenariosArgs) -> String {
    args.field
        .clone()
        .or_else(|| args.prefix.clone())
        .or_else(|| {
            Path::new(&args.file)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "field".to_string())
}

/// Execute the scenarios command
pub fn execute_scenarios(config: &CliConfig, args: &ScenariosArgs) -> CliResult<()> {
    let resolver = config.load_probe_config()?.resolver()?;
    let rows = resolver.read_csv(&args.file)?;
    let set = ScenarioSet::from_rows(&rows, &GroupNames::for_prefix(args.prefix.as_deref()));
    print!("{}", render_scenarios(&field_name(args), &set, args.format)?);
    if args.format == OutputFormat::Json {
        println!();
    }
    Ok(())
}
