//! Run command handler (live browser)

use std::fs;
use std::time::Instant;

use formprobe::{
    CdpFormDriver, DriverConfig, FailureMode, FormDriver, GroupNames, ProbeConfig, ScenarioOutcome,
    ScenarioRunner, ScenarioSet, ScreenshotStore,
};
use tracing::info;

use super::detect::strategy_name;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::RunArgs;

fn driver_config(probe: &ProbeConfig, args: &RunArgs) -> DriverConfig {
    let mut config = probe.driver_config();
    if args.headed {
        config = config.headless(false);
    }
    if args.no_sandbox {
        config = config.no_sandbox();
    }
    if let Some(ref chrome) = args.chrome {
        config = config.executable_path(chrome.clone());
    }
    config
}

/// Detector evidence for a case, shown with `-v`
fn evidence_line(outcome: &ScenarioOutcome) -> Option<String> {
    let detection = outcome.detection.as_ref()?;
    Some(match (detection.strategy, &detection.token) {
        (Some(strategy), Some(token)) => {
            format!("  signal: {}: {token}", strategy_name(strategy))
        }
        _ => "  signal: none".to_string(),
    })
}

/// Execute the run command
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CliError::test_execution(format!("Failed to create runtime: {e}"))
    })?;
    rt.block_on(run_async(config, args))
}

async fn run_async(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let mut probe = config.load_probe_config()?;
    if args.fail_fast {
        probe.runner.failure_mode = FailureMode::StopOnFirst;
    }

    let rows = probe.resolver()?.read_csv(&args.data)?;
    let set = ScenarioSet::from_rows(&rows, &GroupNames::for_prefix(args.prefix.as_deref()));
    if set.is_empty() {
        return Err(CliError::config(format!(
            "no scenarios in {} for prefix {:?}",
            args.data.display(),
            args.prefix
        )));
    }

    let driver_config = driver_config(&probe, args);
    let element_timeout = driver_config.element_timeout;
    let mut driver = CdpFormDriver::launch(driver_config).await?;
    driver.goto(&args.url).await?;
    driver.wait_for_visible(&args.field, element_timeout).await?;
    info!(url = %args.url, field = %args.field, cases = set.len(), "page ready");

    let mut runner = ScenarioRunner::new(driver, probe.detector(), probe.runner.clone());
    if args.screenshots || probe.screenshots {
        runner = runner.with_screenshots(ScreenshotStore::from_env(&args.field, args.project.clone())?);
    }

    let mut reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.header(&args.field);
    reporter.start_progress(set.len() as u64, &args.field);

    let verbose = config.verbosity.is_verbose();
    let started = Instant::now();
    let report = runner
        .run_set_with(&args.field, &set, |outcome| {
            reporter.set_message(&outcome.scenario.label);
            match outcome.failure() {
                None => reporter.success(&outcome.title),
                Some(err) => reporter.failure(&format!("{}: {err}", outcome.title)),
            }
            if verbose {
                if let Some(line) = evidence_line(outcome) {
                    reporter.info(&line);
                }
            }
            reporter.increment(1);
        })
        .await;
    reporter.finish();

    runner.into_driver().close().await?;

    if let Some(ref path) = args.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        reporter.info(&format!("report written to {}", path.display()));
    }

    reporter.summary(report.passed(), report.failed(), started.elapsed());

    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::test_execution(format!(
            "{} of {} cases failed",
            report.failed(),
            report.outcomes.len()
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use formprobe::{CaseStatus, Detection, DetectionStrategy, Expectation, Scenario};

    fn args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["run", "https://example.com/", "-f", "nume", "-d", "names.csv"];
        argv.extend_from_slice(extra);
        RunArgs::try_parse_from(argv).unwrap()
    }

    fn outcome(detection: Option<Detection>) -> ScenarioOutcome {
        ScenarioOutcome {
            field: "nume".to_string(),
            title: "nume invalid: digits".to_string(),
            expectation: Expectation::Invalid,
            scenario: Scenario::new("digits", "Pop3"),
            detection,
            status: CaseStatus::Passed,
            error: None,
            duration_ms: 3,
            screenshot: None,
        }
    }

    #[test]
    fn test_evidence_line_names_strategy() {
        let detection = Detection {
            invalid: true,
            strategy: Some(DetectionStrategy::ClassMarkers),
            token: Some("has-error".to_string()),
        };
        assert_eq!(
            evidence_line(&outcome(Some(detection))).as_deref(),
            Some("  signal: class_markers: has-error")
        );
        assert_eq!(
            evidence_line(&outcome(Some(Detection::clear()))).as_deref(),
            Some("  signal: none")
        );
        assert!(evidence_line(&outcome(None)).is_none());
    }

    #[test]
    fn test_driver_config_defaults_from_probe() {
        let config = driver_config(&ProbeConfig::default(), &args(&[]));
        assert!(config.headless);
        assert!(config.sandbox);
    }

    #[test]
    fn test_driver_config_flags_override() {
        let config = driver_config(
            &ProbeConfig::default(),
            &args(&["--headed", "--no-sandbox", "--chrome", "/usr/bin/chromium"]),
        );
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.executable_path.as_deref(), Some("/usr/bin/chromium"));
    }
}
