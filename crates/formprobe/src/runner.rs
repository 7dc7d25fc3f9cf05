//! Scenario Runner
//!
//! Drives each scenario through a [`FormDriver`] and checks the detected
//! validation signal against the scenario's bucket:
//!
//! ```text
//! clear -> fill -> blur -> settle -> submit -> settle -> detect -> compare
//! ```
//!
//! Settle delays exist because the target site's own validation runs
//! asynchronously and gives no completion event.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::artifact::ScreenshotStore;
use crate::detector::{Detection, SignalDetector};
use crate::driver::FormDriver;
use crate::result::{FormprobeError, FormprobeResult};
use crate::scenario::{case_title, Expectation, Scenario, ScenarioSet, ScenarioTable};

/// Default delay after blur (ms)
pub const DEFAULT_BLUR_SETTLE_MS: u64 = 100;

/// Default delay after submit (ms)
pub const DEFAULT_SUBMIT_SETTLE_MS: u64 = 1500;

/// Default delay between typed chunks (ms)
pub const DEFAULT_TYPING_DELAY_MS: u64 = 40;

/// How scenario values reach the control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FillMode {
    /// Native fill through the driver
    Direct,
    /// Assign from script and dispatch `input`/`change`
    #[default]
    Script,
    /// Append in chunks with a pause between them
    Typed {
        /// Characters per chunk, `None` picks by value length
        #[serde(default)]
        chunk_size: Option<usize>,
        /// Pause after each chunk
        #[serde(default = "default_typing_delay")]
        delay_ms: u64,
    },
}

const fn default_typing_delay() -> u64 {
    DEFAULT_TYPING_DELAY_MS
}

/// Chunk size for typed input: 10 above 100 chars, 5 above 30, else 1
#[must_use]
pub const fn default_chunk_size(char_count: usize) -> usize {
    if char_count > 100 {
        10
    } else if char_count > 30 {
        5
    } else {
        1
    }
}

/// Split `text` into chunks of at most `chunk_size` characters
#[must_use]
pub fn typing_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let size = chunk_size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Failure handling across a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Stop on the first failing case
    StopOnFirst,
    /// Run every case and collect failures
    #[default]
    CollectAll,
}

/// Runner timing and behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Delay after blur
    pub blur_settle_ms: u64,
    /// Delay after submit
    pub submit_settle_ms: u64,
    /// Click submit before detecting
    pub submit: bool,
    /// Value injection mode
    pub fill_mode: FillMode,
    /// Failure handling
    pub failure_mode: FailureMode,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            blur_settle_ms: DEFAULT_BLUR_SETTLE_MS,
            submit_settle_ms: DEFAULT_SUBMIT_SETTLE_MS,
            submit: true,
            fill_mode: FillMode::default(),
            failure_mode: FailureMode::default(),
        }
    }
}

impl RunnerConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Config without settle delays
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            blur_settle_ms: 0,
            submit_settle_ms: 0,
            ..Self::default()
        }
    }

    /// Set the fill mode
    #[must_use]
    pub const fn with_fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    /// Enable or disable submitting
    #[must_use]
    pub const fn with_submit(mut self, submit: bool) -> Self {
        self.submit = submit;
        self
    }

    /// Set failure handling
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }
}

/// Case status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// Detected signal matched the expectation
    Passed,
    /// Signal mismatch or infrastructure failure
    Failed,
}

impl CaseStatus {
    /// Status as used in artifact names
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }

    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Logical field name
    pub field: String,
    /// Case title
    pub title: String,
    /// Expected bucket
    pub expectation: Expectation,
    /// Scenario under test
    pub scenario: Scenario,
    /// Detector result, absent when the case failed before detection
    pub detection: Option<Detection>,
    /// Case status
    pub status: CaseStatus,
    /// Infrastructure error message
    pub error: Option<String>,
    /// Elapsed time in milliseconds
    pub duration_ms: u64,
    /// Saved screenshot
    pub screenshot: Option<PathBuf>,
}

impl ScenarioOutcome {
    /// Error describing the failure, `None` for passing cases
    #[must_use]
    pub fn failure(&self) -> Option<FormprobeError> {
        if self.status.is_passed() {
            return None;
        }
        Some(self.error.as_ref().map_or_else(
            || FormprobeError::ExpectationViolated {
                field: self.field.clone(),
                label: self.scenario.label.clone(),
                value: self.scenario.value.clone(),
                expected_invalid: self.expectation.expects_signal(),
            },
            |message| FormprobeError::CaseError {
                title: self.title.clone(),
                message: message.clone(),
            },
        ))
    }
}

/// Ordered outcomes of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Outcomes in execution order
    pub outcomes: Vec<ScenarioOutcome>,
}

impl RunReport {
    /// Number of passing cases
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_passed()).count()
    }

    /// Number of failing cases
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Check if every case passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Failing outcomes
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioOutcome> + '_ {
        self.outcomes.iter().filter(|o| !o.status.is_passed())
    }

    /// Merge another report's outcomes
    pub fn extend(&mut self, other: Self) {
        self.outcomes.extend(other.outcomes);
    }

    /// `Ok` when every case passed, else the first failure
    pub fn into_result(self) -> FormprobeResult<()> {
        match self.failures().find_map(ScenarioOutcome::failure) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Executes scenarios against one driver
#[derive(Debug)]
pub struct ScenarioRunner<D: FormDriver> {
    driver: D,
    detector: SignalDetector,
    config: RunnerConfig,
    screenshots: Option<ScreenshotStore>,
}

impl<D: FormDriver> ScenarioRunner<D> {
    /// Create a runner
    pub fn new(driver: D, detector: SignalDetector, config: RunnerConfig) -> Self {
        Self {
            driver,
            detector,
            config,
            screenshots: None,
        }
    }

    /// Save a screenshot after every case
    #[must_use]
    pub fn with_screenshots(mut self, store: ScreenshotStore) -> Self {
        self.screenshots = Some(store);
        self
    }

    /// Underlying driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Underlying driver, mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Consume the runner and return the driver
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Runner configuration
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    async fn inject(&mut self, field: &str, value: &str) -> FormprobeResult<()> {
        self.driver.clear(field).await?;
        match self.config.fill_mode {
            FillMode::Direct => self.driver.fill(field, value).await,
            FillMode::Script => self.driver.set_value_by_script(field, value).await,
            FillMode::Typed {
                chunk_size,
                delay_ms,
            } => {
                let size = chunk_size.unwrap_or_else(|| default_chunk_size(value.chars().count()));
                for chunk in typing_chunks(value, size) {
                    self.driver.append_text(field, &chunk).await?;
                    settle(delay_ms).await;
                }
                Ok(())
            }
        }
    }

    /// Inject the value, trigger validation and detect the signal
    pub async fn probe(&mut self, field: &str, value: &str) -> FormprobeResult<Detection> {
        self.inject(field, value).await?;
        self.driver.blur(field).await?;
        settle(self.config.blur_settle_ms).await;
        if self.config.submit {
            self.driver.submit().await?;
            settle(self.config.submit_settle_ms).await;
        }
        let snapshot = self
            .driver
            .control_snapshot(field, self.detector.vocabulary())
            .await?;
        Ok(self.detector.detect_located(snapshot.as_ref()))
    }

    /// Run one scenario; infrastructure failures become failed outcomes
    pub async fn run_case(
        &mut self,
        field: &str,
        expectation: Expectation,
        scenario: &Scenario,
    ) -> ScenarioOutcome {
        let title = case_title(field, expectation, scenario);
        let started = Instant::now();
        let (detection, error) = match self.probe(field, &scenario.value).await {
            Ok(detection) => (Some(detection), None),
            Err(err) => (None, Some(err.to_string())),
        };
        let status = match &detection {
            Some(d) if d.invalid == expectation.expects_signal() => CaseStatus::Passed,
            _ => CaseStatus::Failed,
        };

        let mut outcome = ScenarioOutcome {
            field: field.to_string(),
            title,
            expectation,
            scenario: scenario.clone(),
            detection,
            status,
            error,
            duration_ms: started.elapsed().as_millis() as u64,
            screenshot: None,
        };

        if status.is_passed() {
            info!(case = %outcome.title, "passed");
        } else if let Some(err) = outcome.failure() {
            warn!(case = %outcome.title, error = %err, "failed");
        }

        outcome.screenshot = self.capture(status, &outcome.title).await;
        outcome
    }

    async fn capture(&self, status: CaseStatus, title: &str) -> Option<PathBuf> {
        let store = self.screenshots.as_ref()?;
        let result = match self.driver.screenshot().await {
            Ok(png) => store.save(status.as_str(), title, &png),
            Err(err) => Err(err),
        };
        match result {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(case = title, error = %err, "screenshot not saved");
                None
            }
        }
    }

    /// Run one scenario and turn a failure into an error
    pub async fn check_case(
        &mut self,
        field: &str,
        expectation: Expectation,
        scenario: &Scenario,
    ) -> FormprobeResult<()> {
        match self.run_case(field, expectation, scenario).await.failure() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Run every scenario of a field, valid bucket first
    pub async fn run_set(&mut self, field: &str, set: &ScenarioSet) -> RunReport {
        self.run_set_with(field, set, |_| {}).await
    }

    /// Like [`run_set`](Self::run_set), calling `on_outcome` after each case
    pub async fn run_set_with<F>(&mut self, field: &str, set: &ScenarioSet, mut on_outcome: F) -> RunReport
    where
        F: FnMut(&ScenarioOutcome),
    {
        let mut report = RunReport::default();
        for (expectation, scenario) in set.cases() {
            let outcome = self.run_case(field, expectation, scenario).await;
            on_outcome(&outcome);
            let stop = !outcome.status.is_passed()
                && self.config.failure_mode == FailureMode::StopOnFirst;
            report.outcomes.push(outcome);
            if stop {
                break;
            }
        }
        report
    }

    /// Run every field of a table in field-name order
    pub async fn run_table(&mut self, table: &ScenarioTable) -> RunReport {
        let mut report = RunReport::default();
        for field in table.fields() {
            if let Some(set) = table.get(field) {
                let part = self.run_set(field, set).await;
                let stop = !part.all_passed() && self.config.failure_mode == FailureMode::StopOnFirst;
                report.extend(part);
                if stop {
                    break;
                }
            }
        }
        report
    }
}
