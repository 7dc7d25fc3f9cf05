//! Probe configuration loaded from YAML.
//!
//! ```yaml
//! vocabulary:
//!   class_markers: [failed, is-invalid, invalid, error, has-error, wpcf7-not-valid]
//! runner:
//!   submit_settle_ms: 800
//!   fill_mode: { mode: typed, delay_ms: 20 }
//! page:
//!   submit_selector: ".dima-button"
//! screenshots: true
//! data:
//!   tests_root: tests
//! ```
//!
//! Every section is optional; missing keys keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::csv::DataPathResolver;
use crate::detector::{SignalDetector, SignalVocabulary};
use crate::driver::DriverConfig;
use crate::result::{FormprobeError, FormprobeResult};
use crate::runner::RunnerConfig;

/// Page-level settings passed to browser drivers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Run the browser headless
    pub headless: bool,
    /// Selector clicked to submit the form
    pub submit_selector: String,
    /// Milliseconds to wait for a control to become visible
    pub element_timeout_ms: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        let driver = DriverConfig::default();
        Self {
            headless: driver.headless,
            submit_selector: driver.submit_selector,
            element_timeout_ms: driver.element_timeout.as_millis() as u64,
        }
    }
}

/// Data file settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root for test data lookups, relative to the working directory
    pub tests_root: Option<PathBuf>,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Detector vocabulary
    pub vocabulary: SignalVocabulary,
    /// Runner timing and fill behavior
    pub runner: RunnerConfig,
    /// Browser page settings
    pub page: PageConfig,
    /// Save a screenshot after each case
    pub screenshots: bool,
    /// Data file lookup
    pub data: DataConfig,
}

impl ProbeConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from YAML text
    pub fn from_yaml_str(yaml: &str) -> FormprobeResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> FormprobeResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            FormprobeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> FormprobeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Set the vocabulary
    #[must_use]
    pub fn with_vocabulary(mut self, vocabulary: SignalVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Set runner config
    #[must_use]
    pub fn with_runner(mut self, runner: RunnerConfig) -> Self {
        self.runner = runner;
        self
    }

    /// Enable or disable screenshots
    #[must_use]
    pub const fn with_screenshots(mut self, enabled: bool) -> Self {
        self.screenshots = enabled;
        self
    }

    /// Set the test data root
    #[must_use]
    pub fn with_tests_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data.tests_root = Some(root.into());
        self
    }

    /// Detector built from the vocabulary
    #[must_use]
    pub fn detector(&self) -> SignalDetector {
        SignalDetector::new(self.vocabulary.clone())
    }

    /// Driver settings from the page section
    #[must_use]
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig::new()
            .headless(self.page.headless)
            .submit_selector(self.page.submit_selector.clone())
            .element_timeout(std::time::Duration::from_millis(self.page.element_timeout_ms))
    }

    /// Data resolver honoring `data.tests_root`
    pub fn resolver(&self) -> FormprobeResult<DataPathResolver> {
        let resolver = DataPathResolver::from_env()?;
        Ok(match &self.data.tests_root {
            Some(root) => {
                let root = resolver.cwd().join(root);
                resolver.with_tests_root(root)
            }
            None => resolver,
        })
    }
}
