//! FormDriver - Abstract Page Interaction Trait
//!
//! The scenario runner talks to the target page only through [`FormDriver`],
//! so the same scenarios run against a real browser (`browser` feature) or
//! against [`MockFormDriver`] in unit tests.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  FormDriver (Abstract Trait)                                   │
//! ├────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐        ┌─────────────────────┐        │
//! │  │  CdpFormDriver      │        │  MockFormDriver     │        │
//! │  │  (browser feature)  │        │  (unit tests)       │        │
//! │  │  chromiumoxide CDP  │        │  closure-simulated  │        │
//! │  │                     │        │  validation         │        │
//! │  └─────────────────────┘        └─────────────────────┘        │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::detector::{ControlSnapshot, SignalVocabulary};
use crate::result::{FormprobeError, FormprobeResult};

/// Browser configuration for drivers
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Timeout for navigation
    pub navigation_timeout: Duration,
    /// Timeout for controls to become visible
    pub element_timeout: Duration,
    /// Selector clicked to submit the form
    pub submit_selector: String,
    /// Executable path override
    pub executable_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            navigation_timeout: Duration::from_secs(30),
            element_timeout: Duration::from_secs(15),
            submit_selector: "form [type=\"submit\"]".to_string(),
            executable_path: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set the submit control selector
    #[must_use]
    pub fn submit_selector(mut self, selector: impl Into<String>) -> Self {
        self.submit_selector = selector.into();
        self
    }

    /// Set the control visibility timeout
    #[must_use]
    pub const fn element_timeout(mut self, timeout: Duration) -> Self {
        self.element_timeout = timeout;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Page interaction capability used by the scenario runner.
///
/// Controls are addressed by their logical field name (the `name`
/// attribute of an input, select or textarea).
#[async_trait]
pub trait FormDriver: Send + Sync {
    /// Navigate to URL
    async fn goto(&mut self, url: &str) -> FormprobeResult<()>;

    /// Wait until the control is visible
    async fn wait_for_visible(&self, field: &str, timeout: Duration) -> FormprobeResult<()>;

    /// Empty the control
    async fn clear(&mut self, field: &str) -> FormprobeResult<()>;

    /// Fill the control through native input
    async fn fill(&mut self, field: &str, value: &str) -> FormprobeResult<()>;

    /// Assign the value from script and dispatch `input` and `change`,
    /// bypassing client-side truncation or masking
    async fn set_value_by_script(&mut self, field: &str, value: &str) -> FormprobeResult<()>;

    /// Append text to the current value and dispatch `input` and `change`
    async fn append_text(&mut self, field: &str, text: &str) -> FormprobeResult<()>;

    /// Move focus away from the control
    async fn blur(&mut self, field: &str) -> FormprobeResult<()>;

    /// Submit the form
    async fn submit(&mut self) -> FormprobeResult<()>;

    /// Capture the control's validation-relevant state, `None` when absent
    async fn control_snapshot(
        &self,
        field: &str,
        vocabulary: &SignalVocabulary,
    ) -> FormprobeResult<Option<ControlSnapshot>>;

    /// Take a full-page PNG screenshot
    async fn screenshot(&self) -> FormprobeResult<Vec<u8>>;
}

/// Simulated validation rule: field name and current value to control state
pub type ValidationRule = Box<dyn Fn(&str, &str) -> ControlSnapshot + Send + Sync>;

/// Mock driver for unit testing.
///
/// Holds field values in memory and computes control state with a
/// [`ValidationRule`], standing in for the target site's client-side
/// validation.
pub struct MockFormDriver {
    /// Current URL
    pub current_url: String,
    /// Current field values
    pub values: BTreeMap<String, String>,
    /// Call history for verification
    pub call_history: Vec<String>,
    /// Fields reported as missing from the page
    pub missing: BTreeSet<String>,
    /// Mock screenshot bytes
    pub screenshot_data: Vec<u8>,
    /// Fail every submit with a page error
    pub fail_submit: bool,
    rule: ValidationRule,
}

impl fmt::Debug for MockFormDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockFormDriver")
            .field("current_url", &self.current_url)
            .field("values", &self.values)
            .field("call_history", &self.call_history)
            .field("missing", &self.missing)
            .finish_non_exhaustive()
    }
}

impl Default for MockFormDriver {
    fn default() -> Self {
        Self::new(|_, _| ControlSnapshot::new())
    }
}

impl MockFormDriver {
    /// Create a mock whose controls are rendered by `rule`
    pub fn new(rule: impl Fn(&str, &str) -> ControlSnapshot + Send + Sync + 'static) -> Self {
        Self {
            current_url: String::from("about:blank"),
            values: BTreeMap::new(),
            call_history: Vec::new(),
            missing: BTreeSet::new(),
            screenshot_data: vec![0x89, 0x50, 0x4E, 0x47],
            fail_submit: false,
            rule: Box::new(rule),
        }
    }

    /// Report a field as absent from the page
    #[must_use]
    pub fn with_missing_field(mut self, field: impl Into<String>) -> Self {
        let _ = self.missing.insert(field.into());
        self
    }

    /// Current value of a field
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    fn ensure_present(&self, field: &str) -> FormprobeResult<()> {
        if self.missing.contains(field) {
            return Err(FormprobeError::InputError {
                message: format!("no control named '{field}'"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FormDriver for MockFormDriver {
    async fn goto(&mut self, url: &str) -> FormprobeResult<()> {
        self.call_history.push(format!("goto:{url}"));
        self.current_url = url.to_string();
        Ok(())
    }

    async fn wait_for_visible(&self, field: &str, timeout: Duration) -> FormprobeResult<()> {
        if self.missing.contains(field) {
            return Err(FormprobeError::Timeout {
                ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn clear(&mut self, field: &str) -> FormprobeResult<()> {
        self.ensure_present(field)?;
        self.call_history.push(format!("clear:{field}"));
        let _ = self.values.insert(field.to_string(), String::new());
        Ok(())
    }

    async fn fill(&mut self, field: &str, value: &str) -> FormprobeResult<()> {
        self.ensure_present(field)?;
        self.call_history.push(format!("fill:{field}"));
        let _ = self.values.insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn set_value_by_script(&mut self, field: &str, value: &str) -> FormprobeResult<()> {
        self.ensure_present(field)?;
        self.call_history.push(format!("script:{field}"));
        let _ = self.values.insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn append_text(&mut self, field: &str, text: &str) -> FormprobeResult<()> {
        self.ensure_present(field)?;
        self.call_history.push(format!("append:{field}:{text}"));
        self.values.entry(field.to_string()).or_default().push_str(text);
        Ok(())
    }

    async fn blur(&mut self, field: &str) -> FormprobeResult<()> {
        self.call_history.push(format!("blur:{field}"));
        Ok(())
    }

    async fn submit(&mut self) -> FormprobeResult<()> {
        self.call_history.push("submit".to_string());
        if self.fail_submit {
            return Err(FormprobeError::PageError {
                message: "target closed".to_string(),
            });
        }
        Ok(())
    }

    async fn control_snapshot(
        &self,
        field: &str,
        _vocabulary: &SignalVocabulary,
    ) -> FormprobeResult<Option<ControlSnapshot>> {
        if self.missing.contains(field) {
            return Ok(None);
        }
        let value = self.values.get(field).map_or("", String::as_str);
        Ok(Some((self.rule)(field, value)))
    }

    async fn screenshot(&self) -> FormprobeResult<Vec<u8>> {
        Ok(self.screenshot_data.clone())
    }
}
