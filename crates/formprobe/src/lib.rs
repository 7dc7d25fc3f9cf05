//! formprobe: Data-Driven Form Validation Testing
//!
//! Drives CSV-defined input scenarios into the forms of third-party web
//! applications and checks that each value is flagged (or not) by the
//! site's own client-side validation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    FORMPROBE Architecture                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ CSV data   │    │ Scenario   │    │ FormDriver │            │
//! │   │ + ${A256}  │───►│ Runner     │───►│ (CDP/mock) │            │
//! │   │ expansion  │    │            │    │            │            │
//! │   └────────────┘    └─────┬──────┘    └─────┬──────┘            │
//! │                           │   snapshot      │                   │
//! │                     ┌─────▼──────┐          │                   │
//! │                     │ Signal     │◄─────────┘                   │
//! │                     │ Detector   │                              │
//! │                     └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use formprobe::{parse_rows, GroupNames, ScenarioSet};
//!
//! let rows = parse_rows("valid,Popescu\ninvalid,digits,Pop3\n# note\n");
//! let set = ScenarioSet::from_rows(&rows, &GroupNames::default());
//! assert_eq!(set.valid[0].value, "Popescu");
//! assert_eq!(set.invalid[0].label, "digits");
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod artifact;
#[cfg(feature = "browser")]
mod browser;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod config;
mod csv;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod detector;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod driver;
mod placeholder;
mod result;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod runner;
mod scenario;

pub use artifact::{resolve_base_dir, sanitize_title, ScreenshotStore, SCREENSHOT_DIR_ENV};
#[cfg(feature = "browser")]
pub use browser::CdpFormDriver;
pub use config::{DataConfig, PageConfig, ProbeConfig};
pub use csv::{
    parse_rows, preview_rows, read_csv, CsvRow, DataPathResolver, DEFAULT_PREVIEW_WIDTH,
    TESTS_DIR_ENV,
};
pub use detector::{
    ControlSnapshot, ControlState, Detection, DetectionStrategy, FormControlLocator,
    SignalDetector, SignalVocabulary, StaticPage, DEFAULT_CLASS_MARKERS, DEFAULT_COLOR_TOKENS,
    DEFAULT_STYLE_PROPERTIES,
};
pub use driver::{DriverConfig, FormDriver, MockFormDriver, ValidationRule};
pub use placeholder::{
    expand_placeholders, expand_placeholders_within, has_placeholder, MAX_PLACEHOLDER_LEN,
};
pub use result::{FormprobeError, FormprobeResult};
pub use runner::{
    default_chunk_size, typing_chunks, CaseStatus, FailureMode, FillMode, RunReport,
    RunnerConfig, ScenarioOutcome, ScenarioRunner, DEFAULT_BLUR_SETTLE_MS,
    DEFAULT_SUBMIT_SETTLE_MS, DEFAULT_TYPING_DELAY_MS,
};
pub use scenario::{
    case_title, load_scenarios, load_test_data, DataRow, Expectation, GroupNames, Scenario,
    ScenarioSet, ScenarioTable, ScenarioTableBuilder,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        load_test_data, Expectation, FormDriver, FormprobeError, FormprobeResult, ProbeConfig,
        RunReport, RunnerConfig, Scenario, ScenarioRunner, ScenarioSet, ScenarioTable,
        SignalDetector, SignalVocabulary,
    };
}
