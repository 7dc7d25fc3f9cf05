//! Command handlers - kept out of main.rs for testability
//!
//! Each handler module contains:
//! - The execution logic for a CLI command
//! - Pure rendering helpers
//! - Tests for those helpers

pub mod config;
pub mod detect;
#[cfg(feature = "browser")]
pub mod run;
pub mod scenarios;
pub mod verify;

pub use config::{execute_config, render_config};
pub use detect::{detect_fields, execute_detect, render_detections, FieldDetection};
#[cfg(feature = "browser")]
pub use run::execute_run;
pub use scenarios::{execute_scenarios, list_cases, render_scenarios, CaseListing};
pub use verify::{execute_verify, render_preview};
