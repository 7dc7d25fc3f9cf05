//! Result and error types for formprobe.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for formprobe operations
pub type FormprobeResult<T> = Result<T, FormprobeError>;

/// Errors that can occur in formprobe
#[derive(Debug, Error)]
pub enum FormprobeError {
    /// Data file could not be located by any resolution strategy
    #[error("file not found: '{path}'. Tried: {}", format_tried(.tried))]
    ResourceNotFound {
        /// Path as requested by the caller
        path: String,
        /// Every candidate path that was checked, in order
        tried: Vec<PathBuf>,
    },

    /// A scenario's detected signal disagreed with its expected bucket
    #[error(
        "{field}: {} value '{value}' {} ({label})",
        bucket_name(.expected_invalid),
        violation_text(.expected_invalid)
    )]
    ExpectationViolated {
        /// Logical field name
        field: String,
        /// Scenario label
        label: String,
        /// Raw value injected into the control
        value: String,
        /// Whether the scenario expected a validation signal
        expected_invalid: bool,
    },

    /// A scenario could not be carried out
    #[error("Scenario '{title}' failed: {message}")]
    CaseError {
        /// Case title
        title: String,
        /// Underlying failure
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Script evaluation in the page failed
    #[error("Evaluation failed: {message}")]
    EvaluationError {
        /// Error message
        message: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    InputError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FormprobeError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error reports a failed scenario rather than infrastructure
    #[must_use]
    pub const fn is_expectation_violation(&self) -> bool {
        matches!(self, Self::ExpectationViolated { .. })
    }
}

fn bucket_name(expected_invalid: &bool) -> &'static str {
    if *expected_invalid {
        "invalid"
    } else {
        "valid"
    }
}

fn violation_text(expected_invalid: &bool) -> &'static str {
    if *expected_invalid {
        "does NOT trigger validation signal"
    } else {
        "triggers validation signal"
    }
}

fn format_tried(tried: &[PathBuf]) -> String {
    tried
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_not_found_lists_attempts() {
        let err = FormprobeError::ResourceNotFound {
            path: "data/names.csv".to_string(),
            tried: vec![PathBuf::from("/a/data/names.csv"), PathBuf::from("/b/names.csv")],
        };
        let msg = err.to_string();
        assert!(msg.contains("'data/names.csv'"));
        assert!(msg.contains("/a/data/names.csv, /b/names.csv"));
    }

    #[test]
    fn test_expectation_violation_valid_message() {
        let err = FormprobeError::ExpectationViolated {
            field: "nume".to_string(),
            label: "plain".to_string(),
            value: "Popescu".to_string(),
            expected_invalid: false,
        };
        assert_eq!(
            err.to_string(),
            "nume: valid value 'Popescu' triggers validation signal (plain)"
        );
        assert!(err.is_expectation_violation());
    }

    #[test]
    fn test_expectation_violation_invalid_message() {
        let err = FormprobeError::ExpectationViolated {
            field: "prenume".to_string(),
            label: "digits".to_string(),
            value: "Ana2".to_string(),
            expected_invalid: true,
        };
        assert!(err
            .to_string()
            .contains("invalid value 'Ana2' does NOT trigger validation signal"));
    }

    #[test]
    fn test_case_error_names_case() {
        let err = FormprobeError::CaseError {
            title: "telefon valid: \"0712345678\"".to_string(),
            message: "Operation timed out after 15000ms".to_string(),
        };
        assert!(err.to_string().starts_with("Scenario 'telefon valid"));
        assert!(err.to_string().ends_with("timed out after 15000ms"));
        assert!(!err.is_expectation_violation());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: FormprobeError = io_err.into();
        assert!(err.to_string().contains("I/O"));
        assert!(!err.is_expectation_violation());
    }
}
