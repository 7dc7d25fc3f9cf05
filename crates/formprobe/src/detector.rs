//! Validation Signal Detector
//!
//! Decides whether a rendered form control is being displayed as failing
//! validation, without knowing the target site's conventions in advance.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  SignalDetector: ordered strategies, first match wins            │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  1. ExplicitMarker   aria-invalid == "true"        (authoritative)│
//! │  2. ClassMarkers     control + 2 ancestors classes (semantic)     │
//! │  3. StyleColors      outline / border / shadow     (visual)       │
//! │  ─────────────────────────────────────────────────────────────    │
//! │  no match  ->  false                                              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An explicit `aria-invalid="false"` does not force `false`; lower tiers
//! still run. Detection is a pure point-in-time read and never retries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::result::{FormprobeError, FormprobeResult};

/// Computed style properties inspected by [`DetectionStrategy::StyleColors`]
pub const DEFAULT_STYLE_PROPERTIES: [&str; 5] = [
    "outline-color",
    "border-color",
    "border-top-color",
    "box-shadow",
    "outline-style",
];

/// Class name fragments that mark a control as invalid
pub const DEFAULT_CLASS_MARKERS: [&str; 5] = ["failed", "is-invalid", "invalid", "error", "has-error"];

/// Style tokens recognized as "error red"
pub const DEFAULT_COLOR_TOKENS: [&str; 5] = ["255, 0, 0", "220, 53, 69", "rgb(255, 0, 0)", "#dc3545", "red"];

/// Read-only view of a rendered form control
pub trait ControlState {
    /// Attribute value, `None` when absent
    fn attribute(&self, name: &str) -> Option<String>;

    /// Class attribute of the control followed by up to `depth` ancestors,
    /// nearest first
    fn class_chain(&self, depth: usize) -> Vec<String>;

    /// Computed style property value
    fn computed_style(&self, property: &str) -> Option<String>;
}

/// Resolves logical field names against a live or recorded page
pub trait FormControlLocator {
    /// Control handle type
    type Control: ControlState;

    /// Find the control named `name`, `None` when it is not on the page
    fn locate(&self, name: &str) -> FormprobeResult<Option<Self::Control>>;
}

/// Detection vocabulary.
///
/// Target sites use different CSS frameworks, so every list here is data
/// and can be extended from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalVocabulary {
    /// Attribute whose value `"true"` marks the control invalid
    pub invalid_attribute: String,
    /// Class name fragments (matched case-insensitively as substrings)
    pub class_markers: Vec<String>,
    /// Style tokens (matched case-insensitively as substrings)
    pub color_tokens: Vec<String>,
    /// Computed style properties to inspect
    pub style_properties: Vec<String>,
    /// Number of ancestor levels whose classes are inspected
    pub ancestor_depth: usize,
}

impl Default for SignalVocabulary {
    fn default() -> Self {
        Self {
            invalid_attribute: "aria-invalid".to_string(),
            class_markers: DEFAULT_CLASS_MARKERS.iter().map(|s| (*s).to_string()).collect(),
            color_tokens: DEFAULT_COLOR_TOKENS.iter().map(|s| (*s).to_string()).collect(),
            style_properties: DEFAULT_STYLE_PROPERTIES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            ancestor_depth: 2,
        }
    }
}

impl SignalVocabulary {
    /// Create the default vocabulary
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class marker
    #[must_use]
    pub fn with_class_marker(mut self, marker: impl Into<String>) -> Self {
        self.class_markers.push(marker.into());
        self
    }

    /// Add a color token
    #[must_use]
    pub fn with_color_token(mut self, token: impl Into<String>) -> Self {
        self.color_tokens.push(token.into());
        self
    }

    /// Set the ancestor depth
    #[must_use]
    pub const fn with_ancestor_depth(mut self, depth: usize) -> Self {
        self.ancestor_depth = depth;
        self
    }

    /// Merge another vocabulary's markers and tokens into this one
    #[must_use]
    pub fn extended_with(mut self, other: &Self) -> Self {
        for marker in &other.class_markers {
            if !self.class_markers.contains(marker) {
                self.class_markers.push(marker.clone());
            }
        }
        for token in &other.color_tokens {
            if !self.color_tokens.contains(token) {
                self.color_tokens.push(token.clone());
            }
        }
        self
    }
}

/// One tier of the detection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// Invalid-state attribute set to `"true"`
    ExplicitMarker,
    /// Class fragment on the control or its ancestors
    ClassMarkers,
    /// Error color in computed outline, border or box-shadow
    StyleColors,
}

impl DetectionStrategy {
    /// Default evaluation order
    pub const ALL: [Self; 3] = [Self::ExplicitMarker, Self::ClassMarkers, Self::StyleColors];

    /// `Some(true)` when this tier matched, `None` when it has no opinion
    pub fn evaluate<C: ControlState + ?Sized>(
        self,
        control: &C,
        vocabulary: &SignalVocabulary,
    ) -> Option<bool> {
        self.matching_token(control, vocabulary).map(|_| true)
    }

    fn matching_token<C: ControlState + ?Sized>(
        self,
        control: &C,
        vocabulary: &SignalVocabulary,
    ) -> Option<String> {
        match self {
            Self::ExplicitMarker => control
                .attribute(&vocabulary.invalid_attribute)
                .filter(|value| value == "true")
                .map(|_| format!("{}=\"true\"", vocabulary.invalid_attribute)),
            Self::ClassMarkers => {
                let classes = control
                    .class_chain(vocabulary.ancestor_depth)
                    .join(" ")
                    .to_lowercase();
                find_token(&classes, &vocabulary.class_markers)
            }
            Self::StyleColors => {
                let hints = vocabulary
                    .style_properties
                    .iter()
                    .map(|property| control.computed_style(property).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join("|")
                    .to_lowercase();
                find_token(&hints, &vocabulary.color_tokens)
            }
        }
    }
}

fn find_token(haystack: &str, tokens: &[String]) -> Option<String> {
    tokens
        .iter()
        .find(|token| !token.is_empty() && haystack.contains(&token.to_lowercase()))
        .cloned()
}

/// Outcome of a detection with the evidence behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Whether a validation signal is present
    pub invalid: bool,
    /// Strategy that matched
    pub strategy: Option<DetectionStrategy>,
    /// Marker or token that matched
    pub token: Option<String>,
}

impl Detection {
    /// No signal found
    #[must_use]
    pub const fn clear() -> Self {
        Self {
            invalid: false,
            strategy: None,
            token: None,
        }
    }
}

/// Three-tier validation signal detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDetector {
    vocabulary: SignalVocabulary,
    strategies: Vec<DetectionStrategy>,
}

impl Default for SignalDetector {
    fn default() -> Self {
        Self::new(SignalVocabulary::default())
    }
}

impl SignalDetector {
    /// Create a detector with the default strategy order
    #[must_use]
    pub fn new(vocabulary: SignalVocabulary) -> Self {
        Self {
            vocabulary,
            strategies: DetectionStrategy::ALL.to_vec(),
        }
    }

    /// Replace the strategy order
    #[must_use]
    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = DetectionStrategy>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    /// Vocabulary in use
    #[must_use]
    pub const fn vocabulary(&self) -> &SignalVocabulary {
        &self.vocabulary
    }

    /// Strategies in evaluation order
    #[must_use]
    pub fn strategies(&self) -> &[DetectionStrategy] {
        &self.strategies
    }

    /// Run the strategies in order and report the first match
    pub fn detect<C: ControlState + ?Sized>(&self, control: &C) -> Detection {
        for strategy in &self.strategies {
            if let Some(token) = strategy.matching_token(control, &self.vocabulary) {
                debug!(?strategy, %token, "validation signal detected");
                return Detection {
                    invalid: true,
                    strategy: Some(*strategy),
                    token: Some(token),
                };
            }
        }
        Detection::clear()
    }

    /// Whether the control is displayed as failing validation
    pub fn is_marked_invalid<C: ControlState + ?Sized>(&self, control: &C) -> bool {
        self.detect(control).invalid
    }

    /// Detection for a control that may be absent; absence is never invalid
    pub fn detect_located<C: ControlState>(&self, control: Option<&C>) -> Detection {
        control.map_or_else(Detection::clear, |c| self.detect(c))
    }

    /// Look up `name` and check it; a missing control yields `Ok(false)`
    pub fn is_field_marked_invalid<L: FormControlLocator + ?Sized>(
        &self,
        locator: &L,
        name: &str,
    ) -> FormprobeResult<bool> {
        let control = locator.locate(name)?;
        if control.is_none() {
            debug!(field = name, "control not found, reporting no signal");
        }
        Ok(self.detect_located(control.as_ref()).invalid)
    }
}

/// Recorded state of a control, enough to run every detection tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSnapshot {
    /// Attribute values by name
    pub attributes: BTreeMap<String, String>,
    /// Class attribute of the control, then ancestors, nearest first
    pub class_chain: Vec<String>,
    /// Computed style values by CSS property name
    pub computed_style: BTreeMap<String, String>,
}

impl ControlSnapshot {
    /// Create an empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append the next class attribute in the chain (control first)
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class_chain.push(class.into());
        self
    }

    /// Set a computed style value
    #[must_use]
    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.computed_style.insert(property.into(), value.into());
        self
    }
}

impl ControlState for ControlSnapshot {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn class_chain(&self, depth: usize) -> Vec<String> {
        self.class_chain.iter().take(depth.saturating_add(1)).cloned().collect()
    }

    fn computed_style(&self, property: &str) -> Option<String> {
        self.computed_style.get(property).cloned()
    }
}

/// In-memory page of recorded controls keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticPage {
    controls: BTreeMap<String, ControlSnapshot>,
}

impl StaticPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a control
    #[must_use]
    pub fn with_control(mut self, name: impl Into<String>, snapshot: ControlSnapshot) -> Self {
        let _ = self.controls.insert(name.into(), snapshot);
        self
    }

    /// Parse a page from JSON (`{ "<field>": ControlSnapshot, ... }`)
    pub fn from_json(json: &str) -> FormprobeResult<Self> {
        serde_json::from_str(json).map_err(FormprobeError::from)
    }

    /// Field names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.controls.keys().map(String::as_str)
    }
}

impl FormControlLocator for StaticPage {
    type Control = ControlSnapshot;

    fn locate(&self, name: &str) -> FormprobeResult<Option<ControlSnapshot>> {
        Ok(self.controls.get(name).cloned())
    }
}
