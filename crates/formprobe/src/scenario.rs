//! Scenario grouping: CSV rows to `valid` / `invalid` buckets.
//!
//! Rows follow the layout `group,label,value` or `group,value`. Column 0 is
//! the group discriminator, either `valid`/`invalid` or, with a prefix,
//! `<prefix>_valid`/`<prefix>_invalid`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::csv::{CsvRow, DataPathResolver};
use crate::placeholder::expand_placeholders;
use crate::result::FormprobeResult;

/// A single input case for a form control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Human-readable identifier used in case titles
    pub label: String,
    /// Literal value injected into the control
    pub value: String,
}

impl Scenario {
    /// Create a scenario
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Expected validation outcome of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    /// The UI must not signal a validation failure
    Valid,
    /// The UI must signal a validation failure
    Invalid,
}

impl Expectation {
    /// Whether a validation signal is expected
    #[must_use]
    pub const fn expects_signal(self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Bucket name as it appears in case titles
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CSV row normalized to `group`, `label` and `value`.
///
/// `group` and `label` are trimmed; `value` keeps its whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    /// Group discriminator
    pub group: String,
    /// Row label
    pub label: String,
    /// Raw value, before placeholder expansion
    pub value: String,
}

impl DataRow {
    /// Normalize a parsed CSV row
    #[must_use]
    pub fn from_row(row: &[String]) -> Self {
        let group = row.first().map(|g| g.trim().to_string()).unwrap_or_default();
        let (label, value) = match row {
            [] => (String::new(), String::new()),
            [only] | [_, only] => (only.clone(), only.clone()),
            [_, label, value, ..] => (label.clone(), value.clone()),
        };
        Self {
            group,
            label: label.trim().to_string(),
            value,
        }
    }

    /// Convert to a scenario, expanding placeholders in the value
    ///
    /// An empty value stays empty rather than falling back to the label.
    #[must_use]
    pub fn to_scenario(&self) -> Scenario {
        let value = expand_placeholders(&self.value).into_owned();
        let label = if self.label.is_empty() {
            self.value.clone()
        } else {
            self.label.clone()
        };
        Scenario { label, value }
    }
}

/// Discriminator values selecting the valid and invalid buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNames {
    /// Discriminator of the valid bucket
    pub valid: String,
    /// Discriminator of the invalid bucket
    pub invalid: String,
}

impl Default for GroupNames {
    fn default() -> Self {
        Self {
            valid: "valid".to_string(),
            invalid: "invalid".to_string(),
        }
    }
}

impl GroupNames {
    /// Group names `<prefix>_valid` and `<prefix>_invalid`
    #[must_use]
    pub fn prefixed(prefix: &str) -> Self {
        Self {
            valid: format!("{prefix}_valid"),
            invalid: format!("{prefix}_invalid"),
        }
    }

    /// Plain names, or prefixed names when a prefix is given
    #[must_use]
    pub fn for_prefix(prefix: Option<&str>) -> Self {
        prefix.map_or_else(Self::default, Self::prefixed)
    }

    /// Bucket a discriminator belongs to, if any
    #[must_use]
    pub fn classify(&self, group: &str) -> Option<Expectation> {
        if group == self.valid {
            Some(Expectation::Valid)
        } else if group == self.invalid {
            Some(Expectation::Invalid)
        } else {
            None
        }
    }
}

/// Scenarios of one field, split by expected outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSet {
    /// Values the UI must accept
    pub valid: Vec<Scenario>,
    /// Values the UI must reject
    pub invalid: Vec<Scenario>,
}

impl ScenarioSet {
    /// Group rows into buckets, preserving input order.
    ///
    /// Rows whose discriminator matches neither bucket are ignored.
    #[must_use]
    pub fn from_rows(rows: &[CsvRow], groups: &GroupNames) -> Self {
        let mut set = Self::default();
        for row in rows {
            let data = DataRow::from_row(row);
            match groups.classify(&data.group) {
                Some(Expectation::Valid) => set.valid.push(data.to_scenario()),
                Some(Expectation::Invalid) => set.invalid.push(data.to_scenario()),
                None => {}
            }
        }
        debug!(
            valid = set.valid.len(),
            invalid = set.invalid.len(),
            group = %groups.valid,
            "loaded scenarios"
        );
        set
    }

    /// Total number of scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    /// Check if both buckets are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty() && self.invalid.is_empty()
    }

    /// Scenarios of one bucket
    #[must_use]
    pub fn bucket(&self, expectation: Expectation) -> &[Scenario] {
        match expectation {
            Expectation::Valid => &self.valid,
            Expectation::Invalid => &self.invalid,
        }
    }

    /// All scenarios, valid first, each paired with its expectation
    pub fn cases(&self) -> impl Iterator<Item = (Expectation, &Scenario)> + '_ {
        self.valid
            .iter()
            .map(|s| (Expectation::Valid, s))
            .chain(self.invalid.iter().map(|s| (Expectation::Invalid, s)))
    }
}

/// Group parsed rows into scenario buckets
#[must_use]
pub fn load_scenarios(rows: &[CsvRow], groups: &GroupNames) -> ScenarioSet {
    ScenarioSet::from_rows(rows, groups)
}

/// Resolve, parse and group a scenario data file
pub fn load_test_data(path: impl AsRef<Path>, prefix: Option<&str>) -> FormprobeResult<ScenarioSet> {
    let rows = crate::csv::read_csv(path)?;
    Ok(ScenarioSet::from_rows(&rows, &GroupNames::for_prefix(prefix)))
}

/// Title of a generated test case.
///
/// Valid cases show the value; invalid cases show the label and the value
/// JSON-encoded so whitespace-only values stay visible.
#[must_use]
pub fn case_title(field: &str, expectation: Expectation, scenario: &Scenario) -> String {
    match expectation {
        Expectation::Valid => format!("{field} valid: \"{}\"", scenario.value),
        Expectation::Invalid => {
            let encoded = serde_json::to_string(&scenario.value)
                .unwrap_or_else(|_| format!("{:?}", scenario.value));
            format!("{field} invalid: {} ({encoded})", scenario.label)
        }
    }
}

/// Immutable scenario sets keyed by field name.
///
/// Built once, then shared by value (cheap `Arc` clone) across runners.
#[derive(Debug, Clone, Default)]
pub struct ScenarioTable {
    fields: Arc<BTreeMap<String, ScenarioSet>>,
}

impl ScenarioTable {
    /// Start building a table
    #[must_use]
    pub fn builder() -> ScenarioTableBuilder {
        ScenarioTableBuilder::default()
    }

    /// Scenarios of a field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&ScenarioSet> {
        self.fields.get(field)
    }

    /// Field names in sorted order
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the table has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`ScenarioTable`]
#[derive(Debug, Default)]
pub struct ScenarioTableBuilder {
    fields: BTreeMap<String, ScenarioSet>,
}

impl ScenarioTableBuilder {
    /// Add a field's scenarios
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, set: ScenarioSet) -> Self {
        let _ = self.fields.insert(field.into(), set);
        self
    }

    /// Add one field per prefix from a single CSV (e.g. `nume_valid`, `prenume_valid`)
    #[must_use]
    pub fn with_prefixed_fields(mut self, rows: &[CsvRow], prefixes: &[&str]) -> Self {
        for prefix in prefixes {
            let set = ScenarioSet::from_rows(rows, &GroupNames::prefixed(prefix));
            let _ = self.fields.insert((*prefix).to_string(), set);
        }
        self
    }

    /// Load a field's scenarios from a data file
    pub fn load_field(
        mut self,
        resolver: &DataPathResolver,
        field: impl Into<String>,
        path: impl AsRef<Path>,
        prefix: Option<&str>,
    ) -> FormprobeResult<Self> {
        let rows = resolver.read_csv(path)?;
        let set = ScenarioSet::from_rows(&rows, &GroupNames::for_prefix(prefix));
        let _ = self.fields.insert(field.into(), set);
        Ok(self)
    }

    /// Freeze the table
    #[must_use]
    pub fn build(self) -> ScenarioTable {
        ScenarioTable {
            fields: Arc::new(self.fields),
        }
    }
}
