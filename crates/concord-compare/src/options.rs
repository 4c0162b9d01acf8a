//! Matching and classification options.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CompareError, Result};

/// Default similarity score required for semantic equivalence.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// How source and reference policies are paired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingStrategy {
    /// Exact policy id match.
    ById,
    /// Display name match.
    #[default]
    ByName,
    /// Explicit source-to-reference identifier map.
    CustomMapping,
    /// Display name match, then best similarity score above the threshold.
    SemanticSimilarity,
}

impl MatchingStrategy {
    /// Returns the strategy name as written in option files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ById => "by_id",
            Self::ByName => "by_name",
            Self::CustomMapping => "custom_mapping",
            Self::SemanticSimilarity => "semantic_similarity",
        }
    }
}

impl fmt::Display for MatchingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchingStrategy {
    type Err = CompareError;

    /// Accepts `by_id`, `by-id`, `ById` and the short forms `id`, `name`,
    /// `mapping`, `semantic`.
    fn from_str(s: &str) -> Result<Self> {
        let folded: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "byid" | "id" => Ok(Self::ById),
            "byname" | "name" => Ok(Self::ByName),
            "custommapping" | "mapping" => Ok(Self::CustomMapping),
            "semanticsimilarity" | "semantic" => Ok(Self::SemanticSimilarity),
            _ => Err(CompareError::invalid_options(format!(
                "unknown matching strategy '{s}'"
            ))),
        }
    }
}

/// Options consumed by the matcher and classifier.
///
/// Every field has a default, so option files may set any subset:
///
/// ```yaml
/// strategy: custom_mapping
/// case_sensitive: false
/// custom_mappings:
///   7d2f0c1e-aaaa-bbbb-cccc-000000000001: Require MFA for admins
/// similarity_threshold: 0.9
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingOptions {
    /// Pairing strategy.
    pub strategy: MatchingStrategy,
    /// Whether identifier and display name comparison is case-sensitive.
    pub case_sensitive: bool,
    /// Source id (or display name) to reference id or display name.
    pub custom_mappings: BTreeMap<String, String>,
    /// Whether cross-format pairs with differences are scored.
    pub enable_semantic_comparison: bool,
    /// Minimum score for semantic equivalence, in `[0, 1]`.
    pub similarity_threshold: f64,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            strategy: MatchingStrategy::default(),
            case_sensitive: false,
            custom_mappings: BTreeMap::new(),
            enable_semantic_comparison: true,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl MatchingOptions {
    /// Creates options with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the matching strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: MatchingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets case sensitivity.
    #[must_use]
    pub const fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Adds a custom mapping entry.
    #[must_use]
    pub fn with_mapping(mut self, source: impl Into<String>, reference: impl Into<String>) -> Self {
        self.custom_mappings.insert(source.into(), reference.into());
        self
    }

    /// Enables or disables semantic scoring.
    #[must_use]
    pub const fn with_semantic_comparison(mut self, enabled: bool) -> Self {
        self.enable_semantic_comparison = enabled;
        self
    }

    /// Sets the similarity threshold.
    #[must_use]
    pub const fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Checks the options for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InvalidOptions`] if the threshold is outside
    /// `[0, 1]` or the custom-mapping strategy has no mappings.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(CompareError::invalid_options(format!(
                "similarity threshold {} is outside [0, 1]",
                self.similarity_threshold
            )));
        }
        if self.strategy == MatchingStrategy::CustomMapping && self.custom_mappings.is_empty() {
            return Err(CompareError::invalid_options(
                "custom_mapping strategy requires at least one mapping",
            ));
        }
        Ok(())
    }

    /// Compares two identifiers according to the case flag.
    #[must_use]
    pub fn keys_equal(&self, a: &str, b: &str) -> bool {
        if self.case_sensitive {
            a == b
        } else {
            a.to_lowercase() == b.to_lowercase()
        }
    }

    /// Folds an identifier for use as a lookup key.
    #[must_use]
    pub fn fold_key(&self, key: &str) -> String {
        if self.case_sensitive {
            key.to_string()
        } else {
            key.to_lowercase()
        }
    }
}
