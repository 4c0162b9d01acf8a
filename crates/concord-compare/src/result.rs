//! Comparison result model.
//!
//! A [`ComparisonReport`] is the immutable output of one run: every pair with
//! its status, the aggregate [`ComparisonSummary`], and the errors and
//! warnings collected along the way. It serializes with serde so renderers
//! outside this crate can consume it.

use std::fmt;

use concord_compiler::ReferenceWarning;
use concord_core::CanonicalPolicy;
use serde::Serialize;

use crate::diff::{DifferenceEntry, COMPARISON_FAILED_PATH};
use crate::options::MatchingOptions;

/// Classification of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStatus {
    /// No structural differences.
    Identical,
    /// Differences scored at or above the similarity threshold.
    SemanticallyEquivalent,
    /// Differences that matter.
    Different,
    /// Source policy without a reference counterpart.
    SourceOnly,
    /// Reference policy without a source counterpart.
    ReferenceOnly,
}

impl PairStatus {
    /// Returns the status name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Identical => "identical",
            Self::SemanticallyEquivalent => "semantically_equivalent",
            Self::Different => "different",
            Self::SourceOnly => "source_only",
            Self::ReferenceOnly => "reference_only",
        }
    }

    /// Returns true for statuses that need no action.
    #[must_use]
    pub const fn is_in_sync(&self) -> bool {
        matches!(self, Self::Identical | Self::SemanticallyEquivalent)
    }
}

impl fmt::Display for PairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPair {
    /// Source policy, absent for reference-only pairs.
    pub source: Option<CanonicalPolicy>,
    /// Reference policy, absent for source-only pairs.
    pub reference: Option<CanonicalPolicy>,
    /// Classification.
    pub status: PairStatus,
    /// Differences; `None` for unmatched pairs.
    pub differences: Option<Vec<DifferenceEntry>>,
    /// Similarity score, set only when semantic scoring ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    /// Hints for known cross-format mismatches.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conversion_suggestions: Vec<String>,
}

impl ComparisonPair {
    /// Creates a pair for an unmatched source policy.
    #[must_use]
    pub const fn source_only(source: CanonicalPolicy) -> Self {
        Self {
            source: Some(source),
            reference: None,
            status: PairStatus::SourceOnly,
            differences: None,
            similarity_score: None,
            conversion_suggestions: Vec::new(),
        }
    }

    /// Creates a pair for an unmatched reference policy.
    #[must_use]
    pub const fn reference_only(reference: CanonicalPolicy) -> Self {
        Self {
            source: None,
            reference: Some(reference),
            status: PairStatus::ReferenceOnly,
            differences: None,
            similarity_score: None,
            conversion_suggestions: Vec::new(),
        }
    }

    /// Returns the display name of whichever side is present, source first.
    #[must_use]
    pub fn name(&self) -> &str {
        self.source
            .as_ref()
            .or(self.reference.as_ref())
            .map_or("", |p| p.display_name.as_str())
    }

    /// Number of difference entries.
    #[must_use]
    pub fn difference_count(&self) -> usize {
        self.differences.as_ref().map_or(0, Vec::len)
    }

    /// Returns the failure message if this pair could not be compared.
    #[must_use]
    pub fn comparison_failure(&self) -> Option<&str> {
        self.differences
            .as_ref()?
            .iter()
            .find(|d| d.path == COMPARISON_FAILED_PATH)
            .and_then(|d| d.after.as_str())
    }
}

/// Per-status counts and totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonSummary {
    /// Pairs with no differences.
    pub identical: usize,
    /// Pairs scored as equivalent.
    pub semantically_equivalent: usize,
    /// Pairs with real differences.
    pub different: usize,
    /// Unmatched source policies.
    pub source_only: usize,
    /// Unmatched reference policies.
    pub reference_only: usize,
    /// Number of pairs; equals the sum of the status counts.
    pub total_pairs: usize,
    /// Source policies before matching.
    pub total_source_policies: usize,
    /// Reference policies before matching.
    pub total_reference_policies: usize,
    /// Difference entries over all pairs.
    pub total_differences: usize,
    /// Share of matched pairs that are in sync; 0 when nothing matched.
    pub match_rate: f64,
}

impl ComparisonSummary {
    /// Derives the summary from a pair list.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_pairs(
        pairs: &[ComparisonPair],
        total_source_policies: usize,
        total_reference_policies: usize,
    ) -> Self {
        let mut summary = Self {
            total_pairs: pairs.len(),
            total_source_policies,
            total_reference_policies,
            ..Self::default()
        };

        for pair in pairs {
            match pair.status {
                PairStatus::Identical => summary.identical += 1,
                PairStatus::SemanticallyEquivalent => summary.semantically_equivalent += 1,
                PairStatus::Different => summary.different += 1,
                PairStatus::SourceOnly => summary.source_only += 1,
                PairStatus::ReferenceOnly => summary.reference_only += 1,
            }
            summary.total_differences += pair.difference_count();
        }

        let matched = summary.matched();
        if matched > 0 {
            summary.match_rate =
                (summary.identical + summary.semantically_equivalent) as f64 / matched as f64;
        }
        summary
    }

    /// Number of pairs with both sides present.
    #[must_use]
    pub const fn matched(&self) -> usize {
        self.identical + self.semantically_equivalent + self.different
    }

    /// Returns true if every pair is in sync.
    #[must_use]
    pub const fn all_in_sync(&self) -> bool {
        self.different == 0 && self.source_only == 0 && self.reference_only == 0
    }
}

/// Category of a run-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorKind {
    /// Malformed configuration text.
    Parse,
    /// Unreadable file or unusable JSON.
    InvalidInput,
    /// A record skipped during normalization.
    Normalization,
    /// A matched pair that could not be compared.
    Comparison,
}

/// A failure isolated to one file, record or pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunError {
    /// File, record or policy the error belongs to.
    pub source: String,
    /// Error category.
    pub kind: RunErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl RunError {
    /// Creates a run error.
    #[must_use]
    pub fn new(source: impl Into<String>, kind: RunErrorKind, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Everything produced by one comparison run.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    /// Aggregate counts.
    pub summary: ComparisonSummary,
    /// Classified pairs: sources in input order, then unmatched references.
    pub pairs: Vec<ComparisonPair>,
    /// Isolated failures.
    pub errors: Vec<RunError>,
    /// Unresolved references from configuration sources.
    pub warnings: Vec<ReferenceWarning>,
    /// Options the run used.
    pub options: MatchingOptions,
}

impl ComparisonReport {
    /// Returns true if any pair needs attention.
    #[must_use]
    pub fn has_differences(&self) -> bool {
        self.pairs.iter().any(|p| !p.status.is_in_sync())
    }

    /// Pairs with the given status.
    pub fn pairs_with_status(&self, status: PairStatus) -> impl Iterator<Item = &ComparisonPair> {
        self.pairs.iter().filter(move |p| p.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_core::{SourceFormat, Value};

    fn matched(status: PairStatus, differences: usize) -> ComparisonPair {
        let policy = CanonicalPolicy::new("P", SourceFormat::Json);
        ComparisonPair {
            source: Some(policy.clone()),
            reference: Some(policy),
            status,
            differences: Some(vec![
                DifferenceEntry::new("State", Value::Null, Value::Null);
                differences
            ]),
            similarity_score: None,
            conversion_suggestions: Vec::new(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let pairs = vec![
            matched(PairStatus::Identical, 0),
            matched(PairStatus::SemanticallyEquivalent, 1),
            matched(PairStatus::Different, 2),
            ComparisonPair::source_only(CanonicalPolicy::new("S", SourceFormat::Configuration)),
            ComparisonPair::reference_only(CanonicalPolicy::new("R", SourceFormat::Json)),
        ];
        let summary = ComparisonSummary::from_pairs(&pairs, 4, 4);

        assert_eq!(summary.total_pairs, 5);
        assert_eq!(
            summary.identical
                + summary.semantically_equivalent
                + summary.different
                + summary.source_only
                + summary.reference_only,
            summary.total_pairs
        );
        assert_eq!(summary.total_differences, 3);
        assert!((summary.match_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!(!summary.all_in_sync());
    }

    #[test]
    fn test_empty_summary() {
        let summary = ComparisonSummary::from_pairs(&[], 0, 0);
        assert_eq!(summary, ComparisonSummary::default());
        assert!(summary.all_in_sync());
    }

    #[test]
    fn test_pair_accessors() {
        let pair = ComparisonPair::reference_only(CanonicalPolicy::new("Only here", SourceFormat::Json));
        assert_eq!(pair.name(), "Only here");
        assert_eq!(pair.difference_count(), 0);
        assert!(pair.comparison_failure().is_none());

        let mut failed = matched(PairStatus::Different, 0);
        failed.differences = Some(vec![DifferenceEntry::comparison_failed("boom")]);
        assert_eq!(failed.comparison_failure(), Some("boom"));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PairStatus::SemanticallyEquivalent).unwrap(),
            "\"semantically_equivalent\""
        );
    }
}
