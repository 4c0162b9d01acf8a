//! Pair classification.
//!
//! Decision procedure for one [`MatchedPair`]:
//!
//! 1. only a source side: [`PairStatus::SourceOnly`]
//! 2. only a reference side: [`PairStatus::ReferenceOnly`]
//! 3. empty diff: [`PairStatus::Identical`]
//! 4. non-empty diff, scoring disabled or both sides in the same format:
//!    [`PairStatus::Different`]
//! 5. non-empty diff, scoring enabled, formats differ: scored, and
//!    [`PairStatus::SemanticallyEquivalent`] at or above the threshold,
//!    [`PairStatus::Different`] below it
//!
//! Cross-format pairs that end up `Different` also get conversion suggestions.

use concord_core::CanonicalPolicy;
use tracing::{debug, warn};

use crate::diff::{DiffEngine, DifferenceEntry};
use crate::matcher::MatchedPair;
use crate::options::MatchingOptions;
use crate::result::{ComparisonPair, PairStatus};
use crate::scorer::{comparable_leaves, SemanticScorer};
use crate::suggestions::conversion_suggestions;

/// Classifies matched pairs.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'o> {
    options: &'o MatchingOptions,
    engine: DiffEngine,
    scorer: SemanticScorer,
}

impl<'o> Classifier<'o> {
    /// Creates a classifier.
    #[must_use]
    pub const fn new(options: &'o MatchingOptions) -> Self {
        Self {
            options,
            engine: DiffEngine::new().with_case_sensitive(options.case_sensitive),
            scorer: SemanticScorer::new(),
        }
    }

    /// Classifies one pair.
    #[must_use]
    pub fn classify(&self, pair: MatchedPair<'_>) -> ComparisonPair {
        match pair {
            MatchedPair::SourceOnly(source) => ComparisonPair::source_only(source.clone()),
            MatchedPair::ReferenceOnly(reference) => {
                ComparisonPair::reference_only(reference.clone())
            }
            MatchedPair::Matched { source, reference } => self.classify_matched(source, reference),
        }
    }

    fn classify_matched(
        &self,
        source: &CanonicalPolicy,
        reference: &CanonicalPolicy,
    ) -> ComparisonPair {
        let mut differences = self.engine.diff_policies(source, reference);
        let cross_format = source.source_format != reference.source_format;

        let (status, similarity_score) = if differences.is_empty() {
            (PairStatus::Identical, None)
        } else if self.options.enable_semantic_comparison && cross_format {
            self.score_differences(source.label(), &mut differences, comparable_leaves(source))
        } else {
            (PairStatus::Different, None)
        };

        let conversion_suggestions = if status == PairStatus::Different && cross_format {
            conversion_suggestions(&differences)
        } else {
            Vec::new()
        };

        debug!(
            policy = %source.label(),
            status = %status,
            differences = differences.len(),
            "Classified pair"
        );

        ComparisonPair {
            source: Some(source.clone()),
            reference: Some(reference.clone()),
            status,
            differences: Some(differences),
            similarity_score,
            conversion_suggestions,
        }
    }

    /// Scores a non-empty difference list. A scoring failure appends a
    /// `<comparison>` entry and classifies the pair as different.
    fn score_differences(
        &self,
        policy: &str,
        differences: &mut Vec<DifferenceEntry>,
        total_leaves: usize,
    ) -> (PairStatus, Option<f64>) {
        match self.scorer.score(policy, differences, total_leaves) {
            Ok(score) if score >= self.options.similarity_threshold => {
                (PairStatus::SemanticallyEquivalent, Some(score))
            }
            Ok(score) => (PairStatus::Different, Some(score)),
            Err(e) => {
                warn!(policy = %policy, error = %e, "Pair could not be scored");
                differences.push(DifferenceEntry::comparison_failed(e.to_string()));
                (PairStatus::Different, None)
            }
        }
    }
}
