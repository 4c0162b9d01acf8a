//! Similarity scoring for matched policies.
//!
//! The score is `1 - weighted / total`, where `total` is the number of
//! comparable leaves in the policy projection and `weighted` is the sum of
//! the weights of the differing paths. A difference in a critical field
//! drives the score to zero. The policy state, the granted built-in controls
//! and the user and application targeting are critical: policies that
//! disagree on whom they apply to or what they enforce are never equivalent.

use concord_core::{CanonicalPolicy, Value};

use crate::diff::{DiffEngine, DifferenceEntry};
use crate::error::{CompareError, Result};

/// Paths whose difference makes two policies non-equivalent.
/// A prefix entry applies to every path below it.
const CRITICAL_PATHS: &[&str] = &[
    "State",
    "GrantControls.BuiltInControls",
    "Conditions.Users",
    "Conditions.Applications",
];

/// Weights for paths that matter more or less than an ordinary field.
const PATH_WEIGHTS: &[(&str, f64)] = &[
    ("Conditions.Locations", 2.0),
    ("GrantControls.TermsOfUse", 2.0),
    ("DisplayName", 0.5),
    ("GrantControls.Operator", 0.5),
];

const DEFAULT_WEIGHT: f64 = 1.0;

/// Computes similarity scores from difference lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticScorer;

impl SemanticScorer {
    /// Creates a scorer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Scores a difference list against the number of compared leaves.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Comparison`] if there were no leaves to compare.
    #[allow(clippy::cast_precision_loss)]
    pub fn score(
        &self,
        policy: &str,
        differences: &[DifferenceEntry],
        total_leaves: usize,
    ) -> Result<f64> {
        if total_leaves == 0 {
            return Err(CompareError::Comparison {
                policy: policy.to_string(),
                message: "no comparable fields".to_string(),
            });
        }

        if differences.iter().any(|d| is_critical(&d.path)) {
            return Ok(0.0);
        }

        let weighted: f64 = differences.iter().map(|d| weight(&d.path)).sum();
        Ok((1.0 - weighted / total_leaves as f64).max(0.0))
    }

    /// Diffs and scores two policies.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Comparison`] if the policies have no comparable fields.
    pub fn score_policies(
        &self,
        engine: &DiffEngine,
        source: &CanonicalPolicy,
        reference: &CanonicalPolicy,
    ) -> Result<f64> {
        let differences = engine.diff_policies(source, reference);
        self.score(source.label(), &differences, comparable_leaves(source))
    }
}

/// Number of comparable leaves in a policy projection.
#[must_use]
pub fn comparable_leaves(policy: &CanonicalPolicy) -> usize {
    Value::leaf_count(&policy.to_value())
}

fn is_critical(path: &str) -> bool {
    CRITICAL_PATHS.iter().any(|prefix| under(path, prefix))
}

fn weight(path: &str) -> f64 {
    PATH_WEIGHTS
        .iter()
        .find(|(prefix, _)| under(path, prefix))
        .map_or(DEFAULT_WEIGHT, |(_, w)| *w)
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_core::{PolicyState, SourceFormat};

    fn entry(path: &str) -> DifferenceEntry {
        DifferenceEntry::new(path, Value::Null, Value::from("x"))
    }

    #[test]
    fn test_no_differences_scores_one() {
        let score = SemanticScorer::new().score("p", &[], 30).unwrap();
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weighted_score() {
        let score = SemanticScorer::new()
            .score("p", &[entry("DisplayName"), entry("Conditions.ClientAppTypes")], 30)
            .unwrap();
        assert!((score - (1.0 - 1.5 / 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_prefix_weights() {
        assert!((weight("Conditions.Locations.IncludeLocations") - 2.0).abs() < f64::EPSILON);
        assert!((weight("Conditions.UserRiskLevels") - 1.0).abs() < f64::EPSILON);
        assert!((weight("GrantControls.Operator") - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_state_difference_is_critical() {
        let score = SemanticScorer::new().score("p", &[entry("State")], 30).unwrap();
        assert!(score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_targeting_and_grant_differences_are_critical() {
        let scorer = SemanticScorer::new();
        for path in [
            "GrantControls.BuiltInControls",
            "Conditions.Users.IncludeUsers",
            "Conditions.Users.ExcludeGroups",
            "Conditions.Applications.IncludeApplications",
        ] {
            let score = scorer.score("p", &[entry(path)], 30).unwrap();
            assert!(score.abs() < f64::EPSILON, "{path} scored {score}");
        }

        assert!(!is_critical("Conditions.UserRiskLevels"));
        assert!(!is_critical("GrantControls.Operator"));
    }

    #[test]
    fn test_score_never_negative() {
        let many: Vec<_> = (0..10).map(|_| entry("Conditions.Locations")).collect();
        let score = SemanticScorer::new().score("p", &many, 5).unwrap();
        assert!(score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_leaves_is_comparison_error() {
        let err = SemanticScorer::new().score("p", &[], 0).unwrap_err();
        assert!(matches!(err, CompareError::Comparison { .. }));
    }

    #[test]
    fn test_score_policies() {
        let a = CanonicalPolicy::new("P", SourceFormat::Json).with_state(PolicyState::Enabled);
        let mut b = a.clone();
        b.conditions.client_app_types = vec!["browser".into()];
        let score = SemanticScorer::new()
            .score_policies(&DiffEngine::new(), &a, &b)
            .unwrap();
        assert!((score - (1.0 - 1.0 / 30.0)).abs() < 1e-9);
    }
}
