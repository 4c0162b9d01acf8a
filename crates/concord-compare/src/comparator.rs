//! Run orchestration: load, match, classify, summarize.

use concord_compiler::{CompilerError, LoadedSource, PolicyLoader, SourceDocument};
use concord_core::CanonicalPolicy;
use tracing::{info, warn};

use crate::classifier::Classifier;
use crate::error::Result;
use crate::matcher::Matcher;
use crate::options::MatchingOptions;
use crate::result::{ComparisonReport, ComparisonSummary, RunError, RunErrorKind};

/// Compares a set of source policies against a set of reference policies.
#[derive(Debug, Clone)]
pub struct Comparator {
    options: MatchingOptions,
    loader: PolicyLoader,
}

impl Comparator {
    /// Creates a comparator after validating the options.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InvalidOptions`](crate::CompareError::InvalidOptions)
    /// if the options are inconsistent.
    pub fn new(options: MatchingOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            loader: PolicyLoader::new(),
        })
    }

    /// Uses a custom loader for document inputs.
    #[must_use]
    pub fn with_loader(mut self, loader: PolicyLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Returns the options in use.
    #[must_use]
    pub const fn options(&self) -> &MatchingOptions {
        &self.options
    }

    /// Compares already-normalized policies.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concord_compare::{Comparator, MatchingOptions, PairStatus};
    /// use concord_core::{CanonicalPolicy, SourceFormat};
    ///
    /// let comparator = Comparator::new(MatchingOptions::default()).unwrap();
    /// let report = comparator.compare_policies(
    ///     &[CanonicalPolicy::new("Require MFA", SourceFormat::Configuration)],
    ///     &[CanonicalPolicy::new("Require MFA", SourceFormat::Json)],
    /// );
    /// assert_eq!(report.pairs[0].status, PairStatus::Identical);
    /// assert_eq!(report.summary.identical, 1);
    /// ```
    #[must_use]
    pub fn compare_policies(
        &self,
        sources: &[CanonicalPolicy],
        references: &[CanonicalPolicy],
    ) -> ComparisonReport {
        let classifier = Classifier::new(&self.options);
        let pairs: Vec<_> = Matcher::new(&self.options)
            .match_policies(sources, references)
            .into_iter()
            .map(|pair| classifier.classify(pair))
            .collect();

        let errors = pairs
            .iter()
            .filter_map(|pair| {
                pair.comparison_failure().map(|message| {
                    RunError::new(pair.name(), RunErrorKind::Comparison, message)
                })
            })
            .collect();

        let summary = ComparisonSummary::from_pairs(&pairs, sources.len(), references.len());
        info!(
            pairs = summary.total_pairs,
            identical = summary.identical,
            equivalent = summary.semantically_equivalent,
            different = summary.different,
            source_only = summary.source_only,
            reference_only = summary.reference_only,
            "Comparison complete"
        );

        ComparisonReport {
            summary,
            pairs,
            errors,
            warnings: Vec::new(),
            options: self.options.clone(),
        }
    }

    /// Loads, normalizes and compares two sets of documents.
    ///
    /// A document that fails to load is recorded in the report's error list
    /// and contributes no policies; the remaining documents are still
    /// compared. Skipped records become normalization errors and unresolved
    /// references become warnings.
    #[must_use]
    pub fn compare_documents(
        &self,
        sources: &[SourceDocument],
        references: &[SourceDocument],
    ) -> ComparisonReport {
        let mut errors = Vec::new();
        let source_sets = self.load_all(sources, &mut errors);
        let reference_sets = self.load_all(references, &mut errors);

        let mut warnings = Vec::new();
        let mut gather = |sets: Vec<LoadedSource>| -> Vec<CanonicalPolicy> {
            let mut policies = Vec::new();
            for set in sets {
                warnings.extend(set.reference_warnings);
                errors.extend(set.normalization_warnings.into_iter().map(|w| {
                    RunError::new(
                        format!("{}:{}", w.source, w.record),
                        RunErrorKind::Normalization,
                        w.message,
                    )
                }));
                policies.extend(set.policies);
            }
            policies
        };
        let source_policies = gather(source_sets);
        let reference_policies = gather(reference_sets);

        let mut report = self.compare_policies(&source_policies, &reference_policies);
        errors.append(&mut report.errors);
        report.errors = errors;
        report.warnings = warnings;
        report
    }

    fn load_all(
        &self,
        documents: &[SourceDocument],
        errors: &mut Vec<RunError>,
    ) -> Vec<LoadedSource> {
        documents
            .iter()
            .filter_map(|document| match self.loader.load(document) {
                Ok(loaded) => Some(loaded),
                Err(e) => {
                    warn!(source = %document.name, error = %e, "Skipping policy source");
                    errors.push(RunError::new(&document.name, error_kind(&e), e.to_string()));
                    None
                }
            })
            .collect()
    }
}

const fn error_kind(error: &CompilerError) -> RunErrorKind {
    match error {
        CompilerError::ParseError { .. } => RunErrorKind::Parse,
        _ => RunErrorKind::InvalidInput,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MatchingStrategy;
    use crate::result::PairStatus;
    use concord_core::SourceFormat;

    #[test]
    fn test_invalid_options_rejected() {
        let options = MatchingOptions::default().with_strategy(MatchingStrategy::CustomMapping);
        assert!(Comparator::new(options).is_err());
    }

    #[test]
    fn test_empty_inputs_give_empty_summary() {
        let report = Comparator::new(MatchingOptions::default())
            .unwrap()
            .compare_documents(&[], &[]);
        assert!(report.pairs.is_empty());
        assert_eq!(report.summary, ComparisonSummary::default());
        assert!(!report.has_differences());
    }

    #[test]
    fn test_bad_file_is_isolated() {
        let sources = vec![
            SourceDocument::new(
                "broken.tf",
                r#"resource "azuread_conditional_access_policy" "a" {"#,
                SourceFormat::Configuration,
            ),
            SourceDocument::new(
                "good.tf",
                r#"resource "azuread_conditional_access_policy" "b" { display_name = "B" }"#,
                SourceFormat::Configuration,
            ),
        ];
        let references = vec![
            SourceDocument::new("bad.json", "{", SourceFormat::Json),
            SourceDocument::new(
                "export.json",
                r#"{"policies": [{"displayName": "B"}, {"id": "x"}]}"#,
                SourceFormat::Json,
            ),
        ];

        let report = Comparator::new(MatchingOptions::default())
            .unwrap()
            .compare_documents(&sources, &references);

        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.pairs[0].status, PairStatus::Identical);
        let kinds: Vec<_> = report.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RunErrorKind::Parse,
                RunErrorKind::InvalidInput,
                RunErrorKind::Normalization
            ]
        );
        assert_eq!(report.errors[2].source, "export.json:policies[1]");
    }
}
