//! Pairing of source and reference policies.
//!
//! Every input policy ends up in exactly one [`MatchedPair`]. When several
//! references qualify for one source, the first in reference order wins and
//! the others stay available for later sources (or end up reference-only).
//! Pairs are returned with sources in input order, followed by the
//! unmatched references in input order.

use std::collections::{HashMap, VecDeque};

use concord_core::CanonicalPolicy;
use tracing::debug;

use crate::diff::DiffEngine;
use crate::options::{MatchingOptions, MatchingStrategy};
use crate::scorer::SemanticScorer;

/// A source policy, a reference policy, or both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchedPair<'p> {
    /// Both sides were found.
    Matched {
        /// Source policy.
        source: &'p CanonicalPolicy,
        /// Reference policy.
        reference: &'p CanonicalPolicy,
    },
    /// No reference matched the source.
    SourceOnly(&'p CanonicalPolicy),
    /// No source matched the reference.
    ReferenceOnly(&'p CanonicalPolicy),
}

/// Pairs policies according to [`MatchingOptions`].
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'o> {
    options: &'o MatchingOptions,
}

impl<'o> Matcher<'o> {
    /// Creates a matcher.
    #[must_use]
    pub const fn new(options: &'o MatchingOptions) -> Self {
        Self { options }
    }

    /// Pairs the two policy lists.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concord_compare::{MatchedPair, Matcher, MatchingOptions};
    /// use concord_core::{CanonicalPolicy, SourceFormat};
    ///
    /// let sources = vec![CanonicalPolicy::new("My Policy", SourceFormat::Configuration)];
    /// let references = vec![CanonicalPolicy::new("my policy", SourceFormat::Json)];
    ///
    /// let options = MatchingOptions::default();
    /// let pairs = Matcher::new(&options).match_policies(&sources, &references);
    /// assert!(matches!(pairs[..], [MatchedPair::Matched { .. }]));
    /// ```
    #[must_use]
    pub fn match_policies<'p>(
        &self,
        sources: &'p [CanonicalPolicy],
        references: &'p [CanonicalPolicy],
    ) -> Vec<MatchedPair<'p>> {
        let mut assignment = Assignment::new(sources.len(), references.len());

        match self.options.strategy {
            MatchingStrategy::ById => {
                self.match_by_key(sources, references, &mut assignment, |p| {
                    (!p.id.is_empty()).then_some(p.id.as_str())
                });
            }
            MatchingStrategy::ByName => self.match_by_name(sources, references, &mut assignment),
            MatchingStrategy::CustomMapping => {
                self.match_by_mapping(sources, references, &mut assignment);
            }
            MatchingStrategy::SemanticSimilarity => {
                self.match_by_name(sources, references, &mut assignment);
                self.match_by_similarity(sources, references, &mut assignment);
            }
        }

        let pairs = assignment.into_pairs(sources, references);
        debug!(
            strategy = %self.options.strategy,
            sources = sources.len(),
            references = references.len(),
            pairs = pairs.len(),
            "Matched policies"
        );
        pairs
    }

    fn match_by_name(
        &self,
        sources: &[CanonicalPolicy],
        references: &[CanonicalPolicy],
        assignment: &mut Assignment,
    ) {
        self.match_by_key(sources, references, assignment, |p| {
            Some(p.display_name.as_str())
        });
    }

    /// Pairs sources and references sharing a key, first reference first.
    fn match_by_key(
        &self,
        sources: &[CanonicalPolicy],
        references: &[CanonicalPolicy],
        assignment: &mut Assignment,
        key: impl Fn(&CanonicalPolicy) -> Option<&str>,
    ) {
        let mut candidates: HashMap<String, VecDeque<usize>> = HashMap::new();
        for (index, reference) in references.iter().enumerate() {
            if assignment.reference_used(index) {
                continue;
            }
            if let Some(k) = key(reference) {
                candidates
                    .entry(self.options.fold_key(k))
                    .or_default()
                    .push_back(index);
            }
        }

        for (index, source) in sources.iter().enumerate() {
            if assignment.source_matched(index) {
                continue;
            }
            let Some(k) = key(source) else { continue };
            if let Some(reference) = candidates
                .get_mut(&self.options.fold_key(k))
                .and_then(VecDeque::pop_front)
            {
                assignment.assign(index, reference);
            }
        }
    }

    /// Pairs each mapped source with the first reference whose id or display
    /// name equals the mapped identifier.
    fn match_by_mapping(
        &self,
        sources: &[CanonicalPolicy],
        references: &[CanonicalPolicy],
        assignment: &mut Assignment,
    ) {
        for (index, source) in sources.iter().enumerate() {
            let source_key = if source.id.is_empty() {
                &source.display_name
            } else {
                &source.id
            };
            let Some(target) = self
                .options
                .custom_mappings
                .iter()
                .find(|(from, _)| self.options.keys_equal(from, source_key))
                .map(|(_, to)| to)
            else {
                debug!(policy = %source.label(), "No custom mapping for source policy");
                continue;
            };

            let found = references.iter().enumerate().find(|(j, reference)| {
                !assignment.reference_used(*j)
                    && ((!reference.id.is_empty() && self.options.keys_equal(&reference.id, target))
                        || self.options.keys_equal(&reference.display_name, target))
            });
            match found {
                Some((j, _)) => assignment.assign(index, j),
                None => debug!(
                    policy = %source.label(),
                    target = %target,
                    "Mapped reference not found"
                ),
            }
        }
    }

    /// Pairs each remaining source with its best-scoring remaining reference.
    fn match_by_similarity(
        &self,
        sources: &[CanonicalPolicy],
        references: &[CanonicalPolicy],
        assignment: &mut Assignment,
    ) {
        let engine = DiffEngine::new().with_case_sensitive(self.options.case_sensitive);
        let scorer = SemanticScorer::new();

        for (index, source) in sources.iter().enumerate() {
            if assignment.source_matched(index) {
                continue;
            }

            let mut best: Option<(usize, f64)> = None;
            for (j, reference) in references.iter().enumerate() {
                if assignment.reference_used(j) {
                    continue;
                }
                let Ok(score) = scorer.score_policies(&engine, source, reference) else {
                    continue;
                };
                if score >= self.options.similarity_threshold
                    && best.map_or(true, |(_, top)| score > top)
                {
                    best = Some((j, score));
                }
            }

            if let Some((reference, score)) = best {
                debug!(
                    policy = %source.label(),
                    reference = %references[reference].label(),
                    score,
                    "Matched by similarity"
                );
                assignment.assign(index, reference);
            }
        }
    }
}

/// Which reference each source is paired with.
struct Assignment {
    sources: Vec<Option<usize>>,
    used: Vec<bool>,
}

impl Assignment {
    fn new(sources: usize, references: usize) -> Self {
        Self {
            sources: vec![None; sources],
            used: vec![false; references],
        }
    }

    fn source_matched(&self, source: usize) -> bool {
        self.sources[source].is_some()
    }

    fn reference_used(&self, reference: usize) -> bool {
        self.used[reference]
    }

    fn assign(&mut self, source: usize, reference: usize) {
        self.sources[source] = Some(reference);
        self.used[reference] = true;
    }

    fn into_pairs<'p>(
        self,
        sources: &'p [CanonicalPolicy],
        references: &'p [CanonicalPolicy],
    ) -> Vec<MatchedPair<'p>> {
        let mut pairs: Vec<MatchedPair<'p>> = sources
            .iter()
            .zip(&self.sources)
            .map(|(source, assigned)| match assigned {
                Some(j) => MatchedPair::Matched {
                    source,
                    reference: &references[*j],
                },
                None => MatchedPair::SourceOnly(source),
            })
            .collect();
        pairs.extend(
            references
                .iter()
                .zip(&self.used)
                .filter(|(_, used)| !**used)
                .map(|(reference, _)| MatchedPair::ReferenceOnly(reference)),
        );
        pairs
    }
}
