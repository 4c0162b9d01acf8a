//! # Concord Compare
//!
//! Cross-format comparison of conditional access policies.
//!
//! This crate provides functionality for:
//!
//! - Structural diffing of canonical policies ([`DiffEngine`])
//! - Pairing source and reference policies by id, name, explicit mapping or
//!   similarity ([`Matcher`])
//! - Classifying pairs as identical, semantically equivalent, different or
//!   orphaned ([`Classifier`], [`SemanticScorer`])
//! - Running a whole comparison and summarizing it ([`Comparator`])
//!
//! ## Example
//!
//! ```rust
//! use concord_compare::{Comparator, MatchingOptions, PairStatus};
//! use concord_compiler::SourceDocument;
//! use concord_core::SourceFormat;
//!
//! let config = SourceDocument::new(
//!     "main.tf",
//!     r#"
//!     resource "azuread_conditional_access_policy" "mfa" {
//!       display_name = "Require MFA"
//!       state        = "enabled"
//!     }
//!     "#,
//!     SourceFormat::Configuration,
//! );
//! let export = SourceDocument::new(
//!     "export.json",
//!     r#"{"policies": [{"displayName": "Require MFA", "state": "disabled"}]}"#,
//!     SourceFormat::Json,
//! );
//!
//! let report = Comparator::new(MatchingOptions::default())
//!     .unwrap()
//!     .compare_documents(&[config], &[export]);
//! assert_eq!(report.pairs[0].status, PairStatus::Different);
//! assert_eq!(report.summary.different, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classifier;
pub mod comparator;
pub mod diff;
pub mod error;
pub mod matcher;
pub mod options;
pub mod result;
pub mod scorer;
pub mod suggestions;


pub use classifier::Classifier;
pub use comparator::Comparator;
pub use diff::{diff_values, DiffEngine, DifferenceEntry, COMPARISON_FAILED_PATH};
pub use error::{CompareError, Result};
pub use matcher::{MatchedPair, Matcher};
pub use options::{MatchingOptions, MatchingStrategy, DEFAULT_SIMILARITY_THRESHOLD};
pub use result::{
    ComparisonPair, ComparisonReport, ComparisonSummary, PairStatus, RunError, RunErrorKind,
};
pub use scorer::SemanticScorer;
pub use suggestions::conversion_suggestions;
