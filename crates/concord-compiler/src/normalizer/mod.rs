//! Normalization of both input formats into [`CanonicalPolicy`].
//!
//! Both normalizers apply the same defaulting rules:
//!
//! - a missing or unrecognized state becomes [`PolicyState::Disabled`]
//! - a missing condition or control group becomes its all-default struct
//! - list fields keep their input order
//!
//! A record whose display name cannot be determined is skipped and reported
//! as a [`NormalizationWarning`]; the remaining records are still normalized.
//!
//! [`PolicyState::Disabled`]: concord_core::PolicyState::Disabled

mod configuration;
mod json;

pub use configuration::ConfigurationNormalizer;
pub use json::JsonNormalizer;

use concord_core::CanonicalPolicy;
use serde::Serialize;

/// A record that could not be normalized and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationWarning {
    /// File the record came from.
    pub source: String,
    /// Record identifier (resource address or array index).
    pub record: String,
    /// Human-readable message.
    pub message: String,
}

/// Policies normalized from one input, plus the records that were skipped.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    /// Normalized policies in input order.
    pub policies: Vec<CanonicalPolicy>,
    /// Skipped records.
    pub warnings: Vec<NormalizationWarning>,
    /// Tenant id declared by a directory JSON export, if any.
    pub tenant_id: Option<String>,
}

/// Converts a numeric input to a non-negative whole `u32`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn whole_u32(n: f64) -> Option<u32> {
    (n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then(|| n as u32)
}
