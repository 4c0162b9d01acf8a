//! Structural diff over policy value trees.
//!
//! Policies are projected into [`Value`] trees (see
//! [`CanonicalPolicy::to_value`]) and walked field by field. Each scalar or
//! list that differs yields one [`DifferenceEntry`] with its dotted path.
//!
//! Lists whose field name starts with `Include` or `Exclude` are targeting
//! sets and compare as multisets: order is ignored, duplicates are not.
//! All other lists compare in order.

use concord_core::{CanonicalPolicy, Value};
use serde::Serialize;

/// Path used for the synthetic entry of a pair that could not be compared.
pub const COMPARISON_FAILED_PATH: &str = "<comparison>";

/// One discrepancy between two policies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferenceEntry {
    /// Dotted field path, e.g. `Conditions.Users.IncludeUsers`.
    pub path: String,
    /// Value on the source side.
    pub before: Value,
    /// Value on the reference side.
    pub after: Value,
}

impl DifferenceEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Creates the synthetic entry recorded for a failed comparison.
    #[must_use]
    pub fn comparison_failed(message: impl Into<String>) -> Self {
        Self::new(
            COMPARISON_FAILED_PATH,
            Value::Null,
            Value::String(message.into()),
        )
    }
}

/// Computes differences between canonical policies.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine {
    case_sensitive: bool,
}

impl DiffEngine {
    /// Creates an engine that compares display names case-insensitively.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            case_sensitive: false,
        }
    }

    /// Sets whether display names are compared case-sensitively.
    #[must_use]
    pub const fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Diffs two policies. An empty result means the policies are equal.
    ///
    /// Id, source format and source location are not compared.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concord_compare::DiffEngine;
    /// use concord_core::{CanonicalPolicy, PolicyState, SourceFormat};
    ///
    /// let a = CanonicalPolicy::new("Require MFA", SourceFormat::Configuration)
    ///     .with_state(PolicyState::Enabled);
    /// let b = CanonicalPolicy::new("require mfa", SourceFormat::Json);
    ///
    /// let diff = DiffEngine::new().diff_policies(&a, &b);
    /// assert_eq!(diff.len(), 1);
    /// assert_eq!(diff[0].path, "State");
    /// ```
    #[must_use]
    pub fn diff_policies(
        &self,
        source: &CanonicalPolicy,
        reference: &CanonicalPolicy,
    ) -> Vec<DifferenceEntry> {
        let before = source.to_value();
        let mut after = reference.to_value();

        if !self.case_sensitive
            && source.display_name.to_lowercase() == reference.display_name.to_lowercase()
        {
            after.set("DisplayName", Value::from(&source.display_name));
        }

        diff_values(&before, &after)
    }
}

/// Diffs two value trees.
#[must_use]
pub fn diff_values(before: &Value, after: &Value) -> Vec<DifferenceEntry> {
    let mut out = Vec::new();
    walk("", before, after, &mut out);
    out
}

fn walk(path: &str, before: &Value, after: &Value, out: &mut Vec<DifferenceEntry>) {
    match (before, after) {
        (Value::Map(left), Value::Map(right)) => {
            for (key, value) in left {
                let child = join(path, key);
                match right.iter().find(|(k, _)| k == key) {
                    Some((_, other)) => walk(&child, value, other, out),
                    None => out.push(DifferenceEntry::new(child, value.clone(), Value::Null)),
                }
            }
            for (key, value) in right {
                if !left.iter().any(|(k, _)| k == key) {
                    out.push(DifferenceEntry::new(join(path, key), Value::Null, value.clone()));
                }
            }
        }
        (Value::List(left), Value::List(right)) if is_targeting_list(path) => {
            if !same_multiset(left, right) {
                out.push(DifferenceEntry::new(path, before.clone(), after.clone()));
            }
        }
        _ => {
            if before != after {
                out.push(DifferenceEntry::new(path, before.clone(), after.clone()));
            }
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Inclusion and exclusion lists are order-insensitive.
fn is_targeting_list(path: &str) -> bool {
    let field = path.rsplit('.').next().unwrap_or(path);
    field.starts_with("Include") || field.starts_with("Exclude")
}

fn same_multiset(left: &[Value], right: &[Value]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let sorted = |items: &[Value]| {
        let mut keys: Vec<String> = items.iter().map(Value::sort_key).collect();
        keys.sort_unstable();
        keys
    };
    sorted(left) == sorted(right)
}
