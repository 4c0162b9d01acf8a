//! Variable and local reference resolution.
//!
//! Replaces whole-value `local.<name>` and `var.<name>` references in
//! resource attributes with the declared values. Anything that cannot be
//! resolved stays in place as its literal text and produces a
//! [`ReferenceWarning`]; resolution never fails.
//!
//! Only one level is resolved: a substituted value is inserted as literal
//! text even if it contains `var.` or `local.` references of its own, so
//! resolving an already resolved document leaves it unchanged. Data-source
//! references inside a substituted value stay references and warn as data
//! sources.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::document::{AttributeValue, ConfigurationDocument};

/// Kind of reference that could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceKind {
    /// `var.<name>` without a declared default.
    Variable,
    /// `local.<name>` without a definition.
    Local,
    /// `data.<kind>.<name>...` access.
    DataSource,
    /// A substituted value that itself contains references.
    Transitive,
}

/// A reference left unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceWarning {
    /// Address of the resource holding the reference.
    pub resource: String,
    /// The reference text.
    pub reference: String,
    /// Kind of reference.
    pub kind: ReferenceKind,
    /// Human-readable message.
    pub message: String,
}

/// A resolved document and the warnings produced while resolving it.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Document with resolvable references substituted.
    pub document: ConfigurationDocument,
    /// Unresolved references, one per resource and reference.
    pub warnings: Vec<ReferenceWarning>,
}

/// Resolver for `var.` and `local.` references.
#[derive(Debug, Default, Clone, Copy)]
pub struct Resolver;

impl Resolver {
    /// Creates a new resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves references in every resource of the document.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concord_compiler::{ConfigParser, Resolver};
    ///
    /// let doc = ConfigParser::new()
    ///     .parse_source(
    ///         r#"
    ///         variable "state" { default = "enabled" }
    ///         resource "azuread_conditional_access_policy" "p" {
    ///           display_name = "P"
    ///           state        = var.state
    ///         }
    ///         "#,
    ///         "main.tf",
    ///     )
    ///     .unwrap();
    ///
    /// let resolution = Resolver::new().resolve(doc);
    /// assert!(resolution.warnings.is_empty());
    /// ```
    #[must_use]
    pub fn resolve(&self, mut document: ConfigurationDocument) -> Resolution {
        let ConfigurationDocument {
            resources,
            variables,
            locals,
            ..
        } = &mut document;

        let scope = Scope {
            locals: locals.iter().map(|l| (l.name.as_str(), &l.value)).collect(),
            variables: variables
                .iter()
                .map(|v| (v.name.as_str(), v.default_value.as_ref()))
                .collect(),
        };

        let mut warnings = Vec::new();
        for resource in resources.iter_mut() {
            let mut context = ResourceContext {
                address: resource.address(),
                warnings: &mut warnings,
            };
            resource
                .body
                .for_each_value_mut(&mut |value| scope.resolve_value(value, &mut context));
        }

        debug!(warnings = warnings.len(), "Resolved configuration references");
        Resolution { document, warnings }
    }
}

struct Scope<'a> {
    locals: HashMap<&'a str, &'a AttributeValue>,
    variables: HashMap<&'a str, Option<&'a AttributeValue>>,
}

struct ResourceContext<'w> {
    address: String,
    warnings: &'w mut Vec<ReferenceWarning>,
}

impl ResourceContext<'_> {
    fn warn(&mut self, reference: &str, kind: ReferenceKind, message: String) {
        let duplicate = self
            .warnings
            .iter()
            .any(|w| w.resource == self.address && w.reference == reference && w.kind == kind);
        if duplicate {
            return;
        }
        warn!(resource = %self.address, %reference, "{message}");
        self.warnings.push(ReferenceWarning {
            resource: self.address.clone(),
            reference: reference.to_string(),
            kind,
            message,
        });
    }
}

impl Scope<'_> {
    fn resolve_value(&self, value: &mut AttributeValue, context: &mut ResourceContext<'_>) {
        match value {
            AttributeValue::Reference(reference) => {
                if let Some(resolved) = self.lookup(reference, context) {
                    *value = resolved;
                }
            }
            AttributeValue::List(items) => {
                for item in items {
                    self.resolve_value(item, context);
                }
            }
            AttributeValue::Object(body) => {
                body.for_each_value_mut(&mut |v| self.resolve_value(v, context));
            }
            _ => {}
        }
    }

    /// Returns the replacement for a reference, or `None` to leave it in place.
    fn lookup(&self, reference: &str, context: &mut ResourceContext<'_>) -> Option<AttributeValue> {
        if let Some(name) = reference.strip_prefix("local.") {
            let Some(local) = self.locals.get(name) else {
                context.warn(
                    reference,
                    ReferenceKind::Local,
                    format!("Local '{name}' referenced but not defined."),
                );
                return None;
            };
            return Some(freeze(local, reference, context));
        }

        if let Some(name) = reference.strip_prefix("var.") {
            let Some(Some(default)) = self.variables.get(name) else {
                context.warn(
                    reference,
                    ReferenceKind::Variable,
                    format!("Variable '{name}' referenced but no default value found."),
                );
                return None;
            };
            return Some(freeze(default, reference, context));
        }

        if reference.starts_with("data.") {
            warn_data_source(reference, context);
            return None;
        }

        debug!(resource = %context.address, %reference, "Leaving non-variable reference in place");
        None
    }
}

fn warn_data_source(reference: &str, context: &mut ResourceContext<'_>) {
    context.warn(
        reference,
        ReferenceKind::DataSource,
        format!("Data source reference '{reference}' cannot be resolved without live data."),
    );
}

/// Copies a substituted value, turning nested references into literal text.
/// Nested data-source references stay references.
fn freeze(
    value: &AttributeValue,
    origin: &str,
    context: &mut ResourceContext<'_>,
) -> AttributeValue {
    match value {
        AttributeValue::Reference(inner) if inner.starts_with("data.") => {
            warn_data_source(inner, context);
            value.clone()
        }
        AttributeValue::Reference(inner) => {
            context.warn(
                inner,
                ReferenceKind::Transitive,
                format!(
                    "Reference '{origin}' resolves to '{inner}'; nested references are not resolved."
                ),
            );
            AttributeValue::String(inner.clone())
        }
        AttributeValue::List(items) => {
            AttributeValue::List(items.iter().map(|i| freeze(i, origin, context)).collect())
        }
        AttributeValue::Object(body) => {
            let mut body = body.clone();
            body.for_each_value_mut(&mut |v| *v = freeze(v, origin, context));
            AttributeValue::Object(body)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ConfigParser;

    fn resolve(source: &str) -> Resolution {
        let doc = ConfigParser::new().parse_source(source, "test.tf").unwrap();
        Resolver::new().resolve(doc)
    }

    fn attr<'a>(resolution: &'a Resolution, name: &str) -> Option<&'a AttributeValue> {
        resolution.document.resources[0].body.attribute(name)
    }

    #[test]
    fn test_resolves_variable_default_and_local() {
        let resolution = resolve(
            r#"
variable "state" { default = "enabled" }
locals { name = "Require MFA" }
resource "azuread_conditional_access_policy" "p" {
  display_name = local.name
  state        = var.state
}
"#,
        );
        assert!(resolution.warnings.is_empty());
        assert_eq!(
            attr(&resolution, "display_name"),
            Some(&AttributeValue::String("Require MFA".into()))
        );
        assert_eq!(
            attr(&resolution, "state"),
            Some(&AttributeValue::String("enabled".into()))
        );
    }

    #[test]
    fn test_missing_variable_keeps_literal_and_warns_once() {
        let resolution = resolve(
            r#"
resource "azuread_conditional_access_policy" "p" {
  display_name = "P"
  state        = var.missing_var
  conditions {
    users {
      included_users = [var.missing_var]
    }
  }
}
"#,
        );
        assert_eq!(
            attr(&resolution, "state"),
            Some(&AttributeValue::Reference("var.missing_var".into()))
        );
        assert_eq!(resolution.warnings.len(), 1);
        assert_eq!(
            resolution.warnings[0].message,
            "Variable 'missing_var' referenced but no default value found."
        );
        assert_eq!(resolution.warnings[0].kind, ReferenceKind::Variable);
    }

    #[test]
    fn test_variable_without_default_warns() {
        let resolution = resolve(
            r#"
variable "state" { type = string }
resource "azuread_conditional_access_policy" "p" { state = var.state }
"#,
        );
        assert_eq!(resolution.warnings.len(), 1);
        assert!(resolution.warnings[0].message.contains("'state'"));
    }

    #[test]
    fn test_data_reference_is_left_with_warning() {
        let resolution = resolve(
            r#"
resource "azuread_conditional_access_policy" "p" {
  conditions {
    users {
      included_groups = [data.azuread_group.admins.object_id]
    }
  }
}
"#,
        );
        assert_eq!(resolution.warnings.len(), 1);
        assert_eq!(resolution.warnings[0].kind, ReferenceKind::DataSource);
        assert_eq!(
            resolution.warnings[0].message,
            "Data source reference 'data.azuread_group.admins.object_id' cannot be resolved without live data."
        );
    }

    #[test]
    fn test_local_chain_resolves_one_level() {
        let resolution = resolve(
            r#"
variable "b" { default = "enabled" }
locals { a = var.b }
resource "azuread_conditional_access_policy" "p" { state = local.a }
"#,
        );
        assert_eq!(
            attr(&resolution, "state"),
            Some(&AttributeValue::String("var.b".into()))
        );
        assert_eq!(resolution.warnings.len(), 1);
        assert_eq!(resolution.warnings[0].kind, ReferenceKind::Transitive);
    }

    #[test]
    fn test_local_holding_data_reference_warns_as_data_source() {
        let resolution = resolve(
            r#"
data "azuread_group" "a" { display_name = "A" }
locals { g = data.azuread_group.a.object_id }
resource "azuread_conditional_access_policy" "p" {
  conditions {
    users {
      included_groups = [local.g]
    }
  }
}
"#,
        );
        assert_eq!(resolution.warnings.len(), 1);
        assert_eq!(resolution.warnings[0].kind, ReferenceKind::DataSource);
        assert_eq!(resolution.warnings[0].reference, "data.azuread_group.a.object_id");
        assert_eq!(
            resolution.warnings[0].message,
            "Data source reference 'data.azuread_group.a.object_id' cannot be resolved without live data."
        );

        let groups = resolution.document.resources[0]
            .body
            .section("conditions")
            .and_then(|c| c.section("users"))
            .and_then(|u| u.attribute("included_groups"));
        assert_eq!(
            groups,
            Some(&AttributeValue::List(vec![AttributeValue::Reference(
                "data.azuread_group.a.object_id".into()
            )]))
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let first = resolve(
            r#"
variable "b" { default = ["x", "y"] }
locals { a = var.b }
resource "azuread_conditional_access_policy" "p" {
  state = local.a
  display_name = var.missing
  grant_controls {
    built_in_controls = var.b
  }
}
"#,
        );
        let second = Resolver::new().resolve(first.document.clone());
        assert_eq!(second.document, first.document);
    }

    #[test]
    fn test_resolves_inside_object_literals() {
        let resolution = resolve(
            r#"
locals { users = ["All"] }
resource "azuread_conditional_access_policy" "p" {
  conditions = {
    users = { included_users = local.users }
  }
}
"#,
        );
        let users = resolution.document.resources[0]
            .body
            .section("conditions")
            .and_then(|c| c.section("users"))
            .and_then(|u| u.attribute("included_users"));
        assert_eq!(
            users,
            Some(&AttributeValue::List(vec![AttributeValue::String("All".into())]))
        );
    }
}
