//! Configuration resource to canonical policy mapping.

use concord_core::{
    ApplicationConditions, CanonicalPolicy, Conditions, DeviceConditions, GrantControls,
    LocationConditions, PlatformConditions, PolicyState, SessionControls, SourceFormat,
    UserConditions,
};
use tracing::{debug, warn};

use super::{whole_u32, NormalizationWarning, NormalizeOutcome};
use crate::document::{AttributeValue, Body, ConfigurationDocument, ResourceBlock};

/// Maps resolved configuration resources into canonical policies.
///
/// Attribute names follow the dialect's snake_case schema
/// (`display_name`, `conditions.users.included_users`, ...). Nested groups may
/// be written as blocks or as object literals.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigurationNormalizer;

impl ConfigurationNormalizer {
    /// Creates a new normalizer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Normalizes every resource of a (resolved) document.
    ///
    /// # Arguments
    ///
    /// * `document` - Document, normally after reference resolution
    /// * `file_name` - Source name recorded in each policy's location
    #[must_use]
    pub fn normalize(&self, document: &ConfigurationDocument, file_name: &str) -> NormalizeOutcome {
        let mut outcome = NormalizeOutcome::default();
        for resource in &document.resources {
            match self.normalize_resource(resource, file_name) {
                Ok(policy) => outcome.policies.push(policy),
                Err(warning) => {
                    warn!(file = %file_name, resource = %warning.record, "{}", warning.message);
                    outcome.warnings.push(warning);
                }
            }
        }
        debug!(
            file = %file_name,
            policies = outcome.policies.len(),
            skipped = outcome.warnings.len(),
            "Normalized configuration resources"
        );
        outcome
    }

    /// Normalizes one resource block.
    ///
    /// # Errors
    ///
    /// Returns a [`NormalizationWarning`] if the resource has no usable
    /// `display_name`.
    pub fn normalize_resource(
        &self,
        resource: &ResourceBlock,
        file_name: &str,
    ) -> Result<CanonicalPolicy, NormalizationWarning> {
        let address = resource.address();
        let body = &resource.body;

        let display_name = text(body, "display_name")
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| NormalizationWarning {
                source: file_name.to_string(),
                record: address.clone(),
                message: format!("Resource '{address}' has no display_name; skipped."),
            })?;

        let raw_state = text(body, "state");
        let state = PolicyState::parse_or_default(raw_state.as_deref());
        if let Some(raw) = raw_state.as_deref().filter(|r| r.parse::<PolicyState>().is_err()) {
            debug!(resource = %address, state = %raw, "Unrecognized state, using disabled");
        }

        let mut policy = CanonicalPolicy::new(display_name, SourceFormat::Configuration)
            .with_state(state)
            .with_source_location(format!("{file_name}:{address}"));
        policy.conditions = body.section("conditions").map(conditions).unwrap_or_default();
        policy.grant_controls = body
            .section("grant_controls")
            .map(grant_controls)
            .unwrap_or_default();
        policy.session_controls = body
            .section("session_controls")
            .map(session_controls)
            .unwrap_or_default();
        Ok(policy)
    }
}

fn conditions(body: &Body) -> Conditions {
    let users = body.section("users").map_or_else(UserConditions::default, |u| {
        UserConditions {
            include_users: strings(u, "included_users"),
            exclude_users: strings(u, "excluded_users"),
            include_groups: strings(u, "included_groups"),
            exclude_groups: strings(u, "excluded_groups"),
            include_roles: strings(u, "included_roles"),
            exclude_roles: strings(u, "excluded_roles"),
        }
    });
    let applications = body
        .section("applications")
        .map_or_else(ApplicationConditions::default, |a| ApplicationConditions {
            include_applications: strings(a, "included_applications"),
            exclude_applications: strings(a, "excluded_applications"),
            include_user_actions: strings(a, "included_user_actions"),
        });
    let platforms = body
        .section("platforms")
        .map_or_else(PlatformConditions::default, |p| PlatformConditions {
            include_platforms: strings(p, "included_platforms"),
            exclude_platforms: strings(p, "excluded_platforms"),
        });
    let locations = body
        .section("locations")
        .map_or_else(LocationConditions::default, |l| LocationConditions {
            include_locations: strings(l, "included_locations"),
            exclude_locations: strings(l, "excluded_locations"),
        });
    let devices = body
        .section("devices")
        .and_then(|d| d.section("filter"))
        .map_or_else(DeviceConditions::default, |f| DeviceConditions {
            filter_mode: text(f, "mode").unwrap_or_default(),
            filter_rule: text(f, "rule").unwrap_or_default(),
        });

    Conditions {
        users,
        applications,
        platforms,
        locations,
        devices,
        client_app_types: strings(body, "client_app_types"),
        sign_in_risk_levels: strings(body, "sign_in_risk_levels"),
        user_risk_levels: strings(body, "user_risk_levels"),
    }
}

fn grant_controls(body: &Body) -> GrantControls {
    GrantControls {
        operator: text(body, "operator").unwrap_or_default(),
        built_in_controls: strings(body, "built_in_controls"),
        custom_authentication_factors: strings(body, "custom_authentication_factors"),
        terms_of_use: strings(body, "terms_of_use"),
    }
}

fn session_controls(body: &Body) -> SessionControls {
    SessionControls {
        application_enforced_restrictions_enabled: boolean(
            body,
            "application_enforced_restrictions_enabled",
        ),
        cloud_app_security_policy: text(body, "cloud_app_security_policy").unwrap_or_default(),
        sign_in_frequency: number(body, "sign_in_frequency"),
        sign_in_frequency_period: text(body, "sign_in_frequency_period").unwrap_or_default(),
        persistent_browser_mode: text(body, "persistent_browser_mode").unwrap_or_default(),
        disable_resilience_defaults: boolean(body, "disable_resilience_defaults"),
    }
}

fn text(body: &Body, key: &str) -> Option<String> {
    body.attribute(key).and_then(AttributeValue::as_text)
}

/// Reads a string list; a scalar counts as a one-element list.
fn strings(body: &Body, key: &str) -> Vec<String> {
    match body.attribute(key) {
        Some(AttributeValue::List(items)) => {
            items.iter().filter_map(AttributeValue::as_text).collect()
        }
        Some(value) => value.as_text().into_iter().collect(),
        None => Vec::new(),
    }
}

fn boolean(body: &Body, key: &str) -> bool {
    match body.attribute(key) {
        Some(AttributeValue::Bool(b)) => *b,
        Some(AttributeValue::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn number(body: &Body, key: &str) -> Option<u32> {
    match body.attribute(key)? {
        AttributeValue::Number(n) => whole_u32(*n),
        AttributeValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
