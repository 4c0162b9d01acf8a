//! Directory JSON record to canonical policy mapping.
//!
//! Accepts an export object with a `policies` array (optionally `tenantId`),
//! a directory list response with a `value` array, or a bare array. Field
//! names are matched case-insensitively, so both `displayName` and
//! `DisplayName` work. Session controls accept the directory shape
//! (`signInFrequency: { value, type }`) as well as the flat canonical shape
//! (`signInFrequency`, `signInFrequencyPeriod`).

use concord_core::{
    ApplicationConditions, CanonicalPolicy, Conditions, DeviceConditions, GrantControls,
    LocationConditions, PlatformConditions, PolicyState, SessionControls, SourceFormat,
    UserConditions,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::{whole_u32, NormalizationWarning, NormalizeOutcome};
use crate::error::{CompilerError, Result};

/// Maps directory JSON policy records into canonical policies.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonNormalizer;

impl JsonNormalizer {
    /// Creates a new normalizer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parses and normalizes a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::InvalidJson`] if the text is not JSON, or
    /// [`CompilerError::MissingPolicies`] if it holds no policy array.
    /// Individual malformed records are skipped, not errors.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concord_compiler::JsonNormalizer;
    ///
    /// let outcome = JsonNormalizer::new()
    ///     .normalize_str(
    ///         r#"{"tenantId": "t1", "policies": [{"displayName": "Require MFA", "state": "enabled"}]}"#,
    ///         "export.json",
    ///     )
    ///     .unwrap();
    /// assert_eq!(outcome.policies.len(), 1);
    /// assert_eq!(outcome.tenant_id.as_deref(), Some("t1"));
    /// ```
    pub fn normalize_str(&self, text: &str, file_name: &str) -> Result<NormalizeOutcome> {
        let root: Value = serde_json::from_str(text).map_err(|e| CompilerError::InvalidJson {
            file: file_name.to_string(),
            source: e,
        })?;
        self.normalize_value(&root, file_name)
    }

    /// Normalizes an already-parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::MissingPolicies`] if the value holds no policy array.
    pub fn normalize_value(&self, root: &Value, file_name: &str) -> Result<NormalizeOutcome> {
        let records = match root {
            Value::Array(records) => records,
            Value::Object(_) => field(root, "policies")
                .or_else(|| field(root, "value"))
                .and_then(Value::as_array)
                .ok_or_else(|| CompilerError::MissingPolicies {
                    file: file_name.to_string(),
                })?,
            _ => {
                return Err(CompilerError::MissingPolicies {
                    file: file_name.to_string(),
                })
            }
        };

        let mut outcome = NormalizeOutcome {
            tenant_id: field(root, "tenantId")
                .and_then(Value::as_str)
                .map(str::to_string),
            ..NormalizeOutcome::default()
        };

        for (index, record) in records.iter().enumerate() {
            match self.normalize_record(record, index, file_name) {
                Ok(policy) => outcome.policies.push(policy),
                Err(warning) => {
                    warn!(file = %file_name, record = %warning.record, "{}", warning.message);
                    outcome.warnings.push(warning);
                }
            }
        }

        debug!(
            file = %file_name,
            policies = outcome.policies.len(),
            skipped = outcome.warnings.len(),
            "Normalized directory JSON records"
        );
        Ok(outcome)
    }

    /// Normalizes one policy record.
    ///
    /// # Errors
    ///
    /// Returns a [`NormalizationWarning`] if the record is not an object or
    /// has no usable `displayName`.
    pub fn normalize_record(
        &self,
        record: &Value,
        index: usize,
        file_name: &str,
    ) -> std::result::Result<CanonicalPolicy, NormalizationWarning> {
        let skip = |message: String| NormalizationWarning {
            source: file_name.to_string(),
            record: format!("policies[{index}]"),
            message,
        };

        if !record.is_object() {
            return Err(skip(format!(
                "Policy record #{index} is not an object; skipped."
            )));
        }

        let display_name = text(record, "displayName")
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| skip(format!("Policy record #{index} has no displayName; skipped.")))?;

        let state = PolicyState::parse_or_default(field(record, "state").and_then(Value::as_str));

        let mut policy = CanonicalPolicy::new(display_name, SourceFormat::Json)
            .with_id(text(record, "id").unwrap_or_default())
            .with_state(state)
            .with_source_location(file_name);
        policy.conditions = group(record, "conditions").map(conditions).unwrap_or_default();
        policy.grant_controls = group(record, "grantControls")
            .map(grant_controls)
            .unwrap_or_default();
        policy.session_controls = group(record, "sessionControls")
            .map(session_controls)
            .unwrap_or_default();
        Ok(policy)
    }
}

/// Case-insensitive object field lookup.
fn field<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    value
        .as_object()?
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Object-valued field; `null` and non-objects count as absent.
fn group<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    field(value, key).filter(|v| v.is_object())
}

fn text(value: &Value, key: &str) -> Option<String> {
    match field(value, key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a string list; a scalar counts as a one-element list.
fn strings(value: &Value, key: &str) -> Vec<String> {
    let scalar = |item: &Value| match item {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    };
    match field(value, key) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar).collect(),
        Some(other) => scalar(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn boolean(value: &Value, key: &str) -> Option<bool> {
    match field(value, key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(s.eq_ignore_ascii_case("true")),
        Value::Object(_) => field(field(value, key)?, "isEnabled").and_then(Value::as_bool),
        _ => None,
    }
}

fn number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_f64().and_then(whole_u32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn conditions(value: &Value) -> Conditions {
    let users = group(value, "users").map_or_else(UserConditions::default, |u| UserConditions {
        include_users: strings(u, "includeUsers"),
        exclude_users: strings(u, "excludeUsers"),
        include_groups: strings(u, "includeGroups"),
        exclude_groups: strings(u, "excludeGroups"),
        include_roles: strings(u, "includeRoles"),
        exclude_roles: strings(u, "excludeRoles"),
    });
    let applications = group(value, "applications").map_or_else(
        ApplicationConditions::default,
        |a| ApplicationConditions {
            include_applications: strings(a, "includeApplications"),
            exclude_applications: strings(a, "excludeApplications"),
            include_user_actions: strings(a, "includeUserActions"),
        },
    );
    let platforms = group(value, "platforms").map_or_else(PlatformConditions::default, |p| {
        PlatformConditions {
            include_platforms: strings(p, "includePlatforms"),
            exclude_platforms: strings(p, "excludePlatforms"),
        }
    });
    let locations = group(value, "locations").map_or_else(LocationConditions::default, |l| {
        LocationConditions {
            include_locations: strings(l, "includeLocations"),
            exclude_locations: strings(l, "excludeLocations"),
        }
    });
    let devices = group(value, "devices").map_or_else(DeviceConditions::default, |d| {
        group(d, "deviceFilter").map_or_else(
            || DeviceConditions {
                filter_mode: text(d, "filterMode").unwrap_or_default(),
                filter_rule: text(d, "filterRule").unwrap_or_default(),
            },
            |f| DeviceConditions {
                filter_mode: text(f, "mode").unwrap_or_default(),
                filter_rule: text(f, "rule").unwrap_or_default(),
            },
        )
    });

    Conditions {
        users,
        applications,
        platforms,
        locations,
        devices,
        client_app_types: strings(value, "clientAppTypes"),
        sign_in_risk_levels: strings(value, "signInRiskLevels"),
        user_risk_levels: strings(value, "userRiskLevels"),
    }
}

fn grant_controls(value: &Value) -> GrantControls {
    GrantControls {
        operator: text(value, "operator").unwrap_or_default(),
        built_in_controls: strings(value, "builtInControls"),
        custom_authentication_factors: strings(value, "customAuthenticationFactors"),
        terms_of_use: strings(value, "termsOfUse"),
    }
}

fn session_controls(value: &Value) -> SessionControls {
    let frequency = field(value, "signInFrequency");
    let (sign_in_frequency, sign_in_frequency_period) = match frequency {
        Some(f @ Value::Object(_)) => (
            field(f, "value").and_then(number),
            text(f, "type").unwrap_or_default(),
        ),
        Some(other) => (
            number(other),
            text(value, "signInFrequencyPeriod").unwrap_or_default(),
        ),
        None => (None, text(value, "signInFrequencyPeriod").unwrap_or_default()),
    };

    let cloud_app_security_policy = group(value, "cloudAppSecurity")
        .and_then(|c| text(c, "cloudAppSecurityType"))
        .or_else(|| text(value, "cloudAppSecurityPolicy"))
        .unwrap_or_default();
    let persistent_browser_mode = group(value, "persistentBrowser")
        .and_then(|p| text(p, "mode"))
        .or_else(|| text(value, "persistentBrowserMode"))
        .unwrap_or_default();
    let application_enforced_restrictions_enabled =
        boolean(value, "applicationEnforcedRestrictions")
            .or_else(|| boolean(value, "applicationEnforcedRestrictionsEnabled"))
            .unwrap_or(false);

    SessionControls {
        application_enforced_restrictions_enabled,
        cloud_app_security_policy,
        sign_in_frequency,
        sign_in_frequency_period,
        persistent_browser_mode,
        disable_resilience_defaults: boolean(value, "disableResilienceDefaults").unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> NormalizeOutcome {
        JsonNormalizer::new().normalize_str(text, "export.json").unwrap()
    }

    #[test]
    fn test_directory_record_mapping() {
        let outcome = normalize(
            r#"{
  "tenantId": "contoso",
  "policies": [{
    "id": "7d2f",
    "displayName": "Require MFA",
    "state": "enabled",
    "conditions": {
      "clientAppTypes": ["all"],
      "applications": {"includeApplications": ["All"]},
      "users": {"includeUsers": ["All"], "excludeGroups": ["g1"]},
      "platforms": null,
      "devices": {"deviceFilter": {"mode": "exclude", "rule": "device.isCompliant -eq True"}}
    },
    "grantControls": {"operator": "OR", "builtInControls": ["mfa"]},
    "sessionControls": {
      "signInFrequency": {"value": 4, "type": "hours", "isEnabled": true},
      "persistentBrowser": {"mode": "never", "isEnabled": true},
      "applicationEnforcedRestrictions": {"isEnabled": true},
      "cloudAppSecurity": {"cloudAppSecurityType": "monitorOnly", "isEnabled": true}
    }
  }]
}"#,
        );

        assert_eq!(outcome.tenant_id.as_deref(), Some("contoso"));
        let policy = &outcome.policies[0];
        assert_eq!(policy.id, "7d2f");
        assert_eq!(policy.state, PolicyState::Enabled);
        assert_eq!(policy.source_format, SourceFormat::Json);
        assert_eq!(policy.conditions.users.exclude_groups, vec!["g1"]);
        assert_eq!(policy.conditions.platforms, PlatformConditions::default());
        assert_eq!(policy.conditions.devices.filter_rule, "device.isCompliant -eq True");
        assert_eq!(policy.grant_controls.built_in_controls, vec!["mfa"]);
        assert_eq!(policy.session_controls.sign_in_frequency, Some(4));
        assert_eq!(policy.session_controls.sign_in_frequency_period, "hours");
        assert_eq!(policy.session_controls.persistent_browser_mode, "never");
        assert_eq!(policy.session_controls.cloud_app_security_policy, "monitorOnly");
        assert!(policy.session_controls.application_enforced_restrictions_enabled);
    }

    #[test]
    fn test_pascal_case_keys() {
        let outcome = normalize(
            r#"{"Policies": [{
  "DisplayName": "P",
  "State": "ENABLED",
  "Conditions": {"Users": {"IncludeUsers": ["All"]}}
}]}"#,
        );
        let policy = &outcome.policies[0];
        assert_eq!(policy.state, PolicyState::Enabled);
        assert_eq!(policy.conditions.users.include_users, vec!["All"]);
    }

    #[test]
    fn test_flat_canonical_session_shape() {
        let mut source = CanonicalPolicy::new("Flat", SourceFormat::Json);
        source.session_controls.sign_in_frequency = Some(7);
        source.session_controls.sign_in_frequency_period = "days".to_string();
        source.session_controls.persistent_browser_mode = "always".to_string();
        source.conditions.devices.filter_mode = "include".to_string();
        let json = format!("[{}]", source.to_json().unwrap());

        let policy = &normalize(&json).policies[0];
        assert_eq!(policy.session_controls, source.session_controls);
        assert_eq!(policy.conditions.devices, source.conditions.devices);
    }

    #[test]
    fn test_graph_list_response_shape() {
        let outcome = normalize(r#"{"value": [{"displayName": "A"}, {"displayName": "B"}]}"#);
        assert_eq!(outcome.policies.len(), 2);
        assert!(outcome.tenant_id.is_none());
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let outcome = normalize(
            r#"{"policies": [{"state": "enabled"}, 42, {"displayName": "  "}, {"displayName": "Kept"}]}"#,
        );
        assert_eq!(outcome.policies.len(), 1);
        assert_eq!(outcome.policies[0].display_name, "Kept");
        assert_eq!(outcome.warnings.len(), 3);
        assert_eq!(outcome.warnings[1].record, "policies[1]");
    }

    #[test]
    fn test_normalize_record_directly() {
        let normalizer = JsonNormalizer::new();
        let record: Value = serde_json::json!({"id": "p1", "displayName": "Direct"});
        let policy = normalizer.normalize_record(&record, 0, "export.json").unwrap();
        assert_eq!(policy.id, "p1");
        assert_eq!(policy.source_location, "export.json");

        let warning = normalizer
            .normalize_record(&serde_json::json!([1, 2]), 3, "export.json")
            .unwrap_err();
        assert_eq!(warning.source, "export.json");
        assert_eq!(warning.record, "policies[3]");
        assert_eq!(warning.message, "Policy record #3 is not an object; skipped.");
    }

    #[test]
    fn test_missing_state_and_groups_default() {
        let policy = &normalize(r#"{"policies": [{"displayName": "P", "grantControls": null}]}"#)
            .policies[0];
        assert_eq!(policy.state, PolicyState::Disabled);
        assert_eq!(policy.grant_controls, GrantControls::default());
        assert_eq!(policy.session_controls, SessionControls::default());
    }

    #[test]
    fn test_invalid_json_and_missing_policies() {
        let normalizer = JsonNormalizer::new();
        assert!(matches!(
            normalizer.normalize_str("{not json", "bad.json"),
            Err(CompilerError::InvalidJson { .. })
        ));
        assert!(matches!(
            normalizer.normalize_str(r#"{"tenantId": "x"}"#, "empty.json"),
            Err(CompilerError::MissingPolicies { .. })
        ));
        assert!(matches!(
            normalizer.normalize_str("\"text\"", "scalar.json"),
            Err(CompilerError::MissingPolicies { .. })
        ));
    }
}
