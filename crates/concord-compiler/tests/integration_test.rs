//! Integration tests for loading policies from both source formats.

use concord_compiler::{
    CompilerError, ConfigParser, ConfigurationNormalizer, JsonNormalizer, PolicyLoader,
    ReferenceKind, Resolver, SourceDocument,
};
use concord_core::{PolicyState, SourceFormat};

const BASELINE: &str = r#"
# Baseline policies for the production tenant.
variable "report_only" {
  type    = string
  default = "enabledForReportingButNotEnforced"
}

locals {
  break_glass = ["00000000-0000-0000-0000-00000000b001"]
}

data "azuread_group" "admins" {
  display_name = "Tenant Admins"
}

resource "azuread_conditional_access_policy" "mfa_admins" {
  display_name = "Require MFA for admins"
  state        = "enabled"

  conditions {
    client_app_types = ["all"]
    applications {
      included_applications = ["All"]
    }
    users {
      included_groups = [data.azuread_group.admins.object_id]
      excluded_users  = local.break_glass
    }
  }

  grant_controls {
    operator          = "OR"
    built_in_controls = ["mfa"]
  }
}

resource "azuread_conditional_access_policy" "legacy_auth" {
  display_name = "Block legacy authentication"
  state        = var.report_only

  conditions {
    client_app_types = ["exchangeActiveSync", "other"]
    applications {
      included_applications = ["All"]
    }
    users {
      included_users = ["All"]
    }
  }

  grant_controls {
    operator          = "OR"
    built_in_controls = ["block"]
  }
}

resource "azuread_named_location" "office" {
  display_name = "Office"
}
"#;

// =============================================================================
// Configuration Pipeline Tests
// =============================================================================

#[test]
fn test_configuration_pipeline() {
    let document = ConfigParser::new().parse_source(BASELINE, "baseline.tf").unwrap();
    assert_eq!(document.resources.len(), 2);
    assert_eq!(document.data_sources.len(), 1);
    assert_eq!(
        document.data_sources[0].accessed_paths,
        vec!["data.azuread_group.admins.object_id"]
    );

    let resolution = Resolver::new().resolve(document);
    assert_eq!(resolution.warnings.len(), 1);
    assert_eq!(resolution.warnings[0].kind, ReferenceKind::DataSource);

    let outcome = ConfigurationNormalizer::new().normalize(&resolution.document, "baseline.tf");
    assert!(outcome.warnings.is_empty());

    let names: Vec<_> = outcome.policies.iter().map(|p| p.display_name.as_str()).collect();
    assert_eq!(names, vec!["Require MFA for admins", "Block legacy authentication"]);

    let legacy = &outcome.policies[1];
    assert_eq!(legacy.state, PolicyState::EnabledForReportingButNotEnforced);

    let mfa = &outcome.policies[0];
    assert_eq!(
        mfa.conditions.users.exclude_users,
        vec!["00000000-0000-0000-0000-00000000b001"]
    );
    assert_eq!(
        mfa.conditions.users.include_groups,
        vec!["data.azuread_group.admins.object_id"]
    );
}

#[test]
fn test_name_and_state_survive_every_state() {
    for state in [
        PolicyState::Enabled,
        PolicyState::Disabled,
        PolicyState::EnabledForReportingButNotEnforced,
    ] {
        let source = format!(
            r#"resource "azuread_conditional_access_policy" "p" {{
  display_name = "Policy \"quoted\" name"
  state        = "{state}"
}}"#
        );
        let doc = SourceDocument::new("p.tf", source, SourceFormat::Configuration);
        let loaded = PolicyLoader::new().load(&doc).unwrap();
        assert_eq!(loaded.policies[0].display_name, "Policy \"quoted\" name");
        assert_eq!(loaded.policies[0].state, state);
    }
}

#[test]
fn test_missing_variable_reports_exactly_one_warning() {
    let doc = SourceDocument::new(
        "p.tf",
        r#"resource "azuread_conditional_access_policy" "p" {
  display_name = "P"
  state        = var.missing_var
}"#,
        SourceFormat::Configuration,
    );
    let loaded = PolicyLoader::new().load(&doc).unwrap();
    assert_eq!(loaded.reference_warnings.len(), 1);
    assert!(loaded.reference_warnings[0].message.contains("missing_var"));
    assert_eq!(loaded.policies[0].state, PolicyState::Disabled);
}

#[test]
fn test_unbalanced_braces_yield_no_policies() {
    let source = BASELINE.replacen("grant_controls {", "grant_controls {{", 1);
    let err = ConfigParser::new().parse_source(&source, "broken.tf").unwrap_err();
    assert!(matches!(err, CompilerError::ParseError { .. }));
    assert!(err.to_string().starts_with("Parse error in broken.tf at line"));
}

// =============================================================================
// JSON Pipeline Tests
// =============================================================================

#[test]
fn test_json_export_matches_configuration_model() {
    let json = r#"{
  "tenantId": "contoso",
  "policies": [{
    "id": "11111111-2222-3333-4444-555555555555",
    "displayName": "Block legacy authentication",
    "state": "enabledForReportingButNotEnforced",
    "conditions": {
      "clientAppTypes": ["exchangeActiveSync", "other"],
      "applications": {"includeApplications": ["All"]},
      "users": {"includeUsers": ["All"]}
    },
    "grantControls": {"operator": "OR", "builtInControls": ["block"]},
    "sessionControls": null
  }]
}"#;
    let from_json = JsonNormalizer::new().normalize_str(json, "export.json").unwrap();
    let document = ConfigParser::new().parse_source(BASELINE, "baseline.tf").unwrap();
    let resolved = Resolver::new().resolve(document).document;
    let from_config = ConfigurationNormalizer::new().normalize(&resolved, "baseline.tf");

    let json_policy = &from_json.policies[0];
    let config_policy = &from_config.policies[1];
    assert_eq!(json_policy.display_name, config_policy.display_name);
    assert_eq!(json_policy.state, config_policy.state);
    assert_eq!(json_policy.conditions, config_policy.conditions);
    assert_eq!(json_policy.grant_controls, config_policy.grant_controls);
    assert_eq!(json_policy.session_controls, config_policy.session_controls);
}
