//! Canonical conditional access policy model.
//!
//! Both input formats (the declarative configuration dialect and the
//! directory JSON records) normalize into [`CanonicalPolicy`]. Every nested
//! group is an always-present struct: an absent group on input becomes the
//! group's [`Default`] value, so consumers never deal with missing groups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// Enforcement state of a policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyState {
    /// Policy is enforced.
    Enabled,
    /// Policy is not evaluated.
    #[default]
    Disabled,
    /// Policy is evaluated and logged but not enforced.
    EnabledForReportingButNotEnforced,
}

impl PolicyState {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::EnabledForReportingButNotEnforced => "enabledForReportingButNotEnforced",
        }
    }

    /// Parses a raw state, falling back to [`PolicyState::Disabled`] when the
    /// value is missing or unrecognized.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concord_core::PolicyState;
    ///
    /// assert_eq!(PolicyState::parse_or_default(Some("Enabled")), PolicyState::Enabled);
    /// assert_eq!(PolicyState::parse_or_default(Some("paused")), PolicyState::Disabled);
    /// assert_eq!(PolicyState::parse_or_default(None), PolicyState::Disabled);
    /// ```
    #[must_use]
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for PolicyState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            "enabledforreportingbutnotenforced" => Ok(Self::EnabledForReportingButNotEnforced),
            _ => Err(Error::UnknownState {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PolicyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The textual format a policy was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceFormat {
    /// Directory service JSON record.
    Json,
    /// Declarative configuration dialect.
    Configuration,
}

impl SourceFormat {
    /// Returns the string representation for display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Configuration => "configuration",
        }
    }
}

impl FromStr for SourceFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "configuration" | "config" | "terraform" | "tf" | "hcl" => Ok(Self::Configuration),
            _ => Err(Error::UnknownFormat {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User, group and role targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserConditions {
    /// Users the policy applies to.
    pub include_users: Vec<String>,
    /// Users exempted from the policy.
    pub exclude_users: Vec<String>,
    /// Groups the policy applies to.
    pub include_groups: Vec<String>,
    /// Groups exempted from the policy.
    pub exclude_groups: Vec<String>,
    /// Directory roles the policy applies to.
    pub include_roles: Vec<String>,
    /// Directory roles exempted from the policy.
    pub exclude_roles: Vec<String>,
}

/// Cloud application targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationConditions {
    /// Applications the policy applies to.
    pub include_applications: Vec<String>,
    /// Applications exempted from the policy.
    pub exclude_applications: Vec<String>,
    /// User actions the policy applies to.
    pub include_user_actions: Vec<String>,
}

/// Device platform targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformConditions {
    /// Platforms the policy applies to.
    pub include_platforms: Vec<String>,
    /// Platforms exempted from the policy.
    pub exclude_platforms: Vec<String>,
}

/// Named location targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationConditions {
    /// Locations the policy applies to.
    pub include_locations: Vec<String>,
    /// Locations exempted from the policy.
    pub exclude_locations: Vec<String>,
}

/// Device filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceConditions {
    /// Filter mode (`include` or `exclude`), empty when no filter is set.
    pub filter_mode: String,
    /// Filter rule expression, empty when no filter is set.
    pub filter_rule: String,
}

/// All signal conditions of a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Conditions {
    /// User targeting.
    pub users: UserConditions,
    /// Application targeting.
    pub applications: ApplicationConditions,
    /// Platform targeting.
    pub platforms: PlatformConditions,
    /// Location targeting.
    pub locations: LocationConditions,
    /// Device filter.
    pub devices: DeviceConditions,
    /// Client application types.
    pub client_app_types: Vec<String>,
    /// Sign-in risk levels.
    pub sign_in_risk_levels: Vec<String>,
    /// User risk levels.
    pub user_risk_levels: Vec<String>,
}

/// Controls that must be satisfied to grant access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrantControls {
    /// How controls combine (`AND` / `OR`), empty when unset.
    pub operator: String,
    /// Built-in controls such as `mfa` or `block`.
    pub built_in_controls: Vec<String>,
    /// Custom authentication factor ids.
    pub custom_authentication_factors: Vec<String>,
    /// Terms of use agreement ids.
    pub terms_of_use: Vec<String>,
}

/// Session behaviour applied after access is granted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionControls {
    /// Whether application-enforced restrictions are enabled.
    pub application_enforced_restrictions_enabled: bool,
    /// Cloud app security policy type, empty when unset.
    pub cloud_app_security_policy: String,
    /// Sign-in frequency value.
    pub sign_in_frequency: Option<u32>,
    /// Sign-in frequency unit (`hours` / `days`), empty when unset.
    pub sign_in_frequency_period: String,
    /// Persistent browser session mode, empty when unset.
    pub persistent_browser_mode: String,
    /// Whether resilience defaults are disabled.
    pub disable_resilience_defaults: bool,
}

/// Format-neutral representation of one conditional access policy.
///
/// # Examples
///
/// ```rust
/// use concord_core::{CanonicalPolicy, PolicyState, SourceFormat};
///
/// let policy = CanonicalPolicy::new("Require MFA", SourceFormat::Json)
///     .with_id("0f9c")
///     .with_state(PolicyState::Enabled);
///
/// assert_eq!(policy.display_name, "Require MFA");
/// assert!(policy.conditions.users.include_users.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPolicy {
    /// Directory object id; empty for configuration resources.
    #[serde(default)]
    pub id: String,
    /// Human-readable policy name.
    pub display_name: String,
    /// Enforcement state.
    #[serde(default)]
    pub state: PolicyState,
    /// Signal conditions.
    #[serde(default)]
    pub conditions: Conditions,
    /// Grant controls.
    #[serde(default)]
    pub grant_controls: GrantControls,
    /// Session controls.
    #[serde(default)]
    pub session_controls: SessionControls,
    /// Format the policy was read from.
    pub source_format: SourceFormat,
    /// Where the policy was read from (file, optionally with resource address).
    #[serde(default)]
    pub source_location: String,
}

impl CanonicalPolicy {
    /// Creates a disabled policy with all-default condition and control groups.
    #[must_use]
    pub fn new(display_name: impl Into<String>, source_format: SourceFormat) -> Self {
        Self {
            id: String::new(),
            display_name: display_name.into(),
            state: PolicyState::default(),
            conditions: Conditions::default(),
            grant_controls: GrantControls::default(),
            session_controls: SessionControls::default(),
            source_format,
            source_location: String::new(),
        }
    }

    /// Sets the policy id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the policy state.
    #[must_use]
    pub const fn with_state(mut self, state: PolicyState) -> Self {
        self.state = state;
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source_location(mut self, location: impl Into<String>) -> Self {
        self.source_location = location.into();
        self
    }

    /// Returns the identifier used in logs: the id when present, else the name.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.id.is_empty() {
            &self.display_name
        } else {
            &self.id
        }
    }

    /// Projects the comparable fields into a [`Value`] tree.
    ///
    /// Identity and provenance (`Id`, `SourceFormat`, `SourceLocation`) are
    /// not part of the projection. Keys are PascalCase and appear in schema
    /// order, so difference paths read like `Conditions.Users.IncludeUsers`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let c = &self.conditions;
        let users = Value::map()
            .with("IncludeUsers", &c.users.include_users)
            .with("ExcludeUsers", &c.users.exclude_users)
            .with("IncludeGroups", &c.users.include_groups)
            .with("ExcludeGroups", &c.users.exclude_groups)
            .with("IncludeRoles", &c.users.include_roles)
            .with("ExcludeRoles", &c.users.exclude_roles);
        let applications = Value::map()
            .with("IncludeApplications", &c.applications.include_applications)
            .with("ExcludeApplications", &c.applications.exclude_applications)
            .with("IncludeUserActions", &c.applications.include_user_actions);
        let platforms = Value::map()
            .with("IncludePlatforms", &c.platforms.include_platforms)
            .with("ExcludePlatforms", &c.platforms.exclude_platforms);
        let locations = Value::map()
            .with("IncludeLocations", &c.locations.include_locations)
            .with("ExcludeLocations", &c.locations.exclude_locations);
        let devices = Value::map()
            .with("FilterMode", &c.devices.filter_mode)
            .with("FilterRule", &c.devices.filter_rule);
        let conditions = Value::map()
            .with("Users", users)
            .with("Applications", applications)
            .with("Platforms", platforms)
            .with("Locations", locations)
            .with("Devices", devices)
            .with("ClientAppTypes", &c.client_app_types)
            .with("SignInRiskLevels", &c.sign_in_risk_levels)
            .with("UserRiskLevels", &c.user_risk_levels);

        let g = &self.grant_controls;
        let grant_controls = Value::map()
            .with("Operator", &g.operator)
            .with("BuiltInControls", &g.built_in_controls)
            .with("CustomAuthenticationFactors", &g.custom_authentication_factors)
            .with("TermsOfUse", &g.terms_of_use);

        let s = &self.session_controls;
        let session_controls = Value::map()
            .with(
                "ApplicationEnforcedRestrictionsEnabled",
                s.application_enforced_restrictions_enabled,
            )
            .with("CloudAppSecurityPolicy", &s.cloud_app_security_policy)
            .with("SignInFrequency", s.sign_in_frequency)
            .with("SignInFrequencyPeriod", &s.sign_in_frequency_period)
            .with("PersistentBrowserMode", &s.persistent_browser_mode)
            .with("DisableResilienceDefaults", s.disable_resilience_defaults);

        Value::map()
            .with("DisplayName", &self.display_name)
            .with("State", self.state.as_str())
            .with("Conditions", conditions)
            .with("GrantControls", grant_controls)
            .with("SessionControls", session_controls)
    }

    /// Serializes the policy to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
