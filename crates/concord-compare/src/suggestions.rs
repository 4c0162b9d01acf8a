//! Conversion suggestions for cross-format differences.
//!
//! Some differences between a configuration resource and a directory record
//! are representational rather than real: casing conventions, how sign-in
//! frequency is expressed, group references that only resolve to object ids
//! in the directory. Each known mismatch is a path prefix with a hint; paths
//! not in the table get no hint.

use crate::diff::DifferenceEntry;

const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "DisplayName",
        "Display names differ in formatting; align spacing and punctuation of display_name with the directory policy name.",
    ),
    (
        "State",
        "State differs; set state to \"enabled\", \"disabled\" or \"enabledForReportingButNotEnforced\" to match the directory.",
    ),
    (
        "GrantControls.Operator",
        "Grant control operator differs; the directory stores \"AND\"/\"OR\" in upper case.",
    ),
    (
        "GrantControls.BuiltInControls",
        "Built-in controls are stored in order; list built_in_controls in the same order as the directory.",
    ),
    (
        "Conditions.ClientAppTypes",
        "Client app types differ; the directory may expand \"all\" into explicit client app types.",
    ),
    (
        "Conditions.Users",
        "User targeting differs; group and role references from data sources resolve to object ids only in the directory.",
    ),
    (
        "Conditions.Devices",
        "Device filter differs; configuration expresses it as devices.filter { mode, rule }.",
    ),
    (
        "SessionControls.SignInFrequency",
        "Sign-in frequency is {value, type} in the directory and sign_in_frequency/sign_in_frequency_period in configuration.",
    ),
    (
        "SessionControls.PersistentBrowserMode",
        "Persistent browser session is persistentBrowser.mode in the directory and persistent_browser_mode in configuration.",
    ),
    (
        "SessionControls.CloudAppSecurityPolicy",
        "Cloud app security is cloudAppSecurity.cloudAppSecurityType in the directory and cloud_app_security_policy in configuration.",
    ),
];

/// Returns suggestions for the differences, in order of first occurrence.
#[must_use]
pub fn conversion_suggestions(differences: &[DifferenceEntry]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for difference in differences {
        let Some((_, hint)) = SUGGESTIONS
            .iter()
            .find(|(prefix, _)| difference.path.starts_with(prefix))
        else {
            continue;
        };
        if !out.iter().any(|s| s == hint) {
            out.push((*hint).to_string());
        }
    }
    out
}
