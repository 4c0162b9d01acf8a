//! Property-based tests for concord-core types.
//!
//! These tests use proptest to verify invariants across many randomly generated inputs.

use proptest::prelude::*;

use crate::{CanonicalPolicy, PolicyState, SourceFormat, Value};

/// Strategy for generating policy display names.
fn display_name_strategy() -> impl Strategy<Value = String> {
    "(Require|Block|Allow) (MFA|legacy auth|guests|admins)( v[0-9])?"
}

/// Strategy for generating user/group identifiers.
fn principal_strategy() -> impl Strategy<Value = String> {
    "(All|None|GuestsOrExternalUsers|[a-f0-9]{8})"
}

/// Strategy for generating policy states.
fn state_strategy() -> impl Strategy<Value = PolicyState> {
    prop_oneof![
        Just(PolicyState::Enabled),
        Just(PolicyState::Disabled),
        Just(PolicyState::EnabledForReportingButNotEnforced),
    ]
}

/// Strategy for generating canonical policies.
fn policy_strategy() -> impl Strategy<Value = CanonicalPolicy> {
    (
        display_name_strategy(),
        state_strategy(),
        prop::collection::vec(principal_strategy(), 0..5),
        prop::collection::vec("(mfa|block|compliantDevice)", 0..3),
        prop::option::of(1u32..48),
    )
        .prop_map(|(name, state, users, controls, frequency)| {
            let mut policy = CanonicalPolicy::new(name, SourceFormat::Json).with_state(state);
            policy.conditions.users.include_users = users;
            policy.grant_controls.built_in_controls = controls;
            policy.session_controls.sign_in_frequency = frequency;
            policy
        })
}

proptest! {
    #[test]
    fn state_round_trips_through_string(state in state_strategy()) {
        let parsed: PolicyState = state.as_str().parse().unwrap();
        prop_assert_eq!(parsed, state);
    }

    #[test]
    fn state_parse_ignores_case(state in state_strategy()) {
        let upper = state.as_str().to_uppercase();
        prop_assert_eq!(PolicyState::parse_or_default(Some(&upper)), state);
    }

    #[test]
    fn projection_shape_is_independent_of_content(policy in policy_strategy()) {
        let value = policy.to_value();
        prop_assert!(value.is_map());
        prop_assert_eq!(value.leaf_count(), 30);
    }

    #[test]
    fn projection_carries_display_name(policy in policy_strategy()) {
        let value = policy.to_value();
        prop_assert_eq!(value.get("DisplayName"), Some(&Value::from(policy.display_name.as_str())));
    }

    #[test]
    fn json_round_trip_preserves_policy(policy in policy_strategy()) {
        let json = policy.to_json().unwrap();
        let back: CanonicalPolicy = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, policy);
    }
}
