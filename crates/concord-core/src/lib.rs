//! # Concord Core
//!
//! Core types for the Concord conditional access policy comparison toolkit.
//!
//! This crate provides the foundational data structures shared by the
//! parsing and comparison crates:
//!
//! - [`CanonicalPolicy`] - Format-neutral policy model both inputs normalize into
//! - [`PolicyState`] / [`SourceFormat`] - Enumerations carried by every policy
//! - [`Value`] - Tagged-union tree used by the structural diff
//!
//! ## Example
//!
//! ```rust
//! use concord_core::{CanonicalPolicy, PolicyState, SourceFormat};
//!
//! let mut policy = CanonicalPolicy::new("Require MFA for admins", SourceFormat::Json)
//!     .with_state(PolicyState::Enabled);
//! policy.grant_controls.built_in_controls.push("mfa".to_string());
//!
//! let tree = policy.to_value();
//! assert!(tree.pointer("GrantControls.BuiltInControls").is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod policy;
pub mod value;

#[cfg(test)]
mod proptest_tests;

// Re-export main types at crate root
pub use error::{Error, Result};
pub use policy::{
    ApplicationConditions, CanonicalPolicy, Conditions, DeviceConditions, GrantControls,
    LocationConditions, PlatformConditions, PolicyState, SessionControls, SourceFormat,
    UserConditions,
};
pub use value::Value;
