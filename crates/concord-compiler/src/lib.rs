//! # Concord Compiler
//!
//! Reads conditional access policies from their two source formats and
//! normalizes them into [`CanonicalPolicy`](concord_core::CanonicalPolicy).
//!
//! This crate provides functionality for:
//!
//! - Parsing the declarative configuration dialect (blocks, attributes,
//!   lists, object literals, comments and references)
//! - Resolving `var.` and `local.` references, with warnings for anything
//!   that cannot be resolved statically
//! - Normalizing configuration resources and directory JSON records
//! - Loading named documents end to end
//!
//! ## Example
//!
//! ```rust
//! use concord_compiler::{ConfigParser, ConfigurationNormalizer, Resolver};
//!
//! let source = r#"
//! variable "state" { default = "enabled" }
//! resource "azuread_conditional_access_policy" "mfa" {
//!   display_name = "Require MFA"
//!   state        = var.state
//! }
//! "#;
//!
//! let document = ConfigParser::new().parse_source(source, "main.tf").unwrap();
//! let resolution = Resolver::new().resolve(document);
//! let outcome = ConfigurationNormalizer::new().normalize(&resolution.document, "main.tf");
//! assert_eq!(outcome.policies[0].display_name, "Require MFA");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod document;
pub mod error;
mod lexer;
pub mod loader;
pub mod normalizer;
pub mod parser;
pub mod resolver;


pub use document::{
    Attribute, AttributeValue, Block, Body, ConfigurationDocument, DataSourceReference,
    LocalDefinition, ResourceBlock, VariableDefinition, POLICY_RESOURCE_TYPE,
};
pub use error::{CompilerError, Result};
pub use loader::{detect_format, LoadedSource, PolicyLoader, SourceDocument};
pub use normalizer::{
    ConfigurationNormalizer, JsonNormalizer, NormalizationWarning, NormalizeOutcome,
};
pub use parser::ConfigParser;
pub use resolver::{ReferenceKind, ReferenceWarning, Resolution, Resolver};
