//! Loading of named policy sources.
//!
//! A [`SourceDocument`] is one input file (configuration text or directory
//! JSON). [`PolicyLoader`] runs the full pipeline for one document: parse,
//! resolve references and normalize for configuration text, or parse and
//! normalize for JSON. Errors are per document so callers can report a bad
//! file and continue with the rest.

use std::fs;
use std::path::Path;

use concord_core::{CanonicalPolicy, SourceFormat};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CompilerError, Result};
use crate::normalizer::{ConfigurationNormalizer, JsonNormalizer, NormalizationWarning};
use crate::parser::ConfigParser;
use crate::resolver::{ReferenceWarning, Resolver};

/// Extensions recognized as configuration text.
pub const CONFIGURATION_EXTENSIONS: &[&str] = &["tf", "hcl"];

/// Extensions recognized as directory JSON.
pub const JSON_EXTENSIONS: &[&str] = &["json"];

/// One named input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Name used in locations and diagnostics (usually the file path).
    pub name: String,
    /// Raw text.
    pub content: String,
    /// Format of the text.
    pub format: SourceFormat,
}

impl SourceDocument {
    /// Creates a document from in-memory text.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>, format: SourceFormat) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            format,
        }
    }

    /// Reads a document from disk, detecting its format from the extension.
    ///
    /// Returns `Ok(None)` for files with an unrecognized extension.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::FileReadError`] if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let Some(format) = detect_format(path) else {
            debug!(?path, "Skipping file with unrecognized extension");
            return Ok(None);
        };

        let content = fs::read_to_string(path).map_err(|e| CompilerError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Some(Self::new(path.to_string_lossy(), content, format)))
    }
}

/// Detects a source format from a file extension.
#[must_use]
pub fn detect_format(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if CONFIGURATION_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceFormat::Configuration)
    } else if JSON_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceFormat::Json)
    } else {
        None
    }
}

/// Policies loaded from one document and the diagnostics produced on the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadedSource {
    /// Document name.
    pub name: String,
    /// Normalized policies in input order.
    pub policies: Vec<CanonicalPolicy>,
    /// Unresolved references (configuration text only).
    pub reference_warnings: Vec<ReferenceWarning>,
    /// Records skipped during normalization.
    pub normalization_warnings: Vec<NormalizationWarning>,
    /// Tenant id declared by a directory JSON export.
    pub tenant_id: Option<String>,
}

/// Runs parse, resolve and normalize for a document.
#[derive(Debug, Clone, Default)]
pub struct PolicyLoader {
    parser: ConfigParser,
    resolver: Resolver,
    configuration: ConfigurationNormalizer,
    json: JsonNormalizer,
}

impl PolicyLoader {
    /// Creates a loader with the default resource type.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom parser (for example, a different resource type).
    #[must_use]
    pub fn with_parser(mut self, parser: ConfigParser) -> Self {
        self.parser = parser;
        self
    }

    /// Loads every policy from a document.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed configuration text, or
    /// [`CompilerError::InvalidJson`] / [`CompilerError::MissingPolicies`]
    /// for unusable JSON. A failed document yields no policies at all.
    pub fn load(&self, document: &SourceDocument) -> Result<LoadedSource> {
        let loaded = match document.format {
            SourceFormat::Configuration => {
                let parsed = self.parser.parse_source(&document.content, &document.name)?;
                let resolution = self.resolver.resolve(parsed);
                let outcome = self
                    .configuration
                    .normalize(&resolution.document, &document.name);
                LoadedSource {
                    name: document.name.clone(),
                    policies: outcome.policies,
                    reference_warnings: resolution.warnings,
                    normalization_warnings: outcome.warnings,
                    tenant_id: None,
                }
            }
            SourceFormat::Json => {
                let outcome = self.json.normalize_str(&document.content, &document.name)?;
                LoadedSource {
                    name: document.name.clone(),
                    policies: outcome.policies,
                    reference_warnings: Vec::new(),
                    normalization_warnings: outcome.warnings,
                    tenant_id: outcome.tenant_id,
                }
            }
        };

        info!(
            source = %document.name,
            format = %document.format,
            policies = loaded.policies.len(),
            "Loaded policy source"
        );
        Ok(loaded)
    }
}
