//! Parse command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::info;

use concord_compiler::{
    ConfigParser, ConfigurationDocument, ConfigurationNormalizer, NormalizationWarning,
    ReferenceWarning, Resolver,
};
use concord_core::CanonicalPolicy;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Configuration file to parse
    pub path: PathBuf,

    /// Resource type to retain
    #[arg(long)]
    pub resource_type: Option<String>,

    /// Also print the normalized policies
    #[arg(short, long)]
    pub normalize: bool,
}

#[derive(Serialize)]
struct ParseOutput {
    document: ConfigurationDocument,
    warnings: Vec<ReferenceWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    policies: Option<Vec<CanonicalPolicy>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<NormalizationWarning>,
}

/// Runs the parse command.
pub fn run(args: &ParseArgs) -> Result<()> {
    let output = parse(args)?;
    let json = serde_json::to_string_pretty(&output)?;
    writeln!(io::stdout().lock(), "{json}")?;
    Ok(())
}

fn parse(args: &ParseArgs) -> Result<ParseOutput> {
    info!(path = ?args.path, "Parsing configuration");

    let mut parser = ConfigParser::new();
    if let Some(resource_type) = &args.resource_type {
        parser = parser.with_resource_type(resource_type);
    }

    let document = parser.parse_file(&args.path)?;
    let resolution = Resolver::new().resolve(document);

    let (policies, skipped) = if args.normalize {
        let outcome = ConfigurationNormalizer::new()
            .normalize(&resolution.document, &args.path.to_string_lossy());
        (Some(outcome.policies), outcome.warnings)
    } else {
        (None, Vec::new())
    };

    Ok(ParseOutput {
        document: resolution.document,
        warnings: resolution.warnings,
        policies,
        skipped,
    })
}
