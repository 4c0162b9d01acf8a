//! Compare command implementation.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};
use walkdir::WalkDir;

use concord_compare::{
    Comparator, ComparisonReport, MatchingOptions, MatchingStrategy, RunError, RunErrorKind,
};
use concord_compiler::SourceDocument;

use crate::render::{ConsoleRenderer, JsonRenderer, Renderer};

/// Arguments for the compare command.
#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct CompareArgs {
    /// Source policies: a file or directory (.tf and .json files)
    #[arg(short, long)]
    pub source: PathBuf,

    /// Reference policies: a file or directory (.tf and .json files)
    #[arg(short, long)]
    pub reference: PathBuf,

    /// Output format (console, json)
    #[arg(short, long, default_value = "console")]
    pub format: String,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Matching options file (YAML or JSON)
    #[arg(short, long, env = "CONCORD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Matching strategy (by-id, by-name, custom-mapping, semantic-similarity)
    #[arg(long)]
    pub strategy: Option<MatchingStrategy>,

    /// Compare ids and display names case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Similarity threshold for semantic equivalence (0 to 1)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Disable semantic scoring of cross-format differences
    #[arg(long)]
    pub no_semantic: bool,

    /// Custom mapping entry SOURCE=REFERENCE (repeatable)
    #[arg(long = "map", value_name = "SOURCE=REFERENCE")]
    pub mappings: Vec<String>,

    /// Exit with an error when any policy is out of sync
    #[arg(long)]
    pub fail_on_diff: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Runs the compare command.
pub fn run(args: &CompareArgs) -> Result<()> {
    info!(source = ?args.source, reference = ?args.reference, "Comparing policies");

    let options = load_options(args)?;
    let comparator = Comparator::new(options)?;

    let mut read_errors = Vec::new();
    let sources = collect_documents(&args.source, &mut read_errors)?;
    let references = collect_documents(&args.reference, &mut read_errors)?;

    let mut report = comparator.compare_documents(&sources, &references);
    read_errors.append(&mut report.errors);
    report.errors = read_errors;

    write_report(args, &report)?;

    if args.fail_on_diff && report.has_differences() {
        let summary = &report.summary;
        anyhow::bail!(
            "{} policies out of sync ({} different, {} source only, {} reference only)",
            summary.different + summary.source_only + summary.reference_only,
            summary.different,
            summary.source_only,
            summary.reference_only
        );
    }
    Ok(())
}

/// Builds matching options from the config file and command-line overrides.
fn load_options(args: &CompareArgs) -> Result<MatchingOptions> {
    let mut options = match &args.config {
        Some(path) => read_options_file(path)?,
        None => MatchingOptions::default(),
    };

    if let Some(strategy) = args.strategy {
        options.strategy = strategy;
    }
    if args.case_sensitive {
        options.case_sensitive = true;
    }
    if let Some(threshold) = args.threshold {
        options.similarity_threshold = threshold;
    }
    if args.no_semantic {
        options.enable_semantic_comparison = false;
    }
    for entry in &args.mappings {
        let (source, reference) = entry
            .split_once('=')
            .with_context(|| format!("Invalid mapping '{entry}', expected SOURCE=REFERENCE"))?;
        options
            .custom_mappings
            .insert(source.trim().to_string(), reference.trim().to_string());
    }

    options.validate()?;
    Ok(options)
}

fn read_options_file(path: &Path) -> Result<MatchingOptions> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let options = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid options file {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid options file {}", path.display()))?
    };
    Ok(options)
}

/// Reads every recognized policy file under `path`, sorted by path.
///
/// Files that cannot be read are recorded in `errors` and skipped.
fn collect_documents(path: &Path, errors: &mut Vec<RunError>) -> Result<Vec<SourceDocument>> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        match SourceDocument::from_path(entry.path()) {
            Ok(Some(document)) => documents.push(document),
            Ok(None) => {}
            Err(e) => {
                warn!(path = ?entry.path(), error = %e, "Skipping unreadable file");
                errors.push(RunError::new(
                    entry.path().display().to_string(),
                    RunErrorKind::InvalidInput,
                    e.to_string(),
                ));
            }
        }
    }

    info!(path = ?path, documents = documents.len(), "Collected policy sources");
    Ok(documents)
}

fn write_report(args: &CompareArgs, report: &ComparisonReport) -> Result<()> {
    let renderer: Box<dyn Renderer> = match args.format.as_str() {
        "console" => Box::new(
            ConsoleRenderer::new().with_colors(!args.no_color && args.output.is_none()),
        ),
        "json" => Box::new(JsonRenderer::new().with_pretty(true)),
        other => anyhow::bail!("Unknown output format '{other}' (expected console or json)"),
    };

    match &args.output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            renderer.render(report, &mut file)?;
            file.flush()?;
            info!(output = ?path, "Wrote comparison report");
        }
        None => {
            let mut stdout = io::stdout().lock();
            renderer.render(report, &mut stdout)?;
        }
    }
    Ok(())
}
