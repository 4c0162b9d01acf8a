//! Comparison report rendering.

use std::fmt::Write as FmtWrite;
use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;

use concord_compare::{ComparisonPair, ComparisonReport, PairStatus};

/// Trait for rendering comparison reports.
pub trait Renderer {
    /// Writes the report to `out`.
    ///
    /// # Errors
    ///
    /// Returns an IO error if writing fails.
    fn render(&self, report: &ComparisonReport, out: &mut dyn Write) -> io::Result<()>;
}

/// Human-readable console renderer.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    use_colors: bool,
}

impl ConsoleRenderer {
    /// Creates a console renderer with colors enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self { use_colors: true }
    }

    /// Sets whether to use colors.
    #[must_use]
    pub const fn with_colors(mut self, colors: bool) -> Self {
        self.use_colors = colors;
        self
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("\x1b[{color}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn format_pair(&self, pair: &ComparisonPair) -> String {
        let (marker, color) = match pair.status {
            PairStatus::Identical => ("✓", "32"),
            PairStatus::SemanticallyEquivalent => ("≈", "36"),
            PairStatus::Different => ("✗", "31"),
            PairStatus::SourceOnly => ("+", "33"),
            PairStatus::ReferenceOnly => ("-", "33"),
        };

        let mut line = format!("{} {} [{}]", self.paint(marker, color), pair.name(), pair.status);
        if let Some(score) = pair.similarity_score {
            let _ = write!(line, " (similarity {score:.2})");
        }

        for difference in pair.differences.iter().flatten() {
            let _ = write!(
                line,
                "\n    {}: {} -> {}",
                difference.path, difference.before, difference.after
            );
        }
        for suggestion in &pair.conversion_suggestions {
            let _ = write!(line, "\n    hint: {suggestion}");
        }
        line
    }

    fn format_summary(&self, report: &ComparisonReport) -> String {
        let summary = &report.summary;
        let status = if summary.all_in_sync() {
            self.paint("IN SYNC", "32")
        } else {
            self.paint("OUT OF SYNC", "31")
        };

        format!(
            "\n{status}: {} identical, {} equivalent, {} different, {} source only, {} reference only ({} source, {} reference policies, match rate {:.0}%)",
            summary.identical,
            summary.semantically_equivalent,
            summary.different,
            summary.source_only,
            summary.reference_only,
            summary.total_source_policies,
            summary.total_reference_policies,
            summary.match_rate * 100.0
        )
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&self, report: &ComparisonReport, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "\nPolicy Comparison ({}):", report.options.strategy)?;
        writeln!(out, "{}", "─".repeat(60))?;

        for pair in &report.pairs {
            writeln!(out, "{}", self.format_pair(pair))?;
        }

        if !report.errors.is_empty() || !report.warnings.is_empty() {
            writeln!(out, "{}", "─".repeat(60))?;
        }
        for error in &report.errors {
            writeln!(out, "{} {}: {}", self.paint("error", "31"), error.source, error.message)?;
        }
        for warning in &report.warnings {
            writeln!(
                out,
                "{} {}: {}",
                self.paint("warning", "33"),
                warning.resource,
                warning.message
            )?;
        }

        writeln!(out, "{}", "─".repeat(60))?;
        writeln!(out, "{}", self.format_summary(report))?;
        Ok(())
    }
}

/// JSON renderer; wraps the report with generation metadata.
#[derive(Debug, Default)]
pub struct JsonRenderer {
    pretty: bool,
}

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    tool: &'static str,
    version: &'static str,
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a ComparisonReport,
}

impl JsonRenderer {
    /// Creates a compact JSON renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to pretty-print.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, report: &ComparisonReport, out: &mut dyn Write) -> io::Result<()> {
        let envelope = JsonEnvelope {
            tool: "concord",
            version: env!("CARGO_PKG_VERSION"),
            generated_at: Utc::now(),
            report,
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&envelope)
        } else {
            serde_json::to_string(&envelope)
        }
        .map_err(io::Error::other)?;

        writeln!(out, "{json}")
    }
}
