//! Report generation with multiple output formats
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - ViolationReport (domain) is converted to human, JSON or CI annotation output
//! - Each formatter encapsulates the rules for its specific output format
//! - Grouping and ordering come from the report itself; formatters never reorder

use crate::domain::violations::{GuardianError, GuardianResult, Violation, ViolationReport};
use serde_json::Value as JsonValue;
use std::io::Write;

#[cfg(feature = "colors")]
use colored::Colorize;

/// Line printed when no violations were found
pub const SUCCESS_MESSAGE: &str = "All files comply with the rules";

/// Supported output formats for validation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Expected location followed by the offending paths
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// GitHub Actions workflow annotations
    GitHub,
}

impl OutputFormat {
    /// Parse format from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "github" => Some(Self::GitHub),
            _ => None,
        }
    }

    /// Get all available format names
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "github"]
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

/// Main report formatter that dispatches to specific formatters
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format a report in the specified format
    pub fn format_report(
        &self,
        report: &ViolationReport,
        format: OutputFormat,
    ) -> GuardianResult<String> {
        match format {
            OutputFormat::Human => Ok(self.format_human(report)),
            OutputFormat::Json => self.format_json(report),
            OutputFormat::GitHub => Ok(self.format_github(report)),
        }
    }

    /// Write a formatted report to a writer
    pub fn write_report<W: Write>(
        &self,
        report: &ViolationReport,
        format: OutputFormat,
        mut writer: W,
    ) -> GuardianResult<()> {
        let formatted = self.format_report(report, format)?;
        writer.write_all(formatted.as_bytes())?;
        Ok(())
    }

    /// For each extension: the expected description, a blank line, then each path indented
    fn format_human(&self, report: &ViolationReport) -> String {
        if !report.has_violations() {
            return format!("{}\n", self.paint_success(SUCCESS_MESSAGE));
        }

        let mut output = String::new();

        for violations in report.violations.values() {
            let Some(first) = violations.first() else {
                continue;
            };

            output.push_str(&self.paint_expected(&first.expected));
            output.push_str("\n\n");

            for violation in violations {
                output.push_str("    ");
                output.push_str(&self.paint_path(&violation.path));
                output.push('\n');
            }
        }

        output
    }

    /// Format report in JSON format
    fn format_json(&self, report: &ViolationReport) -> GuardianResult<String> {
        let groups: Vec<JsonValue> = report
            .violations
            .iter()
            .map(|(extension, violations)| {
                serde_json::json!({
                    "extension": extension,
                    "expected": violations.first().map(|v| v.expected.as_str()),
                    "paths": violations.iter().map(|v| v.path.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect();

        let json_report = serde_json::json!({
            "passed": !report.has_violations(),
            "violations": groups,
            "summary": {
                "total_candidates": report.summary.total_candidates,
                "files_checked": report.summary.files_checked,
                "files_ignored": report.summary.files_ignored,
                "total_violations": report.total_violations(),
                "execution_time_ms": report.summary.execution_time_ms,
                "validated_at": report.summary.validated_at.to_rfc3339()
            },
            "config_fingerprint": report.config_fingerprint
        });

        serde_json::to_string_pretty(&json_report)
            .map_err(|e| GuardianError::report(format!("JSON serialization failed: {e}")))
    }

    /// Format report for GitHub Actions
    fn format_github(&self, report: &ViolationReport) -> String {
        report.iter().map(github_annotation).collect()
    }

    fn paint_expected(&self, text: &str) -> String {
        #[cfg(feature = "colors")]
        if self.options.use_colors {
            return text.yellow().bold().to_string();
        }
        text.to_string()
    }

    fn paint_path(&self, text: &str) -> String {
        #[cfg(feature = "colors")]
        if self.options.use_colors {
            return text.red().to_string();
        }
        text.to_string()
    }

    fn paint_success(&self, text: &str) -> String {
        #[cfg(feature = "colors")]
        if self.options.use_colors {
            return text.green().to_string();
        }
        text.to_string()
    }
}

fn github_annotation(violation: &Violation) -> String {
    format!(
        "::error file={},title=Misplaced {} file::Expected: {}\n",
        escape_property(&violation.path),
        escape_property(display_extension(&violation.extension)),
        escape_data(&violation.expected)
    )
}

fn display_extension(extension: &str) -> &str {
    if extension.is_empty() {
        "extensionless"
    } else {
        extension
    }
}

/// Escape a workflow command message
fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a workflow command property value
fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
