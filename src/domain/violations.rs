//! Core domain models for structure violations and validation results
//!
//! Architecture: Rich Domain Models - Violations are entities with behavior, not just data
//! - A violation knows its own path and where the file was expected to live
//! - ViolationReport acts as an aggregate root grouping violations by extension
//! - Grouping preserves discovery order so output is deterministic

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A file whose relative path matched none of its extension's patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Normalized, slash-separated path the patterns were matched against
    pub path: String,
    /// Lowercase extension including the leading dot (may be empty)
    pub extension: String,
    /// Comments of every pattern in the rule set, joined with " OR "
    pub expected: String,
}

impl Violation {
    /// Create a new violation
    pub fn new(
        path: impl Into<String>,
        extension: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            extension: extension.into(),
            expected: expected.into(),
        }
    }

    /// Format violation for display
    pub fn format_display(&self) -> String {
        format!("{} (expected: {})", self.path, self.expected)
    }
}

/// Summary statistics for a validation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Number of candidate paths handed to the validator
    pub total_candidates: usize,
    /// Regular files whose extension had a rule set and were matched
    pub files_checked: usize,
    /// Regular files excluded by an ignore entry
    pub files_ignored: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when validation was performed
    pub validated_at: DateTime<Utc>,
}

/// Violations grouped by extension, in discovery order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationReport {
    /// Extension -> violations, both keys and values in discovery order
    pub violations: IndexMap<String, Vec<Violation>>,
    /// Summary statistics
    pub summary: ValidationSummary,
    /// Fingerprint of the configuration used for this run
    pub config_fingerprint: Option<String>,
}

impl ViolationReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            violations: IndexMap::new(),
            summary: ValidationSummary {
                validated_at: Utc::now(),
                ..Default::default()
            },
            config_fingerprint: None,
        }
    }

    /// Append a violation under its extension
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations
            .entry(violation.extension.clone())
            .or_default()
            .push(violation);
    }

    /// Whether the report contains any violations. This is the pass/fail signal.
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Total number of violations across all extensions
    pub fn total_violations(&self) -> usize {
        self.violations.values().map(Vec::len).sum()
    }

    /// Violations recorded for one extension
    pub fn violations_for(&self, extension: &str) -> &[Violation] {
        self.violations
            .get(extension)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterate every violation, grouped by extension, in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.values().flatten()
    }

    /// Set the execution time
    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Set the configuration fingerprint
    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }

    /// Process exit code for this report: 0 when clean, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        i32::from(self.has_violations())
    }
}

impl Default for ViolationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur while loading rules or producing a report
#[derive(Debug, thiserror::Error)]
pub enum GuardianError {
    /// Configuration file missing, unreadable, or not valid structured data
    #[error("Failed to read config '{path}': {message}")]
    ConfigRead { path: String, message: String },

    /// Configuration parsed but its shape is wrong
    #[error("Invalid configuration: {message}")]
    ConfigSchema { message: String },

    /// A rule pattern failed to compile
    #[error("Invalid pattern '{pattern}' for extension '{extension}': {message}")]
    InvalidPattern {
        extension: String,
        pattern: String,
        message: String,
    },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Report could not be rendered
    #[error("Report error: {message}")]
    Report { message: String },
}

impl GuardianError {
    /// Create a config read error
    pub fn config_read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a config schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::ConfigSchema {
            message: message.into(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(
        extension: impl Into<String>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidPattern {
            extension: extension.into(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a report error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report {
            message: message.into(),
        }
    }

    /// Whether this error comes from a bad or unreadable configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigRead { .. } | Self::ConfigSchema { .. } | Self::InvalidPattern { .. }
        )
    }
}

/// Result type for Guardian operations
pub type GuardianResult<T> = Result<T, GuardianError>;
