//! Structure Guardian - Project layout enforcement keyed by file extension
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Configuration is loaded and compiled once, before any file is examined
//! - Path classification and rule matching are pure domain services
//! - Reporting is a separate concern that only reads the finished report

pub mod analyzer;
pub mod config;
pub mod domain;
pub mod patterns;
pub mod report;

// Re-export main types for convenient access
pub use domain::violations::{
    GuardianError, GuardianResult, ValidationSummary, Violation, ViolationReport,
};

pub use config::{ConfigBuilder, ConfigFormat, PatternRule, RuleConfig, RuleSet, DEFAULT_COMMENT};

pub use patterns::{compile_rules, CompiledRuleSet, CompiledRules, PathClassifier};

pub use analyzer::{CandidateOutcome, StructureValidator};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

use patterns::path_filter::find_candidates;
use std::path::{Path, PathBuf};

/// Main entry point: a loaded configuration with its rules compiled
#[derive(Debug, Clone)]
pub struct StructureGuardian {
    config: RuleConfig,
    rules: CompiledRules,
    report_formatter: ReportFormatter,
}

impl StructureGuardian {
    /// Compile the configuration; any invalid pattern fails here, before any file is touched
    pub fn new_with_config(config: RuleConfig) -> GuardianResult<Self> {
        let rules = compile_rules(&config.rules)?;

        tracing::debug!(
            "Compiled {} pattern(s) across {} extension(s)",
            config.pattern_count(),
            rules.len()
        );

        Ok(Self {
            config,
            rules,
            report_formatter: ReportFormatter::default(),
        })
    }

    /// Load and compile a configuration file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> GuardianResult<Self> {
        let config = RuleConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    /// The configuration this guardian was built from
    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Build a validator whose relative paths are computed against `root`
    pub fn validator(&self, root: Option<PathBuf>) -> StructureValidator {
        let classifier = PathClassifier::new(&self.config.ignore_dirs, root);
        StructureValidator::new(self.rules.clone(), classifier)
    }

    /// Recursively enumerate `root` and validate everything under it
    pub fn validate_directory<P: AsRef<Path>>(&self, root: P) -> ViolationReport {
        let root = root.as_ref();
        let candidates = find_candidates(root);
        self.validate_files(&candidates, Some(root.to_path_buf()))
    }

    /// Validate an explicit list of paths, in the order given
    pub fn validate_files<P: AsRef<Path>>(
        &self,
        files: &[P],
        root: Option<PathBuf>,
    ) -> ViolationReport {
        let mut report = self.validator(root).validate(files);
        report.set_config_fingerprint(self.config.fingerprint());
        report
    }

    /// Classify a single path the way a validation run would
    pub fn explain<P: AsRef<Path>>(&self, path: P, root: Option<PathBuf>) -> CandidateOutcome {
        self.validator(root).classify(path.as_ref())
    }

    /// Format a report using the configured formatter
    pub fn format_report(
        &self,
        report: &ViolationReport,
        format: OutputFormat,
    ) -> GuardianResult<String> {
        self.report_formatter.format_report(report, format)
    }
}
