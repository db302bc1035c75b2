//! Pattern compilation for per-extension location rules
//!
//! Architectural Principle: Service Layer - Compilation turns configuration into ready matchers
//! - Every pattern is compiled once per run, case-insensitively, anchored to the whole path
//! - A single malformed pattern aborts compilation; there is no partial rule set
//! - Compiled sets are immutable and owned by the validation run that built them

pub mod path_filter;

use crate::config::RuleSet;
use crate::domain::violations::{GuardianError, GuardianResult};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};

pub use path_filter::PathClassifier;

/// Separator placed between comments in an expected-location description
pub const EXPECTED_SEPARATOR: &str = " OR ";

/// A compiled pattern with its description
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    source: String,
    comment: String,
}

impl CompiledPattern {
    /// Whether the pattern consumes the entire path
    pub fn is_full_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The pattern as written in the configuration
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Description of the location this pattern allows
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// All compiled patterns for one extension
#[derive(Debug, Clone)]
pub struct CompiledRuleSet {
    patterns: Vec<CompiledPattern>,
    expected: String,
}

impl CompiledRuleSet {
    /// Index of the first pattern that fully matches `path`
    pub fn find_match(&self, path: &str) -> Option<usize> {
        self.patterns.iter().position(|p| p.is_full_match(path))
    }

    /// Whether any pattern fully matches `path`
    pub fn matches(&self, path: &str) -> bool {
        self.find_match(path).is_some()
    }

    /// Comments of every pattern, in rule order, joined with " OR "
    pub fn expected_description(&self) -> &str {
        &self.expected
    }

    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }
}

/// Compiled rule sets keyed by lowercase extension
pub type CompiledRules = IndexMap<String, CompiledRuleSet>;

/// Compile a single pattern with full-match, case-insensitive semantics
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    // The bare pattern must be valid on its own; otherwise an unbalanced `)`
    // could close the wrapping group and leave part of it unanchored.
    build_case_insensitive(pattern)?;

    // \A and \z anchor to the very start and end of the input, so the pattern
    // must consume the whole path. The group keeps alternations inside the anchors.
    build_case_insensitive(&format!(r"\A(?:{pattern})\z"))
}

fn build_case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Compile every rule set, failing on the first invalid pattern
pub fn compile_rules<'a, I>(rules: I) -> GuardianResult<CompiledRules>
where
    I: IntoIterator<Item = (&'a String, &'a RuleSet)>,
{
    let mut compiled = IndexMap::new();

    for (extension, rule_set) in rules {
        let patterns = rule_set
            .patterns
            .iter()
            .map(|rule| -> GuardianResult<CompiledPattern> {
                tracing::debug!(
                    "Compiling pattern '{}' for extension '{}'",
                    rule.pattern,
                    extension
                );

                let regex = compile_pattern(&rule.pattern).map_err(|e| {
                    GuardianError::invalid_pattern(extension, &rule.pattern, e.to_string())
                })?;

                Ok(CompiledPattern {
                    regex,
                    source: rule.pattern.clone(),
                    comment: rule.comment_or_default().to_string(),
                })
            })
            .collect::<GuardianResult<Vec<_>>>()?;

        let expected = patterns
            .iter()
            .map(CompiledPattern::comment)
            .collect::<Vec<_>>()
            .join(EXPECTED_SEPARATOR);

        compiled.insert(
            extension.to_lowercase(),
            CompiledRuleSet { patterns, expected },
        );
    }

    Ok(compiled)
}
