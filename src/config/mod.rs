//! Configuration loading and management for Structure Guardian
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external JSON/YAML formats
//! - Raw documents are parsed into permissive DTOs where every field is optional
//! - DTOs are converted into validated domain objects, naming the exact missing key
//! - Extension keys are normalized to lowercase so lookups are case-insensitive

use crate::domain::violations::{GuardianError, GuardianResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Comment used for a pattern that does not describe itself
pub const DEFAULT_COMMENT: &str = "No comment";

/// Structured formats a rule configuration can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from a file name; anything that is not `.yaml`/`.yml` is JSON
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        match extension.as_deref() {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Top-level rule configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Rule sets keyed by lowercase extension (including the leading dot)
    pub rules: IndexMap<String, RuleSet>,
    /// Case-insensitive substrings that exclude any path containing them
    #[serde(default)]
    pub ignore_dirs: Vec<String>,
}

/// Ordered patterns governing one extension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub patterns: Vec<PatternRule>,
}

/// One legal location shape for an extension
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternRule {
    /// Regular expression matched case-insensitively against the whole relative path
    pub pattern: String,
    /// Human-readable description of the expected location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl PatternRule {
    /// Create a pattern without a comment
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            comment: None,
        }
    }

    /// Attach a description of the expected location
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The comment, or the placeholder when none was given
    pub fn comment_or_default(&self) -> &str {
        self.comment.as_deref().unwrap_or(DEFAULT_COMMENT)
    }
}

impl RuleSet {
    /// Create a rule set from patterns
    pub fn new(patterns: Vec<PatternRule>) -> Self {
        Self { patterns }
    }
}

// Raw documents as written by users. Every field is optional so that a missing
// key surfaces as a schema error naming its location instead of a generic
// deserializer message.

#[derive(Debug, Deserialize)]
struct RawConfig {
    rules: Option<IndexMap<String, RawRuleSet>>,
    ignore_dirs: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawRuleSet {
    patterns: Option<Vec<RawPatternRule>>,
}

#[derive(Debug, Deserialize)]
struct RawPatternRule {
    pattern: Option<String>,
    comment: Option<String>,
}

impl RuleConfig {
    /// Load configuration from a JSON or YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GuardianResult<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();

        let contents = fs::read_to_string(path)
            .map_err(|e| GuardianError::config_read(&source, e.to_string()))?;

        let raw = parse_raw(&contents, ConfigFormat::from_path(path), &source)?;
        let config = Self::from_raw(raw)?;

        tracing::debug!(
            "Loaded {} rule set(s) and {} ignore entr(ies) from '{}'",
            config.rules.len(),
            config.ignore_dirs.len(),
            source
        );

        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str, format: ConfigFormat) -> GuardianResult<Self> {
        let raw = parse_raw(content, format, "<inline>")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> GuardianResult<Self> {
        let raw_rules = raw
            .rules
            .ok_or_else(|| GuardianError::schema("missing required key 'rules'"))?;

        let mut entries = Vec::with_capacity(raw_rules.len());

        for (extension, raw_set) in raw_rules {
            let raw_patterns = raw_set.patterns.ok_or_else(|| {
                GuardianError::schema(format!(
                    "missing required key 'patterns' in rules[\"{extension}\"]"
                ))
            })?;

            let patterns = raw_patterns
                .into_iter()
                .enumerate()
                .map(|(index, raw_rule)| -> GuardianResult<PatternRule> {
                    let pattern = raw_rule.pattern.ok_or_else(|| {
                        GuardianError::schema(format!(
                            "missing required key 'pattern' in rules[\"{extension}\"].patterns[{index}]"
                        ))
                    })?;
                    Ok(PatternRule {
                        pattern,
                        comment: raw_rule.comment,
                    })
                })
                .collect::<GuardianResult<Vec<_>>>()?;

            entries.push((extension, RuleSet::new(patterns)));
        }

        Ok(Self {
            rules: normalize_rules(entries)?,
            ignore_dirs: raw.ignore_dirs.unwrap_or_default(),
        })
    }

    /// Rule set for an extension, compared case-insensitively
    pub fn rule_set(&self, extension: &str) -> Option<&RuleSet> {
        self.rules.get(&extension.to_lowercase())
    }

    /// Total number of patterns across all rule sets
    pub fn pattern_count(&self) -> usize {
        self.rules.values().map(|set| set.patterns.len()).sum()
    }

    /// Convert to JSON for serialization
    pub fn to_json(&self) -> GuardianResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GuardianError::schema(format!("Failed to serialize config: {e}")))
    }

    /// Create a fingerprint of the configuration for report traceability
    pub fn fingerprint(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        // Rule order is significant (it drives the expected description), so
        // hash in config order rather than sorting.
        for (extension, rule_set) in &self.rules {
            extension.hash(&mut hasher);
            rule_set.patterns.hash(&mut hasher);
        }

        self.ignore_dirs.hash(&mut hasher);

        format!("{:x}", hasher.finish())
    }
}

fn parse_raw(content: &str, format: ConfigFormat, source: &str) -> GuardianResult<RawConfig> {
    match format {
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| {
            // Well-formed JSON of the wrong shape is a schema problem; anything
            // else means the document could not be read as JSON at all.
            if e.classify() == serde_json::error::Category::Data {
                GuardianError::schema(format!("{source}: {e}"))
            } else {
                GuardianError::config_read(source, e.to_string())
            }
        }),
        ConfigFormat::Yaml => {
            // Same split as JSON: syntax errors surface while building the
            // value tree, shape errors while mapping it onto the raw config.
            let value: serde_yaml::Value = serde_yaml::from_str(content)
                .map_err(|e| GuardianError::config_read(source, e.to_string()))?;
            serde_yaml::from_value(value)
                .map_err(|e| GuardianError::schema(format!("{source}: {e}")))
        }
    }
}

/// Lowercase extension keys, rejecting keys that collide once case is ignored
fn normalize_rules(
    entries: impl IntoIterator<Item = (String, RuleSet)>,
) -> GuardianResult<IndexMap<String, RuleSet>> {
    let mut rules = IndexMap::new();

    for (extension, rule_set) in entries {
        let key = extension.to_lowercase();

        if !key.is_empty() && !key.starts_with('.') {
            tracing::warn!(
                "Rule key '{}' has no leading dot and will never match a file extension",
                extension
            );
        }

        if rule_set.patterns.is_empty() {
            tracing::warn!(
                "Rule set for '{}' has no patterns; every such file will be reported",
                key
            );
        }

        if rules.insert(key.clone(), rule_set).is_some() {
            return Err(GuardianError::schema(format!(
                "duplicate rule key '{extension}' (extension keys are case-insensitive)"
            )));
        }
    }

    Ok(rules)
}

/// Configuration builder for programmatic construction
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    entries: Vec<(String, RuleSet)>,
    ignore_dirs: Vec<String>,
}

impl ConfigBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pattern to an extension's rule set, creating the set on first use
    pub fn add_pattern(mut self, extension: impl Into<String>, rule: PatternRule) -> Self {
        let extension = extension.into();
        match self.entries.iter_mut().find(|(ext, _)| *ext == extension) {
            Some((_, rule_set)) => rule_set.patterns.push(rule),
            None => self.entries.push((extension, RuleSet::new(vec![rule]))),
        }
        self
    }

    /// Add an ignore substring
    pub fn ignore_dir(mut self, dir: impl Into<String>) -> Self {
        self.ignore_dirs.push(dir.into());
        self
    }

    /// Build the final configuration
    pub fn build(self) -> GuardianResult<RuleConfig> {
        Ok(RuleConfig {
            rules: normalize_rules(self.entries)?,
            ignore_dirs: self.ignore_dirs,
        })
    }
}
