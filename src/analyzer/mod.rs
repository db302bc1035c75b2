//! Structure validation: the per-file match/report algorithm
//!
//! CDD Principle: Domain Services - The validator folds candidate paths into a report
//! - Each candidate is classified independently: not a file, ignored, ungoverned, compliant, or violating
//! - Every candidate is visited; violations accumulate and never stop the run
//! - Violation order within an extension is the order candidates were supplied

use crate::domain::violations::{Violation, ViolationReport};
use crate::patterns::path_filter::{file_extension, PathClassifier};
use crate::patterns::CompiledRules;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

/// Decision reached for a single candidate path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// Directory, dangling symlink, special file, or unreadable metadata
    NotAFile,
    /// Path contains an ignore entry
    Ignored,
    /// No rule set exists for the file's extension
    Ungoverned { extension: String },
    /// The relative path fully matched the pattern at `pattern_index`
    Compliant {
        extension: String,
        relative_path: String,
        pattern_index: usize,
    },
    /// The relative path matched none of the extension's patterns
    Violation(Violation),
}

/// Validates candidate paths against compiled rules
#[derive(Debug, Clone)]
pub struct StructureValidator {
    rules: CompiledRules,
    classifier: PathClassifier,
}

impl StructureValidator {
    /// Create a validator that owns the compiled rules for this run
    pub fn new(rules: CompiledRules, classifier: PathClassifier) -> Self {
        Self { rules, classifier }
    }

    /// Decide what a single candidate path is
    pub fn classify(&self, path: &Path) -> CandidateOutcome {
        classify(path, &self.rules, &self.classifier)
    }

    /// Classify every candidate, in order, and collect the violations
    pub fn validate<P: AsRef<Path>>(&self, candidates: &[P]) -> ViolationReport {
        validate(candidates, &self.rules, &self.classifier)
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    pub fn classifier(&self) -> &PathClassifier {
        &self.classifier
    }
}

/// Whether the path is a regular file (symlinks are followed).
///
/// Missing paths are skipped quietly; other metadata failures are logged and skipped.
fn is_regular_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Skipping {}: not found", path.display());
            false
        }
        Err(e) => {
            tracing::warn!("Skipping {}: cannot read metadata: {}", path.display(), e);
            false
        }
    }
}

/// Decide what a single candidate path is
pub fn classify(path: &Path, rules: &CompiledRules, classifier: &PathClassifier) -> CandidateOutcome {
    if !is_regular_file(path) {
        return CandidateOutcome::NotAFile;
    }

    if classifier.is_ignored(path) {
        return CandidateOutcome::Ignored;
    }

    let extension = file_extension(path);
    let Some(rule_set) = rules.get(&extension) else {
        return CandidateOutcome::Ungoverned { extension };
    };

    let relative_path = classifier.to_relative_posix(path);

    match rule_set.find_match(&relative_path) {
        Some(pattern_index) => CandidateOutcome::Compliant {
            extension,
            relative_path,
            pattern_index,
        },
        None => CandidateOutcome::Violation(Violation::new(
            relative_path,
            extension,
            rule_set.expected_description(),
        )),
    }
}

/// Classify every candidate, in order, and collect the violations
pub fn validate<P: AsRef<Path>>(
    candidates: &[P],
    rules: &CompiledRules,
    classifier: &PathClassifier,
) -> ViolationReport {
    let start_time = Instant::now();
    let mut report = ViolationReport::new();
    report.summary.total_candidates = candidates.len();

    for candidate in candidates {
        let path = candidate.as_ref();
        let outcome = classify(path, rules, classifier);
        tracing::debug!("{}: {:?}", path.display(), outcome);

        match outcome {
            CandidateOutcome::NotAFile | CandidateOutcome::Ungoverned { .. } => {}
            CandidateOutcome::Ignored => report.summary.files_ignored += 1,
            CandidateOutcome::Compliant { .. } => report.summary.files_checked += 1,
            CandidateOutcome::Violation(violation) => {
                report.summary.files_checked += 1;
                report.add_violation(violation);
            }
        }
    }

    report.set_execution_time(u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX));

    tracing::info!(
        "Checked {} of {} candidates ({} ignored), {} violation(s)",
        report.summary.files_checked,
        report.summary.total_candidates,
        report.summary.files_ignored,
        report.total_violations()
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigBuilder, PatternRule, RuleConfig};
    use crate::patterns::compile_rules;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn validator_for(config: &RuleConfig, root: &Path) -> StructureValidator {
        let rules = compile_rules(&config.rules).unwrap();
        let classifier = PathClassifier::new(&config.ignore_dirs, Some(root.to_path_buf()));
        StructureValidator::new(rules, classifier)
    }

    fn docs_config(ignore: &[&str]) -> RuleConfig {
        let mut builder = ConfigBuilder::new().add_pattern(
            ".txt",
            PatternRule::new(r"Docs/.+\.txt").with_comment("must be under Docs/"),
        );
        for dir in ignore {
            builder = builder.ignore_dir(*dir);
        }
        builder.build().unwrap()
    }

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn test_compliant_and_violating_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let readme = touch(root, "Docs/readme.txt");
        let notes = touch(root, "notes.txt");

        let validator = validator_for(&docs_config(&[]), root);
        let report = validator.validate(&[readme, notes]);

        assert_eq!(report.total_violations(), 1);
        assert_eq!(
            report.violations_for(".txt"),
            [Violation::new("notes.txt", ".txt", "must be under Docs/")]
        );
        assert_eq!(report.summary.files_checked, 2);
    }

    #[test]
    fn test_directory_with_governed_extension_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let dir = root.join("build/tmp/.txt-like-dir/x.txt");
        fs::create_dir_all(&dir).unwrap();

        let validator = validator_for(&docs_config(&[]), root);

        assert_eq!(validator.classify(&dir), CandidateOutcome::NotAFile);
        assert!(!validator.validate(&[dir]).has_violations());
    }

    #[test]
    fn test_missing_candidate_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let validator = validator_for(&docs_config(&[]), root);
        let report = validator.validate(&[root.join("ghost.txt")]);

        assert!(!report.has_violations());
        assert_eq!(report.summary.total_candidates, 1);
        assert_eq!(report.summary.files_checked, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let link = root.join("stray.txt");
        std::os::unix::fs::symlink(root.join("missing.txt"), &link).unwrap();

        let validator = validator_for(&docs_config(&[]), root);

        assert_eq!(validator.classify(&link), CandidateOutcome::NotAFile);
        let report = validator.validate(&[link]);
        assert!(!report.has_violations());
        assert_eq!(report.summary.files_checked, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_file_is_checked_by_link_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let target = touch(root, "Docs/readme.txt");
        let link = root.join("shortcut.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let validator = validator_for(&docs_config(&[]), root);
        let report = validator.validate(&[link]);

        assert_eq!(
            report.violations_for(".txt"),
            [Violation::new("shortcut.txt", ".txt", "must be under Docs/")]
        );
        assert_eq!(report.summary.files_checked, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_metadata_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let notes = touch(root, "locked/notes.txt");
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still stat through a locked directory.
        if fs::metadata(&notes).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let validator = validator_for(&docs_config(&[]), root);
        let outcome = validator.classify(&notes);
        let report = validator.validate(&[notes]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(outcome, CandidateOutcome::NotAFile);
        assert!(!report.has_violations());
    }

    #[test]
    fn test_ignored_file_is_never_reported() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let index = touch(root, "lib/node_modules/pkg/index.txt");

        let validator = validator_for(&docs_config(&["node_modules"]), root);

        assert_eq!(validator.classify(&index), CandidateOutcome::Ignored);
        let report = validator.validate(&[index]);
        assert!(!report.has_violations());
        assert_eq!(report.summary.files_ignored, 1);
    }

    #[test]
    fn test_ignore_substring_also_hits_file_names() {
        // Coarse by construction: "scratch" inside a file name exempts the file.
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let file = touch(root, "notes_scratchpad.txt");

        let validator = validator_for(&docs_config(&["scratch"]), root);
        assert_eq!(validator.classify(&file), CandidateOutcome::Ignored);
    }

    #[test]
    fn test_ungoverned_extension_is_exempt() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let script = touch(root, "anywhere/at/all/Tool.cs");
        let makefile = touch(root, "Makefile");

        let validator = validator_for(&docs_config(&[]), root);

        assert_eq!(
            validator.classify(&script),
            CandidateOutcome::Ungoverned {
                extension: ".cs".to_string()
            }
        );
        assert_eq!(
            validator.classify(&makefile),
            CandidateOutcome::Ungoverned {
                extension: String::new()
            }
        );
        assert!(!validator.validate(&[script, makefile]).has_violations());
    }

    #[test]
    fn test_empty_extension_rule_governs_extensionless_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let makefile = touch(root, "Makefile");
        let dockerfile = touch(root, "docker/Dockerfile");

        let config = ConfigBuilder::new()
            .add_pattern("", PatternRule::new("docker/.*").with_comment("docker files"))
            .build()
            .unwrap();
        let validator = validator_for(&config, root);
        let report = validator.validate(&[makefile, dockerfile]);

        assert_eq!(
            report.violations_for(""),
            [Violation::new("Makefile", "", "docker files")]
        );
    }

    #[test]
    fn test_extension_lookup_is_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let shouting = touch(root, "NOTES.TXT");

        let validator = validator_for(&docs_config(&[]), root);

        match validator.classify(&shouting) {
            CandidateOutcome::Violation(violation) => {
                assert_eq!(violation.extension, ".txt");
                assert_eq!(violation.path, "NOTES.TXT");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_compliant_outcome_reports_matching_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let editor = touch(root, "Assets/Editor/Tool.cs");

        let config = ConfigBuilder::new()
            .add_pattern(".cs", PatternRule::new("Assets/Scripts/.*"))
            .add_pattern(".cs", PatternRule::new("Assets/Editor/.*"))
            .build()
            .unwrap();
        let validator = validator_for(&config, root);

        assert_eq!(
            validator.classify(&editor),
            CandidateOutcome::Compliant {
                extension: ".cs".to_string(),
                relative_path: "Assets/Editor/Tool.cs".to_string(),
                pattern_index: 1,
            }
        );
    }

    #[test]
    fn test_violation_order_follows_candidate_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let c = touch(root, "c.txt");
        let a = touch(root, "a.txt");
        let b = touch(root, "b.txt");

        let validator = validator_for(&docs_config(&[]), root);
        let report = validator.validate(&[c, a, b]);

        let paths: Vec<_> = report.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["c.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let candidates = vec![
            touch(root, "z.txt"),
            touch(root, "Docs/ok.txt"),
            touch(root, "x/y.txt"),
        ];

        let validator = validator_for(&docs_config(&[]), root);
        let first = validator.validate(&candidates);
        let second = validator.validate(&candidates);

        assert_eq!(first.violations, second.violations);
    }

    #[test]
    fn test_every_candidate_is_scanned_after_a_violation() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let candidates: Vec<_> = (0..5)
            .map(|i| touch(root, &format!("stray_{i}.txt")))
            .collect();

        let validator = validator_for(&docs_config(&[]), root);
        let report = validator.validate(&candidates);

        assert_eq!(report.total_violations(), 5);
    }

    #[test]
    fn test_empty_candidate_set() {
        let temp_dir = TempDir::new().unwrap();
        let validator = validator_for(&docs_config(&[]), temp_dir.path());

        let candidates: Vec<PathBuf> = Vec::new();
        let report = validator.validate(&candidates);

        assert!(!report.has_violations());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_paths_outside_root_match_as_given() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let stray = touch(outside.path(), "Docs/readme.txt");

        let validator = validator_for(&docs_config(&[]), temp_dir.path());

        // The absolute path is not under the root, so it is matched whole and fails.
        match validator.classify(&stray) {
            CandidateOutcome::Violation(violation) => {
                assert!(violation.path.ends_with("/Docs/readme.txt"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
