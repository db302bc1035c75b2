//! Structure Guardian CLI - Command-line interface for project layout enforcement
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to domain operations
//! - Handles external concerns like process exit codes and terminal output
//! - Provides clean separation between user interface and business logic

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use structure_guardian::{
    CandidateOutcome, OutputFormat, ReportFormatter, ReportOptions, RuleConfig, StructureGuardian,
};
use tracing_subscriber::EnvFilter;

/// Structure Guardian - Project layout enforcement
#[derive(Parser)]
#[command(name = "structure-guardian")]
#[command(version)]
#[command(about = "Validate that project files live in the paths their extension's rules allow")]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    check: CheckArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

/// Arguments for the default check run
#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Path to the JSON or YAML rule configuration
    #[arg(short, long, required = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormatArg,
}

/// What to validate: a whole tree or an explicit file list
#[derive(Args)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Root directory to validate recursively
    #[arg(long)]
    dir: Option<PathBuf>,

    /// List of files to validate
    #[arg(long, num_args = 1..)]
    files: Option<Vec<PathBuf>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file without checking any files
    ValidateConfig {
        /// Configuration file to validate
        config_file: PathBuf,
    },

    /// List the configured rules
    Rules {
        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Only show rules for this extension
        #[arg(short, long)]
        extension: Option<String>,
    },

    /// Explain how a single path is classified
    Explain {
        /// Path to classify
        path: PathBuf,

        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Root that relative paths are computed against (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq, Eq, Debug)]
enum OutputFormatArg {
    Human,
    Json,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

/// Where candidate paths come from
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Directory(PathBuf),
    Files(Vec<PathBuf>),
}

impl TargetArgs {
    fn into_target(self) -> Option<Target> {
        match (self.dir, self.files) {
            (Some(dir), _) => Some(Target::Directory(dir)),
            (None, Some(files)) => Some(Target::Files(files)),
            (None, None) => None,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run_command(cli: Cli) -> Result<i32> {
    let use_colors = !cli.no_color;

    match cli.command {
        Some(Commands::ValidateConfig { config_file }) => Ok(run_validate_config(&config_file)),
        Some(Commands::Rules { config, extension }) => run_list_rules(&config, extension.as_deref()),
        Some(Commands::Explain { path, config, root }) => run_explain(path, &config, root),
        None => {
            let CheckArgs {
                target,
                config,
                format,
            } = cli.check;
            let target = target
                .into_target()
                .context("one of --dir or --files is required")?;
            let config = config.context("--config is required")?;
            run_check(&config, target, format, use_colors)
        }
    }
}

fn run_check(
    config_path: &Path,
    target: Target,
    format: OutputFormatArg,
    use_colors: bool,
) -> Result<i32> {
    let guardian = StructureGuardian::from_config_file(config_path)
        .with_context(|| format!("cannot use configuration '{}'", config_path.display()))?
        .with_report_formatter(ReportFormatter::new(ReportOptions { use_colors }));

    let report = match target {
        Target::Directory(root) => guardian.validate_directory(&root),
        Target::Files(files) => {
            // Absolute paths under the working directory become relative; relative
            // paths are not under it and are matched as given.
            let cwd = std::env::current_dir().context("cannot determine working directory")?;
            guardian.validate_files(files.as_slice(), Some(cwd))
        }
    };

    let formatted = guardian.format_report(&report, format.into())?;
    print!("{formatted}");

    Ok(report.exit_code())
}

fn run_validate_config(config_path: &Path) -> i32 {
    println!("Validating configuration: {}", config_path.display());

    match StructureGuardian::from_config_file(config_path) {
        Ok(guardian) => {
            let config = guardian.config();
            println!("Configuration is valid");
            println!("  Extensions: {}", config.rules.len());
            println!("  Patterns: {}", config.pattern_count());
            println!("  Ignore entries: {}", config.ignore_dirs.len());
            0
        }
        Err(e) if e.is_config_error() => {
            eprintln!("Configuration validation failed: {e}");
            1
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn run_list_rules(config_path: &Path, extension: Option<&str>) -> Result<i32> {
    let config = RuleConfig::load_from_file(config_path)
        .with_context(|| format!("cannot load configuration '{}'", config_path.display()))?;

    let filter = extension.map(str::to_lowercase);
    let mut shown = 0;

    for (ext, rule_set) in &config.rules {
        if filter.as_ref().is_some_and(|f| f != ext) {
            continue;
        }
        shown += 1;

        let label = if ext.is_empty() { "(no extension)" } else { ext.as_str() };
        println!("{label}");
        for rule in &rule_set.patterns {
            println!("  {}  # {}", rule.pattern, rule.comment_or_default());
        }
        println!();
    }

    if !config.ignore_dirs.is_empty() {
        println!("Ignored: {}", config.ignore_dirs.join(", "));
    }

    if let (Some(f), 0) = (&filter, shown) {
        eprintln!("No rules configured for '{f}'");
        return Ok(1);
    }

    Ok(0)
}

fn run_explain(path: PathBuf, config_path: &Path, root: Option<PathBuf>) -> Result<i32> {
    let guardian = StructureGuardian::from_config_file(config_path)
        .with_context(|| format!("cannot use configuration '{}'", config_path.display()))?;

    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine working directory")?,
    };

    let outcome = guardian.explain(&path, Some(root));
    println!("{}", describe_outcome(&guardian, &outcome));

    Ok(i32::from(matches!(outcome, CandidateOutcome::Violation(_))))
}

fn describe_outcome(guardian: &StructureGuardian, outcome: &CandidateOutcome) -> String {
    match outcome {
        CandidateOutcome::NotAFile => "skipped: not a regular file".to_string(),
        CandidateOutcome::Ignored => "skipped: matches an ignore entry".to_string(),
        CandidateOutcome::Ungoverned { extension } if extension.is_empty() => {
            "not checked: no rules for files without an extension".to_string()
        }
        CandidateOutcome::Ungoverned { extension } => {
            format!("not checked: no rules for '{extension}'")
        }
        CandidateOutcome::Compliant {
            extension,
            relative_path,
            pattern_index,
        } => {
            let pattern = guardian
                .config()
                .rule_set(extension)
                .and_then(|set| set.patterns.get(*pattern_index))
                .map(|rule| rule.pattern.as_str())
                .unwrap_or_default();
            format!("ok: {relative_path} matches '{pattern}'")
        }
        CandidateOutcome::Violation(violation) => {
            format!("violation: {}", violation.format_display())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
