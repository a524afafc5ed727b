//! CLI argument parsing module for pinbump

use crate::config::DEFAULT_CONFIG_FILE;
use crate::resolver::{Strategy, DEFAULT_GITHUB_API_URL, DEFAULT_GITLAB_URL};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

const EXAMPLES: &str = "\
Examples:
  pinbump report                              # Write report.json for the current directory
  pinbump report --markdown report.md         # Also export the plan as Markdown
  pinbump update --root infra                 # Bump stale pins under ./infra
  pinbump update --resolver auto --validate-token";

/// Parse a timeout in whole seconds, with an optional `s` suffix
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let digits = s.strip_suffix('s').unwrap_or(s);
    if digits.is_empty() {
        return Err("empty timeout".to_string());
    }

    let secs: u64 = digits
        .parse()
        .map_err(|_| format!("invalid number of seconds: {}", s))?;
    if secs == 0 {
        return Err("timeout must be at least one second".to_string());
    }

    Ok(Duration::from_secs(secs))
}

/// Bump pinned module refs in Terraform and Terragrunt files
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pinbump",
    version,
    about = "Bump pinned module refs in Terraform and Terragrunt files",
    after_help = EXAMPLES
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compute the update plan and write reports without touching files
    Report(RunArgs),
    /// Compute the update plan and apply it to the files
    Update(RunArgs),
}

/// What a run does with the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report only
    Report,
    /// Report and rewrite files
    Update,
}

impl Command {
    /// Run mode of the subcommand
    pub fn mode(&self) -> Mode {
        match self {
            Command::Report(_) => Mode::Report,
            Command::Update(_) => Mode::Update,
        }
    }

    /// Options shared by both subcommands
    pub fn args(&self) -> &RunArgs {
        match self {
            Command::Report(args) | Command::Update(args) => args,
        }
    }
}

/// Options accepted by `report` and `update`
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Root directory to scan
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    // Discovery
    /// Glob of files to scan (repeatable; default: **/*.hcl and **/*.tf)
    #[arg(long, action = ArgAction::Append)]
    pub include: Vec<String>,

    /// Glob of files to skip (repeatable)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Category and blacklist configuration (YAML, JSON or TOML)
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    // Resolution
    /// How to look up the latest ref
    #[arg(long, value_enum, default_value_t = Strategy::Git)]
    pub resolver: Strategy,

    /// GitHub API base URL (its host also counts as a GitHub host)
    #[arg(long, default_value = DEFAULT_GITHUB_API_URL)]
    pub github_base_url: String,

    /// GitLab instance used for hosts that do not look like GitLab
    #[arg(long, default_value = DEFAULT_GITLAB_URL)]
    pub gitlab_base_url: String,

    /// Token used for both GitHub and GitLab when no specific one is set
    #[arg(long)]
    pub token: Option<String>,

    /// GitHub token (overrides GITHUB_TOKEN)
    #[arg(long)]
    pub github_token: Option<String>,

    /// GitLab token (overrides GITLAB_TOKEN)
    #[arg(long)]
    pub gitlab_token: Option<String>,

    /// Check configured tokens before resolving
    #[arg(long)]
    pub validate_token: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_parser = parse_timeout, default_value = "20")]
    pub timeout: Duration,

    // Output
    /// JSON report path
    #[arg(long, default_value = "report.json")]
    pub output: PathBuf,

    /// Also write a Markdown report to this path
    #[arg(long)]
    pub markdown: Option<PathBuf>,

    /// Do not write any report file
    #[arg(long)]
    pub no_report: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
