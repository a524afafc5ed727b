//! Run orchestrator coordinating the whole workflow
//!
//! This module provides:
//! - Workflow coordination: config → scan → validate → plan → report → apply
//! - Resolver cascade construction from CLI options and environment
//! - Progress display while scanning and resolving

use crate::cli::{Mode, RunArgs};
use crate::config::{load_config, Config};
use crate::domain::{SourceRef, UpdateRecord};
use crate::error::AppError;
use crate::output::{build_report, write_markdown, write_report};
use crate::progress::{Progress, ProgressLookup};
use crate::resolver::{
    resolve_token, GitHubResolver, GitLabResolver, GitResolver, HttpClient, LatestRefLookup,
    ResolverCascade, GITHUB_TOKEN_ENV, GITLAB_TOKEN_ENV,
};
use crate::scanner::{scan_sources, ScanOptions};
use crate::update::UpdatePlanner;
use crate::writer::apply_updates;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Outcome of the `--validate-token` pre-flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenCheck {
    /// `--validate-token` was not given
    #[default]
    NotRequested,
    /// Requested, but no token is configured
    Skipped,
    /// Every configured token was accepted
    Validated,
}

/// Orchestrator for one `report` or `update` run
pub struct Orchestrator {
    /// Subcommand being run
    mode: Mode,
    /// CLI options
    args: RunArgs,
    /// HTTP client shared by the hosted backends
    client: HttpClient,
}

/// Result of running the orchestrator
#[derive(Debug)]
pub struct OrchestratorResult {
    /// Subcommand that produced this result
    pub mode: Mode,
    /// Number of module references found
    pub sources_scanned: usize,
    /// Token pre-flight outcome
    pub token_check: TokenCheck,
    /// Planned updates
    pub updates: Vec<UpdateRecord>,
    /// JSON report written, if any
    pub report_path: Option<PathBuf>,
    /// Markdown report written, if any
    pub markdown_path: Option<PathBuf>,
    /// Files rewritten (update mode only)
    pub touched: Vec<String>,
}

impl Orchestrator {
    /// Create a new orchestrator for `mode` with the given options
    pub fn new(mode: Mode, args: RunArgs) -> Result<Self, AppError> {
        let client = HttpClient::with_timeout(args.timeout)?;
        Ok(Self { mode, args, client })
    }

    /// Create an orchestrator with a custom HTTP client (for testing)
    pub fn with_client(mode: Mode, args: RunArgs, client: HttpClient) -> Self {
        Self { mode, args, client }
    }

    /// Run the workflow
    pub async fn run(&self) -> Result<OrchestratorResult, AppError> {
        self.run_with_progress(!self.args.quiet).await
    }

    /// Run the workflow with optional progress display
    pub async fn run_with_progress(&self, show_progress: bool) -> Result<OrchestratorResult, AppError> {
        let mut progress = Progress::new(show_progress);

        let config = load_config(&self.args.config, &self.args.root)?;
        let sources = self.scan(&config, &mut progress)?;

        let github_token = self.github_token();
        let gitlab_token = self.gitlab_token();
        let has_token = github_token.is_some() || gitlab_token.is_some();
        let cascade = self.build_cascade(github_token, gitlab_token);

        let token_check = if !self.args.validate_token {
            TokenCheck::NotRequested
        } else if !has_token {
            TokenCheck::Skipped
        } else {
            progress.spinner("Validating tokens...");
            let valid = cascade.validate_tokens().await;
            progress.finish_and_clear();
            if !valid {
                error!("Token validation failed");
                return Err(AppError::TokenValidation);
            }
            TokenCheck::Validated
        };

        self.finish(&config, &sources, &cascade, token_check, &mut progress)
            .await
    }

    /// Run the workflow against an arbitrary lookup, without token validation
    pub async fn run_with_lookup(
        &self,
        lookup: &dyn LatestRefLookup,
    ) -> Result<OrchestratorResult, AppError> {
        let mut progress = Progress::disabled();
        let config = load_config(&self.args.config, &self.args.root)?;
        let sources = self.scan(&config, &mut progress)?;
        self.finish(&config, &sources, lookup, TokenCheck::NotRequested, &mut progress)
            .await
    }

    fn scan(&self, config: &Config, progress: &mut Progress) -> Result<Vec<SourceRef>, AppError> {
        let options = ScanOptions::new()
            .with_include(self.args.include.clone())
            .with_exclude(self.args.exclude.clone())
            .with_blacklist(config.blacklist.clone());

        progress.spinner(&format!("Scanning {}...", self.args.root.display()));
        let sources = scan_sources(&self.args.root, &options);
        progress.finish_and_clear();

        let sources = sources?;
        debug!(
            "found {} module reference(s) under {}",
            sources.len(),
            self.args.root.display()
        );
        Ok(sources)
    }

    async fn finish(
        &self,
        config: &Config,
        sources: &[SourceRef],
        lookup: &dyn LatestRefLookup,
        token_check: TokenCheck,
        progress: &mut Progress,
    ) -> Result<OrchestratorResult, AppError> {
        let repositories: HashSet<String> = sources.iter().map(SourceRef::repo_key).collect();
        progress.start(repositories.len() as u64, "Resolving");
        let planner = UpdatePlanner::new(config.categories.clone());
        let updates = planner
            .plan(&ProgressLookup::new(lookup, progress), sources)
            .await;
        progress.finish_and_clear();
        info!(
            "{} update(s) across {} repository(ies)",
            updates.len(),
            repositories.len()
        );

        let mut result = OrchestratorResult {
            mode: self.mode,
            sources_scanned: sources.len(),
            token_check,
            updates,
            report_path: None,
            markdown_path: None,
            touched: Vec::new(),
        };

        if result.updates.is_empty() {
            return Ok(result);
        }

        if !self.args.no_report {
            let report = build_report(&self.args.root, &result.updates);
            write_report(&self.args.output, &report)?;
            result.report_path = Some(self.args.output.clone());

            if let Some(path) = &self.args.markdown {
                write_markdown(path, &report)?;
                result.markdown_path = Some(path.clone());
            }
        }

        if self.mode == Mode::Update {
            progress.spinner("Writing updates...");
            result.touched = apply_updates(&self.args.root, &result.updates);
            progress.finish_and_clear();
        }

        Ok(result)
    }

    fn github_token(&self) -> Option<String> {
        resolve_token(
            self.args.github_token.as_deref(),
            GITHUB_TOKEN_ENV,
            self.args.token.as_deref(),
        )
    }

    fn gitlab_token(&self) -> Option<String> {
        resolve_token(
            self.args.gitlab_token.as_deref(),
            GITLAB_TOKEN_ENV,
            self.args.token.as_deref(),
        )
    }

    /// Build the backend cascade for the configured strategy
    fn build_cascade(
        &self,
        github_token: Option<String>,
        gitlab_token: Option<String>,
    ) -> ResolverCascade {
        let git = GitResolver::new(self.args.timeout);
        let github = GitHubResolver::new(
            self.client.clone(),
            &self.args.github_base_url,
            github_token,
        );
        let gitlab = GitLabResolver::new(
            self.client.clone(),
            &self.args.gitlab_base_url,
            gitlab_token,
        );

        ResolverCascade::new(
            self.args.resolver,
            Box::new(git),
            Box::new(github),
            Box::new(gitlab),
        )
        .with_github_base_url(&self.args.github_base_url)
    }
}
