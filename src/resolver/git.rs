//! `git ls-remote` transport resolver
//!
//! Works for any URL git can talk to. Tags are listed with
//! `--sort=-v:refname`, so git does the version-aware ordering and the first
//! non-peeled tag is the latest.

use crate::domain::SourceRef;
use crate::error::ResolveError;
use crate::resolver::{Backend, RefResolver, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, warn};

const TAG_PREFIX: &str = "refs/tags/";

/// Suffix git appends to peeled (dereferenced) annotated tags
const PEELED_SUFFIX: &str = "^{}";

/// Resolver shelling out to `git ls-remote`
#[derive(Debug, Clone)]
pub struct GitResolver {
    program: String,
    timeout: Duration,
}

impl GitResolver {
    /// Create a resolver using `git` from PATH
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "git".to_string(),
            timeout,
        }
    }

    /// Use a different git executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// List remote tags and return the newest one
    pub async fn ls_remote_latest(&self, repo_url: &str) -> Result<Option<String>, ResolveError> {
        let mut command = Command::new(&self.program);
        command
            .args(["ls-remote", "--tags", "--sort=-v:refname", repo_url])
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => return Err(ResolveError::timeout(repo_url, Backend::Git.display_name())),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ResolveError::GitUnavailable)
            }
            Ok(Err(e)) => {
                return Err(ResolveError::network(
                    repo_url,
                    Backend::Git.display_name(),
                    e.to_string(),
                ))
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(ResolveError::GitFailed {
                repo: repo_url.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_ls_remote(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Default for GitResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// First tag name in `git ls-remote --tags` output, skipping peeled entries
pub fn parse_ls_remote(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let (_, reference) = line.split_once('\t')?;
        if reference.ends_with(PEELED_SUFFIX) {
            return None;
        }
        reference.strip_prefix(TAG_PREFIX).map(str::to_string)
    })
}

#[async_trait]
impl RefResolver for GitResolver {
    fn backend(&self) -> Backend {
        Backend::Git
    }

    async fn latest_ref(&self, source: &SourceRef) -> Option<String> {
        match self.ls_remote_latest(&source.repo_url).await {
            Ok(tag) => {
                debug!("git: latest tag for {} is {:?}", source.repo_url, tag);
                tag
            }
            Err(ResolveError::Timeout { .. }) => {
                error!("Git ls-remote for {} timed out", source.repo_url);
                None
            }
            Err(ResolveError::GitFailed { stderr, .. }) => {
                if stderr.contains("not found") || stderr.contains("fatal:") {
                    warn!("Git: repository {} not found or no access", source.repo_url);
                } else {
                    warn!("Git ls-remote failed for {}: {}", source.repo_url, stderr);
                }
                None
            }
            Err(ResolveError::GitUnavailable) => {
                error!("Git not installed or not in PATH");
                None
            }
            Err(e) => {
                error!("Unexpected error running git ls-remote: {}", e);
                None
            }
        }
    }
}
