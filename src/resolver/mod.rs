//! Backend resolvers for looking up the latest ref of a repository
//!
//! This module provides:
//! - A shared single-attempt HTTP client
//! - `git ls-remote` transport resolver (any Git host)
//! - GitHub releases/tags API resolver
//! - GitLab project tags API resolver
//! - The resolution cascade choosing between them per strategy and host
//! - Token lookup from flags and environment

mod cascade;
mod client;
mod git;
mod github;
mod gitlab;

pub use cascade::{backend_order, HostClass, ResolverCascade, Strategy};
pub use client::{HttpClient, DEFAULT_TIMEOUT};
pub use git::{parse_ls_remote, GitResolver};
pub use github::{GitHubResolver, DEFAULT_GITHUB_API_URL};
pub use gitlab::{detect_gitlab_host, project_id, GitLabResolver, DEFAULT_GITLAB_URL};

use crate::domain::SourceRef;
use async_trait::async_trait;
use std::fmt;

/// Environment variable holding the GitHub token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable holding the GitLab token
pub const GITLAB_TOKEN_ENV: &str = "GITLAB_TOKEN";

/// Backends a ref can be resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// `git ls-remote` over the repository's own transport
    Git,
    /// GitHub REST API
    GitHub,
    /// GitLab REST API
    GitLab,
}

impl Backend {
    /// Human-readable backend name
    pub fn display_name(&self) -> &'static str {
        match self {
            Backend::Git => "git",
            Backend::GitHub => "GitHub",
            Backend::GitLab => "GitLab",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Resolves the latest ref of a repository from one backend
///
/// Failures never surface: implementations log them and return `None`.
#[async_trait]
pub trait RefResolver: Send + Sync {
    /// The backend this resolver talks to
    fn backend(&self) -> Backend;

    /// Latest ref for the repository `source` points at
    async fn latest_ref(&self, source: &SourceRef) -> Option<String>;

    /// Check the configured credentials; no token counts as valid
    async fn validate_token(&self) -> bool {
        true
    }
}

/// Looks up the latest ref for a source reference
///
/// The planner depends on this seam rather than on concrete resolvers.
#[async_trait]
pub trait LatestRefLookup: Send + Sync {
    /// Latest ref for the repository of `source`, `None` when unknown
    async fn latest_ref(&self, source: &SourceRef) -> Option<String>;
}

/// Pick a token: explicit value, then `env_var`, then the shared fallback
///
/// Empty strings count as unset.
pub fn resolve_token(explicit: Option<&str>, env_var: &str, shared: Option<&str>) -> Option<String> {
    let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());

    explicit
        .and_then(non_empty)
        .or_else(|| std::env::var(env_var).ok().and_then(|v| non_empty(&v)))
        .or_else(|| shared.and_then(non_empty))
}
