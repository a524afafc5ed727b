//! Resolution cascade
//!
//! Chooses which backends to ask, and in which order, from the configured
//! strategy and the repository host, then falls through them until one
//! produces a ref.

use crate::domain::SourceRef;
use crate::resolver::{Backend, LatestRefLookup, RefResolver};
use async_trait::async_trait;
use clap::ValueEnum;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;
use url::Url;

/// Host that is always treated as GitHub
const GITHUB_HOST: &str = "github.com";

/// Resolution strategy selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// `git ls-remote` only
    #[default]
    Git,
    /// GitHub API for GitHub hosts, git otherwise
    Github,
    /// GitLab API for GitLab hosts, GitHub API for GitHub hosts, git otherwise
    Auto,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Git => "git",
            Strategy::Github => "github",
            Strategy::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// What kind of host a repository lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostClass {
    /// Host name contains `gitlab`
    pub gitlab: bool,
    /// Host is in the GitHub host set
    pub github: bool,
}

/// Ordered backends to try for a strategy and host class
pub fn backend_order(strategy: Strategy, host: HostClass) -> &'static [Backend] {
    match strategy {
        Strategy::Git => &[Backend::Git],
        Strategy::Github if host.github => &[Backend::GitHub, Backend::Git],
        Strategy::Github => &[Backend::Git],
        Strategy::Auto if host.gitlab => &[Backend::GitLab, Backend::Git],
        Strategy::Auto if host.github => &[Backend::GitHub, Backend::Git],
        Strategy::Auto => &[Backend::Git],
    }
}

/// Backend fallback chain over the three resolvers
pub struct ResolverCascade {
    strategy: Strategy,
    github_hosts: HashSet<String>,
    git: Box<dyn RefResolver>,
    github: Box<dyn RefResolver>,
    gitlab: Box<dyn RefResolver>,
}

impl ResolverCascade {
    /// Create a cascade; `github.com` is the only GitHub host until
    /// [`with_github_base_url`](Self::with_github_base_url) adds another
    pub fn new(
        strategy: Strategy,
        git: Box<dyn RefResolver>,
        github: Box<dyn RefResolver>,
        gitlab: Box<dyn RefResolver>,
    ) -> Self {
        Self {
            strategy,
            github_hosts: HashSet::from([GITHUB_HOST.to_string()]),
            git,
            github,
            gitlab,
        }
    }

    /// Treat the authority of the GitHub API base URL as a GitHub host
    ///
    /// Unparsable URLs are ignored.
    pub fn with_github_base_url(mut self, base_url: &str) -> Self {
        if let Some(authority) = authority_of(base_url) {
            self.github_hosts.insert(authority);
        }
        self
    }

    /// The configured strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Classify the host `source` lives on
    pub fn classify(&self, source: &SourceRef) -> HostClass {
        let host = source.repo_host.to_ascii_lowercase();
        HostClass {
            gitlab: host.contains("gitlab"),
            github: self.github_hosts.contains(&host),
        }
    }

    fn resolver(&self, backend: Backend) -> &dyn RefResolver {
        match backend {
            Backend::Git => self.git.as_ref(),
            Backend::GitHub => self.github.as_ref(),
            Backend::GitLab => self.gitlab.as_ref(),
        }
    }

    /// Validate the hosted backends' credentials
    ///
    /// Returns `false` if any configured token is rejected.
    pub async fn validate_tokens(&self) -> bool {
        let github_ok = self.github.validate_token().await;
        let gitlab_ok = self.gitlab.validate_token().await;
        github_ok && gitlab_ok
    }
}

#[async_trait]
impl LatestRefLookup for ResolverCascade {
    async fn latest_ref(&self, source: &SourceRef) -> Option<String> {
        let order = backend_order(self.strategy, self.classify(source));

        for backend in order {
            if let Some(found) = self.resolver(*backend).latest_ref(source).await {
                debug!("{}: {} resolved to {}", backend, source.repo_key(), found);
                return Some(found);
            }
            debug!("{}: nothing for {}", backend, source.repo_key());
        }

        None
    }
}

/// `host[:port]` of a URL, lowercased
fn authority_of(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}
