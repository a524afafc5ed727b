//! GitLab API resolver
//!
//! API endpoints:
//! - {base}/api/v4/projects/{id}/repository/tags
//! - {base}/api/v4/user (token validation)
//!
//! Self-hosted instances are picked up from the repository URL when its host
//! contains `gitlab`; other hosts go to the configured base URL.

use crate::domain::SourceRef;
use crate::error::ResolveError;
use crate::resolver::{Backend, HttpClient, RefResolver};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, warn};
use url::Url;

/// Default GitLab instance
pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";

const TAGS_QUERY: &str = "per_page=1&order_by=updated&sort=desc";

#[derive(Debug, Deserialize)]
struct Tag {
    name: Option<String>,
}

/// API base of `repo_url` when its host looks like GitLab
///
/// http(s) URLs keep their scheme and port. Other transports (ssh, git)
/// map to `https://host`, since their port is not the web port.
pub fn detect_gitlab_host(repo_url: &str) -> Option<String> {
    let url = Url::parse(repo_url).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    if !host.contains("gitlab") {
        return None;
    }

    Some(match (url.scheme(), url.port()) {
        (scheme @ ("http" | "https"), Some(port)) => format!("{}://{}:{}", scheme, host, port),
        (scheme @ ("http" | "https"), None) => format!("{}://{}", scheme, host),
        _ => format!("https://{}", host),
    })
}

/// URL-encoded project path used as the GitLab project id
///
/// `https://gitlab.com/group/sub/project.git` becomes `group%2Fsub%2Fproject`.
pub fn project_id(repo_url: &str) -> Option<String> {
    let url = Url::parse(repo_url).ok()?;
    let path = url.path().trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if path.is_empty() {
        return None;
    }
    Some(path.replace('/', "%2F"))
}

/// Resolver backed by the GitLab REST API
pub struct GitLabResolver {
    client: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl GitLabResolver {
    /// Create a resolver with `base_url` as the fallback instance
    pub fn new(client: HttpClient, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Whether a token is configured
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        match &self.token {
            Some(token) => vec![("private-token", token.clone())],
            None => Vec::new(),
        }
    }

    /// Instance that serves `repo_url`
    fn base_for(&self, repo_url: &str) -> String {
        detect_gitlab_host(repo_url).unwrap_or_else(|| self.base_url.clone())
    }

    /// Most recently updated tag of the project behind `repo_url`
    pub async fn latest_tag(&self, repo_url: &str) -> Result<Option<String>, ResolveError> {
        let Some(id) = project_id(repo_url) else {
            return Err(ResolveError::invalid_response(
                repo_url,
                Backend::GitLab.display_name(),
                "cannot derive project id",
            ));
        };

        let url = format!(
            "{}/api/v4/projects/{}/repository/tags?{}",
            self.base_for(repo_url),
            id,
            TAGS_QUERY
        );
        let tags: Option<Vec<Tag>> = self
            .client
            .get_json(&url, &self.headers(), repo_url, Backend::GitLab.display_name())
            .await?;

        Ok(tags
            .and_then(|tags| tags.into_iter().next())
            .and_then(|tag| tag.name)
            .filter(|name| !name.is_empty()))
    }
}

#[async_trait]
impl RefResolver for GitLabResolver {
    fn backend(&self) -> Backend {
        Backend::GitLab
    }

    async fn latest_ref(&self, source: &SourceRef) -> Option<String> {
        match self.latest_tag(&source.repo_url).await {
            Ok(tag) => tag,
            Err(ResolveError::NotFound { .. }) => {
                debug!("GitLab: project {} not found", source.repo_url);
                None
            }
            Err(e) if e.is_auth_failure() => {
                warn!("{}", e);
                None
            }
            Err(e) => {
                warn!("Error fetching GitLab tags for {}: {}", source.repo_url, e);
                None
            }
        }
    }

    async fn validate_token(&self) -> bool {
        if self.token.is_none() {
            return true;
        }

        let url = format!("{}/api/v4/user", self.base_url);
        match self
            .client
            .get(&url, &self.headers(), "user", Backend::GitLab.display_name())
            .await
        {
            Ok(_) => true,
            Err(ResolveError::Unauthorized { .. }) => {
                error!("GitLab token invalid or expired");
                false
            }
            Err(ResolveError::Forbidden { .. }) => {
                error!("GitLab token insufficient permissions");
                false
            }
            Err(e) => {
                error!("Error validating GitLab token: {}", e);
                false
            }
        }
    }
}
