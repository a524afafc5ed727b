//! GitHub API resolver
//!
//! Looks up the latest release first and falls back to the tag list.
//! API endpoints:
//! - {base}/repos/{owner}/{repo}/releases/latest
//! - {base}/repos/{owner}/{repo}/tags?per_page=1
//! - {base}/user (token validation)

use crate::domain::SourceRef;
use crate::error::ResolveError;
use crate::resolver::{Backend, HttpClient, RefResolver};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, warn};

/// Default base URL for the GitHub API
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Response from the latest-release endpoint
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: Option<String>,
}

/// Entry of the tag list endpoint
#[derive(Debug, Deserialize)]
struct Tag {
    name: Option<String>,
}

/// Resolver backed by the GitHub REST API
pub struct GitHubResolver {
    client: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl GitHubResolver {
    /// Create a resolver for the API at `base_url`
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
        let mut headers = vec![("accept", GITHUB_ACCEPT.to_string())];
        if let Some(token) = &self.token {
            headers.push(("authorization", format!("Bearer {}", token)));
        }
        headers
    }

    /// Tag of the latest published release
    pub async fn latest_release_tag(&self, repo: &str) -> Result<Option<String>, ResolveError> {
        let url = format!("{}/repos/{}/releases/latest", self.base_url, repo);
        let release: Option<Release> = self
            .client
            .get_json(&url, &self.headers(), repo, Backend::GitHub.display_name())
            .await?;

        Ok(release
            .and_then(|r| r.tag_name)
            .filter(|tag| !tag.is_empty()))
    }

    /// First entry of the repository tag list
    pub async fn latest_tag(&self, repo: &str) -> Result<Option<String>, ResolveError> {
        let url = format!("{}/repos/{}/tags?per_page=1", self.base_url, repo);
        let tags: Option<Vec<Tag>> = self
            .client
            .get_json(&url, &self.headers(), repo, Backend::GitHub.display_name())
            .await?;

        Ok(tags
            .and_then(|tags| tags.into_iter().next())
            .and_then(|tag| tag.name)
            .filter(|name| !name.is_empty()))
    }
}

/// Log a lookup failure at the level it deserves and downgrade it
fn downgrade(result: Result<Option<String>, ResolveError>, what: &str, repo: &str) -> Option<String> {
    match result {
        Ok(value) => value,
        Err(ResolveError::NotFound { .. }) => {
            debug!("GitHub: no {} for {}", what, repo);
            None
        }
        Err(e) if e.is_auth_failure() => {
            warn!("{}", e);
            None
        }
        Err(e) => {
            warn!("Error fetching {} for {}: {}", what, repo, e);
            None
        }
    }
}

#[async_trait]
impl RefResolver for GitHubResolver {
    fn backend(&self) -> Backend {
        Backend::GitHub
    }

    async fn latest_ref(&self, source: &SourceRef) -> Option<String> {
        let repo = source.repo.as_str();

        let release = downgrade(self.latest_release_tag(repo).await, "release tag", repo);
        if release.is_some() {
            return release;
        }

        downgrade(self.latest_tag(repo).await, "tags", repo)
    }

    async fn validate_token(&self) -> bool {
        if self.token.is_none() {
            return true;
        }

        let url = format!("{}/user", self.base_url);
        match self
            .client
            .get(&url, &self.headers(), "user", Backend::GitHub.display_name())
            .await
        {
            Ok(_) => true,
            Err(ResolveError::Unauthorized { .. }) => {
                error!("GitHub token invalid or expired");
                false
            }
            Err(ResolveError::Forbidden { .. }) => {
                error!("GitHub token insufficient permissions");
                false
            }
            Err(e) => {
                error!("Error validating GitHub token: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn resolver(base_url: &str, token: Option<&str>) -> GitHubResolver {
        GitHubResolver::new(
            HttpClient::new().unwrap(),
            base_url,
            token.map(str::to_string),
        )
    }

    fn source(repo: &str) -> SourceRef {
        SourceRef {
            file_path: "main.tf".to_string(),
            raw: format!("git::https://github.com/{}.git?ref=v1.0.0", repo),
            repo: repo.to_string(),
            repo_url: format!("https://github.com/{}", repo),
            repo_host: "github.com".to_string(),
            ref_: "v1.0.0".to_string(),
            module: None,
        }
    }

    #[tokio::test]
    async fn latest_ref_prefers_latest_release() {
        let mut server = Server::new_async().await;
        let release = server
            .mock("GET", "/repos/org/vpc/releases/latest")
            .match_header("accept", GITHUB_ACCEPT)
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"tag_name": "v2.3.0"}"#)
            .create_async()
            .await;
        let tags = server
            .mock("GET", "/repos/org/vpc/tags")
            .expect(0)
            .create_async()
            .await;

        let resolver = resolver(&server.url(), Some("secret"));
        let result = resolver.latest_ref(&source("org/vpc")).await;

        release.assert_async().await;
        tags.assert_async().await;
        assert_eq!(result.as_deref(), Some("v2.3.0"));
    }

    #[tokio::test]
    async fn latest_ref_falls_back_to_tags_on_404() {
        let mut server = Server::new_async().await;
        let release = server
            .mock("GET", "/repos/org/vpc/releases/latest")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;
        let tags = server
            .mock("GET", "/repos/org/vpc/tags")
            .match_query(Matcher::UrlEncoded("per_page".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "v1.4.0"}, {"name": "v1.3.0"}]"#)
            .create_async()
            .await;

        let resolver = resolver(&server.url(), None);
        let result = resolver.latest_ref(&source("org/vpc")).await;

        release.assert_async().await;
        tags.assert_async().await;
        assert_eq!(result.as_deref(), Some("v1.4.0"));
    }

    #[tokio::test]
    async fn latest_ref_falls_back_on_empty_release_body() {
        let mut server = Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/org/vpc/releases/latest")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;
        let _tags = server
            .mock("GET", "/repos/org/vpc/tags")
            .with_status(200)
            .with_body(r#"[{"name": "v0.9.0"}]"#)
            .create_async()
            .await;

        let resolver = resolver(&server.url(), None);
        assert_eq!(
            resolver.latest_ref(&source("org/vpc")).await.as_deref(),
            Some("v0.9.0")
        );
    }

    #[tokio::test]
    async fn latest_ref_none_for_repo_without_tags() {
        let mut server = Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/org/empty/releases/latest")
            .with_status(404)
            .create_async()
            .await;
        let _tags = server
            .mock("GET", "/repos/org/empty/tags")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let resolver = resolver(&server.url(), None);
        assert_eq!(resolver.latest_ref(&source("org/empty")).await, None);
    }

    #[tokio::test]
    async fn latest_ref_none_on_unauthorized() {
        let mut server = Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/org/private/releases/latest")
            .with_status(401)
            .create_async()
            .await;
        let _tags = server
            .mock("GET", "/repos/org/private/tags")
            .with_status(403)
            .create_async()
            .await;

        let resolver = resolver(&server.url(), Some("expired"));
        assert_eq!(resolver.latest_ref(&source("org/private")).await, None);
    }

    #[tokio::test]
    async fn latest_ref_none_on_server_error() {
        let mut server = Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/org/vpc/releases/latest")
            .with_status(502)
            .create_async()
            .await;
        let _tags = server
            .mock("GET", "/repos/org/vpc/tags")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let resolver = resolver(&server.url(), None);
        assert_eq!(resolver.latest_ref(&source("org/vpc")).await, None);
    }

    #[tokio::test]
    async fn validate_token_without_token_is_valid() {
        let resolver = resolver("http://127.0.0.1:1", None);
        assert!(resolver.validate_token().await);
    }

    #[tokio::test]
    async fn validate_token_accepts_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/user")
            .match_header("authorization", "Bearer good")
            .with_status(200)
            .with_body(r#"{"login": "octocat"}"#)
            .create_async()
            .await;

        let resolver = resolver(&server.url(), Some("good"));
        assert!(resolver.validate_token().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn validate_token_rejects_401_and_403() {
        let mut server = Server::new_async().await;
        let _bad = server
            .mock("GET", "/user")
            .match_header("authorization", "Bearer bad")
            .with_status(401)
            .create_async()
            .await;
        let _weak = server
            .mock("GET", "/user")
            .match_header("authorization", "Bearer weak")
            .with_status(403)
            .create_async()
            .await;

        assert!(!resolver(&server.url(), Some("bad")).validate_token().await);
        assert!(!resolver(&server.url(), Some("weak")).validate_token().await);
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let resolver = resolver("https://ghe.example.com/api/v3/", None);
        assert_eq!(resolver.base_url, "https://ghe.example.com/api/v3");
        assert!(!resolver.has_token());
    }
}
