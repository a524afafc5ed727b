//! Module source extraction
//!
//! Finds `source = "..."` assignments and keeps those whose value is a
//! Git-style module reference:
//!
//! ```text
//! [git::]<scheme>://<host>/<path>[.git][//<subpath>]?ref=<ref>
//! ```
//!
//! Local paths and registry addresses are skipped without error.

use crate::domain::SourceRef;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// `source = "value"` or `source = 'value'`
static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"source\s*=\s*(?:"(?P<dq>[^'"]+)"|'(?P<sq>[^'"]+)')"#).unwrap()
});

/// Git module reference; the URL is matched lazily so `.git` and `//subpath`
/// are split off before the query string
static GIT_SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:git::)?(?P<url>[A-Za-z][A-Za-z0-9+.\-]*://[^?]+?)(?:\.git)?(?P<module>//[^?]+)?\?ref=(?P<ref>[^&]+)",
    )
    .unwrap()
});

/// Extracts every Git module reference from file content
///
/// The returned iterator is lazy; call again to restart. `file_path` is left
/// empty for the caller to fill in.
pub fn extract_sources(content: &str) -> impl Iterator<Item = SourceRef> + '_ {
    SOURCE_RE.captures_iter(content).filter_map(|caps| {
        let value = caps.name("dq").or_else(|| caps.name("sq"))?;
        parse_git_source(value.as_str())
    })
}

/// Parses one `source` value, returning `None` when it is not a Git reference
pub fn parse_git_source(source: &str) -> Option<SourceRef> {
    let caps = GIT_SOURCE_RE.captures(source)?;

    let repo_url = caps.name("url")?.as_str();
    let ref_ = caps.name("ref")?.as_str();
    let module = caps
        .name("module")
        .map(|m| m.as_str().trim_start_matches('/').to_string())
        .filter(|m| !m.is_empty());

    let parsed = Url::parse(repo_url).ok()?;
    // Non-special schemes such as ssh keep the host's case
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())?
        .to_ascii_lowercase();
    let repo_host = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let path = parsed.path().trim_start_matches('/');
    let repo = path.strip_suffix(".git").unwrap_or(path);
    if repo.is_empty() {
        return None;
    }

    Some(SourceRef {
        file_path: String::new(),
        raw: source.to_string(),
        repo: repo.to_string(),
        repo_url: repo_url.to_string(),
        repo_host,
        ref_: ref_.to_string(),
        module,
    })
}
