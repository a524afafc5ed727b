//! Integration tests for pinbump
//!
//! These tests verify:
//! - Source scanning across Terraform and Terragrunt files
//! - Planning and rewriting of duplicated pins
//! - Configuration loading and category assignment
//! - Backend cascade fallback against a mocked GitHub API

use async_trait::async_trait;
use pinbump::domain::SourceRef;
use pinbump::resolver::LatestRefLookup;
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

/// Test fixture directory creation helper
fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Lookup answering from a fixed table and recording every query
#[derive(Default)]
struct TableLookup {
    latest: HashMap<String, String>,
    queried: Mutex<Vec<String>>,
}

impl TableLookup {
    fn with(mut self, repo: &str, latest: &str) -> Self {
        self.latest.insert(repo.to_string(), latest.to_string());
        self
    }

    fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl LatestRefLookup for TableLookup {
    async fn latest_ref(&self, source: &SourceRef) -> Option<String> {
        self.queried.lock().unwrap().push(source.repo_key());
        self.latest.get(&source.repo).cloned()
    }
}

const STACK_TF: &str = r#"module "vpc" {
  source = "git::https://github.com/acme/network.git//modules/vpc?ref=v1.0.0"
}

module "vpc_replica" {
  source = "git::https://github.com/acme/network.git//modules/vpc?ref=v1.0.0"
}

module "dns" {
  source = "git::ssh://git@gitlab.example.com/platform/dns.git?ref=v0.3.0"
}

module "registry" {
  source = "hashicorp/consul/aws"
}
"#;

const TERRAGRUNT_HCL: &str = r#"terraform {
  source = "git::https://github.com/acme/database.git//rds?ref=v2.0.0"
}
"#;

fn create_stack() -> TempDir {
    let dir = create_test_dir();
    fs::write(dir.path().join("stack.tf"), STACK_TF).unwrap();
    fs::create_dir_all(dir.path().join("live/prod")).unwrap();
    fs::write(dir.path().join("live/prod/terragrunt.hcl"), TERRAGRUNT_HCL).unwrap();
    fs::write(dir.path().join("README.md"), "ref=v1.0.0").unwrap();
    dir
}

mod source_scanning {
    use super::*;
    use pinbump::domain::Blacklist;
    use pinbump::scanner::{scan_sources, ScanOptions};

    #[test]
    fn test_scan_finds_git_pins_only() {
        let dir = create_stack();

        let sources = scan_sources(dir.path(), &ScanOptions::new()).unwrap();

        assert_eq!(sources.len(), 4);
        assert_eq!(sources[0].file_path, "live/prod/terragrunt.hcl");
        assert_eq!(sources[0].repo, "acme/database");
        assert_eq!(sources[0].module.as_deref(), Some("rds"));

        let dns = sources.iter().find(|s| s.repo == "platform/dns").unwrap();
        assert_eq!(dns.repo_host, "gitlab.example.com");
        assert_eq!(dns.ref_, "v0.3.0");
        assert_eq!(dns.module, None);
    }

    #[test]
    fn test_scan_keeps_duplicate_occurrences() {
        let dir = create_stack();

        let sources = scan_sources(dir.path(), &ScanOptions::new()).unwrap();
        let vpc: Vec<_> = sources
            .iter()
            .filter(|s| s.module.as_deref() == Some("modules/vpc"))
            .collect();

        assert_eq!(vpc.len(), 2);
        assert!(vpc.iter().all(|s| s.file_path == "stack.tf"));
    }

    #[test]
    fn test_scan_with_exclude_and_blacklist() {
        let dir = create_stack();
        let blacklist = Blacklist {
            repos: vec!["platform/*".to_string()],
            ..Default::default()
        };
        let options = ScanOptions::new()
            .with_exclude(vec!["live/**".to_string()])
            .with_blacklist(blacklist);

        let sources = scan_sources(dir.path(), &options).unwrap();

        assert_eq!(sources.len(), 2);
        assert!(sources.iter().all(|s| s.repo == "acme/network"));
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = create_test_dir();
        let missing = dir.path().join("nope");

        assert!(scan_sources(&missing, &ScanOptions::new()).is_err());
    }
}

mod plan_and_apply {
    use super::*;
    use pinbump::scanner::{scan_sources, ScanOptions};
    use pinbump::update::UpdatePlanner;
    use pinbump::writer::apply_updates;

    #[tokio::test]
    async fn test_each_repository_is_resolved_once() {
        let dir = create_stack();
        let sources = scan_sources(dir.path(), &ScanOptions::new()).unwrap();
        let lookup = TableLookup::default().with("acme/network", "v1.1.0");

        let updates = UpdatePlanner::default().plan(&lookup, &sources).await;

        assert_eq!(updates.len(), 2);
        let queried = lookup.queried();
        assert_eq!(
            queried.iter().filter(|k| *k == "github.com/acme/network").count(),
            1
        );
        assert_eq!(queried.len(), 3);
    }

    #[tokio::test]
    async fn test_apply_rewrites_duplicates_and_preserves_layout() {
        let dir = create_stack();
        let sources = scan_sources(dir.path(), &ScanOptions::new()).unwrap();
        let lookup = TableLookup::default()
            .with("acme/network", "v1.1.0")
            .with("platform/dns", "v0.4.0");

        let updates = UpdatePlanner::default().plan(&lookup, &sources).await;
        let touched = apply_updates(dir.path(), &updates);

        assert_eq!(touched, vec!["stack.tf".to_string()]);
        let content = fs::read_to_string(dir.path().join("stack.tf")).unwrap();
        let expected = STACK_TF
            .replace("?ref=v1.0.0", "?ref=v1.1.0")
            .replace("?ref=v0.3.0", "?ref=v0.4.0");
        assert_eq!(content, expected);

        let untouched = fs::read_to_string(dir.path().join("live/prod/terragrunt.hcl")).unwrap();
        assert_eq!(untouched, TERRAGRUNT_HCL);
    }

    #[tokio::test]
    async fn test_second_pass_finds_nothing() {
        let dir = create_stack();
        let lookup = TableLookup::default()
            .with("acme/network", "v1.1.0")
            .with("acme/database", "v2.1.0");
        let planner = UpdatePlanner::default();

        let sources = scan_sources(dir.path(), &ScanOptions::new()).unwrap();
        let first = planner.plan(&lookup, &sources).await;
        assert_eq!(first.len(), 3);
        apply_updates(dir.path(), &first);

        let sources = scan_sources(dir.path(), &ScanOptions::new()).unwrap();
        let second = planner.plan(&lookup, &sources).await;
        assert!(second.is_empty());
        assert!(apply_updates(dir.path(), &second).is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_repositories_produce_no_records() {
        let dir = create_stack();
        let sources = scan_sources(dir.path(), &ScanOptions::new()).unwrap();

        let updates = UpdatePlanner::default()
            .plan(&TableLookup::default(), &sources)
            .await;

        assert!(updates.is_empty());
    }
}

mod configuration {
    use super::*;
    use pinbump::config::load_config;
    use pinbump::scanner::{scan_sources, ScanOptions};
    use pinbump::update::UpdatePlanner;
    use std::path::Path;

    #[test]
    fn test_yaml_config_from_root() {
        let dir = create_test_dir();
        fs::write(
            dir.path().join(".pinbump.yaml"),
            r#"categories:
  - name: networking
    repo_patterns: ["acme/network"]
  - module_patterns: ["ignored"]
  - name: data
    module_patterns: ["rds"]
blacklist:
  files: ["legacy/**"]
"#,
        )
        .unwrap();

        let config = load_config(Path::new(".pinbump.yaml"), dir.path()).unwrap();

        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].name, "networking");
        assert_eq!(config.categories[1].name, "data");
        assert_eq!(config.blacklist.files, vec!["legacy/**".to_string()]);
    }

    #[test]
    fn test_missing_config_is_empty() {
        let dir = create_test_dir();

        let config = load_config(Path::new(".pinbump.yaml"), dir.path()).unwrap();

        assert!(config.categories.is_empty());
        assert!(config.blacklist.is_empty());
    }

    #[test]
    fn test_toml_config() {
        let dir = create_test_dir();
        let path = dir.path().join("rules.toml");
        fs::write(
            &path,
            r#"[[categories]]
name = "networking"
repo_patterns = ["acme/*"]
"#,
        )
        .unwrap();

        let config = load_config(&path, dir.path()).unwrap();

        assert_eq!(config.categories.len(), 1);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = create_test_dir();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(load_config(&path, dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_categories_follow_rule_order() {
        let dir = create_stack();
        fs::write(
            dir.path().join(".pinbump.yaml"),
            r#"categories:
  - name: data
    module_patterns: ["rds"]
  - name: acme
    repo_patterns: ["acme/*"]
"#,
        )
        .unwrap();
        let config = load_config(Path::new(".pinbump.yaml"), dir.path()).unwrap();
        let sources = scan_sources(dir.path(), &ScanOptions::new()).unwrap();
        let lookup = TableLookup::default()
            .with("acme/network", "v1.1.0")
            .with("acme/database", "v2.1.0")
            .with("platform/dns", "v0.4.0");

        let updates = UpdatePlanner::new(config.categories).plan(&lookup, &sources).await;

        let category = |repo: &str| {
            updates
                .iter()
                .find(|u| u.repo == repo)
                .and_then(|u| u.category.clone())
        };
        assert_eq!(category("acme/database").as_deref(), Some("data"));
        assert_eq!(category("acme/network").as_deref(), Some("acme"));
        assert_eq!(category("platform/dns").as_deref(), Some("uncategorized"));
    }
}

mod reporting {
    use super::*;
    use pinbump::output::{build_report, generate_markdown, render_report, write_report};
    use pinbump::scanner::{scan_sources, ScanOptions};
    use pinbump::update::UpdatePlanner;

    #[tokio::test]
    async fn test_report_round_trips_through_disk() {
        let dir = create_stack();
        let sources = scan_sources(dir.path(), &ScanOptions::new()).unwrap();
        let lookup = TableLookup::default().with("acme/network", "v1.1.0");
        let updates = UpdatePlanner::default().plan(&lookup, &sources).await;

        let report = build_report(dir.path(), &updates);
        let path = dir.path().join("out/report.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        write_report(&path, &report).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_report(&report).unwrap());

        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        let first = &value["updates"][0];
        assert_eq!(first["module"], "modules/vpc@stack.tf");
        assert_eq!(first["strategy"], "latest");
        assert_eq!(first["files"], serde_json::json!(["stack.tf"]));
    }

    #[tokio::test]
    async fn test_markdown_groups_duplicates_under_one_module() {
        let dir = create_stack();
        let sources = scan_sources(dir.path(), &ScanOptions::new()).unwrap();
        let lookup = TableLookup::default()
            .with("acme/network", "v1.1.0")
            .with("platform/dns", "v0.4.0");
        let updates = UpdatePlanner::default().plan(&lookup, &sources).await;

        let markdown = generate_markdown(&build_report(dir.path(), &updates));

        assert!(markdown.contains("- **Total updates:** 3"));
        assert!(markdown.contains("- **Affected repositories:** 2"));
        assert_eq!(markdown.matches("#### Module: `modules/vpc`").count(), 1);
        assert!(markdown.contains("### platform/dns (gitlab.example.com)"));
        assert!(markdown.contains("#### Root"));
    }
}

mod backend_cascade {
    use super::*;
    use mockito::Server;
    use pinbump::resolver::{
        Backend, GitHubResolver, HttpClient, RefResolver, ResolverCascade, Strategy,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Backend stand-in answering a fixed ref
    struct Canned {
        backend: Backend,
        answer: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl Canned {
        fn boxed(backend: Backend, answer: Option<&'static str>) -> (Box<dyn RefResolver>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let resolver = Canned {
                backend,
                answer,
                calls: Arc::clone(&calls),
            };
            (Box::new(resolver), calls)
        }
    }

    #[async_trait]
    impl RefResolver for Canned {
        fn backend(&self) -> Backend {
            self.backend
        }

        async fn latest_ref(&self, _source: &SourceRef) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.map(str::to_string)
        }
    }

    fn github_source() -> SourceRef {
        pinbump::scanner::parse_git_source("git::https://github.com/acme/network.git?ref=v1.0.0")
            .unwrap()
    }

    #[tokio::test]
    async fn test_github_release_wins_under_github_strategy() {
        let mut server = Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/acme/network/releases/latest")
            .with_status(200)
            .with_body(r#"{"tag_name": "v1.4.0"}"#)
            .create_async()
            .await;
        let github = GitHubResolver::new(HttpClient::new().unwrap(), &server.url(), None);
        let (git, git_calls) = Canned::boxed(Backend::Git, Some("v9.9.9"));
        let (gitlab, _) = Canned::boxed(Backend::GitLab, None);

        let cascade = ResolverCascade::new(Strategy::Github, git, Box::new(github), gitlab);

        assert_eq!(cascade.latest_ref(&github_source()).await.as_deref(), Some("v1.4.0"));
        assert_eq!(git_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_git_when_github_fails() {
        let mut server = Server::new_async().await;
        let _missing = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        let github = GitHubResolver::new(HttpClient::new().unwrap(), &server.url(), None);
        let (git, git_calls) = Canned::boxed(Backend::Git, Some("v1.2.0"));
        let (gitlab, gitlab_calls) = Canned::boxed(Backend::GitLab, Some("v0.0.1"));

        let cascade = ResolverCascade::new(Strategy::Github, git, Box::new(github), gitlab);

        assert_eq!(cascade.latest_ref(&github_source()).await.as_deref(), Some("v1.2.0"));
        assert_eq!(git_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gitlab_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_every_backend_failing_yields_none() {
        let (git, _) = Canned::boxed(Backend::Git, None);
        let (github, _) = Canned::boxed(Backend::GitHub, None);
        let (gitlab, _) = Canned::boxed(Backend::GitLab, None);

        let cascade = ResolverCascade::new(Strategy::Auto, git, github, gitlab);

        assert_eq!(cascade.latest_ref(&github_source()).await, None);
    }
}
