//! pinbump - pinned module ref updater library
//!
//! This library provides the core functionality for keeping version-pinned
//! module sources up to date in infrastructure-as-code files:
//! - Terraform (`*.tf`)
//! - Terragrunt (`*.hcl`)
//!
//! Latest refs are looked up through `git ls-remote`, the GitHub API or the
//! GitLab API.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod pattern;
pub mod progress;
pub mod resolver;
pub mod scanner;
pub mod update;
pub mod writer;
