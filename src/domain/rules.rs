//! Category rules and blacklist supplied by configuration

use crate::pattern::matches_any;
use serde::{Deserialize, Serialize};

/// Category assigned when rules exist but none match
pub const UNCATEGORIZED: &str = "uncategorized";

/// Ordered categorization rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category name
    pub name: String,
    /// Glob patterns matched against the repository path
    #[serde(default)]
    pub repo_patterns: Vec<String>,
    /// Glob patterns matched against the module subpath
    #[serde(default)]
    pub module_patterns: Vec<String>,
}

impl CategoryRule {
    /// Creates a rule with no patterns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the repository patterns (builder pattern)
    pub fn with_repo_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repo_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the module patterns (builder pattern)
    pub fn with_module_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if the repository matches a repo pattern, or the module
    /// (when there is one) matches a module pattern
    pub fn matches(&self, repo: &str, module: Option<&str>) -> bool {
        if matches_any(repo, &self.repo_patterns) {
            return true;
        }
        module.is_some_and(|m| matches_any(m, &self.module_patterns))
    }
}

/// Exclusion filters applied before resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blacklist {
    /// Repository path globs
    #[serde(default)]
    pub repos: Vec<String>,
    /// Module subpath globs
    #[serde(default)]
    pub modules: Vec<String>,
    /// Root-relative file path globs
    #[serde(default)]
    pub files: Vec<String>,
}

impl Blacklist {
    /// Returns true if no filter is configured
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty() && self.modules.is_empty() && self.files.is_empty()
    }
}
