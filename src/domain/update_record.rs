//! Planned edit for one stale module pin occurrence

use super::SourceRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy tag carried by every record
pub const LATEST_STRATEGY: &str = "latest";

/// Literal text replacement applied to the owning file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// Text to find (first occurrence only)
    pub from: String,
    /// Text to put in its place
    pub to: String,
}

/// One pending edit: a stale occurrence paired with its resolved ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Repository path
    pub repo: String,
    /// Repository host
    pub repo_host: String,
    /// Repository URL
    pub repo_url: String,
    /// Per-occurrence module id: `<module or root>@<file>`
    pub module: String,
    /// Module subpath as written, kept for display grouping
    pub base_module: Option<String>,
    /// File owning the occurrence
    pub file: String,
    /// Ref currently pinned
    pub current_ref: String,
    /// Ref to pin instead
    pub latest_ref: String,
    /// Always `latest`
    pub strategy: String,
    /// Files touched by this record (always just `file`)
    pub files: Vec<String>,
    /// Replacements to apply (always exactly one)
    pub replacements: Vec<Replacement>,
    /// Category assigned by the first matching rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl UpdateRecord {
    /// Creates a record bumping `source` to `latest_ref`
    ///
    /// Every `ref=<current>` inside the raw source string becomes
    /// `ref=<latest>`; the rest of the string is left untouched.
    pub fn new(source: &SourceRef, latest_ref: impl Into<String>) -> Self {
        let latest_ref = latest_ref.into();
        let to = source.raw.replace(
            &format!("ref={}", source.ref_),
            &format!("ref={}", latest_ref),
        );

        Self {
            repo: source.repo.clone(),
            repo_host: source.repo_host.clone(),
            repo_url: source.repo_url.clone(),
            module: format!("{}@{}", source.module_or_root(), source.file_path),
            base_module: source.module.clone(),
            file: source.file_path.clone(),
            current_ref: source.ref_.clone(),
            latest_ref,
            strategy: LATEST_STRATEGY.to_string(),
            files: vec![source.file_path.clone()],
            replacements: vec![Replacement {
                from: source.raw.clone(),
                to,
            }],
            category: None,
        }
    }

    /// Sets the category (builder pattern)
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Module name used for display grouping
    pub fn display_module(&self) -> &str {
        self.base_module
            .as_deref()
            .unwrap_or(super::source_ref::ROOT_MODULE)
    }
}

impl fmt::Display for UpdateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} -> {} in {}",
            self.repo,
            self.display_module(),
            self.current_ref,
            self.latest_ref,
            self.file
        )
    }
}
