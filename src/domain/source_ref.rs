//! Module source reference found in an infrastructure file

use serde::{Deserialize, Serialize};
use std::fmt;

/// One pinned module source occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Path of the containing file, relative to the scan root
    pub file_path: String,
    /// The `source` value exactly as written; used as the replacement anchor
    pub raw: String,
    /// Repository path without `.git` (e.g. `org/repo`)
    pub repo: String,
    /// Repository URL without subpath, query or `.git`
    pub repo_url: String,
    /// Network authority of the repository URL
    pub repo_host: String,
    /// Pinned tag, branch or commit
    #[serde(rename = "ref")]
    pub ref_: String,
    /// Subpath inside the repository, `None` for the root module
    pub module: Option<String>,
}

impl SourceRef {
    /// Sets the owning file path (builder pattern)
    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    /// Key identifying the repository across hosts, used for memoization
    pub fn repo_key(&self) -> String {
        format!("{}/{}", self.repo_host, self.repo)
    }

    /// Module name, or `root` when the reference points at the repository root
    pub fn module_or_root(&self) -> &str {
        self.module.as_deref().unwrap_or(ROOT_MODULE)
    }
}

/// Sentinel module name for references without a subpath
pub const ROOT_MODULE: &str = "root";

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{}//{}@{}", self.repo, module, self.ref_),
            None => write!(f, "{}@{}", self.repo, self.ref_),
        }
    }
}
