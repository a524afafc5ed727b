//! Source tree scanning
//!
//! This module provides:
//! - Recursive discovery of infrastructure files under a root directory
//! - Include/exclude glob filtering (defaults: `**/*.hcl`, `**/*.tf`)
//! - Blacklist filtering by file, repository and module
//! - Module reference extraction (see [`extractor`])

pub mod extractor;

pub use extractor::{extract_sources, parse_git_source};

use crate::domain::{Blacklist, SourceRef};
use crate::error::ScanError;
use crate::pattern::PatternSet;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Include patterns used when none are given
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.hcl", "**/*.tf"];

/// Filters applied while scanning
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// File globs to include (empty means [`DEFAULT_INCLUDE`])
    pub include: Vec<String>,
    /// File globs to exclude
    pub exclude: Vec<String>,
    /// Blacklist from configuration
    pub blacklist: Blacklist,
}

impl ScanOptions {
    /// Create options with default include patterns and no filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set include patterns
    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    /// Set exclude patterns
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set the blacklist
    pub fn with_blacklist(mut self, blacklist: Blacklist) -> Self {
        self.blacklist = blacklist;
        self
    }
}

/// Compiled form of [`ScanOptions`]
struct Filters {
    include: PatternSet,
    exclude: PatternSet,
    blacklist_files: PatternSet,
    blacklist_repos: PatternSet,
    blacklist_modules: PatternSet,
}

impl Filters {
    fn compile(options: &ScanOptions) -> Result<Self, ScanError> {
        let include = if options.include.is_empty() {
            PatternSet::compile(DEFAULT_INCLUDE)?
        } else {
            PatternSet::compile(&options.include)?
        };

        Ok(Self {
            include,
            exclude: PatternSet::compile(&options.exclude)?,
            blacklist_files: PatternSet::compile(&options.blacklist.files)?,
            blacklist_repos: PatternSet::compile(&options.blacklist.repos)?,
            blacklist_modules: PatternSet::compile(&options.blacklist.modules)?,
        })
    }

    fn accepts_file(&self, rel_path: &str) -> bool {
        self.include.matches(rel_path)
            && !self.exclude.matches(rel_path)
            && !self.blacklist_files.matches(rel_path)
    }

    fn accepts_source(&self, source: &SourceRef) -> bool {
        if self.blacklist_repos.matches(&source.repo) {
            return false;
        }
        match &source.module {
            Some(module) => !self.blacklist_modules.matches(module),
            None => true,
        }
    }
}

/// Scan `root` and return every accepted module reference in discovery order
///
/// Files that cannot be read as text are skipped.
pub fn scan_sources(root: &Path, options: &ScanOptions) -> Result<Vec<SourceRef>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let filters = Filters::compile(options)?;
    let mut results = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(rel_path) = relative_path(root, entry.path()) else {
            continue;
        };
        if !filters.accepts_file(&rel_path) {
            continue;
        }

        let content = match std::fs::read_to_string(entry.path()) {
            Ok(c) => c,
            Err(e) => {
                debug!("skipping {}: {}", rel_path, e);
                continue;
            }
        };

        let before = results.len();
        results.extend(
            extract_sources(&content)
                .filter(|source| filters.accepts_source(source))
                .map(|source| source.with_file_path(rel_path.as_str())),
        );
        debug!("{}: {} reference(s)", rel_path, results.len() - before);
    }

    Ok(results)
}

/// Root-relative path with `/` separators
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
