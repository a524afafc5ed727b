//! Glob matching for include/exclude lists, blacklists and category rules
//!
//! Patterns use shell-style wildcards where `*` also matches `/`, so
//! `org/*` matches `org/team/repo` and `**/*.tf` matches files at any depth.

use crate::error::ScanError;
use glob::{MatchOptions, Pattern};
use tracing::debug;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled list of glob patterns
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compiles every pattern, failing on the first invalid one
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ScanError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref())
                    .map_err(|e| ScanError::invalid_pattern(p.as_ref(), e.msg))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Returns true if no patterns were given
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true if any pattern matches
    pub fn matches(&self, value: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(value, MATCH_OPTIONS))
    }
}

/// Returns true if `value` matches any of `patterns`
///
/// Invalid patterns never match.
pub fn matches_any<S: AsRef<str>>(value: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| match Pattern::new(p.as_ref()) {
        Ok(pattern) => pattern.matches_with(value, MATCH_OPTIONS),
        Err(e) => {
            debug!("ignoring invalid pattern '{}': {}", p.as_ref(), e.msg);
            false
        }
    })
}
