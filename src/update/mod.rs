//! Update planning
//!
//! This module provides:
//! - Memoized latest-ref resolution, one lookup per repository per run
//! - One [`UpdateRecord`] per stale occurrence, never merged across files
//! - Category assignment from ordered rules

use crate::domain::{CategoryRule, SourceRef, UpdateRecord, UNCATEGORIZED};
use crate::resolver::LatestRefLookup;
use std::collections::HashMap;
use tracing::debug;

/// Turns scanned references into an update plan
#[derive(Debug, Clone, Default)]
pub struct UpdatePlanner {
    /// Ordered category rules; the first match wins
    rules: Vec<CategoryRule>,
}

impl UpdatePlanner {
    /// Create a planner with the given category rules
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// Build the plan for `sources`, in discovery order
    ///
    /// `lookup` is asked at most once per repository; a missing answer is
    /// remembered as well.
    pub async fn plan(
        &self,
        lookup: &dyn LatestRefLookup,
        sources: &[SourceRef],
    ) -> Vec<UpdateRecord> {
        let mut memo: HashMap<String, Option<String>> = HashMap::new();
        let mut updates = Vec::new();

        for source in sources {
            let key = source.repo_key();
            let latest = match memo.get(&key) {
                Some(cached) => cached.clone(),
                None => {
                    let resolved = lookup.latest_ref(source).await;
                    memo.insert(key, resolved.clone());
                    resolved
                }
            };

            let Some(latest) = latest else {
                debug!("no latest ref for {}", source);
                continue;
            };
            if latest == source.ref_ {
                debug!("{} is up to date", source);
                continue;
            }

            let category = categorize(&self.rules, &source.repo, source.module.as_deref());
            updates.push(UpdateRecord::new(source, latest).with_category(category));
        }

        updates
    }
}

/// Category for a repository/module pair
///
/// `None` when there are no rules, [`UNCATEGORIZED`] when no rule matches.
pub fn categorize(rules: &[CategoryRule], repo: &str, module: Option<&str>) -> Option<String> {
    if rules.is_empty() {
        return None;
    }

    let name = rules
        .iter()
        .find(|rule| rule.matches(repo, module))
        .map(|rule| rule.name.as_str())
        .unwrap_or(UNCATEGORIZED);
    Some(name.to_string())
}
