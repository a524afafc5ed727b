//! Applying an update plan to files
//!
//! This module provides:
//! - Grouping of records by owning file, in plan order
//! - First-unreplaced-occurrence literal substitution, so N identical pins in one file
//!   are bumped by exactly N records
//! - Write-back only when the content actually changed

use crate::domain::UpdateRecord;
use crate::error::WriteError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

/// Apply every record's replacements to `content`, one occurrence each
///
/// Each search for a given `from` resumes after the text inserted for it
/// last time, so a `to` that contains `from` is never matched again.
pub fn apply_replacements<'a, I>(content: &str, updates: I) -> String
where
    I: IntoIterator<Item = &'a UpdateRecord>,
{
    let mut current = content.to_string();
    let mut resume_at: HashMap<&str, usize> = HashMap::new();

    for update in updates {
        for replacement in &update.replacements {
            let from = replacement.from.as_str();
            let start = resume_at.get(from).copied().unwrap_or(0);
            let Some(pos) = current[start..].find(from).map(|i| start + i) else {
                debug!("{}: '{}' not found", update.file, from);
                continue;
            };

            current.replace_range(pos..pos + from.len(), &replacement.to);
            let end = pos + replacement.to.len();

            // Offsets past the edit move with the text after it
            for offset in resume_at.values_mut() {
                if *offset > pos {
                    let shifted = (*offset + replacement.to.len()).saturating_sub(from.len());
                    *offset = shifted.max(end);
                }
            }
            resume_at.insert(from, end);
        }
    }
    current
}

/// Rewrite one file with its records; returns whether it was modified
pub fn rewrite_file(path: &Path, updates: &[&UpdateRecord]) -> Result<bool, WriteError> {
    let content = fs::read_to_string(path).map_err(|e| WriteError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let updated = apply_replacements(&content, updates.iter().copied());
    if updated == content {
        return Ok(false);
    }

    fs::write(path, updated).map_err(|e| WriteError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(true)
}

/// Apply `updates` to files under `root`
///
/// Returns the root-relative paths of modified files in first-seen order.
/// Files that cannot be read or written are logged and left out.
pub fn apply_updates(root: &Path, updates: &[UpdateRecord]) -> Vec<String> {
    let mut groups: Vec<(&str, Vec<&UpdateRecord>)> = Vec::new();
    for update in updates {
        match groups.iter_mut().find(|(file, _)| *file == update.file) {
            Some((_, records)) => records.push(update),
            None => groups.push((update.file.as_str(), vec![update])),
        }
    }

    let mut touched = Vec::new();
    for (file, records) in groups {
        match rewrite_file(&root.join(file), &records) {
            Ok(true) => {
                info!("Updated {} ({} change(s))", file, records.len());
                touched.push(file.to_string());
            }
            Ok(false) => debug!("{}: nothing to change", file),
            Err(e @ WriteError::Read { .. }) => debug!("skipping {}: {}", file, e),
            Err(e) => error!("{}", e),
        }
    }

    touched
}
