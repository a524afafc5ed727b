//! Markdown rendering of a report
//!
//! Updates are grouped by repository, then by module; each entry lists at
//! most three affected files.

use crate::domain::{UpdateRecord, ROOT_MODULE};
use crate::error::WriteError;
use crate::output::Report;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const TITLE: &str = "# Pinbump Report";

/// Files listed per entry before collapsing into "... and N more"
const MAX_LISTED_FILES: usize = 3;

/// Render `report` as Markdown
pub fn generate_markdown(report: &Report) -> String {
    if report.updates.is_empty() {
        return format!("{}\n\nNo updates available.\n", TITLE);
    }

    let mut by_repo: BTreeMap<&str, Vec<&UpdateRecord>> = BTreeMap::new();
    for update in &report.updates {
        by_repo.entry(update.repo.as_str()).or_default().push(update);
    }
    let module_ids: HashSet<&str> = report.updates.iter().map(|u| u.module.as_str()).collect();

    let mut lines = vec![
        TITLE.to_string(),
        String::new(),
        format!("**Generated at:** {}", report.generated_at),
        format!("**Root:** `{}`", report.root),
        String::new(),
        "## Summary".to_string(),
        String::new(),
        format!("- **Total updates:** {}", report.updates.len()),
        format!("- **Affected repositories:** {}", by_repo.len()),
        format!("- **Affected modules:** {}", module_ids.len()),
        String::new(),
        "## Updates by Repository".to_string(),
        String::new(),
    ];

    for (repo, updates) in &by_repo {
        lines.push(format!("### {} ({})", repo, updates[0].repo_host));
        lines.push(String::new());

        let mut by_module: BTreeMap<&str, Vec<&UpdateRecord>> = BTreeMap::new();
        for update in updates {
            by_module
                .entry(update.display_module())
                .or_default()
                .push(update);
        }

        for (module, entries) in by_module {
            if module == ROOT_MODULE {
                lines.push("#### Root".to_string());
            } else {
                lines.push(format!("#### Module: `{}`", module));
            }
            lines.push(String::new());

            for update in entries {
                push_entry(&mut lines, update);
            }
        }
    }

    lines.join("\n")
}

fn push_entry(lines: &mut Vec<String>, update: &UpdateRecord) {
    lines.push(format!("**{} → {}**", update.current_ref, update.latest_ref));
    if let Some(category) = &update.category {
        lines.push(format!("- Category: `{}`", category));
    }
    lines.push(format!("- Affected files: {}", update.files.len()));
    for file in update.files.iter().take(MAX_LISTED_FILES) {
        lines.push(format!("  - `{}`", file));
    }
    if update.files.len() > MAX_LISTED_FILES {
        lines.push(format!(
            "  - ... and {} more",
            update.files.len() - MAX_LISTED_FILES
        ));
    }
    lines.push(String::new());
}

/// Write the Markdown rendering of `report` to `path`
pub fn write_markdown(path: &Path, report: &Report) -> Result<(), WriteError> {
    std::fs::write(path, generate_markdown(report)).map_err(|e| WriteError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
