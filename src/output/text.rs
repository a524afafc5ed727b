//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Per-file listing of planned bumps with colors
//! - Change size indication for semver-looking tags (major/minor/patch)
//! - Report, rewrite and category summary lines

use crate::cli::Mode;
use crate::domain::{UpdateRecord, UNCATEGORIZED};
use crate::orchestrator::{OrchestratorResult, TokenCheck};
use crate::output::Verbosity;
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::Write;

/// Size of the jump between two refs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefChange {
    /// Major component changed
    Major,
    /// Minor component changed
    Minor,
    /// Only the patch component (or a suffix) changed
    Patch,
    /// At least one ref is not a version tag
    Unknown,
}

impl RefChange {
    /// Classify the change between two refs such as `v1.2.3` and `v1.4.0`
    pub fn between(current: &str, latest: &str) -> Self {
        fn parts(tag: &str) -> Option<(u64, u64)> {
            let tag = tag.strip_prefix('v').unwrap_or(tag);
            let mut numbers = tag.split(['.', '-', '+']);
            let major = numbers.next()?.parse().ok()?;
            let minor = match numbers.next() {
                Some(n) => n.parse().ok()?,
                None => 0,
            };
            Some((major, minor))
        }

        match (parts(current), parts(latest)) {
            (Some((a, _)), Some((b, _))) if a != b => RefChange::Major,
            (Some((_, a)), Some((_, b))) if a != b => RefChange::Minor,
            (Some(_), Some(_)) => RefChange::Patch,
            _ => RefChange::Unknown,
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            RefChange::Major => "major",
            RefChange::Minor => "minor",
            RefChange::Patch => "patch",
            RefChange::Unknown => "?",
        }
    }

    fn colored_label(&self) -> String {
        match self {
            RefChange::Major => self.label().red().bold().to_string(),
            RefChange::Minor => self.label().yellow().to_string(),
            RefChange::Patch => self.label().green().to_string(),
            RefChange::Unknown => self.label().dimmed().to_string(),
        }
    }
}

/// `Updates by category: a: 1, b: 2`, or `None` for an empty plan
///
/// Records without a category count as `uncategorized`.
pub fn category_summary(updates: &[UpdateRecord]) -> Option<String> {
    if updates.is_empty() {
        return None;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for update in updates {
        let category = update.category.as_deref().unwrap_or(UNCATEGORIZED);
        *counts.entry(category).or_default() += 1;
    }

    let parts: Vec<_> = counts
        .iter()
        .map(|(name, count)| format!("{}: {}", name, count))
        .collect();
    Some(format!("Updates by category: {}", parts.join(", ")))
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    /// Write the outcome of a run
    pub fn format(&self, result: &OrchestratorResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let quiet = self.verbosity == Verbosity::Quiet;

        if !quiet {
            match result.token_check {
                TokenCheck::Validated => writeln!(writer, "Tokens validated successfully.")?,
                TokenCheck::Skipped => {
                    writeln!(writer, "No token provided. Token validation skipped.")?
                }
                TokenCheck::NotRequested => {}
            }
        }

        if result.updates.is_empty() {
            if self.color {
                writeln!(writer, "{}", "No updates found.".dimmed())?;
            } else {
                writeln!(writer, "No updates found.")?;
            }
            return Ok(());
        }

        if !quiet {
            self.format_updates(&result.updates, writer)?;

            if let Some(path) = &result.markdown_path {
                writeln!(writer, "Markdown report written to {}.", path.display())?;
            }
            if let Some(path) = &result.report_path {
                writeln!(writer, "Report written to {}.", path.display())?;
            }
        }

        if result.mode == Mode::Update {
            if result.touched.is_empty() {
                writeln!(writer, "No updates applied.")?;
            } else if self.color {
                writeln!(
                    writer,
                    "Updated {} file(s).",
                    result.touched.len().to_string().green()
                )?;
            } else {
                writeln!(writer, "Updated {} file(s).", result.touched.len())?;
            }
            if self.verbosity == Verbosity::Verbose {
                for file in &result.touched {
                    writeln!(writer, "  {}", file)?;
                }
            }
        }

        if let Some(summary) = category_summary(&result.updates) {
            writeln!(writer, "{}", summary)?;
        }

        Ok(())
    }

    /// Write planned bumps grouped by file, in plan order
    pub fn format_updates(&self, updates: &[UpdateRecord], writer: &mut dyn Write) -> std::io::Result<()> {
        let mut by_file: Vec<(&str, Vec<&UpdateRecord>)> = Vec::new();
        for update in updates {
            match by_file.iter_mut().find(|(file, _)| *file == update.file) {
                Some((_, entries)) => entries.push(update),
                None => by_file.push((update.file.as_str(), vec![update])),
            }
        }

        for (file, entries) in by_file {
            let count = entries.len();
            let noun = if count == 1 { "update" } else { "updates" };
            if self.color {
                writeln!(writer, "{} — {} {}", file.bold(), count.to_string().green(), noun)?;
            } else {
                writeln!(writer, "{} — {} {}", file, count, noun)?;
            }

            let width = entries
                .iter()
                .map(|u| target(u).len())
                .max()
                .unwrap_or(0);
            for update in entries {
                self.format_update_line(update, width, writer)?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    fn format_update_line(
        &self,
        update: &UpdateRecord,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let change = RefChange::between(&update.current_ref, &update.latest_ref);
        let category = update
            .category
            .as_deref()
            .map(|c| format!(" ({})", c))
            .unwrap_or_default();

        if self.color {
            writeln!(
                writer,
                "  {:width$} {} {} {} [{}]{}",
                target(update),
                update.current_ref.dimmed(),
                "→".dimmed(),
                update.latest_ref.bright_white().bold(),
                change.colored_label(),
                category.dimmed(),
                width = width
            )
        } else {
            writeln!(
                writer,
                "  {:width$} {} -> {} [{}]{}",
                target(update),
                update.current_ref,
                update.latest_ref,
                change.label(),
                category,
                width = width
            )
        }
    }
}

/// `repo` or `repo//module`
fn target(update: &UpdateRecord) -> String {
    match &update.base_module {
        Some(module) => format!("{}//{}", update.repo, module),
        None => update.repo.clone(),
    }
}
