//! Progress display for a pinbump run
//!
//! Provides visual feedback while scanning and resolving using indicatif.
//! Output goes to stderr and is hidden when it is not a terminal.

use crate::domain::SourceRef;
use crate::resolver::LatestRefLookup;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for the run
pub struct Progress {
    /// Whether progress display is enabled (disabled in quiet mode)
    enabled: bool,
    /// Current progress bar
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a new progress reporter
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Create a disabled progress reporter
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Show a spinner with a message for an indeterminate operation
    pub fn spinner(&mut self, message: &str) {
        if !self.enabled {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.bar = Some(spinner);
    }

    /// Start a progress bar for a known number of repositories
    pub fn start(&mut self, total: u64, message: &str) {
        if !self.enabled {
            return;
        }

        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
        {
            bar.set_style(style.progress_chars("█▓▒░"));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    /// Increment progress by one
    pub fn inc(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    /// Update the message
    pub fn set_message(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Finish and clear the current progress bar
    pub fn finish_and_clear(&mut self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        self.bar = None;
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Lookup that ticks a [`Progress`] bar once per resolved repository
pub struct ProgressLookup<'a> {
    inner: &'a dyn LatestRefLookup,
    progress: &'a Progress,
}

impl<'a> ProgressLookup<'a> {
    /// Wrap `inner`, reporting on `progress`
    pub fn new(inner: &'a dyn LatestRefLookup, progress: &'a Progress) -> Self {
        Self { inner, progress }
    }
}

#[async_trait]
impl LatestRefLookup for ProgressLookup<'_> {
    async fn latest_ref(&self, source: &SourceRef) -> Option<String> {
        self.progress
            .set_message(&format!("Resolving {}", source.repo_key()));
        let latest = self.inner.latest_ref(source).await;
        self.progress.inc();
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl LatestRefLookup for Fixed {
        async fn latest_ref(&self, _source: &SourceRef) -> Option<String> {
            Some("v9".to_string())
        }
    }

    fn source() -> SourceRef {
        SourceRef {
            file_path: "main.tf".to_string(),
            raw: "git::https://example.com/org/repo.git?ref=v1".to_string(),
            repo: "org/repo".to_string(),
            repo_url: "https://example.com/org/repo".to_string(),
            repo_host: "example.com".to_string(),
            ref_: "v1".to_string(),
            module: None,
        }
    }

    #[test]
    fn test_progress_disabled() {
        let mut progress = Progress::disabled();
        progress.spinner("test");
        progress.start(10, "test");
        progress.inc();
        progress.set_message("test");
        progress.finish_and_clear();
    }

    #[test]
    fn test_progress_enabled() {
        let mut progress = Progress::new(true);
        progress.start(3, "Resolving");
        progress.inc();
        progress.set_message("org/repo");
        progress.finish_and_clear();
    }

    #[tokio::test]
    async fn test_progress_lookup_delegates() {
        let mut progress = Progress::new(true);
        progress.start(1, "Resolving");
        let lookup = ProgressLookup::new(&Fixed, &progress);
        assert_eq!(lookup.latest_ref(&source()).await.as_deref(), Some("v9"));
        progress.finish_and_clear();
    }
}
