//! JSON report of an update plan
//!
//! The report is written as pretty-printed JSON with sorted keys and a
//! trailing newline, so repeated runs produce stable diffs.

use crate::domain::UpdateRecord;
use crate::error::WriteError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Update plan plus run metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// RFC 3339 UTC timestamp of the run
    pub generated_at: String,
    /// Root directory as given on the command line
    pub root: String,
    /// Planned updates, in plan order
    pub updates: Vec<UpdateRecord>,
}

impl Report {
    /// Whether the plan is empty
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Build a report stamped with the current time
pub fn build_report(root: &Path, updates: &[UpdateRecord]) -> Report {
    build_report_at(root, updates, Utc::now())
}

/// Build a report stamped with `now`
pub fn build_report_at(root: &Path, updates: &[UpdateRecord], now: DateTime<Utc>) -> Report {
    Report {
        generated_at: now.to_rfc3339_opts(SecondsFormat::Micros, false),
        root: root.display().to_string(),
        updates: updates.to_vec(),
    }
}

/// Render the report as pretty JSON with sorted keys
pub fn render_report(report: &Report) -> Result<String, serde_json::Error> {
    let value = sort_keys(serde_json::to_value(report)?);
    let mut json = serde_json::to_string_pretty(&value)?;
    json.push('\n');
    Ok(json)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Write the JSON report to `path`
pub fn write_report(path: &Path, report: &Report) -> Result<(), WriteError> {
    let json = render_report(report).map_err(|e| WriteError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;

    std::fs::write(path, json).map_err(|e| WriteError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
