//! Scan progress reporting.
//!
//! The scan reconciler emits a [`ScanEvent`] for every file it adds or
//! recognises as a duplicate, and one at the end. Reporters decide how (and
//! whether) to render them. Unlike diagnostic logging, these lines are the
//! command's output and go to **stdout**.

use std::io::Write;

use crate::models::{FileRecord, ScanSummary};

/// A single progress event from a scan.
#[derive(Clone, Debug)]
pub enum ScanEvent<'a> {
    /// A new file record was written.
    Added(&'a FileRecord),
    /// The file's content is already catalogued as `existing_id`.
    Duplicate { location: &'a str, existing_id: i64 },
    /// The walk finished.
    Finished(&'a ScanSummary),
}

/// Receives scan progress. Implementations must not fail the scan.
pub trait ScanReporter {
    fn report(&self, event: ScanEvent<'_>);
}

/// Human-readable lines: `Added "photos/cat.jpg"` per new file, then a summary.
pub struct StdoutProgress;

impl ScanReporter for StdoutProgress {
    fn report(&self, event: ScanEvent<'_>) {
        let line = match event {
            ScanEvent::Added(file) => format!("Added \"{}\"\n", file.location),
            ScanEvent::Duplicate { .. } => return,
            ScanEvent::Finished(summary) => format!(
                "Done! {} processed, {} added, {} already catalogued, {} skipped\n",
                format_number(summary.processed),
                format_number(summary.added),
                format_number(summary.duplicates),
                format_number(summary.skipped),
            ),
        };
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(line.as_bytes());
        let _ = out.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stdout.
pub struct JsonProgress;

impl ScanReporter for JsonProgress {
    fn report(&self, event: ScanEvent<'_>) {
        let obj = match event {
            ScanEvent::Added(file) => serde_json::json!({
                "event": "added",
                "id": file.id,
                "location": file.location,
                "sha256": file.sha256,
                "size": file.size,
            }),
            ScanEvent::Duplicate {
                location,
                existing_id,
            } => serde_json::json!({
                "event": "duplicate",
                "location": location,
                "existing_id": existing_id,
            }),
            ScanEvent::Finished(summary) => serde_json::json!({
                "event": "done",
                "processed": summary.processed,
                "added": summary.added,
                "duplicates": summary.duplicates,
                "skipped": summary.skipped,
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }
}

/// No-op reporter.
pub struct NoProgress;

impl ScanReporter for NoProgress {
    fn report(&self, _event: ScanEvent<'_>) {}
}

/// Output mode for `taggerdb scan`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    pub fn reporter(&self) -> Box<dyn ScanReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StdoutProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
