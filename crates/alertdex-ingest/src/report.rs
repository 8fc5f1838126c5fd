//! Run summary.

use std::{path::Path, time::Duration};

use alertdex_core::outcome::{FailedRecord, FileOutcome, FileStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// Everything one run did, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
  pub run_id:      Uuid,
  pub started_at:  DateTime<Utc>,
  pub files_found: usize,
  pub files:       Vec<FileOutcome>,
  /// Records indexed across all files.
  pub indexed:     usize,
  /// Records that failed across all files.
  pub failed:      usize,
  pub elapsed_ms:  u64,
}

impl RunReport {
  pub fn new(run_id: Uuid, started_at: DateTime<Utc>, files_found: usize) -> Self {
    Self {
      run_id,
      started_at,
      files_found,
      files: Vec::new(),
      indexed: 0,
      failed: 0,
      elapsed_ms: 0,
    }
  }

  pub fn push(&mut self, outcome: FileOutcome) {
    self.indexed += outcome.succeeded;
    self.failed += outcome.failed;
    self.files.push(outcome);
  }

  pub fn finish(&mut self, elapsed: Duration) {
    self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
  }

  /// Files that never reached submission.
  pub fn files_failed(&self) -> usize { self.files.iter().filter(|f| f.is_failed()).count() }

  /// Every failed record, with the file it came from.
  pub fn failed_records(&self) -> impl Iterator<Item = (&str, &FailedRecord)> {
    self
      .files
      .iter()
      .flat_map(|f| f.failures.iter().map(move |r| (f.file_name.as_str(), r)))
  }

  /// Log the totals, then one line per failed file and failed record.
  pub fn log_summary(&self) {
    tracing::info!(
      run_id = %self.run_id,
      files_found = self.files_found,
      files_processed = self.files.len(),
      files_failed = self.files_failed(),
      indexed = self.indexed,
      failed = self.failed,
      elapsed_ms = self.elapsed_ms,
      "import run finished"
    );

    for file in &self.files {
      match &file.status {
        FileStatus::Failed { last_stage, reason } => {
          tracing::warn!(file = %file.file_name, ?last_stage, %reason, "file not processed");
        }
        FileStatus::ArchiveFailed { destination, reason } => {
          tracing::warn!(file = %file.file_name, %destination, %reason, "file not archived");
        }
        FileStatus::Retained { reason } => {
          tracing::info!(file = %file.file_name, %reason, "file left in place");
        }
        FileStatus::Archived { .. } => {}
      }
    }

    for (file, record) in self.failed_records() {
      tracing::warn!(%file, id = %record.id, reason = %record.reason, "record failed");
    }
  }

  /// Write the report as pretty JSON.
  pub fn write_json(&self, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(self)?;
    std::fs::write(path, json)?;
    Ok(())
  }
}
