//! Outcome bookkeeping for records and files.
//!
//! These types are produced by the ingest pipeline and consumed only for
//! reporting.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::record::RecordId;

// ─── Records ─────────────────────────────────────────────────────────────────

/// What happened to one record of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
  /// The document was written. `created` is `true` when the store held
  /// nothing for this id beforehand; batched writes never know and report
  /// `false`.
  Indexed { created: bool },
  /// Nothing was written, or the write was rejected.
  Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordResult {
  pub id:      RecordId,
  #[serde(flatten)]
  pub outcome: RecordOutcome,
}

impl RecordResult {
  pub fn indexed(id: RecordId, created: bool) -> Self {
    Self { id, outcome: RecordOutcome::Indexed { created } }
  }

  pub fn failed(id: RecordId, reason: impl Into<String>) -> Self {
    Self { id, outcome: RecordOutcome::Failed { reason: reason.into() } }
  }

  pub fn is_indexed(&self) -> bool {
    matches!(self.outcome, RecordOutcome::Indexed { .. })
  }
}

/// A failed record as listed in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRecord {
  pub id:     RecordId,
  pub reason: String,
}

// ─── Files ───────────────────────────────────────────────────────────────────

/// The last stage a file completed before processing stopped. Once a file is
/// parsed it always reaches submission, so later stages are told apart by
/// [`FileStatus`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStage {
  /// Found in the drop; the download failed.
  Listed,
  /// Downloaded; the local copy or the parse failed.
  Downloaded,
}

/// Where a file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
  /// Records were submitted and the file was moved to `destination`.
  Archived { destination: String },
  /// Records were submitted but the move failed; the index writes stand.
  ArchiveFailed { destination: String, reason: String },
  /// Records were submitted and the file was deliberately left in place.
  Retained { reason: String },
  /// Processing stopped after `last_stage`; nothing from this file was
  /// submitted and it was left in place.
  Failed { last_stage: FileStage, reason: String },
}

/// Per-file summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
  pub file_name:  String,
  pub path:       String,
  /// The tag applied to every record, once derived.
  pub tag:        Option<String>,
  pub attempted:  usize,
  pub succeeded:  usize,
  pub failed:     usize,
  pub failures:   Vec<FailedRecord>,
  pub elapsed_ms: u64,
  pub status:     FileStatus,
}

impl FileOutcome {
  /// An outcome for a file that never reached submission.
  pub fn failed(
    file_name: impl Into<String>,
    path: impl Into<String>,
    last_stage: FileStage,
    reason: impl Into<String>,
    elapsed: Duration,
  ) -> Self {
    Self {
      file_name:  file_name.into(),
      path:       path.into(),
      tag:        None,
      attempted:  0,
      succeeded:  0,
      failed:     0,
      failures:   Vec::new(),
      elapsed_ms: elapsed_millis(elapsed),
      status:     FileStatus::Failed { last_stage, reason: reason.into() },
    }
  }

  /// An outcome for a file whose records were submitted. `status` is filled
  /// in once the archive step has run.
  pub fn submitted(
    file_name: impl Into<String>,
    path: impl Into<String>,
    tag: impl Into<String>,
    results: &[RecordResult],
    elapsed: Duration,
    status: FileStatus,
  ) -> Self {
    let failures: Vec<FailedRecord> = results
      .iter()
      .filter_map(|r| match &r.outcome {
        RecordOutcome::Failed { reason } => {
          Some(FailedRecord { id: r.id, reason: reason.clone() })
        }
        RecordOutcome::Indexed { .. } => None,
      })
      .collect();

    Self {
      file_name: file_name.into(),
      path: path.into(),
      tag: Some(tag.into()),
      attempted: results.len(),
      succeeded: results.len() - failures.len(),
      failed: failures.len(),
      failures,
      elapsed_ms: elapsed_millis(elapsed),
      status,
    }
  }

  /// `true` if the file never reached submission.
  pub fn is_failed(&self) -> bool { matches!(self.status, FileStatus::Failed { .. }) }

  pub fn failed_ids(&self) -> Vec<RecordId> {
    self.failures.iter().map(|f| f.id).collect()
  }
}

fn elapsed_millis(elapsed: Duration) -> u64 {
  u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn submitted_counts_and_names_failures() {
    let results = vec![
      RecordResult::indexed(RecordId(1), true),
      RecordResult::failed(RecordId(2), "mapper_parsing_exception"),
      RecordResult::indexed(RecordId(3), false),
    ];
    let outcome = FileOutcome::submitted(
      "a.xml",
      "a.xml",
      "Asthma",
      &results,
      Duration::from_millis(12),
      FileStatus::Retained { reason: "test".into() },
    );
    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.failed_ids(), vec![RecordId(2)]);
    assert_eq!(outcome.elapsed_ms, 12);
    assert!(!outcome.is_failed());
  }

  #[test]
  fn failed_outcome_names_the_stage_reached() {
    let outcome = FileOutcome::failed(
      "a.xml",
      "incoming/a.xml",
      FileStage::Downloaded,
      "parse failed",
      Duration::from_millis(3),
    );
    assert!(outcome.is_failed());
    assert_eq!(outcome.tag, None);
    let json = serde_json::to_value(&outcome.status).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "status": "failed", "last_stage": "downloaded", "reason": "parse failed" })
    );
    assert!(FileStage::Listed < FileStage::Downloaded);
  }

  #[test]
  fn record_result_serialises_flat() {
    let json = serde_json::to_value(RecordResult::failed(RecordId(7), "boom")).unwrap();
    assert_eq!(json, serde_json::json!({ "id": 7, "outcome": "failed", "reason": "boom" }));
  }
}
