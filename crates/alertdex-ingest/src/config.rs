//! Importer configuration, deserialised from `alertdex.toml` and the
//! `ALERTDEX_*` environment.

use std::path::PathBuf;

use alertdex_store_es::EsConfig;
use serde::{Deserialize, Serialize};

use crate::drop::DropConfig;

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  pub store:    EsConfig,
  pub drop:     DropConfig,
  #[serde(default)]
  pub pipeline: PipelineConfig,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// How records reach the store. Fixed for the whole run.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
  /// Per-record lookup, merge and upsert. Tags accumulate across runs.
  #[default]
  Strict,
  /// One bulk request per file. Stored tags are replaced by the file's tag.
  Batched,
}

/// What a file that cannot be downloaded or parsed does to the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
  #[default]
  Skip,
  Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// Drop directory scanned for exports.
  pub source_dir:              String,
  pub suffix:                  String,
  /// Drop directory processed files are moved into.
  pub archive_dir:             String,
  /// Local directory for the temporary copy of each file.
  pub work_dir:                PathBuf,
  pub submission:              SubmissionMode,
  pub on_file_error:           FailurePolicy,
  /// Archive a file even when none of its records were indexed.
  pub archive_when_all_failed: bool,
  /// Split batched submissions into requests of at most this many records.
  pub bulk_chunk_size:         Option<usize>,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      source_dir:              "/".into(),
      suffix:                  ".xml".into(),
      archive_dir:             "archive".into(),
      work_dir:                PathBuf::from("."),
      submission:              SubmissionMode::Strict,
      on_file_error:           FailurePolicy::Skip,
      archive_when_all_failed: true,
      bulk_chunk_size:         None,
    }
  }
}
