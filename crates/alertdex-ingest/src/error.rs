//! Error type for `alertdex-ingest`.
//!
//! Only run-level failures surface here. Problems with a single file or
//! record are recorded in the [`RunReport`] instead.

use thiserror::Error;

use crate::report::RunReport;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot list {dir}: {source}")]
  Listing {
    dir:    String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// A file failed under the `abort` policy. `report` covers the files
  /// handled up to and including it.
  #[error("run aborted at {file}: {reason}")]
  Aborted {
    file:   String,
    reason: String,
    report: Box<RunReport>,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
