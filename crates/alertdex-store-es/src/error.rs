//! Error type for `alertdex-store-es`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] alertdex_core::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("cannot read mapping {path}: {source}")]
  Mapping {
    path:   String,
    #[source]
    source: std::io::Error,
  },

  /// The store answered with a status the operation does not accept.
  #[error("{operation} returned {status}: {body}")]
  Status {
    operation: &'static str,
    status:    u16,
    body:      String,
  },

  #[error("index {0} was created but not acknowledged")]
  NotAcknowledged(String),

  #[error("unexpected bulk response: {0}")]
  BulkResponse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
