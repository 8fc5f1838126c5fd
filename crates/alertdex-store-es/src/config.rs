//! Connection settings for [`crate::EsStore`].

use std::path::PathBuf;

use serde::Deserialize;

fn default_timeout_secs() -> u64 { 30 }

/// Where the store lives and how to talk to it. Deserialised from the
/// `[store]` table of the importer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EsConfig {
  /// Base URL, e.g. `http://127.0.0.1:9200`.
  pub url:          String,
  pub index:        String,
  /// Basic-auth credentials, passed through verbatim when set.
  #[serde(default)]
  pub username:     Option<String>,
  #[serde(default)]
  pub password:     Option<String>,
  /// Per-request timeout.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Mapping used to create a missing index; the bundled
  /// [`DEFAULT_MAPPING`](crate::DEFAULT_MAPPING) when unset.
  #[serde(default)]
  pub mapping_path: Option<PathBuf>,
}

impl EsConfig {
  pub fn new(url: impl Into<String>, index: impl Into<String>) -> Self {
    Self {
      url:          url.into(),
      index:        index.into(),
      username:     None,
      password:     None,
      timeout_secs: default_timeout_secs(),
      mapping_path: None,
    }
  }
}
