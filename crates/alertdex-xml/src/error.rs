//! Error types for the alertdex-xml codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("export is not valid UTF-8: {0}")]
  Encoding(#[from] std::str::Utf8Error),

  #[error("malformed markup: {0}")]
  Markup(String),

  #[error("export has no root element")]
  Empty,

  #[error("unexpected root element <{found}>, expected <{expected}>")]
  UnexpectedRoot { found: String, expected: &'static str },

  #[error("cannot decode export: {0}")]
  Decode(#[from] quick_xml::DeError),

  #[error("record #{position} has no ProquestID")]
  MissingIdentifier { position: usize },

  #[error("record #{position}: {source}")]
  InvalidIdentifier {
    position: usize,
    #[source]
    source:   alertdex_core::Error,
  },
}

impl Error {
  /// `true` for well-formed markup whose content fails validation (as
  /// opposed to markup that cannot be read at all).
  pub fn is_validation(&self) -> bool {
    matches!(self, Self::MissingIdentifier { .. } | Self::InvalidIdentifier { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
