//! The `FileTransfer` trait: access to the file drop that exports arrive in.

use std::future::Future;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A file found in the drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
  /// Bare file name, used for tag derivation and archive naming.
  pub name: String,
  /// Full path on the drop, used for download and rename.
  pub path: String,
  pub size: Option<u64>,
}

/// Join a drop directory and a file name with exactly one `/`.
pub fn join_remote(dir: &str, name: &str) -> String {
  let dir = dir.trim_end_matches('/');
  let name = name.trim_start_matches('/');
  if dir.is_empty() { name.to_string() } else { format!("{dir}/{name}") }
}

/// Abstraction over the drop.
pub trait FileTransfer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Files directly inside `dir` whose names end with `suffix`, in the order
  /// they should be processed.
  fn list<'a>(
    &'a self,
    dir: &'a str,
    suffix: &'a str,
  ) -> impl Future<Output = Result<Vec<RemoteFile>, Self::Error>> + Send + 'a;

  /// The full content of the file at `path`.
  fn download<'a>(
    &'a self,
    path: &'a str,
  ) -> impl Future<Output = Result<Bytes, Self::Error>> + Send + 'a;

  /// Move `from` to `to` on the drop.
  fn rename<'a>(
    &'a self,
    from: &'a str,
    to: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
