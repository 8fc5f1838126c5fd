//! The local temporary copy of a file being processed.

use std::{io, path::Path};

use tempfile::NamedTempFile;

/// Prefix of every copy created in the work directory.
pub const COPY_PREFIX: &str = ".alertdex-";

/// A downloaded file written to the work directory under a unique name.
///
/// The copy is deleted when the guard is dropped, so every exit from file
/// processing cleans up. Files already present in the work directory are
/// never touched, even when the work directory is the drop root.
#[derive(Debug)]
pub struct LocalCopy {
  file: NamedTempFile,
}

impl LocalCopy {
  /// Write `content` to a fresh file in `work_dir`, creating the directory
  /// if needed.
  pub async fn write(work_dir: &Path, content: &[u8]) -> io::Result<Self> {
    tokio::fs::create_dir_all(work_dir).await?;
    let file = tempfile::Builder::new().prefix(COPY_PREFIX).tempfile_in(work_dir)?;
    tokio::fs::write(file.path(), content).await?;
    Ok(Self { file })
  }

  /// Read the copy back.
  pub async fn read(&self) -> io::Result<Vec<u8>> { tokio::fs::read(self.file.path()).await }

  pub fn path(&self) -> &Path { self.file.path() }
}
