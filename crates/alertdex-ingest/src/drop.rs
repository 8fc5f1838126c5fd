//! [`LocalDrop`]: the file drop as a directory on the local filesystem.
//!
//! Drop paths are relative to the configured root; a leading `/` names the
//! root itself. Paths that climb out of the root are refused.

use std::{
  io,
  path::{Component, Path, PathBuf},
};

use alertdex_core::transfer::{FileTransfer, RemoteFile, join_remote};
use bytes::Bytes;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DropConfig {
  /// Directory the drop is mounted at.
  pub root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LocalDrop {
  root: PathBuf,
}

impl LocalDrop {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn from_config(config: &DropConfig) -> Self { Self::new(config.root.clone()) }

  /// Map a drop path onto the filesystem.
  fn resolve(&self, path: &str) -> io::Result<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    if relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("drop path {path:?} leaves the drop root"),
      ));
    }
    Ok(self.root.join(relative))
  }
}

impl FileTransfer for LocalDrop {
  type Error = io::Error;

  async fn list(&self, dir: &str, suffix: &str) -> io::Result<Vec<RemoteFile>> {
    let mut entries = tokio::fs::read_dir(self.resolve(dir)?).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
      let metadata = entry.metadata().await?;
      if !metadata.is_file() {
        continue;
      }
      let Ok(name) = entry.file_name().into_string() else {
        tracing::warn!(name = ?entry.file_name(), "skipping non UTF-8 file name");
        continue;
      };
      if !name.ends_with(suffix) {
        continue;
      }
      files.push(RemoteFile {
        path: join_remote(dir, &name),
        name,
        size: Some(metadata.len()),
      });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
  }

  async fn download(&self, path: &str) -> io::Result<Bytes> {
    Ok(Bytes::from(tokio::fs::read(self.resolve(path)?).await?))
  }

  async fn rename(&self, from: &str, to: &str) -> io::Result<()> {
    let source = self.resolve(from)?;
    let target = self.resolve(to)?;
    if let Some(parent) = target.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::rename(source, target).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn drop_with(files: &[&str]) -> (tempfile::TempDir, LocalDrop) {
    let dir = tempfile::tempdir().unwrap();
    for name in files {
      let path = dir.path().join(name);
      std::fs::create_dir_all(path.parent().unwrap()).unwrap();
      std::fs::write(&path, name.as_bytes()).unwrap();
    }
    let local = LocalDrop::new(dir.path());
    (dir, local)
  }

  #[tokio::test]
  async fn list_filters_by_suffix_and_sorts() {
    let (_dir, local) =
      drop_with(&["b (x).xml", "a (x).xml", "notes.txt", "archive/old (x).xml"]);
    let files = local.list("/", ".xml").await.unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["a (x).xml", "b (x).xml"]);
    assert_eq!(files[0].path, "a (x).xml");
    assert_eq!(files[0].size, Some(9));
  }

  #[tokio::test]
  async fn list_subdirectory_paths() {
    let (_dir, local) = drop_with(&["incoming/a.xml"]);
    let files = local.list("incoming", ".xml").await.unwrap();
    assert_eq!(files[0].path, "incoming/a.xml");
    assert_eq!(local.download(&files[0].path).await.unwrap(), Bytes::from_static(b"incoming/a.xml"));
  }

  #[tokio::test]
  async fn rename_creates_archive_directory() {
    let (dir, local) = drop_with(&["a.xml"]);
    local.rename("a.xml", "archive/2019-04-01T120000_a.xml").await.unwrap();
    assert!(!dir.path().join("a.xml").exists());
    assert!(dir.path().join("archive/2019-04-01T120000_a.xml").exists());
  }

  #[tokio::test]
  async fn missing_file_is_an_error() {
    let (_dir, local) = drop_with(&[]);
    let err = local.download("gone.xml").await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
  }

  #[tokio::test]
  async fn escaping_the_root_is_refused() {
    let (_dir, local) = drop_with(&[]);
    let err = local.download("../etc/passwd").await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
  }
}
