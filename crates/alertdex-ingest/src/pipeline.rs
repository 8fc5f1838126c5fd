//! The import run: list, download, parse, tag, submit, archive.
//!
//! Files are handled one at a time in listing order. A download or parse
//! failure stops that file without archiving it and records the
//! [`FileStage`] it reached, while record failures never do.

use std::{sync::Arc, time::Instant};

use alertdex_core::{
  outcome::{FileOutcome, FileStage, FileStatus},
  store::DocumentStore,
  tag::derive_tag,
  transfer::{FileTransfer, RemoteFile},
};
use chrono::Utc;
use tracing::Instrument as _;

use crate::{
  Error, Result,
  archive::archive_destination,
  config::FailurePolicy,
  context::IngestContext,
  report::RunReport,
  submit::{Submission, SubmissionStrategy},
  workdir::LocalCopy,
};

pub struct Pipeline<S, T> {
  store:      Arc<S>,
  transfer:   Arc<T>,
  submission: Submission,
  ctx:        IngestContext,
}

impl<S, T> Pipeline<S, T>
where
  S: DocumentStore,
  T: FileTransfer,
{
  pub fn new(store: Arc<S>, transfer: Arc<T>, ctx: IngestContext) -> Self {
    let submission = Submission::from(ctx.config.as_ref());
    Self { store, transfer, submission, ctx }
  }

  /// Process every file in the source directory.
  ///
  /// Fails only if the directory cannot be listed, or if a file fails under
  /// [`FailurePolicy::Abort`].
  pub async fn run(&self) -> Result<RunReport> {
    self.run_files().instrument(self.ctx.span().clone()).await
  }

  async fn run_files(&self) -> Result<RunReport> {
    let started = Instant::now();
    let config = &self.ctx.config;

    let files = self
      .transfer
      .list(&config.source_dir, &config.suffix)
      .await
      .map_err(|e| Error::Listing { dir: config.source_dir.clone(), source: Box::new(e) })?;

    tracing::info!(
      dir = %config.source_dir,
      count = files.len(),
      mode = ?self.submission.mode(),
      "starting import run"
    );

    let mut report = RunReport::new(self.ctx.run_id, Utc::now(), files.len());
    for file in &files {
      let span = tracing::info_span!("file", name = %file.name);
      let outcome = self.process_file(file).instrument(span).await;

      let abort_reason = match &outcome.status {
        FileStatus::Failed { reason, .. } if config.on_file_error == FailurePolicy::Abort => {
          Some(reason.clone())
        }
        _ => None,
      };
      report.push(outcome);

      if let Some(reason) = abort_reason {
        report.finish(started.elapsed());
        report.log_summary();
        tracing::error!(file = %file.name, %reason, "aborting run");
        return Err(Error::Aborted { file: file.name.clone(), reason, report: Box::new(report) });
      }
    }

    report.finish(started.elapsed());
    report.log_summary();
    Ok(report)
  }

  /// Run one file through every stage. Never fails; the outcome says how far
  /// the file got.
  pub async fn process_file(&self, file: &RemoteFile) -> FileOutcome {
    let started = Instant::now();
    let config = &self.ctx.config;
    let failed = |last_stage: FileStage, reason: String| {
      tracing::warn!(?last_stage, %reason, "file failed");
      FileOutcome::failed(&file.name, &file.path, last_stage, reason, started.elapsed())
    };

    let content = match self.transfer.download(&file.path).await {
      Ok(content) => content,
      Err(e) => return failed(FileStage::Listed, format!("download failed: {e}")),
    };
    tracing::debug!(bytes = content.len(), "downloaded");

    let local = match LocalCopy::write(&config.work_dir, &content).await {
      Ok(local) => local,
      Err(e) => return failed(FileStage::Downloaded, format!("local copy failed: {e}")),
    };
    drop(content);
    tracing::debug!(path = %local.path().display(), "local copy written");

    let bytes = match local.read().await {
      Ok(bytes) => bytes,
      Err(e) => return failed(FileStage::Downloaded, format!("local copy failed: {e}")),
    };
    let batch = match alertdex_xml::parse(&bytes) {
      Ok(batch) => batch,
      Err(e) if e.is_validation() => {
        return failed(FileStage::Downloaded, format!("export rejected: {e}"));
      }
      Err(e) => return failed(FileStage::Downloaded, format!("parse failed: {e}")),
    };
    drop(local);

    let tag = derive_tag(&batch.metadata, &file.name);
    tracing::info!(%tag, records = batch.records.len(), "parsed export");

    let results = self.submission.submit(self.store.as_ref(), batch.records, &tag).await;
    let succeeded = results.iter().filter(|r| r.is_indexed()).count();
    tracing::info!(attempted = results.len(), succeeded, "records submitted");

    let status = if succeeded == 0 && !results.is_empty() && !config.archive_when_all_failed {
      FileStatus::Retained { reason: format!("all {} records failed", results.len()) }
    } else {
      self.archive(file).await
    };

    FileOutcome::submitted(&file.name, &file.path, tag, &results, started.elapsed(), status)
  }

  async fn archive(&self, file: &RemoteFile) -> FileStatus {
    let destination = archive_destination(&self.ctx.config.archive_dir, &file.name, Utc::now());
    match self.transfer.rename(&file.path, &destination).await {
      Ok(()) => {
        tracing::info!(%destination, "archived");
        FileStatus::Archived { destination }
      }
      Err(e) => {
        tracing::error!(%destination, error = %e, "archive failed; index writes stand");
        FileStatus::ArchiveFailed { destination, reason: e.to_string() }
      }
    }
  }
}
