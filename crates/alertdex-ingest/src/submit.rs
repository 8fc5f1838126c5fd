//! Submission strategies: how one file's records are written to the store.
//!
//! The strategy is chosen once per run from [`SubmissionMode`]. Neither
//! strategy ever fails as a whole; every problem is reported against the
//! records it affects.

use std::future::Future;

use alertdex_core::{
  document::NormalizedDocument,
  merge::resolve_lookup,
  outcome::RecordResult,
  record::SourceRecord,
  store::{BulkItemStatus, DocumentStore},
  tag::TagSet,
};
use chrono::Utc;

use crate::config::{PipelineConfig, SubmissionMode};

pub trait SubmissionStrategy: Send + Sync {
  /// Write `records` tagged with `tag`, returning one result per record in
  /// input order.
  fn submit<'a, S: DocumentStore>(
    &'a self,
    store: &'a S,
    records: Vec<SourceRecord>,
    tag: &'a str,
  ) -> impl Future<Output = Vec<RecordResult>> + Send + 'a;
}

// ─── Strict ──────────────────────────────────────────────────────────────────

/// Look up, merge and upsert each record in turn.
///
/// Tags accumulate: the stored set is unioned with `tag`. A record whose
/// lookup fails is not written at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictSubmission;

impl SubmissionStrategy for StrictSubmission {
  async fn submit<S: DocumentStore>(
    &self,
    store: &S,
    records: Vec<SourceRecord>,
    tag: &str,
  ) -> Vec<RecordResult> {
    let mut results = Vec::with_capacity(records.len());

    for record in records {
      let id = record.proquest_id;
      let lookup = store.get_by_id(id).await;
      let created = matches!(lookup, Ok(None));

      let tags = match resolve_lookup(lookup, tag) {
        Ok(tags) => tags,
        Err(e) => {
          tracing::warn!(%id, error = %e, "lookup failed; record not written");
          results.push(RecordResult::failed(id, format!("lookup failed: {e}")));
          continue;
        }
      };

      let doc = NormalizedDocument::new(record, Utc::now(), tags);
      match store.upsert(&doc).await {
        Ok(()) => {
          tracing::debug!(%id, created, tags = doc.tags.len(), "record indexed");
          results.push(RecordResult::indexed(id, created));
        }
        Err(e) => {
          tracing::warn!(%id, error = %e, "upsert failed");
          results.push(RecordResult::failed(id, format!("upsert failed: {e}")));
        }
      }
    }

    results
  }
}

// ─── Batched ─────────────────────────────────────────────────────────────────

/// Send the file's records in bulk, tagged with `tag` alone.
///
/// Stored tags are not read, so a re-import replaces them. A rejected request
/// fails every record it carried.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchedSubmission {
  /// Records per request; the whole file in one request when `None`.
  pub chunk_size: Option<usize>,
}

impl SubmissionStrategy for BatchedSubmission {
  async fn submit<S: DocumentStore>(
    &self,
    store: &S,
    records: Vec<SourceRecord>,
    tag: &str,
  ) -> Vec<RecordResult> {
    let indexed_at = Utc::now();
    let docs: Vec<NormalizedDocument> = records
      .into_iter()
      .map(|record| NormalizedDocument::new(record, indexed_at, TagSet::single(tag)))
      .collect();

    let chunk_size = self
      .chunk_size
      .filter(|n| *n > 0)
      .unwrap_or(docs.len())
      .max(1);

    let mut results = Vec::with_capacity(docs.len());
    for chunk in docs.chunks(chunk_size) {
      match store.bulk_upsert(chunk).await {
        Ok(items) => {
          results.extend(items.into_iter().map(|item| match item.status {
            BulkItemStatus::Succeeded => RecordResult::indexed(item.id, false),
            BulkItemStatus::Failed(reason) => {
              tracing::warn!(id = %item.id, %reason, "bulk item rejected");
              RecordResult::failed(item.id, reason)
            }
          }));
        }
        Err(e) => {
          tracing::warn!(records = chunk.len(), error = %e, "bulk request failed");
          let reason = format!("bulk request failed: {e}");
          results.extend(chunk.iter().map(|doc| RecordResult::failed(doc.id(), reason.clone())));
        }
      }
    }

    results
  }
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// The strategy selected for a run.
#[derive(Debug, Clone, Copy)]
pub enum Submission {
  Strict(StrictSubmission),
  Batched(BatchedSubmission),
}

impl Submission {
  pub fn mode(&self) -> SubmissionMode {
    match self {
      Submission::Strict(_) => SubmissionMode::Strict,
      Submission::Batched(_) => SubmissionMode::Batched,
    }
  }
}

impl From<&PipelineConfig> for Submission {
  fn from(config: &PipelineConfig) -> Self {
    match config.submission {
      SubmissionMode::Strict => Submission::Strict(StrictSubmission),
      SubmissionMode::Batched => Submission::Batched(BatchedSubmission {
        chunk_size: config.bulk_chunk_size,
      }),
    }
  }
}

impl SubmissionStrategy for Submission {
  async fn submit<S: DocumentStore>(
    &self,
    store: &S,
    records: Vec<SourceRecord>,
    tag: &str,
  ) -> Vec<RecordResult> {
    match self {
      Submission::Strict(strategy) => strategy.submit(store, records, tag).await,
      Submission::Batched(strategy) => strategy.submit(store, records, tag).await,
    }
  }
}
