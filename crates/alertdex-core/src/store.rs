//! The `DocumentStore` trait and its bulk result types.
//!
//! Implemented by storage backends (e.g. `alertdex-store-es`). The ingest
//! pipeline depends on this abstraction, not on any concrete backend. The
//! target index is part of the backend's own addressing configuration.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{document::NormalizedDocument, record::RecordId};

// ─── Result types ────────────────────────────────────────────────────────────

/// What [`DocumentStore::ensure_index`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
  /// The index already existed; nothing was changed.
  Existing,
  /// The index was missing and has been created from the mapping.
  Created,
}

/// The store's verdict on one item of a bulk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum BulkItemStatus {
  Succeeded,
  Failed(String),
}

/// One itemised bulk result, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItem {
  pub id:     RecordId,
  pub status: BulkItemStatus,
}

impl BulkItem {
  pub fn succeeded(id: RecordId) -> Self {
    Self { id, status: BulkItemStatus::Succeeded }
  }

  pub fn failed(id: RecordId, detail: impl Into<String>) -> Self {
    Self { id, status: BulkItemStatus::Failed(detail.into()) }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the searchable document store.
///
/// "Not found" is never an error: [`DocumentStore::get_by_id`] returns
/// `Ok(None)` for it. `Err` always means the store could not answer.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded tokio runtime.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Make sure the target index exists, creating it from the configured
  /// mapping the first time.
  fn ensure_index(
    &self,
  ) -> impl Future<Output = Result<IndexStatus, Self::Error>> + Send + '_;

  /// Fetch the stored document for `id`. Returns `None` if there is none.
  fn get_by_id(
    &self,
    id: RecordId,
  ) -> impl Future<Output = Result<Option<NormalizedDocument>, Self::Error>>
  + Send
  + '_;

  /// Create or replace the document stored under `doc.id()`.
  fn upsert<'a>(
    &'a self,
    doc: &'a NormalizedDocument,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Create or replace every document in one request.
  ///
  /// `Err` means the request as a whole failed. Otherwise the result holds
  /// one [`BulkItem`] per input document, in input order.
  fn bulk_upsert<'a>(
    &'a self,
    docs: &'a [NormalizedDocument],
  ) -> impl Future<Output = Result<Vec<BulkItem>, Self::Error>> + Send + 'a;
}
