//! Encoding of `_bulk` request bodies and decoding of their responses.
//!
//! Requests are NDJSON: one `index` action line followed by one source line
//! per document. The response lists one item per action, in request order.

use std::collections::BTreeMap;

use alertdex_core::{
  document::NormalizedDocument,
  store::{BulkItem, BulkItemStatus},
};
use serde::Deserialize;
use serde_json::json;

use crate::{Error, Result};

// ─── Request ─────────────────────────────────────────────────────────────────

/// NDJSON body indexing every document of `docs` into `index`.
pub fn encode(index: &str, docs: &[NormalizedDocument]) -> Result<String> {
  let mut body = String::new();
  for doc in docs {
    let action = json!({ "index": { "_index": index, "_id": doc.id().to_string() } });
    body.push_str(&action.to_string());
    body.push('\n');
    body.push_str(&serde_json::to_string(doc)?);
    body.push('\n');
  }
  Ok(body)
}

// ─── Response ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BulkResponse {
  #[serde(default)]
  errors: bool,
  items:  Vec<BTreeMap<String, BulkAction>>,
}

#[derive(Debug, Deserialize)]
struct BulkAction {
  #[serde(rename = "_id")]
  id:     Option<String>,
  status: u16,
  error:  Option<BulkError>,
}

#[derive(Debug, Deserialize)]
struct BulkError {
  #[serde(rename = "type")]
  kind:   Option<String>,
  reason: Option<String>,
}

impl BulkAction {
  /// `None` on success, the failure detail otherwise.
  fn failure(&self) -> Option<String> {
    match &self.error {
      Some(BulkError { kind, reason }) => Some(match (kind, reason) {
        (Some(kind), Some(reason)) => format!("{kind}: {reason}"),
        (Some(text), None) | (None, Some(text)) => text.clone(),
        (None, None) => format!("status {}", self.status),
      }),
      None if !(200..300).contains(&self.status) => Some(format!("status {}", self.status)),
      None => None,
    }
  }
}

/// Pair each response item with the document it answers.
///
/// Items are matched by position; an `_id` that contradicts the request is
/// treated as a malformed response rather than guessed around.
pub fn decode(body: &str, docs: &[NormalizedDocument]) -> Result<Vec<BulkItem>> {
  let response: BulkResponse = serde_json::from_str(body)?;

  if response.items.len() != docs.len() {
    return Err(Error::BulkResponse(format!(
      "{} items for {} documents",
      response.items.len(),
      docs.len()
    )));
  }

  let mut items = Vec::with_capacity(docs.len());
  for (doc, entry) in docs.iter().zip(response.items) {
    let Some(action) = entry.into_values().next() else {
      return Err(Error::BulkResponse(format!("empty item for {}", doc.id())));
    };

    let expected = doc.id().to_string();
    if let Some(id) = &action.id
      && *id != expected
    {
      return Err(Error::BulkResponse(format!("item {id} answers document {expected}")));
    }

    items.push(match action.failure() {
      Some(detail) => BulkItem::failed(doc.id(), detail),
      None => BulkItem::succeeded(doc.id()),
    });
  }

  if response.errors {
    let failed = items
      .iter()
      .filter(|i| matches!(i.status, BulkItemStatus::Failed(_)))
      .count();
    tracing::debug!(failed, total = items.len(), "bulk request had item failures");
  }

  Ok(items)
}
