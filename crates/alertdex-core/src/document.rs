//! [`NormalizedDocument`], the write model persisted in the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  record::{RecordId, SourceRecord},
  tag::TagSet,
};

/// A [`SourceRecord`] plus the two fields the pipeline adds.
///
/// `tags` only ever grows across imports of the same record; this subsystem
/// never removes a tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizedDocument {
  #[serde(flatten)]
  pub record:     SourceRecord,
  /// Wall-clock time of the write attempt that produced this body.
  pub indexed_at: DateTime<Utc>,
  pub tags:       TagSet,
}

impl NormalizedDocument {
  pub fn new(record: SourceRecord, indexed_at: DateTime<Utc>, tags: TagSet) -> Self {
    Self { record, indexed_at, tags }
  }

  /// The store document id.
  pub fn id(&self) -> RecordId { self.record.proquest_id }

  /// Serialise for a store write API.
  pub fn to_json(&self) -> Result<serde_json::Value> { Ok(serde_json::to_value(self)?) }
}
