//! Record types: the parsed content of one export file.
//!
//! A [`SourceBatch`] is decoded once per downloaded file and never mutated
//! afterwards. Every leaf field is kept as opaque text; only the primary
//! identifier is numeric.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// The primary numeric identifier of a record.
///
/// Used verbatim as the document id in the store; it is the unit of identity
/// across repeated imports of the same record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for RecordId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    s.trim()
      .parse::<u64>()
      .map(RecordId)
      .map_err(|_| Error::Validation {
        field: "record identifier",
        value: s.to_string(),
      })
  }
}

// ─── Batch ───────────────────────────────────────────────────────────────────

/// Alert metadata carried at the root of an export file. Every field is
/// optional; older exports carry none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetadata {
  pub alert_id:   Option<String>,
  pub alert_name: Option<String>,
  /// Export timestamp exactly as written in the file.
  pub timestamp:  Option<String>,
}

/// One downloaded file, decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBatch {
  pub metadata: BatchMetadata,
  /// Records in document order.
  pub records:  Vec<SourceRecord>,
}

// ─── Shared leaf shapes ──────────────────────────────────────────────────────

/// Text qualified by a language code (titles, alternate titles).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
  pub language: Option<String>,
  pub text:     String,
}

/// A value qualified by a type attribute (document ids, locators, notes,
/// reference codes, substance numbers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedValue {
  pub kind:  Option<String>,
  pub value: String,
}

// ─── Contributors ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
  /// Position as declared in the export, kept as text.
  pub order:           Option<String>,
  /// e.g. "Author", "Editor".
  pub role:            Option<String>,
  pub normalized_name: Option<String>,
  pub last_name:       Option<String>,
  pub first_name:      Option<String>,
  pub company_names:   Vec<String>,
  pub email_address:   Option<String>,
  /// External author identifier (ORCID and friends).
  pub ref_code:        Option<TypedValue>,
  pub person_title:    Option<String>,
  pub name_suffix:     Option<String>,
}

// ─── Abstracts ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Abstract {
  pub text:       String,
  pub word_count: Option<String>,
  pub kind:       Option<String>,
  pub language:   Option<String>,
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
  pub text:         String,
  pub major_topic:  Option<String>,
  pub heading_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingTerm {
  pub vocabulary:              Option<String>,
  pub term_type:               Option<String>,
  pub heading:                 Option<Heading>,
  pub qualifier:               Option<TypedValue>,
  pub qualifier_name_sub_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
  pub vocabulary: Option<String>,
  pub term_type:  Option<String>,
  pub code:       Option<String>,
  pub expansion:  Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstanceTerm {
  pub name:    Option<String>,
  pub numbers: Vec<TypedValue>,
}

// ─── Publication ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherLocation {
  pub mailing_address: Option<String>,
  pub email_address:   Option<String>,
  pub city:            Option<String>,
  pub post_code:       Option<String>,
  pub country:         Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
  pub name:     Option<String>,
  pub location: Option<PublisherLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pages {
  pub start_page: Option<String>,
  pub end_page:   Option<String>,
  pub pagination: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationInfo {
  pub title:       Option<String>,
  pub volume:      Option<String>,
  pub issue:       Option<String>,
  pub issue_title: Option<String>,
  pub locators:    Vec<TypedValue>,
  pub publisher:   Option<Publisher>,
  pub pages:       Vec<Pages>,
  pub notes:       Vec<TypedValue>,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A single bibliographic record, flattened from its export markup.
///
/// Dates are carried as the strings found in the export; no date parsing is
/// attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceRecord {
  pub proquest_id:            RecordId,
  /// Secondary, free-text identifier.
  pub accession_number:       Option<String>,
  pub database_name:          Option<String>,
  pub titles:                 Vec<LocalizedText>,
  pub alternate_titles:       Vec<LocalizedText>,
  pub document_ids:           Vec<TypedValue>,
  pub source_attribution:     Option<String>,
  pub publication_date:       Option<String>,
  pub publication_alpha_date: Option<String>,
  pub date_created:           Option<String>,
  pub date_revised:           Option<String>,
  pub first_available_date:   Option<String>,
  pub last_update_date:       Option<String>,
  pub document_status:        Option<String>,
  pub document_type:          Option<String>,
  pub source_type:            Option<String>,
  pub doi:                    Option<String>,
  pub language:               Option<String>,
  pub num_refs:               Option<String>,
  pub contributors:           Vec<Contributor>,
  pub abstracts:              Vec<Abstract>,
  pub heading_terms:          Vec<HeadingTerm>,
  pub subject_terms:          Vec<String>,
  pub identifier_terms:       Vec<String>,
  pub classifications:        Vec<Classification>,
  pub substance_terms:        Vec<SubstanceTerm>,
  pub publication:            PublicationInfo,
  /// Outbound links: the record's own URL first, then any typed links.
  pub links:                  Vec<TypedValue>,
}

impl SourceRecord {
  /// Convenience constructor with every optional field empty.
  pub fn new(proquest_id: RecordId) -> Self {
    Self { proquest_id, ..Self::default() }
  }
}
