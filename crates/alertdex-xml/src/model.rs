//! Serde mirror of the export markup and its mapping onto
//! [`alertdex_core::record`] types.
//!
//! The raw structs follow the element nesting one-to-one; everything is read
//! as text. Unknown elements and attributes are ignored. Blank leaves become
//! `None` (or are dropped from lists) during conversion.

use alertdex_core::record::{
  Abstract, BatchMetadata, Classification, Contributor, Heading, HeadingTerm,
  LocalizedText, Pages, PublicationInfo, Publisher, PublisherLocation, RecordId,
  SourceBatch, SourceRecord, SubstanceTerm, TypedValue,
};
use serde::Deserialize;

use crate::error::{Error, Result};

// ─── Root ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawExport {
  alert_id:   Option<String>,
  alert_name: Option<String>,
  timestamp:  Option<String>,
  #[serde(default)]
  documents:  RawDocuments,
}

#[derive(Debug, Default, Deserialize)]
struct RawDocuments {
  #[serde(rename = "Literature", default)]
  literature: Vec<RawLiterature>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawLiterature {
  #[serde(default)]
  doc_info:         RawDocInfo,
  #[serde(default)]
  contributors:     RawContributors,
  #[serde(rename = "Abstract", default)]
  abstracts:        Vec<RawAbstract>,
  #[serde(default)]
  subjects:         RawSubjects,
  #[serde(default)]
  classifications:  RawClassifications,
  #[serde(default)]
  substance_info:   RawSubstanceInfo,
  #[serde(default)]
  publication_info: RawPublicationInfo,
  #[serde(default)]
  links:            RawLinks,
}

// ─── Shared leaves ───────────────────────────────────────────────────────────

/// Text with a `Language` attribute.
#[derive(Debug, Default, Deserialize)]
struct RawLocalized {
  #[serde(rename = "@Language")]
  language: Option<String>,
  #[serde(rename = "$value", default)]
  text:     Vec<RawTextPart>,
}

/// Text with a type attribute; the attribute name differs per element.
#[derive(Debug, Default, Deserialize)]
struct RawTyped {
  #[serde(
    rename = "@IDType",
    alias = "@RefCodeType",
    alias = "@HeadingQualifierType",
    alias = "@SubstanceNumberType",
    alias = "@NoteType",
    alias = "@LinkType"
  )]
  kind:  Option<String>,
  #[serde(rename = "$value", default)]
  value: Vec<RawTextPart>,
}

/// One piece of an element's content. Child elements other than the inline
/// formatting flattened before decoding are skipped.
#[derive(Debug, Deserialize)]
enum RawTextPart {
  #[serde(rename = "$text")]
  Text(String),
  #[serde(other)]
  Markup,
}

// ─── DocInfo ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawDocInfo {
  #[serde(default)]
  title_info:             RawTitleInfo,
  accession_number:       Option<String>,
  database_name:          Option<String>,
  #[serde(rename = "ProquestID")]
  proquest_id:            Option<String>,
  #[serde(rename = "DocumentIDs", default)]
  document_ids:           RawDocumentIds,
  source_attribution:     Option<String>,
  publication_date:       Option<String>,
  publication_alpha_date: Option<String>,
  date_created:           Option<String>,
  date_revised:           Option<String>,
  first_available_date:   Option<String>,
  last_update_date:       Option<String>,
  document_status:        Option<String>,
  document_type:          Option<String>,
  source_type:            Option<String>,
  #[serde(rename = "DOI")]
  doi:                    Option<String>,
  language:               Option<String>,
  #[serde(default)]
  doc_features:           RawDocFeatures,
  #[serde(rename = "URL")]
  url:                    Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTitleInfo {
  #[serde(rename = "Title", default)]
  titles:    Vec<RawLocalized>,
  #[serde(rename = "AlternateTitle", default)]
  alternate: Vec<RawLocalized>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDocumentIds {
  #[serde(rename = "DocumentID", default)]
  ids: Vec<RawTyped>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDocFeatures {
  #[serde(rename = "NumRefs")]
  num_refs: Option<String>,
}

// ─── Contributors ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct RawContributors {
  #[serde(rename = "Contributor", default)]
  list: Vec<RawContributor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawContributor {
  #[serde(rename = "@ContribOrder")]
  order:           Option<String>,
  #[serde(rename = "@ContribRole")]
  role:            Option<String>,
  normalized_name: Option<String>,
  last_name:       Option<String>,
  first_name:      Option<String>,
  #[serde(rename = "ContribCompanyName", default)]
  company_names:   Vec<String>,
  email_address:   Option<String>,
  ref_code:        Option<RawTyped>,
  person_title:    Option<String>,
  name_suffix:     Option<String>,
}

// ─── Abstracts ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct RawAbstract {
  #[serde(rename = "$value", default)]
  text:       Vec<RawTextPart>,
  #[serde(rename = "@WordCount")]
  word_count: Option<String>,
  #[serde(rename = "@AbstractType")]
  kind:       Option<String>,
  #[serde(rename = "@Language")]
  language:   Option<String>,
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSubjects {
  #[serde(default)]
  heading_terms:    RawHeadingTerms,
  #[serde(default)]
  subject_terms:    RawSubjectTerms,
  #[serde(default)]
  identifier_terms: RawIdentifierTerms,
}

#[derive(Debug, Default, Deserialize)]
struct RawHeadingTerms {
  #[serde(rename = "HeadingTerm", default)]
  list: Vec<RawHeadingTerm>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawHeadingTerm {
  #[serde(rename = "@TermVocab")]
  vocabulary:              Option<String>,
  #[serde(rename = "@HeadingTermType")]
  term_type:               Option<String>,
  heading:                 Option<RawHeading>,
  heading_qualifier:       Option<RawTyped>,
  qualifier_name_sub_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHeading {
  #[serde(rename = "$value", default)]
  text:         Vec<RawTextPart>,
  #[serde(rename = "@MajorTopic")]
  major_topic:  Option<String>,
  #[serde(rename = "@HeadingType")]
  heading_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSubjectTerms {
  #[serde(rename = "SubjectTerm", default)]
  list: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIdentifierTerms {
  #[serde(rename = "IdentifierTerm", default)]
  list: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawClassifications {
  #[serde(rename = "ClassTerm", default)]
  list: Vec<RawClassTerm>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawClassTerm {
  #[serde(rename = "@TermVocab")]
  vocabulary:      Option<String>,
  #[serde(rename = "@ClassTermType")]
  term_type:       Option<String>,
  class_code:      Option<String>,
  class_expansion: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSubstanceInfo {
  #[serde(default)]
  substance_terms: RawSubstanceTerms,
}

#[derive(Debug, Default, Deserialize)]
struct RawSubstanceTerms {
  #[serde(rename = "SubstanceTerm", default)]
  list: Vec<RawSubstanceTerm>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSubstanceTerm {
  substance_name: Option<String>,
  #[serde(rename = "SubstanceNumber", default)]
  numbers:        Vec<RawTyped>,
}

// ─── Publication ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPublicationInfo {
  publication_title: Option<String>,
  volume:            Option<String>,
  issue:             Option<String>,
  #[serde(default)]
  locators:          RawLocators,
  issue_title:       Option<String>,
  publisher:         Option<RawPublisher>,
  #[serde(default)]
  pages:             Vec<RawPages>,
  #[serde(default)]
  publication_notes: RawNotes,
}

#[derive(Debug, Default, Deserialize)]
struct RawLocators {
  #[serde(rename = "LocatorID", default)]
  list: Vec<RawTyped>,
}

#[derive(Debug, Default, Deserialize)]
struct RawNotes {
  #[serde(rename = "PublicationNote", default)]
  list: Vec<RawTyped>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPublisher {
  publisher_name:     Option<String>,
  publisher_location: Option<RawPublisherLocation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPublisherLocation {
  publisher_mailing_address: Option<String>,
  publisher_email_address:   Option<String>,
  publisher_city_name:       Option<String>,
  publisher_post_code:       Option<String>,
  publisher_country_name:    Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPages {
  start_page: Option<String>,
  end_page:   Option<String>,
  pagination: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLinks {
  #[serde(rename = "Link", default)]
  list: Vec<RawTyped>,
}

// ─── Conversion ──────────────────────────────────────────────────────────────

/// Trim, and treat blank as absent.
fn text(value: Option<String>) -> Option<String> {
  let value = value?;
  let trimmed = value.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The text pieces of mixed content, joined by single spaces.
fn joined(parts: Vec<RawTextPart>) -> Option<String> {
  let pieces: Vec<String> = parts
    .into_iter()
    .filter_map(|part| match part {
      RawTextPart::Text(t) => text(Some(t)),
      RawTextPart::Markup => None,
    })
    .collect();
  (!pieces.is_empty()).then(|| pieces.join(" "))
}

fn texts(values: Vec<String>) -> Vec<String> {
  values.into_iter().filter_map(|v| text(Some(v))).collect()
}

fn localized(values: Vec<RawLocalized>) -> Vec<LocalizedText> {
  values
    .into_iter()
    .filter_map(|raw| {
      let body = joined(raw.text)?;
      Some(LocalizedText { language: text(raw.language), text: body })
    })
    .collect()
}

impl RawTyped {
  fn into_typed(self) -> Option<TypedValue> {
    let value = joined(self.value)?;
    Some(TypedValue { kind: text(self.kind), value })
  }
}

fn typed(values: Vec<RawTyped>) -> Vec<TypedValue> {
  values.into_iter().filter_map(RawTyped::into_typed).collect()
}

impl RawExport {
  /// Map onto the core batch. Fails on the first record whose identifier is
  /// missing or not a number.
  pub(crate) fn into_batch(self) -> Result<SourceBatch> {
    let metadata = BatchMetadata {
      alert_id:   text(self.alert_id),
      alert_name: text(self.alert_name),
      timestamp:  text(self.timestamp),
    };

    let records = self
      .documents
      .literature
      .into_iter()
      .enumerate()
      .map(|(position, raw)| raw.into_record(position))
      .collect::<Result<Vec<_>>>()?;

    Ok(SourceBatch { metadata, records })
  }
}

impl RawLiterature {
  fn into_record(self, position: usize) -> Result<SourceRecord> {
    let info = self.doc_info;

    let raw_id = text(info.proquest_id).ok_or(Error::MissingIdentifier { position })?;
    let proquest_id: RecordId = raw_id
      .parse()
      .map_err(|source| Error::InvalidIdentifier { position, source })?;

    let mut links: Vec<TypedValue> = text(info.url)
      .map(|url| TypedValue { kind: None, value: url })
      .into_iter()
      .collect();
    links.extend(typed(self.links.list));

    Ok(SourceRecord {
      proquest_id,
      accession_number: text(info.accession_number),
      database_name: text(info.database_name),
      titles: localized(info.title_info.titles),
      alternate_titles: localized(info.title_info.alternate),
      document_ids: typed(info.document_ids.ids),
      source_attribution: text(info.source_attribution),
      publication_date: text(info.publication_date),
      publication_alpha_date: text(info.publication_alpha_date),
      date_created: text(info.date_created),
      date_revised: text(info.date_revised),
      first_available_date: text(info.first_available_date),
      last_update_date: text(info.last_update_date),
      document_status: text(info.document_status),
      document_type: text(info.document_type),
      source_type: text(info.source_type),
      doi: text(info.doi),
      language: text(info.language),
      num_refs: text(info.doc_features.num_refs),
      contributors: self.contributors.list.into_iter().map(Into::into).collect(),
      abstracts: self
        .abstracts
        .into_iter()
        .filter_map(RawAbstract::into_abstract)
        .collect(),
      heading_terms: self
        .subjects
        .heading_terms
        .list
        .into_iter()
        .map(Into::into)
        .collect(),
      subject_terms: texts(self.subjects.subject_terms.list),
      identifier_terms: texts(self.subjects.identifier_terms.list),
      classifications: self.classifications.list.into_iter().map(Into::into).collect(),
      substance_terms: self
        .substance_info
        .substance_terms
        .list
        .into_iter()
        .map(Into::into)
        .collect(),
      publication: self.publication_info.into(),
      links,
    })
  }
}

impl From<RawContributor> for Contributor {
  fn from(raw: RawContributor) -> Self {
    Self {
      order:           text(raw.order),
      role:            text(raw.role),
      normalized_name: text(raw.normalized_name),
      last_name:       text(raw.last_name),
      first_name:      text(raw.first_name),
      company_names:   texts(raw.company_names),
      email_address:   text(raw.email_address),
      ref_code:        raw.ref_code.and_then(RawTyped::into_typed),
      person_title:    text(raw.person_title),
      name_suffix:     text(raw.name_suffix),
    }
  }
}

impl RawAbstract {
  fn into_abstract(self) -> Option<Abstract> {
    let body = joined(self.text)?;
    Some(Abstract {
      text:       body,
      word_count: text(self.word_count),
      kind:       text(self.kind),
      language:   text(self.language),
    })
  }
}

impl From<RawHeadingTerm> for HeadingTerm {
  fn from(raw: RawHeadingTerm) -> Self {
    Self {
      vocabulary:              text(raw.vocabulary),
      term_type:               text(raw.term_type),
      heading:                 raw.heading.and_then(|h| {
        let body = joined(h.text)?;
        Some(Heading {
          text:         body,
          major_topic:  text(h.major_topic),
          heading_type: text(h.heading_type),
        })
      }),
      qualifier:               raw.heading_qualifier.and_then(RawTyped::into_typed),
      qualifier_name_sub_link: text(raw.qualifier_name_sub_link),
    }
  }
}

impl From<RawClassTerm> for Classification {
  fn from(raw: RawClassTerm) -> Self {
    Self {
      vocabulary: text(raw.vocabulary),
      term_type:  text(raw.term_type),
      code:       text(raw.class_code),
      expansion:  text(raw.class_expansion),
    }
  }
}

impl From<RawSubstanceTerm> for SubstanceTerm {
  fn from(raw: RawSubstanceTerm) -> Self {
    Self { name: text(raw.substance_name), numbers: typed(raw.numbers) }
  }
}

impl From<RawPublicationInfo> for PublicationInfo {
  fn from(raw: RawPublicationInfo) -> Self {
    Self {
      title:       text(raw.publication_title),
      volume:      text(raw.volume),
      issue:       text(raw.issue),
      issue_title: text(raw.issue_title),
      locators:    typed(raw.locators.list),
      publisher:   raw.publisher.map(|p| Publisher {
        name:     text(p.publisher_name),
        location: p.publisher_location.map(|l| PublisherLocation {
          mailing_address: text(l.publisher_mailing_address),
          email_address:   text(l.publisher_email_address),
          city:            text(l.publisher_city_name),
          post_code:       text(l.publisher_post_code),
          country:         text(l.publisher_country_name),
        }),
      }),
      pages:       raw
        .pages
        .into_iter()
        .map(|p| Pages {
          start_page: text(p.start_page),
          end_page:   text(p.end_page),
          pagination: text(p.pagination),
        })
        .collect(),
      notes:       typed(raw.publication_notes.list),
    }
  }
}
