//! Index mapping for literature documents.
//!
//! Sent once, when `ensure_index` finds the index missing.
//! Existing indices are never altered.

/// Bundled mapping; idempotent to apply because it is only ever sent to a
/// freshly created index.
pub const DEFAULT_MAPPING: &str = r#"{
  "settings": {
    "number_of_shards": 1,
    "analysis": {
      "normalizer": {
        "lowercase_keyword": { "type": "custom", "filter": ["lowercase"] }
      }
    }
  },
  "mappings": {
    "dynamic": true,
    "properties": {
      "proquestId":           { "type": "long" },
      "accessionNumber":      { "type": "keyword" },
      "databaseName":         { "type": "keyword" },
      "titles": {
        "properties": {
          "language": { "type": "keyword" },
          "text":     { "type": "text", "fields": { "raw": { "type": "keyword", "ignore_above": 512 } } }
        }
      },
      "alternateTitles": {
        "properties": {
          "language": { "type": "keyword" },
          "text":     { "type": "text" }
        }
      },
      "documentIds": {
        "properties": {
          "kind":  { "type": "keyword" },
          "value": { "type": "keyword" }
        }
      },
      "publicationDate":      { "type": "keyword" },
      "publicationAlphaDate": { "type": "keyword" },
      "dateCreated":          { "type": "keyword" },
      "dateRevised":          { "type": "keyword" },
      "firstAvailableDate":   { "type": "keyword" },
      "lastUpdateDate":       { "type": "keyword" },
      "documentStatus":       { "type": "keyword" },
      "documentType":         { "type": "keyword" },
      "sourceType":           { "type": "keyword" },
      "doi":                  { "type": "keyword", "normalizer": "lowercase_keyword" },
      "language":             { "type": "keyword" },
      "numRefs":              { "type": "keyword" },
      "contributors": {
        "type": "nested",
        "properties": {
          "order":          { "type": "keyword" },
          "role":           { "type": "keyword" },
          "normalizedName": { "type": "text", "fields": { "raw": { "type": "keyword" } } },
          "lastName":       { "type": "text" },
          "firstName":      { "type": "text" },
          "companyNames":   { "type": "text" },
          "emailAddress":   { "type": "keyword" }
        }
      },
      "abstracts": {
        "properties": {
          "text":      { "type": "text" },
          "wordCount": { "type": "keyword" },
          "kind":      { "type": "keyword" },
          "language":  { "type": "keyword" }
        }
      },
      "subjectTerms":         { "type": "keyword" },
      "identifierTerms":      { "type": "keyword" },
      "links": {
        "properties": {
          "kind":  { "type": "keyword" },
          "value": { "type": "keyword", "index": false }
        }
      },
      "indexedAt":            { "type": "date" },
      "tags":                 { "type": "keyword" }
    }
  }
}"#;
