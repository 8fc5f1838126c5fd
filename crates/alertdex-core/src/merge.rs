//! Tag merge resolution.
//!
//! Given the tag produced by this run and whatever the store already holds
//! for the same record, compute the tag set to write.

use crate::{document::NormalizedDocument, tag::TagSet};

/// `{new_tag}` when nothing is stored yet, `existing ∪ {new_tag}` otherwise.
pub fn resolve_tags(existing: Option<&TagSet>, new_tag: &str) -> TagSet {
  let mut tags = existing.cloned().unwrap_or_default();
  tags.insert(new_tag);
  tags
}

/// Resolve tags from the result of a store lookup.
///
/// `Ok(None)` is the first-write path. A lookup error is handed back to the
/// caller untouched: treating it as "not found" would write `{new_tag}` over
/// whatever history the store holds.
pub fn resolve_lookup<E>(
  lookup: Result<Option<NormalizedDocument>, E>,
  new_tag: &str,
) -> Result<TagSet, E> {
  let existing = lookup?;
  Ok(resolve_tags(existing.as_ref().map(|doc| &doc.tags), new_tag))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{RecordId, SourceRecord};

  fn stored(tags: &[&str]) -> NormalizedDocument {
    NormalizedDocument {
      record: SourceRecord::new(RecordId(1)),
      tags: tags.iter().copied().collect(),
      ..NormalizedDocument::default()
    }
  }

  #[test]
  fn nothing_stored_yields_only_new_tag() {
    let tags = resolve_tags(None, "Diabetes");
    assert_eq!(tags, TagSet::single("Diabetes"));
  }

  #[test]
  fn stored_tags_are_kept() {
    let existing: TagSet = ["Asthma", "COPD"].into_iter().collect();
    let tags = resolve_tags(Some(&existing), "Diabetes");
    assert!(existing.iter().all(|t| tags.contains(t)));
    assert!(tags.contains("Diabetes"));
    assert_eq!(tags.len(), 3);
  }

  #[test]
  fn repeating_a_tag_does_not_duplicate_it() {
    let once = resolve_tags(None, "t1");
    let twice = resolve_tags(Some(&once), "t1");
    assert_eq!(twice, TagSet::single("t1"));
  }

  #[test]
  fn order_of_runs_does_not_matter() {
    let a = resolve_tags(Some(&resolve_tags(None, "t1")), "t2");
    let b = resolve_tags(Some(&resolve_tags(None, "t2")), "t1");
    assert_eq!(a, b);
    assert_eq!(a, ["t1", "t2"].into_iter().collect());
  }

  #[test]
  fn lookup_not_found_is_first_write() {
    let tags = resolve_lookup::<()>(Ok(None), "Diabetes").unwrap();
    assert_eq!(tags, TagSet::single("Diabetes"));
  }

  #[test]
  fn lookup_hit_merges() {
    let tags = resolve_lookup::<()>(Ok(Some(stored(&["Asthma"]))), "Diabetes").unwrap();
    assert_eq!(tags, ["Asthma", "Diabetes"].into_iter().collect());
  }

  #[test]
  fn lookup_error_is_not_treated_as_missing() {
    let result = resolve_lookup(Err("connection reset"), "Diabetes");
    assert_eq!(result, Err("connection reset"));
  }
}
