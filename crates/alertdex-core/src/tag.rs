//! Classification tags and their derivation.
//!
//! Every import run associates exactly one tag with every record of a file.
//! The tag comes from the file's alert metadata when present, otherwise from
//! the file name, otherwise it is [`UNDEFINED_TAG`].

use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::record::BatchMetadata;

/// Tag used when neither the metadata nor the file name yields one.
pub const UNDEFINED_TAG: &str = "-undefined-";

/// `<name> (<suffix>).xml`, optionally behind an archive prefix ending in `_`.
///
/// The name class is spelled out as ASCII letters and space; a range such as
/// `[A-z]` would also admit `[`, `\`, `]`, `^`, `_` and the backtick.
static FILE_NAME_TAG: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?:^|_)([A-Za-z ]+) \(.+\)\.xml$").expect("tag pattern is valid")
});

// ─── TagSet ──────────────────────────────────────────────────────────────────

/// A set of distinct, non-empty tags.
///
/// Serialises as a sorted list so repeated writes of the same set produce the
/// same document body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
  pub fn new() -> Self { Self::default() }

  /// A set holding only `tag` (empty if `tag` is blank).
  pub fn single(tag: impl Into<String>) -> Self {
    let mut set = Self::new();
    set.insert(tag);
    set
  }

  /// Insert `tag`, returning `true` if it was not already present.
  /// Blank tags are never stored.
  pub fn insert(&mut self, tag: impl Into<String>) -> bool {
    let tag = tag.into();
    if tag.trim().is_empty() {
      return false;
    }
    self.0.insert(tag)
  }

  pub fn contains(&self, tag: &str) -> bool { self.0.contains(tag) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }
}

impl From<Vec<String>> for TagSet {
  fn from(tags: Vec<String>) -> Self { tags.into_iter().collect() }
}

impl From<TagSet> for Vec<String> {
  fn from(set: TagSet) -> Self { set.0.into_iter().collect() }
}

impl FromIterator<String> for TagSet {
  fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
    let mut set = TagSet::new();
    for tag in iter {
      set.insert(tag);
    }
    set
  }
}

impl<'a> FromIterator<&'a str> for TagSet {
  fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
    iter.into_iter().map(str::to_owned).collect()
  }
}

// ─── Derivation ──────────────────────────────────────────────────────────────

/// Compute the tag for every record of one file.
///
/// 1. A non-blank alert name in the metadata is used verbatim.
/// 2. Otherwise the letters-and-spaces run before ` (…).xml` in `file_name`,
///    trimmed.
/// 3. Otherwise [`UNDEFINED_TAG`].
pub fn derive_tag(metadata: &BatchMetadata, file_name: &str) -> String {
  if let Some(name) = metadata.alert_name.as_deref()
    && !name.trim().is_empty()
  {
    return name.to_string();
  }

  tag_from_file_name(file_name).unwrap_or_else(|| UNDEFINED_TAG.to_string())
}

/// The classification phrase embedded in an export file name, if any.
pub fn tag_from_file_name(file_name: &str) -> Option<String> {
  let captures = FILE_NAME_TAG.captures(file_name)?;
  let phrase = captures.get(1)?.as_str().trim();
  (!phrase.is_empty()).then(|| phrase.to_string())
}
