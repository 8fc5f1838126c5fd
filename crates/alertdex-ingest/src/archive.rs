//! Archive naming.
//!
//! A processed file moves to `<archive_dir>/<name>` if its name already
//! carries a run timestamp, else to `<archive_dir>/<stamp>_<name>`. The `_`
//! after the stamp keeps the name recognisable to tag derivation if an
//! archived file is ever fed back in.

use std::sync::LazyLock;

use alertdex_core::transfer::join_remote;
use chrono::{DateTime, Utc};
use regex::Regex;

/// `strftime` layout of the archive stamp, e.g. `2019-04-01T120000`.
pub const ARCHIVE_STAMP_FORMAT: &str = "%Y-%m-%dT%H%M%S";

static DATED_NAME: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}T\d{6}").expect("stamp pattern is valid"));

/// `true` if `file_name` already contains an archive stamp.
pub fn is_dated(file_name: &str) -> bool { DATED_NAME.is_match(file_name) }

/// The archived file name for `file_name` archived at `now`.
pub fn archive_name(file_name: &str, now: DateTime<Utc>) -> String {
  if is_dated(file_name) {
    file_name.to_string()
  } else {
    format!("{}_{file_name}", now.format(ARCHIVE_STAMP_FORMAT))
  }
}

/// Full drop path the file is moved to.
pub fn archive_destination(archive_dir: &str, file_name: &str, now: DateTime<Utc>) -> String {
  join_remote(archive_dir, &archive_name(file_name, now))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2019, 4, 1, 9, 5, 7).unwrap() }

  #[test]
  fn undated_name_gets_a_stamp() {
    assert_eq!(
      archive_destination("archive", "_Diabetes (Q1).xml", now()),
      "archive/2019-04-01T090507__Diabetes (Q1).xml"
    );
  }

  #[test]
  fn dated_name_is_kept() {
    let name = "2018-12-31T235959_Asthma (Weekly).xml";
    assert!(is_dated(name));
    assert_eq!(archive_destination("archive", name, now()), format!("archive/{name}"));
  }

  #[test]
  fn stamp_anywhere_in_the_name_counts() {
    assert!(is_dated("Asthma 2018-12-31T235959.xml"));
    assert!(!is_dated("Asthma 2018-12-31.xml"));
    assert!(!is_dated("Asthma 2018-12-31T2359.xml"));
  }

  #[test]
  fn archived_name_still_yields_the_tag() {
    let archived = archive_name("Lung Cancer (Archive).xml", now());
    assert_eq!(
      alertdex_core::tag::tag_from_file_name(&archived).as_deref(),
      Some("Lung Cancer")
    );
  }
}
