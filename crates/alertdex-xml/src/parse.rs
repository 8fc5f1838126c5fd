//! Export parsing.
//!
//! Pipeline:
//!   raw bytes
//!     └─ UTF-8 check            → &str
//!          └─ root_element()    → root name must be `ProQuestExport`
//!               └─ flatten_inline_markup() → formatting tags dropped
//!                    └─ serde decode → RawExport
//!                         └─ into_batch() → SourceBatch

use alertdex_core::record::SourceBatch;
use quick_xml::{
  Reader, Writer,
  events::{BytesText, Event},
};

use crate::{
  error::{Error, Result},
  model::RawExport,
};

/// Name of the only root element an export may have.
pub const ROOT_ELEMENT: &str = "ProQuestExport";

/// Formatting elements that may appear inside titles, abstracts and other
/// text. The tags are dropped and their text kept in place.
const INLINE_MARKUP: &[&str] =
  &["b", "i", "u", "em", "strong", "sub", "sup", "span", "small", "br"];

pub(crate) fn parse_export(input: &[u8]) -> Result<SourceBatch> {
  let xml = std::str::from_utf8(input)?;
  let xml = xml.trim_start_matches('\u{feff}');

  let root = root_element(xml)?;
  if root != ROOT_ELEMENT {
    return Err(Error::UnexpectedRoot { found: root, expected: ROOT_ELEMENT });
  }

  let flat = flatten_inline_markup(xml)?;
  let raw: RawExport = quick_xml::de::from_str(&flat)?;
  raw.into_batch()
}

fn is_inline(name: &[u8]) -> bool {
  INLINE_MARKUP.iter().any(|m| m.as_bytes().eq_ignore_ascii_case(name))
}

/// Copy `xml`, dropping [`INLINE_MARKUP`] tags. An empty inline element
/// (`<br/>`) becomes a space.
fn flatten_inline_markup(xml: &str) -> Result<String> {
  let mut reader = Reader::from_str(xml);
  let mut writer = Writer::new(Vec::with_capacity(xml.len()));

  loop {
    let event = reader.read_event().map_err(|e| Error::Markup(e.to_string()))?;
    let written = match event {
      Event::Eof => break,
      Event::Start(ref e) if is_inline(e.local_name().as_ref()) => Ok(()),
      Event::End(ref e) if is_inline(e.local_name().as_ref()) => Ok(()),
      Event::Empty(ref e) if is_inline(e.local_name().as_ref()) => {
        writer.write_event(Event::Text(BytesText::new(" ")))
      }
      event => writer.write_event(event),
    };
    written.map_err(|e| Error::Markup(e.to_string()))?;
  }

  String::from_utf8(writer.into_inner()).map_err(|e| Error::Encoding(e.utf8_error()))
}

/// Local name of the first element in `xml`, skipping the prolog.
fn root_element(xml: &str) -> Result<String> {
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text(true);

  loop {
    match reader.read_event() {
      Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
        let name = e.name();
        return Ok(String::from_utf8_lossy(local_name(name.as_ref())).into_owned());
      }
      Ok(Event::Text(ref t)) if !t.iter().all(u8::is_ascii_whitespace) => {
        return Err(Error::Markup("text before the root element".into()));
      }
      Ok(Event::Eof) => return Err(Error::Empty),
      Err(e) => return Err(Error::Markup(e.to_string())),
      _ => {}
    }
  }
}

fn local_name(name: &[u8]) -> &[u8] {
  // strip "prefix:" if present
  if let Some(pos) = name.iter().rposition(|&b| b == b':') {
    &name[pos + 1..]
  } else {
    name
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
