//! Export-file codec for alertdex.
//!
//! Decodes a literature export (root element `ProQuestExport`) into
//! [`alertdex_core`] record types. Pure synchronous; no I/O.
//!
//! # Quick start
//!
//! ```no_run
//! let xml = br#"<ProQuestExport>
//!   <AlertName>Diabetes</AlertName>
//!   <Documents>
//!     <Literature><DocInfo><ProquestID>1</ProquestID></DocInfo></Literature>
//!   </Documents>
//! </ProQuestExport>"#;
//! let batch = alertdex_xml::parse(xml).unwrap();
//! println!("{} records for {:?}", batch.records.len(), batch.metadata.alert_name);
//! ```

pub mod error;
mod model;
mod parse;

pub use error::{Error, Result};
pub use parse::ROOT_ELEMENT;

use alertdex_core::record::SourceBatch;

/// Decode one export file.
///
/// The whole file is rejected on any failure: markup that cannot be read, a
/// root element other than [`ROOT_ELEMENT`], or a record whose identifier is
/// missing or not a number. No partial batch is ever returned.
pub fn parse(input: &[u8]) -> Result<SourceBatch> { parse::parse_export(input) }
