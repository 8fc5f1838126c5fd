//! Core types and trait definitions for the alertdex literature importer.
//!
//! Nothing here does HTTP, XML or filesystem work; the other crates build on
//! its record types and collaborator traits.

pub mod document;
pub mod error;
pub mod merge;
pub mod outcome;
pub mod record;
pub mod store;
pub mod tag;
pub mod transfer;

pub use error::{Error, Result};
