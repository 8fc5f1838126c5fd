//! Import of literature alert exports into the search index.
//!
//! A run lists export files on a drop, parses each one, derives its tag,
//! writes every record through a [`submit::SubmissionStrategy`] and moves the
//! file to the archive. See [`pipeline::Pipeline`].

pub mod archive;
pub mod config;
pub mod context;
pub mod drop;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod submit;
pub mod workdir;

pub use config::{AppConfig, FailurePolicy, PipelineConfig, SubmissionMode};
pub use context::IngestContext;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use report::RunReport;

#[cfg(test)]
mod tests;
