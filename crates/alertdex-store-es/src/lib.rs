//! Elasticsearch backend for the alertdex document store.
//!
//! Talks to the REST API over [`reqwest`]; every call is a single HTTP
//! request with the timeout taken from [`EsConfig`].

mod bulk;
mod mapping;
mod store;

pub mod config;
pub mod error;

pub use config::EsConfig;
pub use error::{Error, Result};
pub use mapping::DEFAULT_MAPPING;
pub use store::EsStore;
