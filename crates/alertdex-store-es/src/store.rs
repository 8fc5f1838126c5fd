//! [`EsStore`], the Elasticsearch implementation of [`DocumentStore`].

use std::{sync::Arc, time::Duration};

use alertdex_core::{
  document::NormalizedDocument,
  record::RecordId,
  store::{BulkItem, DocumentStore, IndexStatus},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;

use crate::{EsConfig, Error, Result, bulk, mapping::DEFAULT_MAPPING};

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GetResponse {
  #[serde(default)]
  found:  bool,
  #[serde(rename = "_source")]
  source: Option<NormalizedDocument>,
}

#[derive(Debug, Deserialize)]
struct CreateIndexResponse {
  #[serde(default)]
  acknowledged: bool,
}

#[derive(Debug, Deserialize)]
struct RootResponse {
  version: VersionInfo,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
  number: String,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store backed by one Elasticsearch index.
///
/// Cloning is cheap; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct EsStore {
  client: Client,
  config: Arc<EsConfig>,
}

impl EsStore {
  pub fn new(config: EsConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config: Arc::new(config) })
  }

  pub fn index(&self) -> &str { &self.config.index }

  pub(crate) fn url(&self, path: &str) -> String {
    format!(
      "{}/{}",
      self.config.url.trim_end_matches('/'),
      path.trim_start_matches('/')
    )
  }

  pub(crate) fn doc_url(&self, id: RecordId) -> String {
    self.url(&format!("{}/_doc/{id}", self.config.index))
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.config.username {
      Some(user) if !user.is_empty() => req.basic_auth(user, self.config.password.as_ref()),
      _ => req,
    }
  }

  /// Check the cluster answers and return its version number.
  pub async fn ping(&self) -> Result<String> {
    let resp = self.auth(self.client.get(self.url("/"))).send().await?;
    if !resp.status().is_success() {
      return Err(status_error("ping", resp).await);
    }
    let root: RootResponse = resp.json().await?;
    Ok(root.version.number)
  }

  /// The mapping body sent when creating the index.
  pub(crate) async fn mapping(&self) -> Result<String> {
    match &self.config.mapping_path {
      Some(path) => tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Mapping { path: path.display().to_string(), source }),
      None => Ok(DEFAULT_MAPPING.to_string()),
    }
  }
}

/// Drain `resp` into an [`Error::Status`].
async fn status_error(operation: &'static str, resp: Response) -> Error {
  let status = resp.status().as_u16();
  let body = resp.text().await.unwrap_or_default();
  Error::Status { operation, status, body }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for EsStore {
  type Error = Error;

  async fn ensure_index(&self) -> Result<IndexStatus> {
    let index_url = self.url(&self.config.index);

    let resp = self.auth(self.client.head(&index_url)).send().await?;
    match resp.status() {
      s if s.is_success() => return Ok(IndexStatus::Existing),
      StatusCode::NOT_FOUND => {}
      _ => return Err(status_error("index check", resp).await),
    }

    tracing::info!(index = %self.config.index, "index missing; creating it from mapping");
    let mapping = self.mapping().await?;
    let resp = self
      .auth(self.client.put(&index_url))
      .header(header::CONTENT_TYPE, "application/json")
      .body(mapping)
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(status_error("create index", resp).await);
    }

    let created: CreateIndexResponse = resp.json().await?;
    if !created.acknowledged {
      return Err(Error::NotAcknowledged(self.config.index.clone()));
    }
    Ok(IndexStatus::Created)
  }

  async fn get_by_id(&self, id: RecordId) -> Result<Option<NormalizedDocument>> {
    let resp = self.auth(self.client.get(self.doc_url(id))).send().await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !resp.status().is_success() {
      return Err(status_error("get", resp).await);
    }

    let found: GetResponse = resp.json().await?;
    Ok(if found.found { found.source } else { None })
  }

  async fn upsert(&self, doc: &NormalizedDocument) -> Result<()> {
    let resp = self
      .auth(self.client.put(self.doc_url(doc.id())))
      .json(doc)
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(status_error("upsert", resp).await);
    }
    Ok(())
  }

  async fn bulk_upsert(&self, docs: &[NormalizedDocument]) -> Result<Vec<BulkItem>> {
    if docs.is_empty() {
      return Ok(Vec::new());
    }

    let body = bulk::encode(&self.config.index, docs)?;
    let resp = self
      .auth(self.client.post(self.url("/_bulk")))
      .header(header::CONTENT_TYPE, "application/x-ndjson")
      .body(body)
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(status_error("bulk", resp).await);
    }

    let text = resp.text().await?;
    bulk::decode(&text, docs)
  }
}
