//! Per-run context handed to the pipeline and its submission strategy.

use std::sync::Arc;

use tracing::Span;
use uuid::Uuid;

use crate::config::PipelineConfig;

/// Identity, settings and tracing span of one import run.
#[derive(Debug, Clone)]
pub struct IngestContext {
  pub run_id: Uuid,
  pub config: Arc<PipelineConfig>,
  span:       Span,
}

impl IngestContext {
  pub fn new(config: PipelineConfig) -> Self {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id);
    Self { run_id, config: Arc::new(config), span }
  }

  /// Parent span of everything logged during the run.
  pub fn span(&self) -> &Span { &self.span }
}
