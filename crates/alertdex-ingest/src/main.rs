//! alertdex-import binary.
//!
//! Reads `alertdex.toml` (or the path given with `--config`) overlaid with
//! `ALERTDEX_*` environment variables, checks the store, then runs one import
//! over the file drop.
//!
//! ```sh
//! ALERTDEX_STORE__URL=http://es:9200 alertdex-import --log-file import.log
//! ```

use std::{
  fs::OpenOptions,
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
};

use alertdex_core::store::DocumentStore;
use alertdex_ingest::{
  AppConfig, Error, IngestContext, Pipeline, RunReport, SubmissionMode, drop::LocalDrop,
};
use alertdex_store_es::EsStore;
use anyhow::Context as _;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser)]
#[command(author, version, about = "Import literature alert exports into the search index")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "alertdex.toml")]
  config: PathBuf,

  /// Also append log output to this file.
  #[arg(long)]
  log_file: Option<PathBuf>,

  /// Write the run report as JSON to this path.
  #[arg(long)]
  report: Option<PathBuf>,

  /// Override `pipeline.submission`.
  #[arg(long, value_enum)]
  submission: Option<SubmissionMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.log_file.as_deref())?;

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(
      config::Environment::with_prefix("ALERTDEX")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let mut app: AppConfig = settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")?;
  if let Some(mode) = cli.submission {
    app.pipeline.submission = mode;
  }

  // Check the store before touching any file.
  let store = EsStore::new(app.store.clone()).context("failed to build store client")?;
  let version = store
    .ping()
    .await
    .with_context(|| format!("store at {} is unreachable", app.store.url))?;
  tracing::info!(url = %app.store.url, %version, "connected to store");

  let index = store
    .ensure_index()
    .await
    .with_context(|| format!("failed to prepare index {}", store.index()))?;
  tracing::info!(index = store.index(), status = ?index, "index ready");

  let file_drop = LocalDrop::from_config(&app.drop);
  let pipeline = Pipeline::new(Arc::new(store), Arc::new(file_drop), IngestContext::new(app.pipeline));

  match pipeline.run().await {
    Ok(report) => write_report(cli.report.as_deref(), &report),
    Err(Error::Aborted { file, reason, report }) => {
      write_report(cli.report.as_deref(), &report)?;
      anyhow::bail!("run aborted at {file}: {reason}")
    }
    Err(e) => Err(e).context("import run failed"),
  }
}

/// Log to stdout, and to `log_file` in append mode when given.
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
  let file_layer = match log_file {
    Some(path) => {
      let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
      Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
    }
    None => None,
  };

  tracing_subscriber::registry()
    .with(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with(fmt::layer())
    .with(file_layer)
    .init();
  Ok(())
}

fn write_report(path: Option<&Path>, report: &RunReport) -> anyhow::Result<()> {
  if let Some(path) = path {
    report
      .write_json(path)
      .with_context(|| format!("failed to write report to {}", path.display()))?;
    tracing::info!(path = %path.display(), "report written");
  }
  Ok(())
}
