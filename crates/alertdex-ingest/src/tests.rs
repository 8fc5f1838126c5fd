//! Pipeline and submission tests against in-memory collaborators.

use std::{
  collections::{BTreeMap, BTreeSet},
  io,
  path::Path,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use alertdex_core::{
  document::NormalizedDocument,
  outcome::{FileStage, FileStatus, RecordOutcome},
  record::{RecordId, SourceRecord},
  store::{BulkItem, DocumentStore, IndexStatus},
  tag::{TagSet, UNDEFINED_TAG},
  transfer::{FileTransfer, RemoteFile, join_remote},
};
use bytes::Bytes;

use crate::{
  Error, FailurePolicy, IngestContext, Pipeline, PipelineConfig, SubmissionMode,
  archive::is_dated,
  drop::LocalDrop,
  submit::{BatchedSubmission, StrictSubmission, SubmissionStrategy},
  workdir::COPY_PREFIX,
};

// ─── MemoryStore ─────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FakeError(String);

#[derive(Default)]
struct MemoryStore {
  docs:         Mutex<BTreeMap<RecordId, NormalizedDocument>>,
  fail_lookup:  Mutex<BTreeSet<RecordId>>,
  fail_upsert:  Mutex<BTreeSet<RecordId>>,
  reject_bulk:  Mutex<BTreeSet<RecordId>>,
  fail_request: AtomicBool,
  lookups:      AtomicUsize,
  upserts:      AtomicUsize,
  bulk_calls:   AtomicUsize,
}

impl MemoryStore {
  fn tags(&self, id: u64) -> Option<TagSet> {
    self.docs.lock().unwrap().get(&RecordId(id)).map(|d| d.tags.clone())
  }

  fn seed(&self, id: u64, tags: &[&str]) {
    let doc = NormalizedDocument {
      record: SourceRecord::new(RecordId(id)),
      tags: tags.iter().copied().collect(),
      ..NormalizedDocument::default()
    };
    self.docs.lock().unwrap().insert(RecordId(id), doc);
  }

  fn len(&self) -> usize { self.docs.lock().unwrap().len() }
}

impl DocumentStore for MemoryStore {
  type Error = FakeError;

  async fn ensure_index(&self) -> Result<IndexStatus, FakeError> { Ok(IndexStatus::Existing) }

  async fn get_by_id(&self, id: RecordId) -> Result<Option<NormalizedDocument>, FakeError> {
    self.lookups.fetch_add(1, Ordering::SeqCst);
    if self.fail_lookup.lock().unwrap().contains(&id) {
      return Err(FakeError("connection reset".into()));
    }
    Ok(self.docs.lock().unwrap().get(&id).cloned())
  }

  async fn upsert(&self, doc: &NormalizedDocument) -> Result<(), FakeError> {
    self.upserts.fetch_add(1, Ordering::SeqCst);
    if self.fail_upsert.lock().unwrap().contains(&doc.id()) {
      return Err(FakeError("version conflict".into()));
    }
    self.docs.lock().unwrap().insert(doc.id(), doc.clone());
    Ok(())
  }

  async fn bulk_upsert(&self, docs: &[NormalizedDocument]) -> Result<Vec<BulkItem>, FakeError> {
    self.bulk_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_request.load(Ordering::SeqCst) {
      return Err(FakeError("503 service unavailable".into()));
    }
    let rejected = self.reject_bulk.lock().unwrap().clone();
    let mut stored = self.docs.lock().unwrap();
    Ok(
      docs
        .iter()
        .map(|doc| {
          if rejected.contains(&doc.id()) {
            BulkItem::failed(doc.id(), "mapper_parsing_exception")
          } else {
            stored.insert(doc.id(), doc.clone());
            BulkItem::succeeded(doc.id())
          }
        })
        .collect(),
    )
  }
}

// ─── MemoryDrop ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryDrop {
  files:         Mutex<BTreeMap<String, Bytes>>,
  fail_download: Mutex<BTreeSet<String>>,
  fail_list:     AtomicBool,
  fail_rename:   AtomicBool,
  renames:       Mutex<Vec<(String, String)>>,
}

impl MemoryDrop {
  fn put(&self, path: &str, content: impl Into<Bytes>) {
    self.files.lock().unwrap().insert(path.to_string(), content.into());
  }

  fn has(&self, path: &str) -> bool { self.files.lock().unwrap().contains_key(path) }

  fn renames(&self) -> Vec<(String, String)> { self.renames.lock().unwrap().clone() }
}

impl FileTransfer for MemoryDrop {
  type Error = io::Error;

  async fn list(&self, dir: &str, suffix: &str) -> io::Result<Vec<RemoteFile>> {
    if self.fail_list.load(Ordering::SeqCst) {
      return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "drop offline"));
    }
    let files = self.files.lock().unwrap();
    Ok(
      files
        .iter()
        .filter_map(|(path, content)| {
          let name = path.rsplit('/').next()?;
          (join_remote(dir, name) == *path && name.ends_with(suffix)).then(|| RemoteFile {
            name: name.to_string(),
            path: path.clone(),
            size: Some(content.len() as u64),
          })
        })
        .collect(),
    )
  }

  async fn download(&self, path: &str) -> io::Result<Bytes> {
    if self.fail_download.lock().unwrap().contains(path) {
      return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
    }
    self
      .files
      .lock()
      .unwrap()
      .get(path)
      .cloned()
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
  }

  async fn rename(&self, from: &str, to: &str) -> io::Result<()> {
    if self.fail_rename.load(Ordering::SeqCst) {
      return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only drop"));
    }
    let mut files = self.files.lock().unwrap();
    let content = files
      .remove(from)
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, from.to_string()))?;
    files.insert(to.to_string(), content);
    self.renames.lock().unwrap().push((from.to_string(), to.to_string()));
    Ok(())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn export(alert_name: Option<&str>, ids: &[u64]) -> Bytes {
  let name = alert_name.map(|n| format!("<AlertName>{n}</AlertName>")).unwrap_or_default();
  let records: String = ids
    .iter()
    .map(|id| {
      format!(
        "<Literature><DocInfo><ProquestID>{id}</ProquestID>\
         <TitleInfo><Title>Record {id}</Title></TitleInfo></DocInfo></Literature>"
      )
    })
    .collect();
  Bytes::from(format!(
    "<?xml version=\"1.0\"?><ProQuestExport>{name}<Documents>{records}</Documents></ProQuestExport>"
  ))
}

fn records(ids: &[u64]) -> Vec<SourceRecord> {
  ids.iter().map(|id| SourceRecord::new(RecordId(*id))).collect()
}

fn config(work_dir: &Path, submission: SubmissionMode) -> PipelineConfig {
  PipelineConfig {
    work_dir: work_dir.to_path_buf(),
    submission,
    ..PipelineConfig::default()
  }
}

struct Harness {
  store:    Arc<MemoryStore>,
  drop:     Arc<MemoryDrop>,
  work_dir: tempfile::TempDir,
}

impl Harness {
  fn new() -> Self {
    Self {
      store:    Arc::default(),
      drop:     Arc::default(),
      work_dir: tempfile::tempdir().unwrap(),
    }
  }

  fn config(&self, submission: SubmissionMode) -> PipelineConfig {
    config(self.work_dir.path(), submission)
  }

  fn pipeline(&self, config: PipelineConfig) -> Pipeline<MemoryStore, MemoryDrop> {
    Pipeline::new(self.store.clone(), self.drop.clone(), IngestContext::new(config))
  }

  fn work_dir_is_empty(&self) -> bool {
    std::fs::read_dir(self.work_dir.path()).unwrap().next().is_none()
  }
}

// ─── Strict submission ───────────────────────────────────────────────────────

#[tokio::test]
async fn strict_first_write_gets_exactly_the_new_tag() {
  let store = MemoryStore::default();
  store.seed(2, &["Diabetes", "Smoking"]);

  let results = StrictSubmission.submit(&store, records(&[1]), "Asthma").await;

  assert_eq!(results[0].outcome, RecordOutcome::Indexed { created: true });
  let tags = store.tags(1).unwrap();
  assert_eq!(tags.len(), 1);
  assert!(!tags.contains("Diabetes"));
  assert!(!tags.contains("Smoking"));
  assert_eq!(tags, TagSet::single("Asthma"));
  assert_eq!(store.tags(2), Some(["Diabetes", "Smoking"].into_iter().collect()));
}

#[tokio::test]
async fn strict_lookup_error_fails_record_without_writing() {
  let store = MemoryStore::default();
  store.seed(1, &["Asthma"]);
  store.fail_lookup.lock().unwrap().insert(RecordId(1));

  let results = StrictSubmission.submit(&store, records(&[1, 2]), "Diabetes").await;

  assert!(matches!(&results[0].outcome, RecordOutcome::Failed { reason } if reason.contains("connection reset")));
  assert!(results[1].is_indexed());
  assert_eq!(store.upserts.load(Ordering::SeqCst), 1);
  assert_eq!(store.tags(1), Some(TagSet::single("Asthma")));
}

#[tokio::test]
async fn strict_tags_accumulate_and_repeat_is_idempotent() {
  let store = MemoryStore::default();
  StrictSubmission.submit(&store, records(&[7]), "t1").await;
  StrictSubmission.submit(&store, records(&[7]), "t2").await;
  assert_eq!(store.tags(7), Some(TagSet::from_iter(["t1", "t2"])));

  let results = StrictSubmission.submit(&store, records(&[7]), "t1").await;
  assert_eq!(results[0].outcome, RecordOutcome::Indexed { created: false });
  assert_eq!(store.tags(7), Some(TagSet::from_iter(["t1", "t2"])));
}

#[tokio::test]
async fn strict_upsert_error_fails_only_that_record() {
  let store = MemoryStore::default();
  store.fail_upsert.lock().unwrap().insert(RecordId(2));

  let results = StrictSubmission.submit(&store, records(&[1, 2, 3]), "x").await;
  let indexed: Vec<bool> = results.iter().map(|r| r.is_indexed()).collect();
  assert_eq!(indexed, [true, false, true]);
  assert_eq!(store.len(), 2);
}

// ─── Batched submission ──────────────────────────────────────────────────────

#[tokio::test]
async fn batched_item_failure_is_named() {
  let store = MemoryStore::default();
  store.reject_bulk.lock().unwrap().insert(RecordId(2));

  let results = BatchedSubmission::default().submit(&store, records(&[1, 2, 3]), "x").await;

  let failed: Vec<RecordId> = results.iter().filter(|r| !r.is_indexed()).map(|r| r.id).collect();
  assert_eq!(failed, [RecordId(2)]);
  assert_eq!(results.iter().filter(|r| r.is_indexed()).count(), 2);
  assert_eq!(store.bulk_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn batched_replaces_stored_tags() {
  let store = MemoryStore::default();
  store.seed(1, &["old"]);

  BatchedSubmission::default().submit(&store, records(&[1]), "new").await;

  assert_eq!(store.tags(1), Some(TagSet::single("new")));
  assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn batched_request_failure_fails_every_record_in_it() {
  let store = MemoryStore::default();
  store.fail_request.store(true, Ordering::SeqCst);

  let results = BatchedSubmission::default().submit(&store, records(&[1, 2]), "x").await;
  assert_eq!(results.len(), 2);
  assert!(results.iter().all(|r| !r.is_indexed()));
}

#[tokio::test]
async fn batched_chunks_requests() {
  let store = MemoryStore::default();
  let strategy = BatchedSubmission { chunk_size: Some(2) };

  let results = strategy.submit(&store, records(&[1, 2, 3, 4, 5]), "x").await;
  assert_eq!(results.len(), 5);
  assert_eq!(store.bulk_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn batched_empty_file_sends_nothing() {
  let store = MemoryStore::default();
  let results = BatchedSubmission::default().submit(&store, Vec::new(), "x").await;
  assert!(results.is_empty());
  assert_eq!(store.bulk_calls.load(Ordering::SeqCst), 0);
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_tag_from_file_name() {
  let h = Harness::new();
  h.drop.put("_Diabetes (Q1).xml", export(None, &[11, 12]));

  let report = h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();

  assert_eq!(report.files_found, 1);
  assert_eq!(report.indexed, 2);
  assert_eq!(h.store.tags(11), Some(TagSet::single("Diabetes")));
  assert_eq!(h.store.tags(12), Some(TagSet::single("Diabetes")));

  let file = &report.files[0];
  assert_eq!(file.tag.as_deref(), Some("Diabetes"));
  assert_eq!(file.succeeded, 2);
  let FileStatus::Archived { destination } = &file.status else {
    panic!("not archived: {:?}", file.status);
  };
  assert!(destination.starts_with("archive/"));
  assert!(destination.ends_with("__Diabetes (Q1).xml"));
  assert_ne!(destination, "archive/_Diabetes (Q1).xml");
  assert!(is_dated(destination));
  assert!(h.drop.has(destination));
  assert!(!h.drop.has("_Diabetes (Q1).xml"));
  assert!(h.work_dir_is_empty());
}

#[tokio::test]
async fn alert_name_wins_over_file_name() {
  let h = Harness::new();
  h.drop.put("Lung Cancer (Archive).xml", export(Some("Smoking"), &[1]));

  let report = h.pipeline(h.config(SubmissionMode::Batched)).run().await.unwrap();
  assert_eq!(report.files[0].tag.as_deref(), Some("Smoking"));
  assert_eq!(h.store.tags(1), Some(TagSet::single("Smoking")));
}

#[tokio::test]
async fn unrecognised_name_gets_undefined_tag() {
  let h = Harness::new();
  h.drop.put("export.xml", export(None, &[1]));

  h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();
  assert_eq!(h.store.tags(1), Some(TagSet::single(UNDEFINED_TAG)));
}

#[tokio::test]
async fn dated_name_is_archived_unchanged() {
  let h = Harness::new();
  let name = "2019-04-01T120000_Asthma (Weekly).xml";
  h.drop.put(name, export(None, &[1]));

  h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();
  assert_eq!(h.drop.renames(), [(name.to_string(), format!("archive/{name}"))]);
  assert_eq!(h.store.tags(1), Some(TagSet::single("Asthma")));
}

#[tokio::test]
async fn files_run_in_listing_order_and_skip_the_archive() {
  let h = Harness::new();
  h.drop.put("b (x).xml", export(None, &[2]));
  h.drop.put("a (x).xml", export(None, &[1]));
  h.drop.put("archive/2018-01-01T000000_c (x).xml", export(None, &[3]));
  h.drop.put("notes.txt", Bytes::from_static(b"not an export"));

  let report = h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();
  let names: Vec<&str> = report.files.iter().map(|f| f.file_name.as_str()).collect();
  assert_eq!(names, ["a (x).xml", "b (x).xml"]);
  assert!(h.store.tags(3).is_none());
}

#[tokio::test]
async fn parse_failure_is_not_archived_and_copy_is_removed() {
  let h = Harness::new();
  h.drop.put("Broken (x).xml", Bytes::from_static(b"<ProQuestExport><Documents></ProQuestExport>"));
  h.drop.put("Good (x).xml", export(None, &[1]));

  let report = h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();

  let broken = &report.files[0];
  assert!(matches!(
    broken.status,
    FileStatus::Failed { last_stage: FileStage::Downloaded, .. }
  ));
  assert!(h.drop.has("Broken (x).xml"));
  assert_eq!(h.drop.renames().len(), 1);
  assert_eq!(report.indexed, 1);
  assert!(h.work_dir_is_empty());
}

#[tokio::test]
async fn failed_file_survives_when_work_dir_is_the_drop_root() {
  let root = tempfile::tempdir().unwrap();
  let broken = b"<ProQuestExport><Documents></ProQuestExport>";
  std::fs::write(root.path().join("Broken (x).xml"), broken).unwrap();
  std::fs::write(root.path().join("Asthma (x).xml"), export(None, &[1])).unwrap();

  let local_drop = Arc::new(LocalDrop::new(root.path()));
  let store = Arc::new(MemoryStore::default());
  let config = config(root.path(), SubmissionMode::Strict);
  let report = Pipeline::new(store.clone(), local_drop, IngestContext::new(config))
    .run()
    .await
    .unwrap();

  let failed = report.files.iter().find(|f| f.file_name == "Broken (x).xml").unwrap();
  assert!(matches!(
    failed.status,
    FileStatus::Failed { last_stage: FileStage::Downloaded, .. }
  ));
  assert_eq!(std::fs::read(root.path().join("Broken (x).xml")).unwrap(), broken);
  assert_eq!(store.tags(1), Some(TagSet::single("Asthma")));

  let leftovers: Vec<String> = std::fs::read_dir(root.path())
    .unwrap()
    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
    .filter(|name| name.starts_with(COPY_PREFIX))
    .collect();
  assert!(leftovers.is_empty(), "{leftovers:?}");
}

#[tokio::test]
async fn non_xml_file_is_left_on_the_drop() {
  let h = Harness::new();
  h.drop.put("Broken (x).xml", Bytes::from_static(b"not xml at all"));

  let report = h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();
  assert!(report.files[0].is_failed());
  assert!(h.drop.has("Broken (x).xml"));
  assert!(h.work_dir_is_empty());
}

#[tokio::test]
async fn invalid_identifier_fails_the_whole_file() {
  let h = Harness::new();
  h.drop.put(
    "Asthma (x).xml",
    Bytes::from_static(
      b"<ProQuestExport><Documents>\
        <Literature><DocInfo><ProquestID>1</ProquestID></DocInfo></Literature>\
        <Literature><DocInfo><ProquestID>abc</ProquestID></DocInfo></Literature>\
        </Documents></ProQuestExport>",
    ),
  );

  let report = h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();
  assert!(report.files[0].is_failed());
  assert_eq!(h.store.len(), 0);
  assert_eq!(h.store.upserts.load(Ordering::SeqCst), 0);
  let FileStatus::Failed { reason, .. } = &report.files[0].status else {
    panic!("expected a failed file, got {:?}", report.files[0].status);
  };
  assert!(reason.starts_with("export rejected"), "{reason}");
}

#[tokio::test]
async fn download_failure_skips_to_next_file() {
  let h = Harness::new();
  h.drop.put("a (x).xml", export(None, &[1]));
  h.drop.put("b (x).xml", export(None, &[2]));
  h.drop.fail_download.lock().unwrap().insert("a (x).xml".into());

  let report = h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();
  assert!(matches!(
    report.files[0].status,
    FileStatus::Failed { last_stage: FileStage::Listed, .. }
  ));
  assert_eq!(report.files_failed(), 1);
  assert_eq!(h.store.tags(2), Some(TagSet::single("b")));
}

#[tokio::test]
async fn abort_policy_stops_the_run() {
  let h = Harness::new();
  h.drop.put("a (x).xml", Bytes::from_static(b""));
  h.drop.put("b (x).xml", export(None, &[2]));

  let config = PipelineConfig {
    on_file_error: FailurePolicy::Abort,
    ..h.config(SubmissionMode::Strict)
  };
  let err = h.pipeline(config).run().await.unwrap_err();

  match err {
    Error::Aborted { file, report, .. } => {
      assert_eq!(file, "a (x).xml");
      assert_eq!(report.files.len(), 1);
    }
    other => panic!("expected abort, got {other:?}"),
  }
  assert!(h.store.tags(2).is_none());
  assert!(h.drop.has("b (x).xml"));
}

#[tokio::test]
async fn record_failures_still_archive() {
  let h = Harness::new();
  h.drop.put("a (x).xml", export(None, &[1, 2, 3]));
  h.store.reject_bulk.lock().unwrap().insert(RecordId(2));

  let report = h.pipeline(h.config(SubmissionMode::Batched)).run().await.unwrap();
  let file = &report.files[0];
  assert_eq!((file.succeeded, file.failed), (2, 1));
  assert_eq!(file.failed_ids(), [RecordId(2)]);
  assert!(matches!(file.status, FileStatus::Archived { .. }));
  assert_eq!(report.failed_records().count(), 1);
}

#[tokio::test]
async fn all_failed_file_is_archived_by_default() {
  let h = Harness::new();
  h.drop.put("a (x).xml", export(None, &[1]));
  h.store.fail_request.store(true, Ordering::SeqCst);

  let report = h.pipeline(h.config(SubmissionMode::Batched)).run().await.unwrap();
  assert!(matches!(report.files[0].status, FileStatus::Archived { .. }));
}

#[tokio::test]
async fn all_failed_file_can_be_retained() {
  let h = Harness::new();
  h.drop.put("a (x).xml", export(None, &[1]));
  h.store.fail_request.store(true, Ordering::SeqCst);

  let config = PipelineConfig {
    archive_when_all_failed: false,
    ..h.config(SubmissionMode::Batched)
  };
  let report = h.pipeline(config).run().await.unwrap();
  assert!(matches!(report.files[0].status, FileStatus::Retained { .. }));
  assert!(h.drop.has("a (x).xml"));
}

#[tokio::test]
async fn archive_failure_keeps_index_writes() {
  let h = Harness::new();
  h.drop.put("a (x).xml", export(None, &[1]));
  h.drop.fail_rename.store(true, Ordering::SeqCst);

  let report = h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();
  let file = &report.files[0];
  assert!(matches!(&file.status, FileStatus::ArchiveFailed { reason, .. } if reason.contains("read-only")));
  assert_eq!(file.succeeded, 1);
  assert_eq!(h.store.tags(1), Some(TagSet::single("a")));
  assert!(h.drop.has("a (x).xml"));
}

#[tokio::test]
async fn listing_failure_fails_the_run() {
  let h = Harness::new();
  h.drop.fail_list.store(true, Ordering::SeqCst);

  let err = h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap_err();
  assert!(matches!(err, Error::Listing { .. }));
}

#[tokio::test]
async fn reimport_under_another_alert_accumulates() {
  let h = Harness::new();
  h.drop.put("Asthma (x).xml", export(None, &[5]));
  h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();

  h.drop.put("Allergy (x).xml", export(None, &[5]));
  let report = h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();

  assert_eq!(report.files_found, 1);
  assert_eq!(h.store.tags(5), Some(TagSet::from_iter(["Allergy", "Asthma"])));
}

#[tokio::test]
async fn empty_drop_is_an_empty_run() {
  let h = Harness::new();
  let report = h.pipeline(h.config(SubmissionMode::Strict)).run().await.unwrap();
  assert_eq!(report.files_found, 0);
  assert!(report.files.is_empty());
}
