//! One-JSON-document-per-record store with an in-memory mirror
//!
//! A store moves through `Uninitialized -> Initializing -> Ready` exactly
//! once. The first call to any operation ensures the directory exists and
//! loads every `*.json` document into the mirror; concurrent first callers
//! wait on the same load instead of starting their own. Documents that cannot
//! be read, parsed or validated are skipped and reported in the
//! [`LoadReport`].
//!
//! Mutations are serialized through a write gate and are write-ahead: the
//! document is written (or removed) first and the mirror is only touched once
//! the filesystem call succeeded, so the two never disagree.

use crate::app_log;
use crate::error::{ClassroomError, ClassroomResult};
use crate::logger::LogLevel;
use crate::schema::ValidationErrors;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use tokio::fs;
use tokio::sync::{Mutex, OnceCell};
use uuid::Uuid;

const DOCUMENT_EXTENSION: &str = "json";
const PENDING_EXTENSION: &str = "json.tmp";

/// A record that can live in a [`DocumentStore`]
pub trait Document: Clone + Serialize + Send + Sync + 'static {
    /// Collection name used in logs and errors
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    /// Re-validate a document read back from disk
    fn from_document(raw: &Value) -> Result<Self, ValidationErrors>;
}

/// Lifecycle of a store instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Initializing,
    Ready,
}

/// A document left out of the mirror during load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of the initial directory scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedDocument>,
}

pub type Mirror<D> = HashMap<Uuid, D>;

pub struct DocumentStore<D: Document> {
    dir: PathBuf,
    mirror: RwLock<Mirror<D>>,
    init: OnceCell<LoadReport>,
    loading: AtomicBool,
    load_count: AtomicUsize,
    write_gate: Mutex<()>,
}

impl<D: Document> DocumentStore<D> {
    /// Create a store over `dir`; nothing touches the filesystem until first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            mirror: RwLock::new(HashMap::new()),
            init: OnceCell::new(),
            loading: AtomicBool::new(false),
            load_count: AtomicUsize::new(0),
            write_gate: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state(&self) -> StoreState {
        if self.init.initialized() {
            StoreState::Ready
        } else if self.loading.load(Ordering::SeqCst) {
            StoreState::Initializing
        } else {
            StoreState::Uninitialized
        }
    }

    /// Number of directory scans performed so far
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Report of the initial load, once it has happened
    pub fn load_report(&self) -> Option<&LoadReport> {
        self.init.get()
    }

    /// Path of the document backing `id`
    pub fn document_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.{}", id, DOCUMENT_EXTENSION))
    }

    /// Load the directory if that has not happened yet.
    pub async fn ensure_ready(&self) -> ClassroomResult<&LoadReport> {
        self.init.get_or_try_init(|| self.load()).await
    }

    pub async fn get(&self, id: Uuid) -> ClassroomResult<Option<D>> {
        self.ensure_ready().await?;
        self.with_mirror(|mirror| mirror.get(&id).cloned())
    }

    /// First match in `created_at` order
    pub async fn find<P>(&self, predicate: P) -> ClassroomResult<Option<D>>
    where
        P: Fn(&D) -> bool + Send,
    {
        Ok(self.select(predicate).await?.into_iter().next())
    }

    /// All matches in `created_at` order
    pub async fn select<P>(&self, predicate: P) -> ClassroomResult<Vec<D>>
    where
        P: Fn(&D) -> bool + Send,
    {
        self.ensure_ready().await?;
        let matches = self.with_mirror(|mirror| {
            mirror
                .values()
                .filter(|doc| predicate(doc))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        Ok(sorted(matches))
    }

    pub async fn all(&self) -> ClassroomResult<Vec<D>> {
        self.select(|_| true).await
    }

    pub async fn len(&self) -> ClassroomResult<usize> {
        self.ensure_ready().await?;
        self.with_mirror(|mirror| mirror.len())
    }

    /// Build a record against the current mirror and persist it.
    ///
    /// `build` runs under the write gate, so checks it makes against the
    /// mirror (uniqueness, existence) still hold when the write lands.
    pub async fn commit<F>(&self, build: F) -> ClassroomResult<D>
    where
        F: FnOnce(&Mirror<D>) -> ClassroomResult<D> + Send,
    {
        self.ensure_ready().await?;
        let _gate = self.write_gate.lock().await;

        let doc = self.with_mirror(build)??;
        self.persist(&doc).await?;
        self.with_mirror_mut(|mirror| {
            mirror.insert(doc.id(), doc.clone());
        })?;

        app_log!(
            LogLevel::Debug,
            "Saved {} document {}",
            D::COLLECTION,
            doc.id()
        );
        Ok(doc)
    }

    /// Remove a record; `false` if it was not in the mirror.
    ///
    /// # Errors
    /// `StorageDeleteFailed` if the document could not be removed. The mirror
    /// still holds the record in that case.
    pub async fn remove(&self, id: Uuid) -> ClassroomResult<bool> {
        self.ensure_ready().await?;
        let _gate = self.write_gate.lock().await;

        if !self.with_mirror(|mirror| mirror.contains_key(&id))? {
            return Ok(false);
        }

        let path = self.document_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                app_log!(
                    LogLevel::Warn,
                    "Document {} was already missing on delete",
                    path.display()
                );
            }
            Err(e) => {
                return Err(ClassroomError::StorageDeleteFailed(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        }

        let removed = self.with_mirror_mut(|mirror| mirror.remove(&id).is_some())?;
        app_log!(LogLevel::Debug, "Deleted {} document {}", D::COLLECTION, id);
        Ok(removed)
    }

    fn with_mirror<R>(&self, f: impl FnOnce(&Mirror<D>) -> R) -> ClassroomResult<R> {
        let mirror = self.mirror.read()?;
        Ok(f(&mirror))
    }

    fn with_mirror_mut<R>(&self, f: impl FnOnce(&mut Mirror<D>) -> R) -> ClassroomResult<R> {
        let mut mirror = self.mirror.write()?;
        Ok(f(&mut mirror))
    }

    /// Write to a pending file, then rename it over the document.
    async fn persist(&self, doc: &D) -> ClassroomResult<()> {
        let path = self.document_path(doc.id());
        let pending = path.with_extension(PENDING_EXTENSION);
        let bytes = serde_json::to_vec_pretty(doc)?;

        if let Err(e) = fs::write(&pending, &bytes).await {
            return Err(ClassroomError::StorageSaveFailed(format!(
                "{}: {}",
                pending.display(),
                e
            )));
        }

        if let Err(e) = fs::rename(&pending, &path).await {
            let _ = fs::remove_file(&pending).await;
            return Err(ClassroomError::StorageSaveFailed(format!(
                "{}: {}",
                path.display(),
                e
            )));
        }

        Ok(())
    }

    async fn load(&self) -> ClassroomResult<LoadReport> {
        self.loading.store(true, Ordering::SeqCst);
        let result = self.scan().await;
        self.loading.store(false, Ordering::SeqCst);
        result
    }

    async fn scan(&self) -> ClassroomResult<LoadReport> {
        self.load_count.fetch_add(1, Ordering::SeqCst);

        fs::create_dir_all(&self.dir).await.map_err(|e| {
            ClassroomError::DirectoryCreationFailed(format!("{}: {}", self.dir.display(), e))
        })?;

        let mut report = LoadReport::default();
        let mut loaded: Mirror<D> = HashMap::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_document_path(&path) {
                continue;
            }

            match fs::metadata(&path).await {
                Ok(metadata) if !metadata.is_file() => continue,
                Ok(_) => {}
                Err(e) => {
                    skip::<D>(&mut report, path, format!("metadata unavailable: {}", e));
                    continue;
                }
            }

            match read_document::<D>(&path).await {
                Ok(doc) => {
                    loaded.insert(doc.id(), doc);
                    report.loaded += 1;
                }
                Err(reason) => skip::<D>(&mut report, path, reason),
            }
        }

        self.with_mirror_mut(|mirror| mirror.extend(loaded))?;

        app_log!(
            LogLevel::Info,
            "Loaded {} {} document(s) from {} ({} skipped)",
            report.loaded,
            D::COLLECTION,
            self.dir.display(),
            report.skipped.len()
        );
        Ok(report)
    }
}

/// An id not yet used in `mirror`
pub fn fresh_id<D>(mirror: &Mirror<D>) -> Uuid {
    loop {
        let id = Uuid::new_v4();
        if !mirror.contains_key(&id) {
            return id;
        }
    }
}

fn skip<D: Document>(report: &mut LoadReport, path: PathBuf, reason: String) {
    app_log!(
        LogLevel::Warn,
        "Skipping {} document {}: {}",
        D::COLLECTION,
        path.display(),
        reason
    );
    report.skipped.push(SkippedDocument { path, reason });
}

fn is_document_path(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(DOCUMENT_EXTENSION)
}

async fn read_document<D: Document>(path: &Path) -> Result<D, String> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|e| format!("read failed: {}", e))?;
    let raw: Value =
        serde_json::from_str(&contents).map_err(|e| format!("invalid JSON: {}", e))?;
    let doc = D::from_document(&raw).map_err(|e| format!("invalid record: {}", e))?;

    let stem = path.file_stem().and_then(|stem| stem.to_str());
    if stem != Some(doc.id().to_string().as_str()) {
        return Err(format!("file name does not match id {}", doc.id()));
    }

    Ok(doc)
}

fn sorted<D: Document>(mut docs: Vec<D>) -> Vec<D> {
    docs.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        id: Uuid,
        text: String,
        created_at: DateTime<Utc>,
    }

    impl Document for Note {
        const COLLECTION: &'static str = "notes";

        fn id(&self) -> Uuid {
            self.id
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn from_document(raw: &Value) -> Result<Self, ValidationErrors> {
            let mut reader = crate::schema::FieldReader::new(raw);
            let id = reader.required_uuid("id");
            let text = reader.required_string("text");
            let created_at = reader.required_timestamp("createdAt");
            let note = match (id, text, created_at) {
                (Some(id), Some(text), Some(created_at)) => Some(Note {
                    id,
                    text,
                    created_at,
                }),
                _ => None,
            };
            reader.finish(note, |_, _| {})
        }
    }

    fn note(text: &str) -> Note {
        Note {
            id: Uuid::new_v4(),
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_starts_uninitialized_and_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("notes");
        let store: DocumentStore<Note> = DocumentStore::new(&dir);

        assert_eq!(store.state(), StoreState::Uninitialized);
        assert!(!dir.exists());

        assert!(store.all().await.unwrap().is_empty());
        assert_eq!(store.state(), StoreState::Ready);
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_loads_once_across_reads() {
        let temp = TempDir::new().unwrap();
        let store: DocumentStore<Note> = DocumentStore::new(temp.path());

        store.all().await.unwrap();
        store.get(Uuid::new_v4()).await.unwrap();
        store.len().await.unwrap();

        assert_eq!(store.load_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_share_one_load() {
        let temp = TempDir::new().unwrap();
        let store: Arc<DocumentStore<Note>> = Arc::new(DocumentStore::new(temp.path()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.all().await.map(|docs| docs.len()) })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 0);
        }
        assert_eq!(store.load_count(), 1);
    }

    #[tokio::test]
    async fn test_commit_writes_document_named_by_id() {
        let temp = TempDir::new().unwrap();
        let store: DocumentStore<Note> = DocumentStore::new(temp.path());

        let saved = store.commit(|_| Ok(note("hello"))).await.unwrap();
        let path = store.document_path(saved.id);
        assert!(path.exists());
        assert!(!path.with_extension(PENDING_EXTENSION).exists());

        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["text"], json!("hello"));

        let reopened: DocumentStore<Note> = DocumentStore::new(temp.path());
        assert_eq!(reopened.get(saved.id).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_rejected_commit_leaves_no_trace() {
        let temp = TempDir::new().unwrap();
        let store: DocumentStore<Note> = DocumentStore::new(temp.path());

        let result = store
            .commit(|_| Err(ValidationErrors::root("nope").into()))
            .await;
        assert!(matches!(result, Err(ClassroomError::Validation(_))));
        assert_eq!(store.len().await.unwrap(), 0);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_skips_bad_documents_and_reports_them() {
        let temp = TempDir::new().unwrap();
        let good = note("kept");
        std::fs::write(
            temp.path().join(format!("{}.json", good.id)),
            serde_json::to_string(&good).unwrap(),
        )
        .unwrap();
        std::fs::write(temp.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(
            temp.path().join(format!("{}.json", Uuid::new_v4())),
            json!({ "id": "x", "text": "" }).to_string(),
        )
        .unwrap();
        let misplaced = note("wrong file name");
        std::fs::write(
            temp.path().join(format!("{}.json", Uuid::new_v4())),
            serde_json::to_string(&misplaced).unwrap(),
        )
        .unwrap();
        std::fs::write(temp.path().join("README.txt"), "ignored").unwrap();

        let store: DocumentStore<Note> = DocumentStore::new(temp.path());
        let all = store.all().await.unwrap();

        assert_eq!(all, vec![good]);
        let report = store.load_report().unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped.len(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_link_is_skipped_not_fatal() {
        let temp = TempDir::new().unwrap();
        let good = note("kept");
        std::fs::write(
            temp.path().join(format!("{}.json", good.id)),
            serde_json::to_string(&good).unwrap(),
        )
        .unwrap();
        let dangling = temp.path().join(format!("{}.json", Uuid::new_v4()));
        std::os::unix::fs::symlink(temp.path().join("gone.json"), &dangling).unwrap();

        let store: DocumentStore<Note> = DocumentStore::new(temp.path());
        assert_eq!(store.all().await.unwrap(), vec![good]);

        let report = store.load_report().unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, dangling);
        assert!(report.skipped[0].reason.starts_with("metadata unavailable"));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store: DocumentStore<Note> = DocumentStore::new(temp.path());
        let saved = store.commit(|_| Ok(note("bye"))).await.unwrap();

        assert!(store.remove(saved.id).await.unwrap());
        assert!(!store.remove(saved.id).await.unwrap());
        assert!(!store.document_path(saved.id).exists());
        assert_eq!(store.get(saved.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_directory_error_is_fatal() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("occupied");
        std::fs::write(&file, "not a directory").unwrap();

        let store: DocumentStore<Note> = DocumentStore::new(&file);
        let result = store.all().await;
        assert!(matches!(
            result,
            Err(ClassroomError::DirectoryCreationFailed(_))
        ));
        assert_eq!(store.state(), StoreState::Uninitialized);
    }

    #[tokio::test]
    async fn test_select_orders_by_creation() {
        let temp = TempDir::new().unwrap();
        let store: DocumentStore<Note> = DocumentStore::new(temp.path());

        let mut first = note("first");
        first.created_at = Utc::now() - chrono::TimeDelta::seconds(10);
        let second = note("second");

        store.commit(|_| Ok(second.clone())).await.unwrap();
        store.commit(|_| Ok(first.clone())).await.unwrap();

        let texts: Vec<String> = store.all().await.unwrap().into_iter().map(|n| n.text).collect();
        assert_eq!(texts, vec!["first".to_string(), "second".to_string()]);
    }
}
