use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use serde_json::Value;
use tokio::sync::broadcast;

use crate::confirm::Confirm;
use crate::credentials::GitHubCredentials;
use crate::event::AdminEvent;
use crate::images::{FileHost, FileHostError, PutFile, StoredFile};
use crate::lock;
use crate::product::Product;
use crate::store::{Direction, Document, DocumentStore, PRODUCTS, StoreError, StoredDocument};

/// In-memory document store for testing.
///
/// Every call yields to the runtime once before touching data, so
/// operations joined on one task interleave the way network calls would.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Document>>>,
    fail_next: Mutex<Option<String>>,
    failing_docs: Mutex<HashMap<(String, String), String>>,
    calls: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_products(&self, products: &[Product]) {
        let mut collections = lock(&self.collections);
        let coll = collections.entry(PRODUCTS.to_owned()).or_default();
        for p in products {
            coll.insert(p.id.doc_id(), p.to_document());
        }
    }

    /// Insert a document as-is, bypassing any model encoding.
    pub fn insert_raw(&self, collection: &str, id: &str, fields: Value) {
        let fields = match fields {
            Value::Object(map) => map,
            other => panic!("document must be an object, got {other}"),
        };
        lock(&self.collections)
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), fields);
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<Document> {
        lock(&self.collections)
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
    }

    pub fn contains(&self, collection: &str, id: &str) -> bool {
        self.document(collection, id).is_some()
    }

    /// The stored product with this id, decoded.
    pub fn product(&self, id: u64) -> Option<Product> {
        let doc_id = id.to_string();
        let doc = self.document(PRODUCTS, &doc_id)?;
        Product::from_document(&doc_id, doc).ok()
    }

    /// Make the next call of any kind fail with a network error.
    pub fn fail_next(&self, message: &str) {
        *lock(&self.fail_next) = Some(message.to_owned());
    }

    /// Make every write or delete of one document fail.
    pub fn fail_writes_to(&self, collection: &str, id: &str, message: &str) {
        lock(&self.failing_docs).insert(
            (collection.to_owned(), id.to_owned()),
            message.to_owned(),
        );
    }

    /// Number of calls of any kind so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of attempted sets, updates and deletes, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    async fn enter(&self) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        match lock(&self.fail_next).take() {
            Some(msg) => Err(StoreError::Network(msg)),
            None => Ok(()),
        }
    }

    async fn enter_write(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        self.enter().await?;
        match lock(&self.failing_docs).get(&(collection.to_owned(), id.to_owned())) {
            Some(msg) => Err(StoreError::Remote(msg.clone())),
            None => Ok(()),
        }
    }

    fn snapshot(&self, collection: &str) -> Vec<StoredDocument> {
        lock(&self.collections)
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, fields)| StoredDocument::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        self.enter().await?;
        Ok(self.snapshot(collection))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.enter().await?;
        Ok(self.document(collection, id))
    }

    async fn set(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        self.enter_write(collection, id).await?;
        lock(&self.collections)
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), fields);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.enter_write(collection, id).await?;
        let mut collections = lock(&self.collections);
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        doc.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.enter_write(collection, id).await?;
        if let Some(c) = lock(&self.collections).get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn query_ordered(
        &self,
        collection: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.enter().await?;
        let mut docs = self.snapshot(collection);
        docs.retain(|d| d.fields.contains_key(order_by));
        docs.sort_by(|a, b| {
            let ord = compare_values(&a.fields[order_by], &b.fields[order_by]);
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
        Ok(docs)
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// A call observed by [`FakeFileHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    BranchHead,
    BlobSha(String),
    PutFile(String),
    CheckAccess,
}

/// In-memory file host that enforces the prior-hash rule on overwrite.
pub struct FakeFileHost {
    branch: String,
    stale_probe: bool,
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
    calls: Mutex<Vec<HostCall>>,
    puts: Mutex<Vec<PutFile>>,
    revision: AtomicUsize,
}

impl Default for FakeFileHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeFileHost {
    pub fn new() -> Self {
        Self {
            branch: crate::credentials::DEFAULT_BRANCH.to_owned(),
            stale_probe: false,
            blobs: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            puts: Mutex::new(Vec::new()),
            revision: AtomicUsize::new(0),
        }
    }

    /// The only branch that exists on this host.
    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_owned();
        self
    }

    /// Probes report an outdated hash for existing blobs.
    pub fn with_stale_probe(mut self) -> Self {
        self.stale_probe = true;
        self
    }

    pub fn insert_blob(&self, path: &str, content: &[u8]) {
        let sha = self.next_sha();
        lock(&self.blobs).insert(path.to_owned(), (content.to_vec(), sha));
    }

    pub fn sha_of(&self, path: &str) -> Option<String> {
        lock(&self.blobs).get(path).map(|(_, sha)| sha.clone())
    }

    pub fn content_of(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.blobs).get(path).map(|(content, _)| content.clone())
    }

    pub fn calls(&self) -> Vec<HostCall> {
        lock(&self.calls).clone()
    }

    pub fn puts(&self) -> Vec<PutFile> {
        lock(&self.puts).clone()
    }

    fn record(&self, call: HostCall) {
        lock(&self.calls).push(call);
    }

    fn next_sha(&self) -> String {
        let n = self.revision.fetch_add(1, AtomicOrdering::SeqCst);
        format!("sha-{n:04}")
    }
}

#[async_trait::async_trait]
impl FileHost for FakeFileHost {
    async fn branch_head(&self, creds: &GitHubCredentials) -> Result<String, FileHostError> {
        self.record(HostCall::BranchHead);
        if creds.branch != self.branch {
            return Err(FileHostError::BranchNotFound(creds.branch.clone()));
        }
        Ok("head-commit".to_owned())
    }

    async fn blob_sha(
        &self,
        _creds: &GitHubCredentials,
        path: &str,
    ) -> Result<Option<String>, FileHostError> {
        self.record(HostCall::BlobSha(path.to_owned()));
        let sha = self.sha_of(path);
        if self.stale_probe && sha.is_some() {
            return Ok(Some("sha-stale".to_owned()));
        }
        Ok(sha)
    }

    async fn put_file(
        &self,
        _creds: &GitHubCredentials,
        file: PutFile,
    ) -> Result<StoredFile, FileHostError> {
        self.record(HostCall::PutFile(file.path.clone()));
        lock(&self.puts).push(file.clone());

        let existing = self.sha_of(&file.path);
        match (&existing, &file.prior_sha) {
            (None, None) => {}
            (Some(current), Some(given)) if current == given => {}
            (_, Some(given)) => {
                return Err(FileHostError::Conflict(format!(
                    "{} does not match {given}",
                    file.path
                )));
            }
            (Some(_), None) => {
                return Err(FileHostError::Conflict(
                    "Invalid request.\n\n\"sha\" wasn't supplied.".to_owned(),
                ));
            }
        }

        let sha = self.next_sha();
        lock(&self.blobs).insert(file.path.clone(), (file.content, sha.clone()));
        Ok(StoredFile {
            path: file.path,
            sha,
            created: existing.is_none(),
        })
    }

    async fn check_access(&self, _creds: &GitHubCredentials) -> Result<(), FileHostError> {
        self.record(HostCall::CheckAccess);
        Ok(())
    }
}

/// Answers confirmations from a script and records the questions asked.
/// Answers `false` once the script runs out.
#[derive(Default)]
pub struct ScriptedConfirm {
    answers: Mutex<VecDeque<bool>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        lock(&self.questions).clone()
    }
}

#[async_trait::async_trait]
impl Confirm for ScriptedConfirm {
    async fn confirm(&self, question: &str) -> bool {
        lock(&self.questions).push(question.to_owned());
        lock(&self.answers).pop_front().unwrap_or(false)
    }
}

/// Collect every event currently buffered on a receiver.
pub fn drain_events(rx: &mut broadcast::Receiver<AdminEvent>) -> Vec<AdminEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}
