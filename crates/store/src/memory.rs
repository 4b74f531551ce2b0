use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow, bail};
use hashbrown::{HashMap, HashSet};
use loadgen_protocol::Document;

use crate::{
    DocumentStore,
    batch::{CommitReceipt, DocumentId, MAX_BATCH_WRITES, StagedWrite, WriteBatch},
    ids::DocumentIdGenerator,
};

/// One call observed by a [`MemoryStore`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Commit {
        writes: usize,
        /// Batch id of the first staged document, if any.
        batch_id: Option<u64>,
        ok: bool,
    },
    Add {
        collection: String,
        batch_id: u64,
        ok: bool,
    },
}

#[derive(Default)]
struct Collection {
    /// Empty unless the store retains documents.
    docs: Vec<(DocumentId, Document)>,
    ids: HashSet<DocumentId>,
}

impl Collection {
    fn insert(&mut self, id: DocumentId, document: Document, retain: bool) {
        if retain {
            self.docs.push((id.clone(), document));
        }
        self.ids.insert(id);
    }
}

#[derive(Default)]
struct MemoryState {
    retain_documents: bool,
    collections: HashMap<String, Collection>,
    ops: Vec<StoreOp>,
    commit_attempts: u64,
}

/// In-process document store for dry runs and tests.
///
/// Failures can be injected per commit attempt (1-based, counted across all
/// callers) or for every add into a collection.
///
/// A store built with [`MemoryStore::new`] keeps every document. One built
/// with [`MemoryStore::ids_only`] keeps only document ids, so memory use of a
/// dry run does not depend on the payload size.
pub struct MemoryStore {
    ids: DocumentIdGenerator,
    state: Mutex<MemoryState>,
    failing_commits: HashSet<u64>,
    failing_collections: HashSet<String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_retention(true)
    }

    /// Store that counts documents but drops their contents.
    pub fn ids_only() -> Self {
        Self::with_retention(false)
    }

    fn with_retention(retain_documents: bool) -> Self {
        Self {
            ids: DocumentIdGenerator::default(),
            state: Mutex::new(MemoryState {
                retain_documents,
                ..MemoryState::default()
            }),
            failing_commits: HashSet::new(),
            failing_collections: HashSet::new(),
        }
    }

    /// Make the given commit attempts fail, e.g. `[1]` fails the first commit.
    pub fn fail_commit_attempts(mut self, attempts: impl IntoIterator<Item = u64>) -> Self {
        self.failing_commits.extend(attempts);
        self
    }

    /// Make every `add` into `collection` fail.
    pub fn fail_adds_to(mut self, collection: &str) -> Self {
        self.failing_collections.insert(collection.to_owned());
        self
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .map(|state| {
                state
                    .collections
                    .get(collection)
                    .map(|c| c.docs.iter().map(|(_, d)| d.clone()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.lock()
            .map(|state| {
                state
                    .collections
                    .get(collection)
                    .map_or(0, |c| c.ids.len())
            })
            .unwrap_or(0)
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.lock().map(|state| state.ops.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl MemoryState {
    fn apply_commit(&mut self, batch: WriteBatch, inject_failure: bool) -> Result<()> {
        if inject_failure {
            bail!("injected commit failure");
        }
        if batch.len() > MAX_BATCH_WRITES {
            bail!(
                "batch of {} writes exceeds the limit of {MAX_BATCH_WRITES}",
                batch.len()
            );
        }

        self.check_creates(batch.writes())?;

        let retain = self.retain_documents;
        for w in batch.into_writes() {
            self.collections
                .entry(w.collection)
                .or_default()
                .insert(w.id, w.document, retain);
        }
        Ok(())
    }

    fn check_creates(&self, writes: &[StagedWrite]) -> Result<()> {
        let mut seen: HashSet<(&str, &DocumentId)> = HashSet::with_capacity(writes.len());
        for w in writes {
            let exists = self
                .collections
                .get(w.collection.as_str())
                .is_some_and(|c| c.ids.contains(&w.id));
            if exists || !seen.insert((w.collection.as_str(), &w.id)) {
                bail!("document {}/{} already exists", w.collection, w.id);
            }
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn new_document_id(&self, _collection: &str) -> DocumentId {
        self.ids.next_id()
    }

    fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt> {
        let writes = batch.len();
        let batch_id = batch.writes().first().map(|w| w.document.batch_id());

        let mut state = self.lock()?;
        state.commit_attempts += 1;
        let inject = self.failing_commits.contains(&state.commit_attempts);

        let result = state.apply_commit(batch, inject);
        state.ops.push(StoreOp::Commit {
            writes,
            batch_id,
            ok: result.is_ok(),
        });

        result.map(|()| CommitReceipt::now(writes))
    }

    fn add(&self, collection: &str, document: Document) -> Result<DocumentId> {
        let id = self.new_document_id(collection);
        let batch_id = document.batch_id();

        let mut state = self.lock()?;
        let ok = !self.failing_collections.contains(collection);
        state.ops.push(StoreOp::Add {
            collection: collection.to_owned(),
            batch_id,
            ok,
        });
        if !ok {
            bail!("injected add failure for collection {collection}");
        }

        let retain = state.retain_documents;
        state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), document, retain);
        Ok(id)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
