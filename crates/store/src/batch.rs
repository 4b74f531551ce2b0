use std::fmt;

use chrono::{DateTime, Utc};
use loadgen_protocol::Document;
use serde::{Deserialize, Serialize};

/// Most writes a single batch may carry.
pub const MAX_BATCH_WRITES: usize = 500;

/// Opaque document identity within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A create staged in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedWrite {
    pub collection: String,
    pub id: DocumentId,
    pub document: Document,
}

/// Creates collected client-side until the batch is committed.
#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: Vec<StagedWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `document` for creation under `id`. Fails at commit if `id` exists.
    pub fn create(&mut self, collection: &str, id: DocumentId, document: Document) {
        self.writes.push(StagedWrite {
            collection: collection.to_owned(),
            id,
            document,
        });
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[StagedWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<StagedWrite> {
        self.writes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    pub writes: usize,
    pub commit_time: DateTime<Utc>,
}

impl CommitReceipt {
    pub fn now(writes: usize) -> Self {
        Self {
            writes,
            commit_time: Utc::now(),
        }
    }
}
