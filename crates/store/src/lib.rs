mod batch;
mod connect;
mod credentials;
mod ids;
mod local;
mod memory;

pub use batch::{CommitReceipt, DocumentId, MAX_BATCH_WRITES, StagedWrite, WriteBatch};
pub use connect::{StoreBackend, connect};
pub use credentials::Credentials;
pub use local::{LocalStore, StoreSummary};
pub use memory::{MemoryStore, StoreOp};

use anyhow::Result;
use loadgen_protocol::Document;

/// Capabilities a document database must offer to the load generator.
///
/// Implementations are shared by every worker thread.
pub trait DocumentStore: Send + Sync {
    /// Reserve a fresh document id in `collection`. Never touches the backend.
    fn new_document_id(&self, collection: &str) -> DocumentId;

    /// Apply every staged create atomically: all become visible or none do.
    fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt>;

    /// Write a single document under a fresh id.
    fn add(&self, collection: &str, document: Document) -> Result<DocumentId>;
}
