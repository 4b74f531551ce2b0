pub mod codec;

use serde::{Deserialize, Serialize};

/// Value stored in `TestRecord::kind` for every generated record.
pub const TEST_RECORD_KIND: &str = "test";

/// Character repeated to build a record payload.
pub const PAYLOAD_FILLER: char = 'a';

/// Synthetic document written into the primary collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(rename = "Type")]
    pub kind: String,

    /// `num_bytes` filler characters.
    #[serde(rename = "Data")]
    pub payload: String,

    /// Run-wide unique, increasing id.
    #[serde(rename = "DataID")]
    pub sequence_id: u64,

    /// Id of the batch this record was staged into (0 for unbatched writes).
    #[serde(rename = "BatchID")]
    pub batch_id: u64,
}

impl TestRecord {
    pub fn new(num_bytes: usize, sequence_id: u64, batch_id: u64) -> Self {
        let mut payload = String::with_capacity(num_bytes);
        payload.extend(std::iter::repeat_n(PAYLOAD_FILLER, num_bytes));

        Self {
            kind: TEST_RECORD_KIND.to_owned(),
            payload,
            sequence_id,
            batch_id,
        }
    }
}

/// Metadata entry written once per batch commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    #[serde(rename = "BatchID")]
    pub batch_id: u64,
}

impl BatchInfo {
    pub fn new(batch_id: u64) -> Self {
        Self { batch_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Document {
    Test(TestRecord),
    BatchInfo(BatchInfo),
}

impl Document {
    pub fn batch_id(&self) -> u64 {
        match self {
            Document::Test(r) => r.batch_id,
            Document::BatchInfo(b) => b.batch_id,
        }
    }

    pub fn as_test(&self) -> Option<&TestRecord> {
        match self {
            Document::Test(r) => Some(r),
            Document::BatchInfo(_) => None,
        }
    }
}

impl From<TestRecord> for Document {
    fn from(r: TestRecord) -> Self {
        Document::Test(r)
    }
}

impl From<BatchInfo> for Document {
    fn from(b: BatchInfo) -> Self {
        Document::BatchInfo(b)
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
