use loadgen_protocol::TestRecord;
use loadgen_store::DocumentStore;
use log::{debug, error};

use crate::{config::Collections, ids::RunIds, report::WorkerReport};

/// Batch id carried by records written outside any batch.
pub const UNBATCHED: u64 = 0;

/// Per-worker loop that writes one document per round-trip.
pub struct SingleWriter<'a> {
    worker: usize,
    store: &'a dyn DocumentStore,
    ids: &'a RunIds,
    collections: &'a Collections,
    num_bytes: usize,
}

impl<'a> SingleWriter<'a> {
    pub fn new(
        worker: usize,
        store: &'a dyn DocumentStore,
        ids: &'a RunIds,
        collections: &'a Collections,
        num_bytes: usize,
    ) -> Self {
        Self {
            worker,
            store,
            ids,
            collections,
            num_bytes,
        }
    }

    pub fn run(&self, quota: u64) -> WorkerReport {
        let mut report = WorkerReport::new(self.worker, quota);

        for _ in 0..quota {
            let seq = self.ids.sequence.next();
            let record = TestRecord::new(self.num_bytes, seq, UNBATCHED);
            report.records_created += 1;

            match self.store.add(&self.collections.records, record.into()) {
                Ok(_) => report.records_committed += 1,
                Err(e) => {
                    report.adds_failed += 1;
                    error!(
                        "[worker {}] adding record {seq} failed: {e:#}",
                        self.worker
                    );
                }
            }
        }

        debug!(
            "[worker {}] done: {} of {} records written",
            self.worker, report.records_committed, report.records_created
        );
        report
    }
}
