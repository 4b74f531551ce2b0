use loadgen_protocol::{BatchInfo, TestRecord};
use loadgen_store::{DocumentStore, MAX_BATCH_WRITES, WriteBatch};
use log::{debug, error, trace};

use crate::{config::Collections, ids::RunIds, report::WorkerReport};

/// Batch currently being filled, tagged with the id its records carry.
struct OpenBatch {
    id: u64,
    batch: WriteBatch,
}

/// Per-worker loop that stages records into bounded batches.
///
/// A batch is committed as soon as it holds `batch_size` records, and once
/// more for whatever is left when the quota runs out. Every commit attempt
/// is followed by exactly one `BatchInfo` write, whether or not the commit
/// went through. Failures are logged and counted, never retried.
pub struct BatchAccumulator<'a> {
    worker: usize,
    store: &'a dyn DocumentStore,
    ids: &'a RunIds,
    collections: &'a Collections,
    num_bytes: usize,
    batch_size: usize,
}

impl<'a> BatchAccumulator<'a> {
    pub fn new(
        worker: usize,
        store: &'a dyn DocumentStore,
        ids: &'a RunIds,
        collections: &'a Collections,
        num_bytes: usize,
        batch_size: usize,
    ) -> Self {
        Self {
            worker,
            store,
            ids,
            collections,
            num_bytes,
            batch_size: batch_size.clamp(1, MAX_BATCH_WRITES),
        }
    }

    pub fn run(&self, quota: u64) -> WorkerReport {
        let mut report = WorkerReport::new(self.worker, quota);
        if quota == 0 {
            debug!("[worker {}] empty quota", self.worker);
            return report;
        }

        let mut open = self.open_batch();
        for _ in 0..quota {
            let record = TestRecord::new(self.num_bytes, self.ids.sequence.next(), open.id);
            let doc_id = self.store.new_document_id(&self.collections.records);
            open.batch
                .create(&self.collections.records, doc_id, record.into());
            report.records_created += 1;

            if open.batch.len() >= self.batch_size {
                self.flush(open, &mut report);
                open = self.open_batch();
            }
        }

        // Final partial batch.
        if !open.batch.is_empty() {
            self.flush(open, &mut report);
        }

        debug!(
            "[worker {}] done: {} created, {} committed in {} batches, {} failed commits",
            self.worker,
            report.records_created,
            report.records_committed,
            report.batches_committed,
            report.commits_failed
        );
        report
    }

    fn open_batch(&self) -> OpenBatch {
        let id = self.ids.batches.next();
        trace!("[worker {}] opened batch {id}", self.worker);
        OpenBatch {
            id,
            batch: WriteBatch::new(),
        }
    }

    fn flush(&self, open: OpenBatch, report: &mut WorkerReport) {
        let staged = open.batch.len() as u64;

        match self.store.commit(open.batch) {
            Ok(receipt) => {
                report.batches_committed += 1;
                report.records_committed += staged;
                trace!(
                    "[worker {}] batch {} committed {} writes at {}",
                    self.worker, open.id, receipt.writes, receipt.commit_time
                );
            }
            Err(e) => {
                report.commits_failed += 1;
                error!(
                    "[worker {}] batch {} commit failed, {staged} records dropped: {e:#}",
                    self.worker, open.id
                );
            }
        }

        match self
            .store
            .add(&self.collections.batches, BatchInfo::new(open.id).into())
        {
            Ok(_) => report.batch_infos_written += 1,
            Err(e) => {
                report.batch_infos_failed += 1;
                error!(
                    "[worker {}] adding batch info for batch {} failed: {e:#}",
                    self.worker, open.id
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "accumulator_tests.rs"]
mod tests;
