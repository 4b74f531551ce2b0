use std::time::Duration;

/// What one worker did with its quota.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub quota: u64,
    /// Records built and handed to the store.
    pub records_created: u64,
    /// Records that are durably in the store.
    pub records_committed: u64,
    pub batches_committed: u64,
    pub commits_failed: u64,
    pub batch_infos_written: u64,
    pub batch_infos_failed: u64,
    /// Failed single-document writes.
    pub adds_failed: u64,
}

impl WorkerReport {
    pub fn new(worker: usize, quota: u64) -> Self {
        Self {
            worker,
            quota,
            ..Self::default()
        }
    }

    pub fn commit_attempts(&self) -> u64 {
        self.batches_committed + self.commits_failed
    }

    pub fn failures(&self) -> u64 {
        self.commits_failed + self.batch_infos_failed + self.adds_failed
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// Quota per worker, in spawn order.
    pub plan: Vec<u64>,
    /// Sorted by worker index.
    pub workers: Vec<WorkerReport>,
    /// From just before the first spawn to just after the join.
    pub elapsed: Duration,
}

impl RunReport {
    fn sum(&self, f: impl Fn(&WorkerReport) -> u64) -> u64 {
        self.workers.iter().map(f).sum()
    }

    pub fn records_created(&self) -> u64 {
        self.sum(|w| w.records_created)
    }

    pub fn records_committed(&self) -> u64 {
        self.sum(|w| w.records_committed)
    }

    pub fn batches_committed(&self) -> u64 {
        self.sum(|w| w.batches_committed)
    }

    pub fn commits_failed(&self) -> u64 {
        self.sum(|w| w.commits_failed)
    }

    pub fn batch_infos_written(&self) -> u64 {
        self.sum(|w| w.batch_infos_written)
    }

    pub fn failures(&self) -> u64 {
        self.sum(WorkerReport::failures)
    }

    /// Workers whose report never arrived (the thread panicked).
    pub fn missing_workers(&self) -> usize {
        self.plan.len() - self.workers.len()
    }
}
