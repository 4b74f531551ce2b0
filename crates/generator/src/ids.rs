use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Run-wide record sequence. The first id handed out is 1.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    issued: AtomicU64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

/// Batch ids: `seed`, `seed + 1`, ... in the order batches are opened.
///
/// Seeded with the run's start time in nanoseconds so ids from separate
/// runs land far apart.
#[derive(Debug)]
pub struct BatchIdSource {
    seed: u64,
    opened: AtomicU64,
}

impl BatchIdSource {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1);
        Self::with_seed(nanos.max(1))
    }

    /// `seed` must be non-zero; 0 is the batch id of unbatched records.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: seed.max(1),
            opened: AtomicU64::new(0),
        }
    }

    pub fn next(&self) -> u64 {
        self.seed
            .wrapping_add(self.opened.fetch_add(1, Ordering::Relaxed))
    }

    /// Batches opened so far.
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }
}

impl Default for BatchIdSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The only state shared between workers.
#[derive(Debug, Default)]
pub struct RunIds {
    pub sequence: SequenceCounter,
    pub batches: BatchIdSource,
}

impl RunIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_seed(seed: u64) -> Self {
        Self {
            sequence: SequenceCounter::new(),
            batches: BatchIdSource::with_seed(seed),
        }
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
