use std::fmt;

use anyhow::{Result, bail};
use loadgen_store::MAX_BATCH_WRITES;

/// Upper bound on workers per run. Every worker is an OS thread.
pub const MAX_CONCURRENCY: u64 = 4096;

/// How workers hand documents to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Stage records into atomic batches of up to `batch_size`.
    #[default]
    Batched,
    /// One `add` per record, no batch metadata.
    Single,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Batched => f.write_str("batched"),
            WriteMode::Single => f.write_str("single"),
        }
    }
}

/// Target collections of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    /// Receives the generated records.
    pub records: String,
    /// Receives one `BatchInfo` per batch commit attempt.
    pub batches: String,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Documents to write across all workers.
    pub total: u64,
    /// Number of workers.
    pub concurrency: u64,
    /// Payload length of every record.
    pub num_bytes: usize,
    /// Records per batch; capped by the store's batch limit.
    pub batch_size: usize,
    pub mode: WriteMode,
    pub collections: Collections,
}

impl RunConfig {
    pub fn new(total: u64, concurrency: u64, num_bytes: usize, collections: Collections) -> Self {
        Self {
            total,
            concurrency,
            num_bytes,
            batch_size: MAX_BATCH_WRITES,
            mode: WriteMode::Batched,
            collections,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            bail!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.concurrency
            );
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_WRITES {
            bail!(
                "batch size must be between 1 and {MAX_BATCH_WRITES}, got {}",
                self.batch_size
            );
        }
        if self.collections.records.is_empty() || self.collections.batches.is_empty() {
            bail!("collection names must not be empty");
        }
        if self.collections.records == self.collections.batches {
            bail!(
                "record and batch collections must differ, both are {:?}",
                self.collections.records
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RunConfig {
        RunConfig::new(
            10,
            2,
            50,
            Collections {
                records: "perf-test4".into(),
                batches: "perf-test-batches4".into(),
            },
        )
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = config();
        assert_eq!(cfg.batch_size, MAX_BATCH_WRITES);
        assert_eq!(cfg.mode, WriteMode::Batched);
        cfg.validate().expect("default config is valid");
    }

    #[test]
    fn concurrency_limit_is_inclusive() {
        let mut cfg = config();
        cfg.concurrency = MAX_CONCURRENCY;
        cfg.validate().expect("limit itself is valid");
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let cases: &[(&str, fn(&mut RunConfig))] = &[
            ("zero concurrency", |c: &mut RunConfig| c.concurrency = 0),
            ("concurrency above limit", |c: &mut RunConfig| {
                c.concurrency = MAX_CONCURRENCY + 1
            }),
            ("zero batch size", |c: &mut RunConfig| c.batch_size = 0),
            ("batch above limit", |c: &mut RunConfig| {
                c.batch_size = MAX_BATCH_WRITES + 1
            }),
            ("empty records", |c: &mut RunConfig| c.collections.records.clear()),
            ("same collection", |c: &mut RunConfig| {
                c.collections.batches = c.collections.records.clone()
            }),
        ];

        for (name, mutate) in cases {
            let mut cfg = config();
            mutate(&mut cfg);
            assert!(cfg.validate().is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn mode_display_matches_cli_values() {
        assert_eq!(WriteMode::Batched.to_string(), "batched");
        assert_eq!(WriteMode::Single.to_string(), "single");
    }
}
