use super::*;
use crate::config::{Collections, MAX_CONCURRENCY};
use hashbrown::{HashMap, HashSet};
use loadgen_protocol::Document;
use loadgen_store::{LocalStore, MemoryStore, StoreOp};

fn config(total: u64, concurrency: u64) -> RunConfig {
    RunConfig::new(
        total,
        concurrency,
        50,
        Collections {
            records: "perf-test4".into(),
            batches: "perf-test-batches4".into(),
        },
    )
}

fn sequence_ids(docs: &[Document]) -> Vec<u64> {
    docs.iter()
        .filter_map(|d| d.as_test().map(|r| r.sequence_id))
        .collect()
}

#[test]
fn single_worker_thousand_records() {
    let store = Arc::new(MemoryStore::new());
    let cfg = config(1000, 1);

    let report = run(store.clone(), &cfg).expect("run");

    assert_eq!(report.plan, vec![1000]);
    assert_eq!(report.batches_committed(), 2);
    assert_eq!(report.batch_infos_written(), 2);
    assert_eq!(report.records_committed(), 1000);

    let mut seqs = sequence_ids(&store.documents(&cfg.collections.records));
    seqs.sort_unstable();
    assert_eq!(seqs, (1..=1000).collect::<Vec<_>>());
    assert_eq!(store.count(&cfg.collections.batches), 2);
}

#[test]
fn remainder_goes_to_the_last_worker() {
    let store = Arc::new(MemoryStore::new());
    let cfg = config(10, 3);

    let report = run(store.clone(), &cfg).expect("run");

    assert_eq!(report.plan, vec![3, 3, 4]);
    let quotas: Vec<u64> = report.workers.iter().map(|w| w.records_created).collect();
    assert_eq!(quotas, vec![3, 3, 4]);
    assert_eq!(store.count(&cfg.collections.records), 10);
    assert_eq!(store.count(&cfg.collections.batches), 3);
}

#[test]
fn zero_total_completes_without_writes() {
    let store = Arc::new(MemoryStore::new());
    let report = run(store.clone(), &config(0, 5)).expect("run");

    assert_eq!(report.plan, vec![0; 5]);
    assert_eq!(report.workers.len(), 5);
    assert_eq!(report.missing_workers(), 0);
    assert_eq!(report.records_created(), 0);
    assert!(store.ops().is_empty());
}

#[test]
fn zero_concurrency_is_rejected_before_any_work() {
    let store = Arc::new(MemoryStore::new());
    assert!(run(store.clone(), &config(10, 0)).is_err());
    assert!(store.ops().is_empty());
}

#[test]
fn concurrency_above_the_thread_limit_is_rejected_before_any_work() {
    let store = Arc::new(MemoryStore::new());
    let err = run(store.clone(), &config(10, MAX_CONCURRENCY + 1)).expect_err("too many workers");

    assert!(format!("{err:#}").contains("concurrency"));
    assert!(store.ops().is_empty());
}

#[test]
fn spawn_failure_waits_for_started_workers() {
    let store = Arc::new(MemoryStore::new());
    let mut cfg = config(200, 4);
    cfg.batch_size = 10;

    let mut spawned = 0;
    let spawn = |name: String, job: Job| {
        if spawned == 2 {
            return Err(io::Error::other("thread limit reached"));
        }
        spawned += 1;
        spawn_thread(name, job)
    };

    let err = run_plan_with(
        store.clone(),
        &cfg,
        vec![50; 4],
        Arc::new(RunIds::with_batch_seed(1)),
        spawn,
    )
    .expect_err("third spawn fails");

    assert!(format!("{err:#}").contains("failed to spawn worker 2"));
    // Both started workers ran to completion before the error came back.
    assert_eq!(store.count(&cfg.collections.records), 100);
    assert_eq!(store.count(&cfg.collections.batches), 10);
}

#[test]
fn failed_commit_does_not_stop_the_run() {
    let store = Arc::new(MemoryStore::new().fail_commit_attempts([1]));
    let cfg = config(2000, 2);

    let report = run(store.clone(), &cfg).expect("run");

    assert_eq!(report.records_created(), 2000);
    assert_eq!(report.commits_failed(), 1);
    assert_eq!(report.batches_committed(), 3);
    assert_eq!(report.records_committed(), 1500);
    assert_eq!(report.failures(), 1);
    // Metadata is written for the failed batch too.
    assert_eq!(report.batch_infos_written(), 4);
    assert_eq!(store.count(&cfg.collections.records), 1500);
    assert_eq!(store.count(&cfg.collections.batches), 4);
}

#[test]
fn concurrent_workers_share_one_sequence() {
    let store = Arc::new(MemoryStore::new());
    let mut cfg = config(10_007, 8);
    cfg.batch_size = 100;

    let report = run(store.clone(), &cfg).expect("run");
    assert_eq!(report.records_committed(), 10_007);

    let seqs = sequence_ids(&store.documents(&cfg.collections.records));
    let unique: HashSet<u64> = seqs.iter().copied().collect();
    assert_eq!(seqs.len(), 10_007);
    assert_eq!(unique.len(), 10_007);
    assert_eq!(unique.iter().max(), Some(&10_007));

    // Each commit is bounded and followed (later in the log) by exactly one
    // batch info carrying its id.
    let ops = store.ops();
    let mut pending: HashMap<u64, usize> = HashMap::new();
    let mut infos: HashMap<u64, usize> = HashMap::new();
    for op in &ops {
        match op {
            StoreOp::Commit {
                writes, batch_id, ..
            } => {
                assert!(*writes <= 100);
                let id = batch_id.expect("non-empty commit");
                assert!(pending.insert(id, 1).is_none(), "batch {id} committed twice");
            }
            StoreOp::Add {
                collection,
                batch_id,
                ..
            } => {
                assert_eq!(collection, &cfg.collections.batches);
                assert!(
                    pending.contains_key(batch_id),
                    "batch info {batch_id} before its commit"
                );
                *infos.entry(*batch_id).or_default() += 1;
            }
        }
    }
    assert_eq!(pending.len(), infos.len());
    assert!(infos.values().all(|&n| n == 1));
}

#[test]
fn records_in_a_batch_share_its_id() {
    let store = Arc::new(MemoryStore::new());
    let mut cfg = config(40, 4);
    cfg.batch_size = 3;

    run_plan(
        store.clone(),
        &cfg,
        vec![10; 4],
        Arc::new(RunIds::with_batch_seed(500)),
    )
    .expect("run");

    let mut per_batch: HashMap<u64, usize> = HashMap::new();
    for doc in store.documents(&cfg.collections.records) {
        *per_batch.entry(doc.batch_id()).or_default() += 1;
    }

    // 4 workers x (3 + 3 + 3 + 1).
    assert_eq!(per_batch.len(), 16);
    assert!(per_batch.keys().all(|id| (500..516).contains(id)));
    assert_eq!(per_batch.values().filter(|&&n| n == 1).count(), 4);
}

#[test]
fn single_mode_writes_without_batches() {
    let store = Arc::new(MemoryStore::new());
    let mut cfg = config(25, 4);
    cfg.mode = WriteMode::Single;

    let report = run(store.clone(), &cfg).expect("run");

    assert_eq!(report.records_committed(), 25);
    assert_eq!(report.batches_committed(), 0);
    assert_eq!(store.count(&cfg.collections.batches), 0);
    assert!(
        store
            .ops()
            .iter()
            .all(|op| matches!(op, StoreOp::Add { .. }))
    );
}

#[test]
fn local_store_end_to_end() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let cfg = config(1234, 3);

    {
        let store = Arc::new(LocalStore::open(dir.path(), "e2e").expect("open store"));
        let report = run(store, &cfg).expect("run");
        assert_eq!(report.plan, vec![411, 411, 412]);
        assert_eq!(report.failures(), 0);
    }

    let summary = LocalStore::scan(dir.path(), "e2e").expect("scan");
    assert_eq!(summary.documents(&cfg.collections.records), 1234);
    assert_eq!(summary.documents(&cfg.collections.batches), 3);
    assert_eq!(summary.frames, 6);
}
