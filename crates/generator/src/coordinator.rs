use std::{io, sync::Arc, thread, time::Instant};

use anyhow::{Context, Result};
use crossbeam::{channel, sync::WaitGroup};
use loadgen_store::DocumentStore;
use log::{debug, info, warn};

use crate::{
    accumulator::BatchAccumulator,
    config::{RunConfig, WriteMode},
    ids::RunIds,
    partition::partition,
    report::{RunReport, WorkerReport},
    single::SingleWriter,
};

/// Partition the run, start one worker thread per partition and block
/// until all of them are done.
///
/// Worker failures never surface here; they are counted in the report.
pub fn run(store: Arc<dyn DocumentStore>, config: &RunConfig) -> Result<RunReport> {
    config.validate()?;
    let plan = partition(config.total, config.concurrency)?;
    run_plan(store, config, plan, Arc::new(RunIds::new()))
}

/// Body of one worker thread.
type Job = Box<dyn FnOnce() + Send + 'static>;

fn spawn_thread(name: String, job: Job) -> io::Result<()> {
    thread::Builder::new().name(name).spawn(job).map(drop)
}

pub(crate) fn run_plan(
    store: Arc<dyn DocumentStore>,
    config: &RunConfig,
    plan: Vec<u64>,
    ids: Arc<RunIds>,
) -> Result<RunReport> {
    run_plan_with(store, config, plan, ids, spawn_thread)
}

fn run_plan_with(
    store: Arc<dyn DocumentStore>,
    config: &RunConfig,
    plan: Vec<u64>,
    ids: Arc<RunIds>,
    mut spawn: impl FnMut(String, Job) -> io::Result<()>,
) -> Result<RunReport> {
    debug!("[coordinator] partition plan: {:?}", plan);

    let (report_tx, report_rx) = channel::unbounded::<WorkerReport>();
    let wg = WaitGroup::new();

    let started = Instant::now();
    for (worker, &quota) in plan.iter().enumerate() {
        let store = Arc::clone(&store);
        let ids = Arc::clone(&ids);
        let worker_tx = report_tx.clone();
        let worker_wg = wg.clone();
        let config = config.clone();

        let job: Job = Box::new(move || {
            let report = match config.mode {
                WriteMode::Batched => BatchAccumulator::new(
                    worker,
                    store.as_ref(),
                    &ids,
                    &config.collections,
                    config.num_bytes,
                    config.batch_size,
                )
                .run(quota),
                WriteMode::Single => SingleWriter::new(
                    worker,
                    store.as_ref(),
                    &ids,
                    &config.collections,
                    config.num_bytes,
                )
                .run(quota),
            };

            let _ = worker_tx.send(report);
            // Dropping the WaitGroup handle signals completion, also on panic.
            drop(worker_wg);
        });

        if let Err(e) = spawn(format!("loadgen-worker-{worker}"), job) {
            // Started workers must be done before the error surfaces.
            drop(report_tx);
            warn!("[coordinator] failed to spawn worker {worker}, waiting for {worker} started workers");
            wg.wait();
            return Err(e).with_context(|| format!("failed to spawn worker {worker}"));
        }
    }
    drop(report_tx);

    info!("[coordinator] {} workers started", plan.len());
    wg.wait();
    let elapsed = started.elapsed();

    let mut workers: Vec<WorkerReport> = report_rx.try_iter().collect();
    workers.sort_by_key(|r| r.worker);

    let report = RunReport {
        plan,
        workers,
        elapsed,
    };

    if report.missing_workers() > 0 {
        warn!(
            "[coordinator] {} workers exited without a report",
            report.missing_workers()
        );
    }

    info!(
        "[coordinator] {} of {} records committed in {:?} ({} failures)",
        report.records_committed(),
        config.total,
        elapsed,
        report.failures()
    );

    Ok(report)
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
