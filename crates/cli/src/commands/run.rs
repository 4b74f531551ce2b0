use std::{
    io::{self, Write},
    process::ExitCode,
};

use anyhow::Result;
use clap::{Args, ValueEnum};
use loadgen_generator::{Collections, MAX_CONCURRENCY, RunConfig, RunReport, WriteMode};
use loadgen_runtime::{DEFAULT_BATCH_COLLECTION, DEFAULT_RECORD_COLLECTION};
use loadgen_store::{Credentials, MAX_BATCH_WRITES, connect};
use log::error;

use crate::commands::{BackendArg, StoreOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Atomic batches plus one batch-info document per batch
    Batched,
    /// One write per document
    Single,
}

impl From<ModeArg> for WriteMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Batched => WriteMode::Batched,
            ModeArg::Single => WriteMode::Single,
        }
    }
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Number of documents to write
    #[arg(short = 'n', long = "total", default_value_t = 1)]
    pub total: u64,

    /// Number of parallel workers
    #[arg(
        short = 'c',
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..=MAX_CONCURRENCY)
    )]
    pub concurrency: u64,

    /// Payload size of every document, in bytes
    #[arg(long = "num-bytes", visible_alias = "numBytes", default_value_t = 50)]
    pub num_bytes: usize,

    /// Documents per atomic batch
    #[arg(
        long,
        default_value_t = MAX_BATCH_WRITES,
        value_parser = parse_batch_size
    )]
    pub batch_size: usize,

    #[arg(long, value_enum, default_value_t = ModeArg::Batched)]
    pub mode: ModeArg,

    /// Collection receiving the generated documents
    #[arg(long, default_value = DEFAULT_RECORD_COLLECTION)]
    pub collection: String,

    /// Collection receiving one batch-info document per batch
    #[arg(long, default_value = DEFAULT_BATCH_COLLECTION)]
    pub batch_collection: String,

    /// Store to write into
    #[arg(long = "store", value_enum, default_value_t = BackendArg::Local)]
    pub backend: BackendArg,

    #[command(flatten)]
    pub store: StoreOptions,
}

fn parse_batch_size(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if n == 0 || n > MAX_BATCH_WRITES {
        return Err(format!("must be between 1 and {MAX_BATCH_WRITES}"));
    }
    Ok(n)
}

impl RunArgs {
    fn to_config(&self) -> RunConfig {
        RunConfig {
            total: self.total,
            concurrency: self.concurrency,
            num_bytes: self.num_bytes,
            batch_size: self.batch_size,
            mode: self.mode.into(),
            collections: Collections {
                records: self.collection.clone(),
                batches: self.batch_collection.clone(),
            },
        }
    }
}

pub fn run(args: RunArgs) -> ExitCode {
    let stdout = io::stdout();
    let outcome = execute(&args, Credentials::from_env, &mut stdout.lock());
    ExitCode::from(exit_status(&outcome))
}

/// 0 once the run completed, whatever its failure count; 2 on fatal errors.
fn exit_status(outcome: &Result<RunReport>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(e) => {
            error!("[error] {e:#}");
            eprintln!("[error] {e:#}");
            2
        }
    }
}

fn execute(
    args: &RunArgs,
    credentials: impl FnOnce() -> Result<Credentials>,
    out: &mut impl Write,
) -> Result<RunReport> {
    let config = args.to_config();
    config.validate()?;

    let credentials = credentials()?;
    let store = connect(args.backend.into(), &credentials, &args.store.data_dir())?;

    writeln!(out, "Waiting for write routines to finish...")?;
    let report = loadgen_generator::run(store, &config)?;

    writeln!(out, "Data load generation done")?;
    writeln!(out, "Took: {:?}", report.elapsed)?;
    writeln!(out, "{}", summary_line(&config, &report))?;

    Ok(report)
}

fn summary_line(config: &RunConfig, report: &RunReport) -> String {
    match config.mode {
        WriteMode::Batched => format!(
            "Committed {} of {} documents in {} batches across {} workers ({} failed commits, {} failed batch infos)",
            report.records_committed(),
            config.total,
            report.batches_committed(),
            report.plan.len(),
            report.commits_failed(),
            report.failures() - report.commits_failed(),
        ),
        WriteMode::Single => format!(
            "Wrote {} of {} documents across {} workers ({} failed writes)",
            report.records_committed(),
            config.total,
            report.plan.len(),
            report.failures(),
        ),
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
