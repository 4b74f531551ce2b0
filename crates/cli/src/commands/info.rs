use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use loadgen_store::{Credentials, LocalStore};
use log::error;

use crate::commands::StoreOptions;

#[derive(Debug, Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub store: StoreOptions,
}

pub fn run(args: InfoArgs) -> ExitCode {
    match execute(args) {
        Ok(code) => code,
        Err(e) => {
            error!("[error] {e:#}");
            eprintln!("[error] {e:#}");
            ExitCode::from(2)
        }
    }
}

fn execute(args: InfoArgs) -> Result<ExitCode> {
    let credentials = Credentials::from_env()?;
    let data_dir = args.store.data_dir();
    let project_dir = data_dir.join(&credentials.project_id);

    if !project_dir.exists() {
        eprintln!("[info] no store found at {}", project_dir.display());
        // Absence is a "soft" failure.
        return Ok(ExitCode::from(1));
    }

    let summary = LocalStore::scan(&data_dir, &credentials.project_id)
        .with_context(|| format!("failed to scan store at {}", project_dir.display()))?;

    println!("[info] project:  {}", credentials.project_id);
    println!("[info] location: {}", project_dir.display());
    println!("[info] commits:  {}", summary.frames);
    for (collection, count) in &summary.collections {
        println!("[info] {collection}: {count} documents");
    }
    if summary.torn_bytes > 0 {
        println!(
            "[info] {} bytes of incomplete commit at the end of the log",
            summary.torn_bytes
        );
    }

    Ok(ExitCode::SUCCESS)
}
