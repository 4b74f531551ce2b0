pub mod info;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
pub use info::InfoArgs;
use loadgen_runtime::default_data_dir;
use loadgen_store::StoreBackend;
pub use run::RunArgs;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write documents into the store.
    ///
    /// Example:
    ///   loadgen run -n 100000 -c 8 --num-bytes 256
    ///   loadgen run -n 1000 --store memory
    Run(RunArgs),

    /// Show what the local store for the configured project holds.
    Info(InfoArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Local,
    Memory,
}

impl From<BackendArg> for StoreBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Local => StoreBackend::Local,
            BackendArg::Memory => StoreBackend::Memory,
        }
    }
}

#[derive(Debug, Args)]
pub struct StoreOptions {
    /// Directory holding the local store (default: $XDG_DATA_HOME/loadgen)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

impl StoreOptions {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}
