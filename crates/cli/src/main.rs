use std::process::ExitCode;

use clap::Parser;

mod commands;

use commands::Command;
use loadgen_runtime::logging;

#[derive(Debug, Parser)]
#[command(
    name = "loadgen",
    version,
    about = "Synthetic write load for document databases",
    propagate_version = true
)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::level_from_verbosity(cli.verbose)).ok();

    match cli.command {
        Command::Run(args) => commands::run::run(args),
        Command::Info(args) => commands::info::run(args),
    }
}
