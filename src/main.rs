#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use std::{env, process::ExitCode};

mod branch;
mod cli;
mod constants;
mod errors;
mod git;
mod markdown;
mod policy;
mod table;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::try_parse_args(env::args_os()).unwrap_or_else(|e| e.exit());
    let cli = match cli.init_tracing_subscriber() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("git-branches: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
