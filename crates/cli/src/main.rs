// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wg: control weather-grid generation through the `wgd` daemon.

mod client;
mod color;
mod commands;
mod daemon_process;
mod env;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};

use crate::commands::daemon::DaemonArgs;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "wg", version, about = "Regenerate and publish weather-grid datasets", styles = color::styles())]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear staging and launch the generator
    Start {
        /// Keep polling until the job finishes
        #[arg(long, short)]
        watch: bool,
    },
    /// Poll the job once; publishes the dataset if generation finished
    Status,
    /// Poll until the job finishes, streaming its log
    Watch,
    /// Kill the running generator and discard its output
    Cancel,
    /// Daemon management
    Daemon(DaemonArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        if let Some(exit) = e.downcast_ref::<ExitError>() {
            if !exit.message.is_empty() {
                eprintln!("{}", exit.message);
            }
            std::process::exit(exit.code);
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.output;
    match cli.command {
        Commands::Start { watch } => commands::job::start(watch, format).await,
        Commands::Status => commands::job::status(format).await,
        Commands::Watch => commands::job::watch(format).await,
        Commands::Cancel => commands::job::cancel(format).await,
        Commands::Daemon(args) => commands::daemon::daemon(args, format).await,
    }
}
