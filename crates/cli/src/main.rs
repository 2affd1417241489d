// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! forge: run adversary-emulation procedures from the command line

use anyhow::Context;
use clap::{Parser, Subcommand};
use forge_core::{parse_arg_kv, RealFs};
use forge_engine::{run_procedure, ExecutionContext};
use forge_procedure::load_file;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forge", version, about = "Adversary-emulation TTP runner")]
struct Cli {
    /// Verbose logging (FORGE_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a TTP procedure file
    Run {
        /// Path to the procedure file
        ttp: PathBuf,

        /// Procedure arguments as key=value pairs
        #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE")]
        args: Vec<String>,

        /// Skip the cleanup phase entirely
        #[arg(long)]
        no_cleanup: bool,

        /// Seconds to sleep before cleanup begins
        #[arg(long, value_name = "SECONDS", default_value_t = 0)]
        cleanup_delay_seconds: u64,

        /// Validate the procedure without executing any step
        #[arg(long)]
        dry_run: bool,

        /// Extra directories consulted for sub-procedure references
        #[arg(long = "search-path", value_name = "DIR")]
        search_paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "forge=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_env("FORGE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command) -> anyhow::Result<()> {
    let Command::Run {
        ttp,
        args,
        no_cleanup,
        cleanup_delay_seconds,
        dry_run,
        search_paths,
    } = command;

    let mut supplied = HashMap::new();
    for pair in &args {
        let (key, value) = parse_arg_kv(pair)?;
        supplied.insert(key, value);
    }

    let path = if ttp.is_absolute() {
        ttp
    } else {
        std::env::current_dir()
            .context("cannot determine current directory")?
            .join(ttp)
    };

    let fs = RealFs;
    let (procedure, resolved) = load_file(&path, &fs, &supplied)
        .with_context(|| format!("failed to load {}", path.display()))?;

    let mut ctx = ExecutionContext::new(procedure.working_dir.clone())
        .args(resolved)
        .no_cleanup(no_cleanup)
        .cleanup_delay(Duration::from_secs(cleanup_delay_seconds))
        .dry_run(dry_run)
        .search_paths(search_paths);

    let report = run_procedure(&procedure, &mut ctx).await?;
    if dry_run {
        println!("{}: validation passed", procedure.name);
        return Ok(());
    }
    match report.error {
        None => Ok(()),
        Some(err) => Err(err.into()),
    }
}
