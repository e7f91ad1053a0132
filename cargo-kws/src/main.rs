// kws - cargo-kws
// Module: Command Line Entry Point
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! cargo-kws - kernel workspace sizing from the command line
//!
//! Thin front end over `kws-build-core`: every subcommand loads
//! `kernel.toml`, elaborates it and prints one view of the result.

use std::{path::PathBuf, process};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;
mod output;

use output::OutputFormat;

/// Kernel workspace sizing and object table generation
#[derive(Parser, Debug)]
#[command(name = "cargo-kws")]
#[command(
    version,
    about = "Size the kernel workspace and generate object tables",
    long_about = "
Size the kernel workspace and generate object tables from kernel.toml

Usage:
  cargo-kws <COMMAND>           # Direct usage
  cargo kws <COMMAND>           # As Cargo subcommand

Examples:
  cargo kws check
  cargo kws --target riscv64 size
  cargo kws --output json tables
  cargo kws emit --out src/confdefs.rs
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(long, short, global = true, env = "KWS_CONFIG", default_value = "kernel.toml")]
    config: PathBuf,

    /// Target profile, overrides the `target` key of the file
    #[arg(long, short, global = true, env = "KWS_TARGET")]
    target: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Log filter, e.g. `debug` or `kws_foundation=trace`
    #[arg(long, global = true, env = "KWS_LOG", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse, normalize and validate the configuration
    Check,
    /// Print the workspace breakdown
    Size,
    /// List the object tables that would be emitted
    Tables,
    /// Write the generated Rust module
    Emit {
        /// Output file
        #[arg(long, short)]
        out: PathBuf,
    },
    /// List the target profile presets
    Targets,
}

/// Arguments every command needs
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file
    pub config: PathBuf,
    /// Target override
    pub target: Option<String>,
    /// Output format
    pub output: OutputFormat,
}

/// Parse arguments, accepting both `cargo-kws ...` and `cargo kws ...`
fn parse_args() -> Cli {
    let mut args: Vec<String> = std::env::args().collect();
    if args.get(1).is_some_and(|arg| arg == "kws") {
        args.remove(1);
    }
    Cli::parse_from(args)
}

fn init_tracing(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter).with_context(|| format!("invalid log filter `{filter}`"))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install the log subscriber")
}

fn main() {
    let cli = parse_args();
    let code = match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            2
        },
    };
    process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    init_tracing(&cli.log_level)?;
    let args = GlobalArgs { config: cli.config, target: cli.target, output: cli.output };

    let success = match cli.command {
        Commands::Check => commands::check::execute(&args)?,
        Commands::Size => commands::size::execute(&args)?,
        Commands::Tables => commands::tables::execute(&args)?,
        Commands::Emit { out } => commands::emit::execute(&args, &out)?,
        Commands::Targets => commands::targets::execute(&args)?,
    };
    Ok(if success { 0 } else { 1 })
}
