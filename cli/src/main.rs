// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Fastish Bootstrap CLI
//!
//! The `fastish-bootstrap` binary synthesizes the cross-account trust fabric
//! for one subscriber and prints the resulting descriptor.
//!
//! ## Commands
//!
//! - `fastish-bootstrap synth [--pretty] [--output FILE]` - Realize and print the descriptor
//! - `fastish-bootstrap policies [--resource NAME]` - Print attached policy documents
//! - `fastish-bootstrap context show|validate` - Inspect the resolved context
//! - `fastish-bootstrap plan` - Print realization stages and edges
//!
//! Logs go to stderr; stdout carries only command output.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use fastish_bootstrap::commands::{self, ContextCommand, PlanCommand, PoliciesCommand, SynthCommand};

/// Fastish Bootstrap - Cross-account trust and resource synthesis
#[derive(Parser)]
#[command(name = "fastish-bootstrap")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to bootstrap context manifest (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    context: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FASTISH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize and print the output descriptor
    #[command(name = "synth")]
    Synth {
        #[command(flatten)]
        command: SynthCommand,
    },

    /// Print every attached policy document
    #[command(name = "policies")]
    Policies {
        #[command(flatten)]
        command: PoliciesCommand,
    },

    /// Bootstrap context inspection
    #[command(name = "context")]
    Context {
        #[command(subcommand)]
        command: ContextCommand,
    },

    /// Print the realization plan
    #[command(name = "plan")]
    Plan {
        #[command(flatten)]
        command: PlanCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Synth { command }) => commands::synth::execute(command, cli.context).await,
        Some(Commands::Policies { command }) => commands::policies::execute(command, cli.context).await,
        Some(Commands::Context { command }) => {
            commands::context::handle_command(command, cli.context).await
        }
        Some(Commands::Plan { command }) => commands::plan::execute(command, cli.context).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber writing to stderr
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
