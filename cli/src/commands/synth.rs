// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Synthesize command
//!
//! Runs the full synthesis against the dry-run provisioner and prints
//! `{"fastish": <descriptor>}`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use fastish_bootstrap_core::application::BootstrapSynthesizer;
use fastish_bootstrap_core::infrastructure::InMemoryProvisioner;

use super::load_target;

#[derive(Args)]
pub struct SynthCommand {
    /// Pretty-print the descriptor
    #[arg(long)]
    pub pretty: bool,

    /// Write the descriptor to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub async fn execute(command: SynthCommand, context_path: Option<PathBuf>) -> Result<()> {
    let (manifest, ctx) = load_target(context_path)?;

    let provisioner = Arc::new(InMemoryProvisioner::for_target(&ctx));
    let outcome = BootstrapSynthesizer::new(provisioner)
        .with_strict_preflight(manifest.strict_preflight())
        .synthesize(&ctx)
        .await
        .context("Bootstrap synthesis failed")?;
    tracing::debug!(resources = outcome.realized.len(), "Synthesis complete");

    let rendered = outcome
        .descriptor
        .to_json_string(command.pretty)
        .context("Failed to serialize output descriptor")?;

    match command.output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write descriptor to {:?}", path))?;
            eprintln!(
                "{} Descriptor for {} written to {}",
                "✓".green(),
                ctx.name().bold(),
                path.display()
            );
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
