// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bootstrap context commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use fastish_bootstrap_core::application::BootstrapSynthesizer;
use fastish_bootstrap_core::domain::naming::NameTemplate;
use fastish_bootstrap_core::infrastructure::InMemoryProvisioner;

use super::load_target;

#[derive(Subcommand)]
pub enum ContextCommand {
    /// Show the resolved bootstrap context
    Show {
        /// Show context file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the resolved context as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the bootstrap context and its default-bootstrap references
    Validate {
        /// Path to context file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub async fn handle_command(command: ContextCommand, context_path: Option<PathBuf>) -> Result<()> {
    match command {
        ContextCommand::Show { paths, json } => show(context_path, paths, json).await,
        ContextCommand::Validate { file } => validate(file.or(context_path)).await,
    }
}

async fn show(context_path: Option<PathBuf>, show_paths: bool, json: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Context discovery paths:".bold());
        match &context_path {
            Some(path) => println!("  1. --context flag: {}", path.display()),
            None => println!("  1. --context flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. FASTISH_CONTEXT_PATH: {}",
            std::env::var("FASTISH_CONTEXT_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./fastish-context.yaml");
        println!("  4. ~/.fastish/context.yaml");
        println!("  5. /etc/fastish/context.yaml");
        println!();
    }

    let (manifest, ctx) = load_target(context_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ctx)?);
        return Ok(());
    }

    println!("{} {}", "Bootstrap context:".bold(), manifest.metadata.name);
    println!();

    println!("{}", "Subscriber:".bold());
    println!("  Account: {}", ctx.account());
    println!("  Region: {}", ctx.region());
    println!("  Name: {}", ctx.name());
    println!("  Subscriber role: {}", ctx.subscriber_role_arn());
    let releases: Vec<&str> = ctx.releases().iter().map(|c| c.as_str()).collect();
    if releases.is_empty() {
        println!("  Releases: {}", "(none)".dimmed());
    } else {
        println!("  Releases: {}", releases.join(", "));
    }
    println!();

    println!("{}", "Host:".bold());
    println!("  Account: {}", ctx.host().account);
    println!();

    println!("{}", "Toolchain:".bold());
    println!("  Scope: {}", ctx.scope());
    println!("  Qualifier: {}", ctx.qualifier());
    println!("  Version: {}", ctx.version());
    println!("  Strict pre-flight: {}", manifest.strict_preflight());
    println!();

    Ok(())
}

async fn validate(context_path: Option<PathBuf>) -> Result<()> {
    println!("Validating bootstrap context...");

    let (manifest, ctx) = load_target(context_path)?;

    let synthesizer = BootstrapSynthesizer::new(Arc::new(InMemoryProvisioner::for_target(&ctx)))
        .with_strict_preflight(manifest.strict_preflight());
    let dangling = synthesizer
        .preflight(&NameTemplate::for_target(&ctx))
        .context("Default-bootstrap reference check failed")?;
    for reference in &dangling {
        println!("{} {}", "⚠".yellow(), reference);
    }

    synthesizer
        .plan(&ctx)
        .context("Bootstrap resources do not form a valid plan")?;

    println!("{}", "✓ Bootstrap context is valid".green());
    Ok(())
}
