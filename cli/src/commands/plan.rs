// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Plan command
//!
//! Prints the realization stages in order, then the dependency edges.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use fastish_bootstrap_core::application::BootstrapSynthesizer;
use fastish_bootstrap_core::domain::graph::ResourceGraph;
use fastish_bootstrap_core::infrastructure::InMemoryProvisioner;

use super::load_target;

#[derive(Args)]
pub struct PlanCommand {
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(command: PlanCommand, context_path: Option<PathBuf>) -> Result<()> {
    let (_, ctx) = load_target(context_path)?;
    let graph = BootstrapSynthesizer::new(Arc::new(InMemoryProvisioner::for_target(&ctx)))
        .plan(&ctx)
        .context("Failed to plan bootstrap resources")?;

    if command.json {
        let plan = serde_json::json!({
            "stages": graph.realization_order(),
            "edges": graph.edges(),
        });
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{} {}", "Realization plan for".bold(), ctx.name().bold());
    for line in render_plan(&graph) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per stage and node, then one per edge.
pub fn render_plan(graph: &ResourceGraph) -> Vec<String> {
    let mut lines = Vec::new();
    for (index, stage) in graph.realization_order().iter().enumerate() {
        lines.push(format!("Stage {} [{}]", index + 1, stage.phase));
        for id in &stage.nodes {
            if let Some(node) = graph.node(id) {
                lines.push(format!(
                    "  {:<22} {:<10} {}",
                    id.as_str(),
                    node.kind.as_str(),
                    node.derived_name
                ));
            }
        }
    }
    if !graph.edges().is_empty() {
        lines.push("Edges".to_string());
        for edge in graph.edges() {
            lines.push(format!("  {} -> {} ({})", edge.from, edge.to, edge.reason));
        }
    }
    lines
}
