// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Policies command
//!
//! Prints every policy document attached to the planned resources, keyed by
//! node and document name.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

use fastish_bootstrap_core::application::BootstrapSynthesizer;
use fastish_bootstrap_core::domain::graph::ResourceGraph;
use fastish_bootstrap_core::infrastructure::InMemoryProvisioner;

use super::load_target;

#[derive(Args)]
pub struct PoliciesCommand {
    /// Only this resource (node id such as `roles.handshake`, or physical name)
    #[arg(short, long, value_name = "NAME")]
    pub resource: Option<String>,
}

pub async fn execute(command: PoliciesCommand, context_path: Option<PathBuf>) -> Result<()> {
    let (_, ctx) = load_target(context_path)?;
    let graph = BootstrapSynthesizer::new(Arc::new(InMemoryProvisioner::for_target(&ctx)))
        .plan(&ctx)
        .context("Failed to plan bootstrap resources")?;

    let policies = collect_policies(&graph, command.resource.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&policies)?);
    Ok(())
}

/// `{ node: { document: <IAM JSON> } }` for every node with policies.
pub fn collect_policies(graph: &ResourceGraph, resource: Option<&str>) -> Result<Value> {
    let mut out = Map::new();
    for node in graph.nodes() {
        if let Some(filter) = resource {
            if node.id.as_str() != filter && node.derived_name != filter {
                continue;
            }
        }
        let documents: Map<String, Value> = node
            .attached_policies()
            .into_iter()
            .map(|doc| (doc.name.clone(), doc.render()))
            .collect();
        if !documents.is_empty() {
            out.insert(node.id.to_string(), Value::Object(documents));
        }
    }

    if let Some(filter) = resource {
        if out.is_empty() {
            anyhow::bail!("No resource with policies matches '{}'", filter);
        }
    }
    Ok(Value::Object(out))
}
