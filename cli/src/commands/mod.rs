// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Fastish bootstrap CLI

pub mod context;
pub mod plan;
pub mod policies;
pub mod synth;

pub use self::context::ContextCommand;
pub use self::plan::PlanCommand;
pub use self::policies::PoliciesCommand;
pub use self::synth::SynthCommand;

use anyhow::{Context, Result};
use std::path::PathBuf;

use fastish_bootstrap_core::domain::target::TargetContext;
use fastish_bootstrap_core::infrastructure::BootstrapContextManifest;

/// Load, validate and resolve the bootstrap context.
pub fn load_target(context_path: Option<PathBuf>) -> Result<(BootstrapContextManifest, TargetContext)> {
    let manifest = BootstrapContextManifest::load(context_path)
        .context("Failed to load bootstrap context")?;
    manifest
        .validate()
        .context("Bootstrap context manifest is invalid")?;
    let ctx = manifest
        .resolve()
        .context("Failed to resolve bootstrap context")?;
    Ok((manifest, ctx))
}
