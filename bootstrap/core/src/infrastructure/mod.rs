// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod context_loader;
pub mod in_memory_provisioner;

pub use context_loader::BootstrapContextManifest;
pub use in_memory_provisioner::InMemoryProvisioner;
