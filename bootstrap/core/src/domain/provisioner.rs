// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use async_trait::async_trait;

use super::resource::{RealizedResource, ResourceNode};

/// Physically instantiates a node against the target cloud.
///
/// `dependencies` holds the already realized nodes this node has explicit
/// edges to (e.g. the key an alias targets). Retries, if any, are the
/// implementation's concern.
#[async_trait]
pub trait ResourceProvisioner: Send + Sync {
    async fn realize(
        &self,
        node: &ResourceNode,
        dependencies: &[RealizedResource],
    ) -> Result<RealizedResource>;
}
