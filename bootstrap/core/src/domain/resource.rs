// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Resource Nodes
//!
//! A [`ResourceNode`] is one provisioned unit: its kind, derived name, the
//! identifier it is expected to carry, and the policies attached to it. Nodes
//! are owned by the phase group that created them; other phases refer to them
//! only through [`NodeId`] or their deterministic ARN.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::policy::{PolicyDocument, PolicyStatement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Role,
    Bucket,
    Registry,
    Key,
    Alias,
    Parameter,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Role => "role",
            ResourceKind::Bucket => "bucket",
            ResourceKind::Registry => "registry",
            ResourceKind::Key => "key",
            ResourceKind::Alias => "alias",
            ResourceKind::Parameter => "parameter",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical node identifier. Uses the descriptor path the node's identifier is
/// published under (e.g. `roles.handshake`, `keys.kms.alias`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind-specific configuration of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSpec {
    Role {
        trust: PolicyDocument,
        inline_policies: Vec<PolicyDocument>,
    },
    Bucket {
        policy: PolicyDocument,
        block_public_access: bool,
        owner_enforced: bool,
    },
    Registry {
        policy: PolicyDocument,
    },
    Key {
        description: String,
        rotation_days: u32,
        policy: PolicyDocument,
    },
    Alias {
        target: NodeId,
    },
    Parameter {
        value: String,
        description: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    pub id: NodeId,
    pub kind: ResourceKind,
    pub derived_name: String,
    /// Expected ARN. `None` when the cloud assigns the identifier (KMS keys).
    pub derived_identifier: Option<String>,
    pub spec: ResourceSpec,
}

impl ResourceNode {
    /// Every policy document attached to this node, trust first.
    pub fn attached_policies(&self) -> Vec<&PolicyDocument> {
        match &self.spec {
            ResourceSpec::Role {
                trust,
                inline_policies,
            } => std::iter::once(trust).chain(inline_policies.iter()).collect(),
            ResourceSpec::Bucket { policy, .. }
            | ResourceSpec::Registry { policy }
            | ResourceSpec::Key { policy, .. } => vec![policy],
            ResourceSpec::Alias { .. } | ResourceSpec::Parameter { .. } => Vec::new(),
        }
    }

    pub fn statements(&self) -> impl Iterator<Item = &PolicyStatement> {
        self.attached_policies()
            .into_iter()
            .flat_map(|doc| doc.statements.iter())
    }
}

/// Live handle returned by the provisioning collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    /// Provider-side physical id (role name, bucket name, key id, ...).
    pub physical_id: String,
    pub realized_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedResource {
    pub node_id: NodeId,
    pub kind: ResourceKind,
    pub identifier: String,
    pub handle: ResourceHandle,
}

/// Realized resources keyed by node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealizedIndex(BTreeMap<NodeId, RealizedResource>);

impl RealizedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: RealizedResource) {
        self.0.insert(resource.node_id.clone(), resource);
    }

    pub fn get(&self, id: &NodeId) -> Option<&RealizedResource> {
        self.0.get(id)
    }

    pub fn identifier(&self, id: &NodeId) -> Option<&str> {
        self.0.get(id).map(|r| r.identifier.as_str())
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RealizedResource> {
        self.0.values()
    }
}
