// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Dry-run provisioner. Realizes nodes in memory with the identifiers the
//! cloud would assign, so a synthesis run can be inspected without touching
//! an account. KMS key ids are derived (UUID v5) from the key name and are
//! stable across runs.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::naming::NameTemplate;
use crate::domain::policy::Principal;
use crate::domain::provisioner::ResourceProvisioner;
use crate::domain::resource::{
    NodeId, RealizedResource, ResourceHandle, ResourceKind, ResourceNode, ResourceSpec,
};
use crate::domain::target::TargetContext;

pub struct InMemoryProvisioner {
    names: NameTemplate,
    realized: Arc<RwLock<HashMap<NodeId, RealizedResource>>>,
}

impl InMemoryProvisioner {
    pub fn new(names: NameTemplate) -> Self {
        Self {
            names,
            realized: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn for_target(ctx: &TargetContext) -> Self {
        Self::new(NameTemplate::for_target(ctx))
    }

    pub async fn get(&self, id: &NodeId) -> Option<RealizedResource> {
        self.realized.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.realized.read().await.len()
    }

    fn identifier_for(&self, node: &ResourceNode) -> String {
        match &node.derived_identifier {
            Some(identifier) => identifier.clone(),
            None => {
                let key_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, node.derived_name.as_bytes());
                self.names.key_arn(&key_id.to_string())
            }
        }
    }
}

/// Checks the collaborator contract: everything a node refers to by
/// identifier must already be realized and handed in.
fn check_dependencies(node: &ResourceNode, dependencies: &[RealizedResource]) -> Result<()> {
    match &node.spec {
        ResourceSpec::Alias { target } => {
            let found = dependencies
                .iter()
                .any(|d| &d.node_id == target && d.kind == ResourceKind::Key);
            if !found {
                bail!("alias {} targets key {} which is not realized", node.id, target);
            }
        }
        ResourceSpec::Registry { .. } => {
            for statement in node.statements() {
                for principal in &statement.principals {
                    if let Principal::Arn(arn) = principal {
                        if !dependencies.iter().any(|d| &d.identifier == arn) {
                            bail!("registry {} grants unknown principal {}", node.id, arn);
                        }
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

#[async_trait]
impl ResourceProvisioner for InMemoryProvisioner {
    async fn realize(
        &self,
        node: &ResourceNode,
        dependencies: &[RealizedResource],
    ) -> Result<RealizedResource> {
        if let Some(existing) = self.realized.read().await.get(&node.id) {
            return Ok(existing.clone());
        }

        check_dependencies(node, dependencies)?;

        let resource = RealizedResource {
            node_id: node.id.clone(),
            kind: node.kind,
            identifier: self.identifier_for(node),
            handle: ResourceHandle {
                physical_id: node.derived_name.clone(),
                realized_at: Utc::now(),
            },
        };

        let mut guard = self.realized.write().await;
        guard.insert(node.id.clone(), resource.clone());
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::{PolicyDocument, PolicyKind, PolicyStatement};

    fn names() -> NameTemplate {
        NameTemplate::new("fastish", "acme", "123456789012", "us-east-1", "hnb659fds")
    }

    fn key() -> ResourceNode {
        ResourceNode {
            id: NodeId::new("keys.kms.key"),
            kind: ResourceKind::Key,
            derived_name: "fastish-acme-cdk-kms-encryption-key".to_string(),
            derived_identifier: None,
            spec: ResourceSpec::Key {
                description: "kms key for cdk toolchain".to_string(),
                rotation_days: 365,
                policy: PolicyDocument::new("key", PolicyKind::Resource, Vec::new()),
            },
        }
    }

    fn alias() -> ResourceNode {
        ResourceNode {
            id: NodeId::new("keys.kms.alias"),
            kind: ResourceKind::Alias,
            derived_name: "alias/fastish-acme".to_string(),
            derived_identifier: Some("arn:aws:kms:us-east-1:123456789012:alias/fastish-acme".to_string()),
            spec: ResourceSpec::Alias {
                target: NodeId::new("keys.kms.key"),
            },
        }
    }

    #[tokio::test]
    async fn test_key_id_is_deterministic() {
        let first = InMemoryProvisioner::new(names()).realize(&key(), &[]).await.unwrap();
        let second = InMemoryProvisioner::new(names()).realize(&key(), &[]).await.unwrap();
        assert_eq!(first.identifier, second.identifier);
        assert!(first
            .identifier
            .starts_with("arn:aws:kms:us-east-1:123456789012:key/"));
    }

    #[tokio::test]
    async fn test_alias_requires_realized_key() {
        let provisioner = InMemoryProvisioner::new(names());
        assert!(provisioner.realize(&alias(), &[]).await.is_err());

        let key = provisioner.realize(&key(), &[]).await.unwrap();
        let alias = provisioner.realize(&alias(), &[key]).await.unwrap();
        assert_eq!(alias.identifier, "arn:aws:kms:us-east-1:123456789012:alias/fastish-acme");
        assert_eq!(provisioner.len().await, 2);
    }

    #[tokio::test]
    async fn test_registry_rejects_unrealized_principal() {
        let registry = ResourceNode {
            id: NodeId::new("storage.images"),
            kind: ResourceKind::Registry,
            derived_name: "fastish-acme".to_string(),
            derived_identifier: Some("arn:aws:ecr:us-east-1:123456789012:repository/fastish-acme".to_string()),
            spec: ResourceSpec::Registry {
                policy: PolicyDocument::new(
                    "registry",
                    PolicyKind::Resource,
                    vec![PolicyStatement::allow(&["ecr:BatchGetImage"]).for_principal(Principal::Arn(
                        "arn:aws:iam::123456789012:role/fastish-acme-webapp-exec".to_string(),
                    ))],
                ),
            },
        };
        let provisioner = InMemoryProvisioner::new(names());
        let err = provisioner.realize(&registry, &[]).await.unwrap_err();
        assert!(err.to_string().contains("unknown principal"));
    }

    #[tokio::test]
    async fn test_realize_is_idempotent() {
        let provisioner = InMemoryProvisioner::new(names());
        let first = provisioner.realize(&key(), &[]).await.unwrap();
        let again = provisioner.realize(&key(), &[]).await.unwrap();
        assert_eq!(first, again);
        assert_eq!(provisioner.get(&NodeId::new("keys.kms.key")).await, Some(first));
    }
}
