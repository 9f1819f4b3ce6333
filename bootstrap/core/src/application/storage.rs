// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Storage Phase
//!
//! The assets bucket and the images registry, both named `{scope}-{name-lower}`.
//! The registry policy names capability execution-role principals, so the
//! registry carries an edge to the role phase.

use crate::application::policy_factory::PolicyStatementFactory;
use crate::domain::graph::{DependencyEdge, DependencyTarget, GraphError, Phase, PhaseGroup};
use crate::domain::policy::{PolicyDocument, PolicyKind};
use crate::domain::resource::{NodeId, ResourceKind, ResourceNode, ResourceSpec};
use crate::domain::target::TargetContext;

pub const ASSETS_BUCKET: &str = "storage.assets";
pub const IMAGES_REGISTRY: &str = "storage.images";

pub fn build_storage_group(ctx: &TargetContext) -> Result<PhaseGroup, GraphError> {
    let factory = PolicyStatementFactory::new(ctx);
    let names = factory.names();
    let storage_name = names.storage_name();

    let bucket = ResourceNode {
        id: NodeId::new(ASSETS_BUCKET),
        kind: ResourceKind::Bucket,
        derived_name: storage_name.clone(),
        derived_identifier: Some(names.bucket_arn()),
        spec: ResourceSpec::Bucket {
            policy: PolicyDocument::new(
                format!("{}-bucket-policy", storage_name),
                PolicyKind::Resource,
                vec![factory.bucket_transport_enforcement()],
            ),
            block_public_access: true,
            owner_enforced: true,
        },
    };

    let registry = ResourceNode {
        id: NodeId::new(IMAGES_REGISTRY),
        kind: ResourceKind::Registry,
        derived_name: storage_name.clone(),
        derived_identifier: Some(names.registry_arn()),
        spec: ResourceSpec::Registry {
            policy: PolicyDocument::new(
                format!("{}-repository-policy", storage_name),
                PolicyKind::Resource,
                vec![factory.registry_pull_grant(ctx.releases())],
            ),
        },
    };

    PhaseGroup::new(Phase::Storage, vec![bucket, registry])
}

/// Registry access policy must wait for the role set.
pub fn storage_edges() -> Vec<DependencyEdge> {
    vec![DependencyEdge::new(
        NodeId::new(IMAGES_REGISTRY),
        DependencyTarget::Phase(Phase::Roles),
        "registry policy names execution-role principals",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::target::RawTargetContext;
    use serde_json::json;

    fn ctx(releases: &[&str]) -> TargetContext {
        TargetContext::resolve(RawTargetContext {
            account: Some("123456789012".to_string()),
            region: Some("us-east-1".to_string()),
            name: Some("Acme".to_string()),
            external_id: Some("ext-1".to_string()),
            subscriber_role_arn: Some("arn:aws:iam::111111111111:role/sub".to_string()),
            releases: releases.iter().map(|r| r.to_string()).collect(),
            version: Some("21".to_string()),
            host_account: Some("999999999999".to_string()),
            scope: None,
            qualifier: None,
        })
        .unwrap()
    }

    fn node<'a>(group: &'a PhaseGroup, id: &str) -> &'a ResourceNode {
        group.nodes().iter().find(|n| n.id.as_str() == id).unwrap()
    }

    #[test]
    fn test_bucket_blocks_public_access_and_enforces_transport() {
        let group = build_storage_group(&ctx(&["webapp"])).unwrap();
        let bucket = node(&group, ASSETS_BUCKET);

        assert_eq!(bucket.kind, ResourceKind::Bucket);
        assert_eq!(bucket.derived_name, "fastish-acme");
        assert_eq!(bucket.derived_identifier.as_deref(), Some("arn:aws:s3:::fastish-acme"));

        let ResourceSpec::Bucket {
            policy,
            block_public_access,
            owner_enforced,
        } = &bucket.spec
        else {
            panic!("expected bucket spec, got {:?}", bucket.spec);
        };
        assert!(*block_public_access);
        assert!(*owner_enforced);
        assert_eq!(policy.name, "fastish-acme-bucket-policy");
        policy.validate().unwrap();
        assert_eq!(
            policy.render(),
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Sid": "fastish-acme-ownership",
                    "Effect": "Deny",
                    "Principal": "*",
                    "Action": "s3:*",
                    "Resource": ["arn:aws:s3:::fastish-acme", "arn:aws:s3:::fastish-acme/*"],
                    "Condition": { "Bool": { "aws:SecureTransport": "false" } }
                }]
            })
        );
    }

    #[test]
    fn test_registry_policy_names_enabled_exec_roles() {
        let group = build_storage_group(&ctx(&["webapp", "all"])).unwrap();
        let registry = node(&group, IMAGES_REGISTRY);

        assert_eq!(registry.derived_name, "fastish-acme");
        assert_eq!(
            registry.derived_identifier.as_deref(),
            Some("arn:aws:ecr:us-east-1:123456789012:repository/fastish-acme")
        );

        let ResourceSpec::Registry { policy } = &registry.spec else {
            panic!("expected registry spec, got {:?}", registry.spec);
        };
        assert_eq!(policy.name, "fastish-acme-repository-policy");
        let rendered = policy.render();
        assert_eq!(
            rendered["Statement"][0]["Principal"]["AWS"],
            json!([
                "arn:aws:iam::123456789012:role/fastish-Acme-exec",
                "arn:aws:iam::123456789012:role/fastish-Acme-webapp-exec"
            ])
        );
    }

    #[test]
    fn test_registry_waits_for_role_phase() {
        let edges = storage_edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from, NodeId::new(IMAGES_REGISTRY));
        assert_eq!(edges[0].to, DependencyTarget::Phase(Phase::Roles));
    }
}
