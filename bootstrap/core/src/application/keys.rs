// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Keys Phase
//!
//! KMS key with its alias, and the version parameter. The alias targets the
//! key by its cloud-assigned id, hence the alias -> key edge.

use crate::application::policy_factory::PolicyStatementFactory;
use crate::domain::graph::{DependencyEdge, DependencyTarget, GraphError, Phase, PhaseGroup};
use crate::domain::policy::{PolicyDocument, PolicyKind};
use crate::domain::resource::{NodeId, ResourceKind, ResourceNode, ResourceSpec};
use crate::domain::target::TargetContext;

pub const KMS_KEY: &str = "keys.kms.key";
pub const KMS_ALIAS: &str = "keys.kms.alias";
pub const SSM_PARAMETER: &str = "keys.ssm.parameter";

pub const KEY_DESCRIPTION: &str = "kms key for cdk toolchain";
pub const KEY_ROTATION_DAYS: u32 = 365;

pub fn build_keys_group(ctx: &TargetContext) -> Result<PhaseGroup, GraphError> {
    let factory = PolicyStatementFactory::new(ctx);
    let names = factory.names();

    let key = ResourceNode {
        id: NodeId::new(KMS_KEY),
        kind: ResourceKind::Key,
        derived_name: format!("{}-cdk-kms-encryption-key", names.storage_name()),
        derived_identifier: None,
        spec: ResourceSpec::Key {
            description: KEY_DESCRIPTION.to_string(),
            rotation_days: KEY_ROTATION_DAYS,
            policy: PolicyDocument::new(
                format!("{}-key-policy", names.storage_name()),
                PolicyKind::Resource,
                vec![factory.key_service_usage(), factory.key_account_administration()],
            ),
        },
    };

    let alias = ResourceNode {
        id: NodeId::new(KMS_ALIAS),
        kind: ResourceKind::Alias,
        derived_name: names.key_alias(),
        derived_identifier: Some(names.key_alias_arn()),
        spec: ResourceSpec::Alias {
            target: NodeId::new(KMS_KEY),
        },
    };

    let parameter = ResourceNode {
        id: NodeId::new(SSM_PARAMETER),
        kind: ResourceKind::Parameter,
        derived_name: names.parameter_name(),
        derived_identifier: Some(names.parameter_arn()),
        spec: ResourceSpec::Parameter {
            value: ctx.version().to_string(),
            description: format!("cdk managed version parameter for {}", ctx.name()),
        },
    };

    PhaseGroup::new(Phase::Keys, vec![key, alias, parameter])
}

pub fn key_edges() -> Vec<DependencyEdge> {
    vec![DependencyEdge::new(
        NodeId::new(KMS_ALIAS),
        DependencyTarget::Node(NodeId::new(KMS_KEY)),
        "alias targets the key id",
    )]
}
