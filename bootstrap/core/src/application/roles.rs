// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Role Phase
//!
//! Builds the role set. Every role is one trust statement plus an ordered list
//! of inline policies, each named `{scope}-{role}-can-{verb}`.
//!
//! | Role | Trusted by | Present |
//! |------|------------|---------|
//! | handshake | subscriber role (external id, host account) | always |
//! | lookup, assets, images, deploy | handshake role | always |
//! | exec | CloudFormation | always |
//! | druid-exec | CloudFormation | `druid` enabled |
//! | webapp-exec | CloudFormation | `webapp` enabled |

use crate::application::policy_factory::PolicyStatementFactory;
use crate::domain::graph::{GraphError, Phase, PhaseGroup};
use crate::domain::naming::OwnedRoleKind;
use crate::domain::policy::{PolicyDocument, PolicyKind, PolicyStatement};
use crate::domain::resource::{NodeId, ResourceKind, ResourceNode, ResourceSpec};
use crate::domain::target::TargetContext;

pub fn role_node_id(kind: OwnedRoleKind) -> NodeId {
    NodeId::new(format!("roles.{}", kind.label()))
}

/// Roles created for this context, in output order.
pub fn enabled_roles(ctx: &TargetContext) -> Vec<OwnedRoleKind> {
    OwnedRoleKind::ALL
        .iter()
        .copied()
        .filter(|kind| kind.gate().map_or(true, |c| ctx.is_enabled(c)))
        .collect()
}

pub fn build_role_group(ctx: &TargetContext) -> Result<PhaseGroup, GraphError> {
    let factory = PolicyStatementFactory::new(ctx);
    let nodes = enabled_roles(ctx)
        .into_iter()
        .map(|kind| role_node(&factory, kind))
        .collect();
    PhaseGroup::new(Phase::Roles, nodes)
}

fn role_node(factory: &PolicyStatementFactory<'_>, kind: OwnedRoleKind) -> ResourceNode {
    let (trust, policies): (PolicyStatement, Vec<(&str, Vec<PolicyStatement>)>) = match kind {
        OwnedRoleKind::Handshake => (
            factory.trust_statement(),
            vec![
                ("assume-roles", vec![factory.assume_default_bootstrap_roles()]),
                ("describe-azs", vec![factory.describe_availability_zones()]),
                ("simulate-principals", vec![factory.simulate_default_bootstrap_roles()]),
                ("access-assets", vec![factory.access_default_assets()]),
                ("get-service-quotas", vec![factory.quota_and_diagnostics()]),
                ("read-secrets", vec![factory.read_secrets()]),
                ("get-hosted-zone-info", vec![factory.hosted_zone_info()]),
                ("access-ecr", factory.access_default_container_registry()),
            ],
        ),
        OwnedRoleKind::Lookup => (
            factory.trusted_by_handshake(),
            vec![
                ("lookup-resources", vec![factory.lookup_resources()]),
                ("read-version", vec![factory.read_version_parameter()]),
            ],
        ),
        OwnedRoleKind::Assets => (
            factory.trusted_by_handshake(),
            vec![("write-assets", vec![factory.write_assets()])],
        ),
        OwnedRoleKind::Images => (
            factory.trusted_by_handshake(),
            vec![("push-images", factory.push_images())],
        ),
        OwnedRoleKind::Deploy => (
            factory.trusted_by_handshake(),
            vec![
                ("manage-stacks", vec![factory.manage_stacks()]),
                ("pass-exec-roles", vec![factory.pass_exec_roles()]),
                ("read-assets", vec![factory.read_assets()]),
                ("read-version", vec![factory.read_version_parameter()]),
            ],
        ),
        OwnedRoleKind::Exec => (
            factory.trusted_by_cloudformation(),
            vec![
                ("pull-images", factory.pull_images()),
                ("read-assets", vec![factory.read_assets()]),
                ("read-secrets", vec![factory.read_secrets()]),
            ],
        ),
        OwnedRoleKind::DruidExec => (
            factory.trusted_by_cloudformation(),
            vec![
                ("pull-images", factory.pull_images()),
                ("deep-storage", vec![factory.druid_deep_storage()]),
                ("read-secrets", vec![factory.druid_secrets()]),
            ],
        ),
        OwnedRoleKind::WebappExec => (
            factory.trusted_by_cloudformation(),
            vec![
                ("pull-images", factory.pull_images()),
                ("publish-content", vec![factory.webapp_content()]),
                ("invalidate-cache", vec![factory.webapp_invalidation()]),
            ],
        ),
    };

    let names = factory.names();
    let inline_policies = policies
        .into_iter()
        .map(|(verb, statements)| {
            PolicyDocument::new(names.inline_policy_name(kind, verb), PolicyKind::Identity, statements)
        })
        .collect();

    ResourceNode {
        id: role_node_id(kind),
        kind: ResourceKind::Role,
        derived_name: names.role_name(kind),
        derived_identifier: Some(names.role_arn(kind)),
        spec: ResourceSpec::Role {
            trust: PolicyDocument::new(
                format!("{}-{}-trust", names.scope(), kind.slug()),
                PolicyKind::Trust,
                vec![trust],
            ),
            inline_policies,
        },
    }
}
