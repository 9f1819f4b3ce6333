// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Name Templates
//!
//! Deterministic name and ARN derivation. Two families:
//!
//! | Family | Keyed by | Examples |
//! |--------|----------|----------|
//! | Owned | scope, tenant name, account, region | `{scope}-{name}-handshake`, `{scope}-{name-lower}` |
//! | Referenced | qualifier, account, region | `cdk-{qualifier}-deploy-role-{account}-{region}` |
//!
//! Referenced names must match the default-bootstrap convention byte for byte.
//! A mismatch does not fail here; it yields a policy that grants access to
//! nothing (see [`crate::application::preflight`]).

use serde::{Deserialize, Serialize};

use crate::domain::target::{Capability, TargetContext};

/// Qualifier used by an unmodified default bootstrap.
pub const DEFAULT_QUALIFIER: &str = "hnb659fds";

/// The five roles every default bootstrap creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BootstrapRoleKind {
    CfnExec,
    Deploy,
    FilePublishing,
    ImagePublishing,
    Lookup,
}

impl BootstrapRoleKind {
    pub const ALL: [BootstrapRoleKind; 5] = [
        BootstrapRoleKind::CfnExec,
        BootstrapRoleKind::Deploy,
        BootstrapRoleKind::FilePublishing,
        BootstrapRoleKind::ImagePublishing,
        BootstrapRoleKind::Lookup,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            BootstrapRoleKind::CfnExec => "cfn-exec",
            BootstrapRoleKind::Deploy => "deploy",
            BootstrapRoleKind::FilePublishing => "file-publishing",
            BootstrapRoleKind::ImagePublishing => "image-publishing",
            BootstrapRoleKind::Lookup => "lookup",
        }
    }
}

/// Roles this system creates in the tenant account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OwnedRoleKind {
    Handshake,
    Lookup,
    Assets,
    Images,
    Deploy,
    Exec,
    DruidExec,
    WebappExec,
}

impl OwnedRoleKind {
    pub const ALL: [OwnedRoleKind; 8] = [
        OwnedRoleKind::Handshake,
        OwnedRoleKind::Lookup,
        OwnedRoleKind::Assets,
        OwnedRoleKind::Images,
        OwnedRoleKind::Deploy,
        OwnedRoleKind::Exec,
        OwnedRoleKind::DruidExec,
        OwnedRoleKind::WebappExec,
    ];

    /// Suffix in the role name.
    pub fn slug(&self) -> &'static str {
        match self {
            OwnedRoleKind::Handshake => "handshake",
            OwnedRoleKind::Lookup => "lookup",
            OwnedRoleKind::Assets => "assets",
            OwnedRoleKind::Images => "images",
            OwnedRoleKind::Deploy => "deploy",
            OwnedRoleKind::Exec => "exec",
            OwnedRoleKind::DruidExec => "druid-exec",
            OwnedRoleKind::WebappExec => "webapp-exec",
        }
    }

    /// Key under `roles` in the output descriptor.
    pub fn label(&self) -> &'static str {
        match self {
            OwnedRoleKind::Handshake => "handshake",
            OwnedRoleKind::Lookup => "lookup",
            OwnedRoleKind::Assets => "assets",
            OwnedRoleKind::Images => "images",
            OwnedRoleKind::Deploy => "deploy",
            OwnedRoleKind::Exec => "exec",
            OwnedRoleKind::DruidExec => "druidExec",
            OwnedRoleKind::WebappExec => "webappExec",
        }
    }

    /// The capability gating this role, if any.
    pub fn gate(&self) -> Option<Capability> {
        match self {
            OwnedRoleKind::DruidExec => Some(Capability::Druid),
            OwnedRoleKind::WebappExec => Some(Capability::Webapp),
            _ => None,
        }
    }

    /// The execution role whose principal a capability is granted through.
    pub fn for_capability(capability: Capability) -> Self {
        match capability {
            Capability::All => OwnedRoleKind::Exec,
            Capability::Druid => OwnedRoleKind::DruidExec,
            Capability::Webapp => OwnedRoleKind::WebappExec,
        }
    }
}

/// Name and ARN derivation for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    scope: String,
    name: String,
    account: String,
    region: String,
    qualifier: String,
}

impl NameTemplate {
    pub fn new(
        scope: impl Into<String>,
        name: impl Into<String>,
        account: impl Into<String>,
        region: impl Into<String>,
        qualifier: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
            account: account.into(),
            region: region.into(),
            qualifier: qualifier.into(),
        }
    }

    pub fn for_target(ctx: &TargetContext) -> Self {
        Self::new(ctx.scope(), ctx.name(), ctx.account(), ctx.region(), ctx.qualifier())
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    // ------------------------------------------------------------------
    // Owned resources
    // ------------------------------------------------------------------

    /// `{scope}-{name-lower}`, shared by the bucket, the registry and the key alias.
    pub fn storage_name(&self) -> String {
        format!("{}-{}", self.scope, self.name.to_lowercase())
    }

    pub fn role_name(&self, kind: OwnedRoleKind) -> String {
        format!("{}-{}-{}", self.scope, self.name, kind.slug())
    }

    pub fn role_arn(&self, kind: OwnedRoleKind) -> String {
        format!("arn:aws:iam::{}:role/{}", self.account, self.role_name(kind))
    }

    /// Principal ARN a capability pulls images through.
    pub fn capability_principal_arn(&self, capability: Capability) -> String {
        self.role_arn(OwnedRoleKind::for_capability(capability))
    }

    /// `{scope}-{role}-can-{verb}`
    pub fn inline_policy_name(&self, role: OwnedRoleKind, verb: &str) -> String {
        format!("{}-{}-can-{}", self.scope, role.slug(), verb)
    }

    pub fn bucket_arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.storage_name())
    }

    pub fn bucket_objects_arn(&self, prefix: &str) -> String {
        format!("arn:aws:s3:::{}/{}*", self.storage_name(), prefix)
    }

    pub fn registry_arn(&self) -> String {
        format!(
            "arn:aws:ecr:{}:{}:repository/{}",
            self.region,
            self.account,
            self.storage_name()
        )
    }

    pub fn key_alias(&self) -> String {
        format!("alias/{}", self.storage_name())
    }

    pub fn key_alias_arn(&self) -> String {
        format!("arn:aws:kms:{}:{}:{}", self.region, self.account, self.key_alias())
    }

    /// Key ARN for a key id assigned at creation.
    pub fn key_arn(&self, key_id: &str) -> String {
        format!("arn:aws:kms:{}:{}:key/{}", self.region, self.account, key_id)
    }

    pub fn parameter_name(&self) -> String {
        format!("/cdk/{}-{}/version", self.scope, self.name)
    }

    pub fn parameter_arn(&self) -> String {
        format!(
            "arn:aws:ssm:{}:{}:parameter{}",
            self.region,
            self.account,
            self.parameter_name()
        )
    }

    pub fn secrets_pattern(&self, suffix: &str) -> String {
        format!(
            "arn:aws:secretsmanager:{}:{}:secret:{}*{}*{}",
            self.region, self.account, self.scope, self.name, suffix
        )
    }

    pub fn stack_pattern(&self) -> String {
        format!(
            "arn:aws:cloudformation:{}:{}:stack/{}-{}*/*",
            self.region, self.account, self.scope, self.name
        )
    }

    // ------------------------------------------------------------------
    // Referenced default-bootstrap resources
    // ------------------------------------------------------------------

    pub fn bootstrap_role_name(&self, kind: BootstrapRoleKind) -> String {
        format!(
            "cdk-{}-{}-role-{}-{}",
            self.qualifier,
            kind.slug(),
            self.account,
            self.region
        )
    }

    pub fn bootstrap_role_arn(&self, kind: BootstrapRoleKind) -> String {
        format!("arn:aws:iam::{}:role/{}", self.account, self.bootstrap_role_name(kind))
    }

    /// ARNs of all five default-bootstrap roles in fixed order.
    pub fn bootstrap_role_arns(&self) -> Vec<String> {
        BootstrapRoleKind::ALL
            .iter()
            .map(|kind| self.bootstrap_role_arn(*kind))
            .collect()
    }

    pub fn bootstrap_assets_bucket(&self) -> String {
        format!("cdk-{}-assets-{}-{}", self.qualifier, self.account, self.region)
    }

    pub fn bootstrap_assets_arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.bootstrap_assets_bucket())
    }

    pub fn bootstrap_assets_objects_arn(&self) -> String {
        format!("arn:aws:s3:::{}/*", self.bootstrap_assets_bucket())
    }

    pub fn bootstrap_container_assets(&self) -> String {
        format!(
            "cdk-{}-container-assets-{}-{}",
            self.qualifier, self.account, self.region
        )
    }

    pub fn bootstrap_container_assets_arn(&self) -> String {
        format!(
            "arn:aws:ecr:{}:{}:repository/{}",
            self.region,
            self.account,
            self.bootstrap_container_assets()
        )
    }
}
