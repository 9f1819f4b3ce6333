// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Policy Statement Factory
//!
//! The fixed catalogue of trust and permission statements, parameterized by a
//! [`TargetContext`]. Every method is a pure function of the context (and, for
//! the registry grant, an explicit capability set), so statements for
//! different tenants never interfere and can be checked without building a
//! role.
//!
//! ## Principal-account pinning
//!
//! Statements touching default-bootstrap roles, bucket or registry carry
//! `aws:PrincipalAccount == tenant account`. Quota, secret and hosted-zone
//! reads are scoped by service or resource pattern instead.
//!
//! The trust statement is the only one pinned to the **host** account: it is
//! the single entry point every other permission is reached through.

use std::collections::BTreeSet;

use crate::domain::naming::{NameTemplate, OwnedRoleKind};
use crate::domain::policy::{ConditionOperator, PolicyStatement, Principal};
use crate::domain::target::{Capability, TargetContext};

pub const EXTERNAL_ID_KEY: &str = "sts:ExternalId";
pub const PRINCIPAL_ACCOUNT_KEY: &str = "aws:PrincipalAccount";
pub const SECURE_TRANSPORT_KEY: &str = "aws:SecureTransport";

pub const CLOUDFORMATION_SERVICE: &str = "cloudformation.amazonaws.com";
pub const CODEPIPELINE_SERVICE: &str = "codepipeline.amazonaws.com";
pub const CODEDEPLOY_SERVICE: &str = "codedeploy.amazonaws.com";

const ECR_PULL_ACTIONS: &[&str] = &[
    "ecr:BatchCheckLayerAvailability",
    "ecr:GetDownloadUrlForLayer",
    "ecr:BatchGetImage",
    "ecr:DescribeRepositories",
];

const ECR_PUSH_ACTIONS: &[&str] = &[
    "ecr:PutImage",
    "ecr:InitiateLayerUpload",
    "ecr:UploadLayerPart",
    "ecr:CompleteLayerUpload",
    "ecr:BatchCheckLayerAvailability",
    "ecr:GetAuthorizationToken",
    "ecr:DescribeRepositories",
];

const ASSET_ACTIONS: &[&str] = &[
    "s3:PutObject",
    "s3:GetObject",
    "s3:GetEncryptionConfiguration",
    "s3:ListBucket",
    "s3:GetBucketLocation",
];

pub struct PolicyStatementFactory<'a> {
    ctx: &'a TargetContext,
    names: NameTemplate,
}

impl<'a> PolicyStatementFactory<'a> {
    pub fn new(ctx: &'a TargetContext) -> Self {
        Self {
            ctx,
            names: NameTemplate::for_target(ctx),
        }
    }

    pub fn names(&self) -> &NameTemplate {
        &self.names
    }

    fn pinned(&self, statement: PolicyStatement) -> PolicyStatement {
        statement.when(
            ConditionOperator::StringEquals,
            PRINCIPAL_ACCOUNT_KEY,
            self.ctx.account(),
        )
    }

    // ------------------------------------------------------------------
    // Trust
    // ------------------------------------------------------------------

    /// Subscriber role may assume the handshake role, given the shared
    /// external id and a caller from the host account.
    pub fn trust_statement(&self) -> PolicyStatement {
        PolicyStatement::allow(&["sts:AssumeRole"])
            .for_principal(Principal::Arn(self.ctx.subscriber_role_arn().to_string()))
            .when(
                ConditionOperator::StringEquals,
                EXTERNAL_ID_KEY,
                self.ctx.external_id(),
            )
            .when(
                ConditionOperator::StringEquals,
                PRINCIPAL_ACCOUNT_KEY,
                &self.ctx.host().account,
            )
    }

    /// Trust for roles reached through the handshake role.
    pub fn trusted_by_handshake(&self) -> PolicyStatement {
        self.pinned(
            PolicyStatement::allow(&["sts:AssumeRole"])
                .for_principal(Principal::Arn(self.names.role_arn(OwnedRoleKind::Handshake))),
        )
    }

    /// Trust for execution roles, which the deploy role passes to CloudFormation.
    pub fn trusted_by_cloudformation(&self) -> PolicyStatement {
        PolicyStatement::allow(&["sts:AssumeRole"])
            .for_principal(Principal::Service(CLOUDFORMATION_SERVICE.to_string()))
    }

    // ------------------------------------------------------------------
    // Handshake permissions
    // ------------------------------------------------------------------

    pub fn assume_default_bootstrap_roles(&self) -> PolicyStatement {
        self.pinned(PolicyStatement::allow(&["sts:AssumeRole"]).on(self.names.bootstrap_role_arns()))
    }

    pub fn simulate_default_bootstrap_roles(&self) -> PolicyStatement {
        self.pinned(
            PolicyStatement::allow(&["iam:SimulatePrincipalPolicy"])
                .on(self.names.bootstrap_role_arns()),
        )
    }

    pub fn describe_availability_zones(&self) -> PolicyStatement {
        self.pinned(PolicyStatement::allow(&["ec2:DescribeAvailabilityZones"]).on(["*"]))
    }

    pub fn access_default_assets(&self) -> PolicyStatement {
        self.pinned(PolicyStatement::allow(ASSET_ACTIONS).on([
            self.names.bootstrap_assets_arn(),
            self.names.bootstrap_assets_objects_arn(),
        ]))
    }

    pub fn access_default_container_registry(&self) -> Vec<PolicyStatement> {
        vec![
            self.pinned(
                PolicyStatement::allow(ECR_PUSH_ACTIONS)
                    .on([self.names.bootstrap_container_assets_arn()]),
            ),
            self.pinned(PolicyStatement::allow(&["ecr:GetAuthorizationToken"]).on(["*"])),
        ]
    }

    pub fn quota_and_diagnostics(&self) -> PolicyStatement {
        PolicyStatement::allow(&["servicequotas:GetServiceQuota"]).on(["*"])
    }

    pub fn read_secrets(&self) -> PolicyStatement {
        PolicyStatement::allow(&["secretsmanager:GetSecretValue", "secretsmanager:DescribeSecret"])
            .on([self.names.secrets_pattern("")])
    }

    pub fn hosted_zone_info(&self) -> PolicyStatement {
        PolicyStatement::allow(&["route53:GetHostedZone", "route53:GetHealthCheckStatus"])
            .on(["arn:aws:route53:::hostedzone/*"])
    }

    // ------------------------------------------------------------------
    // Owned role permissions
    // ------------------------------------------------------------------

    pub fn read_version_parameter(&self) -> PolicyStatement {
        PolicyStatement::allow(&["ssm:GetParameter", "ssm:GetParameters"])
            .on([self.names.parameter_arn()])
    }

    pub fn lookup_resources(&self) -> PolicyStatement {
        self.pinned(
            PolicyStatement::allow(&[
                "cloudformation:DescribeStacks",
                "cloudformation:ListStacks",
                "ec2:DescribeVpcs",
                "ec2:DescribeSubnets",
                "ec2:DescribeAvailabilityZones",
                "route53:ListHostedZonesByName",
            ])
            .on(["*"]),
        )
    }

    pub fn write_assets(&self) -> PolicyStatement {
        PolicyStatement::allow(ASSET_ACTIONS).on([
            self.names.bucket_arn(),
            self.names.bucket_objects_arn(""),
        ])
    }

    pub fn read_assets(&self) -> PolicyStatement {
        PolicyStatement::allow(&["s3:GetObject", "s3:ListBucket"]).on([
            self.names.bucket_arn(),
            self.names.bucket_objects_arn(""),
        ])
    }

    pub fn push_images(&self) -> Vec<PolicyStatement> {
        vec![
            PolicyStatement::allow(ECR_PUSH_ACTIONS).on([self.names.registry_arn()]),
            PolicyStatement::allow(&["ecr:GetAuthorizationToken"]).on(["*"]),
        ]
    }

    pub fn pull_images(&self) -> Vec<PolicyStatement> {
        vec![
            PolicyStatement::allow(ECR_PULL_ACTIONS).on([self.names.registry_arn()]),
            PolicyStatement::allow(&["ecr:GetAuthorizationToken"]).on(["*"]),
        ]
    }

    pub fn manage_stacks(&self) -> PolicyStatement {
        PolicyStatement::allow(&[
            "cloudformation:CreateChangeSet",
            "cloudformation:DescribeChangeSet",
            "cloudformation:ExecuteChangeSet",
            "cloudformation:DeleteChangeSet",
            "cloudformation:DescribeStacks",
            "cloudformation:DescribeStackEvents",
            "cloudformation:GetTemplate",
            "cloudformation:DeleteStack",
        ])
        .on([self.names.stack_pattern()])
    }

    /// PassRole on the general execution role plus each enabled capability role.
    pub fn pass_exec_roles(&self) -> PolicyStatement {
        let roles = OwnedRoleKind::ALL
            .iter()
            .filter(|kind| matches!(kind, OwnedRoleKind::Exec) || kind.gate().is_some_and(|c| self.ctx.is_enabled(c)))
            .map(|kind| self.names.role_arn(*kind));
        PolicyStatement::allow(&["iam:PassRole"])
            .on(roles)
            .when(ConditionOperator::StringEquals, "iam:PassedToService", CLOUDFORMATION_SERVICE)
    }

    pub fn druid_deep_storage(&self) -> PolicyStatement {
        PolicyStatement::allow(&["s3:GetObject", "s3:PutObject", "s3:DeleteObject", "s3:ListBucket"]).on([
            self.names.bucket_arn(),
            self.names.bucket_objects_arn("druid/"),
        ])
    }

    pub fn druid_secrets(&self) -> PolicyStatement {
        PolicyStatement::allow(&["secretsmanager:GetSecretValue"])
            .on([self.names.secrets_pattern("druid*")])
    }

    pub fn webapp_content(&self) -> PolicyStatement {
        PolicyStatement::allow(&["s3:GetObject", "s3:PutObject", "s3:ListBucket"]).on([
            self.names.bucket_arn(),
            self.names.bucket_objects_arn("webapp/"),
        ])
    }

    pub fn webapp_invalidation(&self) -> PolicyStatement {
        PolicyStatement::allow(&["cloudfront:CreateInvalidation", "cloudfront:GetInvalidation"])
            .on([format!("arn:aws:cloudfront::{}:distribution/*", self.ctx.account())])
    }

    // ------------------------------------------------------------------
    // Resource policies
    // ------------------------------------------------------------------

    /// Pull access for the execution role of each enabled capability.
    ///
    /// Principals follow the fixed `all`, `druid`, `webapp` order. An empty
    /// capability set yields a statement with no principals, which attaches
    /// but grants nothing.
    pub fn registry_pull_grant(&self, enabled: &BTreeSet<Capability>) -> PolicyStatement {
        let principals = Capability::ALL
            .iter()
            .filter(|c| enabled.contains(c))
            .map(|c| Principal::Arn(self.names.capability_principal_arn(*c)));
        PolicyStatement::allow(ECR_PULL_ACTIONS).for_principals(principals)
    }

    /// Deny every non-TLS request to the assets bucket.
    pub fn bucket_transport_enforcement(&self) -> PolicyStatement {
        let bucket = self.names.storage_name();
        PolicyStatement::deny(&["s3:*"])
            .with_sid(format!("{}-ownership", bucket))
            .on([self.names.bucket_arn(), format!("arn:aws:s3:::{}/*", bucket)])
            .for_principal(Principal::Any)
            .when(ConditionOperator::Bool, SECURE_TRANSPORT_KEY, "false")
    }

    pub fn key_service_usage(&self) -> PolicyStatement {
        PolicyStatement::allow(&["kms:Decrypt", "kms:Encrypt", "kms:GenerateDataKey", "kms:DescribeKey"])
            .on(["*"])
            .for_principals([
                Principal::Service(CLOUDFORMATION_SERVICE.to_string()),
                Principal::Service(CODEPIPELINE_SERVICE.to_string()),
                Principal::Service(CODEDEPLOY_SERVICE.to_string()),
            ])
    }

    pub fn key_account_administration(&self) -> PolicyStatement {
        PolicyStatement::allow(&["kms:*"])
            .on(["*"])
            .for_principal(Principal::Account(self.ctx.account().to_string()))
    }
}
