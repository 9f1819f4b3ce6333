// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Output Aggregator
//!
//! Copies each realized identifier into its descriptor slot. Capability-gated
//! roles that were never created become [`RoleSlot::Absent`]; every other slot
//! is required and a missing one fails the run, so a partial descriptor is
//! never produced.

use crate::application::keys::{KMS_ALIAS, KMS_KEY, SSM_PARAMETER};
use crate::application::roles::role_node_id;
use crate::application::storage::{ASSETS_BUCKET, IMAGES_REGISTRY};
use crate::application::synthesizer::SynthesisError;
use crate::domain::naming::{BootstrapRoleKind, NameTemplate, OwnedRoleKind};
use crate::domain::output::{
    BootstrapReferences, BootstrapRoleReferences, BootstrapStorageReferences, KeyOutputs,
    KmsOutputs, OutputDescriptor, RoleOutputs, RoleSlot, SsmOutputs, StorageOutputs,
};
use crate::domain::resource::{NodeId, RealizedIndex};

pub struct OutputAggregator<'a> {
    names: &'a NameTemplate,
    realized: &'a RealizedIndex,
}

impl<'a> OutputAggregator<'a> {
    pub fn new(names: &'a NameTemplate, realized: &'a RealizedIndex) -> Self {
        Self { names, realized }
    }

    pub fn aggregate(&self) -> Result<OutputDescriptor, SynthesisError> {
        Ok(OutputDescriptor {
            roles: RoleOutputs {
                handshake: self.role(OwnedRoleKind::Handshake)?,
                lookup: self.role(OwnedRoleKind::Lookup)?,
                assets: self.role(OwnedRoleKind::Assets)?,
                images: self.role(OwnedRoleKind::Images)?,
                deploy: self.role(OwnedRoleKind::Deploy)?,
                exec: self.role(OwnedRoleKind::Exec)?,
                druid_exec: self.optional_role(OwnedRoleKind::DruidExec),
                webapp_exec: self.optional_role(OwnedRoleKind::WebappExec),
            },
            storage: StorageOutputs {
                assets: self.required(&NodeId::new(ASSETS_BUCKET))?,
                images: self.required(&NodeId::new(IMAGES_REGISTRY))?,
            },
            keys: KeyOutputs {
                kms: KmsOutputs {
                    key: self.required(&NodeId::new(KMS_KEY))?,
                    alias: self.required(&NodeId::new(KMS_ALIAS))?,
                },
                ssm: SsmOutputs {
                    parameter: self.required(&NodeId::new(SSM_PARAMETER))?,
                },
            },
            cdk: self.references(),
        })
    }

    fn required(&self, id: &NodeId) -> Result<String, SynthesisError> {
        self.realized
            .identifier(id)
            .map(str::to_string)
            .ok_or_else(|| SynthesisError::MissingResource(id.clone()))
    }

    fn role(&self, kind: OwnedRoleKind) -> Result<String, SynthesisError> {
        self.required(&role_node_id(kind))
    }

    fn optional_role(&self, kind: OwnedRoleKind) -> RoleSlot {
        self.realized
            .identifier(&role_node_id(kind))
            .map(str::to_string)
            .into()
    }

    fn references(&self) -> BootstrapReferences {
        let names = self.names;
        BootstrapReferences {
            roles: BootstrapRoleReferences {
                cfn_exec: names.bootstrap_role_arn(BootstrapRoleKind::CfnExec),
                deploy: names.bootstrap_role_arn(BootstrapRoleKind::Deploy),
                file_publishing: names.bootstrap_role_arn(BootstrapRoleKind::FilePublishing),
                image_publishing: names.bootstrap_role_arn(BootstrapRoleKind::ImagePublishing),
                lookup: names.bootstrap_role_arn(BootstrapRoleKind::Lookup),
            },
            storage: BootstrapStorageReferences {
                assets: names.bootstrap_assets_arn(),
                container_assets: names.bootstrap_container_assets_arn(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resource::{RealizedResource, ResourceHandle, ResourceKind};
    use chrono::Utc;
    use serde_json::json;

    fn realized(id: &str, kind: ResourceKind) -> RealizedResource {
        RealizedResource {
            node_id: NodeId::new(id),
            kind,
            identifier: format!("arn:test:{}", id),
            handle: ResourceHandle {
                physical_id: id.to_string(),
                realized_at: Utc::now(),
            },
        }
    }

    fn full_index(with: &[OwnedRoleKind]) -> RealizedIndex {
        let mut index = RealizedIndex::new();
        for kind in with {
            index.insert(realized(role_node_id(*kind).as_str(), ResourceKind::Role));
        }
        index.insert(realized(ASSETS_BUCKET, ResourceKind::Bucket));
        index.insert(realized(IMAGES_REGISTRY, ResourceKind::Registry));
        index.insert(realized(KMS_KEY, ResourceKind::Key));
        index.insert(realized(KMS_ALIAS, ResourceKind::Alias));
        index.insert(realized(SSM_PARAMETER, ResourceKind::Parameter));
        index
    }

    const BASE_ROLES: [OwnedRoleKind; 6] = [
        OwnedRoleKind::Handshake,
        OwnedRoleKind::Lookup,
        OwnedRoleKind::Assets,
        OwnedRoleKind::Images,
        OwnedRoleKind::Deploy,
        OwnedRoleKind::Exec,
    ];

    #[test]
    fn test_gated_roles_become_null() {
        let names = NameTemplate::new("fastish", "acme", "123456789012", "us-east-1", "hnb659fds");
        let index = full_index(&BASE_ROLES);
        let descriptor = OutputAggregator::new(&names, &index).aggregate().unwrap();

        assert_eq!(descriptor.roles.druid_exec, RoleSlot::Absent);
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["roles"]["druidExec"], json!(null));
        assert_eq!(value["roles"]["webappExec"], json!(null));
        assert_eq!(value["keys"]["kms"]["alias"], json!("arn:test:keys.kms.alias"));
        assert_eq!(
            value["cdk"]["storage"]["assets"],
            json!("arn:aws:s3:::cdk-hnb659fds-assets-123456789012-us-east-1")
        );
    }

    #[test]
    fn test_missing_required_resource_fails() {
        let names = NameTemplate::new("fastish", "acme", "123456789012", "us-east-1", "hnb659fds");
        let index = full_index(&BASE_ROLES[..5]);
        let err = OutputAggregator::new(&names, &index).aggregate().unwrap_err();
        assert!(matches!(err, SynthesisError::MissingResource(id) if id.as_str() == "roles.exec"));
    }
}
