// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Output Descriptor
//!
//! The single externally observable artifact of a run: every created
//! resource's identifier, grouped by category, plus the default-bootstrap
//! identifiers the policies reference. Key names are a consumer contract.
//!
//! ```json
//! {
//!   "roles":   { "handshake": "...", "druidExec": null, ... },
//!   "storage": { "assets": "...", "images": "..." },
//!   "keys":    { "kms": { "key": "...", "alias": "..." }, "ssm": { "parameter": "..." } },
//!   "cdk":     { "roles": { "cfnExec": "...", ... }, "storage": { ... } }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key the descriptor is published under.
pub const OUTPUT_KEY: &str = "fastish";

/// A capability-gated role: present with its ARN, or explicitly absent.
///
/// Serializes as the ARN string or `null`; the key is never omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum RoleSlot {
    Present(String),
    Absent,
}

impl RoleSlot {
    pub fn is_present(&self) -> bool {
        matches!(self, RoleSlot::Present(_))
    }

    pub fn arn(&self) -> Option<&str> {
        match self {
            RoleSlot::Present(arn) => Some(arn),
            RoleSlot::Absent => None,
        }
    }
}

impl From<Option<String>> for RoleSlot {
    fn from(value: Option<String>) -> Self {
        value.map_or(RoleSlot::Absent, RoleSlot::Present)
    }
}

impl From<RoleSlot> for Option<String> {
    fn from(slot: RoleSlot) -> Self {
        match slot {
            RoleSlot::Present(arn) => Some(arn),
            RoleSlot::Absent => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleOutputs {
    pub handshake: String,
    pub lookup: String,
    pub assets: String,
    pub images: String,
    pub deploy: String,
    pub exec: String,
    pub druid_exec: RoleSlot,
    pub webapp_exec: RoleSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOutputs {
    pub assets: String,
    pub images: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmsOutputs {
    pub key: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsmOutputs {
    pub parameter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOutputs {
    pub kms: KmsOutputs,
    pub ssm: SsmOutputs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRoleReferences {
    pub cfn_exec: String,
    pub deploy: String,
    pub file_publishing: String,
    pub image_publishing: String,
    pub lookup: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapStorageReferences {
    pub assets: String,
    pub container_assets: String,
}

/// Default-bootstrap resources referenced by convention (must already exist).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReferences {
    pub roles: BootstrapRoleReferences,
    pub storage: BootstrapStorageReferences,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub roles: RoleOutputs,
    pub storage: StorageOutputs,
    pub keys: KeyOutputs,
    pub cdk: BootstrapReferences,
}

impl OutputDescriptor {
    /// `{ "fastish": <descriptor> }`
    pub fn publishable(&self) -> serde_json::Result<Value> {
        let mut wrapper = serde_json::Map::new();
        wrapper.insert(OUTPUT_KEY.to_string(), serde_json::to_value(self)?);
        Ok(Value::Object(wrapper))
    }

    pub fn to_json_string(&self, pretty: bool) -> serde_json::Result<String> {
        let value = self.publishable()?;
        if pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        }
    }
}
