// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Target Context
//!
//! The resolved, validated view of the subscriber tenant that every policy and
//! name in this crate is derived from. A [`TargetContext`] is produced once per
//! run by [`TargetContext::resolve`] and is immutable afterwards.
//!
//! ## Validation Rules
//!
//! - `account`, `region`, `name`, `externalId`, `subscriberRoleArn` and the host
//!   account must be present and non-blank.
//! - Every `releases` entry must be one of `all`, `druid`, `webapp`
//!   (case-insensitive). Duplicates collapse; an empty list is valid.
//! - `scope` defaults to [`DEFAULT_SCOPE`], `qualifier` to
//!   [`crate::domain::naming::DEFAULT_QUALIFIER`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::naming::DEFAULT_QUALIFIER;

/// Resource prefix used when the context does not name one.
pub const DEFAULT_SCOPE: &str = "fastish";

/// Version written to the version parameter when none is configured.
pub const DEFAULT_VERSION: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("Configuration error: '{field}' {reason}")]
    Configuration {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Unknown capability '{0}': expected one of all, druid, webapp")]
    UnknownCapability(String),
}

/// An optional workload type (a "release") the subscriber has enabled.
///
/// The derived ordering (`All < Druid < Webapp`) is the fixed order in which
/// capability principals are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    All,
    Druid,
    Webapp,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::All, Capability::Druid, Capability::Webapp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::All => "all",
            Capability::Druid => "druid",
            Capability::Webapp => "webapp",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Capability::All),
            "druid" => Ok(Capability::Druid),
            "webapp" => Ok(Capability::Webapp),
            _ => Err(ContextError::UnknownCapability(s.to_string())),
        }
    }
}

/// The central platform account granted trust into the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContext {
    pub account: String,
}

/// Unvalidated context fields as they arrive from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTargetContext {
    pub account: Option<String>,
    pub region: Option<String>,
    pub name: Option<String>,
    pub external_id: Option<String>,
    pub subscriber_role_arn: Option<String>,
    pub releases: Vec<String>,
    pub version: Option<String>,
    pub host_account: Option<String>,
    pub scope: Option<String>,
    pub qualifier: Option<String>,
}

/// Resolved tenant identity and capability flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetContext {
    account: String,
    region: String,
    name: String,
    external_id: String,
    subscriber_role_arn: String,
    releases: BTreeSet<Capability>,
    version: String,
    host: HostContext,
    scope: String,
    qualifier: String,
}

impl TargetContext {
    /// Validate raw configuration into a context.
    ///
    /// # Errors
    ///
    /// - `Configuration`: a required field is missing or blank
    /// - `UnknownCapability`: a `releases` entry is outside the enumerated set
    pub fn resolve(raw: RawTargetContext) -> Result<Self, ContextError> {
        let account = required("account", raw.account)?;
        let region = required("region", raw.region)?;
        let name = required("name", raw.name)?;
        let external_id = required("externalId", raw.external_id)?;
        let subscriber_role_arn = required("subscriberRoleArn", raw.subscriber_role_arn)?;
        let host_account = required("host.account", raw.host_account)?;

        let releases = raw
            .releases
            .iter()
            .map(|r| r.parse::<Capability>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        let scope = optional("scope", raw.scope)?.unwrap_or_else(|| DEFAULT_SCOPE.to_string());
        let qualifier =
            optional("qualifier", raw.qualifier)?.unwrap_or_else(|| DEFAULT_QUALIFIER.to_string());
        let version = optional("version", raw.version)?.unwrap_or_else(|| DEFAULT_VERSION.to_string());

        Ok(Self {
            account,
            region,
            name,
            external_id,
            subscriber_role_arn,
            releases,
            version,
            host: HostContext {
                account: host_account,
            },
            scope,
            qualifier,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn subscriber_role_arn(&self) -> &str {
        &self.subscriber_role_arn
    }

    /// Enabled capabilities in fixed `all`, `druid`, `webapp` order.
    pub fn releases(&self) -> &BTreeSet<Capability> {
        &self.releases
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.releases.contains(&capability)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn host(&self) -> &HostContext {
        &self.host
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ContextError> {
    match value {
        None => Err(ContextError::Configuration {
            field,
            reason: "is missing",
        }),
        Some(v) if v.trim().is_empty() => Err(ContextError::Configuration {
            field,
            reason: "must not be empty",
        }),
        Some(v) => Ok(v.trim().to_string()),
    }
}

fn optional(field: &'static str, value: Option<String>) -> Result<Option<String>, ContextError> {
    value.map(|v| required(field, Some(v))).transpose()
}
