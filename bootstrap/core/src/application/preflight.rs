// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Pre-flight Reference Check
//!
//! The default-bootstrap roles, bucket and registry are referenced by name
//! only; their existence cannot be verified here. What can be checked is that
//! the names were built from inputs matching the bootstrap convention. A
//! mismatch means the synthesized policies point at nothing.

use regex::Regex;
use std::fmt;

use crate::domain::naming::{NameTemplate, DEFAULT_QUALIFIER};

const ACCOUNT_PATTERN: &str = r"^\d{12}$";
const REGION_PATTERN: &str = r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-\d+$";

/// A referenced default-bootstrap name that does not follow the convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub reference: String,
    pub reason: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reference, self.reason)
    }
}

pub struct ReferenceConvention {
    account: Regex,
    region: Regex,
}

impl ReferenceConvention {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            account: Regex::new(ACCOUNT_PATTERN)?,
            region: Regex::new(REGION_PATTERN)?,
        })
    }

    /// Every referenced default-bootstrap identifier paired with each
    /// convention it violates. Empty when all references are well-formed.
    pub fn check(&self, names: &NameTemplate) -> Vec<DanglingReference> {
        let mut reasons = Vec::new();
        if !self.account.is_match(names.account()) {
            reasons.push(format!("account '{}' is not a 12-digit id", names.account()));
        }
        if !self.region.is_match(names.region()) {
            reasons.push(format!("region '{}' is not a region code", names.region()));
        }
        if names.qualifier() != DEFAULT_QUALIFIER {
            reasons.push(format!(
                "qualifier '{}' differs from default '{}'",
                names.qualifier(),
                DEFAULT_QUALIFIER
            ));
        }
        if reasons.is_empty() {
            return Vec::new();
        }

        let mut references = names.bootstrap_role_arns();
        references.push(names.bootstrap_assets_arn());
        references.push(names.bootstrap_container_assets_arn());

        references
            .into_iter()
            .flat_map(|reference| {
                reasons.iter().map(move |reason| DanglingReference {
                    reference: reference.clone(),
                    reason: reason.clone(),
                })
            })
            .collect()
    }
}
