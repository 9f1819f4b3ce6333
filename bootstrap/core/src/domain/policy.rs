// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Policy Value Objects
//!
//! Statements and documents in the IAM policy grammar. A [`PolicyDocument`] is
//! one named, independently attachable unit (an inline role policy, a trust
//! policy, or a resource policy); its [`PolicyKind`] decides which statement
//! shapes are legal.
//!
//! Rendering via [`PolicyDocument::render`] is deterministic: conditions are
//! kept in ordered maps and single-element lists collapse to scalars the way
//! the IAM grammar writes them.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Statement in '{0}' has no actions")]
    EmptyActions(String),

    #[error("Allow statement in '{0}' has no resources")]
    EmptyResources(String),

    #[error("Identity policy '{0}' must not name principals")]
    PrincipalInIdentityPolicy(String),

    #[error("Deny statement in '{0}' must carry an explicit condition")]
    UnconditionedDeny(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

/// Who a resource or trust statement applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    /// An IAM role or user ARN.
    Arn(String),
    /// An AWS service, e.g. `cloudformation.amazonaws.com`.
    Service(String),
    /// Every principal in an account (`arn:aws:iam::{account}:root`).
    Account(String),
    /// `*`
    Any,
}

impl Principal {
    fn grammar_key(&self) -> &'static str {
        match self {
            Principal::Service(_) => "Service",
            _ => "AWS",
        }
    }

    fn grammar_value(&self) -> String {
        match self {
            Principal::Arn(arn) => arn.clone(),
            Principal::Service(service) => service.clone(),
            Principal::Account(account) => format!("arn:aws:iam::{}:root", account),
            Principal::Any => "*".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConditionOperator {
    Bool,
    StringEquals,
    StringLike,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Bool => "Bool",
            ConditionOperator::StringEquals => "StringEquals",
            ConditionOperator::StringLike => "StringLike",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `operator -> (key -> value)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions(BTreeMap<ConditionOperator, BTreeMap<String, String>>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, operator: ConditionOperator, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(operator).or_default().insert(key.into(), value.into());
    }

    pub fn get(&self, operator: ConditionOperator, key: &str) -> Option<&str> {
        self.0.get(&operator).and_then(|m| m.get(key)).map(String::as_str)
    }

    /// Total number of key/value pins across all operators.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn render(&self) -> Value {
        let mut out = Map::new();
        for (operator, pins) in &self.0 {
            let inner: Map<String, Value> = pins
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            out.insert(operator.as_str().to_string(), Value::Object(inner));
        }
        Value::Object(out)
    }
}

/// A single permission or trust clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    pub sid: Option<String>,
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    pub principals: Vec<Principal>,
    pub conditions: Conditions,
}

impl PolicyStatement {
    pub fn new(effect: Effect, actions: &[&str]) -> Self {
        Self {
            sid: None,
            effect,
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources: Vec::new(),
            principals: Vec::new(),
            conditions: Conditions::new(),
        }
    }

    pub fn allow(actions: &[&str]) -> Self {
        Self::new(Effect::Allow, actions)
    }

    pub fn deny(actions: &[&str]) -> Self {
        Self::new(Effect::Deny, actions)
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn on<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn for_principal(mut self, principal: Principal) -> Self {
        self.principals.push(principal);
        self
    }

    pub fn for_principals(mut self, principals: impl IntoIterator<Item = Principal>) -> Self {
        self.principals.extend(principals);
        self
    }

    pub fn when(mut self, operator: ConditionOperator, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.insert(operator, key, value);
        self
    }

    /// Check the statement against the shape rules of the document it sits in.
    pub fn validate(&self, document: &str, kind: PolicyKind) -> Result<(), PolicyError> {
        if self.actions.is_empty() {
            return Err(PolicyError::EmptyActions(document.to_string()));
        }
        if kind == PolicyKind::Identity {
            if !self.principals.is_empty() {
                return Err(PolicyError::PrincipalInIdentityPolicy(document.to_string()));
            }
            if self.effect == Effect::Allow && self.resources.is_empty() {
                return Err(PolicyError::EmptyResources(document.to_string()));
            }
        }
        if self.effect == Effect::Deny && self.conditions.is_empty() {
            return Err(PolicyError::UnconditionedDeny(document.to_string()));
        }
        Ok(())
    }

    /// Render in the IAM JSON grammar.
    pub fn render(&self) -> Value {
        let mut out = Map::new();
        if let Some(sid) = &self.sid {
            out.insert("Sid".to_string(), json!(sid));
        }
        out.insert("Effect".to_string(), json!(self.effect.as_str()));
        if !self.principals.is_empty() || (self.effect == Effect::Allow && self.resources.is_empty()) {
            out.insert("Principal".to_string(), render_principals(&self.principals));
        }
        out.insert("Action".to_string(), scalar_or_list(&self.actions));
        if !self.resources.is_empty() {
            out.insert("Resource".to_string(), scalar_or_list(&self.resources));
        }
        if !self.conditions.is_empty() {
            out.insert("Condition".to_string(), self.conditions.render());
        }
        Value::Object(out)
    }
}

/// Where a document is attached, which decides the legal statement shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Inline policy attached to a role; no principals, resources required.
    Identity,
    /// Role assume-role policy.
    Trust,
    /// Policy attached to a bucket, registry or key.
    Resource,
}

/// A named, ordered list of statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    pub name: String,
    pub kind: PolicyKind,
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(name: impl Into<String>, kind: PolicyKind, statements: Vec<PolicyStatement>) -> Self {
        Self {
            name: name.into(),
            kind,
            statements,
        }
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        for statement in &self.statements {
            statement.validate(&self.name, self.kind)?;
        }
        Ok(())
    }

    pub fn render(&self) -> Value {
        json!({
            "Version": POLICY_VERSION,
            "Statement": self.statements.iter().map(PolicyStatement::render).collect::<Vec<_>>(),
        })
    }
}

impl Serialize for PolicyDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.render().serialize(serializer)
    }
}

fn scalar_or_list(items: &[String]) -> Value {
    match items {
        [single] => json!(single),
        many => json!(many),
    }
}

fn render_principals(principals: &[Principal]) -> Value {
    if principals.iter().any(|p| *p == Principal::Any) {
        return json!("*");
    }
    let mut grouped: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    for principal in principals {
        grouped
            .entry(principal.grammar_key())
            .or_default()
            .push(principal.grammar_value());
    }
    let out: Map<String, Value> = grouped
        .into_iter()
        .map(|(key, values)| (key.to_string(), scalar_or_list(&values)))
        .collect();
    Value::Object(out)
}
