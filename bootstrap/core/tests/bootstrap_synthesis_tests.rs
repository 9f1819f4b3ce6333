// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end synthesis against the in-memory provisioner.
//!
//! Covers the observable contract of a run:
//! - descriptor keys and absent markers for disabled capabilities
//! - registry principals matching exactly the enabled capabilities
//! - idempotence across runs
//! - principal derivation independent of phase build order
//! - strict pre-flight aborting before anything is realized

use fastish_bootstrap_core::application::keys::{build_keys_group, key_edges};
use fastish_bootstrap_core::application::roles::build_role_group;
use fastish_bootstrap_core::application::storage::{build_storage_group, storage_edges, IMAGES_REGISTRY};
use fastish_bootstrap_core::application::{BootstrapSynthesizer, SynthesisError};
use fastish_bootstrap_core::domain::graph::ResourceGraph;
use fastish_bootstrap_core::domain::policy::Principal;
use fastish_bootstrap_core::domain::resource::NodeId;
use fastish_bootstrap_core::domain::target::{RawTargetContext, TargetContext};
use fastish_bootstrap_core::infrastructure::{BootstrapContextManifest, InMemoryProvisioner};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

fn raw(releases: &[&str]) -> RawTargetContext {
    RawTargetContext {
        account: Some("123456789012".to_string()),
        region: Some("us-east-1".to_string()),
        name: Some("acme".to_string()),
        external_id: Some("ext-1".to_string()),
        subscriber_role_arn: Some("arn:aws:iam::111111111111:role/sub".to_string()),
        releases: releases.iter().map(|r| r.to_string()).collect(),
        host_account: Some("111111111111".to_string()),
        ..Default::default()
    }
}

fn context(releases: &[&str]) -> TargetContext {
    TargetContext::resolve(raw(releases)).unwrap()
}

fn synthesizer(ctx: &TargetContext) -> BootstrapSynthesizer {
    BootstrapSynthesizer::new(Arc::new(InMemoryProvisioner::for_target(ctx)))
}

fn registry_principals(graph: &ResourceGraph) -> Vec<String> {
    graph
        .node(&NodeId::new(IMAGES_REGISTRY))
        .unwrap()
        .statements()
        .flat_map(|s| s.principals.iter())
        .map(|p| match p {
            Principal::Arn(arn) => arn.clone(),
            other => panic!("unexpected registry principal {:?}", other),
        })
        .collect()
}

#[tokio::test]
async fn test_webapp_tenant_descriptor() {
    let ctx = context(&["webapp"]);
    let outcome = synthesizer(&ctx).synthesize(&ctx).await.unwrap();

    let published = outcome.descriptor.publishable().unwrap();
    let roles = &published["fastish"]["roles"];
    assert_eq!(
        roles["webappExec"],
        json!("arn:aws:iam::123456789012:role/fastish-acme-webapp-exec")
    );
    assert_eq!(roles["druidExec"], json!(null));
    assert_eq!(
        roles["handshake"],
        json!("arn:aws:iam::123456789012:role/fastish-acme-handshake")
    );

    let storage = &published["fastish"]["storage"];
    assert_eq!(storage["assets"], json!("arn:aws:s3:::fastish-acme"));
    assert_eq!(
        storage["images"],
        json!("arn:aws:ecr:us-east-1:123456789012:repository/fastish-acme")
    );

    let keys = &published["fastish"]["keys"];
    assert!(keys["kms"]["key"]
        .as_str()
        .unwrap()
        .starts_with("arn:aws:kms:us-east-1:123456789012:key/"));
    assert_eq!(
        keys["kms"]["alias"],
        json!("arn:aws:kms:us-east-1:123456789012:alias/fastish-acme")
    );
    assert_eq!(
        keys["ssm"]["parameter"],
        json!("arn:aws:ssm:us-east-1:123456789012:parameter/cdk/fastish-acme/version")
    );

    let principals = registry_principals(&outcome.graph);
    assert_eq!(principals.len(), 1);
    assert!(principals[0].ends_with("-webapp-exec"));
}

#[tokio::test]
async fn test_no_releases_yields_absent_slots_and_empty_grant() {
    let ctx = context(&[]);
    let outcome = synthesizer(&ctx).synthesize(&ctx).await.unwrap();

    assert!(!outcome.descriptor.roles.druid_exec.is_present());
    assert!(!outcome.descriptor.roles.webapp_exec.is_present());
    assert!(registry_principals(&outcome.graph).is_empty());

    let registry = outcome.graph.node(&NodeId::new(IMAGES_REGISTRY)).unwrap();
    let rendered = registry.attached_policies()[0].render();
    assert_eq!(rendered["Statement"].as_array().unwrap().len(), 1);
    assert_eq!(rendered["Statement"][0]["Principal"], json!({}));
}

#[tokio::test]
async fn test_every_capability_has_one_principal() {
    let ctx = context(&["all", "druid", "webapp"]);
    let outcome = synthesizer(&ctx).synthesize(&ctx).await.unwrap();

    assert_eq!(
        registry_principals(&outcome.graph),
        vec![
            "arn:aws:iam::123456789012:role/fastish-acme-exec",
            "arn:aws:iam::123456789012:role/fastish-acme-druid-exec",
            "arn:aws:iam::123456789012:role/fastish-acme-webapp-exec",
        ]
    );
    assert!(outcome.descriptor.roles.druid_exec.is_present());
    assert_eq!(outcome.realized.len(), 13);
}

#[tokio::test]
async fn test_repeated_synthesis_is_identical() {
    let ctx = context(&["druid"]);
    let first = synthesizer(&ctx).synthesize(&ctx).await.unwrap();
    let second = synthesizer(&ctx).synthesize(&ctx).await.unwrap();

    assert_eq!(first.descriptor, second.descriptor);
    assert_eq!(
        first.descriptor.to_json_string(false).unwrap(),
        second.descriptor.to_json_string(false).unwrap()
    );
    assert_eq!(first.graph, second.graph);
}

#[test]
fn test_principals_independent_of_build_order() {
    let ctx = context(&["webapp"]);

    let mut storage_first = ResourceGraph::new();
    storage_first.insert_group(build_storage_group(&ctx).unwrap()).unwrap();
    storage_first.insert_group(build_keys_group(&ctx).unwrap()).unwrap();
    storage_first.insert_group(build_role_group(&ctx).unwrap()).unwrap();
    for edge in storage_edges().into_iter().chain(key_edges()) {
        storage_first.add_edge(edge).unwrap();
    }

    let planned = synthesizer(&ctx).plan(&ctx).unwrap();
    assert_eq!(registry_principals(&storage_first), registry_principals(&planned));
    assert_eq!(storage_first.realization_order(), planned.realization_order());
}

#[tokio::test]
async fn test_strict_preflight_rejects_custom_qualifier() {
    let mut raw = raw(&["webapp"]);
    raw.qualifier = Some("custom".to_string());
    let ctx = TargetContext::resolve(raw).unwrap();
    let provisioner = Arc::new(InMemoryProvisioner::for_target(&ctx));

    let err = BootstrapSynthesizer::new(provisioner.clone())
        .with_strict_preflight(true)
        .synthesize(&ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, SynthesisError::DanglingReference(_)));
    assert_eq!(provisioner.len().await, 0);

    let outcome = BootstrapSynthesizer::new(provisioner)
        .synthesize(&ctx)
        .await
        .unwrap();
    assert_eq!(
        outcome.descriptor.cdk.roles.deploy,
        "arn:aws:iam::123456789012:role/cdk-custom-deploy-role-123456789012-us-east-1"
    );
}

#[tokio::test]
async fn test_manifest_file_to_descriptor() {
    let manifest = r#"
apiVersion: fastish.io/v1
kind: BootstrapContext
metadata:
  name: acme
spec:
  host:
    account: "111111111111"
  subscriber:
    account: "123456789012"
    region: eu-west-1
    name: Acme
    externalId: ext-1
    subscriberRoleArn: arn:aws:iam::111111111111:role/sub
    releases: [druid]
  scope: platform
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(manifest.as_bytes()).unwrap();

    let manifest = BootstrapContextManifest::from_yaml_file(file.path()).unwrap();
    manifest.validate().unwrap();
    let ctx = manifest.resolve().unwrap();
    let outcome = synthesizer(&ctx).synthesize(&ctx).await.unwrap();

    assert_eq!(
        outcome.descriptor.roles.druid_exec.arn(),
        Some("arn:aws:iam::123456789012:role/platform-Acme-druid-exec")
    );
    assert_eq!(outcome.descriptor.storage.assets, "arn:aws:s3:::platform-acme");
}
