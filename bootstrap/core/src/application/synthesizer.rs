// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bootstrap Synthesizer
//!
//! Application service that turns a resolved [`TargetContext`] into realized
//! resources and one [`OutputDescriptor`].
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Orchestrate build, realization and aggregation
//! - **Collaborators:**
//!   - Domain: ResourceGraph, NameTemplate, OutputDescriptor
//!   - Infrastructure: ResourceProvisioner implementations
//!
//! # Flow
//!
//! 1. Pre-flight check of default-bootstrap references
//! 2. Build role, storage and key phase groups, then the edges between them
//! 3. Realize stage by stage; nodes within one stage run concurrently
//! 4. Aggregate realized identifiers into the descriptor
//!
//! Any error aborts the run before a descriptor exists.

use futures::future::try_join_all;
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::aggregator::OutputAggregator;
use crate::application::keys::{build_keys_group, key_edges};
use crate::application::preflight::{DanglingReference, ReferenceConvention};
use crate::application::roles::build_role_group;
use crate::application::storage::{build_storage_group, storage_edges};
use crate::domain::graph::{GraphError, ResourceGraph};
use crate::domain::naming::NameTemplate;
use crate::domain::output::OutputDescriptor;
use crate::domain::provisioner::ResourceProvisioner;
use crate::domain::resource::{NodeId, RealizedIndex, RealizedResource};
use crate::domain::target::TargetContext;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(
        "{} default-bootstrap references do not follow the naming convention (first: {})",
        .0.len(),
        .0.first().map(ToString::to_string).unwrap_or_default()
    )]
    DanglingReference(Vec<DanglingReference>),

    #[error("Invalid reference convention: {0}")]
    Convention(#[from] regex::Error),

    #[error("Failed to realize {resource}: {source}")]
    Provisioning {
        resource: NodeId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Resource {0} was not realized")]
    MissingResource(NodeId),
}

/// Result of one successful run.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub graph: ResourceGraph,
    pub realized: RealizedIndex,
    pub descriptor: OutputDescriptor,
}

pub struct BootstrapSynthesizer {
    provisioner: Arc<dyn ResourceProvisioner>,
    strict_preflight: bool,
}

impl BootstrapSynthesizer {
    pub fn new(provisioner: Arc<dyn ResourceProvisioner>) -> Self {
        Self {
            provisioner,
            strict_preflight: false,
        }
    }

    /// Treat dangling default-bootstrap references as fatal.
    pub fn with_strict_preflight(mut self, strict: bool) -> Self {
        self.strict_preflight = strict;
        self
    }

    /// Build the full resource graph without realizing anything.
    pub fn plan(&self, ctx: &TargetContext) -> Result<ResourceGraph, SynthesisError> {
        let mut graph = ResourceGraph::new();
        graph.insert_group(build_role_group(ctx)?)?;
        graph.insert_group(build_storage_group(ctx)?)?;
        graph.insert_group(build_keys_group(ctx)?)?;
        for edge in storage_edges().into_iter().chain(key_edges()) {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    /// Default-bootstrap references that do not follow the naming convention.
    pub fn preflight(&self, names: &NameTemplate) -> Result<Vec<DanglingReference>, SynthesisError> {
        let dangling = ReferenceConvention::new()?.check(names);
        if dangling.is_empty() {
            return Ok(dangling);
        }

        if self.strict_preflight {
            return Err(SynthesisError::DanglingReference(dangling));
        }
        counter!("bootstrap_dangling_references_total").increment(dangling.len() as u64);
        for reference in &dangling {
            warn!(
                reference = %reference.reference,
                reason = %reference.reason,
                "Default-bootstrap reference may not exist"
            );
        }
        Ok(dangling)
    }

    pub async fn synthesize(&self, ctx: &TargetContext) -> Result<SynthesisOutcome, SynthesisError> {
        info!(
            account = %ctx.account(),
            region = %ctx.region(),
            tenant = %ctx.name(),
            "Synthesizing bootstrap"
        );

        let names = NameTemplate::for_target(ctx);
        self.preflight(&names)?;

        let graph = self.plan(ctx)?;
        let realized = self.realize(&graph).await?;
        let descriptor = OutputAggregator::new(&names, &realized).aggregate()?;

        info!(resources = realized.len(), "Bootstrap synthesized");
        Ok(SynthesisOutcome {
            graph,
            realized,
            descriptor,
        })
    }

    async fn realize(&self, graph: &ResourceGraph) -> Result<RealizedIndex, SynthesisError> {
        let mut index = RealizedIndex::new();

        for stage in graph.realization_order() {
            info!(phase = %stage.phase, nodes = stage.nodes.len(), "Realizing stage");

            let mut pending = Vec::with_capacity(stage.nodes.len());
            for id in &stage.nodes {
                let node = graph
                    .node(id)
                    .ok_or_else(|| SynthesisError::MissingResource(id.clone()))?;
                let dependencies: Vec<RealizedResource> = graph
                    .dependencies_of(id)
                    .iter()
                    .filter_map(|dep| index.get(dep).cloned())
                    .collect();
                let provisioner = Arc::clone(&self.provisioner);

                pending.push(async move {
                    debug!(node = %node.id, kind = %node.kind, derived_name = %node.derived_name, "Realizing resource");
                    provisioner
                        .realize(node, &dependencies)
                        .await
                        .map_err(|source| SynthesisError::Provisioning {
                            resource: node.id.clone(),
                            source,
                        })
                });
            }

            for resource in try_join_all(pending).await? {
                counter!("bootstrap_resources_realized_total", "kind" => resource.kind.as_str())
                    .increment(1);
                index.insert(resource);
            }
        }

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::Phase;
    use crate::domain::resource::{ResourceHandle, ResourceKind, ResourceNode};
    use crate::domain::target::RawTargetContext;
    use async_trait::async_trait;
    use chrono::Utc;
    use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::Mutex;

    fn ctx(account: &str) -> TargetContext {
        TargetContext::resolve(RawTargetContext {
            account: Some(account.to_string()),
            region: Some("us-east-1".to_string()),
            name: Some("acme".to_string()),
            external_id: Some("ext-1".to_string()),
            subscriber_role_arn: Some("arn:aws:iam::111111111111:role/sub".to_string()),
            releases: vec!["webapp".to_string()],
            host_account: Some("111111111111".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    /// Records the order nodes arrive in and what each one was handed.
    #[derive(Default)]
    struct RecordingProvisioner {
        calls: Mutex<Vec<(NodeId, Vec<NodeId>)>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl ResourceProvisioner for RecordingProvisioner {
        async fn realize(
            &self,
            node: &ResourceNode,
            dependencies: &[RealizedResource],
        ) -> anyhow::Result<RealizedResource> {
            if self.fail_on == Some(node.id.as_str()) {
                anyhow::bail!("quota exceeded");
            }
            self.calls.lock().await.push((
                node.id.clone(),
                dependencies.iter().map(|d| d.node_id.clone()).collect(),
            ));
            Ok(RealizedResource {
                node_id: node.id.clone(),
                kind: node.kind,
                identifier: node
                    .derived_identifier
                    .clone()
                    .unwrap_or_else(|| format!("generated:{}", node.id)),
                handle: ResourceHandle {
                    physical_id: node.derived_name.clone(),
                    realized_at: Utc::now(),
                },
            })
        }
    }

    #[test]
    fn test_plan_has_both_edges() {
        let synthesizer = BootstrapSynthesizer::new(Arc::new(RecordingProvisioner::default()));
        let graph = synthesizer.plan(&ctx("123456789012")).unwrap();
        assert_eq!(graph.edges().len(), 2);
        assert_eq!(graph.groups().count(), 3);
        assert_eq!(graph.phase_of(&NodeId::new("keys.kms.alias")), Some(Phase::Keys));
    }

    #[tokio::test]
    async fn test_registry_sees_every_role_and_alias_sees_key() {
        let provisioner = Arc::new(RecordingProvisioner::default());
        let synthesizer = BootstrapSynthesizer::new(provisioner.clone());
        synthesizer.synthesize(&ctx("123456789012")).await.unwrap();

        let calls = provisioner.calls.lock().await;
        let position = |id: &str| calls.iter().position(|(n, _)| n.as_str() == id).unwrap();
        assert!(position("roles.webappExec") < position("storage.images"));
        assert!(position("keys.kms.key") < position("keys.kms.alias"));

        let (_, registry_deps) = &calls[position("storage.images")];
        assert_eq!(registry_deps.len(), 7);
        let (_, alias_deps) = &calls[position("keys.kms.alias")];
        assert_eq!(alias_deps, &vec![NodeId::new("keys.kms.key")]);
    }

    #[tokio::test]
    async fn test_provisioning_failure_aborts_run() {
        let provisioner = Arc::new(RecordingProvisioner {
            fail_on: Some("storage.assets"),
            ..Default::default()
        });
        let synthesizer = BootstrapSynthesizer::new(provisioner);
        let err = synthesizer.synthesize(&ctx("123456789012")).await.unwrap_err();
        match err {
            SynthesisError::Provisioning { resource, source } => {
                assert_eq!(resource.as_str(), "storage.assets");
                assert_eq!(source.to_string(), "quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_preflight_warns_unless_strict() {
        let provisioner = Arc::new(RecordingProvisioner::default());
        let lenient = BootstrapSynthesizer::new(provisioner.clone());
        assert!(lenient.synthesize(&ctx("12345")).await.is_ok());

        let strict = BootstrapSynthesizer::new(Arc::new(RecordingProvisioner::default()))
            .with_strict_preflight(true);
        let err = strict.synthesize(&ctx("12345")).await.unwrap_err();
        assert!(matches!(err, SynthesisError::DanglingReference(ref found) if found.len() == 7));
        assert!(err.to_string().starts_with("7 default-bootstrap references"));
    }

    /// Counts increments of the dangling-reference counter only.
    #[derive(Default)]
    struct DanglingCounter(Arc<AtomicU64>);

    impl Recorder for DanglingCounter {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            if key.name() == "bootstrap_dangling_references_total" {
                Counter::from_arc(self.0.clone())
            } else {
                Counter::noop()
            }
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_dangling_counter_only_counts_lenient_runs() {
        let names = NameTemplate::for_target(&ctx("12345"));
        let recorder = DanglingCounter::default();

        metrics::with_local_recorder(&recorder, || {
            let strict = BootstrapSynthesizer::new(Arc::new(RecordingProvisioner::default()))
                .with_strict_preflight(true);
            assert!(strict.preflight(&names).is_err());
        });
        assert_eq!(recorder.0.load(Ordering::Relaxed), 0);

        metrics::with_local_recorder(&recorder, || {
            let lenient = BootstrapSynthesizer::new(Arc::new(RecordingProvisioner::default()));
            assert_eq!(lenient.preflight(&names).unwrap().len(), 7);
        });
        assert_eq!(recorder.0.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn test_realized_kinds_cover_every_phase() {
        let synthesizer = BootstrapSynthesizer::new(Arc::new(RecordingProvisioner::default()));
        let outcome = tokio_test::block_on(synthesizer.synthesize(&ctx("123456789012"))).unwrap();
        let kinds: std::collections::BTreeSet<ResourceKind> =
            outcome.realized.iter().map(|r| r.kind).collect();
        assert_eq!(kinds.len(), 6);
        assert!(outcome.descriptor.roles.webapp_exec.is_present());
        assert!(!outcome.descriptor.roles.druid_exec.is_present());
    }
}
