// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Resource Graph
//!
//! Groups [`ResourceNode`]s into ordered phases (roles, then storage, then
//! keys) and records explicit dependency edges between them. The realization
//! order is derived from both: phases never reorder, and inside a phase a node
//! waits for the nodes it depends on.
//!
//! # Invariants
//!
//! - Node ids are unique across the whole graph
//! - An edge may only point at a node or phase that exists
//! - An edge may not point forward in phase order
//! - The edge set is acyclic

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

use crate::domain::policy::PolicyError;
use crate::domain::resource::{NodeId, ResourceNode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Node '{0}' is defined more than once")]
    DuplicateNode(NodeId),

    #[error("Phase '{0}' is defined more than once")]
    DuplicatePhase(Phase),

    #[error("Edge from '{from}' references unknown target '{target}'")]
    UnknownTarget { from: NodeId, target: String },

    #[error("Edge from '{from}' ({from_phase}) depends on later phase {to_phase}")]
    PhaseInversion {
        from: NodeId,
        from_phase: Phase,
        to_phase: Phase,
    },

    #[error("Circular dependency detected at '{0}'")]
    Cycle(NodeId),

    #[error("Invalid policy on '{node}': {source}")]
    InvalidPolicy {
        node: NodeId,
        #[source]
        source: PolicyError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Roles,
    Storage,
    Keys,
}

impl Phase {
    pub const ORDER: [Phase; 3] = [Phase::Roles, Phase::Storage, Phase::Keys];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Roles => "roles",
            Phase::Storage => "storage",
            Phase::Keys => "keys",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum DependencyTarget {
    Node(NodeId),
    /// Every node of a phase, e.g. the role set.
    Phase(Phase),
}

impl fmt::Display for DependencyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyTarget::Node(id) => write!(f, "{}", id),
            DependencyTarget::Phase(phase) => write!(f, "phase:{}", phase),
        }
    }
}

/// `to` must exist before `from`'s policy is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyEdge {
    pub from: NodeId,
    pub to: DependencyTarget,
    pub reason: String,
}

impl DependencyEdge {
    pub fn new(from: NodeId, to: DependencyTarget, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseGroup {
    phase: Phase,
    nodes: Vec<ResourceNode>,
}

impl PhaseGroup {
    pub fn new(phase: Phase, nodes: Vec<ResourceNode>) -> Result<Self, GraphError> {
        let mut seen = BTreeSet::new();
        for node in &nodes {
            if !seen.insert(node.id.clone()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }
        Ok(Self { phase, nodes })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }
}

/// A set of nodes that may be realized concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub phase: Phase,
    pub nodes: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceGraph {
    groups: BTreeMap<Phase, PhaseGroup>,
    edges: Vec<DependencyEdge>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a phase group. Groups may be inserted in any order.
    pub fn insert_group(&mut self, group: PhaseGroup) -> Result<(), GraphError> {
        if self.groups.contains_key(&group.phase) {
            return Err(GraphError::DuplicatePhase(group.phase));
        }
        for node in &group.nodes {
            if self.node(&node.id).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
            for document in node.attached_policies() {
                document.validate().map_err(|source| GraphError::InvalidPolicy {
                    node: node.id.clone(),
                    source,
                })?;
            }
        }
        self.groups.insert(group.phase, group);
        Ok(())
    }

    /// Record an edge. Both ends must already be in the graph.
    pub fn add_edge(&mut self, edge: DependencyEdge) -> Result<(), GraphError> {
        let from_phase = self.phase_of(&edge.from).ok_or_else(|| GraphError::UnknownTarget {
            from: edge.from.clone(),
            target: edge.from.to_string(),
        })?;
        let to_phase = match &edge.to {
            DependencyTarget::Node(id) => self.phase_of(id),
            DependencyTarget::Phase(phase) => self.groups.contains_key(phase).then_some(*phase),
        }
        .ok_or_else(|| GraphError::UnknownTarget {
            from: edge.from.clone(),
            target: edge.to.to_string(),
        })?;

        if to_phase > from_phase {
            return Err(GraphError::PhaseInversion {
                from: edge.from.clone(),
                from_phase,
                to_phase,
            });
        }
        if edge.to == DependencyTarget::Node(edge.from.clone()) {
            return Err(GraphError::Cycle(edge.from.clone()));
        }

        self.edges.push(edge);
        if let Some(id) = self.find_cycle() {
            self.edges.pop();
            return Err(GraphError::Cycle(id));
        }
        Ok(())
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn groups(&self) -> impl Iterator<Item = &PhaseGroup> {
        self.groups.values()
    }

    /// All nodes in phase order.
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.groups.values().flat_map(|g| g.nodes.iter())
    }

    pub fn node(&self, id: &NodeId) -> Option<&ResourceNode> {
        self.nodes().find(|n| &n.id == id)
    }

    pub fn phase_of(&self, id: &NodeId) -> Option<Phase> {
        self.groups
            .values()
            .find(|g| g.nodes.iter().any(|n| &n.id == id))
            .map(|g| g.phase)
    }

    /// Nodes `id` directly depends on, with phase targets expanded.
    pub fn dependencies_of(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for edge in self.edges.iter().filter(|e| &e.from == id) {
            match &edge.to {
                DependencyTarget::Node(target) => out.push(target.clone()),
                DependencyTarget::Phase(phase) => {
                    if let Some(group) = self.groups.get(phase) {
                        out.extend(group.nodes.iter().map(|n| n.id.clone()).filter(|n| n != id));
                    }
                }
            }
        }
        out.sort();
        out.dedup();
        out
    }

    /// Stages in realization order.
    ///
    /// Phases run strictly in order. Inside a phase, nodes are layered so that
    /// each node lands in a later stage than everything it depends on.
    pub fn realization_order(&self) -> Vec<Stage> {
        let mut stages = Vec::new();
        for group in self.groups.values() {
            let members: BTreeSet<&NodeId> = group.nodes.iter().map(|n| &n.id).collect();
            let mut level: HashMap<NodeId, usize> = HashMap::new();
            let mut remaining: Vec<&NodeId> = group.nodes.iter().map(|n| &n.id).collect();

            // Edges are acyclic, so each pass settles at least one node.
            while !remaining.is_empty() {
                let before = remaining.len();
                remaining.retain(|id| {
                    let local: Vec<NodeId> = self
                        .dependencies_of(id)
                        .into_iter()
                        .filter(|d| members.contains(d))
                        .collect();
                    if local.iter().all(|d| level.contains_key(d)) {
                        let depth = local.iter().map(|d| level[d] + 1).max().unwrap_or(0);
                        level.insert((*id).clone(), depth);
                        false
                    } else {
                        true
                    }
                });
                if remaining.len() == before {
                    break;
                }
            }

            let depth = level.values().copied().max().map_or(0, |d| d + 1);
            for layer in 0..depth {
                let nodes: Vec<NodeId> = group
                    .nodes
                    .iter()
                    .filter(|n| level.get(&n.id) == Some(&layer))
                    .map(|n| n.id.clone())
                    .collect();
                stages.push(Stage {
                    phase: group.phase,
                    nodes,
                });
            }
        }
        stages
    }

    fn find_cycle(&self) -> Option<NodeId> {
        fn visit(
            current: &NodeId,
            graph: &ResourceGraph,
            visited: &mut HashMap<NodeId, bool>,
            rec_stack: &mut HashMap<NodeId, bool>,
        ) -> Option<NodeId> {
            visited.insert(current.clone(), true);
            rec_stack.insert(current.clone(), true);

            for dep in graph.dependencies_of(current) {
                if !visited.get(&dep).copied().unwrap_or(false) {
                    if let Some(found) = visit(&dep, graph, visited, rec_stack) {
                        return Some(found);
                    }
                } else if rec_stack.get(&dep).copied().unwrap_or(false) {
                    return Some(dep);
                }
            }

            rec_stack.insert(current.clone(), false);
            None
        }

        let mut visited = HashMap::new();
        let mut rec_stack = HashMap::new();
        for node in self.nodes() {
            if !visited.get(&node.id).copied().unwrap_or(false) {
                if let Some(found) = visit(&node.id, self, &mut visited, &mut rec_stack) {
                    return Some(found);
                }
            }
        }
        None
    }
}
