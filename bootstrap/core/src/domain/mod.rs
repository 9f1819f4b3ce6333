// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Bootstrap Domain Layer
//!
//! Pure types with no I/O. Everything the synthesizer produces is a function
//! of a resolved [`target::TargetContext`].
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`target`] | `TargetContext`, `Capability`, `HostContext` |
//! | [`policy`] | `PolicyStatement`, `PolicyDocument`, `Principal`, `Conditions` |
//! | [`naming`] | `NameTemplate`, `OwnedRoleKind`, `BootstrapRoleKind` |
//! | [`resource`] | `ResourceNode`, `ResourceSpec`, `RealizedResource` |
//! | [`graph`] | `ResourceGraph`, `PhaseGroup`, `DependencyEdge` |
//! | [`output`] | `OutputDescriptor`, `RoleSlot` |
//! | [`provisioner`] | `ResourceProvisioner` collaborator trait |

pub mod target;
pub mod policy;
pub mod naming;
pub mod resource;
pub mod graph;
pub mod output;
pub mod provisioner;
