// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Fastish Bootstrap Core
//!
//! Synthesizes the cross-account trust fabric that lets the Fastish host
//! platform act inside a subscriber account: IAM roles with scoped trust and
//! permission policies, the storage and key resources that accompany them, and
//! the single output descriptor that downstream releases consume.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Domain:** pure value types (context, policies, names, graph, output)
//! - **Application:** statement factory, phase builders, synthesizer
//! - **Infrastructure:** context manifest loading, dry-run provisioner

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
