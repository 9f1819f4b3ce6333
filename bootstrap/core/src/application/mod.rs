// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Bootstrap Application Layer
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`policy_factory`] | Pure statement constructors |
//! | [`roles`], [`storage`], [`keys`] | Phase group builders |
//! | [`preflight`] | Default-bootstrap reference convention check |
//! | [`aggregator`] | Realized identifiers → `OutputDescriptor` |
//! | [`synthesizer`] | Build, realize, aggregate |

pub mod policy_factory;
pub mod roles;
pub mod storage;
pub mod keys;
pub mod preflight;
pub mod aggregator;
pub mod synthesizer;

pub use aggregator::OutputAggregator;
pub use policy_factory::PolicyStatementFactory;
pub use preflight::{DanglingReference, ReferenceConvention};
pub use synthesizer::{BootstrapSynthesizer, SynthesisError, SynthesisOutcome};
