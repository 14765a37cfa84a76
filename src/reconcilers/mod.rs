// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of the certificate annotation on Services.
//!
//! # Reconciliation Architecture
//!
//! The controller follows the level-triggered Kubernetes controller pattern:
//!
//! 1. **Claim** - [`claim`] reads the controller class annotation of a Service
//! 2. **Decide** - [`engine::reconcile`] turns an observed change into an [`Action`]
//! 3. **Dispatch** - [`Dispatcher`] runs at most one write per Service at a time
//! 4. **Write** - [`AnnotationWriter`] persists the managed annotation, retrying
//!    transient API failures for a bounded time
//!
//! Decisions only depend on the current state, so re-running them on resync converges
//! any Service that drifted or whose write failed.

pub mod claim;
pub mod dispatcher;
pub mod engine;
pub mod retry;
pub mod writer;

pub use dispatcher::Dispatcher;
pub use engine::{reconcile, Action};
pub use retry::WriteRetryPolicy;
pub use writer::{AnnotationWriter, KubeAnnotationWriter};
