// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared, immutable context for the controller.
//!
//! The controller loop and every write task receive an `Arc<Context>` containing:
//! - The controller identity (class and certificate ARN)
//! - The annotation writer used to persist decisions
//!
//! Nothing in the context changes after startup, so it is shared without locks.

use crate::config::ControllerIdentity;
use crate::reconcilers::writer::AnnotationWriter;
use std::sync::Arc;

/// Shared context passed to all controller operations.
#[derive(Clone)]
pub struct Context {
    /// Identity of this controller instance
    pub identity: ControllerIdentity,

    /// Writer used to persist annotation changes
    pub writer: Arc<dyn AnnotationWriter>,
}

impl Context {
    /// Create a context from its parts.
    pub fn new(identity: ControllerIdentity, writer: Arc<dyn AnnotationWriter>) -> Self {
        Self { identity, writer }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
