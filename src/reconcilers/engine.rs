// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation decision engine.
//!
//! Given an observed change to a Service, decides what has to happen to the managed
//! annotation. The decision is a pure function of the controller identity and the event:
//! no API calls, no clocks, no stored state. Because it only looks at current state it can
//! be re-run any number of times; an event whose outcome is already reflected in the
//! Service yields [`Action::NoOp`].
//!
//! # Decision Table
//!
//! | Event | `new` claimed | managed value | `old` claimed | Action |
//! |-------|---------------|---------------|---------------|--------|
//! | Deleted | - | - | yes | `LogOnlyDeleted` |
//! | Deleted | - | - | no | `NoOp` |
//! | Added/Updated | yes | equals target | - | `NoOp` |
//! | Added/Updated | yes | absent or different | - | `SetAnnotation(target)` |
//! | Updated | no | - | yes | `ClearAnnotation` |
//! | Added/Updated | no | - | no | `NoOp` |

use crate::config::ControllerIdentity;
use crate::reconcilers::claim::{annotations_changed, is_claimed, managed_value};
use crate::record::{ReconcileEvent, ResourceRecord};
use std::fmt;

/// Outcome of reconciling one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do
    NoOp,
    /// Write the given value to the managed annotation
    SetAnnotation(String),
    /// Write an empty managed annotation, releasing the certificate
    ClearAnnotation,
    /// A claimed Service was deleted; there is nothing left to write to
    LogOnlyDeleted,
}

impl Action {
    /// Value to persist in the managed annotation, or `None` when no write is needed.
    #[must_use]
    pub fn write_value(&self) -> Option<&str> {
        match self {
            Action::SetAnnotation(value) => Some(value),
            Action::ClearAnnotation => Some(""),
            Action::NoOp | Action::LogOnlyDeleted => None,
        }
    }

    /// Short name used in logs and metric labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::NoOp => "noop",
            Action::SetAnnotation(_) => "set",
            Action::ClearAnnotation => "clear",
            Action::LogOnlyDeleted => "deleted",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide the action required for `event`.
///
/// # Arguments
///
/// * `identity` - Controller class and target value of this instance
/// * `event` - The observed change
///
/// # Returns
///
/// The single [`Action`] that brings the Service in line with its claim.
///
/// # Example
///
/// ```rust
/// use certificate_controller::config::ControllerIdentity;
/// use certificate_controller::reconcilers::engine::{reconcile, Action};
/// use certificate_controller::record::{ReconcileEvent, ResourceRecord};
/// use k8s_openapi::api::core::v1::Service;
/// use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
///
/// let identity = ControllerIdentity::new("certificate-controller", "arn:aws:acm:example");
/// let service = Service {
///     metadata: ObjectMeta {
///         name: Some("svc-a".to_string()),
///         namespace: Some("ns".to_string()),
///         annotations: Some(
///             [(
///                 "easymile.com/certificate-controller.class".to_string(),
///                 "certificate-controller".to_string(),
///             )]
///             .into(),
///         ),
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// let event = ReconcileEvent::Added(ResourceRecord::from_service(service).unwrap());
///
/// assert_eq!(
///     reconcile(&identity, &event),
///     Action::SetAnnotation("arn:aws:acm:example".to_string())
/// );
/// ```
#[must_use]
pub fn reconcile(identity: &ControllerIdentity, event: &ReconcileEvent) -> Action {
    match event {
        ReconcileEvent::Deleted(old) => {
            if is_claimed(identity, old) {
                Action::LogOnlyDeleted
            } else {
                Action::NoOp
            }
        }
        ReconcileEvent::Added(new) => reconcile_present(identity, None, new),
        ReconcileEvent::Updated { old, new } => {
            if !annotations_changed(old, new) {
                // Claim is identical on both sides: only drift repair can apply.
                return ensure_target(identity, new);
            }
            reconcile_present(identity, Some(old), new)
        }
    }
}

/// Decide for a Service that still exists.
fn reconcile_present(
    identity: &ControllerIdentity,
    old: Option<&ResourceRecord>,
    new: &ResourceRecord,
) -> Action {
    if is_claimed(identity, new) {
        return ensure_target(identity, new);
    }

    match old {
        Some(old) if is_claimed(identity, old) => Action::ClearAnnotation,
        _ => Action::NoOp,
    }
}

/// Set the target value on a claimed Service unless it is already there.
fn ensure_target(identity: &ControllerIdentity, record: &ResourceRecord) -> Action {
    if !is_claimed(identity, record) {
        return Action::NoOp;
    }

    if managed_value(record) == Some(identity.target_value()) {
        Action::NoOp
    } else {
        Action::SetAnnotation(identity.target_value().to_string())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
