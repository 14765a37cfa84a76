// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Ownership checks and annotation comparison helpers.
//!
//! A Service is *claimed* by this controller instance when its controller-class
//! annotation equals the configured class. The claim is never stored: it is recomputed
//! from the current annotations every time an event is reconciled.

use crate::annotations::{CONTROLLER_CLASS_ANNOTATION, MANAGED_ANNOTATION};
use crate::config::ControllerIdentity;
use crate::record::ResourceRecord;

/// Check whether `record` is claimed by the controller described by `identity`.
///
/// Comparison is exact: no wildcards, no case folding, no trimming.
///
/// # Example
///
/// ```rust
/// use certificate_controller::config::ControllerIdentity;
/// use certificate_controller::reconcilers::claim::is_claimed;
/// use certificate_controller::record::ResourceRecord;
/// use k8s_openapi::api::core::v1::Service;
/// use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
///
/// let identity = ControllerIdentity::new("certificate-controller", "arn:aws:acm:example");
/// let service = Service {
///     metadata: ObjectMeta {
///         name: Some("web".to_string()),
///         namespace: Some("default".to_string()),
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
/// let record = ResourceRecord::from_service(service).unwrap();
///
/// assert!(is_claimed(&identity, &record));
/// ```
#[must_use]
pub fn is_claimed(identity: &ControllerIdentity, record: &ResourceRecord) -> bool {
    controller_class(record) == Some(identity.controller_class())
}

/// Controller class requested by the Service, if any.
#[must_use]
pub fn controller_class(record: &ResourceRecord) -> Option<&str> {
    record.annotation(CONTROLLER_CLASS_ANNOTATION)
}

/// Current value of the managed annotation; an empty value counts as absent.
#[must_use]
pub fn managed_value(record: &ResourceRecord) -> Option<&str> {
    record
        .annotation(MANAGED_ANNOTATION)
        .filter(|value| !value.is_empty())
}

/// Check whether an update touched either annotation the controller cares about.
///
/// Changes to any other field (labels, ports, status, unrelated annotations) cannot
/// alter the claim, so they never require a release.
#[must_use]
pub fn annotations_changed(old: &ResourceRecord, new: &ResourceRecord) -> bool {
    old.annotation(MANAGED_ANNOTATION) != new.annotation(MANAGED_ANNOTATION)
        || controller_class(old) != controller_class(new)
}

#[cfg(test)]
#[path = "claim_tests.rs"]
mod claim_tests;
