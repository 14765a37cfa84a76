// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Snapshots of watched Services and the events that carry them.
//!
//! A [`ResourceRecord`] is an immutable, cheaply cloneable snapshot of a `Service` as it
//! was observed by the watch. The reconciliation engine reads records but never mutates
//! them: a write is prepared by deriving a new object with
//! [`ResourceRecord::with_annotation`].

use crate::errors::MalformedEvent;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Namespace-qualified identity of a watched resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    /// Namespace of the resource
    pub namespace: String,
    /// Name of the resource
    pub name: String,
}

impl ResourceKey {
    /// Create a key from namespace and name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Immutable snapshot of a watched `Service`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRecord {
    key: ResourceKey,
    service: Arc<Service>,
}

impl ResourceRecord {
    /// Wrap a `Service` observed by the watch.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedEvent`] if the object has no name or no namespace.
    pub fn from_service(service: Service) -> Result<Self, MalformedEvent> {
        let name = service.metadata.name.clone().ok_or(MalformedEvent::MissingName)?;
        let namespace = service
            .metadata
            .namespace
            .clone()
            .ok_or_else(|| MalformedEvent::MissingNamespace { name: name.clone() })?;

        Ok(Self {
            key: ResourceKey { namespace, name },
            service: Arc::new(service),
        })
    }

    /// Identity of the Service.
    #[must_use]
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// All annotations of the Service.
    #[must_use]
    pub fn annotations(&self) -> &BTreeMap<String, String> {
        self.service.annotations()
    }

    /// Value of a single annotation.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations().get(key).map(String::as_str)
    }

    /// `metadata.resourceVersion` at the time of observation.
    #[must_use]
    pub fn resource_version(&self) -> Option<&str> {
        self.service.metadata.resource_version.as_deref()
    }

    /// The observed object.
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Copy of the observed object with one annotation set to `value`.
    ///
    /// `resourceVersion` is preserved so that persisting the result is a compare-and-set
    /// against the observed state.
    #[must_use]
    pub fn with_annotation(&self, key: &str, value: &str) -> Service {
        let mut desired = (*self.service).clone();
        desired
            .annotations_mut()
            .insert(key.to_string(), value.to_string());
        desired
    }
}

/// A change observed for one resource.
///
/// The three variants replace separate add, update and delete callbacks; every event
/// goes through the same decision function.
#[derive(Clone, Debug, PartialEq)]
pub enum ReconcileEvent {
    /// The resource appeared (first observation or relist)
    Added(ResourceRecord),
    /// The resource changed, or was re-delivered unchanged by resync
    Updated {
        /// Previously observed state
        old: ResourceRecord,
        /// Currently observed state
        new: ResourceRecord,
    },
    /// The resource disappeared; carries its last known state
    Deleted(ResourceRecord),
}

impl ReconcileEvent {
    /// Build an event from an `(old, new)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedEvent::Empty`] when both sides are absent and
    /// [`MalformedEvent::KeyMismatch`] when they describe different resources.
    pub fn from_parts(
        old: Option<ResourceRecord>,
        new: Option<ResourceRecord>,
    ) -> Result<Self, MalformedEvent> {
        match (old, new) {
            (None, None) => Err(MalformedEvent::Empty),
            (None, Some(new)) => Ok(ReconcileEvent::Added(new)),
            (Some(old), None) => Ok(ReconcileEvent::Deleted(old)),
            (Some(old), Some(new)) => {
                if old.key() != new.key() {
                    return Err(MalformedEvent::KeyMismatch {
                        old: old.key().to_string(),
                        new: new.key().to_string(),
                    });
                }
                Ok(ReconcileEvent::Updated { old, new })
            }
        }
    }

    /// Identity of the resource the event is about.
    #[must_use]
    pub fn key(&self) -> &ResourceKey {
        match self {
            ReconcileEvent::Added(record) | ReconcileEvent::Deleted(record) => record.key(),
            ReconcileEvent::Updated { new, .. } => new.key(),
        }
    }

    /// Previously observed state, absent for `Added`.
    #[must_use]
    pub fn old(&self) -> Option<&ResourceRecord> {
        match self {
            ReconcileEvent::Added(_) => None,
            ReconcileEvent::Updated { old, .. } => Some(old),
            ReconcileEvent::Deleted(old) => Some(old),
        }
    }

    /// Currently observed state, absent for `Deleted`.
    #[must_use]
    pub fn new_state(&self) -> Option<&ResourceRecord> {
        match self {
            ReconcileEvent::Added(new) | ReconcileEvent::Updated { new, .. } => Some(new),
            ReconcileEvent::Deleted(_) => None,
        }
    }

    /// Short name used in logs and metric labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileEvent::Added(_) => "added",
            ReconcileEvent::Updated { .. } => "updated",
            ReconcileEvent::Deleted(_) => "deleted",
        }
    }

    /// Merge an event that arrived later for the same resource into this one.
    ///
    /// The result spans from this event's old state to the later event's new state. A
    /// later deletion keeps the last known state of the resource, and a resource recreated
    /// after a deletion starts from scratch. Returns `None` when the
    /// resource was both created and deleted in between, in which case there is nothing
    /// left to reconcile.
    #[must_use]
    pub fn coalesce(self, later: ReconcileEvent) -> Option<ReconcileEvent> {
        match later {
            ReconcileEvent::Deleted(last) => match self {
                ReconcileEvent::Added(_) => None,
                _ => Some(ReconcileEvent::Deleted(last)),
            },
            later if matches!(self, ReconcileEvent::Deleted(_)) => Some(later),
            later => {
                let old = self.old().cloned();
                let new = later.new_state().cloned();
                ReconcileEvent::from_parts(old, new).ok()
            }
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
