// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Persisting annotation changes.
//!
//! [`AnnotationWriter`] is the only place the controller talks back to the API server.
//! The Kubernetes implementation replaces the whole `Service` object carrying the
//! `resourceVersion` it was observed at, so the API server rejects the write with
//! `409 Conflict` if anyone changed the Service in the meantime.

use crate::errors::WriteError;
use crate::reconcilers::retry::{retry_write, WriteRetryPolicy};
use crate::record::ResourceRecord;
use k8s_openapi::api::core::v1::Service;
use kube::api::PostParams;
use kube::{Api, Client};
use tracing::debug;

/// Applies a single annotation value to an observed resource.
#[async_trait::async_trait]
pub trait AnnotationWriter: Send + Sync {
    /// Set annotation `key` of `record` to `value` and persist the object.
    ///
    /// An empty `value` clears the annotation.
    ///
    /// # Errors
    ///
    /// Returns a [`WriteError`] describing why the API server did not accept the update.
    async fn apply(&self, record: &ResourceRecord, key: &str, value: &str)
        -> Result<(), WriteError>;
}

/// [`AnnotationWriter`] backed by the Kubernetes `Service` API.
#[derive(Clone)]
pub struct KubeAnnotationWriter {
    client: Client,
    retry: WriteRetryPolicy,
}

impl KubeAnnotationWriter {
    /// Create a writer using `client` and the given retry policy.
    #[must_use]
    pub fn new(client: Client, retry: WriteRetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait::async_trait]
impl AnnotationWriter for KubeAnnotationWriter {
    async fn apply(
        &self,
        record: &ResourceRecord,
        key: &str,
        value: &str,
    ) -> Result<(), WriteError> {
        let resource = record.key().to_string();
        let desired = record.with_annotation(key, value);
        let api: Api<Service> = Api::namespaced(self.client.clone(), &record.key().namespace);

        debug!(
            namespace = %record.key().namespace,
            name = %record.key().name,
            resource_version = ?record.resource_version(),
            annotation = key,
            value = value,
            "Replacing Service"
        );

        retry_write(&self.retry, &resource, || async {
            api.replace(&record.key().name, &PostParams::default(), &desired)
                .await
                .map(|_| ())
                .map_err(|e| WriteError::from_kube(&resource, &e))
        })
        .await
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod writer_tests;
