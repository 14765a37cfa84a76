// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared builders and fakes for unit tests.

use crate::annotations::{CONTROLLER_CLASS_ANNOTATION, MANAGED_ANNOTATION};
use crate::config::ControllerIdentity;
use crate::errors::WriteError;
use crate::record::{ResourceKey, ResourceRecord};
use crate::reconcilers::writer::AnnotationWriter;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub const TEST_CLASS: &str = "certificate-controller";
pub const TEST_ARN: &str = "arn:aws:acm:example";

pub fn identity() -> ControllerIdentity {
    ControllerIdentity::new(TEST_CLASS, TEST_ARN)
}

pub fn service(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> Service {
    let annotations: BTreeMap<String, String> = annotations
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();

    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: Some("1".to_string()),
            annotations: if annotations.is_empty() {
                None
            } else {
                Some(annotations)
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn record(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> ResourceRecord {
    ResourceRecord::from_service(service(namespace, name, annotations))
        .expect("test service should be well formed")
}

/// `ns/svc-a` carrying the given controller class and, optionally, a managed value.
pub fn svc_a(class: Option<&str>, managed: Option<&str>) -> ResourceRecord {
    let mut annotations = Vec::new();
    if let Some(class) = class {
        annotations.push((CONTROLLER_CLASS_ANNOTATION, class));
    }
    if let Some(managed) = managed {
        annotations.push((MANAGED_ANNOTATION, managed));
    }
    record("ns", "svc-a", &annotations)
}

/// One recorded call to [`FakeWriter::apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteCall {
    pub key: ResourceKey,
    pub annotation: String,
    pub value: String,
}

/// Annotation writer that records calls and replays scripted results.
#[derive(Default)]
pub struct FakeWriter {
    calls: Mutex<Vec<WriteCall>>,
    results: Mutex<VecDeque<Result<(), WriteError>>>,
    delay: Option<Duration>,
}

impl FakeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer whose every call takes `delay` before completing.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Queue a result for the next call; calls without a queued result succeed.
    pub fn push_result(&self, result: Result<(), WriteError>) {
        self.results.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<WriteCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AnnotationWriter for FakeWriter {
    async fn apply(
        &self,
        record: &ResourceRecord,
        annotation: &str,
        value: &str,
    ) -> Result<(), WriteError> {
        self.calls.lock().unwrap().push(WriteCall {
            key: record.key().clone(),
            annotation: annotation.to_string(),
            value: value.to_string(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
