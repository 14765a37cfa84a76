// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the certificate controller.
//!
//! This module provides specialized error types for:
//! - Startup configuration and credential resolution (fatal, process exits)
//! - Annotation writes against the Kubernetes API (per event, logged and re-driven by resync)
//! - Malformed watch events (logged and skipped)

use thiserror::Error;

/// Errors raised while building the controller configuration at startup.
///
/// Every variant is fatal: the process logs the error and exits with a non-zero status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The certificate ARN was not provided or is blank
    #[error("Undefined certificate ARN. Please set environment variable {env}")]
    MissingCertificateArn {
        /// Environment variable the value is read from
        env: &'static str,
    },

    /// A duration setting was zero where a positive value is required
    #[error("Invalid value for {setting}: must be greater than zero")]
    ZeroInterval {
        /// Name of the offending setting
        setting: &'static str,
    },
}

/// Errors raised while resolving Kubernetes API credentials.
#[derive(Error, Debug, Clone)]
pub enum CredentialError {
    /// The kubeconfig file exists but could not be read or parsed
    #[error("Failed to load kubeconfig from {path}: {reason}")]
    Kubeconfig {
        /// Path of the kubeconfig file
        path: String,
        /// Underlying error message
        reason: String,
    },

    /// In-cluster service account configuration is unavailable
    #[error("Failed to load in-cluster configuration: {reason}")]
    InCluster {
        /// Underlying error message
        reason: String,
    },

    /// A client could not be built from the resolved configuration
    #[error("Failed to create Kubernetes client: {reason}")]
    Client {
        /// Underlying error message
        reason: String,
    },
}

/// Errors that can occur when persisting an annotation change.
///
/// None of these are retried by the dispatcher. Transient variants are retried inline by
/// the writer for a bounded time; everything else is left to the next watch delivery or
/// resync, which re-runs the decision against fresh state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// The object changed since it was observed (HTTP 409)
    #[error("Service {resource} was modified concurrently, resourceVersion is stale: {message}")]
    Conflict {
        /// `namespace/name` of the Service
        resource: String,
        /// Message returned by the API server
        message: String,
    },

    /// The object no longer exists (HTTP 404)
    #[error("Service {resource} not found")]
    NotFound {
        /// `namespace/name` of the Service
        resource: String,
    },

    /// The controller's service account may not update the object (HTTP 401/403)
    #[error("Not permitted to update Service {resource}: {message}")]
    Forbidden {
        /// `namespace/name` of the Service
        resource: String,
        /// Message returned by the API server
        message: String,
    },

    /// Rate limiting, server-side or network failure (HTTP 429, 5xx, transport)
    #[error("Transient failure updating Service {resource}: {reason}")]
    Transient {
        /// `namespace/name` of the Service
        resource: String,
        /// Underlying error message
        reason: String,
    },

    /// Any other rejection by the API server
    #[error("API server rejected update of Service {resource} (HTTP {code}): {message}")]
    Rejected {
        /// `namespace/name` of the Service
        resource: String,
        /// HTTP status code
        code: u16,
        /// Message returned by the API server
        message: String,
    },

    /// Client-side failure such as request serialization
    #[error("Failed to update Service {resource}: {reason}")]
    Client {
        /// `namespace/name` of the Service
        resource: String,
        /// Underlying error message
        reason: String,
    },

    /// Transient failures persisted past the retry budget
    #[error("Giving up on Service {resource} after {attempts} attempts: {reason}")]
    RetriesExhausted {
        /// `namespace/name` of the Service
        resource: String,
        /// Number of attempts made
        attempts: u32,
        /// Last error message
        reason: String,
    },
}

impl WriteError {
    /// Classify a `kube::Error` returned by an update of `resource`.
    #[must_use]
    pub fn from_kube(resource: &str, err: &kube::Error) -> Self {
        let resource = resource.to_string();
        match err {
            kube::Error::Api(api_err) => match api_err.code {
                409 => WriteError::Conflict {
                    resource,
                    message: api_err.message.clone(),
                },
                404 => WriteError::NotFound { resource },
                401 | 403 => WriteError::Forbidden {
                    resource,
                    message: api_err.message.clone(),
                },
                429 | 500..=599 => WriteError::Transient {
                    resource,
                    reason: format!("HTTP {}: {}", api_err.code, api_err.message),
                },
                code => WriteError::Rejected {
                    resource,
                    code,
                    message: api_err.message.clone(),
                },
            },
            kube::Error::Service(e) => WriteError::Transient {
                resource,
                reason: e.to_string(),
            },
            other => WriteError::Client {
                resource,
                reason: other.to_string(),
            },
        }
    }

    /// Whether the writer may retry this error inline.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, WriteError::Transient { .. })
    }

    /// Short category used as a metrics label.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            WriteError::Conflict { .. } => "conflict",
            WriteError::NotFound { .. } => "not_found",
            WriteError::Forbidden { .. } => "forbidden",
            WriteError::Transient { .. } => "transient",
            WriteError::Rejected { .. } => "rejected",
            WriteError::Client { .. } => "client",
            WriteError::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

/// Watch events or objects the controller cannot act on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedEvent {
    /// Neither an old nor a new object was supplied
    #[error("Event carries neither an old nor a new object")]
    Empty,

    /// The object has no `metadata.name`
    #[error("Object has no name")]
    MissingName,

    /// The object has no `metadata.namespace`
    #[error("Object {name} has no namespace")]
    MissingNamespace {
        /// Name of the object
        name: String,
    },

    /// Old and new objects refer to different resources
    #[error("Event pairs different objects {old} and {new}")]
    KeyMismatch {
        /// `namespace/name` of the old object
        old: String,
        /// `namespace/name` of the new object
        new: String,
    },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
