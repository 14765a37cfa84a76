// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Process configuration and controller identity.
//!
//! All settings come from command-line flags with environment variable fallbacks.
//! [`ControllerIdentity`] is derived once at startup and never changes afterwards;
//! it is shared read-only with every reconciliation through [`crate::context::Context`].
//!
//! # Environment
//!
//! | Variable | Flag | Default |
//! |----------|------|---------|
//! | `CERTIFICATE_ARN` | `--certificate-arn` | required |
//! | `CONTROLLER_CLASS` | `--controller-class` | `certificate-controller` |
//! | `KUBECONFIG_PATH` | `--kubeconfig` | `$HOME/.kube/config`, then in-cluster |
//! | `RESYNC_INTERVAL_SECS` | `--resync-interval-secs` | `2` |
//! | `WRITE_RETRY_SECS` | `--write-retry-secs` | `10` |
//! | `METRICS_BIND_ADDRESS` | `--metrics-bind-address` | `0.0.0.0` |
//! | `METRICS_PORT` | `--metrics-port` | `8080` |
//! | `LEADER_ELECTION` | `--leader-election` | `false` |
//! | `LEASE_NAME` | `--lease-name` | `certificate-controller-leader` |
//! | `POD_NAMESPACE` | `--lease-namespace` | `default` |
//! | `POD_NAME` | `--lease-identity` | hostname |

use crate::constants::{
    DEFAULT_CONTROLLER_CLASS, DEFAULT_LEASE_NAME, DEFAULT_LEASE_NAMESPACE,
    DEFAULT_RESYNC_INTERVAL_SECS, DEFAULT_WRITE_RETRY_SECS, ENV_CERTIFICATE_ARN,
    METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PORT,
};
use crate::errors::ConfigError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line interface of the controller binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "certificate-controller",
    version,
    about = "Keeps the AWS load balancer certificate annotation on claimed Services in sync"
)]
pub struct Cli {
    /// Certificate ARN written to claimed Services
    #[arg(long, env = "CERTIFICATE_ARN")]
    pub certificate_arn: Option<String>,

    /// Controller class this instance claims
    #[arg(long, env = "CONTROLLER_CLASS")]
    pub controller_class: Option<String>,

    /// Explicit kubeconfig path (overrides `$HOME/.kube/config`)
    #[arg(long, env = "KUBECONFIG_PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Seconds between re-deliveries of every cached Service
    #[arg(long, env = "RESYNC_INTERVAL_SECS", default_value_t = DEFAULT_RESYNC_INTERVAL_SECS)]
    pub resync_interval_secs: u64,

    /// Seconds spent retrying transient write failures, 0 disables inline retries
    #[arg(long, env = "WRITE_RETRY_SECS", default_value_t = DEFAULT_WRITE_RETRY_SECS)]
    pub write_retry_secs: u64,

    /// Bind address of the metrics and health server
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = METRICS_SERVER_BIND_ADDRESS)]
    pub metrics_bind_address: String,

    /// Port of the metrics and health server
    #[arg(long, env = "METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,

    /// Only reconcile while holding a leader election lease
    #[arg(long, env = "LEADER_ELECTION")]
    pub leader_election: bool,

    /// Name of the leader election lease
    #[arg(long, env = "LEASE_NAME", default_value = DEFAULT_LEASE_NAME)]
    pub lease_name: String,

    /// Namespace of the leader election lease
    #[arg(long, env = "POD_NAMESPACE", default_value = DEFAULT_LEASE_NAMESPACE)]
    pub lease_namespace: String,

    /// Identity recorded as lease holder
    #[arg(long, env = "POD_NAME")]
    pub lease_identity: Option<String>,
}

impl Cli {
    /// Build the controller identity from the parsed flags.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCertificateArn`] if no certificate ARN was supplied.
    pub fn identity(&self) -> Result<ControllerIdentity, ConfigError> {
        ControllerIdentity::from_settings(
            self.certificate_arn.as_deref(),
            self.controller_class.as_deref(),
        )
    }

    /// Resync interval as a [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroInterval`] when the interval is zero.
    pub fn resync_interval(&self) -> Result<Duration, ConfigError> {
        if self.resync_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval {
                setting: "resync interval",
            });
        }
        Ok(Duration::from_secs(self.resync_interval_secs))
    }

    /// Total time budget for retrying a transient write failure.
    #[must_use]
    pub fn write_retry_budget(&self) -> Duration {
        Duration::from_secs(self.write_retry_secs)
    }

    /// Socket address of the metrics server.
    #[must_use]
    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.metrics_bind_address, self.metrics_port)
    }

    /// Leader election settings, or `None` when leader election is disabled.
    #[must_use]
    pub fn lease_settings(&self) -> Option<LeaseSettings> {
        if !self.leader_election {
            return None;
        }

        let identity = self
            .lease_identity
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| std::env::var("HOSTNAME").ok())
            .unwrap_or_else(|| format!("certificate-controller-{}", std::process::id()));

        Some(LeaseSettings {
            name: self.lease_name.clone(),
            namespace: self.lease_namespace.clone(),
            identity,
        })
    }
}

/// Leader election lease coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaseSettings {
    /// Lease object name
    pub name: String,
    /// Lease object namespace
    pub namespace: String,
    /// Holder identity written to the lease
    pub identity: String,
}

/// Immutable identity of this controller instance.
///
/// A Service is handled by this instance only when its controller-class annotation equals
/// [`ControllerIdentity::controller_class`]; claimed Services get
/// [`ControllerIdentity::target_value`] as their managed annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerIdentity {
    controller_class: String,
    target_value: String,
}

impl ControllerIdentity {
    /// Create an identity from already validated values.
    pub fn new(controller_class: impl Into<String>, target_value: impl Into<String>) -> Self {
        Self {
            controller_class: controller_class.into(),
            target_value: target_value.into(),
        }
    }

    /// Validate raw settings and build an identity.
    ///
    /// A blank controller class falls back to [`DEFAULT_CONTROLLER_CLASS`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCertificateArn`] if the certificate ARN is absent or blank.
    pub fn from_settings(
        certificate_arn: Option<&str>,
        controller_class: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let target_value = certificate_arn
            .map(str::trim)
            .filter(|arn| !arn.is_empty())
            .ok_or(ConfigError::MissingCertificateArn {
                env: ENV_CERTIFICATE_ARN,
            })?;

        let controller_class = controller_class
            .map(str::trim)
            .filter(|class| !class.is_empty())
            .unwrap_or(DEFAULT_CONTROLLER_CLASS);

        Ok(Self::new(controller_class, target_value))
    }

    /// Controller class this instance claims.
    #[must_use]
    pub fn controller_class(&self) -> &str {
        &self.controller_class
    }

    /// Value written to the managed annotation of claimed Services.
    #[must_use]
    pub fn target_value(&self) -> &str {
        &self.target_value
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
